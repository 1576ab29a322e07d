//! # PcbGeo Find
//!
//! Board object model on top of `pcbgeo-core`: lines, arcs, texts and
//! polygons on copper layers plus padstacks through all of them, each kind
//! indexed in its own R-tree. Polygons carry a cache of their islands after
//! clearance cuts, rebuilt on demand.
//!
//! Pairwise intersection tests over every kind pair drive the connectivity
//! flood in [`find::connected`].

pub mod config;
pub mod error;
pub mod object;
pub mod layer;
pub mod board;
pub mod isect;
pub mod dispatch;
pub mod find;

pub use config::FindConfig;
pub use error::FindError;
pub use object::{Arc, Flags, Line, ObjKind, ObjRef, Object, PadShape, Padstack, Polygon, Text};
pub use layer::{Layer, LayerId};
pub use board::{Board, IsectOutcome};
pub use dispatch::intersects;
pub use find::connected;
