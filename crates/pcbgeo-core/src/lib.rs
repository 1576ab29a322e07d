//! # PcbGeo Core
//!
//! Spatial index and polygon geometry kernel for PCB layout: integer boxes,
//! a dynamic R-tree, vertex-ring contours and polygons with holes, primitive
//! shape tessellation, contour offsetting, boolean operations and dicing of
//! polygons into hole-free islands.
//!
//! Object models live in the crates built on top of this one.

pub mod geometry;
pub mod rtree;
pub mod contour;
pub mod polyarea;
pub mod shapes;
pub mod offset;
pub mod boolean;
pub mod dice;

pub use geometry::{ArcGeom, BBox, Coord, Point};
pub use rtree::{Dir, RTree, SearchOutcome, TreeError};
pub use contour::{Contour, Orientation, RoundInfo, VertexId};
pub use polyarea::{touching, Polyarea};
pub use offset::offset;
pub use boolean::{and_subtract, boolean, BoolError, BoolOp};
pub use dice::dice_no_holes;
