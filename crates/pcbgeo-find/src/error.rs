use pcbgeo_core::{BBox, BoolError, TreeError};
use thiserror::Error;

use crate::layer::LayerId;
use crate::object::{ObjKind, ObjRef};

#[derive(Error, Debug)]
pub enum FindError {
    #[error("no layer with id {0}")]
    NoSuchLayer(LayerId),

    #[error("object {0:?} no longer exists")]
    StaleHandle(ObjRef),

    #[error("expected a {expected:?} object, found {found:?}")]
    WrongKind { expected: ObjKind, found: ObjKind },

    #[error("polygon has no clipped islands yet; clip it before testing")]
    StaleClip,

    #[error("object box {0:?} is empty")]
    EmptyBox(BBox),

    #[error("polygon needs at least three corners")]
    DegeneratePolygon,

    #[error("polygon clipping failed: {0}")]
    Boolean(#[from] BoolError),

    #[error("{what}: {source}")]
    Tree {
        what: String,
        #[source]
        source: TreeError,
    },

    #[error("{what}: {entries} tree entries for {objects} objects")]
    IndexOutOfStep {
        what: String,
        entries: usize,
        objects: usize,
    },
}
