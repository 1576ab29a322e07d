//! Pairwise intersection over the closed set of object kinds.

use pcbgeo_core::Coord;

use crate::error::FindError;
use crate::isect;
use crate::object::{ObjKind, Object};

const UNKNOWN_PAIR: &str = "don't know how to check intersection of these object types";

/// Panic unless both kinds name a real object.
pub fn check_kinds(a: ObjKind, b: ObjKind) {
    if a == ObjKind::Void || b == ObjKind::Void {
        panic!("{UNKNOWN_PAIR}: {a:?} and {b:?}");
    }
}

/// Whether `a` and `b` are closer than `bloat`.
///
/// Symmetric pairs run the same primitive with the operands swapped. Polygon
/// operands must already carry their clipped islands; see
/// [`Board::intersects`](crate::Board::intersects) for the variant that
/// builds them.
///
/// # Panics
///
/// On a [`Object::Void`] operand.
pub fn intersects(a: &Object<'_>, b: &Object<'_>, bloat: Coord) -> Result<bool, FindError> {
    use Object::*;

    let hit = match (*a, *b) {
        (Line(x), Line(y)) => isect::line_line(x, y, bloat),
        (Line(l), Arc(r)) | (Arc(r), Line(l)) => isect::line_arc(l, r, bloat)?,
        (Line(l), Poly(p)) | (Poly(p), Line(l)) => isect::line_poly(l, p, bloat)?,
        (Line(l), Pstk(s)) | (Pstk(s), Line(l)) => isect::pstk_line(s, l, bloat),
        (Arc(x), Arc(y)) => isect::arc_arc(x, y, bloat)?,
        (Arc(r), Poly(p)) | (Poly(p), Arc(r)) => isect::arc_poly(r, p, bloat)?,
        (Arc(r), Pstk(s)) | (Pstk(s), Arc(r)) => isect::pstk_arc(s, r, bloat)?,
        (Poly(x), Poly(y)) => isect::poly_poly(x, y, bloat)?,
        (Pstk(s), Poly(p)) | (Poly(p), Pstk(s)) => isect::pstk_poly(s, p, bloat)?,
        (Pstk(x), Pstk(y)) => isect::pstk_pstk(x, y, bloat),

        (Text(t), Line(l)) | (Line(l), Text(t)) => isect::text_line(t, l, bloat),
        (Text(t), Arc(r)) | (Arc(r), Text(t)) => isect::text_arc(t, r, bloat),
        (Text(x), Text(y)) => isect::text_text(x, y, bloat),
        (Text(t), Poly(p)) | (Poly(p), Text(t)) => isect::text_poly(t, p, bloat),
        (Text(t), Pstk(s)) | (Pstk(s), Text(t)) => isect::text_pstk(t, s, bloat),

        (Void, _) | (_, Void) => panic!("{UNKNOWN_PAIR}: {:?} and {:?}", a.kind(), b.kind()),
    };
    Ok(hit)
}
