//! Boolean operations on island sets, backed by `i_overlay`.

use i_overlay::core::fill_rule::FillRule;
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::float::single::SingleFloatOverlay;
use thiserror::Error;

use crate::contour::Contour;
use crate::geometry::{BBox, Coord, Point};
use crate::polyarea::{biggest_first, Polyarea};

/// Largest extent, on either axis, of the two operands taken together that
/// the engine reproduces exactly. Its float adapter scales the combined box
/// onto a 32-bit grid; up to this span every board unit keeps at least two
/// grid steps.
pub const MAX_SPAN: Coord = 1 << 28;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BoolError {
    #[error("operands reaching ({x}, {y}) span more than the exact range of the boolean engine")]
    CoordinateRange { x: Coord, y: Coord },

    #[error("boolean engine produced a non-finite coordinate")]
    NonFinite,

    #[error("invalid clip box {0:?}")]
    InvalidClip(BBox),

    #[error("dicing did not converge after {0} cuts")]
    DiceDepth(usize),

    #[error("union of non-empty shapes came out empty")]
    EmptyUnion,
}

/// Operation selector for [`boolean`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    Unite,
    Isect,
    Sub,
    Xor,
}

impl BoolOp {
    fn rule(self) -> OverlayRule {
        match self {
            BoolOp::Unite => OverlayRule::Union,
            BoolOp::Isect => OverlayRule::Intersect,
            BoolOp::Sub => OverlayRule::Difference,
            BoolOp::Xor => OverlayRule::Xor,
        }
    }
}

type Path = Vec<[f64; 2]>;

fn to_paths(islands: &[Polyarea]) -> Vec<Path> {
    let mut paths = Vec::new();
    for island in islands {
        for contour in island.contours() {
            if contour.count() < 3 || contour.area() == 0.0 {
                continue;
            }
            paths.push(contour.iter().map(|p| [p.x as f64, p.y as f64]).collect());
        }
    }
    paths
}

/// Reject operand pairs whose combined box is wider or taller than
/// [`MAX_SPAN`]. Reports the corner farthest from the origin.
fn check_span(a: &[Polyarea], b: &[Polyarea]) -> Result<(), BoolError> {
    let Some(bbox) = a
        .iter()
        .chain(b)
        .map(Polyarea::bbox)
        .filter(BBox::is_valid)
        .reduce(|acc, bb| acc.union(&bb))
    else {
        return Ok(());
    };
    if bbox.width() > MAX_SPAN || bbox.height() > MAX_SPAN {
        let x = if bbox.x1.abs() > bbox.x2.abs() { bbox.x1 } else { bbox.x2 };
        let y = if bbox.y1.abs() > bbox.y2.abs() { bbox.y1 } else { bbox.y2 };
        return Err(BoolError::CoordinateRange { x, y });
    }
    Ok(())
}

fn to_contour(path: &[[f64; 2]]) -> Result<Option<Contour>, BoolError> {
    let mut points = Vec::with_capacity(path.len());
    for &[x, y] in path {
        if !x.is_finite() || !y.is_finite() {
            return Err(BoolError::NonFinite);
        }
        points.push(Point::from_f64(x, y));
    }
    Ok(Contour::from_points(&points))
}

fn from_shapes(shapes: Vec<Vec<Path>>) -> Result<Vec<Polyarea>, BoolError> {
    let mut islands = Vec::with_capacity(shapes.len());
    for shape in shapes {
        let mut paths = shape.iter();
        let Some(outer) = paths.next() else {
            continue;
        };
        let Some(outer) = to_contour(outer)? else {
            continue;
        };
        let mut island = Polyarea::new(outer);
        if island.outer().count() < 3 || island.area() == 0.0 {
            continue;
        }
        for hole in paths {
            if let Some(mut hole) = to_contour(hole)? {
                hole.pre(true);
                if hole.count() >= 3 && hole.area() != 0.0 {
                    island.add_hole(hole);
                }
            }
        }
        islands.push(island);
    }
    biggest_first(&mut islands);
    Ok(islands)
}

/// Combine two island sets. Both inputs are consumed; the result is rounded
/// back to board units with the largest island first.
///
/// Contours with fewer than three vertices or zero area do not take part.
/// Fails with [`BoolError::CoordinateRange`] when the operands together span
/// more than [`MAX_SPAN`].
pub fn boolean(
    a: Vec<Polyarea>,
    b: Vec<Polyarea>,
    op: BoolOp,
) -> Result<Vec<Polyarea>, BoolError> {
    check_span(&a, &b)?;
    let subject = to_paths(&a);
    let clip = to_paths(&b);
    drop((a, b));
    let shapes = subject.overlay(&clip, op.rule(), FillRule::NonZero);
    let islands = from_shapes(shapes)?;
    log::trace!("boolean {:?}: {} island(s)", op, islands.len());
    Ok(islands)
}

/// `(a ∩ b, a − b)` in one call.
pub fn and_subtract(
    a: Vec<Polyarea>,
    b: Vec<Polyarea>,
) -> Result<(Vec<Polyarea>, Vec<Polyarea>), BoolError> {
    let isect = boolean(a.clone(), b.clone(), BoolOp::Isect)?;
    let rest = boolean(a, b, BoolOp::Sub)?;
    Ok((isect, rest))
}

/// Union of two shapes that must not vanish.
pub(crate) fn unite_pair(a: Polyarea, b: Polyarea) -> Result<Polyarea, BoolError> {
    boolean(vec![a], vec![b], BoolOp::Unite)?
        .into_iter()
        .next()
        .ok_or(BoolError::EmptyUnion)
}
