//! Decomposition of polygons with holes into hole-free islands.

use crate::boolean::{and_subtract, boolean, BoolError, BoolOp};
use crate::contour::Contour;
use crate::geometry::BBox;
use crate::polyarea::Polyarea;
use crate::shapes;

/// Upper bound on cuts for one call; real boards stay far below it.
pub const MAX_DICE_CUTS: usize = 100_000;

/// Split `islands` into hole-free outer contours and hand each one to `emit`.
///
/// When `clip` is not the all-zero box the islands are first intersected
/// with it. An island with holes is cut by a rectangle spanning its full
/// height, from its left edge to the middle of its first hole, and both
/// parts are processed again. The input is consumed whatever the outcome;
/// on error, contours already emitted stay emitted.
pub fn dice_no_holes<F>(islands: Vec<Polyarea>, clip: BBox, mut emit: F) -> Result<(), BoolError>
where
    F: FnMut(Contour),
{
    let islands = if clip.is_all_zero() {
        islands
    } else {
        if !clip.is_valid() {
            return Err(BoolError::InvalidClip(clip));
        }
        match shapes::rect(clip.x1, clip.x2, clip.y1, clip.y2) {
            Some(window) => boolean(islands, vec![window], BoolOp::Isect)?,
            None => {
                log::debug!("dice: clip window {:?} has no area, nothing to emit", clip);
                return Ok(());
            }
        }
    };

    let mut pending = islands;
    pending.reverse();
    let mut cuts = 0;
    let mut emitted = 0;
    while let Some(island) = pending.pop() {
        if !island.has_holes() {
            emit(island.into_outer());
            emitted += 1;
            continue;
        }

        cuts += 1;
        if cuts > MAX_DICE_CUTS {
            return Err(BoolError::DiceDepth(cuts));
        }
        let outer = island.bbox();
        let hole = island.holes()[0].bbox();
        let cut_x = ((hole.x1 + hole.x2) / 2).max(outer.x1 + 1);
        let Some(cutter) = shapes::rect(outer.x1, cut_x, outer.y1, outer.y2) else {
            return Err(BoolError::InvalidClip(BBox::new(outer.x1, outer.y1, cut_x, outer.y2)));
        };
        let (left, right) = and_subtract(vec![island], vec![cutter])?;
        pending.extend(right.into_iter().rev());
        pending.extend(left.into_iter().rev());
    }
    log::debug!("dice: emitted {} island(s) after {} cut(s)", emitted, cuts);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contour::Orientation;
    use crate::geometry::{Coord, Point};

    fn rect_contour(x1: Coord, y1: Coord, x2: Coord, y2: Coord) -> Contour {
        Contour::from_points(&[
            Point::new(x1, y1),
            Point::new(x2, y1),
            Point::new(x2, y2),
            Point::new(x1, y2),
        ])
        .unwrap()
    }

    fn collect(islands: Vec<Polyarea>, clip: BBox) -> Result<Vec<Contour>, BoolError> {
        let mut out = Vec::new();
        dice_no_holes(islands, clip, |c| out.push(c))?;
        Ok(out)
    }

    #[test]
    fn test_plain_rectangle_emitted_once_unchanged() {
        let input = Polyarea::new(rect_contour(0, 0, 100, 50));
        let expected = input.outer().to_vec();
        let out = collect(vec![input], BBox::ZERO).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].to_vec(), expected);
        assert_eq!(out[0].area(), 5_000.0);
    }

    #[test]
    fn test_holes_are_diced_away() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut frame = Polyarea::new(rect_contour(0, 0, 100, 100));
        frame.add_hole(rect_contour(20, 20, 40, 40));
        frame.add_hole(rect_contour(60, 60, 80, 80));
        let expected = frame.area();

        let out = collect(vec![frame], BBox::ZERO).unwrap();
        assert!(out.len() >= 2);
        let total: f64 = out.iter().map(Contour::area).sum();
        assert!((total - expected).abs() < 1e-6);
        assert!(out
            .iter()
            .all(|c| c.orientation() == Orientation::CounterClockwise && c.area() > 0.0));
    }

    #[test]
    fn test_clip_window_limits_output() {
        let mut frame = Polyarea::new(rect_contour(0, 0, 100, 100));
        frame.add_hole(rect_contour(20, 20, 80, 80));
        let out = collect(vec![frame], BBox::new(0, 0, 50, 100)).unwrap();
        let total: f64 = out.iter().map(Contour::area).sum();
        assert!((total - (5_000.0 - 1_800.0)).abs() < 1e-6);
        assert!(out.iter().all(|c| c.bbox().x2 <= 50));
    }

    #[test]
    fn test_clip_outside_emits_nothing() {
        let _ = env_logger::builder().is_test(true).try_init();
        let input = Polyarea::new(rect_contour(0, 0, 10, 10));
        let out = collect(vec![input], BBox::new(100, 100, 200, 200)).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_inverted_clip_is_an_error() {
        let input = Polyarea::new(rect_contour(0, 0, 10, 10));
        let err = collect(vec![input], BBox::new(10, 10, 0, 0)).unwrap_err();
        assert_eq!(err, BoolError::InvalidClip(BBox::new(10, 10, 0, 0)));
    }
}
