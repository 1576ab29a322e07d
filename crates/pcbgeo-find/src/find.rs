//! Connectivity flood over a [`Board`].

use std::collections::{HashSet, VecDeque};

use crate::board::Board;
use crate::error::FindError;
use crate::object::{ObjKind, ObjRef};

/// Every object electrically connected to `start`, `start` first, in
/// breadth-first order.
///
/// Candidates come from the R-trees; each is confirmed with
/// [`Board::intersects`], so polygons met on the way get their clipped
/// islands built. Text never connects.
pub fn connected(board: &mut Board, start: ObjRef) -> Result<Vec<ObjRef>, FindError> {
    if start.kind == ObjKind::Void {
        return Err(FindError::StaleHandle(start));
    }
    board.object(start)?;

    let mut seen: HashSet<ObjRef> = HashSet::from([start]);
    let mut queue = VecDeque::from([start]);
    let mut found = Vec::new();
    let mut tests = 0usize;
    let mut rebuilt = 0usize;

    while let Some(current) = queue.pop_front() {
        found.push(current);
        for candidate in board.candidates(current)? {
            if seen.contains(&candidate) {
                continue;
            }
            let outcome = board.intersects(current, candidate)?;
            tests += 1;
            if outcome.recomputed {
                rebuilt += 1;
            }
            if outcome.hit {
                seen.insert(candidate);
                queue.push_back(candidate);
            }
        }
    }
    log::debug!(
        "flood from {:?}: {} object(s), {} test(s), {} polygon clip(s) built",
        start,
        found.len(),
        tests,
        rebuilt
    );
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{Flags, Line, PadShape, Padstack, Polygon, Text};
    use pcbgeo_core::{BBox, Point};

    fn trace(board: &mut Board, layer: u32, a: (i64, i64), b: (i64, i64)) -> ObjRef {
        board
            .add_line(
                layer,
                Line::new(Point::new(a.0, a.1), Point::new(b.0, b.1), 10, 0, Flags::default()),
            )
            .unwrap()
    }

    #[test]
    fn test_flood_follows_copper_across_layers() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut board = Board::default();
        let top = board.add_layer("top");
        let bottom = board.add_layer("bottom");

        let t1 = trace(&mut board, top, (0, 0), (1_000, 0));
        let t2 = trace(&mut board, top, (1_000, 0), (1_000, 1_000));
        let via = board
            .add_padstack(Padstack::new(Point::new(1_000, 1_000), PadShape::Circle { diameter: 40 }, 0, Flags::default()))
            .unwrap();
        let b1 = trace(&mut board, bottom, (1_000, 1_000), (3_000, 1_000));
        let pour = board
            .add_polygon(
                bottom,
                Polygon::new(
                    vec![
                        Point::new(2_900, 900),
                        Point::new(4_000, 900),
                        Point::new(4_000, 2_000),
                        Point::new(2_900, 2_000),
                    ],
                    vec![],
                    Flags::default(),
                ),
            )
            .unwrap();
        let stray = trace(&mut board, top, (0, 500), (500, 500));
        let label = board
            .add_text(top, Text::new(Point::new(0, 0), "GND", BBox::new(-50, -50, 50, 50), 0, Flags::default()))
            .unwrap();

        let net = connected(&mut board, t1).unwrap();
        assert_eq!(net[0], t1);
        for r in [t2, via, b1, pour] {
            assert!(net.contains(&r), "{:?} missing from {:?}", r, net);
        }
        assert!(!net.contains(&stray));
        assert!(!net.contains(&label));
        assert_eq!(net.len(), 5);
    }

    #[test]
    fn test_flood_respects_bloat() {
        let mut board = Board::default();
        let top = board.add_layer("top");
        let a = trace(&mut board, top, (0, 0), (100, 0));
        let b = trace(&mut board, top, (0, 30), (100, 30));
        assert_eq!(connected(&mut board, a).unwrap(), vec![a]);

        board.config.bloat = 20;
        let net = connected(&mut board, a).unwrap();
        assert_eq!(net, vec![a, b]);
    }

    #[test]
    fn test_flood_from_missing_object_fails() {
        let mut board = Board::default();
        let top = board.add_layer("top");
        let a = trace(&mut board, top, (0, 0), (100, 0));
        board.remove(a).unwrap();
        assert!(matches!(connected(&mut board, a), Err(FindError::StaleHandle(_))));
    }
}
