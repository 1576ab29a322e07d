use pcbgeo_core::{BBox, RTree};

use crate::object::{Arc, Line, Polygon, Text};

/// A copper layer identifier.
pub type LayerId = u32;

/// Slot storage with stable indices. Removed slots are reused.
#[derive(Debug, Clone)]
pub(crate) struct Slots<T> {
    items: Vec<Option<T>>,
    free: Vec<usize>,
}

impl<T> Default for Slots<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            free: Vec::new(),
        }
    }
}

impl<T> Slots<T> {
    pub(crate) fn insert(&mut self, item: T) -> usize {
        match self.free.pop() {
            Some(i) => {
                self.items[i] = Some(item);
                i
            }
            None => {
                self.items.push(Some(item));
                self.items.len() - 1
            }
        }
    }

    pub(crate) fn remove(&mut self, index: usize) -> Option<T> {
        let item = self.items.get_mut(index)?.take()?;
        self.free.push(index);
        Some(item)
    }

    pub(crate) fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)?.as_ref()
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.items.get_mut(index)?.as_mut()
    }

    pub(crate) fn len(&self) -> usize {
        self.items.iter().filter(|i| i.is_some()).count()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (usize, &T)> + '_ {
        self.items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| item.as_ref().map(|t| (i, t)))
    }
}

/// One copper layer: its objects, each kind with its own R-tree keyed by
/// slot index.
#[derive(Debug)]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    pub(crate) lines: Slots<Line>,
    pub(crate) arcs: Slots<Arc>,
    pub(crate) texts: Slots<Text>,
    pub(crate) polys: Slots<Polygon>,
    pub(crate) line_tree: RTree<usize>,
    pub(crate) arc_tree: RTree<usize>,
    pub(crate) text_tree: RTree<usize>,
    pub(crate) poly_tree: RTree<usize>,
}

impl Layer {
    pub fn new(id: LayerId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            lines: Slots::default(),
            arcs: Slots::default(),
            texts: Slots::default(),
            polys: Slots::default(),
            line_tree: RTree::new(),
            arc_tree: RTree::new(),
            text_tree: RTree::new(),
            poly_tree: RTree::new(),
        }
    }

    pub fn line(&self, index: usize) -> Option<&Line> {
        self.lines.get(index)
    }

    pub fn arc(&self, index: usize) -> Option<&Arc> {
        self.arcs.get(index)
    }

    pub fn text(&self, index: usize) -> Option<&Text> {
        self.texts.get(index)
    }

    pub fn polygon(&self, index: usize) -> Option<&Polygon> {
        self.polys.get(index)
    }

    pub fn lines(&self) -> impl Iterator<Item = (usize, &Line)> + '_ {
        self.lines.iter()
    }

    pub fn arcs(&self) -> impl Iterator<Item = (usize, &Arc)> + '_ {
        self.arcs.iter()
    }

    pub fn texts(&self) -> impl Iterator<Item = (usize, &Text)> + '_ {
        self.texts.iter()
    }

    pub fn polygons(&self) -> impl Iterator<Item = (usize, &Polygon)> + '_ {
        self.polys.iter()
    }

    /// Number of live objects of every kind.
    pub fn object_count(&self) -> usize {
        self.lines.len() + self.arcs.len() + self.texts.len() + self.polys.len()
    }

    /// Drop the clipped islands of every polygon whose box touches `region`.
    pub(crate) fn invalidate_polys_in(&mut self, region: &BBox) -> usize {
        let hits = self.poly_tree.search_collect(region);
        let mut n = 0;
        for i in hits {
            if let Some(p) = self.polys.get_mut(i) {
                if !p.is_clip_stale() {
                    p.invalidate_clip();
                    n += 1;
                }
            }
        }
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slots_reuse_freed_index() {
        let mut s: Slots<&str> = Slots::default();
        let a = s.insert("a");
        let b = s.insert("b");
        assert_eq!((a, b), (0, 1));
        assert_eq!(s.remove(a), Some("a"));
        assert_eq!(s.remove(a), None);
        assert!(s.get(a).is_none());
        assert_eq!(s.insert("c"), 0);
        assert_eq!(s.len(), 2);
        assert_eq!(s.iter().map(|(_, v)| *v).collect::<Vec<_>>(), vec!["c", "b"]);
    }

    #[test]
    fn test_out_of_range_is_none() {
        let mut s: Slots<u8> = Slots::default();
        assert!(s.get(7).is_none());
        assert!(s.get_mut(7).is_none());
        assert!(s.remove(7).is_none());
    }
}
