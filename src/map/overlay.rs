use crate::map::surface::{MapSurface, OverlayId};

/// Tracks the decorations belonging to the current selection.
///
/// At most one set is ever live: every tracked overlay is removed from the
/// surface before a successor's overlays are installed, so superseded
/// selections can never leak rectangles or markers onto the map.
#[derive(Default)]
pub struct OverlaySet {
    live: Vec<OverlayId>,
}

impl OverlaySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove every live overlay, then install `new` as the tracked set.
    pub fn replace<S: MapSurface>(&mut self, surface: &mut S, new: Vec<OverlayId>) {
        self.clear(surface);
        self.live = new;
    }

    /// Remove every live overlay (reset and teardown path).
    pub fn clear<S: MapSurface>(&mut self, surface: &mut S) {
        for id in self.live.drain(..) {
            surface.remove_overlay(id);
        }
    }

    /// Track an overlay added after the set was installed (the delayed
    /// highlight box joins its selection's set here).
    pub fn track(&mut self, id: OverlayId) {
        self.live.push(id);
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::testing::RecordingSurface;

    #[test]
    fn replace_removes_previous_set_first() {
        let mut surface = RecordingSurface::new(4);
        let mut set = OverlaySet::new();

        set.replace(&mut surface, vec![1, 2]);
        assert_eq!(set.len(), 2);

        set.replace(&mut surface, vec![3]);
        assert_eq!(surface.removed, vec![1, 2]);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn clear_empties_set() {
        let mut surface = RecordingSurface::new(4);
        let mut set = OverlaySet::new();
        set.replace(&mut surface, vec![7]);
        set.track(8);

        set.clear(&mut surface);
        assert!(set.is_empty());
        assert_eq!(surface.removed, vec![7, 8]);
    }
}
