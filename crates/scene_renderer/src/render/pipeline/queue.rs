//! Draw ordering
//!
//! Two orderings are needed per frame: blended geometry back-to-front from
//! the camera, and the overlay by depth. Both sorts are stable, so entries
//! that compare equal keep their slot order.

use std::cmp::Ordering;

/// One object queued for the forward or transparent pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawItem {
    /// Object slot
    pub slot: usize,
    /// Distance from the camera eye
    pub distance: f32,
    /// Lit permutation
    pub shaded: bool,
}

/// Sort far to near; at equal distance shaded objects come first
pub fn sort_back_to_front(items: &mut [DrawItem]) {
    items.sort_by(|a, b| {
        b.distance
            .total_cmp(&a.distance)
            .then_with(|| b.shaded.cmp(&a.shaded))
    });
}

/// Kind of an overlay entry; the declaration order is the draw order at
/// equal depth
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OverlayKind {
    /// UI element
    Ui,
    /// Text
    Text,
}

/// One overlay draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayItem {
    /// Entity kind
    pub kind: OverlayKind,
    /// Slot in the kind's store
    pub slot: usize,
    /// Z-order, higher on top
    pub depth: i32,
}

impl OverlayItem {
    fn order(&self, other: &Self) -> Ordering {
        self.depth.cmp(&other.depth).then(self.kind.cmp(&other.kind))
    }
}

/// Merge UI elements and texts into one list in draw order
///
/// Ascending depth; UI elements before text at equal depth.
pub fn merge_overlay(
    ui: impl IntoIterator<Item = (usize, i32)>,
    text: impl IntoIterator<Item = (usize, i32)>,
) -> Vec<OverlayItem> {
    let mut items: Vec<_> = ui
        .into_iter()
        .map(|(slot, depth)| OverlayItem { kind: OverlayKind::Ui, slot, depth })
        .chain(
            text.into_iter()
                .map(|(slot, depth)| OverlayItem { kind: OverlayKind::Text, slot, depth }),
        )
        .collect();
    items.sort_by(OverlayItem::order);
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(slot: usize, distance: f32, shaded: bool) -> DrawItem {
        DrawItem { slot, distance, shaded }
    }

    #[test]
    fn test_back_to_front() {
        let mut items = vec![item(0, 1.0, true), item(1, 5.0, true), item(2, 3.0, false)];
        sort_back_to_front(&mut items);
        let slots: Vec<_> = items.iter().map(|i| i.slot).collect();
        assert_eq!(slots, vec![1, 2, 0]);
    }

    #[test]
    fn test_shaded_first_at_equal_distance() {
        let mut items = vec![item(0, 2.0, false), item(1, 2.0, true), item(2, 2.0, false), item(3, 2.0, true)];
        sort_back_to_front(&mut items);
        let slots: Vec<_> = items.iter().map(|i| i.slot).collect();
        assert_eq!(slots, vec![1, 3, 0, 2]);
    }

    #[test]
    fn test_ui_before_text_at_equal_depth() {
        // Text was inserted "first" in slot terms; kind still decides.
        let items = merge_overlay([(4, 1)], [(0, 1)]);
        assert_eq!(items[0].kind, OverlayKind::Ui);
        assert_eq!(items[1].kind, OverlayKind::Text);
    }

    #[test]
    fn test_overlay_depth_then_kind_then_slot() {
        let items = merge_overlay([(0, 2), (1, 0), (2, 2)], [(0, 0), (1, -1), (2, 2)]);
        let order: Vec<_> = items.iter().map(|i| (i.depth, i.kind, i.slot)).collect();
        assert_eq!(
            order,
            vec![
                (-1, OverlayKind::Text, 1),
                (0, OverlayKind::Ui, 1),
                (0, OverlayKind::Text, 0),
                (2, OverlayKind::Ui, 0),
                (2, OverlayKind::Ui, 2),
                (2, OverlayKind::Text, 2),
            ]
        );
    }
}
