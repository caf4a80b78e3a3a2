//! Screen layout of UI elements and text
//!
//! Both depend on the window size, so a resize clears every cached layout.

use std::ops::Range;

use crate::foundation::math::{Mat2, Vec2};
use crate::render::primitives::{FlatMesh, Text, TextLayout, UiElement, UiTransform};
use crate::render::registry::Store;
use crate::render::RenderResult;

/// Recompute stale UI element transforms over a slot range
///
/// Returns how many elements were recomputed.
pub fn update_ui_elements(
    elements: &mut Store<UiElement>,
    flat_meshes: &Store<FlatMesh>,
    range: Range<usize>,
    window_size: Vec2,
) -> RenderResult<usize> {
    let mut updated = 0;
    for element in elements.slots_mut(range)?.iter_mut().flatten() {
        if element.matrix_valid {
            continue;
        }

        let extent = flat_meshes.get(element.flat_mesh)?.extent();
        let size = extent.component_mul(&element.scale);
        let (sin, cos) = element.rotation.sin_cos();

        element.transform = UiTransform {
            rotation: Mat2::new(cos, -sin, sin, cos),
            scale: element.scale,
            translate: element.position.to_top_left(size, window_size),
        };
        element.matrix_valid = true;
        updated += 1;
    }
    Ok(updated)
}

/// Recompute stale text layouts over a slot range
///
/// Text that has not been rasterized yet has no size and is left for a later
/// pass.
pub fn update_text_layouts(texts: &mut Store<Text>, range: Range<usize>, window_size: Vec2) -> RenderResult<usize> {
    let mut updated = 0;
    for text in texts.slots_mut(range)?.iter_mut().flatten() {
        if text.layout_valid || !text.state.cpu_ready() {
            continue;
        }

        let size = text.size();
        let corner = text.position.to_top_left(size, window_size);
        text.layout = TextLayout {
            origin: corner.component_div(&window_size),
            size: size.component_div(&window_size),
        };
        text.layout_valid = true;
        updated += 1;
    }
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::systems::text::{FontDesc, FontId};
    use crate::render::systems::ui::{Anchor, Position};
    use crate::render::RenderError;
    use approx::assert_relative_eq;

    const WINDOW: Vec2 = Vec2::new(800.0, 600.0);

    #[test]
    fn test_ui_element_transform() {
        let mut flats = Store::new();
        let quad = flats.add(FlatMesh::rectangle(100.0, 50.0));
        let mut elements = Store::new();
        let handle = elements.add(UiElement::new(
            quad,
            None,
            Position::new(0.0, 0.0, Anchor::Center, Anchor::Center),
            0,
        ));
        elements.get_mut(handle).unwrap().scale = Vec2::new(2.0, 2.0);

        let range = elements.full_range();
        assert_eq!(update_ui_elements(&mut elements, &flats, range, WINDOW).unwrap(), 1);
        let element = elements.get(handle).unwrap();
        assert!(element.matrix_valid());
        assert_eq!(element.transform().translate, Vec2::new(300.0, 250.0));
        assert_relative_eq!(element.transform().rotation, Mat2::identity());

        // Already valid, nothing to do.
        let range = elements.full_range();
        assert_eq!(update_ui_elements(&mut elements, &flats, range, WINDOW).unwrap(), 0);
    }

    #[test]
    fn test_ui_element_with_deleted_flat_mesh() {
        let mut flats = Store::new();
        let quad = flats.add(FlatMesh::rectangle(1.0, 1.0));
        let mut elements = Store::new();
        elements.add(UiElement::new(quad, None, Position::default(), 0));
        flats.remove(quad).unwrap();

        let range = elements.full_range();
        let result = update_ui_elements(&mut elements, &flats, range, WINDOW);
        assert!(matches!(result, Err(RenderError::InvalidHandle { kind: "flat mesh", .. })));
    }

    #[test]
    fn test_text_layout_waits_for_rasterization() {
        let mut texts = Store::new();
        let font = FontDesc::new(FontId(0), 16.0);
        let handle = texts.add(Text::new("hi", font, [1.0; 4], Position::top_left(80.0, 60.0), 0, 0));

        let range = texts.full_range();
        assert_eq!(update_text_layouts(&mut texts, range, WINDOW).unwrap(), 0);

        let text = texts.get_mut(handle).unwrap();
        text.width = 160;
        text.height = 30;
        text.state.mark_cpu_ready();

        let range = texts.full_range();
        assert_eq!(update_text_layouts(&mut texts, range, WINDOW).unwrap(), 1);
        let layout = texts.get(handle).unwrap().layout();
        assert_relative_eq!(layout.origin, Vec2::new(0.1, 0.1));
        assert_relative_eq!(layout.size, Vec2::new(0.2, 0.05));
    }
}
