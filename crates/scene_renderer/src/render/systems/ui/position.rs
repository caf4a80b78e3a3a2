//! Anchored screen positions
//!
//! A [`Position`] is an offset in pixels from a point of the window (the
//! window anchor) to a point of the positioned object (the object anchor).
//! +x points right and +y points down.

use crate::foundation::math::Vec2;

/// Anchor point on a window or an object, 9-way
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Anchor {
    /// Top-left corner
    #[default]
    TopLeft,
    /// Top edge centre
    TopCenter,
    /// Top-right corner
    TopRight,
    /// Left edge centre
    MiddleLeft,
    /// Centre
    Center,
    /// Right edge centre
    MiddleRight,
    /// Bottom-left corner
    BottomLeft,
    /// Bottom edge centre
    BottomCenter,
    /// Bottom-right corner
    BottomRight,
}

impl Anchor {
    /// Get the normalized anchor position (0.0 to 1.0)
    pub const fn to_normalized(self) -> (f32, f32) {
        match self {
            Self::TopLeft => (0.0, 0.0),
            Self::TopCenter => (0.5, 0.0),
            Self::TopRight => (1.0, 0.0),
            Self::MiddleLeft => (0.0, 0.5),
            Self::Center => (0.5, 0.5),
            Self::MiddleRight => (1.0, 0.5),
            Self::BottomLeft => (0.0, 1.0),
            Self::BottomCenter => (0.5, 1.0),
            Self::BottomRight => (1.0, 1.0),
        }
    }

    /// Pixel offset of this anchor from the top-left corner of a `size` box
    pub fn offset_in(self, size: Vec2) -> Vec2 {
        let (x, y) = self.to_normalized();
        Vec2::new(x * size.x, y * size.y)
    }
}

/// Offset between a window anchor and an object anchor
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    /// Horizontal offset in pixels
    pub x: f32,
    /// Vertical offset in pixels
    pub y: f32,
    /// Reference point on the window
    pub window_anchor: Anchor,
    /// Reference point on the object
    pub object_anchor: Anchor,
}

impl Position {
    /// Create a position
    pub const fn new(x: f32, y: f32, window_anchor: Anchor, object_anchor: Anchor) -> Self {
        Self { x, y, window_anchor, object_anchor }
    }

    /// Offset from the window's top-left corner, both anchors at `TopLeft`
    pub const fn top_left(x: f32, y: f32) -> Self {
        Self::new(x, y, Anchor::TopLeft, Anchor::TopLeft)
    }

    /// Window pixel coordinates of the object's top-left corner
    pub fn to_top_left(&self, object_size: Vec2, window_size: Vec2) -> Vec2 {
        // Object anchor back to the object's corner, then window anchor back
        // to the window's corner.
        let local = Vec2::new(self.x, self.y) - self.object_anchor.offset_in(object_size);
        local + self.window_anchor.offset_in(window_size)
    }

    /// Same placement expressed against a different pair of anchors
    pub fn with_anchors(
        &self,
        window_anchor: Anchor,
        object_anchor: Anchor,
        object_size: Vec2,
        window_size: Vec2,
    ) -> Self {
        if window_anchor == self.window_anchor && object_anchor == self.object_anchor {
            return *self;
        }

        let corner = self.to_top_left(object_size, window_size);
        let offset = corner - window_anchor.offset_in(window_size) + object_anchor.offset_in(object_size);
        Self::new(offset.x, offset.y, window_anchor, object_anchor)
    }
}
