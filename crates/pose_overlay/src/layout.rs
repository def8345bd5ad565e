use glam::Vec2;
use serde::{Deserialize, Serialize};

/// A rectangle on the draw surface, in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawRect {
    pub offset: Vec2,
    pub size: Vec2,
}

impl DrawRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            offset: Vec2::new(x, y),
            size: Vec2::new(width, height),
        }
    }

    pub fn from_size(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// The sub-rectangle an image of `image_size` occupies when scaled to fit
    /// inside this one with its aspect ratio preserved, centered.
    pub fn letterbox(&self, image_size: Vec2) -> DrawRect {
        if image_size.x <= 0.0 || image_size.y <= 0.0 {
            return *self;
        }

        let scale = (self.size.x / image_size.x).min(self.size.y / image_size.y);
        let size = image_size * scale;
        DrawRect {
            offset: self.offset + (self.size - size) * 0.5,
            size,
        }
    }

    /// Maps `[0, 1]` coordinates onto this rectangle.
    pub fn map_unit(&self, unit: Vec2) -> Vec2 {
        self.offset + unit * self.size
    }
}

/// Where one render call draws: the surface rectangle plus the natural size of
/// the background image, if one is known.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayLayout {
    pub draw_rect: DrawRect,
    pub image_size: Option<Vec2>,
}

impl OverlayLayout {
    pub fn new(draw_rect: DrawRect) -> Self {
        Self {
            draw_rect,
            image_size: None,
        }
    }

    pub fn with_image(mut self, width: f32, height: f32) -> Self {
        self.image_size = Some(Vec2::new(width, height));
        self
    }

    /// The rectangle the background image (and therefore every landmark) lands in.
    pub fn fitted_rect(&self) -> DrawRect {
        match self.image_size {
            Some(size) => self.draw_rect.letterbox(size),
            None => self.draw_rect,
        }
    }

    /// Pixel size of the source image; the draw rect stands in when unknown.
    pub fn source_size(&self) -> Vec2 {
        self.image_size
            .filter(|size| size.x > 0.0 && size.y > 0.0)
            .unwrap_or(self.draw_rect.size)
            .max(Vec2::ONE)
    }
}
