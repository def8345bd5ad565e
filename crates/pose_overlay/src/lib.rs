use glam::Vec2;
use serde::{Deserialize, Serialize};

pub use layout::{DrawRect, OverlayLayout};
pub use normalize::{build_transform, resolve_convention, PixelTransform, RangeStats};
pub use render::{render_overlay, select_landmark_set, DrawSurface, OverlayOutcome, SelectedSet};
pub use selection::{FrameSelection, LoadTicket};
pub use topology::{select_topology, valid_edges, Edge, Topology};

mod layout;
mod normalize;
mod render;
mod selection;
pub mod topology;

/// Thresholds of the coordinate heuristics and of visibility gating.
///
/// The numeric thresholds have no documented derivation; they are kept as
/// observed on real detector output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// A landmark is drawn only when its visibility exceeds this.
    pub visibility_threshold: f32,
    /// An axis minimum below `-centered_threshold` marks a signed, box-centered set.
    pub centered_threshold: f32,
    /// Without a box, any magnitude above this marks full-image pixels.
    pub pixel_magnitude_threshold: f32,
    /// With a box, a spread at or above this marks detector-input pixels.
    pub spread_threshold: f32,
    /// Floor for the y-range used to scale a centered set.
    pub min_y_range: f32,
    /// Width and height of the detector input canvas.
    pub detector_input_size: Vec2,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            visibility_threshold: 0.3,
            centered_threshold: 0.1,
            pixel_magnitude_threshold: 1.5,
            spread_threshold: 2.0,
            min_y_range: 0.1,
            detector_input_size: Vec2::new(192.0, 256.0),
        }
    }
}
