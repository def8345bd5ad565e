use glam::Vec2;
use pose_api::{BoundingBox, CoordinateConvention, FramePose, LandmarkSet, LandmarkSource};

use crate::topology::{valid_edges, Topology};
use crate::{build_transform, DrawRect, OverlayConfig, OverlayLayout};

/// Anything a skeleton can be drawn onto.
pub trait DrawSurface {
    /// The background frame, already letterboxed into `rect`.
    fn draw_image(&mut self, rect: DrawRect);
    fn draw_bone(&mut self, from: Vec2, to: Vec2);
    fn draw_joint(&mut self, at: Vec2, index: usize);
}

/// The one landmark set a render call uses, with the box that applies to it.
#[derive(Debug, Clone, Copy)]
pub struct SelectedSet<'a> {
    pub set: &'a LandmarkSet,
    pub bbox: Option<&'a BoundingBox>,
}

fn non_empty(set: Option<&LandmarkSet>) -> Option<&LandmarkSet> {
    set.filter(|s| !s.is_empty())
}

/// Picks a set by priority: high-fidelity, then body-model, then generic.
///
/// Within the body-model tier the projected set is used when its box is
/// present; the original-pixel set stands in when there is no box.
pub fn select_landmark_set(frame: &FramePose) -> Option<SelectedSet<'_>> {
    if let Some(set) = non_empty(frame.high_fidelity.as_ref()) {
        return Some(SelectedSet { set, bbox: None });
    }

    let body_model = non_empty(frame.body_model.as_ref());
    let body_model_original = non_empty(frame.body_model_original.as_ref());
    match (body_model, frame.body_bbox.as_ref(), body_model_original) {
        (Some(set), Some(bbox), _) => return Some(SelectedSet { set, bbox: Some(bbox) }),
        (_, _, Some(set)) => return Some(SelectedSet { set, bbox: None }),
        (Some(set), None, None) => return Some(SelectedSet { set, bbox: None }),
        _ => {}
    }

    non_empty(frame.generic.as_ref()).map(|set| SelectedSet { set, bbox: None })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OverlayOutcome {
    /// The frame carried no usable landmark set; only the background was drawn.
    NoPoseData,
    Drawn {
        source: LandmarkSource,
        topology: Topology,
        convention: CoordinateConvention,
        bones: usize,
        joints: usize,
    },
}

/// Draws one frame: background, then visible bones, then visible joints.
pub fn render_overlay(
    frame: &FramePose,
    surface: &mut impl DrawSurface,
    layout: &OverlayLayout,
    config: &OverlayConfig,
) -> OverlayOutcome {
    if layout.image_size.is_some() {
        surface.draw_image(layout.fitted_rect());
    }

    let Some(SelectedSet { set, bbox }) = select_landmark_set(frame) else {
        tracing::debug!("frame {} has no landmark set", frame.frame_index);
        return OverlayOutcome::NoPoseData;
    };

    let transform = build_transform(set, bbox, layout, config);
    let topology = Topology::select(set.source, set.len());
    let points: Vec<Vec2> = set
        .landmarks
        .iter()
        .map(|lm| transform.apply(lm.xy()))
        .collect();
    let threshold = config.visibility_threshold;

    let mut bones = 0;
    for (a, b) in valid_edges(topology.edges(), set.len()) {
        if set.landmarks[a].is_drawable(threshold) && set.landmarks[b].is_drawable(threshold) {
            surface.draw_bone(points[a], points[b]);
            bones += 1;
        }
    }

    let mut joints = 0;
    for (index, landmark) in set.landmarks.iter().enumerate() {
        if landmark.is_drawable(threshold) {
            surface.draw_joint(points[index], index);
            joints += 1;
        }
    }

    OverlayOutcome::Drawn {
        source: set.source,
        topology,
        convention: transform.convention(),
        bones,
        joints,
    }
}
