use glam::Vec2;
use pose_api::{BoundingBox, CoordinateConvention, Landmark, LandmarkSet};

use crate::{DrawRect, OverlayConfig, OverlayLayout};

/// Per-axis extent of the real (non-placeholder) landmarks of a set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeStats {
    pub min: Vec2,
    pub max: Vec2,
}

impl RangeStats {
    pub fn of(landmarks: &[Landmark]) -> Option<RangeStats> {
        let mut points = landmarks
            .iter()
            .filter(|lm| !lm.is_placeholder())
            .map(Landmark::xy)
            .filter(|p| p.is_finite());
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(RangeStats { min, max })
    }

    pub fn spread(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn max_magnitude(&self) -> f32 {
        self.min.abs().max(self.max.abs()).max_element()
    }
}

#[cfg(feature = "legacy-sniffing")]
fn sniff_convention(
    stats: Option<&RangeStats>,
    has_bbox: bool,
    config: &OverlayConfig,
) -> CoordinateConvention {
    let Some(stats) = stats else {
        return CoordinateConvention::NormalizedUnit;
    };

    if has_bbox {
        let spread = stats.spread();
        if spread.x < config.spread_threshold && spread.y < config.spread_threshold {
            if stats.min.min_element() < -config.centered_threshold {
                CoordinateConvention::BBoxCenteredSigned
            } else {
                CoordinateConvention::BBoxRelativeUnit
            }
        } else {
            CoordinateConvention::DetectorInputPixel
        }
    } else if stats.max_magnitude() > config.pixel_magnitude_threshold {
        CoordinateConvention::ImagePixel
    } else {
        CoordinateConvention::NormalizedUnit
    }
}

#[cfg(not(feature = "legacy-sniffing"))]
fn sniff_convention(
    _stats: Option<&RangeStats>,
    _has_bbox: bool,
    _config: &OverlayConfig,
) -> CoordinateConvention {
    CoordinateConvention::NormalizedUnit
}

fn needs_bbox(convention: CoordinateConvention) -> bool {
    matches!(
        convention,
        CoordinateConvention::BBoxRelativeUnit
            | CoordinateConvention::BBoxCenteredSigned
            | CoordinateConvention::DetectorInputPixel
    )
}

/// The convention a set is drawn with: its ingestion tag when present,
/// otherwise the numeric heuristics.
pub fn resolve_convention(
    set: &LandmarkSet,
    bbox: Option<&BoundingBox>,
    config: &OverlayConfig,
) -> CoordinateConvention {
    let stats = RangeStats::of(&set.landmarks);
    resolve_with_stats(set.convention, stats.as_ref(), bbox.is_some(), config)
}

fn resolve_with_stats(
    tag: Option<CoordinateConvention>,
    stats: Option<&RangeStats>,
    has_bbox: bool,
    config: &OverlayConfig,
) -> CoordinateConvention {
    match tag {
        Some(convention) if needs_bbox(convention) && !has_bbox => {
            tracing::debug!("{:?} tag without a bounding box, using normalized", convention);
            CoordinateConvention::NormalizedUnit
        }
        Some(convention) => convention,
        None => sniff_convention(stats, has_bbox, config),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Mapping {
    Unit,
    Pixel,
    BoxUnit(BoundingBox),
    BoxCentered { center: Vec2, scale: f32 },
    DetectorInput { bbox: BoundingBox, canvas: Vec2 },
}

/// A resolved `(x, y) -> surface pixel` mapping for one landmark set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelTransform {
    convention: CoordinateConvention,
    mapping: Mapping,
    source_size: Vec2,
    target: DrawRect,
}

impl PixelTransform {
    pub fn new(
        convention: CoordinateConvention,
        bbox: Option<&BoundingBox>,
        stats: Option<&RangeStats>,
        layout: &OverlayLayout,
        config: &OverlayConfig,
    ) -> Self {
        let mapping = match (convention, bbox) {
            (CoordinateConvention::GlobalPixel | CoordinateConvention::ImagePixel, _) => {
                Mapping::Pixel
            }
            (CoordinateConvention::BBoxRelativeUnit, Some(bbox)) => Mapping::BoxUnit(*bbox),
            (CoordinateConvention::BBoxCenteredSigned, Some(bbox)) => {
                let y_range = stats.map(|s| s.spread().y).unwrap_or(0.0);
                Mapping::BoxCentered {
                    center: bbox.center(),
                    scale: bbox.size().y / y_range.max(config.min_y_range),
                }
            }
            (CoordinateConvention::DetectorInputPixel, Some(bbox)) => Mapping::DetectorInput {
                bbox: *bbox,
                canvas: config.detector_input_size.max(Vec2::ONE),
            },
            _ => Mapping::Unit,
        };

        let convention = if mapping == Mapping::Unit {
            CoordinateConvention::NormalizedUnit
        } else {
            convention
        };

        Self {
            convention,
            mapping,
            source_size: layout.source_size(),
            target: layout.fitted_rect(),
        }
    }

    pub fn convention(&self) -> CoordinateConvention {
        self.convention
    }

    /// The position in `[0, 1]` of the source image.
    pub fn to_unit(&self, p: Vec2) -> Vec2 {
        match self.mapping {
            Mapping::Unit => p,
            Mapping::Pixel => p / self.source_size,
            Mapping::BoxUnit(bbox) => (bbox.min + p * bbox.size()) / self.source_size,
            Mapping::BoxCentered { center, scale } => (center + p * scale) / self.source_size,
            Mapping::DetectorInput { bbox, canvas } => {
                (bbox.min + p / canvas * bbox.size()) / self.source_size
            }
        }
    }

    pub fn apply(&self, p: Vec2) -> Vec2 {
        self.target.map_unit(self.to_unit(p))
    }
}

/// Decides how a landmark set's numbers map onto the layout and returns the mapping.
///
/// Tagged sets use their tag. Untagged sets go through the cascade: with a box,
/// a small spread is box-relative (signed and centered if any axis dips below
/// the centered threshold) and a large one is detector-input pixels; without a
/// box, large magnitudes are full-image pixels and everything else is `[0, 1]`.
pub fn build_transform(
    set: &LandmarkSet,
    bbox: Option<&BoundingBox>,
    layout: &OverlayLayout,
    config: &OverlayConfig,
) -> PixelTransform {
    let stats = RangeStats::of(&set.landmarks);
    let convention = resolve_with_stats(set.convention, stats.as_ref(), bbox.is_some(), config);
    PixelTransform::new(convention, bbox, stats.as_ref(), layout, config)
}
