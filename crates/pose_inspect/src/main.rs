use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use glam::Vec2;
use pose_api::{parse_frames, BodyPose, CorrectionsPayload, FramePose};
use pose_overlay::{render_overlay, DrawRect, DrawSurface, OverlayConfig, OverlayLayout, OverlayOutcome};
use pose_rig::{smooth_sequence, CorrectionStore, PoseViewer, RetargetConfig};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
struct Options {
    /// Pose session file: a JSON array of frames.
    pub poses: PathBuf,
    /// Bind skeleton (GLB or glTF) to retarget onto.
    #[arg(long, short = 's')]
    pub skeleton: Option<PathBuf>,
    /// Saved corrections to apply.
    #[arg(long, short = 'c')]
    pub corrections: Option<PathBuf>,
    /// Overlay and retarget settings as JSON.
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long, short = 'f', default_value = "0")]
    pub frame: u32,
    /// Smooth body rotations over time with this sigma, in frames.
    #[arg(long)]
    pub smooth: Option<f32>,
    #[arg(long, short = 'W', default_value = "1920")]
    pub width: f32,
    #[arg(long, short = 'H', default_value = "1080")]
    pub height: f32,
    #[arg(long)]
    pub image_width: Option<f32>,
    #[arg(long)]
    pub image_height: Option<f32>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct InspectConfig {
    overlay: OverlayConfig,
    retarget: RetargetConfig,
}

struct PrintSurface;

impl DrawSurface for PrintSurface {
    fn draw_image(&mut self, rect: DrawRect) {
        println!("image   {} {}", rect.offset, rect.size);
    }

    fn draw_bone(&mut self, from: Vec2, to: Vec2) {
        println!("bone    {from} -> {to}");
    }

    fn draw_joint(&mut self, at: Vec2, index: usize) {
        println!("joint   {index:>3} {at}");
    }
}

fn read(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

fn smooth_frames(frames: &mut [FramePose], sigma: f32) {
    let indices: Vec<usize> = frames
        .iter()
        .enumerate()
        .filter(|(_, f)| f.body_pose.is_some())
        .map(|(i, _)| i)
        .collect();
    let poses: Vec<BodyPose> = indices
        .iter()
        .filter_map(|&i| frames[i].body_pose.clone())
        .collect();
    for (i, pose) in indices.into_iter().zip(smooth_sequence(&poses, sigma)) {
        frames[i].body_pose = Some(pose);
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().init();
    let options = Options::parse();

    let config = match &options.config {
        Some(path) => serde_json::from_slice::<InspectConfig>(&read(path)?)?,
        None => InspectConfig::default(),
    };

    let mut frames = parse_frames(&read(&options.poses)?)?;
    tracing::info!("loaded {} frames", frames.len());
    if let Some(sigma) = options.smooth {
        smooth_frames(&mut frames, sigma);
    }

    let frame = frames
        .iter()
        .find(|f| f.frame_index == options.frame)
        .or_else(|| frames.get(options.frame as usize))
        .with_context(|| format!("no frame {}", options.frame))?;

    let mut layout = OverlayLayout::new(DrawRect::from_size(options.width, options.height));
    if let (Some(w), Some(h)) = (options.image_width, options.image_height) {
        layout = layout.with_image(w, h);
    }

    match render_overlay(frame, &mut PrintSurface, &layout, &config.overlay) {
        OverlayOutcome::NoPoseData => println!("frame {} has no pose data", frame.frame_index),
        OverlayOutcome::Drawn {
            source,
            topology,
            convention,
            bones,
            joints,
        } => println!(
            "drew {bones} bones and {joints} joints from {source:?} ({topology:?}, {convention:?})"
        ),
    }

    let Some(skeleton) = &options.skeleton else {
        return Ok(());
    };

    let mut viewer = PoseViewer::new(config.retarget);
    if !viewer.load_skeleton(&read(skeleton)?) {
        anyhow::bail!("could not load skeleton {}", skeleton.display());
    }
    if let Some(path) = &options.corrections {
        let payload = serde_json::from_slice::<CorrectionsPayload>(&read(path)?)?;
        tracing::info!("applying {} corrections", payload.correction_count());
        *viewer.corrections_mut() = CorrectionStore::from_payload(payload);
    }

    if !viewer.show_frame(frame) {
        println!("frame {} has no body rotations", frame.frame_index);
        return Ok(());
    }
    if let Some(skeleton) = viewer.skeleton() {
        for bone in skeleton.bones() {
            let (axis, angle) = bone.rotation.to_axis_angle();
            println!("{:<28} {:>8.2} deg about {}", bone.name, angle.to_degrees(), axis);
        }
    }

    Ok(())
}
