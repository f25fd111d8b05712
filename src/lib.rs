//! Trailreel generates short riding-story clips for the Riding Roney channel.
//!
//! Each clip is thirty 1080p frames: a sky gradient backdrop with branding,
//! a centered story title, a sliding window of narrative words, a safety
//! banner and per-frame metadata. The frames land in a placeholder MP4
//! container whose byte layout is fixed, so the artifact downloads like a
//! video without being playable.
//!
//! - Pick a [`StoryCard`] from the catalog with an explicit random source
//! - Compose frames through a [`RenderBackend`] via the [`Storyboard`]
//! - Write the container with [`emit::emit_artifact`]
//! - Or run the whole loop behind the one-button web front end ([`serve`])
#![forbid(unsafe_code)]

pub mod core;
pub mod emit;
pub mod error;
pub mod generate;
pub mod render;
pub mod render_cpu;
pub mod server;
pub mod story;
pub mod storyboard;

pub use crate::core::{Canvas, FrameIndex, FrameRgb, Point, Rgb8};
pub use crate::emit::{artifact_len, emit_artifact};
pub use crate::error::{TrailreelError, TrailreelResult};
pub use crate::generate::{GenerateOpts, Generator, VideoArtifact, artifact_file_name};
pub use crate::render::{
    BackendKind, FontSource, FontWeight, RenderBackend, RenderSettings, TextStyle, create_backend,
};
pub use crate::render_cpu::{CpuBackend, locate_system_font};
pub use crate::server::{DEFAULT_ADDR, serve};
pub use crate::story::{StoryCard, builtin_cards, load_cards, pick_card, sanitize_title};
pub use crate::storyboard::{SKY_BLUE, STEEL_BLUE, Storyboard, TOTAL_FRAMES};
