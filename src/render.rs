use std::path::PathBuf;

use crate::{
    core::{Canvas, FrameRgb, Point, Rgb8},
    error::{TrailreelError, TrailreelResult},
};

/// Where the backend finds its font faces.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum FontSource {
    /// Probe a fixed list of well-known system font paths.
    #[default]
    System,
    /// Use one explicit TTF/OTF file for every weight.
    File(PathBuf),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FontWeight {
    Regular,
    Bold,
}

/// Styling for one text draw call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    /// Font size in pixels.
    pub size_px: f32,
    pub weight: FontWeight,
    pub color: Rgb8,
}

impl TextStyle {
    pub const fn new(size_px: f32, weight: FontWeight, color: Rgb8) -> Self {
        Self {
            size_px,
            weight,
            color,
        }
    }

    pub fn validate(&self) -> TrailreelResult<()> {
        if !self.size_px.is_finite() || self.size_px <= 0.0 {
            return Err(TrailreelError::validation(
                "text size_px must be finite and > 0",
            ));
        }
        Ok(())
    }
}

/// The drawing capabilities a frame composition needs.
///
/// One frame is bracketed by `begin_frame` and `end_frame`; gradient and text
/// calls are only valid in between. Text positions name the left edge of the
/// baseline, matching the layout rules of the storyboard.
pub trait RenderBackend: Send {
    fn begin_frame(&mut self) -> TrailreelResult<()>;

    /// Fill the whole canvas with a linear gradient running diagonally from
    /// the top-left corner (`from`) to the bottom-right corner (`to`).
    fn fill_gradient(&mut self, from: Rgb8, to: Rgb8) -> TrailreelResult<()>;

    fn draw_text(&mut self, text: &str, at: Point, style: &TextStyle) -> TrailreelResult<()>;

    /// Advance width of `text` in pixels for the style's font.
    fn measure_text(&mut self, text: &str, style: &TextStyle) -> TrailreelResult<f64>;

    fn end_frame(&mut self) -> TrailreelResult<FrameRgb>;
}

#[derive(Clone, Copy, Debug)]
pub enum BackendKind {
    Cpu,
}

#[derive(Clone, Debug, Default)]
pub struct RenderSettings {
    pub canvas: Canvas,
    pub font: FontSource,
}

impl RenderSettings {
    pub fn validate(&self) -> TrailreelResult<()> {
        self.canvas.validate()
    }
}

pub fn create_backend(
    kind: BackendKind,
    settings: &RenderSettings,
) -> TrailreelResult<Box<dyn RenderBackend>> {
    settings.validate()?;
    match kind {
        BackendKind::Cpu => Ok(Box::new(crate::render_cpu::CpuBackend::new(
            settings.clone(),
        )?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_style_rejects_bad_sizes() {
        let white = Rgb8::new(255, 255, 255);
        assert!(TextStyle::new(0.0, FontWeight::Regular, white).validate().is_err());
        assert!(
            TextStyle::new(f32::NAN, FontWeight::Bold, white)
                .validate()
                .is_err()
        );
        assert!(TextStyle::new(32.0, FontWeight::Regular, white).validate().is_ok());
    }

    #[test]
    fn settings_validation_covers_the_canvas() {
        let bad = RenderSettings {
            canvas: Canvas {
                width: 0,
                height: 1080,
            },
            font: FontSource::System,
        };
        assert!(bad.validate().is_err());
        assert!(RenderSettings::default().validate().is_ok());
    }

    #[test]
    fn cpu_backend_is_constructible() {
        assert!(create_backend(BackendKind::Cpu, &RenderSettings::default()).is_ok());
    }
}
