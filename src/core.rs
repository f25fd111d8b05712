use crate::error::{TrailreelError, TrailreelResult};

pub use kurbo::Point;

/// Absolute 0-based frame index in generation timeline space.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Create a validated canvas.
    ///
    /// The CPU raster path stores surfaces with u16 dimensions, so both sides
    /// must fit in u16.
    pub fn new(width: u32, height: u32) -> TrailreelResult<Self> {
        let c = Self { width, height };
        c.validate()?;
        Ok(c)
    }

    pub fn validate(&self) -> TrailreelResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(TrailreelError::validation(
                "canvas width/height must be non-zero",
            ));
        }
        if self.width > u32::from(u16::MAX) || self.height > u32::from(u16::MAX) {
            return Err(TrailreelError::validation(
                "canvas width/height must fit in u16",
            ));
        }
        Ok(())
    }

    /// Number of pixels on the canvas.
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Byte length of one packed RGB frame for this canvas.
    pub fn rgb_len(&self) -> usize {
        self.pixel_count() * 3
    }
}

impl Default for Canvas {
    /// The production canvas is fixed at 1080p.
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

/// Opaque RGB8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgb8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb8 {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// One fully rendered frame: packed RGB8, row-major, top-to-bottom,
/// left-to-right, no alpha.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRgb {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl FrameRgb {
    pub fn validate(&self) -> TrailreelResult<()> {
        let expected = (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(3);
        if self.data.len() != expected {
            return Err(TrailreelError::validation(format!(
                "frame data length {} does not match {}x{} rgb",
                self.data.len(),
                self.width,
                self.height
            )));
        }
        Ok(())
    }

    /// Read one pixel. Returns `None` outside the frame bounds.
    pub fn px(&self, x: u32, y: u32) -> Option<Rgb8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 3;
        let p = self.data.get(i..i + 3)?;
        Some(Rgb8::new(p[0], p[1], p[2]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canvas_rejects_degenerate_sizes() {
        assert!(Canvas::new(0, 10).is_err());
        assert!(Canvas::new(10, 0).is_err());
        assert!(Canvas::new(70_000, 10).is_err());
        assert!(Canvas::new(1920, 1080).is_ok());
    }

    #[test]
    fn default_canvas_is_1080p() {
        let c = Canvas::default();
        assert_eq!((c.width, c.height), (1920, 1080));
        assert_eq!(c.rgb_len(), 1920 * 1080 * 3);
    }

    #[test]
    fn frame_validate_checks_data_length() {
        let ok = FrameRgb {
            width: 2,
            height: 2,
            data: vec![0u8; 12],
        };
        assert!(ok.validate().is_ok());

        let bad = FrameRgb {
            width: 2,
            height: 2,
            data: vec![0u8; 11],
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn px_addresses_row_major_rgb() {
        let mut data = vec![0u8; 12];
        // pixel (1, 1) in a 2x2 frame
        data[9] = 10;
        data[10] = 20;
        data[11] = 30;
        let f = FrameRgb {
            width: 2,
            height: 2,
            data,
        };
        assert_eq!(f.px(1, 1), Some(Rgb8::new(10, 20, 30)));
        assert_eq!(f.px(0, 0), Some(Rgb8::new(0, 0, 0)));
        assert_eq!(f.px(2, 0), None);
    }
}
