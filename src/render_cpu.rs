use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    core::{FrameRgb, Point, Rgb8},
    error::{TrailreelError, TrailreelResult},
    render::{FontSource, FontWeight, RenderBackend, RenderSettings, TextStyle},
};

/// RGBA8 brush color used by Parley text layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct TextBrushRgba8 {
    r: u8,
    g: u8,
    b: u8,
    a: u8,
}

/// Well-known sans faces to probe when no font file is configured.
/// Each entry pairs a regular face with its bold sibling.
const SYSTEM_FONT_CANDIDATES: &[(&str, &str)] = &[
    (
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    ),
    (
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    ),
    (
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    ),
    (
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    ),
    (
        "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
        "/usr/share/fonts/liberation/LiberationSans-Bold.ttf",
    ),
    (
        "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
        "/usr/share/fonts/truetype/freefont/FreeSansBold.ttf",
    ),
    (
        "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
        "/usr/share/fonts/truetype/noto/NotoSans-Bold.ttf",
    ),
    (
        "/System/Library/Fonts/Supplemental/Arial.ttf",
        "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    ),
];

/// First existing candidate pair: the regular face plus, when present on
/// disk, its bold sibling.
pub fn locate_system_font() -> Option<(PathBuf, Option<PathBuf>)> {
    for (regular, bold) in SYSTEM_FONT_CANDIDATES {
        let r = Path::new(regular);
        if r.is_file() {
            let b = Path::new(bold);
            let bold_path = if b.is_file() {
                Some(b.to_path_buf())
            } else {
                None
            };
            return Some((r.to_path_buf(), bold_path));
        }
    }
    None
}

#[derive(Clone)]
struct FontSlot {
    family: String,
    font: vello_cpu::peniko::FontData,
}

struct FontSlots {
    regular: FontSlot,
    bold: FontSlot,
}

/// Stateful helper for shaping text from explicitly provided font bytes.
///
/// Font resolution is lazy so gradient-only rendering works on hosts with no
/// fonts installed; the first text operation performs the probe.
struct TextEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    source: FontSource,
    slots: Option<FontSlots>,
}

impl TextEngine {
    fn new(source: FontSource) -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            source,
            slots: None,
        }
    }

    fn ensure_slots(&mut self) -> TrailreelResult<()> {
        if self.slots.is_some() {
            return Ok(());
        }

        let (regular_bytes, bold_bytes) = match &self.source {
            FontSource::File(path) => (read_font_bytes(path)?, None),
            FontSource::System => {
                let Some((regular, bold)) = locate_system_font() else {
                    return Err(TrailreelError::render(
                        "no usable system font found; pass an explicit font file",
                    ));
                };
                let regular_bytes = read_font_bytes(&regular)?;
                let bold_bytes = match bold {
                    Some(p) => Some(read_font_bytes(&p)?),
                    None => None,
                };
                (regular_bytes, bold_bytes)
            }
        };

        let regular = register_slot(&mut self.font_ctx, regular_bytes)?;
        let bold = match bold_bytes {
            Some(bytes) => register_slot(&mut self.font_ctx, bytes)?,
            // Without a bold sibling both weights shape with the regular face.
            None => regular.clone(),
        };
        self.slots = Some(FontSlots { regular, bold });
        Ok(())
    }

    fn slot_for(&mut self, weight: FontWeight) -> TrailreelResult<FontSlot> {
        self.ensure_slots()?;
        let slots = self
            .slots
            .as_ref()
            .ok_or_else(|| TrailreelError::render("font slots unavailable"))?;
        Ok(match weight {
            FontWeight::Regular => slots.regular.clone(),
            FontWeight::Bold => slots.bold.clone(),
        })
    }

    /// Shape and lay out one run of styled text.
    fn layout(
        &mut self,
        text: &str,
        style: &TextStyle,
    ) -> TrailreelResult<(parley::Layout<TextBrushRgba8>, FontSlot)> {
        style.validate()?;
        let slot = self.slot_for(style.weight)?;
        let brush = TextBrushRgba8 {
            r: style.color.r,
            g: style.color.g,
            b: style.color.b,
            a: 255,
        };

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(slot.family.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(style.size_px));
        builder.push_default(parley::style::StyleProperty::FontWeight(
            match style.weight {
                FontWeight::Regular => parley::style::FontWeight::NORMAL,
                FontWeight::Bold => parley::style::FontWeight::BOLD,
            },
        ));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        Ok((layout, slot))
    }
}

fn read_font_bytes(path: &Path) -> TrailreelResult<Vec<u8>> {
    std::fs::read(path).map_err(|e| {
        TrailreelError::render(format!("failed to read font '{}': {e}", path.display()))
    })
}

fn register_slot(
    font_ctx: &mut parley::FontContext,
    bytes: Vec<u8>,
) -> TrailreelResult<FontSlot> {
    let families = font_ctx
        .collection
        .register_fonts(parley::fontique::Blob::from(bytes.clone()), None);
    let family_id = families
        .first()
        .map(|(id, _)| *id)
        .ok_or_else(|| TrailreelError::render("no font families registered from font bytes"))?;
    let family = font_ctx
        .collection
        .family_name(family_id)
        .ok_or_else(|| TrailreelError::render("registered font family has no name"))?
        .to_string();

    let font = vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(bytes), 0);
    Ok(FontSlot { family, font })
}

struct GradientPaint {
    from: Rgb8,
    to: Rgb8,
    paint: vello_cpu::Image,
}

/// CPU rasterizer behind the capability trait.
pub struct CpuBackend {
    settings: RenderSettings,
    ctx: Option<vello_cpu::RenderContext>,
    scratch: Option<vello_cpu::Pixmap>,
    gradient: Option<GradientPaint>,
    engine: TextEngine,
    in_frame: bool,
}

impl CpuBackend {
    pub fn new(settings: RenderSettings) -> TrailreelResult<Self> {
        settings.validate()?;
        Ok(Self {
            engine: TextEngine::new(settings.font.clone()),
            settings,
            ctx: None,
            scratch: None,
            gradient: None,
            in_frame: false,
        })
    }

    fn canvas_u16(&self) -> TrailreelResult<(u16, u16)> {
        let w: u16 = self
            .settings
            .canvas
            .width
            .try_into()
            .map_err(|_| TrailreelError::render("canvas width exceeds u16"))?;
        let h: u16 = self
            .settings
            .canvas
            .height
            .try_into()
            .map_err(|_| TrailreelError::render("canvas height exceeds u16"))?;
        Ok((w, h))
    }

    fn ctx_mut(&mut self) -> TrailreelResult<&mut vello_cpu::RenderContext> {
        self.ctx
            .as_mut()
            .ok_or_else(|| TrailreelError::render("no frame in progress"))
    }

    fn gradient_paint(&mut self, from: Rgb8, to: Rgb8) -> TrailreelResult<vello_cpu::Image> {
        if let Some(g) = &self.gradient {
            if g.from == from && g.to == to {
                return Ok(g.paint.clone());
            }
        }

        let canvas = self.settings.canvas;
        let bytes = gradient_bytes(canvas.width, canvas.height, from, to);
        // Alpha is 255 everywhere, so the straight bytes are already premultiplied.
        let pixmap = pixmap_from_premul_bytes(&bytes, canvas.width, canvas.height)?;
        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };
        self.gradient = Some(GradientPaint {
            from,
            to,
            paint: paint.clone(),
        });
        Ok(paint)
    }
}

impl RenderBackend for CpuBackend {
    fn begin_frame(&mut self) -> TrailreelResult<()> {
        if self.in_frame {
            return Err(TrailreelError::render(
                "begin_frame called while a frame is open",
            ));
        }
        let (w, h) = self.canvas_u16()?;
        let mut ctx = match self.ctx.take() {
            None => vello_cpu::RenderContext::new(w, h),
            Some(ctx) if ctx.width() == w && ctx.height() == h => ctx,
            Some(_) => vello_cpu::RenderContext::new(w, h),
        };
        ctx.reset();
        self.ctx = Some(ctx);
        self.in_frame = true;
        Ok(())
    }

    fn fill_gradient(&mut self, from: Rgb8, to: Rgb8) -> TrailreelResult<()> {
        if !self.in_frame {
            return Err(TrailreelError::render(
                "fill_gradient outside begin_frame/end_frame",
            ));
        }
        let paint = self.gradient_paint(from, to)?;
        let w = f64::from(self.settings.canvas.width);
        let h = f64::from(self.settings.canvas.height);
        let ctx = self.ctx_mut()?;
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(paint);
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, w, h));
        Ok(())
    }

    fn draw_text(&mut self, text: &str, at: Point, style: &TextStyle) -> TrailreelResult<()> {
        if !self.in_frame {
            return Err(TrailreelError::render(
                "draw_text outside begin_frame/end_frame",
            ));
        }
        if text.is_empty() {
            return Ok(());
        }

        let (layout, slot) = self.engine.layout(text, style)?;
        // The y coordinate names the baseline; the layout is anchored by its
        // first line's baseline offset.
        let baseline = layout
            .lines()
            .next()
            .map(|l| l.metrics().baseline)
            .unwrap_or(0.0);

        let ctx = self
            .ctx
            .as_mut()
            .ok_or_else(|| TrailreelError::render("no frame in progress"))?;
        ctx.set_transform(vello_cpu::kurbo::Affine::translate((
            at.x,
            at.y - f64::from(baseline),
        )));
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let brush = run.style().brush;
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    brush.r, brush.g, brush.b, brush.a,
                ));
                let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(&slot.font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
        Ok(())
    }

    fn measure_text(&mut self, text: &str, style: &TextStyle) -> TrailreelResult<f64> {
        if text.is_empty() {
            return Ok(0.0);
        }
        let (layout, _slot) = self.engine.layout(text, style)?;
        Ok(f64::from(layout.width()))
    }

    fn end_frame(&mut self) -> TrailreelResult<FrameRgb> {
        if !self.in_frame {
            return Err(TrailreelError::render("end_frame without begin_frame"));
        }
        let (w16, h16) = self.canvas_u16()?;
        let mut pixmap = match self.scratch.take() {
            Some(p) if p.width() == w16 && p.height() == h16 => p,
            _ => vello_cpu::Pixmap::new(w16, h16),
        };
        clear_pixmap_to_transparent(&mut pixmap);

        let ctx = self.ctx_mut()?;
        ctx.flush();
        ctx.render_to_pixmap(&mut pixmap);
        self.in_frame = false;

        let data = premul_rgba8_to_rgb8(pixmap.data_as_u8_slice());
        let frame = FrameRgb {
            width: self.settings.canvas.width,
            height: self.settings.canvas.height,
            data,
        };
        self.scratch = Some(pixmap);
        Ok(frame)
    }
}

/// Straight RGBA bytes for the corner-to-corner gradient; the ramp position
/// of each pixel is its projection onto the diagonal axis.
fn gradient_bytes(width: u32, height: u32, from: Rgb8, to: Rgb8) -> Vec<u8> {
    let wf = f64::from(width);
    let hf = f64::from(height);
    let denom = wf * wf + hf * hf;
    let lerp = |a: u8, b: u8, t: f64| -> u8 {
        (f64::from(a) + (f64::from(b) - f64::from(a)) * t)
            .round()
            .clamp(0.0, 255.0) as u8
    };

    let mut out = vec![0u8; (width as usize) * (height as usize) * 4];
    let mut i = 0usize;
    for y in 0..height {
        for x in 0..width {
            let t = (f64::from(x) * wf + f64::from(y) * hf) / denom;
            out[i] = lerp(from.r, to.r, t);
            out[i + 1] = lerp(from.g, to.g, t);
            out[i + 2] = lerp(from.b, to.b, t);
            out[i + 3] = 255;
            i += 4;
        }
    }
    out
}

fn clear_pixmap_to_transparent(pixmap: &mut vello_cpu::Pixmap) {
    pixmap.data_as_u8_slice_mut().fill(0);
}

/// Drop the alpha plane. The storyboard's first paint is an opaque gradient,
/// so rendered pixels carry full alpha and the color channels copy straight
/// over.
fn premul_rgba8_to_rgb8(rgba: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(rgba.len() / 4 * 3);
    for px in rgba.chunks_exact(4) {
        out.extend_from_slice(&px[..3]);
    }
    out
}

fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> TrailreelResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| TrailreelError::render("pixmap width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| TrailreelError::render("pixmap height exceeds u16"))?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(TrailreelError::render("pixmap byte len mismatch"));
    }
    // Pixmap stores PremulRgba8; these bytes are already premultiplied.
    let mut pixels = Vec::<vello_cpu::peniko::color::PremulRgba8>::with_capacity(
        (width as usize) * (height as usize),
    );
    for px in bytes.chunks_exact(4) {
        pixels.push(vello_cpu::peniko::color::PremulRgba8::from_u8_array([
            px[0], px[1], px[2], px[3],
        ]));
    }
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels, w, h, true,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Canvas;

    const SKY: Rgb8 = Rgb8::new(135, 206, 235);
    const STEEL: Rgb8 = Rgb8::new(70, 130, 180);

    fn small_backend(width: u32, height: u32) -> CpuBackend {
        CpuBackend::new(RenderSettings {
            canvas: Canvas { width, height },
            font: FontSource::System,
        })
        .unwrap()
    }

    fn channel_close(a: u8, b: u8, tol: u8) -> bool {
        a.abs_diff(b) <= tol
    }

    #[test]
    fn gradient_bytes_start_at_the_from_color() {
        let bytes = gradient_bytes(100, 50, SKY, STEEL);
        assert_eq!(&bytes[..4], &[135, 206, 235, 255]);
    }

    #[test]
    fn gradient_bytes_end_near_the_to_color() {
        let bytes = gradient_bytes(100, 50, SKY, STEEL);
        let last = &bytes[bytes.len() - 4..];
        assert!(channel_close(last[0], STEEL.r, 2));
        assert!(channel_close(last[1], STEEL.g, 2));
        assert!(channel_close(last[2], STEEL.b, 2));
        assert_eq!(last[3], 255);
    }

    #[test]
    fn gradient_bytes_are_fully_opaque() {
        let bytes = gradient_bytes(16, 16, SKY, STEEL);
        assert!(bytes.chunks_exact(4).all(|px| px[3] == 255));
    }

    #[test]
    fn flatten_drops_the_alpha_plane() {
        let rgba = vec![1u8, 2, 3, 255, 4, 5, 6, 255];
        assert_eq!(premul_rgba8_to_rgb8(&rgba), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn pixmap_conversion_checks_byte_len() {
        assert!(pixmap_from_premul_bytes(&[0u8; 15], 2, 2).is_err());
        assert!(pixmap_from_premul_bytes(&[0u8; 16], 2, 2).is_ok());
    }

    #[test]
    fn frame_ops_require_an_open_frame() {
        let mut b = small_backend(8, 8);
        assert!(b.fill_gradient(SKY, STEEL).is_err());
        assert!(b.end_frame().is_err());

        b.begin_frame().unwrap();
        assert!(b.begin_frame().is_err());
    }

    #[test]
    fn gradient_frame_renders_without_fonts() {
        let mut b = small_backend(64, 32);
        b.begin_frame().unwrap();
        b.fill_gradient(SKY, STEEL).unwrap();
        let frame = b.end_frame().unwrap();
        frame.validate().unwrap();

        let top_left = frame.px(0, 0).unwrap();
        assert!(channel_close(top_left.r, SKY.r, 1));
        assert!(channel_close(top_left.g, SKY.g, 1));
        assert!(channel_close(top_left.b, SKY.b, 1));

        let bottom_right = frame.px(63, 31).unwrap();
        assert!(channel_close(bottom_right.r, STEEL.r, 4));
        assert!(channel_close(bottom_right.g, STEEL.g, 4));
        assert!(channel_close(bottom_right.b, STEEL.b, 4));
    }

    #[test]
    fn backend_renders_consecutive_frames() {
        let mut b = small_backend(16, 16);
        for _ in 0..3 {
            b.begin_frame().unwrap();
            b.fill_gradient(SKY, STEEL).unwrap();
            let frame = b.end_frame().unwrap();
            assert_eq!(frame.data.len(), 16 * 16 * 3);
        }
    }
}
