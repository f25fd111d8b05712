use crate::{
    core::{Canvas, FrameIndex, FrameRgb, Point, Rgb8},
    error::{TrailreelError, TrailreelResult},
    render::{FontWeight, RenderBackend, TextStyle},
    story::{StoryCard, word_window},
};

/// Frames per clip.
pub const TOTAL_FRAMES: u64 = 30;

/// Gradient endpoints for the sky backdrop.
pub const SKY_BLUE: Rgb8 = Rgb8::new(135, 206, 235);
pub const STEEL_BLUE: Rgb8 = Rgb8::new(70, 130, 180);

const WHITE: Rgb8 = Rgb8::new(255, 255, 255);
const SAFETY_YELLOW: Rgb8 = Rgb8::new(255, 255, 0);

const BRAND_TEXT: &str = "🚴‍♂️ Riding Roney";
const SAFETY_TEXT: &str = "Safety First! Always wear protective gear!";

const BRAND_STYLE: TextStyle = TextStyle::new(36.0, FontWeight::Bold, WHITE);
const TITLE_STYLE: TextStyle = TextStyle::new(48.0, FontWeight::Bold, WHITE);
const STORY_STYLE: TextStyle = TextStyle::new(32.0, FontWeight::Regular, WHITE);
const SAFETY_STYLE: TextStyle = TextStyle::new(28.0, FontWeight::Bold, SAFETY_YELLOW);
const META_STYLE: TextStyle = TextStyle::new(24.0, FontWeight::Regular, WHITE);

const BRAND_AT: Point = Point::new(50.0, 100.0);
const TITLE_BASELINE_Y: f64 = 200.0;
const STORY_X: f64 = 100.0;
const STORY_FIRST_BASELINE_Y: f64 = 400.0;
const STORY_LINE_STEP: f64 = 40.0;
const SAFETY_AT: Point = Point::new(100.0, 800.0);
const COUNTER_AT: Point = Point::new(50.0, 1050.0);
const STAMP_AT: Point = Point::new(1500.0, 1050.0);

/// Per-clip drawing script: which text lands where on each frame.
///
/// Coordinates are laid out for the 1080p canvas; the y of every text draw
/// names its baseline. Only the title line moves with measured text width,
/// everything else sits at fixed positions.
#[derive(Clone, Debug)]
pub struct Storyboard {
    title: String,
    words: Vec<String>,
    stamp: String,
    canvas: Canvas,
    total_frames: u64,
}

impl Storyboard {
    pub fn new(
        card: &StoryCard,
        stamp: impl Into<String>,
        canvas: Canvas,
        total_frames: u64,
    ) -> TrailreelResult<Self> {
        card.validate()?;
        canvas.validate()?;
        if total_frames == 0 {
            return Err(TrailreelError::validation("total_frames must be > 0"));
        }
        Ok(Self {
            title: card.title.clone(),
            words: card.words(),
            stamp: stamp.into(),
            canvas,
            total_frames,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// Draw one frame through the backend and return its pixels.
    pub fn compose(
        &self,
        frame: FrameIndex,
        backend: &mut dyn RenderBackend,
    ) -> TrailreelResult<FrameRgb> {
        if frame.0 >= self.total_frames {
            return Err(TrailreelError::validation(format!(
                "frame {} out of range 0..{}",
                frame.0, self.total_frames
            )));
        }

        backend.begin_frame()?;
        backend.fill_gradient(SKY_BLUE, STEEL_BLUE)?;

        backend.draw_text(BRAND_TEXT, BRAND_AT, &BRAND_STYLE)?;

        let title_width = backend.measure_text(&self.title, &TITLE_STYLE)?;
        let title_x = (f64::from(self.canvas.width) - title_width) / 2.0;
        backend.draw_text(
            &self.title,
            Point::new(title_x, TITLE_BASELINE_Y),
            &TITLE_STYLE,
        )?;

        let window = word_window(self.words.len(), frame);
        for (row, word) in self.words[window].iter().enumerate() {
            let y = STORY_FIRST_BASELINE_Y + STORY_LINE_STEP * row as f64;
            backend.draw_text(word, Point::new(STORY_X, y), &STORY_STYLE)?;
        }

        backend.draw_text(SAFETY_TEXT, SAFETY_AT, &SAFETY_STYLE)?;

        let counter = format!("Frame {}/{}", frame.0 + 1, self.total_frames);
        backend.draw_text(&counter, COUNTER_AT, &META_STYLE)?;

        let stamp = format!("Generated: {}", self.stamp);
        backend.draw_text(&stamp, STAMP_AT, &META_STYLE)?;

        backend.end_frame()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum Op {
        Begin,
        Gradient(Rgb8, Rgb8),
        Text {
            text: String,
            x: f64,
            y: f64,
            size: f32,
            weight: FontWeight,
            color: Rgb8,
        },
        End,
    }

    /// Records draw calls; measured width is ten pixels per character.
    #[derive(Default)]
    struct RecordingBackend {
        ops: Vec<Op>,
    }

    impl RenderBackend for RecordingBackend {
        fn begin_frame(&mut self) -> TrailreelResult<()> {
            self.ops.push(Op::Begin);
            Ok(())
        }

        fn fill_gradient(&mut self, from: Rgb8, to: Rgb8) -> TrailreelResult<()> {
            self.ops.push(Op::Gradient(from, to));
            Ok(())
        }

        fn draw_text(&mut self, text: &str, at: Point, style: &TextStyle) -> TrailreelResult<()> {
            self.ops.push(Op::Text {
                text: text.to_string(),
                x: at.x,
                y: at.y,
                size: style.size_px,
                weight: style.weight,
                color: style.color,
            });
            Ok(())
        }

        fn measure_text(&mut self, text: &str, _style: &TextStyle) -> TrailreelResult<f64> {
            Ok(text.chars().count() as f64 * 10.0)
        }

        fn end_frame(&mut self) -> TrailreelResult<FrameRgb> {
            self.ops.push(Op::End);
            Ok(FrameRgb {
                width: 1,
                height: 1,
                data: vec![0, 0, 0],
            })
        }
    }

    fn board(title: &str, narrative: &str) -> Storyboard {
        let card = StoryCard {
            title: title.to_string(),
            narrative: narrative.to_string(),
        };
        Storyboard::new(&card, "2026-08-21 10:30", Canvas::default(), TOTAL_FRAMES).unwrap()
    }

    fn texts(ops: &[Op]) -> Vec<(String, f64, f64)> {
        ops.iter()
            .filter_map(|op| match op {
                Op::Text { text, x, y, .. } => Some((text.clone(), *x, *y)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn frame_opens_with_the_gradient_backdrop() {
        let mut backend = RecordingBackend::default();
        board("Ride", "one two three").compose(FrameIndex(0), &mut backend).unwrap();

        assert_eq!(backend.ops[0], Op::Begin);
        assert_eq!(backend.ops[1], Op::Gradient(SKY_BLUE, STEEL_BLUE));
        assert_eq!(backend.ops.last(), Some(&Op::End));
    }

    #[test]
    fn layout_follows_the_storyboard_order() {
        let mut backend = RecordingBackend::default();
        board("Ride", "one two three").compose(FrameIndex(0), &mut backend).unwrap();

        let texts = texts(&backend.ops);
        assert_eq!(texts[0], (BRAND_TEXT.to_string(), 50.0, 100.0));
        // "Ride" measures 40 px under the mock, so it centers at (1920-40)/2.
        assert_eq!(texts[1], ("Ride".to_string(), 940.0, 200.0));
        assert_eq!(texts[2], ("one".to_string(), 100.0, 400.0));
        assert_eq!(texts[3], ("two".to_string(), 100.0, 440.0));
        assert_eq!(texts[4], ("three".to_string(), 100.0, 480.0));
        assert_eq!(texts[5], (SAFETY_TEXT.to_string(), 100.0, 800.0));
        assert_eq!(texts[6], ("Frame 1/30".to_string(), 50.0, 1050.0));
        assert_eq!(
            texts[7],
            ("Generated: 2026-08-21 10:30".to_string(), 1500.0, 1050.0)
        );
        assert_eq!(texts.len(), 8);
    }

    #[test]
    fn styles_carry_weight_size_and_color() {
        let mut backend = RecordingBackend::default();
        board("Ride", "one").compose(FrameIndex(0), &mut backend).unwrap();

        let styled: Vec<(String, f32, FontWeight, Rgb8)> = backend
            .ops
            .iter()
            .filter_map(|op| match op {
                Op::Text {
                    text,
                    size,
                    weight,
                    color,
                    ..
                } => Some((text.clone(), *size, *weight, *color)),
                _ => None,
            })
            .collect();

        assert_eq!(styled[0].1, 36.0);
        assert_eq!(styled[0].2, FontWeight::Bold);
        assert_eq!(styled[1].1, 48.0);
        assert_eq!(styled[2], ("one".to_string(), 32.0, FontWeight::Regular, WHITE));
        let safety = &styled[3];
        assert_eq!(safety.1, 28.0);
        assert_eq!(safety.3, SAFETY_YELLOW);
        assert_eq!(styled[4].1, 24.0);
    }

    #[test]
    fn story_rows_follow_the_sliding_window() {
        let narrative = (1..=20).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
        let mut backend = RecordingBackend::default();
        board("Ride", &narrative).compose(FrameIndex(7), &mut backend).unwrap();

        let texts = texts(&backend.ops);
        // Frame 7 starts the window at word index 2 and shows eight words.
        assert_eq!(texts[2], ("w3".to_string(), 100.0, 400.0));
        assert_eq!(texts[9], ("w10".to_string(), 100.0, 680.0));
        assert_eq!(texts[10].0, SAFETY_TEXT);
    }

    #[test]
    fn short_narratives_run_out_of_story_rows() {
        let mut backend = RecordingBackend::default();
        board("Ride", "one two").compose(FrameIndex(29), &mut backend).unwrap();

        let texts = texts(&backend.ops);
        // Brand, title, safety, counter, stamp; the word window is empty.
        assert_eq!(texts.len(), 5);
        assert_eq!(texts[2].0, SAFETY_TEXT);
        assert_eq!(texts[3].0, "Frame 30/30");
    }

    #[test]
    fn counter_is_one_based() {
        let mut backend = RecordingBackend::default();
        board("Ride", "one").compose(FrameIndex(4), &mut backend).unwrap();

        let texts = texts(&backend.ops);
        assert!(texts.iter().any(|(t, x, y)| t == "Frame 5/30" && *x == 50.0 && *y == 1050.0));
    }

    #[test]
    fn compose_rejects_out_of_range_frames() {
        let mut backend = RecordingBackend::default();
        let err = board("Ride", "one")
            .compose(FrameIndex(TOTAL_FRAMES), &mut backend)
            .unwrap_err();
        assert!(err.to_string().contains("out of range"));
        assert!(backend.ops.is_empty());
    }

    #[test]
    fn storyboard_rejects_blank_cards_and_zero_frames() {
        let blank = StoryCard {
            title: " ".to_string(),
            narrative: "x".to_string(),
        };
        assert!(Storyboard::new(&blank, "now", Canvas::default(), TOTAL_FRAMES).is_err());

        let card = StoryCard {
            title: "Ride".to_string(),
            narrative: "x".to_string(),
        };
        assert!(Storyboard::new(&card, "now", Canvas::default(), 0).is_err());
    }
}
