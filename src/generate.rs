use std::path::PathBuf;

use rand::Rng;

use crate::{
    core::{Canvas, FrameIndex},
    emit::emit_artifact,
    error::{TrailreelError, TrailreelResult},
    render::RenderBackend,
    story::{StoryCard, pick_card, sanitize_title},
    storyboard::{Storyboard, TOTAL_FRAMES},
};

#[derive(Clone, Debug)]
pub struct GenerateOpts {
    /// Directory the artifact files land in.
    pub out_dir: PathBuf,
    pub canvas: Canvas,
    pub total_frames: u64,
}

impl Default for GenerateOpts {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("generated-videos"),
            canvas: Canvas::default(),
            total_frames: TOTAL_FRAMES,
        }
    }
}

/// What one generation run produced.
#[derive(Clone, Debug)]
pub struct VideoArtifact {
    pub title: String,
    pub file_name: String,
    pub path: PathBuf,
    pub bytes: u64,
    pub frames: u64,
}

/// File name for a story title, cleaned for the filesystem.
pub fn artifact_file_name(title: &str) -> String {
    format!("{}.mp4", sanitize_title(title))
}

/// Renders whole clips from the story catalog and writes their containers.
pub struct Generator {
    cards: Vec<StoryCard>,
    backend: Box<dyn RenderBackend>,
    opts: GenerateOpts,
}

impl Generator {
    pub fn new(
        cards: Vec<StoryCard>,
        backend: Box<dyn RenderBackend>,
        opts: GenerateOpts,
    ) -> TrailreelResult<Self> {
        if cards.is_empty() {
            return Err(TrailreelError::validation("story catalog is empty"));
        }
        for card in &cards {
            card.validate()?;
        }
        opts.canvas.validate()?;
        if opts.total_frames == 0 {
            return Err(TrailreelError::validation("total_frames must be > 0"));
        }
        Ok(Self {
            cards,
            backend,
            opts,
        })
    }

    pub fn cards(&self) -> &[StoryCard] {
        &self.cards
    }

    /// Pick a story with `rng`, render every frame, write the artifact.
    #[tracing::instrument(skip_all)]
    pub fn generate<R: Rng + ?Sized>(&mut self, rng: &mut R) -> TrailreelResult<VideoArtifact> {
        let card = pick_card(&self.cards, rng)?.clone();
        self.render_card(&card)
    }

    fn render_card(&mut self, card: &StoryCard) -> TrailreelResult<VideoArtifact> {
        let stamp = chrono::Local::now().format("%Y-%m-%d %H:%M").to_string();
        let board = Storyboard::new(card, stamp, self.opts.canvas, self.opts.total_frames)?;

        tracing::info!(title = %card.title, frames = self.opts.total_frames, "rendering story");
        let mut frames = Vec::with_capacity(self.opts.total_frames as usize);
        for i in 0..self.opts.total_frames {
            frames.push(board.compose(FrameIndex(i), self.backend.as_mut())?);
        }

        let file_name = artifact_file_name(&card.title);
        let path = self.opts.out_dir.join(&file_name);
        emit_artifact(&path, &frames)?;

        let bytes = std::fs::metadata(&path)?.len();
        tracing::info!(path = %path.display(), bytes, "wrote artifact");

        Ok(VideoArtifact {
            title: card.title.clone(),
            file_name,
            path,
            bytes,
            frames: self.opts.total_frames,
        })
    }
}
