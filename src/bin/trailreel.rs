use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use rand::{SeedableRng, rngs::StdRng};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "trailreel", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the one-button web front end.
    Serve(ServeArgs),
    /// Generate one clip straight to disk.
    Generate(GenerateArgs),
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
}

#[derive(Parser, Debug)]
struct ServeArgs {
    /// Address to listen on.
    #[arg(long, default_value = trailreel::DEFAULT_ADDR)]
    addr: SocketAddr,

    /// Directory the artifact files land in.
    #[arg(long, default_value = "generated-videos")]
    out_dir: PathBuf,

    /// TTF/OTF file used for every text draw; without it, well-known system
    /// font paths are probed.
    #[arg(long)]
    font: Option<PathBuf>,

    /// JSON story catalog replacing the built-in cards.
    #[arg(long)]
    stories: Option<PathBuf>,

    /// Seed for the story picks; unseeded otherwise.
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Parser, Debug)]
struct GenerateArgs {
    /// Directory the artifact files land in.
    #[arg(long, default_value = "generated-videos")]
    out_dir: PathBuf,

    /// TTF/OTF file used for every text draw; without it, well-known system
    /// font paths are probed.
    #[arg(long)]
    font: Option<PathBuf>,

    /// JSON story catalog replacing the built-in cards.
    #[arg(long)]
    stories: Option<PathBuf>,

    /// Seed for the story pick; unseeded otherwise.
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Frame index (0-based).
    #[arg(long, default_value_t = 0)]
    index: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// TTF/OTF file used for every text draw; without it, well-known system
    /// font paths are probed.
    #[arg(long)]
    font: Option<PathBuf>,

    /// JSON story catalog replacing the built-in cards.
    #[arg(long)]
    stories: Option<PathBuf>,

    /// Seed for the story pick; unseeded otherwise.
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Serve(args) => cmd_serve(args).await,
        Command::Generate(args) => cmd_generate(args),
        Command::Frame(args) => cmd_frame(args),
    }
}

fn load_catalog(stories: Option<&Path>) -> anyhow::Result<Vec<trailreel::StoryCard>> {
    match stories {
        Some(path) => Ok(trailreel::load_cards(path)
            .with_context(|| format!("load story catalog '{}'", path.display()))?),
        None => Ok(trailreel::builtin_cards()),
    }
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn make_backend(font: Option<PathBuf>) -> anyhow::Result<Box<dyn trailreel::RenderBackend>> {
    let settings = trailreel::RenderSettings {
        canvas: trailreel::Canvas::default(),
        font: match font {
            Some(path) => trailreel::FontSource::File(path),
            None => trailreel::FontSource::System,
        },
    };
    Ok(trailreel::create_backend(trailreel::BackendKind::Cpu, &settings)?)
}

async fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let cards = load_catalog(args.stories.as_deref())?;
    let backend = make_backend(args.font)?;
    let opts = trailreel::GenerateOpts {
        out_dir: args.out_dir,
        ..Default::default()
    };
    let generator = trailreel::Generator::new(cards, backend, opts)?;

    trailreel::serve(args.addr, generator, make_rng(args.seed)).await?;
    Ok(())
}

fn cmd_generate(args: GenerateArgs) -> anyhow::Result<()> {
    let cards = load_catalog(args.stories.as_deref())?;
    let backend = make_backend(args.font)?;
    let opts = trailreel::GenerateOpts {
        out_dir: args.out_dir,
        ..Default::default()
    };
    let mut generator = trailreel::Generator::new(cards, backend, opts)?;

    let mut rng = make_rng(args.seed);
    let artifact = generator.generate(&mut rng)?;

    eprintln!("wrote {}", artifact.path.display());
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let cards = load_catalog(args.stories.as_deref())?;
    let mut rng = make_rng(args.seed);
    let card = trailreel::pick_card(&cards, &mut rng)?.clone();

    let mut backend = make_backend(args.font)?;
    let stamp = chrono::Local::now().format("%Y-%m-%d %H:%M").to_string();
    let board = trailreel::Storyboard::new(
        &card,
        stamp,
        trailreel::Canvas::default(),
        trailreel::TOTAL_FRAMES,
    )?;
    let frame = board.compose(trailreel::FrameIndex(args.index), backend.as_mut())?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgb8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}
