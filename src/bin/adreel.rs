use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _};

use adreel::{
    JobManifest, OverlayRenderer, VideoJob, VideoStyleConfig, font_dirs_from_env, parse_script,
    scenes_from_script,
};

#[derive(Parser, Debug)]
#[command(name = "adreel", version, about = "Render product ad videos from images and captions")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a job manifest to MP4 (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Render a timestamped ad script with round-robin images.
    Script(ScriptArgs),
    /// Write one built scene frame as a PNG.
    Frame(FrameArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input job manifest JSON.
    #[arg(long)]
    manifest: PathBuf,

    /// Output MP4 path (overrides the manifest).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Directory under which the job's scratch directory is created.
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Draw captions with block glyphs instead of system fonts.
    #[arg(long, default_value_t = false)]
    block_glyphs: bool,
}

#[derive(Parser, Debug)]
struct ScriptArgs {
    /// Ad script: header, `---`, then `[MM:SS] *caption*` lines.
    #[arg(long)]
    script: PathBuf,

    /// Scene image (path or URL); repeat to cycle through several.
    #[arg(long = "image", required = true)]
    images: Vec<String>,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,

    /// Optional style JSON (canvas, fps, overlay, transition).
    #[arg(long)]
    style: Option<PathBuf>,

    /// Directory under which the job's scratch directory is created.
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Draw captions with block glyphs instead of system fonts.
    #[arg(long, default_value_t = false)]
    block_glyphs: bool,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input job manifest JSON.
    #[arg(long)]
    manifest: PathBuf,

    /// Scene index (0-based).
    #[arg(long, default_value_t = 0)]
    scene: usize,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Draw captions with block glyphs instead of system fonts.
    #[arg(long, default_value_t = false)]
    block_glyphs: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "adreel=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Script(args) => cmd_script(args),
        Command::Frame(args) => cmd_frame(args),
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let manifest = load_manifest(&args.manifest)?;
    let mut job = VideoJob::from_manifest(manifest, args.out, args.work_dir.as_deref())?;
    if args.block_glyphs {
        job = job.with_renderer(OverlayRenderer::block_glyphs());
    }
    let out = job.run()?;
    eprintln!("wrote {}", out.display());
    Ok(())
}

fn cmd_script(args: ScriptArgs) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&args.script)
        .with_context(|| format!("read script '{}'", args.script.display()))?;
    let scenes = scenes_from_script(&parse_script(&text)?, &args.images)?;

    let mut style = match args.style.as_deref() {
        Some(path) => {
            let f = std::fs::File::open(path)
                .with_context(|| format!("open style JSON '{}'", path.display()))?;
            serde_json::from_reader::<_, VideoStyleConfig>(std::io::BufReader::new(f))
                .with_context(|| format!("parse style JSON '{}'", path.display()))?
        }
        None => VideoStyleConfig::default(),
    };
    style.validate()?;
    style.overlay.font_dirs.extend(font_dirs_from_env());

    let mut job = match args.work_dir.as_deref() {
        Some(root) => VideoJob::new_in(root, scenes, style, &args.out)?,
        None => VideoJob::new(scenes, style, &args.out)?,
    };
    if args.block_glyphs {
        job = job.with_renderer(OverlayRenderer::block_glyphs());
    }
    let out = job.run()?;
    eprintln!("wrote {}", out.display());
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let manifest = load_manifest(&args.manifest)?;
    let placeholder = args.out.with_extension("mp4");
    let mut job = VideoJob::from_manifest(manifest, Some(placeholder), None)?;
    if args.block_glyphs {
        job = job.with_renderer(OverlayRenderer::block_glyphs());
    }
    let frame = job.scene_frame(args.scene)?;

    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        &frame.pixels,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn load_manifest(path: &Path) -> anyhow::Result<JobManifest> {
    let mut manifest = JobManifest::from_path(path)?;
    manifest.validate()?;
    manifest.style.overlay.font_dirs.extend(font_dirs_from_env());
    Ok(manifest)
}
