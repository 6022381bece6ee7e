use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use livestrip::{
    Clip, CompositionJob, Compositor, FfmpegDecoder, FfmpegEncoder, FilterKind, LivestripConfig,
    MediaType,
};

#[derive(Parser, Debug)]
#[command(name = "livestrip", version)]
struct Cli {
    /// Configuration JSON. Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite recorded clips into a looping strip video (requires `ffmpeg`/`ffprobe` on PATH).
    Compose(ComposeArgs),
    /// Print the loop timing derived from the configuration.
    Schedule,
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    /// Clip file per slot, in slot order. Use `-` for a slot without a clip.
    #[arg(long = "clip", required = true)]
    clips: Vec<String>,

    /// Output video path.
    #[arg(long)]
    out: PathBuf,

    /// Filter applied to every slot.
    #[arg(long, default_value_t = FilterKind::None)]
    filter: FilterKind,

    /// Caption passed to the decorations.
    #[arg(long)]
    caption: Option<String>,

    /// Number of slots in the strip. Defaults to the number of `--clip` arguments.
    #[arg(long)]
    slots: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("livestrip=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = match &cli.config {
        Some(path) => LivestripConfig::from_path(path)?,
        None => LivestripConfig::default(),
    };
    match cli.cmd {
        Command::Compose(args) => cmd_compose(cfg, args).await,
        Command::Schedule => cmd_schedule(&cfg),
    }
}

fn media_type_for(path: &Path) -> MediaType {
    match path.extension().and_then(|e| e.to_str()) {
        Some("mp4" | "m4v") => MediaType::new("video/mp4"),
        Some("mov") => MediaType::new("video/quicktime"),
        Some("mkv") => MediaType::new("video/x-matroska"),
        _ => MediaType::new("video/webm"),
    }
}

fn read_clip(arg: &str) -> anyhow::Result<Option<Clip>> {
    if arg == "-" {
        return Ok(None);
    }
    let path = Path::new(arg);
    let data = std::fs::read(path).with_context(|| format!("read clip '{}'", path.display()))?;
    Ok(Some(Clip::from_payload(data, media_type_for(path))))
}

async fn cmd_compose(cfg: LivestripConfig, args: ComposeArgs) -> anyhow::Result<()> {
    let clips = args
        .clips
        .iter()
        .map(|a| read_clip(a))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let mut job = CompositionJob::new(clips).with_filter(args.filter);
    if let Some(n) = args.slots {
        job = job.with_slot_count(n);
    }
    if let Some(caption) = args.caption {
        job = job.with_caption(caption);
    }
    let mut last_tens = None;
    job = job.with_progress(move |p: u8| {
        if last_tens != Some(p / 10) {
            last_tens = Some(p / 10);
            eprintln!("progress {p}%");
        }
    });

    let compositor = Compositor::new(cfg.compositor.clone(), Arc::new(FfmpegDecoder::new()));
    let mut encoder = FfmpegEncoder::new(cfg.compositor.scratch_dir());
    let artifact = compositor.run(job, &mut encoder).await?;

    livestrip::encode::ensure_parent_dir(&args.out)?;
    std::fs::write(&args.out, &artifact.data)
        .with_context(|| format!("write output '{}'", args.out.display()))?;
    eprintln!(
        "wrote {} ({}, {} bytes)",
        args.out.display(),
        artifact.media_type,
        artifact.len()
    );
    Ok(())
}

fn cmd_schedule(cfg: &LivestripConfig) -> anyhow::Result<()> {
    let s = cfg.compositor.schedule;
    println!("{}", serde_json::to_string_pretty(&s)?);
    println!("cycle_secs: {}", s.cycle_secs());
    println!("total_secs: {}", s.total_secs());
    println!(
        "frames: {} at {} fps",
        (s.total_secs() * f64::from(cfg.compositor.fps)).ceil(),
        cfg.compositor.fps
    );
    Ok(())
}
