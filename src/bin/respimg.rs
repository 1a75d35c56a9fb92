use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "respimg", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate responsive variants, a placeholder and a manifest for one image.
    Build(BuildArgs),
    /// Print `<img>`/`<picture>` markup for a manifest.
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct BuildArgs {
    /// Source image (JPEG, PNG, WebP or GIF).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output directory.
    #[arg(long)]
    out: PathBuf,

    /// Pipeline config JSON; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Base name for output files (defaults to the input file stem).
    #[arg(long)]
    name: Option<String>,

    /// Target widths, comma separated.
    #[arg(long, value_delimiter = ',')]
    sizes: Option<Vec<u32>>,

    /// Output formats in preference order, comma separated.
    #[arg(long = "format", value_delimiter = ',')]
    formats: Option<Vec<respimg::OutputFormat>>,

    /// Encoder quality (0-100).
    #[arg(long)]
    quality: Option<u8>,

    /// URL prefix for manifest entries.
    #[arg(long)]
    public_path: Option<String>,

    /// File naming scheme.
    #[arg(long, value_enum)]
    naming: Option<NamingArg>,

    /// What to do with widths larger than the source.
    #[arg(long, value_enum)]
    upscale: Option<UpscaleArg>,

    /// Drop failed variants instead of failing the build.
    #[arg(long, default_value_t = false)]
    skip_failed: bool,

    /// Override rayon worker threads.
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Manifest JSON written by `build`.
    #[arg(long)]
    manifest: PathBuf,

    /// Alt text.
    #[arg(long)]
    alt: String,

    /// `sizes` attribute (defaults to 100vw).
    #[arg(long)]
    sizes: Option<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum NamingArg {
    Hashed,
    Plain,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum UpscaleArg {
    Reject,
    Clamp,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Build(args) => cmd_build(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn cmd_build(args: BuildArgs) -> anyhow::Result<()> {
    let mut cfg = match &args.config {
        Some(path) => respimg::PipelineConfig::from_path(path)?,
        None => respimg::PipelineConfig::default(),
    };
    if let Some(sizes) = args.sizes {
        cfg.sizes = sizes;
    }
    if let Some(formats) = args.formats {
        cfg.formats = formats;
    }
    if let Some(q) = args.quality {
        cfg.quality = q;
    }
    if let Some(p) = args.public_path {
        cfg.public_path = p;
    }
    if let Some(n) = args.naming {
        cfg.naming = match n {
            NamingArg::Hashed => respimg::NamingMode::Hashed,
            NamingArg::Plain => respimg::NamingMode::Plain,
        };
    }
    if let Some(u) = args.upscale {
        cfg.upscale = match u {
            UpscaleArg::Reject => respimg::UpscalePolicy::Reject,
            UpscaleArg::Clamp => respimg::UpscalePolicy::Clamp,
        };
    }
    if args.skip_failed {
        cfg.on_failure = respimg::FailurePolicy::SkipVariant;
    }
    if args.threads.is_some() {
        cfg.threads = args.threads;
    }

    let name = match args.name {
        Some(n) => n,
        None => args
            .in_path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_string)
            .with_context(|| format!("derive output name from '{}'", args.in_path.display()))?,
    };

    let builder = respimg::VariantManifestBuilder::new(cfg)?;
    let src = respimg::decode_image_file(&args.in_path)?;
    let set = builder.build(&src, &name)?;
    let stats = respimg::write_image_set(&set, &args.out)?;

    eprintln!(
        "wrote {} file(s), {} unchanged, {} stale removed, in {}",
        stats.written,
        stats.unchanged,
        stats.removed,
        args.out.display()
    );
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let manifest = respimg::Manifest::from_path(&args.manifest)?;
    let html = respimg::render(
        &respimg::ImageSource::Manifest(&manifest),
        &args.alt,
        args.sizes.as_deref(),
    )?;
    println!("{html}");
    Ok(())
}
