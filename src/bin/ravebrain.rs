use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "ravebrain", version)]
struct Cli {
    /// Increase log verbosity (-v: info, -vv: debug, -vvv: trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the digest of a file.
    Digest(DigestArgs),
    /// Assemble a prepared subject directory into a scene bundle.
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct DigestArgs {
    /// File to hash.
    file: PathBuf,

    /// Digest length in hex characters.
    #[arg(long, default_value_t = ravebrain::DEFAULT_DIGEST_LEN)]
    length: usize,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Subject code.
    #[arg(long)]
    subject: String,

    /// Subject directory containing a prepared `RAVEpy` cache.
    #[arg(long)]
    path: PathBuf,

    /// Output directory of the bundle.
    #[arg(long)]
    out: PathBuf,

    /// Scene options JSON; every field is optional.
    #[arg(long)]
    options: Option<PathBuf>,

    /// Surface types to load.
    #[arg(long = "surface", default_values_t = ["pial".to_string()])]
    surfaces: Vec<String>,

    /// Curvature used as default vertex colors.
    #[arg(long, default_value = "sulc")]
    curvature: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Digest(args) => cmd_digest(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();
}

fn cmd_digest(args: DigestArgs) -> anyhow::Result<()> {
    let digest = ravebrain::digest_file(&args.file, args.length)
        .with_context(|| format!("digest '{}'", args.file.display()))?;
    println!("{digest}");
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let opts = match &args.options {
        Some(p) => ravebrain::SceneOptions::from_path(p)?,
        None => ravebrain::SceneOptions::default(),
    };
    let load = ravebrain::LoadOptions {
        surfaces: args.surfaces,
        curvature: args.curvature,
    };
    let brain = ravebrain::Brain::from_cache_dir(&args.subject, &args.path, &load)?;
    tracing::info!("{brain}");

    let bundle = brain.render(
        &ravebrain::Selection::All,
        &ravebrain::Selection::All,
        opts,
    )?;
    let scene = bundle.write_to(&args.out)?;

    eprintln!("wrote {}", scene.display());
    Ok(())
}
