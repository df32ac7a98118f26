use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "simreel", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a directory of vector frames into a video artifact.
    Convert(ConvertArgs),
    /// Check that the required external tools are available.
    Probe(ToolArgs),
}

#[derive(Parser, Debug)]
struct ConvertArgs {
    /// Simulation output directory containing the frame sequence.
    dir: PathBuf,

    /// Artifact name (container extension appended if missing).
    #[arg(long, default_value = "results")]
    out: String,

    /// Target aspect ratio (width / height), >= 1.0.
    #[arg(long, default_value_t = 1.0)]
    aspect_ratio: f64,

    /// Target video duration in seconds, >= 1.0.
    #[arg(long, default_value_t = 15.0)]
    duration: f64,

    /// Output container (chooses the lossless codec).
    #[arg(long, value_enum, default_value_t = ContainerChoice::Mp4)]
    container: ContainerChoice,

    /// Rasterizer worker count (defaults to available parallelism).
    #[arg(long)]
    threads: Option<usize>,

    /// Show a progress bar while frames convert.
    #[arg(long)]
    progress: bool,

    /// Print the run report as JSON instead of a summary line.
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    tools: ToolArgs,
}

#[derive(Parser, Debug)]
struct ToolArgs {
    /// Vector-to-raster command.
    #[arg(long)]
    rasterizer: Option<String>,

    /// Video encoder command.
    #[arg(long)]
    encoder: Option<String>,

    /// Archive tool command.
    #[arg(long)]
    archiver: Option<String>,
}

impl ToolArgs {
    fn toolset(&self) -> simreel::Toolset {
        let mut tools = simreel::Toolset::default();
        if let Some(rasterizer) = &self.rasterizer {
            tools.rasterizer = rasterizer.clone();
        }
        if let Some(encoder) = &self.encoder {
            tools.encoder = encoder.clone();
        }
        if let Some(archiver) = &self.archiver {
            tools.archiver = archiver.clone();
        }
        tools
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ContainerChoice {
    Mp4,
    Webm,
}

impl From<ContainerChoice> for simreel::Container {
    fn from(choice: ContainerChoice) -> Self {
        match choice {
            ContainerChoice::Mp4 => simreel::Container::Mp4,
            ContainerChoice::Webm => simreel::Container::Webm,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Convert(args) => cmd_convert(args),
        Command::Probe(args) => cmd_probe(args),
    }
}

fn cmd_convert(args: ConvertArgs) -> anyhow::Result<()> {
    let toolset = args.tools.toolset();
    toolset.probe()?;

    let mut opts = simreel::ConvertOptions::new(&args.dir, &args.out);
    opts.aspect_ratio = args.aspect_ratio;
    opts.duration_sec = args.duration;
    opts.container = args.container.into();
    opts.threads = args.threads;
    opts.progress = args.progress;
    opts.toolset = toolset;

    let report = simreel::convert(&opts)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "wrote {} ({} frames @ {:.2} fps, {} bytes)",
            report.artifact.display(),
            report.frames,
            report.frame_rate,
            report.artifact_bytes
        );
    }
    Ok(())
}

fn cmd_probe(args: ToolArgs) -> anyhow::Result<()> {
    let toolset = args.toolset();
    toolset.probe()?;
    println!(
        "ok: rasterizer '{}', encoder '{}', archiver '{}'",
        toolset.rasterizer, toolset.encoder, toolset.archiver
    );
    Ok(())
}
