use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use bodysynth::{
    BodyData, Direction, FfmpegPackager, FrameOrchestrator, InMemoryEngine, JobAssets, JobRequest,
    PackageOpts, ResolvedJob, SequenceCatalog, SynthConfig,
};

#[derive(Parser, Debug)]
#[command(name = "bodysynth", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a job and print its clip window and paths as JSON.
    Plan(JobArgs),
    /// Run a job end to end against the in-memory engine and package the result.
    Run(RunArgs),
}

#[derive(Args, Debug)]
struct JobArgs {
    /// Run configuration JSON (defaults apply when omitted).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Sequence catalog JSON (`[{"name": .., "nb_frames": ..}, ..]`).
    #[arg(long)]
    catalog: PathBuf,

    /// Dataset index; wraps around the catalog into run passes.
    #[arg(long)]
    idx: usize,

    /// Sequence name, overriding the index lookup.
    #[arg(long)]
    name: Option<String>,

    /// Clip index within the sequence (0-based).
    #[arg(long)]
    cut: usize,

    /// Frames between consecutive clip starts.
    #[arg(long)]
    stride: Option<usize>,

    /// Walking direction relative to the camera (`forward` or `backward`).
    #[arg(long, default_value = "forward")]
    direction: Direction,

    /// Subject index: even male, odd female.
    #[arg(long, default_value_t = 0)]
    subject: usize,
}

#[derive(Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    job: JobArgs,

    /// Write placeholder PNG frames so packaging has something to encode.
    #[arg(long, default_value_t = false)]
    write_frames: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Plan(args) => cmd_plan(args),
        Command::Run(args) => cmd_run(args),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<SynthConfig> {
    match path {
        Some(p) => {
            SynthConfig::from_path(p).with_context(|| format!("load config '{}'", p.display()))
        }
        None => Ok(SynthConfig::default()),
    }
}

fn resolve(args: &JobArgs) -> anyhow::Result<(SynthConfig, ResolvedJob)> {
    let cfg = load_config(args.config.as_deref())?;
    let catalog = SequenceCatalog::from_path(&args.catalog)
        .with_context(|| format!("load catalog '{}'", args.catalog.display()))?;
    let request = JobRequest {
        idx: args.idx,
        name: args.name.clone(),
        cut: args.cut,
        stride: args.stride,
        direction: args.direction,
        subject_id: args.subject,
    };
    let job = ResolvedJob::resolve(&request, &catalog, &cfg)?;
    Ok((cfg, job))
}

fn cmd_plan(args: JobArgs) -> anyhow::Result<()> {
    let (cfg, job) = resolve(&args)?;
    let window = job.clip_window(&cfg, job.nb_frames);
    let plan = serde_json::json!({
        "job": job,
        "clip_name": job.clip_name(),
        "seed": job.seed().value(),
        "window": window,
        "frames": window.len().min(cfg.max_frames),
        "annotation_path": job.annotation_path(),
    });
    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    let (cfg, job) = resolve(&args.job)?;
    let body_path = cfg.smpl_data_path();
    let body = BodyData::from_path(&body_path)
        .with_context(|| format!("load body data '{}'", body_path.display()))?;
    if body.v_template.is_empty() {
        anyhow::bail!(
            "body data '{}' has no v_template; the in-memory engine needs a template mesh",
            body_path.display()
        );
    }

    let assets = JobAssets::load(&cfg, &job, &body)?;
    let engine = InMemoryEngine::from_template(
        cfg.resolution,
        body.template_vertices(),
        &assets.regression_verts,
        &assets.joint_regressor,
    )?
    .with_frame_output(args.write_frames);

    job.prepare_workdir()?;
    let mut packager = FfmpegPackager::new(PackageOpts::from_config(&cfg));
    let mut orchestrator = FrameOrchestrator::new(engine, cfg, job, assets)?;
    let report = orchestrator.run(&mut packager)?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
