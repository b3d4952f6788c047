// linear_classifier.rs
// Classifies the MNIST test set with one linear score per digit and reports accuracy.
// Expected files (defaults, relative to the working directory):
//   ./t10k-images.idx3-ubyte
//   ./t10k-labels.idx1-ubyte
//   ./weights_fxp8/weights_<i>_fxp8   (or weights_fp/weights_<i>, weights_fxp4/weights_<i>_fxp4)
//
// Output:
//   - elapsed classification time
//   - accuracy line
// Exit status is non-zero if any input fails to load.

use clap::Parser;
use rust_linear_classifier::backend::{ExecutionMode, HostBackend};
use rust_linear_classifier::config::{
    read_config, validate_config, BackendKind, RunConfig, Settings, DEFAULT_IMAGES_FILE,
    DEFAULT_LABELS_FILE, DEFAULT_REPRESENTATION,
};
use rust_linear_classifier::eval::{evaluate, evaluate_with_backend, AccuracyResult, ClassifierContext};
use rust_linear_classifier::format::{default_weights_dir, Representation};
use rust_linear_classifier::utils::init_tracing;
use rust_linear_classifier::{ClassifierError, Result};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "linear_classifier", version, about = "Linear MNIST digit classifier")]
struct Args {
    /// The relative path to the MNIST images file
    #[arg(long)]
    images: Option<PathBuf>,

    /// The relative path to the MNIST labels file
    #[arg(long)]
    labels: Option<PathBuf>,

    /// Weight representation: float, int8 or int4
    #[arg(long)]
    representation: Option<Representation>,

    /// Directory holding weights_<i>[_<tag>] files
    #[arg(long)]
    weights_dir: Option<PathBuf>,

    /// Executor: software (sequential) or host (thread pool)
    #[arg(long, value_parser = parse_backend)]
    backend: Option<BackendKind>,

    /// Use a single work item for the whole batch (host backend)
    #[arg(long)]
    single_workitem: bool,

    /// Worker threads for the host backend
    #[arg(long)]
    threads: Option<usize>,

    /// Classify only the first N items
    #[arg(long)]
    limit: Option<usize>,

    /// JSON run configuration; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_backend(value: &str) -> std::result::Result<BackendKind, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "software" | "sw" => Ok(BackendKind::Software),
        "host" => Ok(BackendKind::Host),
        other => Err(format!(
            "unknown backend '{}'. Must be one of: software, host",
            other
        )),
    }
}

/// Merges the optional JSON config with command-line flags (flags win) and fills defaults.
fn resolve_settings(args: &Args) -> Result<Settings> {
    let mut config = match &args.config {
        Some(path) => read_config(path)?,
        None => RunConfig::default(),
    };

    if let Some(images) = &args.images {
        config.images = Some(images.clone());
    }
    if let Some(labels) = &args.labels {
        config.labels = Some(labels.clone());
    }
    if let Some(representation) = args.representation {
        config.representation = Some(representation);
    }
    if let Some(weights_dir) = &args.weights_dir {
        config.weights_dir = Some(weights_dir.clone());
    }
    if let Some(backend) = args.backend {
        config.backend = Some(backend);
    }
    if args.single_workitem {
        config.execution_mode = Some(ExecutionMode::SingleTask);
    }
    if args.threads.is_some() {
        config.threads = args.threads;
    }
    if args.limit.is_some() {
        config.n_items_limit = args.limit;
    }

    if config.images.is_none() {
        info!("Defaulting to images file \"{}\"", DEFAULT_IMAGES_FILE);
    }
    if config.labels.is_none() {
        info!("Defaulting to labels file \"{}\"", DEFAULT_LABELS_FILE);
    }
    if config.weights_dir.is_none() {
        let representation = config.representation.unwrap_or(DEFAULT_REPRESENTATION);
        info!(
            "Defaulting to weights directory \"{}\"",
            default_weights_dir(representation)
        );
    }

    validate_config(&config)?;
    Ok(config.resolve())
}

fn classify(settings: &Settings) -> Result<AccuracyResult> {
    let ctx = ClassifierContext::load(settings).inspect_err(|_| {
        error!("failed to load classifier inputs");
    })?;

    match settings.backend {
        BackendKind::Software => evaluate(&ctx),
        BackendKind::Host => {
            let backend = HostBackend::new(settings.threads)?;
            info!(
                mode = %settings.execution_mode,
                threads = backend.num_threads(),
                "using host backend"
            );
            evaluate_with_backend(&ctx, &backend, settings.execution_mode)
        }
    }
}

fn report_error(err: &ClassifierError) {
    error!("{}", err);
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        error!("  caused by: {}", cause);
        source = cause.source();
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    let result = resolve_settings(&args).and_then(|settings| classify(&settings));
    match result {
        Ok(result) => {
            println!("TIME ELAPSED: {:.2} ms", result.elapsed_ms());
            println!("{}", result);
            ExitCode::SUCCESS
        }
        Err(err) => {
            report_error(&err);
            ExitCode::FAILURE
        }
    }
}
