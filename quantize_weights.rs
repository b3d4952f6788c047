// quantize_weights.rs
// Converts float weight files (weights_<i>) into fixed-point weight files
// (weights_<i>_fxp8 or weights_<i>_fxp4) using the shared fixed-point scale.

use clap::Parser;
use rust_linear_classifier::data::{load_weight_matrix, write_weight_matrix};
use rust_linear_classifier::format::{default_weights_dir, Representation};
use rust_linear_classifier::quantize::{quantize_matrix, saturates};
use rust_linear_classifier::utils::init_tracing;
use rust_linear_classifier::{ClassifierError, Result};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "quantize_weights", version, about = "Quantize float classifier weights")]
struct Args {
    /// Directory holding the float weights_<i> files
    #[arg(long, default_value = "weights_fp")]
    input: PathBuf,

    /// Target representation: int8 or int4
    #[arg(long, default_value = "int8")]
    representation: Representation,

    /// Output directory (default depends on representation)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

/// Number of weights that fall outside the representable range and get clipped.
fn count_saturated(values: &[f32], representation: Representation) -> usize {
    values
        .iter()
        .filter(|&&w| saturates(w, representation))
        .count()
}

fn run(args: &Args) -> Result<PathBuf> {
    if !args.representation.is_fixed_point() {
        return Err(ClassifierError::Precondition(
            "target representation must be int8 or int4".to_string(),
        ));
    }
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(default_weights_dir(args.representation)));

    let float = load_weight_matrix(&args.input, Representation::Float)?;
    if let Some(values) = float.as_float() {
        let saturated = count_saturated(values, args.representation);
        if saturated > 0 {
            warn!(
                saturated,
                total = values.len(),
                "weights clipped to the {} range",
                args.representation
            );
        }
    }

    let fixed = quantize_matrix(&float, args.representation)?;
    write_weight_matrix(&output, &fixed)?;
    Ok(output)
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(&args) {
        Ok(output) => {
            info!(
                representation = %args.representation,
                scale = args.representation.scale(),
                "wrote weights to {}",
                output.display()
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
