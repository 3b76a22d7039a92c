use std::path::PathBuf;

use clap::Parser;

/// Run a pretrained attentive derain generator over a directory of images
/// and write input/output/attention comparison panels.
#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub struct Cli {
    /// YAML configuration shared with training
    #[arg(long)]
    pub config: PathBuf,

    #[arg(long = "test_dir", default_value = "prediction_inputs")]
    pub test_dir: PathBuf,

    #[arg(long = "out_dir", default_value = "prediction_inputs")]
    pub out_dir: PathBuf,

    /// Generator checkpoint (ONNX)
    #[arg(long)]
    pub pretrained: PathBuf,

    #[arg(long, default_value_t = false)]
    pub cuda: bool,

    #[arg(long = "gpu_ids", default_value_t = 0)]
    pub gpu_ids: u32,

    /// Accepted for compatibility with the training scripts; prediction is
    /// deterministic and never reads it.
    #[arg(long = "manualSeed", default_value_t = 0)]
    pub manual_seed: u64,
}
