pub mod args;
pub mod colormap;
pub mod config;
pub mod dataset;
pub mod error;
pub mod panel;
pub mod predict;
pub mod writer;

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use anyhow::Context;
use spanet::{Device, Generator};

use crate::{
    args::Cli,
    config::PredictConfig,
    dataset::{DataLoader, TestDataset},
    error::PredictError,
    writer::ImageWriter,
};

/// Loads the configuration and checkpoint, then writes one comparison panel
/// per image of `test_dir`. Returns the number of panels written.
pub fn run(cli: Cli) -> anyhow::Result<usize> {
    let config = PredictConfig::from_file(&cli.config)?;
    tracing::info!(
        "Config: in_ch={} out_ch={} width={} threads={} gpu_ids={:?}",
        config.in_ch,
        config.out_ch,
        config.width,
        config.threads,
        config.gpu_ids
    );
    tracing::debug!("manualSeed={} (prediction is deterministic)", cli.manual_seed);

    let device = Device::from_flag(cli.cuda);
    if device.is_cuda() {
        tracing::info!(
            "CUDA requested with --gpu_ids {}, running on {} ({})",
            cli.gpu_ids,
            device,
            device.name().unwrap_or_else(|| "unknown device".to_string())
        );
    } else {
        tracing::info!("Running on {}", device);
    }

    let dataset = TestDataset::new(&cli.test_dir, config.in_ch, config.width)?;
    tracing::info!("Found {} images in {:?}", dataset.len(), cli.test_dir);

    tracing::info!("===> Loading models");
    let intra_threads = thread::available_parallelism()?.get();
    // Weights are always read on the host first, then moved.
    let generator = Generator::load(&cli.pretrained, Device::Cpu, intra_threads).context(
        PredictError::Checkpoint {
            path: cli.pretrained.clone(),
        },
    )?;
    let mut generator = generator
        .to_device(device)
        .with_context(|| format!("Failed to move the generator to {}", device))?;
    tracing::info!("Loaded {:?} on {}", generator.checkpoint(), generator.device());

    let writer = ImageWriter::new(&cli.out_dir)?;
    let loader = DataLoader::new(Arc::new(dataset), config.threads)?;

    let start = Instant::now();
    let written = predict::predict(loader, &mut generator, &writer, &config)?;
    tracing::info!(
        "Wrote {} panels to {:?} in {:.2?}",
        written.len(),
        writer.out_dir(),
        start.elapsed()
    );

    Ok(written.len())
}
