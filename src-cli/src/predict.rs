use std::path::PathBuf;

use anyhow::{Context, Result};
use spanet::Inference;

use crate::{
    config::PredictConfig,
    dataset::Sample,
    error::PredictError,
    panel::{Composer, PanelSource},
    writer::ImageWriter,
};

/// Runs every sample through the model, one at a time and in order, and
/// writes one composite panel per sample. The first failure aborts the run.
pub fn predict<I, M>(
    samples: I,
    model: &mut M,
    writer: &ImageWriter,
    config: &PredictConfig,
) -> Result<Vec<PathBuf>>
where
    I: IntoIterator<Item = Result<Sample>>,
    I::IntoIter: ExactSizeIterator,
    M: Inference + ?Sized,
{
    let samples = samples.into_iter();
    let total = samples.len();
    let composer = Composer::new(config.width as usize);
    let mut written = Vec::with_capacity(total);

    for (index, sample) in samples.enumerate() {
        let Sample { tensor, filename } = sample?;

        let prediction = model
            .infer(tensor.view())
            .context(PredictError::Inference {
                index,
                filename: filename.clone(),
            })?;

        let channels = prediction.output.shape().get(1).copied().unwrap_or(0);
        if channels != config.out_ch {
            return Err(anyhow::anyhow!(
                "Model produced {} output channels, configured out_ch is {}",
                channels,
                config.out_ch
            ))
            .context(PredictError::Inference { index, filename });
        }

        let source = PanelSource {
            input: tensor.view(),
            prediction: &prediction,
        };
        let panel = composer.compose(&source).context(PredictError::Inference {
            index,
            filename: filename.clone(),
        })?;

        let path = writer.save(panel.view(), index, &filename)?;
        tracing::info!("[{}/{}] {} -> {}", index + 1, total, filename, path.display());
        written.push(path);
    }

    Ok(written)
}
