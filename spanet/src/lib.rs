pub mod checkpoint;
mod device;

use std::path::{Path, PathBuf};

use anyhow::Context;
use ndarray::{Array4, ArrayView4};
use ort::{
    session::{Session, builder::GraphOptimizationLevel},
    value::Tensor,
};

pub use device::Device;

/// One forward pass worth of results, both in `(N, C, H, W)` layout.
#[derive(Debug, Clone)]
pub struct Prediction {
    pub attention: Array4<f32>,
    pub output: Array4<f32>,
}

/// Forward-only evaluation of an attentive derain network.
pub trait Inference {
    fn infer(&mut self, input: ArrayView4<'_, f32>) -> anyhow::Result<Prediction>;
}

/// Attentive generator exported to ONNX. The first graph output is the
/// attention map, the second one the derained image.
#[derive(Debug)]
pub struct Generator {
    model: Session,
    checkpoint: PathBuf,
    device: Device,
    intra_threads: usize,
}

impl Generator {
    pub fn load(checkpoint: &Path, device: Device, intra_threads: usize) -> anyhow::Result<Self> {
        checkpoint::verify(checkpoint)?;

        let model = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_execution_providers([device.execution_provider()])?
            .with_intra_threads(intra_threads.max(1))?
            .commit_from_file(checkpoint)
            .with_context(|| format!("Failed to load checkpoint {:?} on {}", checkpoint, device))?;

        if model.inputs.len() != 1 {
            anyhow::bail!(
                "Checkpoint {:?} expects {} inputs, the generator takes a single image",
                checkpoint,
                model.inputs.len()
            );
        }
        if model.outputs.len() < 2 {
            anyhow::bail!(
                "Checkpoint {:?} exposes {} outputs, expected an attention map and an image",
                checkpoint,
                model.outputs.len()
            );
        }

        for (i, input) in model.inputs.iter().enumerate() {
            tracing::debug!("  Input {}: {} - {:?}", i, input.name, input.input_type);
        }
        for (i, output) in model.outputs.iter().enumerate() {
            tracing::debug!("  Output {}: {} - {:?}", i, output.name, output.output_type);
        }

        Ok(Self {
            model,
            checkpoint: checkpoint.to_path_buf(),
            device,
            intra_threads,
        })
    }

    /// Sessions are bound to their execution provider, so moving means
    /// rebuilding from the same checkpoint.
    pub fn to_device(self, device: Device) -> anyhow::Result<Self> {
        if device == self.device {
            return Ok(self);
        }
        Self::load(&self.checkpoint, device, self.intra_threads)
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn checkpoint(&self) -> &Path {
        &self.checkpoint
    }
}

impl Inference for Generator {
    fn infer(&mut self, input: ArrayView4<'_, f32>) -> anyhow::Result<Prediction> {
        let shape = input.shape().to_vec();
        let data = input.iter().copied().collect::<Vec<f32>>();
        let tensor = Tensor::from_array((shape, data))?;

        let outputs = self.model.run(ort::inputs![tensor])?;

        let (shape, data) = outputs[0].try_extract_tensor::<f32>()?;
        let attention = to_array4(shape, data).context("Malformed attention map")?;
        let (shape, data) = outputs[1].try_extract_tensor::<f32>()?;
        let output = to_array4(shape, data).context("Malformed output image")?;

        Ok(Prediction { attention, output })
    }
}

fn to_array4(shape: &[i64], data: &[f32]) -> anyhow::Result<Array4<f32>> {
    let [n, c, h, w] = shape else {
        anyhow::bail!("Expected a 4D tensor, got shape {:?}", shape);
    };
    let dims = (*n as usize, *c as usize, *h as usize, *w as usize);
    Ok(Array4::from_shape_vec(dims, data.to_vec())?)
}
