use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{Receiver, sync_channel};
use std::thread;

use anyhow::{Context, Result};
use image::imageops::FilterType;
use ndarray::Array4;

use crate::error::PredictError;

/// Samples each prefetch worker may decode ahead of the consumer.
const PREFETCH_DEPTH: usize = 2;

#[derive(Debug, Clone)]
pub struct Sample {
    /// `(1, in_ch, width, width)`, values in `[0, 1]`.
    pub tensor: Array4<f32>,
    pub filename: String,
}

/// Every file of a directory, in file name order, decoded to the network's
/// input size.
#[derive(Debug)]
pub struct TestDataset {
    files: Vec<PathBuf>,
    in_ch: usize,
    width: u32,
}

impl TestDataset {
    pub fn new(dir: &Path, in_ch: usize, width: u32) -> Result<Self> {
        let entries = fs::read_dir(dir)
            .with_context(|| format!("Failed to list test directory {:?}", dir))
            .context(PredictError::Config("unreadable test directory".to_string()))?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.with_context(|| format!("Failed to list test directory {:?}", dir))?;
            let path = entry.path();
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        Ok(Self {
            files,
            in_ch,
            width,
        })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn filename(&self, index: usize) -> String {
        self.files
            .get(index)
            .and_then(|path| path.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn get(&self, index: usize) -> Result<Sample> {
        let filename = self.filename(index);
        let path = self
            .files
            .get(index)
            .with_context(|| format!("Sample index {} out of range", index))?;

        let tensor = self
            .load(path)
            .context(PredictError::Sample {
                index,
                filename: filename.clone(),
            })?;

        Ok(Sample { tensor, filename })
    }

    fn load(&self, path: &Path) -> Result<Array4<f32>> {
        let image = image::open(path).with_context(|| format!("Failed to open image {:?}", path))?;
        let image = image.resize_exact(self.width, self.width, FilterType::CatmullRom);

        let size = self.width as usize;
        let mut tensor = Array4::zeros((1, self.in_ch, size, size));
        match self.in_ch {
            1 => {
                for (x, y, pixel) in image.to_luma8().enumerate_pixels() {
                    tensor[[0, 0, y as usize, x as usize]] = pixel[0] as f32 / 255.0;
                }
            }
            3 => {
                for (x, y, pixel) in image.to_rgb8().enumerate_pixels() {
                    for c in 0..3 {
                        tensor[[0, c, y as usize, x as usize]] = pixel[c] as f32 / 255.0;
                    }
                }
            }
            4 => {
                for (x, y, pixel) in image.to_rgba8().enumerate_pixels() {
                    for c in 0..4 {
                        tensor[[0, c, y as usize, x as usize]] = pixel[c] as f32 / 255.0;
                    }
                }
            }
            n => anyhow::bail!("Unsupported input channel count {}", n),
        }

        Ok(tensor)
    }
}

/// Yields the dataset's samples in order, optionally decoding ahead on
/// background threads.
pub struct DataLoader {
    dataset: Arc<TestDataset>,
    next: usize,
    workers: Vec<Receiver<Result<Sample>>>,
}

impl DataLoader {
    pub fn new(dataset: Arc<TestDataset>, threads: usize) -> Result<Self> {
        let threads = threads.min(dataset.len());
        let mut workers = Vec::with_capacity(threads);

        // Worker k decodes indices k, k + n, k + 2n, ... and the consumer reads
        // the workers round robin, which keeps the dataset order.
        for k in 0..threads {
            let (tx, rx) = sync_channel(PREFETCH_DEPTH);
            let dataset = Arc::clone(&dataset);
            thread::Builder::new()
                .name(format!("loader-{k}"))
                .spawn(move || {
                    for index in (k..dataset.len()).step_by(threads) {
                        if tx.send(dataset.get(index)).is_err() {
                            break;
                        }
                    }
                })
                .context("Failed to spawn data loader thread")?;
            workers.push(rx);
        }

        Ok(Self {
            dataset,
            next: 0,
            workers,
        })
    }
}

impl Iterator for DataLoader {
    type Item = Result<Sample>;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.next;
        if index >= self.dataset.len() {
            return None;
        }
        self.next += 1;

        if self.workers.is_empty() {
            return Some(self.dataset.get(index));
        }

        let worker = &self.workers[index % self.workers.len()];
        Some(worker.recv().with_context(|| {
            format!(
                "Data loader thread exited before sample {} ({})",
                index,
                self.dataset.filename(index)
            )
        })
        .and_then(|sample| sample))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.dataset.len().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for DataLoader {}
