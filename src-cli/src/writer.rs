use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::{ImageFormat, Rgb, RgbImage};
use ndarray::ArrayView3;

use crate::error::PredictError;

/// Persists composite panels as 8-bit RGB PNG files.
#[derive(Debug)]
pub struct ImageWriter {
    out_dir: PathBuf,
}

impl ImageWriter {
    pub fn new(out_dir: &Path) -> Result<Self> {
        fs::create_dir_all(out_dir)
            .with_context(|| format!("Failed to create output directory {:?}", out_dir))
            .context(PredictError::Write {
                path: out_dir.to_path_buf(),
            })?;

        Ok(Self {
            out_dir: out_dir.to_path_buf(),
        })
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// `{index}_{stem}.png`, e.g. `0_rain001.png`.
    pub fn output_name(index: usize, filename: &str) -> String {
        let stem = Path::new(filename)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| filename.to_string());
        format!("{index}_{stem}.png")
    }

    /// Writes an `(h, w, 3)` panel and returns the file path.
    pub fn save(
        &self,
        panel: ArrayView3<'_, f32>,
        index: usize,
        filename: &str,
    ) -> Result<PathBuf> {
        let path = self.out_dir.join(Self::output_name(index, filename));
        to_rgb8(panel)
            .and_then(|image| {
                image
                    .save_with_format(&path, ImageFormat::Png)
                    .map_err(|e| anyhow::anyhow!("Failed to save image: {e}"))
            })
            .context(PredictError::Write { path: path.clone() })?;
        Ok(path)
    }
}

/// Values outside `[0, 255]` saturate, the rest are rounded.
pub fn to_rgb8(panel: ArrayView3<'_, f32>) -> Result<RgbImage> {
    let (height, width, channels) = panel.dim();
    if channels != 3 {
        anyhow::bail!("Expected 3 color channels, got {}", channels);
    }

    let mut image = RgbImage::new(width as u32, height as u32);
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let (x, y) = (x as usize, y as usize);
        let r = panel[[y, x, 0]].clamp(0.0, 255.0).round() as u8;
        let g = panel[[y, x, 1]].clamp(0.0, 255.0).round() as u8;
        let b = panel[[y, x, 2]].clamp(0.0, 255.0).round() as u8;
        *pixel = Rgb([r, g, b]);
    }
    Ok(image)
}
