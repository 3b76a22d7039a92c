use anyhow::{Context, Result};
use ndarray::{Array3, ArrayView3, ArrayView4, Axis, s};
use spanet::Prediction;

use crate::colormap;

/// Scale applied to the RGB tiles. The sign flip is part of the panel format
/// and the writer saturates whatever falls outside `[0, 255]`.
pub const RGB_SCALE: f32 = -255.0;

/// What a tile is rendered from.
pub struct PanelSource<'a> {
    pub input: ArrayView4<'a, f32>,
    pub prediction: &'a Prediction,
}

/// Renders one channel-first `(3, size, size)` tile.
pub type RenderFn = fn(&PanelSource<'_>, usize) -> Result<Array3<f32>>;

#[derive(Clone, Copy)]
pub struct Tile {
    pub label: &'static str,
    pub render: RenderFn,
}

/// Input, derained output and attention heatmap, left to right.
pub const DEFAULT_TILES: [Tile; 3] = [
    Tile {
        label: "input",
        render: input_tile,
    },
    Tile {
        label: "output",
        render: output_tile,
    },
    Tile {
        label: "attention",
        render: attention_tile,
    },
];

/// Lays tiles out in a single row of `size × size` cells.
pub struct Composer {
    tiles: Vec<Tile>,
    size: usize,
}

impl Composer {
    pub fn new(size: usize) -> Self {
        Self::with_tiles(size, DEFAULT_TILES.to_vec())
    }

    pub fn with_tiles(size: usize, tiles: Vec<Tile>) -> Self {
        Self { tiles, size }
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.tiles.iter().map(|tile| tile.label).collect()
    }

    /// Returns a `(size, tiles * size, 3)` image.
    pub fn compose(&self, source: &PanelSource<'_>) -> Result<Array3<f32>> {
        let p = self.size;
        let mut panel = Array3::zeros((p, self.tiles.len() * p, 3));

        for (k, tile) in self.tiles.iter().enumerate() {
            let rendered = (tile.render)(source, p)?;
            if rendered.shape() != [3, p, p] {
                anyhow::bail!(
                    "Tile {} has shape {:?}, expected {:?}",
                    tile.label,
                    rendered.shape(),
                    [3, p, p]
                );
            }
            panel
                .slice_mut(s![.., k * p..(k + 1) * p, ..])
                .assign(&rendered.view().permuted_axes([1, 2, 0]));
        }

        Ok(panel)
    }
}

pub fn input_tile(source: &PanelSource<'_>, size: usize) -> Result<Array3<f32>> {
    let rgb = rgb_channels(first_item(source.input, "input", size)?)?;
    Ok(rgb * RGB_SCALE)
}

pub fn output_tile(source: &PanelSource<'_>, size: usize) -> Result<Array3<f32>> {
    let output = source.prediction.output.view();
    let rgb = rgb_channels(first_item(output, "output", size)?)?;
    Ok(rgb.mapv(|v| v.clamp(0.0, 1.0)) * RGB_SCALE)
}

pub fn attention_tile(source: &PanelSource<'_>, size: usize) -> Result<Array3<f32>> {
    let attention = source.prediction.attention.view();
    let attention = first_item(attention, "attention", size)?;
    // `as` truncates toward zero and saturates, like a uint8 cast.
    let intensity = attention
        .index_axis(Axis(0), 0)
        .mapv(|v| (v * 255.0) as u8);
    Ok(colormap::heatmap(intensity.view()))
}

/// First item of the batch, checked against the panel cell size.
fn first_item<'a>(
    tensor: ArrayView4<'a, f32>,
    name: &str,
    size: usize,
) -> Result<ArrayView3<'a, f32>> {
    let (n, c, h, w) = tensor.dim();
    if n == 0 || c == 0 || h != size || w != size {
        anyhow::bail!(
            "Shape mismatch for {}: got {:?}, expected (1, C, {}, {})",
            name,
            tensor.shape(),
            size,
            size
        );
    }
    Ok(tensor.index_axis_move(Axis(0), 0))
}

/// First three channels; a single channel is repeated.
fn rgb_channels(tensor: ArrayView3<'_, f32>) -> Result<Array3<f32>> {
    let (c, h, w) = tensor.dim();
    match c {
        1 => Ok(tensor
            .broadcast((3, h, w))
            .context("Cannot broadcast a single channel")?
            .to_owned()),
        c if c >= 3 => Ok(tensor.slice(s![..3, .., ..]).to_owned()),
        c => anyhow::bail!("Cannot build an RGB tile from {} channels", c),
    }
}
