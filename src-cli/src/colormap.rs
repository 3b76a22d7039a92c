use std::sync::OnceLock;

use ndarray::{Array3, ArrayView2};

/// JET lookup table: dark blue at 0 through cyan, yellow and red to dark red
/// at 255.
pub fn jet_lut() -> &'static [[u8; 3]; 256] {
    static LUT: OnceLock<[[u8; 3]; 256]> = OnceLock::new();
    LUT.get_or_init(|| {
        let mut lut = [[0u8; 3]; 256];
        for (i, entry) in lut.iter_mut().enumerate() {
            let x = i as f32 / 255.0;
            let ramp = |center: f32| {
                ((1.5 - (4.0 * x - center).abs()).clamp(0.0, 1.0) * 255.0).round() as u8
            };
            *entry = [ramp(3.0), ramp(2.0), ramp(1.0)];
        }
        lut
    })
}

/// Pseudo-color a single channel intensity map into a channel-first RGB tile
/// with values in `[0, 255]`.
pub fn heatmap(intensity: ArrayView2<'_, u8>) -> Array3<f32> {
    let lut = jet_lut();
    let (height, width) = intensity.dim();
    let mut tile = Array3::zeros((3, height, width));
    for ((y, x), &value) in intensity.indexed_iter() {
        let [r, g, b] = lut[value as usize];
        tile[[0, y, x]] = r as f32;
        tile[[1, y, x]] = g as f32;
        tile[[2, y, x]] = b as f32;
    }
    tile
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn test_jet_endpoints() {
        let lut = jet_lut();
        assert_eq!(lut[0], [0, 0, 128]);
        assert_eq!(lut[255], [128, 0, 0]);
        assert_eq!(lut[128][1], 255);
    }

    #[test]
    fn test_jet_red_grows_with_intensity() {
        let lut = jet_lut();
        for i in 96..=191 {
            assert!(lut[i][0] <= lut[i + 1][0]);
        }
    }

    #[test]
    fn test_heatmap_layout() {
        let mut intensity = Array2::<u8>::zeros((2, 3));
        intensity[[1, 2]] = 255;

        let tile = heatmap(intensity.view());
        assert_eq!(tile.shape(), &[3, 2, 3]);
        assert_eq!(tile[[2, 0, 0]], 128.0);
        assert_eq!(tile[[0, 1, 2]], 128.0);
        assert_eq!(tile[[2, 1, 2]], 0.0);
    }
}
