use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::PredictError;

/// Model and loader settings shared with the training configuration.
/// Keys this driver does not need are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictConfig {
    pub in_ch: usize,
    pub out_ch: usize,
    /// Prefetch workers for the data loader, 0 decodes on the main thread.
    #[serde(default)]
    pub threads: usize,
    /// Side length of the square images the network consumes.
    pub width: u32,
    #[serde(default = "default_gpu_ids")]
    pub gpu_ids: Vec<u32>,
}

fn default_gpu_ids() -> Vec<u32> {
    vec![0]
}

impl PredictConfig {
    pub fn from_file(config_path: &Path) -> Result<Self> {
        let config_file = std::fs::File::open(config_path)
            .with_context(|| format!("Failed to open config file at {:?}", config_path))
            .context(PredictError::Config("unreadable config file".to_string()))?;

        let config: Self = serde_yaml::from_reader(config_file)
            .with_context(|| format!("Failed to parse config file at {:?}", config_path))
            .context(PredictError::Config("malformed config file".to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 {
            return Err(PredictError::Config("width must be positive".to_string()).into());
        }
        if !matches!(self.in_ch, 1 | 3 | 4) {
            return Err(PredictError::Config(format!(
                "in_ch must be 1, 3 or 4, got {}",
                self.in_ch
            ))
            .into());
        }
        if self.out_ch == 0 {
            return Err(PredictError::Config("out_ch must be positive".to_string()).into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_config(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn test_full_config() {
        let (_dir, path) = write_config(concat!(
            "in_ch: 3\nout_ch: 3\nthreads: 4\nwidth: 256\n",
            "gpu_ids: [0, 1]\nepoch: 200\nlr: 0.0004\n",
        ));
        let config = PredictConfig::from_file(&path).unwrap();
        assert_eq!(config.in_ch, 3);
        assert_eq!(config.out_ch, 3);
        assert_eq!(config.threads, 4);
        assert_eq!(config.width, 256);
        assert_eq!(config.gpu_ids, vec![0, 1]);
    }

    #[test]
    fn test_optional_keys_default() {
        let (_dir, path) = write_config("in_ch: 3\nout_ch: 3\nwidth: 64\n");
        let config = PredictConfig::from_file(&path).unwrap();
        assert_eq!(config.threads, 0);
        assert_eq!(config.gpu_ids, vec![0]);
    }

    #[test]
    fn test_json_is_accepted() {
        let (_dir, path) = write_config(r#"{"in_ch": 4, "out_ch": 3, "width": 32}"#);
        let config = PredictConfig::from_file(&path).unwrap();
        assert_eq!(config.in_ch, 4);
    }

    #[test]
    fn test_missing_width() {
        let (_dir, path) = write_config("in_ch: 3\nout_ch: 3\n");
        let err = PredictConfig::from_file(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PredictError>(),
            Some(PredictError::Config(_))
        ));
        assert!(format!("{err:#}").contains("width"));
    }

    #[test]
    fn test_invalid_values() {
        let (_dir, path) = write_config("in_ch: 2\nout_ch: 3\nwidth: 64\n");
        assert!(PredictConfig::from_file(&path).is_err());

        let (_dir, path) = write_config("in_ch: 3\nout_ch: 3\nwidth: 0\n");
        assert!(PredictConfig::from_file(&path).is_err());

        let (_dir, path) = write_config("in_ch: 3\nout_ch: 0\nwidth: 64\n");
        assert!(PredictConfig::from_file(&path).is_err());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = PredictConfig::from_file(&dir.path().join("nope.yml")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PredictError>(),
            Some(PredictError::Config(_))
        ));
    }
}
