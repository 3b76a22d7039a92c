use std::path::PathBuf;

use thiserror::Error;

/// Failure classes of a prediction run. Attached as context to the
/// underlying `anyhow::Error`, so callers can `downcast_ref` to find out
/// which stage aborted the run.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("failed to load checkpoint {}", path.display())]
    Checkpoint { path: PathBuf },
    #[error("failed to read sample {index} ({filename})")]
    Sample { index: usize, filename: String },
    #[error("inference failed on sample {index} ({filename})")]
    Inference { index: usize, filename: String },
    #[error("failed to write {}", path.display())]
    Write { path: PathBuf },
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_context_is_recoverable() {
        let err = Err::<(), _>(anyhow::anyhow!("No such file or directory"))
            .context(PredictError::Checkpoint { path: "gen.onnx".into() })
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<PredictError>(),
            Some(PredictError::Checkpoint { .. })
        ));
        assert_eq!(
            format!("{err:#}"),
            "failed to load checkpoint gen.onnx: No such file or directory"
        );
    }
}
