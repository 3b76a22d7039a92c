use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

/// Manifest of expected digests, kept next to the checkpoints it describes.
pub const CHECKSUMS_FILE: &str = "checksums.json";

/// Make sure the checkpoint exists and, when a checksum manifest lists it,
/// that its SHA-256 digest matches.
pub fn verify(checkpoint: &Path) -> Result<()> {
    let metadata = fs::metadata(checkpoint)
        .with_context(|| format!("Checkpoint not found at {:?}", checkpoint))?;
    if !metadata.is_file() {
        anyhow::bail!("Checkpoint at {:?} is not a file", checkpoint);
    }

    let Some(expected) = expected_checksum(checkpoint)? else {
        return Ok(());
    };

    let actual = sha256_hex(checkpoint)?;
    if actual != expected {
        anyhow::bail!(
            "Checksum mismatch for {:?}: expected {}, got {}",
            checkpoint,
            expected,
            actual
        );
    }

    tracing::debug!("Checkpoint checksum verified: {}", actual);
    Ok(())
}

/// Hex encoded SHA-256 of a file.
pub fn sha256_hex(path: &Path) -> Result<String> {
    let content = fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
    Ok(format!("{:x}", Sha256::digest(&content)))
}

fn expected_checksum(checkpoint: &Path) -> Result<Option<String>> {
    let Some(dir) = checkpoint.parent() else {
        return Ok(None);
    };
    let manifest_path = dir.join(CHECKSUMS_FILE);
    if !manifest_path.exists() {
        return Ok(None);
    }

    let checksums: HashMap<String, String> = serde_json::from_reader(
        fs::File::open(&manifest_path)
            .with_context(|| format!("Failed to open checksums at {:?}", manifest_path))?,
    )
    .with_context(|| format!("Failed to parse checksums at {:?}", manifest_path))?;

    let filename = checkpoint
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(checksums.get(&filename).map(|hash| hash.to_lowercase()))
}
