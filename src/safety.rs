//! Safety checks for the updated manifest the CLI writes.
//!
//! The output must never replace the input manifest or one of the audio
//! files the manifest points at.

use anyhow::{bail, Result};
use std::path::Path;

/// Extensions of files the output must never be written over.
const AUDIO_EXTENSIONS: [&str; 8] = ["flac", "mp3", "m4a", "ogg", "opus", "wav", "aac", "aiff"];

/// Validates that an output path is safe to overwrite.
///
/// Checks:
/// - Output cannot be the manifest it was read from
/// - Output cannot be any of the item paths listed in the manifest
/// - Output cannot carry an audio file extension
pub fn validate_output_path(output: &Path, manifest: &Path, item_paths: &[&Path]) -> Result<()> {
    if output == manifest {
        bail!(
            "Safety check failed: output '{}' cannot be the same as the manifest",
            output.display()
        );
    }

    for item in item_paths {
        if output == *item {
            bail!(
                "Safety check failed: output '{}' is an item of the manifest",
                output.display()
            );
        }
    }

    let ext = output
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    if let Some(ext) = ext {
        if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
            bail!(
                "Safety check failed: output '{}' looks like an audio file",
                output.display()
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_valid_output() {
        let output = PathBuf::from("/tmp/manifest-updated.json");
        let manifest = PathBuf::from("/tmp/manifest.json");
        let item = PathBuf::from("/music/Album/01.flac");
        assert!(validate_output_path(&output, &manifest, &[&item]).is_ok());
    }

    #[test]
    fn test_output_equals_manifest() {
        let path = PathBuf::from("/tmp/manifest.json");
        let result = validate_output_path(&path, &path, &[]);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("cannot be the same as the manifest"));
    }

    #[test]
    fn test_output_equals_item() {
        let item = PathBuf::from("/music/Album/cue.json");
        let manifest = PathBuf::from("/tmp/manifest.json");
        let result = validate_output_path(&item, &manifest, &[&item]);
        assert!(result.unwrap_err().to_string().contains("is an item"));
    }

    #[test]
    fn test_audio_extension_blocked() {
        let output = PathBuf::from("/music/Album/01.FLAC");
        let manifest = PathBuf::from("/tmp/manifest.json");
        assert!(validate_output_path(&output, &manifest, &[]).is_err());
    }
}
