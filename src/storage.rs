// SPDX-License-Identifier: MPL-2.0

//! Storage utilities for recordings and in-flight uploads

use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::constants::RECORDING_EXTENSION;
use crate::errors::StorageError;

/// Resolve the file a named recording is saved to
///
/// Names may contain `/` to group recordings into subdirectories but must
/// stay inside `recordings_dir`.
pub fn recording_path(recordings_dir: &Path, name: &str) -> Result<PathBuf, StorageError> {
    let invalid = || StorageError::InvalidName(name.to_string());

    if name.is_empty() || name.contains('\\') || name.contains('\0') {
        return Err(invalid());
    }

    let relative = Path::new(name);
    let mut normalized = PathBuf::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => normalized.push(part),
            Component::CurDir => {}
            _ => return Err(invalid()),
        }
    }
    if normalized.as_os_str().is_empty() || name.ends_with('/') {
        return Err(invalid());
    }

    let file_name = match normalized.file_name() {
        Some(file_name) => format!("{}.{}", file_name.to_string_lossy(), RECORDING_EXTENSION),
        None => return Err(invalid()),
    };
    normalized.set_file_name(file_name);

    Ok(recordings_dir.join(normalized))
}

/// Path for a raw upload while it is received
pub fn upload_temp_path(temp_dir: &Path) -> PathBuf {
    temp_dir.join(format!("{}-.{}", uuid::Uuid::new_v4(), RECORDING_EXTENSION))
}

/// Write `bytes` to `path`, creating parent directories
pub async fn save_recording(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await?;
    debug!(path = %path.display(), bytes = bytes.len(), "Recording written");
    Ok(())
}

/// Default directory for locally recorded files (~/Videos/webm-recorder)
pub fn default_video_dir() -> PathBuf {
    dirs::video_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Videos")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("webm-recorder")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_path_simple() {
        let path = recording_path(Path::new("/srv/rec"), "meeting").unwrap();
        assert_eq!(path, PathBuf::from("/srv/rec/meeting.webm"));
    }

    #[test]
    fn test_recording_path_nested() {
        let path = recording_path(Path::new("/srv/rec"), "2024/01/./call").unwrap();
        assert_eq!(path, PathBuf::from("/srv/rec/2024/01/call.webm"));
    }

    #[test]
    fn test_recording_path_rejects_escapes() {
        for name in ["", "../etc/passwd", "a/../../b", "/abs", "a\\b", "dir/", "."] {
            assert!(
                recording_path(Path::new("/srv/rec"), name).is_err(),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_upload_temp_paths_are_unique() {
        let dir = Path::new("/tmp");
        let a = upload_temp_path(dir);
        let b = upload_temp_path(dir);
        assert_ne!(a, b);
        assert!(a.to_string_lossy().ends_with("-.webm"));
    }

    #[tokio::test]
    async fn test_save_recording_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/c.webm");
        save_recording(&path, b"data").await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"data");
    }
}
