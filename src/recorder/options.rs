// SPDX-License-Identifier: MPL-2.0

//! Recorder configuration
//!
//! Options are a loose name → value mapping, the same shape a browser
//! `MediaRecorder` accepts. The computed `mimeType` is written first and the
//! caller's entries are laid over it, so a caller-supplied `mimeType` always
//! wins. Flipping that merge order would silently discard caller overrides.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::constants::option_keys;
use crate::errors::RecordingError;
use crate::media::{CapabilityProbe, MediaSource, select_mime_type};

/// Key holding the encoding identifier
pub const MIME_TYPE_KEY: &str = option_keys::MIME_TYPE;

/// Recorder options keyed by option name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecorderOptions(Map<String, Value>);

impl RecorderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace an entry, returning the previous value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The configured `mimeType`, if present and a string
    pub fn mime_type(&self) -> Option<&str> {
        self.get(MIME_TYPE_KEY).and_then(Value::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lay every entry of `other` over this one; `other` wins on collision
    pub fn overlay(&mut self, other: &RecorderOptions) {
        for (key, value) in other.iter() {
            self.0.insert(key.clone(), value.clone());
        }
    }
}

impl From<Map<String, Value>> for RecorderOptions {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for RecorderOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Build the recorder configuration for a source
///
/// Selection always runs, even when `overrides` carries its own `mimeType`,
/// so a source without tracks or without any supported candidate fails here.
///
/// # Arguments
/// * `source` - Media source whose track counts drive selection
/// * `probe` - Host capability check
/// * `overrides` - Caller options laid over the computed defaults
pub fn build_options<S, P>(
    source: &S,
    probe: &P,
    overrides: Option<&RecorderOptions>,
) -> Result<RecorderOptions, RecordingError>
where
    S: MediaSource + ?Sized,
    P: CapabilityProbe + ?Sized,
{
    let computed = select_mime_type(source.composition(), probe)?;
    let mut options = RecorderOptions::new().with(MIME_TYPE_KEY, computed);

    if let Some(overrides) = overrides {
        if let Some(custom) = overrides.get(MIME_TYPE_KEY) {
            debug!(computed, custom = %custom, "Caller options override computed mime type");
        }
        options.overlay(overrides);
    }

    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::TrackCounts;
    use serde_json::json;

    fn supports_all(_: &str) -> bool {
        true
    }

    #[test]
    fn test_computed_mime_type_only() {
        let options = build_options(&TrackCounts::new(0, 1), &supports_all, None).unwrap();
        assert_eq!(options.len(), 1);
        assert_eq!(options.mime_type(), Some(r#"audio/webm;codecs="opus""#));
    }

    #[test]
    fn test_overrides_merge_after_default() {
        let overrides = RecorderOptions::new()
            .with("mimeType", "custom")
            .with("videoBitsPerSecond", 1_000_000);
        let options =
            build_options(&TrackCounts::new(1, 1), &supports_all, Some(&overrides)).unwrap();

        assert_eq!(options.mime_type(), Some("custom"));
        assert_eq!(options.get("videoBitsPerSecond"), Some(&json!(1_000_000)));
        assert_eq!(options.len(), 2);
    }

    #[test]
    fn test_override_does_not_skip_selection() {
        let overrides = RecorderOptions::new().with("mimeType", "video/webm");
        let err = build_options(&TrackCounts::default(), &supports_all, Some(&overrides))
            .unwrap_err();
        assert_eq!(err, RecordingError::NoTracks);
    }

    #[test]
    fn test_non_string_mime_type_is_kept() {
        let overrides = RecorderOptions::new().with("mimeType", 42);
        let options =
            build_options(&TrackCounts::new(1, 0), &supports_all, Some(&overrides)).unwrap();
        assert_eq!(options.mime_type(), None);
        assert_eq!(options.get("mimeType"), Some(&json!(42)));
    }

    #[test]
    fn test_serde_transparent() {
        let options: RecorderOptions =
            serde_json::from_str(r#"{"mimeType":"audio/webm","audioBitsPerSecond":64000}"#)
                .unwrap();
        assert_eq!(options.mime_type(), Some("audio/webm"));
        assert_eq!(
            serde_json::to_value(&options).unwrap(),
            json!({"mimeType": "audio/webm", "audioBitsPerSecond": 64000})
        );
    }

    #[test]
    fn test_from_iterator() {
        let options: RecorderOptions = [("mimeType", "audio/webm")].into_iter().collect();
        assert_eq!(options.mime_type(), Some("audio/webm"));
    }
}
