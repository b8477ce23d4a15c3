// SPDX-License-Identifier: MPL-2.0

//! Media source handles
//!
//! A media source groups zero or more video and audio capture tracks. The
//! recorder factory only ever reads the track counts.

use super::mime::TrackComposition;

/// A handle exposing the tracks of a capture source
pub trait MediaSource {
    /// Number of video tracks
    fn video_track_count(&self) -> usize;

    /// Number of audio tracks
    fn audio_track_count(&self) -> usize;

    /// Which kinds of tracks the source carries
    fn composition(&self) -> TrackComposition {
        TrackComposition::from_counts(self.video_track_count(), self.audio_track_count())
    }
}

impl<S: MediaSource + ?Sized> MediaSource for &S {
    fn video_track_count(&self) -> usize {
        (**self).video_track_count()
    }

    fn audio_track_count(&self) -> usize {
        (**self).audio_track_count()
    }
}

/// A source described only by its track counts
///
/// Useful where the real stream lives elsewhere (e.g. in a browser) and only
/// its shape is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrackCounts {
    pub video: usize,
    pub audio: usize,
}

impl TrackCounts {
    pub fn new(video: usize, audio: usize) -> Self {
        Self { video, audio }
    }
}

impl MediaSource for TrackCounts {
    fn video_track_count(&self) -> usize {
        self.video
    }

    fn audio_track_count(&self) -> usize {
        self.audio
    }
}
