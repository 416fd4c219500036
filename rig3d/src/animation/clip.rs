use super::Track;

/// A named set of tracks spanning `duration` seconds.
#[derive(Debug, Clone, Default)]
pub struct AnimationClip {
    duration: f32,
    tracks: Vec<Track>,
}

impl AnimationClip {
    /// Create an empty clip. The duration must be strictly positive for
    /// playback; the binary loader enforces this on file data.
    pub fn new(duration: f32) -> Self {
        Self {
            duration,
            tracks: Vec::new(),
        }
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn add_track(&mut self, track: Track) {
        self.tracks.push(track);
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }
}
