use serde::{Deserialize, Serialize};

/// Default number of junk bytes an audio packetizer skips while looking for
/// a sync word before it gives up on the stream.
pub const DEFAULT_RESYNC_WINDOW: usize = 64 * 1024;

/// Verbosity level for the chattier diagnostics. Level 0 logs nothing beyond
/// warnings and the packetizer selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Verbosity(pub u8);

impl Verbosity {
    pub fn at(self, level: u8) -> bool {
        self.0 >= level
    }
}

/// Values the reader receives from its caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderOptions {
    pub verbosity: Verbosity,
    /// Track ids whose AAC audio must be treated as SBR. `-1` applies to all tracks.
    pub aac_is_sbr: Vec<i64>,
    /// Explicit display size for video tracks.
    pub display_dimensions: Option<(u32, u32)>,
    /// Explicit display aspect ratio for video tracks. Ignored when
    /// `display_dimensions` is set.
    pub aspect_ratio: Option<f64>,
    pub resync_window: usize,
    /// Warn instead of logging at debug level when a packetizer drops an
    /// incomplete trailing frame on flush.
    pub strict_trailing_data: bool,
    /// Audio tracks to demux. `None` selects all of them.
    pub audio_tracks: Option<Vec<u32>>,
    /// Video tracks to demux. `None` selects all of them.
    pub video_tracks: Option<Vec<u32>>,
    /// Order in which track headers are handed to the sink. Tracks not
    /// listed follow in file order.
    pub track_order: Vec<u32>,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::default(),
            aac_is_sbr: Vec::new(),
            display_dimensions: None,
            aspect_ratio: None,
            resync_window: DEFAULT_RESYNC_WINDOW,
            strict_trailing_data: false,
            audio_tracks: None,
            video_tracks: None,
            track_order: Vec::new(),
        }
    }
}

impl ReaderOptions {
    pub fn audio_requested(&self, id: u32) -> bool {
        self.audio_tracks.as_ref().map_or(true, |ids| ids.contains(&id))
    }

    pub fn video_requested(&self, id: u32) -> bool {
        self.video_tracks.as_ref().map_or(true, |ids| ids.contains(&id))
    }

    pub fn is_forced_sbr(&self, id: u32) -> bool {
        self.aac_is_sbr
            .iter()
            .any(|&tid| tid == -1 || tid == i64::from(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_selection() {
        let opts = ReaderOptions {
            audio_tracks: Some(vec![1]),
            ..Default::default()
        };
        assert!(opts.audio_requested(1));
        assert!(!opts.audio_requested(2));
        assert!(opts.video_requested(7));
    }

    #[test]
    fn test_forced_sbr() {
        let mut opts = ReaderOptions::default();
        assert!(!opts.is_forced_sbr(3));
        opts.aac_is_sbr = vec![3];
        assert!(opts.is_forced_sbr(3));
        assert!(!opts.is_forced_sbr(4));
        opts.aac_is_sbr = vec![-1];
        assert!(opts.is_forced_sbr(4));
    }

    #[test]
    fn test_verbosity_levels() {
        assert!(Verbosity(2).at(1));
        assert!(Verbosity(2).at(2));
        assert!(!Verbosity(0).at(1));
    }
}
