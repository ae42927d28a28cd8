//! Stream descriptors: what the demuxer knows about each elementary stream.

use serde::Serialize;

/// Media kind of an elementary stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MediaKind {
    Audio,
    Video,
    Subtitle,
}

impl MediaKind {
    pub fn name(&self) -> &'static str {
        match self {
            MediaKind::Audio => "audio",
            MediaKind::Video => "video",
            MediaKind::Subtitle => "subtitles",
        }
    }
}

/// Codec family a stream is packetized as. Two streams can only be appended
/// to each other when their families match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CodecFamily {
    RealVideo,
    Ac3,
    Aac,
    Passthrough,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoParams {
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub display_width: u32,
    pub display_height: u32,
    pub frame_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioParams {
    pub sample_rate: u32,
    /// Output rate when it differs from `sample_rate` (SBR AAC)
    pub output_sample_rate: Option<u32>,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub extra_data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CodecParams {
    Video(VideoParams),
    Audio(AudioParams),
}

/// Result of checking whether one stream can be appended to another
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionResult {
    Yes,
    NoFormat,
    NoParameters,
}

/// Description of one elementary stream. Created while parsing the headers;
/// only video dimensions change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamDescriptor {
    pub id: u32,
    pub kind: MediaKind,
    /// Four character code as found in the container
    pub fourcc: String,
    /// Identifier handed to the muxer, e.g. `V_REAL/RV40`
    pub codec_id: String,
    pub family: CodecFamily,
    pub params: CodecParams,
    pub codec_private: Vec<u8>,
    pub start_time: u32,
    pub preroll: u32,
    /// Packetizers must take their own copy of sub-slices of a chunk instead
    /// of keeping the chunk buffer alive.
    pub duplicate_data: bool,
    /// Default frame duration in nanoseconds, if known
    pub default_duration: Option<i64>,
}

impl StreamDescriptor {
    pub fn video(&self) -> Option<&VideoParams> {
        match &self.params {
            CodecParams::Video(v) => Some(v),
            _ => None,
        }
    }

    pub fn video_mut(&mut self) -> Option<&mut VideoParams> {
        match &mut self.params {
            CodecParams::Video(v) => Some(v),
            _ => None,
        }
    }

    pub fn audio(&self) -> Option<&AudioParams> {
        match &self.params {
            CodecParams::Audio(a) => Some(a),
            _ => None,
        }
    }

    pub fn audio_mut(&mut self) -> Option<&mut AudioParams> {
        match &mut self.params {
            CodecParams::Audio(a) => Some(a),
            _ => None,
        }
    }

    /// Check whether packets of `other` may continue this stream.
    pub fn can_connect_to(&self, other: &StreamDescriptor) -> ConnectionResult {
        if self.family != other.family || self.kind != other.kind {
            return ConnectionResult::NoFormat;
        }
        if self.codec_id != other.codec_id {
            return ConnectionResult::NoParameters;
        }
        let same = match (&self.params, &other.params) {
            (CodecParams::Video(a), CodecParams::Video(b)) => {
                a.pixel_width == b.pixel_width && a.pixel_height == b.pixel_height
            }
            (CodecParams::Audio(a), CodecParams::Audio(b)) => {
                a.sample_rate == b.sample_rate && a.channels == b.channels
            }
            _ => false,
        };
        if !same {
            return ConnectionResult::NoParameters;
        }
        if self.family == CodecFamily::Passthrough && self.codec_private != other.codec_private {
            return ConnectionResult::NoParameters;
        }
        ConnectionResult::Yes
    }
}
