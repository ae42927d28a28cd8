use serde::Serialize;

/// Container format detected from the leading bytes of a source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ContainerFormat {
    RealMedia,
    Unknown(String),
}

impl ContainerFormat {
    pub fn name(&self) -> &str {
        match self {
            ContainerFormat::RealMedia => "RealMedia",
            ContainerFormat::Unknown(s) => s,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, ContainerFormat::Unknown(_))
    }
}

/// One track as reported by identification
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TrackInfo {
    pub id: u32,
    #[serde(rename = "type")]
    pub kind: String,
    /// Human readable codec, e.g. `AAC` or the container fourcc
    pub codec: String,
    pub codec_id: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub frame_rate: Option<f64>,
    pub sample_rate: Option<u32>,
    pub channels: Option<u16>,
}

impl TrackInfo {
    /// `audio (AAC)` style summary.
    pub fn summary(&self) -> String {
        format!("{} ({})", self.kind, self.codec)
    }
}

/// Container level information about a source
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct FileInfo {
    pub format: ContainerFormat,
    pub size: u64,
    /// Seconds
    pub duration: Option<f64>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub copyright: Option<String>,
    pub comment: Option<String>,
    pub tracks: Vec<TrackInfo>,
}
