mod detector;
mod types;

pub use detector::{detect_format, detect_format_from_bytes, PROBE_SIZE};
pub use types::{ContainerFormat, FileInfo, TrackInfo};
