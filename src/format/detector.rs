use super::types::ContainerFormat;
use crate::errors::DemuxResult;
use crate::rmff;
use crate::streams::SeekableStream;
use std::io::SeekFrom;

/// Number of leading bytes the detector looks at
pub const PROBE_SIZE: usize = 4;

/// Detect the container format of a source from its first bytes. The read
/// position is restored whatever the outcome.
pub fn detect_format<S: SeekableStream>(stream: &mut S) -> DemuxResult<ContainerFormat> {
    let pos = stream.tell()?;
    stream.seek(SeekFrom::Start(0))?;
    let found = rmff::probe_source(stream);
    stream.seek(SeekFrom::Start(pos))?;
    if found? {
        return Ok(ContainerFormat::RealMedia);
    }
    Ok(ContainerFormat::Unknown("unknown".to_string()))
}

/// Detect the container format of an in-memory prefix.
pub fn detect_format_from_bytes(data: &[u8]) -> ContainerFormat {
    if rmff::probe(data) {
        ContainerFormat::RealMedia
    } else {
        ContainerFormat::Unknown("unknown".to_string())
    }
}
