//! RealMedia File Format reader.

mod demuxer;
pub mod objects;
pub mod type_specific;
pub mod writer;

pub use demuxer::{ReadStatus, RealDemuxer};
pub use objects::{
    ContentDescription, FileHeader, FileProperties, MediaProperties, ObjectHeader, PacketHeader,
};
pub use writer::RmffBuilder;

use crate::streams::SeekableStream;
use std::io::{self, Read, SeekFrom};

pub const RMF_ID: &[u8; 4] = b".RMF";
pub const PROP_ID: &[u8; 4] = b"PROP";
pub const CONT_ID: &[u8; 4] = b"CONT";
pub const MDPR_ID: &[u8; 4] = b"MDPR";
pub const DATA_ID: &[u8; 4] = b"DATA";
pub const INDX_ID: &[u8; 4] = b"INDX";

/// Does `data` start with the RealMedia signature?
pub fn probe(data: &[u8]) -> bool {
    data.len() >= RMF_ID.len() && data[..RMF_ID.len()].eq_ignore_ascii_case(RMF_ID)
}

/// Probe a source without moving its read position.
pub fn probe_source<S: SeekableStream>(source: &mut S) -> io::Result<bool> {
    let pos = source.tell()?;
    let mut lead = Vec::with_capacity(RMF_ID.len());
    let read = source.by_ref().take(RMF_ID.len() as u64).read_to_end(&mut lead);
    source.seek(SeekFrom::Start(pos))?;
    read?;
    Ok(probe(&lead))
}
