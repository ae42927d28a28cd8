//! Top-level objects of a RealMedia file.
//!
//! Every object starts with `id:u32 size:u32 version:u16`; `size` includes
//! these ten bytes. Data packets inside a `DATA` object carry their own
//! twelve byte header.

use crate::bits::reader::{read_u16_be, read_u32_be, read_u8};
use crate::bits::ByteCursor;
use crate::errors::CursorError;
use serde::Serialize;
use std::io::{self, Read};

pub const OBJECT_HEADER_SIZE: u32 = 10;
pub const DATA_HEADER_SIZE: u32 = OBJECT_HEADER_SIZE + 8;
pub const PACKET_HEADER_SIZE: u16 = 12;

const KEYFRAME_FLAG: u8 = 0x02;

/// Header shared by all top-level objects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectHeader {
    pub id: [u8; 4],
    pub size: u32,
    pub version: u16,
}

impl ObjectHeader {
    pub fn name(&self) -> String {
        String::from_utf8_lossy(&self.id).into_owned()
    }

    /// Bytes following the header, `None` if `size` is too small to hold
    /// the header itself.
    pub fn payload_size(&self) -> Option<u32> {
        self.size.checked_sub(OBJECT_HEADER_SIZE)
    }
}

/// Read an object header from a stream
pub fn read_object_header<R: Read>(r: &mut R) -> io::Result<ObjectHeader> {
    let mut id = [0u8; 4];
    r.read_exact(&mut id)?;
    Ok(ObjectHeader {
        id,
        size: read_u32_be(r)?,
        version: read_u16_be(r)?,
    })
}

/// Write an object header to a vector
pub fn write_object_header(output: &mut Vec<u8>, id: &[u8; 4], size: u32, version: u16) {
    output.extend_from_slice(id);
    output.extend_from_slice(&size.to_be_bytes());
    output.extend_from_slice(&version.to_be_bytes());
}

/// Payload of the leading `.RMF` object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FileHeader {
    pub file_version: u32,
    pub num_headers: u32,
}

pub fn parse_file_header(payload: &[u8]) -> Result<FileHeader, CursorError> {
    let mut bc = ByteCursor::new(payload);
    Ok(FileHeader {
        file_version: bc.read_u32_be()?,
        num_headers: bc.read_u32_be()?,
    })
}

/// `PROP`: global file properties
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileProperties {
    pub max_bit_rate: u32,
    pub avg_bit_rate: u32,
    pub max_packet_size: u32,
    pub avg_packet_size: u32,
    pub num_packets: u32,
    /// Milliseconds
    pub duration: u32,
    pub preroll: u32,
    pub index_offset: u32,
    pub data_offset: u32,
    pub num_streams: u16,
    pub flags: u16,
}

pub fn parse_file_properties(payload: &[u8]) -> Result<FileProperties, CursorError> {
    let mut bc = ByteCursor::new(payload);
    Ok(FileProperties {
        max_bit_rate: bc.read_u32_be()?,
        avg_bit_rate: bc.read_u32_be()?,
        max_packet_size: bc.read_u32_be()?,
        avg_packet_size: bc.read_u32_be()?,
        num_packets: bc.read_u32_be()?,
        duration: bc.read_u32_be()?,
        preroll: bc.read_u32_be()?,
        index_offset: bc.read_u32_be()?,
        data_offset: bc.read_u32_be()?,
        num_streams: bc.read_u16_be()?,
        flags: bc.read_u16_be()?,
    })
}

/// `CONT`: textual content description
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContentDescription {
    pub title: String,
    pub author: String,
    pub copyright: String,
    pub comment: String,
}

pub fn parse_content_description(payload: &[u8]) -> Result<ContentDescription, CursorError> {
    let mut bc = ByteCursor::new(payload);
    Ok(ContentDescription {
        title: bc.read_u16_string()?,
        author: bc.read_u16_string()?,
        copyright: bc.read_u16_string()?,
        comment: bc.read_u16_string()?,
    })
}

/// `MDPR`: properties of one media stream
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaProperties {
    pub stream_id: u16,
    pub max_bit_rate: u32,
    pub avg_bit_rate: u32,
    pub max_packet_size: u32,
    pub avg_packet_size: u32,
    pub start_time: u32,
    pub preroll: u32,
    pub duration: u32,
    pub stream_name: String,
    pub mime_type: String,
    pub type_specific: Vec<u8>,
}

pub fn parse_media_properties(payload: &[u8]) -> Result<MediaProperties, CursorError> {
    let mut bc = ByteCursor::new(payload);
    let stream_id = bc.read_u16_be()?;
    let max_bit_rate = bc.read_u32_be()?;
    let avg_bit_rate = bc.read_u32_be()?;
    let max_packet_size = bc.read_u32_be()?;
    let avg_packet_size = bc.read_u32_be()?;
    let start_time = bc.read_u32_be()?;
    let preroll = bc.read_u32_be()?;
    let duration = bc.read_u32_be()?;
    let stream_name = bc.read_pascal_string()?;
    let mime_type = bc.read_pascal_string()?;
    let size = bc.read_u32_be()? as usize;
    let type_specific = bc.read_bytes(size)?.to_vec();

    Ok(MediaProperties {
        stream_id,
        max_bit_rate,
        avg_bit_rate,
        max_packet_size,
        avg_packet_size,
        start_time,
        preroll,
        duration,
        stream_name,
        mime_type,
        type_specific,
    })
}

/// Fields following the object header of a `DATA` object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataHeader {
    pub num_packets: u32,
    pub next_data_header: u32,
}

pub fn read_data_header<R: Read>(r: &mut R) -> io::Result<DataHeader> {
    Ok(DataHeader {
        num_packets: read_u32_be(r)?,
        next_data_header: read_u32_be(r)?,
    })
}

/// Header of one data packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    pub version: u16,
    /// Packet length including this header
    pub length: u16,
    pub stream_id: u16,
    pub timestamp_ms: u32,
    pub reserved: u8,
    pub flags: u8,
}

impl PacketHeader {
    pub fn is_keyframe(&self) -> bool {
        self.flags & KEYFRAME_FLAG != 0
    }

    pub fn timecode_ns(&self) -> i64 {
        i64::from(self.timestamp_ms) * 1_000_000
    }

    /// Length of the payload, `None` if `length` cannot even hold the header.
    pub fn payload_length(&self) -> Option<usize> {
        self.length
            .checked_sub(PACKET_HEADER_SIZE)
            .map(usize::from)
    }
}

pub fn read_packet_header<R: Read>(r: &mut R) -> io::Result<PacketHeader> {
    Ok(PacketHeader {
        version: read_u16_be(r)?,
        length: read_u16_be(r)?,
        stream_id: read_u16_be(r)?,
        timestamp_ms: read_u32_be(r)?,
        reserved: read_u8(r)?,
        flags: read_u8(r)?,
    })
}
