//! Sub-packet headers of fragmented RealVideo frames.
//!
//! Every fragment starts with a descriptor byte:
//! - bit 7: last fragment of the frame
//! - bit 6: set together with bit 7 clear marks a two byte short header
//!
//! Long headers carry the total frame length and the fragment offset, each
//! packed as 14 bits (bit 14 of the first 16-bit word set) or 30 bits.

use crate::bits::ByteCursor;
use crate::errors::CursorError;

const LAST_IN_CHAIN: u8 = 0x80;
const KIND_MASK: u8 = 0xc0;
const KIND_SHORT: u8 = 0x40;
/// Offset counted from the end of the frame
const KIND_TAIL: u8 = 0x80;
/// Offset field holds an absolute timecode in ms
const KIND_TIMECODE: u8 = 0xc0;

const MERGED_FLAG: u32 = 0x8000;
const SHORT_FIELD_FLAG: u32 = 0x4000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FragmentHeader {
    pub descriptor: u8,
    pub sub_sequence: u8,
    pub sequence_number: u8,
    /// Length of the complete frame
    pub total_length: u32,
    /// Position of this fragment's data inside the complete frame
    pub offset: u32,
    /// The whole frame arrived in one piece
    pub merged: bool,
    /// Absolute timecode (ns) overriding the chunk's own timecode
    pub timecode: Option<i64>,
}

impl FragmentHeader {
    pub fn is_last_in_chain(&self) -> bool {
        self.descriptor & LAST_IN_CHAIN != 0
    }

    pub fn is_short(&self) -> bool {
        self.descriptor & KIND_MASK == KIND_SHORT
    }
}

/// Read a 14 or 30 bit field.
fn read_packed_u30(bc: &mut ByteCursor) -> Result<(u32, u32), CursorError> {
    let first = u32::from(bc.read_u16_be()?);
    if first & SHORT_FIELD_FLAG != 0 {
        return Ok((first & 0x3fff, first));
    }
    let second = u32::from(bc.read_u16_be()?);
    Ok((((first << 16) | second) & 0x3fff_ffff, first))
}

/// Parse one fragment header. On return the cursor points at the fragment
/// data.
pub fn parse_fragment_header(bc: &mut ByteCursor) -> Result<FragmentHeader, CursorError> {
    let descriptor = bc.read_u8()?;

    if descriptor & KIND_MASK == KIND_SHORT {
        bc.skip(1)?;
        return Ok(FragmentHeader {
            descriptor,
            sub_sequence: 0,
            sequence_number: 0,
            total_length: bc.remaining_length() as u32,
            offset: 0,
            merged: false,
            timecode: None,
        });
    }

    let mut sub_sequence = 0;
    if descriptor & 0x40 == 0 {
        sub_sequence = bc.read_u8()? & 0x7f;
    }

    let (total_length, raw_length) = read_packed_u30(bc)?;
    let merged = raw_length & MERGED_FLAG != 0;
    let (mut offset, _) = read_packed_u30(bc)?;
    let sequence_number = bc.read_u8()?;

    let mut timecode = None;
    match descriptor & KIND_MASK {
        KIND_TIMECODE => {
            timecode = Some(i64::from(offset) * 1_000_000);
            offset = 0;
        }
        KIND_TAIL => offset = total_length.wrapping_sub(offset),
        _ => {}
    }

    Ok(FragmentHeader {
        descriptor,
        sub_sequence,
        sequence_number,
        total_length,
        offset,
        merged,
        timecode,
    })
}
