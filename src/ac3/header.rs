//! AC3 (ATSC A/52) synchronization frame header.

use crate::bits::BitCursor;

pub const AC3_SYNC_WORD: u16 = 0x0b77;
/// Bytes needed to decide whether a sync word starts a valid frame
pub const AC3_HEADER_SIZE: usize = 7;
pub const AC3_SAMPLES_PER_FRAME: u32 = 1536;

const SAMPLE_RATES: [u32; 3] = [48000, 44100, 32000];
const BIT_RATES: [u32; 19] = [
    32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384, 448, 512, 576, 640,
];
const ACMOD_CHANNELS: [u16; 8] = [2, 1, 2, 3, 3, 4, 4, 5];

/// Highest bitstream id a plain AC3 decoder accepts
const MAX_BSID: u8 = 10;

/// x^16 + x^15 + x^2 + 1
const CRC16_POLY: u16 = 0x8005;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ac3Header {
    pub sample_rate: u32,
    /// Bit rate in kbit/s
    pub bit_rate: u32,
    /// Complete frame size in bytes, sync word included
    pub bytes: usize,
    pub bsid: u8,
    pub bsmod: u8,
    pub acmod: u8,
    pub lfe: bool,
    pub channels: u16,
}

impl Ac3Header {
    pub fn samples(&self) -> u32 {
        AC3_SAMPLES_PER_FRAME
    }

    /// Frame duration in nanoseconds.
    pub fn duration_ns(&self) -> i64 {
        i64::from(AC3_SAMPLES_PER_FRAME) * 1_000_000_000 / i64::from(self.sample_rate)
    }
}

/// Frame size in bytes for `fscod` and `frmsizecod`.
pub fn frame_size(fscod: u8, frmsizecod: u8) -> Option<usize> {
    if fscod > 2 || frmsizecod > 37 {
        return None;
    }
    let kbps = BIT_RATES[(frmsizecod >> 1) as usize];
    let words = match fscod {
        0 => kbps * 2,
        1 => kbps * 1000 * 96 / 44100 + u32::from(frmsizecod & 1),
        _ => kbps * 3,
    };
    Some(words as usize * 2)
}

/// Parse the header of a frame that starts at `buf[0]`. Returns `None` when
/// `buf` does not start with a sync word, is shorter than
/// `AC3_HEADER_SIZE`, or carries invalid field values.
pub fn parse_ac3_header(buf: &[u8]) -> Option<Ac3Header> {
    if buf.len() < AC3_HEADER_SIZE {
        return None;
    }
    let mut bc = BitCursor::new(&buf[..AC3_HEADER_SIZE]);
    if bc.get_bits(16).ok()? != u32::from(AC3_SYNC_WORD) {
        return None;
    }
    bc.skip_bits(16).ok()?; // crc1
    let fscod = bc.get_bits(2).ok()? as u8;
    let frmsizecod = bc.get_bits(6).ok()? as u8;
    let bsid = bc.get_bits(5).ok()? as u8;
    let bsmod = bc.get_bits(3).ok()? as u8;
    let acmod = bc.get_bits(3).ok()? as u8;

    if bsid > MAX_BSID {
        return None;
    }
    let bytes = frame_size(fscod, frmsizecod)?;

    if (acmod & 0x01) != 0 && acmod != 0x01 {
        bc.skip_bits(2).ok()?; // cmixlev
    }
    if (acmod & 0x04) != 0 {
        bc.skip_bits(2).ok()?; // surmixlev
    }
    if acmod == 0x02 {
        bc.skip_bits(2).ok()?; // dsurmod
    }
    let lfe = bc.get_flag().ok()?;

    Some(Ac3Header {
        sample_rate: SAMPLE_RATES[fscod as usize],
        bit_rate: BIT_RATES[(frmsizecod >> 1) as usize],
        bytes,
        bsid,
        bsmod,
        acmod,
        lfe,
        channels: ACMOD_CHANNELS[acmod as usize] + u16::from(lfe),
    })
}

fn crc16(data: &[u8]) -> u16 {
    let mut crc = 0u16;
    for &byte in data {
        crc ^= u16::from(byte) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ CRC16_POLY
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// End of the region protected by crc1: the first 5/8 of a frame.
pub fn crc1_span(frame_bytes: usize) -> usize {
    ((frame_bytes >> 2) + (frame_bytes >> 4)) << 1
}

/// Check crc1 of a frame of `frame_bytes` starting at `buf[0]`. The CRC
/// over everything after the sync word up to the 5/8 point, crc1 itself
/// included, is zero for an intact frame.
pub fn crc1_matches(buf: &[u8], frame_bytes: usize) -> bool {
    let end = crc1_span(frame_bytes);
    end > 4 && buf.len() >= end && crc16(&buf[2..end]) == 0
}

/// Compute and store crc1 for the frame starting at `frame[0]`, as an
/// encoder does. Returns the stored value, or `None` when the frame header
/// is invalid or the protected region is not all there.
pub fn write_crc1(frame: &mut [u8]) -> Option<u16> {
    let header = parse_ac3_header(frame)?;
    let end = crc1_span(header.bytes);
    if frame.len() < end {
        return None;
    }
    frame[2] = 0;
    frame[3] = 0;
    // crc1 sits at the front of the region: divide the remainder by
    // x^(8 * region length) instead of appending it
    let mut crc = crc16(&frame[2..end]);
    for _ in 0..8 * (end - 2) {
        crc = if crc & 1 != 0 {
            ((u32::from(crc) ^ (0x1_0000 | u32::from(CRC16_POLY))) >> 1) as u16
        } else {
            crc >> 1
        };
    }
    frame[2..4].copy_from_slice(&crc.to_be_bytes());
    Some(crc)
}

/// Search `buf` for the first position at or after `from` holding the two
/// sync bytes.
pub fn find_sync_word(buf: &[u8], from: usize) -> Option<usize> {
    if buf.len() < 2 {
        return None;
    }
    (from..buf.len() - 1).find(|&i| buf[i] == 0x0b && buf[i + 1] == 0x77)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 48 kHz, 192 kbit/s, bsid 8, 3/2 + LFE
    fn header_48k_192() -> [u8; 7] {
        // fscod 0, frmsizecod 20; bsid 8, bsmod 0
        // acmod 7, cmixlev 0, surmixlev 0, lfeon 1
        [0x0b, 0x77, 0x00, 0x00, 0x14, 0x40, 0xe1]
    }

    #[test]
    fn test_frame_sizes() {
        assert_eq!(frame_size(0, 0), Some(128));
        assert_eq!(frame_size(1, 0), Some(138));
        assert_eq!(frame_size(1, 1), Some(140));
        assert_eq!(frame_size(2, 37), Some(3840));
        assert_eq!(frame_size(1, 37), Some(2788));
        assert_eq!(frame_size(3, 0), None);
        assert_eq!(frame_size(0, 38), None);
    }

    #[test]
    fn test_parse_header() {
        let h = parse_ac3_header(&header_48k_192()).unwrap();
        assert_eq!(h.sample_rate, 48000);
        assert_eq!(h.bit_rate, 192);
        assert_eq!(h.bytes, 768);
        assert_eq!(h.bsid, 8);
        assert_eq!(h.acmod, 7);
        assert!(h.lfe);
        assert_eq!(h.channels, 6);
        assert_eq!(h.duration_ns(), 32_000_000);
    }

    #[test]
    fn test_reject_invalid_headers() {
        let mut bad_rate = header_48k_192();
        bad_rate[4] = 0xc0; // fscod 3
        assert!(parse_ac3_header(&bad_rate).is_none());

        let mut bad_bsid = header_48k_192();
        bad_bsid[5] = 0x80; // bsid 16
        assert!(parse_ac3_header(&bad_bsid).is_none());

        assert!(parse_ac3_header(&header_48k_192()[..6]).is_none());
        assert!(parse_ac3_header(&[0x0b, 0x78, 0, 0, 0x14, 0x40, 0xe1]).is_none());
    }

    #[test]
    fn test_crc1_written_and_checked() {
        let mut frame = header_48k_192().to_vec();
        frame.resize(768, 0x5a);
        let span = crc1_span(768);
        assert_eq!(span, 480);

        assert!(write_crc1(&mut frame).is_some());
        assert!(crc1_matches(&frame, 768));
        assert_eq!(parse_ac3_header(&frame).map(|h| h.bytes), Some(768));

        // bytes past the 5/8 point are not covered
        frame[span] ^= 0xff;
        assert!(crc1_matches(&frame, 768));

        frame[span - 1] ^= 0x01;
        assert!(!crc1_matches(&frame, 768));
        assert!(!crc1_matches(&frame[..span - 1], 768));
    }

    #[test]
    fn test_crc1_needs_the_whole_region() {
        let mut short = header_48k_192().to_vec();
        short.resize(100, 0);
        assert_eq!(write_crc1(&mut short), None);
    }

    #[test]
    fn test_find_sync_word() {
        let buf = [0x00, 0x0b, 0x00, 0x0b, 0x77, 0x01];
        assert_eq!(find_sync_word(&buf, 0), Some(3));
        assert_eq!(find_sync_word(&buf, 4), None);
        assert_eq!(find_sync_word(&[0x0b], 0), None);
    }
}
