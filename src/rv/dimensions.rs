use crate::bits::BitCursor;
use crate::errors::CursorError;

const WIDTHS: [u32; 8] = [160, 176, 240, 320, 352, 640, 704, 0];
const HEIGHTS: [u32; 8] = [120, 132, 144, 240, 288, 480, 0, 0];
const HEIGHTS_EXTENDED: [u32; 4] = [180, 360, 576, 0];

/// Sum 8-bit extension codes, each worth `code << 2`, up to and including
/// the first code below 255.
fn read_extended_size(bc: &mut BitCursor) -> Result<u32, CursorError> {
    let mut size = 0u32;
    loop {
        let code = bc.get_bits(8)?;
        size += code << 2;
        if code != 255 {
            return Ok(size);
        }
    }
}

fn read_dimensions(frame: &[u8]) -> Result<(u32, u32), CursorError> {
    let mut bc = BitCursor::new(frame);
    bc.skip_bits(13)?;
    bc.skip_bits(13)?;

    let mut width = WIDTHS[bc.get_bits(3)? as usize];
    if width == 0 {
        width = read_extended_size(&mut bc)?;
    }

    let code = bc.get_bits(3)?;
    let mut height = HEIGHTS[code as usize];
    if height == 0 {
        let bit = bc.get_bits(1)?;
        height = HEIGHTS_EXTENDED[(((code << 1) | bit) & 3) as usize];
        if height == 0 {
            height = read_extended_size(&mut bc)?;
        }
    }

    Ok((width, height))
}

/// Recover the coded picture size from the start of a RealVideo 4 frame.
/// `None` means the size could not be determined from this data.
pub fn parse_rv_dimensions(frame: &[u8]) -> Option<(u32, u32)> {
    read_dimensions(frame).ok()
}

#[cfg(test)]
mod tests {
    use super::parse_rv_dimensions;

    /// Pack `(value, bits)` fields MSB first after 26 leading zero bits.
    fn frame(fields: &[(u32, u32)]) -> Vec<u8> {
        let mut bits: Vec<u8> = vec![0; 26];
        for &(value, n) in fields {
            for i in (0..n).rev() {
                bits.push(((value >> i) & 1) as u8);
            }
        }
        while bits.len() % 8 != 0 {
            bits.push(0);
        }
        bits.chunks(8)
            .map(|c| c.iter().fold(0u8, |acc, b| (acc << 1) | b))
            .collect()
    }

    #[test]
    fn test_table_sizes() {
        // width code 5 -> 640, height code 5 -> 480
        assert_eq!(parse_rv_dimensions(&frame(&[(5, 3), (5, 3)])), Some((640, 480)));
        // width code 4 -> 352, height code 4 -> 288
        assert_eq!(parse_rv_dimensions(&frame(&[(4, 3), (4, 3)])), Some((352, 288)));
    }

    #[test]
    fn test_secondary_height_table() {
        // height code 6 + bit 0 -> index (12 | 0) & 3 = 0 -> 180
        assert_eq!(parse_rv_dimensions(&frame(&[(0, 3), (6, 3), (0, 1)])), Some((160, 180)));
        // height code 7 + bit 0 -> index 14 & 3 = 2 -> 576
        assert_eq!(parse_rv_dimensions(&frame(&[(0, 3), (7, 3), (0, 1)])), Some((160, 576)));
    }

    #[test]
    fn test_extension_codes() {
        // width: 255, 65 -> (255 + 65) * 4 = 1280
        // height: code 7 + bit 1 -> index 3 -> extension 180 -> 720
        let data = frame(&[(7, 3), (255, 8), (65, 8), (7, 3), (1, 1), (180, 8)]);
        assert_eq!(parse_rv_dimensions(&data), Some((1280, 720)));
    }

    #[test]
    fn test_truncated_frame_is_undetermined() {
        assert_eq!(parse_rv_dimensions(&[0x00, 0x00, 0x00]), None);
        // width extension never terminates inside the buffer
        let data = frame(&[(7, 3), (255, 8)]);
        assert_eq!(parse_rv_dimensions(&data[..data.len() - 1]), None);
    }
}
