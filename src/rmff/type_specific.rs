//! Codec descriptions stored in the type specific data of an `MDPR` object.

use crate::bits::ByteCursor;
use crate::errors::CursorError;

const VIDEO_PROPS_SIZE: usize = 34;
const AUDIO_V4_PROPS_SIZE: usize = 56;
const AUDIO_V5_PROPS_SIZE: usize = 70;
/// Extra data of v5 audio starts after the props and a 32-bit length
const AUDIO_V5_EXTRA_OFFSET: usize = AUDIO_V5_PROPS_SIZE + 4;

const VIDEO_TAG: &[u8; 4] = b"VIDO";
const AUDIO_TAG: &[u8; 4] = b".ra\xfd";

#[derive(Debug, Clone, PartialEq)]
pub struct VideoProps {
    pub fourcc: [u8; 4],
    pub width: u16,
    pub height: u16,
    pub bits_per_pixel: u16,
    /// Frames per second, decoded from 16.16 fixed point
    pub frame_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioProps {
    pub version: u16,
    /// Codec four character code. `None` when a v4 header's codec string
    /// is not four bytes long.
    pub fourcc: Option<[u8; 4]>,
    /// Sub-format tag such as `.ra4`
    pub format_tag: [u8; 4],
    pub flavor: u16,
    pub sample_rate: u32,
    pub sample_size: u16,
    pub channels: u16,
    pub extra_data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeSpecific {
    Video(VideoProps),
    Audio(AudioProps),
    /// Not a stream this reader can demux (e.g. logical file info)
    Other,
}

fn u16_at(data: &[u8], pos: usize) -> u16 {
    u16::from_be_bytes([data[pos], data[pos + 1]])
}

fn u32_at(data: &[u8], pos: usize) -> u32 {
    u32::from_be_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]])
}

fn fourcc_at(data: &[u8], pos: usize) -> [u8; 4] {
    [data[pos], data[pos + 1], data[pos + 2], data[pos + 3]]
}

fn parse_video(data: &[u8]) -> VideoProps {
    let fps = u32_at(data, 22);
    VideoProps {
        fourcc: fourcc_at(data, 8),
        width: u16_at(data, 12),
        height: u16_at(data, 14),
        bits_per_pixel: u16_at(data, 16),
        frame_rate: f64::from(fps >> 16) + f64::from(fps & 0xffff) / 65536.0,
    }
}

/// The interleaver string and the codec string following a v4 header.
fn read_v4_codec(rest: &[u8]) -> Result<(Option<[u8; 4]>, Vec<u8>), CursorError> {
    let mut bc = ByteCursor::new(rest);
    let _interleaver = bc.read_pascal_string()?;
    let len = bc.read_u8()?;
    if len != 4 {
        return Ok((None, Vec::new()));
    }
    let fourcc = bc.read_fourcc()?;
    Ok((Some(fourcc), bc.rest().to_vec()))
}

fn parse_audio(data: &[u8]) -> Option<AudioProps> {
    let version = u16_at(data, 4);
    let format_tag = fourcc_at(data, 8);
    let flavor = u16_at(data, 22);

    if version == 4 {
        let (fourcc, extra_data) =
            read_v4_codec(&data[AUDIO_V4_PROPS_SIZE..]).unwrap_or((None, Vec::new()));
        return Some(AudioProps {
            version,
            fourcc,
            format_tag,
            flavor,
            sample_rate: u32::from(u16_at(data, 48)),
            sample_size: u16_at(data, 52),
            channels: u16_at(data, 54),
            extra_data,
        });
    }

    if data.len() < AUDIO_V5_PROPS_SIZE {
        return None;
    }
    let extra_data = if data.len() > AUDIO_V5_EXTRA_OFFSET {
        data[AUDIO_V5_EXTRA_OFFSET..].to_vec()
    } else {
        Vec::new()
    };
    Some(AudioProps {
        version,
        fourcc: Some(fourcc_at(data, 66)),
        format_tag,
        flavor,
        sample_rate: u32::from(u16_at(data, 54)),
        sample_size: u16_at(data, 58),
        channels: u16_at(data, 60),
        extra_data,
    })
}

/// Classify and parse type specific data.
pub fn parse_type_specific(data: &[u8]) -> TypeSpecific {
    if data.len() >= VIDEO_PROPS_SIZE && &data[4..8] == VIDEO_TAG {
        return TypeSpecific::Video(parse_video(data));
    }
    if data.len() >= AUDIO_V4_PROPS_SIZE && &data[0..4] == AUDIO_TAG {
        if let Some(audio) = parse_audio(data) {
            return TypeSpecific::Audio(audio);
        }
    }
    TypeSpecific::Other
}

/// Build video type specific data.
pub fn build_video_props(fourcc: &[u8; 4], width: u16, height: u16, frame_rate: f64) -> Vec<u8> {
    let mut v = Vec::with_capacity(VIDEO_PROPS_SIZE);
    v.extend_from_slice(&(VIDEO_PROPS_SIZE as u32).to_be_bytes());
    v.extend_from_slice(VIDEO_TAG);
    v.extend_from_slice(fourcc);
    v.extend_from_slice(&width.to_be_bytes());
    v.extend_from_slice(&height.to_be_bytes());
    v.extend_from_slice(&12u16.to_be_bytes());
    v.extend_from_slice(&0u32.to_be_bytes());
    let fixed = (frame_rate * 65536.0).round() as u32;
    v.extend_from_slice(&fixed.to_be_bytes());
    v.extend_from_slice(&[0; 8]);
    v
}

fn audio_common(version: u16, out: &mut Vec<u8>) {
    out.extend_from_slice(AUDIO_TAG);
    out.extend_from_slice(&version.to_be_bytes());
    out.extend_from_slice(&[0, 0]);
    out.extend_from_slice(if version == 4 { b".ra4" } else { b".ra5" });
    out.extend_from_slice(&[0; 4]);
    out.extend_from_slice(&version.to_be_bytes());
    out.extend_from_slice(&0x4eu32.to_be_bytes());
    // flavor, coded frame size, three unknowns, sub packet h/frame/size
    out.extend_from_slice(&[0; 2 + 4 + 12 + 6]);
    out.extend_from_slice(&[0, 0]);
}

/// Build v4 audio type specific data. `codec` is written as the codec
/// string; a length other than four makes the track unidentifiable.
pub fn build_audio_v4_props(
    codec: &[u8],
    sample_rate: u16,
    sample_size: u16,
    channels: u16,
    extra: &[u8],
) -> Vec<u8> {
    let mut v = Vec::with_capacity(AUDIO_V4_PROPS_SIZE + 16 + extra.len());
    audio_common(4, &mut v);
    v.extend_from_slice(&sample_rate.to_be_bytes());
    v.extend_from_slice(&[0, 0]);
    v.extend_from_slice(&sample_size.to_be_bytes());
    v.extend_from_slice(&channels.to_be_bytes());
    v.push(4);
    v.extend_from_slice(b"Int4");
    v.push(codec.len() as u8);
    v.extend_from_slice(codec);
    v.extend_from_slice(extra);
    v
}

/// Build v5 audio type specific data.
pub fn build_audio_v5_props(
    fourcc: &[u8; 4],
    sample_rate: u16,
    sample_size: u16,
    channels: u16,
    extra: &[u8],
) -> Vec<u8> {
    let mut v = Vec::with_capacity(AUDIO_V5_EXTRA_OFFSET + extra.len());
    audio_common(5, &mut v);
    v.extend_from_slice(&[0; 6]);
    v.extend_from_slice(&sample_rate.to_be_bytes());
    v.extend_from_slice(&[0, 0]);
    v.extend_from_slice(&sample_size.to_be_bytes());
    v.extend_from_slice(&channels.to_be_bytes());
    v.extend_from_slice(b"genr");
    v.extend_from_slice(fourcc);
    if !extra.is_empty() {
        v.extend_from_slice(&(extra.len() as u32).to_be_bytes());
        v.extend_from_slice(extra);
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_props() {
        let data = build_video_props(b"RV40", 640, 480, 29.97);
        assert_eq!(data.len(), VIDEO_PROPS_SIZE);
        match parse_type_specific(&data) {
            TypeSpecific::Video(v) => {
                assert_eq!(&v.fourcc, b"RV40");
                assert_eq!((v.width, v.height), (640, 480));
                assert!((v.frame_rate - 29.97).abs() < 0.001);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_audio_v4_props() {
        let data = build_audio_v4_props(b"cook", 44100, 16, 2, &[1, 2, 3]);
        assert_eq!(data[AUDIO_V4_PROPS_SIZE], 4);
        match parse_type_specific(&data) {
            TypeSpecific::Audio(a) => {
                assert_eq!(a.version, 4);
                assert_eq!(a.fourcc, Some(*b"cook"));
                assert_eq!(a.sample_rate, 44100);
                assert_eq!(a.sample_size, 16);
                assert_eq!(a.channels, 2);
                assert_eq!(a.extra_data, vec![1, 2, 3]);
                assert_eq!(&a.format_tag, b".ra4");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_audio_v4_bad_codec_string() {
        let data = build_audio_v4_props(b"sipr5", 8000, 16, 1, &[]);
        match parse_type_specific(&data) {
            TypeSpecific::Audio(a) => assert_eq!(a.fourcc, None),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_audio_v5_props() {
        let extra = [0, 0, 0, 3, 2, 0x13, 0x90];
        let data = build_audio_v5_props(b"raac", 22050, 16, 2, &extra[4..]);
        assert_eq!(u32_at(&data, 66), u32::from_be_bytes(*b"raac"));
        match parse_type_specific(&data) {
            TypeSpecific::Audio(a) => {
                assert_eq!(a.version, 5);
                assert_eq!(a.fourcc, Some(*b"raac"));
                assert_eq!(a.sample_rate, 22050);
                assert_eq!(a.channels, 2);
                assert_eq!(a.extra_data, vec![2, 0x13, 0x90]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_other_type_specific() {
        assert_eq!(parse_type_specific(b"logical-fileinfo"), TypeSpecific::Other);
        let mut short_v5 = build_audio_v5_props(b"raac", 44100, 16, 2, &[]);
        short_v5.truncate(60);
        assert_eq!(parse_type_specific(&short_v5), TypeSpecific::Other);
    }
}
