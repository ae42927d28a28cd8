//! Builder for small RealMedia files, used to exercise the reader without
//! sample media.

use super::objects::{write_object_header, DATA_HEADER_SIZE, OBJECT_HEADER_SIZE, PACKET_HEADER_SIZE};
use super::type_specific::{build_audio_v4_props, build_audio_v5_props, build_video_props};
use super::{CONT_ID, DATA_ID, INDX_ID, MDPR_ID, PROP_ID, RMF_ID};
use crate::errors::HeaderError;
use log::warn;

const KEYFRAME_FLAG: u8 = 0x02;

#[derive(Debug, Default)]
pub struct RmffBuilder {
    content: Option<[String; 4]>,
    /// Raw objects between the properties and the first data section
    objects: Vec<Vec<u8>>,
    sections: Vec<Vec<Vec<u8>>>,
    index: bool,
    duration_ms: u32,
    /// First packet that could not be written
    rejected: Option<HeaderError>,
}

impl RmffBuilder {
    pub fn new() -> Self {
        Self {
            sections: vec![Vec::new()],
            ..Self::default()
        }
    }

    pub fn duration_ms(mut self, duration_ms: u32) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn content(mut self, title: &str, author: &str, copyright: &str, comment: &str) -> Self {
        self.content = Some([
            title.to_string(),
            author.to_string(),
            copyright.to_string(),
            comment.to_string(),
        ]);
        self
    }

    /// Add an `MDPR` object with arbitrary type specific data.
    pub fn media_properties(mut self, stream_id: u16, mime_type: &str, type_specific: &[u8]) -> Self {
        let mut p = Vec::new();
        p.extend_from_slice(&stream_id.to_be_bytes());
        // bit rates, packet sizes, start time, preroll, duration
        p.extend_from_slice(&[0; 28]);
        p.push(0);
        p.push(mime_type.len() as u8);
        p.extend_from_slice(mime_type.as_bytes());
        p.extend_from_slice(&(type_specific.len() as u32).to_be_bytes());
        p.extend_from_slice(type_specific);
        self.objects.push(object(MDPR_ID, &p));
        self
    }

    pub fn video_stream(self, stream_id: u16, fourcc: &[u8; 4], width: u16, height: u16, fps: f64) -> Self {
        let props = build_video_props(fourcc, width, height, fps);
        self.media_properties(stream_id, "video/x-pn-realvideo", &props)
    }

    pub fn audio_stream_v4(
        self,
        stream_id: u16,
        codec: &[u8],
        sample_rate: u16,
        channels: u16,
        extra: &[u8],
    ) -> Self {
        let props = build_audio_v4_props(codec, sample_rate, 16, channels, extra);
        self.media_properties(stream_id, "audio/x-pn-realaudio", &props)
    }

    pub fn audio_stream_v5(
        self,
        stream_id: u16,
        fourcc: &[u8; 4],
        sample_rate: u16,
        channels: u16,
        extra: &[u8],
    ) -> Self {
        let props = build_audio_v5_props(fourcc, sample_rate, 16, channels, extra);
        self.media_properties(stream_id, "audio/x-pn-realaudio", &props)
    }

    /// Add an object the reader does not know.
    pub fn raw_object(mut self, id: &[u8; 4], payload: &[u8]) -> Self {
        self.objects.push(object(id, payload));
        self
    }

    /// Append a packet to the current data section. A payload that does
    /// not fit the 16-bit packet length is left out and reported by
    /// `try_build`.
    pub fn packet(mut self, stream_id: u16, timestamp_ms: u32, keyframe: bool, payload: &[u8]) -> Self {
        let length = match u16::try_from(payload.len())
            .ok()
            .and_then(|len| len.checked_add(PACKET_HEADER_SIZE))
        {
            Some(length) => length,
            None => {
                warn!(
                    "stream {}: {} byte payload does not fit a packet, left out",
                    stream_id,
                    payload.len()
                );
                if self.rejected.is_none() {
                    self.rejected = Some(HeaderError::new(format!(
                        "packet payload of {} bytes exceeds the maximum of {}",
                        payload.len(),
                        u16::MAX - PACKET_HEADER_SIZE
                    )));
                }
                return self;
            }
        };

        let mut p = Vec::with_capacity(usize::from(length));
        p.extend_from_slice(&0u16.to_be_bytes());
        p.extend_from_slice(&length.to_be_bytes());
        p.extend_from_slice(&stream_id.to_be_bytes());
        p.extend_from_slice(&timestamp_ms.to_be_bytes());
        p.push(0);
        p.push(if keyframe { KEYFRAME_FLAG } else { 0 });
        p.extend_from_slice(payload);
        if let Some(section) = self.sections.last_mut() {
            section.push(p);
        }
        self
    }

    /// Start another `DATA` object; following packets go there.
    pub fn data_section(mut self) -> Self {
        self.sections.push(Vec::new());
        self
    }

    /// Terminate the data with an (empty) `INDX` object.
    pub fn index(mut self) -> Self {
        self.index = true;
        self
    }

    fn stream_count(&self) -> u16 {
        self.objects
            .iter()
            .filter(|o| &o[..4] == MDPR_ID)
            .count() as u16
    }

    /// Like `build`, but fails if any packet was rejected.
    pub fn try_build(mut self) -> Result<Vec<u8>, HeaderError> {
        match self.rejected.take() {
            Some(e) => Err(e),
            None => Ok(self.build()),
        }
    }

    pub fn build(self) -> Vec<u8> {
        let mut headers = Vec::new();

        let mut prop = Vec::new();
        let num_packets: usize = self.sections.iter().map(|s| s.len()).sum();
        for v in [0u32, 0, 0, 0, num_packets as u32, self.duration_ms, 0, 0, 0] {
            prop.extend_from_slice(&v.to_be_bytes());
        }
        prop.extend_from_slice(&self.stream_count().to_be_bytes());
        prop.extend_from_slice(&0u16.to_be_bytes());
        headers.push(object(PROP_ID, &prop));

        if let Some(content) = &self.content {
            let mut cont = Vec::new();
            for s in content {
                cont.extend_from_slice(&(s.len() as u16).to_be_bytes());
                cont.extend_from_slice(s.as_bytes());
            }
            headers.push(object(CONT_ID, &cont));
        }
        headers.extend(self.objects);

        let mut out = Vec::new();
        write_object_header(&mut out, RMF_ID, OBJECT_HEADER_SIZE + 8, 0);
        out.extend_from_slice(&0u32.to_be_bytes());
        out.extend_from_slice(&(headers.len() as u32 + 1).to_be_bytes());
        for h in headers {
            out.extend_from_slice(&h);
        }

        for section in &self.sections {
            let size: usize = section.iter().map(|p| p.len()).sum();
            write_object_header(&mut out, DATA_ID, DATA_HEADER_SIZE + size as u32, 0);
            out.extend_from_slice(&(section.len() as u32).to_be_bytes());
            out.extend_from_slice(&0u32.to_be_bytes());
            for p in section {
                out.extend_from_slice(p);
            }
        }

        if self.index {
            out.extend_from_slice(&object(INDX_ID, &[0; 10]));
        }
        out
    }
}

fn object(id: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(OBJECT_HEADER_SIZE as usize + payload.len());
    write_object_header(&mut buf, id, OBJECT_HEADER_SIZE + payload.len() as u32, 0);
    buf.extend_from_slice(payload);
    buf
}
