//! Packetizers turn chunks or raw byte runs of one stream into `Packet`s.
//!
//! Each codec family has its own packetizer; the demuxer holds them as a
//! closed `StreamPacketizer` enum and drives them through the `Packetizer`
//! trait.

mod aac;
mod ac3;
mod passthrough;
mod video;

pub use aac::AacPacketizer;
pub use ac3::Ac3Packetizer;
pub use passthrough::PassthroughPacketizer;
pub use video::VideoPacketizer;

use crate::errors::DemuxResult;
use crate::packet::{FrameType, PacketSink, NO_TIMECODE};
use crate::track::{CodecFamily, ConnectionResult, StreamDescriptor};
use bytes::Bytes;

/// One unit of input for a packetizer
#[derive(Debug, Clone)]
pub struct PacketizerInput {
    pub data: Bytes,
    /// Timecode of the first byte in ns, `-1` if unknown
    pub timecode: i64,
    pub duration: i64,
    pub frame_type: FrameType,
}

impl PacketizerInput {
    pub fn new(data: Bytes) -> Self {
        Self {
            data,
            timecode: NO_TIMECODE,
            duration: NO_TIMECODE,
            frame_type: FrameType::Key,
        }
    }

    pub fn with_timecode(mut self, timecode: i64) -> Self {
        self.timecode = timecode;
        self
    }

    pub fn with_duration(mut self, duration: i64) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_frame_type(mut self, frame_type: FrameType) -> Self {
        self.frame_type = frame_type;
        self
    }
}

pub trait Packetizer {
    /// Consume one input and push any finished packets into `sink`.
    fn process(&mut self, input: PacketizerInput, sink: &mut dyn PacketSink) -> DemuxResult<()>;

    /// End of input: emit or drop buffered partial state.
    fn flush(&mut self, sink: &mut dyn PacketSink);

    /// Finalize the descriptor before it is handed to the sink.
    fn set_headers(&mut self) -> &StreamDescriptor;

    fn descriptor(&self) -> &StreamDescriptor;

    fn descriptor_mut(&mut self) -> &mut StreamDescriptor;

    fn format_name(&self) -> &'static str;

    fn family(&self) -> CodecFamily {
        self.descriptor().family
    }

    fn can_connect_to(&self, other: &dyn Packetizer) -> ConnectionResult {
        self.descriptor().can_connect_to(other.descriptor())
    }
}

/// Take the payload out of an input, copying it when the stream asks for it.
pub(crate) fn take_payload(descriptor: &StreamDescriptor, data: Bytes) -> Bytes {
    if descriptor.duplicate_data {
        Bytes::copy_from_slice(&data)
    } else {
        data
    }
}

/// Backward reference for a frame given the previous emitted timecode.
pub(crate) fn backward_ref(frame_type: FrameType, previous: Option<i64>) -> i64 {
    match frame_type {
        FrameType::Key => NO_TIMECODE,
        FrameType::Predicted => previous.unwrap_or(NO_TIMECODE),
        FrameType::DependsOn(timecode) => timecode,
    }
}

/// The packetizer attached to one stream
#[derive(Debug)]
pub enum StreamPacketizer {
    Video(VideoPacketizer),
    Ac3(Ac3Packetizer),
    Aac(AacPacketizer),
    Passthrough(PassthroughPacketizer),
}

macro_rules! dispatch {
    ($self:expr, $p:ident => $body:expr) => {
        match $self {
            StreamPacketizer::Video($p) => $body,
            StreamPacketizer::Ac3($p) => $body,
            StreamPacketizer::Aac($p) => $body,
            StreamPacketizer::Passthrough($p) => $body,
        }
    };
}

impl Packetizer for StreamPacketizer {
    fn process(&mut self, input: PacketizerInput, sink: &mut dyn PacketSink) -> DemuxResult<()> {
        dispatch!(self, p => p.process(input, sink))
    }

    fn flush(&mut self, sink: &mut dyn PacketSink) {
        dispatch!(self, p => p.flush(sink))
    }

    fn set_headers(&mut self) -> &StreamDescriptor {
        dispatch!(self, p => p.set_headers())
    }

    fn descriptor(&self) -> &StreamDescriptor {
        dispatch!(self, p => p.descriptor())
    }

    fn descriptor_mut(&mut self) -> &mut StreamDescriptor {
        dispatch!(self, p => p.descriptor_mut())
    }

    fn format_name(&self) -> &'static str {
        dispatch!(self, p => p.format_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::PacketQueue;
    use crate::track::{AudioParams, CodecParams, MediaKind};

    pub(crate) fn audio_descriptor(id: u32, family: CodecFamily, fourcc: &str) -> StreamDescriptor {
        StreamDescriptor {
            id,
            kind: MediaKind::Audio,
            fourcc: fourcc.to_string(),
            codec_id: format!("A_REAL/{}", fourcc.to_uppercase()),
            family,
            params: CodecParams::Audio(AudioParams {
                sample_rate: 44100,
                output_sample_rate: None,
                channels: 2,
                bits_per_sample: 16,
                extra_data: Vec::new(),
            }),
            codec_private: Vec::new(),
            start_time: 0,
            preroll: 0,
            duplicate_data: false,
            default_duration: None,
        }
    }

    #[test]
    fn test_backward_ref_rules() {
        assert_eq!(backward_ref(FrameType::Key, Some(10)), -1);
        assert_eq!(backward_ref(FrameType::Predicted, Some(10)), 10);
        assert_eq!(backward_ref(FrameType::Predicted, None), -1);
        assert_eq!(backward_ref(FrameType::DependsOn(3), Some(10)), 3);
    }

    #[test]
    fn test_duplicate_data_copies_payload() {
        let chunk = Bytes::from_static(b"abcdef");
        let mut desc = audio_descriptor(1, CodecFamily::Passthrough, "cook");
        let shared = take_payload(&desc, chunk.slice(1..3));
        assert_eq!(&shared[..], b"bc");
        desc.duplicate_data = true;
        let copied = take_payload(&desc, chunk.slice(1..3));
        assert_eq!(copied, shared);
    }

    #[test]
    fn test_enum_dispatch() {
        let mut p = StreamPacketizer::Passthrough(PassthroughPacketizer::new(audio_descriptor(
            4,
            CodecFamily::Passthrough,
            "cook",
        )));
        let mut sink = PacketQueue::new();
        p.process(
            PacketizerInput::new(Bytes::from_static(b"x")).with_timecode(0),
            &mut sink,
        )
        .unwrap();
        assert_eq!(p.format_name(), "RealAudio");
        assert_eq!(p.family(), CodecFamily::Passthrough);
        assert_eq!(sink.len(), 1);
        assert_eq!(p.set_headers().codec_id, "A_REAL/COOK");
    }
}
