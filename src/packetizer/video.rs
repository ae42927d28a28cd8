use super::{backward_ref, take_payload, Packetizer, PacketizerInput};
use crate::errors::DemuxResult;
use crate::packet::{Packet, PacketSink, NO_TIMECODE};
use crate::track::StreamDescriptor;
use log::trace;

/// Frame-aligned video. Every input is one complete frame.
#[derive(Debug)]
pub struct VideoPacketizer {
    descriptor: StreamDescriptor,
    previous_timecode: Option<i64>,
    frames: u64,
}

impl VideoPacketizer {
    pub fn new(mut descriptor: StreamDescriptor) -> Self {
        if let Some(fps) = descriptor.video().map(|v| v.frame_rate) {
            if fps > 0.0 {
                descriptor.default_duration = Some((1_000_000_000.0 / fps) as i64);
            }
        }
        Self {
            descriptor,
            previous_timecode: None,
            frames: 0,
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Packetizer for VideoPacketizer {
    fn process(&mut self, input: PacketizerInput, sink: &mut dyn PacketSink) -> DemuxResult<()> {
        let bref = backward_ref(input.frame_type, self.previous_timecode);
        trace!(
            "video {}: frame {} timecode {} bref {}",
            self.descriptor.id,
            self.frames,
            input.timecode,
            bref
        );
        sink.emit(Packet {
            stream_id: self.descriptor.id,
            data: take_payload(&self.descriptor, input.data),
            timecode: input.timecode,
            duration: input.duration,
            backward_ref: bref,
            forward_ref: NO_TIMECODE,
        });
        self.previous_timecode = Some(input.timecode);
        self.frames += 1;
        Ok(())
    }

    fn flush(&mut self, _sink: &mut dyn PacketSink) {}

    fn set_headers(&mut self) -> &StreamDescriptor {
        &self.descriptor
    }

    fn descriptor(&self) -> &StreamDescriptor {
        &self.descriptor
    }

    fn descriptor_mut(&mut self) -> &mut StreamDescriptor {
        &mut self.descriptor
    }

    fn format_name(&self) -> &'static str {
        "RealVideo"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::{FrameType, PacketQueue};
    use crate::track::{CodecFamily, CodecParams, MediaKind, VideoParams};
    use bytes::Bytes;

    fn descriptor() -> StreamDescriptor {
        StreamDescriptor {
            id: 0,
            kind: MediaKind::Video,
            fourcc: "RV40".into(),
            codec_id: "V_REAL/RV40".into(),
            family: CodecFamily::RealVideo,
            params: CodecParams::Video(VideoParams {
                pixel_width: 320,
                pixel_height: 240,
                display_width: 320,
                display_height: 240,
                frame_rate: 25.0,
            }),
            codec_private: Vec::new(),
            start_time: 0,
            preroll: 0,
            duplicate_data: false,
            default_duration: None,
        }
    }

    fn frame(tc: i64, frame_type: FrameType) -> PacketizerInput {
        PacketizerInput::new(Bytes::from_static(b"frame"))
            .with_timecode(tc)
            .with_frame_type(frame_type)
    }

    #[test]
    fn test_default_duration_from_frame_rate() {
        let p = VideoPacketizer::new(descriptor());
        assert_eq!(p.descriptor().default_duration, Some(40_000_000));
    }

    #[test]
    fn test_backward_references_follow_previous_frame() {
        let mut p = VideoPacketizer::new(descriptor());
        let mut sink = PacketQueue::new();
        p.process(frame(0, FrameType::Key), &mut sink).unwrap();
        p.process(frame(40, FrameType::Predicted), &mut sink).unwrap();
        p.process(frame(80, FrameType::Predicted), &mut sink).unwrap();
        p.process(frame(120, FrameType::Key), &mut sink).unwrap();
        p.process(frame(160, FrameType::DependsOn(80)), &mut sink).unwrap();

        let refs: Vec<i64> = sink.packets().map(|p| p.backward_ref).collect();
        assert_eq!(refs, vec![-1, 0, 40, -1, 80]);
        assert!(sink.packets().all(|p| p.duration == -1 && p.forward_ref == -1));
        assert_eq!(p.frames(), 5);
    }
}
