use super::{backward_ref, take_payload, Packetizer, PacketizerInput};
use crate::errors::DemuxResult;
use crate::packet::{Packet, PacketSink, NO_TIMECODE};
use crate::track::StreamDescriptor;

/// Forwards payloads unmodified with the timing the caller supplies.
#[derive(Debug)]
pub struct PassthroughPacketizer {
    descriptor: StreamDescriptor,
    previous_timecode: Option<i64>,
}

impl PassthroughPacketizer {
    pub fn new(descriptor: StreamDescriptor) -> Self {
        Self {
            descriptor,
            previous_timecode: None,
        }
    }
}

impl Packetizer for PassthroughPacketizer {
    fn process(&mut self, input: PacketizerInput, sink: &mut dyn PacketSink) -> DemuxResult<()> {
        sink.emit(Packet {
            stream_id: self.descriptor.id,
            data: take_payload(&self.descriptor, input.data),
            timecode: input.timecode,
            duration: input.duration,
            backward_ref: backward_ref(input.frame_type, self.previous_timecode),
            forward_ref: NO_TIMECODE,
        });
        self.previous_timecode = Some(input.timecode);
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
        "RealAudio"
    }
}
