//! Packets and the boundary to the downstream muxer.

use crate::track::StreamDescriptor;
use bytes::Bytes;
use std::collections::VecDeque;

/// Marker for an unknown timecode, duration or absent reference.
pub const NO_TIMECODE: i64 = -1;

/// A finished, timed and dependency-annotated unit of one elementary stream.
/// All times are nanoseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    pub stream_id: u32,
    pub data: Bytes,
    pub timecode: i64,
    /// `-1` if unknown; the sink infers it
    pub duration: i64,
    /// `-1` for a keyframe, otherwise the timecode of the frame this one depends on
    pub backward_ref: i64,
    /// `-1` unless the frame also depends on a later frame
    pub forward_ref: i64,
}

impl Packet {
    pub fn is_keyframe(&self) -> bool {
        self.backward_ref == NO_TIMECODE
    }
}

/// Decode dependency of an incoming frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameType {
    /// Decodable on its own
    Key,
    /// Depends on the previous frame emitted on the same stream
    Predicted,
    /// Depends on the frame with the given timecode
    DependsOn(i64),
}

/// Receives packets from the demuxer. The sink never calls back into the
/// demuxer.
#[cfg_attr(test, mockall::automock)]
pub trait PacketSink {
    /// Called once with the final stream parameters, before the first `emit`.
    fn set_headers(&mut self, streams: &[StreamDescriptor]);

    fn emit(&mut self, packet: Packet);

    /// Stream parameters changed after `set_headers`; the track headers
    /// must be rewritten.
    fn headers_changed(&mut self, stream: &StreamDescriptor);

    /// End of input for every stream; drain any buffered partial packet.
    fn flush(&mut self);
}

/// Collecting sink that keeps everything in memory.
#[derive(Debug, Default)]
pub struct PacketQueue {
    packets: VecDeque<Packet>,
    headers: Vec<StreamDescriptor>,
    header_updates: Vec<StreamDescriptor>,
    flushes: usize,
}

impl PacketQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pop(&mut self) -> Option<Packet> {
        self.packets.pop_front()
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    pub fn packets(&self) -> impl Iterator<Item = &Packet> {
        self.packets.iter()
    }

    /// Packets of one stream, in emission order.
    pub fn for_stream(&self, stream_id: u32) -> Vec<&Packet> {
        self.packets
            .iter()
            .filter(|p| p.stream_id == stream_id)
            .collect()
    }

    pub fn headers(&self) -> &[StreamDescriptor] {
        &self.headers
    }

    pub fn header_updates(&self) -> &[StreamDescriptor] {
        &self.header_updates
    }

    pub fn flush_count(&self) -> usize {
        self.flushes
    }
}

impl PacketSink for PacketQueue {
    fn set_headers(&mut self, streams: &[StreamDescriptor]) {
        self.headers = streams.to_vec();
    }

    fn emit(&mut self, packet: Packet) {
        self.packets.push_back(packet);
    }

    fn headers_changed(&mut self, stream: &StreamDescriptor) {
        if let Some(h) = self.headers.iter_mut().find(|h| h.id == stream.id) {
            *h = stream.clone();
        }
        self.header_updates.push(stream.clone());
    }

    fn flush(&mut self) {
        self.flushes += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packet(stream_id: u32, timecode: i64, backward_ref: i64) -> Packet {
        Packet {
            stream_id,
            data: Bytes::from_static(b"x"),
            timecode,
            duration: NO_TIMECODE,
            backward_ref,
            forward_ref: NO_TIMECODE,
        }
    }

    #[test]
    fn test_queue_keeps_order_per_stream() {
        let mut q = PacketQueue::new();
        q.emit(packet(1, 0, -1));
        q.emit(packet(2, 0, -1));
        q.emit(packet(1, 40, 0));
        assert_eq!(q.len(), 3);
        let s1: Vec<i64> = q.for_stream(1).iter().map(|p| p.timecode).collect();
        assert_eq!(s1, vec![0, 40]);
        assert!(q.pop().unwrap().is_keyframe());
        q.flush();
        assert_eq!(q.flush_count(), 1);
    }
}
