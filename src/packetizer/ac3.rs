use super::{Packetizer, PacketizerInput};
use crate::ac3::{
    crc1_matches, crc1_span, find_sync_word, parse_ac3_header, Ac3Header, AC3_HEADER_SIZE,
};
use crate::config::ReaderOptions;
use crate::errors::{DemuxResult, SyncError};
use crate::packet::{Packet, PacketSink, NO_TIMECODE};
use crate::track::StreamDescriptor;
use bytes::{Buf, BytesMut};
use log::{debug, trace, warn};
use std::collections::VecDeque;

/// AC3 frames found by scanning a byte stream for sync words.
#[derive(Debug)]
pub struct Ac3Packetizer {
    descriptor: StreamDescriptor,
    buffer: BytesMut,
    /// Stream position of `buffer[0]`
    buffer_start: u64,
    received: u64,
    /// Input is byte swapped 16-bit words
    swap_bytes: bool,
    odd_byte: Option<u8>,
    /// `(stream position, timecode)` of every timed push not yet reached
    tags: VecDeque<(u64, i64)>,
    reference: Option<i64>,
    frames_since_reference: u64,
    packet_no: u64,
    /// Junk bytes discarded since the last valid frame
    junk: usize,
    resync_window: usize,
    strict_trailing_data: bool,
    dropped: usize,
    first_header: Option<Ac3Header>,
}

impl Ac3Packetizer {
    pub fn new(descriptor: StreamDescriptor, swap_bytes: bool, options: &ReaderOptions) -> Self {
        Self {
            descriptor,
            buffer: BytesMut::new(),
            buffer_start: 0,
            received: 0,
            swap_bytes,
            odd_byte: None,
            tags: VecDeque::new(),
            reference: None,
            frames_since_reference: 0,
            packet_no: 0,
            junk: 0,
            resync_window: options.resync_window,
            strict_trailing_data: options.strict_trailing_data,
            dropped: 0,
            first_header: None,
        }
    }

    /// Bytes dropped on flush because they did not form a complete frame.
    pub fn dropped_bytes(&self) -> usize {
        self.dropped
    }

    pub fn packets_emitted(&self) -> u64 {
        self.packet_no
    }

    /// Header of the first frame found, if any.
    pub fn first_header(&self) -> Option<&Ac3Header> {
        self.first_header.as_ref()
    }

    fn append(&mut self, data: &[u8]) {
        if !self.swap_bytes {
            self.buffer.extend_from_slice(data);
            return;
        }
        let mut rest = data;
        if let Some(b) = self.odd_byte.take() {
            match rest.split_first() {
                Some((&next, tail)) => {
                    self.buffer.extend_from_slice(&[next, b]);
                    rest = tail;
                }
                None => {
                    self.odd_byte = Some(b);
                    return;
                }
            }
        }
        let mut pairs = rest.chunks_exact(2);
        for pair in &mut pairs {
            self.buffer.extend_from_slice(&[pair[1], pair[0]]);
        }
        if let [last] = pairs.remainder() {
            self.odd_byte = Some(*last);
        }
    }

    fn discard(&mut self, n: usize) {
        if n == 0 {
            return;
        }
        self.buffer.advance(n);
        self.buffer_start += n as u64;
        self.junk += n;
        trace!("ac3 {}: skipped {} junk bytes", self.descriptor.id, n);
    }

    fn check_resync_window(&self) -> DemuxResult<()> {
        if self.junk > self.resync_window {
            return Err(SyncError::new(
                self.descriptor.id,
                format!(
                    "no valid AC3 frame found within {} bytes",
                    self.resync_window
                ),
            )
            .into());
        }
        Ok(())
    }

    fn frame_timecode(&mut self, frame_start: u64, duration: i64) -> i64 {
        while let Some(&(pos, tc)) = self.tags.front() {
            if pos > frame_start {
                break;
            }
            self.reference = Some(tc);
            self.frames_since_reference = 0;
            self.tags.pop_front();
        }
        match self.reference {
            Some(tc) => tc + self.frames_since_reference as i64 * duration,
            None => self.packet_no as i64 * duration,
        }
    }

    fn emit_frames(&mut self, sink: &mut dyn PacketSink) -> DemuxResult<()> {
        loop {
            let pos = match find_sync_word(&self.buffer, 0) {
                Some(pos) => pos,
                None => {
                    // a trailing 0x0b may be the first half of a sync word
                    let keep = usize::from(self.buffer.last() == Some(&0x0b));
                    self.discard(self.buffer.len() - keep);
                    return self.check_resync_window();
                }
            };
            self.discard(pos);
            self.check_resync_window()?;

            if self.buffer.len() < AC3_HEADER_SIZE {
                return Ok(());
            }
            let header = match parse_ac3_header(&self.buffer) {
                Some(h) => h,
                None => {
                    self.discard(1);
                    continue;
                }
            };
            if self.buffer.len() < crc1_span(header.bytes) {
                return Ok(());
            }
            // a sync word inside junk or payload may still carry a valid
            // looking header
            if !crc1_matches(&self.buffer, header.bytes) {
                trace!(
                    "ac3 {}: crc1 mismatch, not a frame start",
                    self.descriptor.id
                );
                self.discard(1);
                continue;
            }
            if self.buffer.len() < header.bytes {
                return Ok(());
            }

            let duration = header.duration_ns();
            let timecode = self.frame_timecode(self.buffer_start, duration);
            let data = self.buffer.split_to(header.bytes).freeze();
            self.buffer_start += header.bytes as u64;

            if self.first_header.is_none() {
                debug!(
                    "ac3 {}: {} Hz, {} channels, bsid {}",
                    self.descriptor.id, header.sample_rate, header.channels, header.bsid
                );
                self.first_header = Some(header);
            }

            sink.emit(Packet {
                stream_id: self.descriptor.id,
                data,
                timecode,
                duration,
                backward_ref: NO_TIMECODE,
                forward_ref: NO_TIMECODE,
            });
            self.packet_no += 1;
            self.frames_since_reference += 1;
            self.junk = 0;
        }
    }
}

impl Packetizer for Ac3Packetizer {
    fn process(&mut self, input: PacketizerInput, sink: &mut dyn PacketSink) -> DemuxResult<()> {
        if input.timecode >= 0 {
            self.tags.push_back((self.received, input.timecode));
        }
        self.received += input.data.len() as u64;
        self.append(&input.data);
        self.emit_frames(sink)
    }

    fn flush(&mut self, _sink: &mut dyn PacketSink) {
        let left = self.buffer.len() + usize::from(self.odd_byte.is_some());
        if left == 0 {
            return;
        }
        self.dropped += left;
        if self.strict_trailing_data {
            warn!(
                "ac3 {}: dropping {} bytes of incomplete trailing data",
                self.descriptor.id, left
            );
        } else {
            debug!(
                "ac3 {}: dropping {} bytes of incomplete trailing data",
                self.descriptor.id, left
            );
        }
        self.buffer_start += self.buffer.len() as u64;
        self.buffer.clear();
        self.odd_byte = None;
        self.tags.clear();
    }

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
        "AC3"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DemuxError;
    use crate::packet::PacketQueue;
    use crate::packetizer::tests::audio_descriptor;
    use crate::ac3::write_crc1;
    use crate::track::CodecFamily;
    use bytes::Bytes;

    /// 48 kHz, 32 kbit/s: 128 byte frames, bsid 8
    fn frame(fill: u8) -> Vec<u8> {
        let mut f = vec![0x0b, 0x77, 0x00, 0x00, 0x00, 0x40, 0xe1];
        f.resize(128, fill);
        write_crc1(&mut f).unwrap();
        f
    }

    fn packetizer(options: &ReaderOptions) -> Ac3Packetizer {
        Ac3Packetizer::new(audio_descriptor(2, CodecFamily::Ac3, "dnet"), false, options)
    }

    fn input(data: Vec<u8>, tc: i64) -> PacketizerInput {
        PacketizerInput::new(Bytes::from(data)).with_timecode(tc)
    }

    #[test]
    fn test_junk_then_two_frames() {
        let mut p = packetizer(&ReaderOptions::default());
        let mut sink = PacketQueue::new();

        let mut data = vec![0x12, 0x34, 0x56];
        data.extend(frame(0x11));
        data.extend(frame(0x22));
        p.process(input(data, 0), &mut sink).unwrap();

        assert_eq!(sink.len(), 2);
        let packets: Vec<_> = sink.packets().collect();
        assert_eq!(packets[0].data.len(), 128);
        assert_eq!(packets[1].data.len(), 128);
        assert_eq!(packets[0].data[7], 0x11);
        assert_eq!(packets[1].data[7], 0x22);
        assert_eq!(packets[0].timecode, 0);
        assert_eq!(packets[1].timecode, 32_000_000);
        assert_eq!(packets[0].duration, 32_000_000);
        assert!(packets.iter().all(|p| p.is_keyframe()));

        p.flush(&mut sink);
        assert_eq!(p.dropped_bytes(), 0);
    }

    #[test]
    fn test_sync_word_inside_junk_is_not_a_frame() {
        let mut p = packetizer(&ReaderOptions::default());
        let mut sink = PacketQueue::new();

        let mut data = vec![0x00, 0x0b, 0x77];
        data.extend(frame(0x11));
        data.extend(frame(0x22));
        p.process(input(data, 0), &mut sink).unwrap();

        let packets: Vec<_> = sink.packets().collect();
        assert_eq!(packets.len(), 2);
        assert_eq!(&packets[0].data[..], &frame(0x11)[..]);
        assert_eq!(&packets[1].data[..], &frame(0x22)[..]);
        assert_eq!(packets[0].timecode, 0);
        assert_eq!(packets[1].timecode, 32_000_000);
    }

    #[test]
    fn test_corrupt_frame_is_skipped() {
        let mut p = packetizer(&ReaderOptions::default());
        let mut sink = PacketQueue::new();

        let mut broken = frame(0x33);
        broken[40] ^= 0x80;
        let mut data = broken;
        data.extend(frame(0x44));
        p.process(input(data, 0), &mut sink).unwrap();

        assert_eq!(sink.len(), 1);
        assert_eq!(&sink.pop().unwrap().data[..], &frame(0x44)[..]);
    }

    #[test]
    fn test_frame_split_across_pushes() {
        let mut p = packetizer(&ReaderOptions::default());
        let mut sink = PacketQueue::new();

        let mut data = frame(1);
        data.extend(frame(2));
        let (a, b) = data.split_at(100);
        p.process(input(a.to_vec(), 1_000), &mut sink).unwrap();
        assert_eq!(sink.len(), 0);
        p.process(input(b.to_vec(), 500_000_000), &mut sink).unwrap();

        let tcs: Vec<i64> = sink.packets().map(|p| p.timecode).collect();
        // the second frame starts inside the second push
        assert_eq!(tcs, vec![1_000, 500_000_000]);
    }

    #[test]
    fn test_untimed_frames_count_from_zero() {
        let mut p = packetizer(&ReaderOptions::default());
        let mut sink = PacketQueue::new();
        let mut data = frame(1);
        data.extend(frame(2));
        p.process(PacketizerInput::new(Bytes::from(data)), &mut sink).unwrap();
        let tcs: Vec<i64> = sink.packets().map(|p| p.timecode).collect();
        assert_eq!(tcs, vec![0, 32_000_000]);
    }

    #[test]
    fn test_resync_window_exceeded() {
        let options = ReaderOptions {
            resync_window: 16,
            ..Default::default()
        };
        let mut p = packetizer(&options);
        let mut sink = PacketQueue::new();
        match p.process(input(vec![0u8; 64], 0), &mut sink) {
            Err(DemuxError::Sync(e)) => assert_eq!(e.stream_id, 2),
            other => panic!("expected sync error, got {:?}", other),
        }
    }

    #[test]
    fn test_false_sync_word_is_skipped() {
        let mut p = packetizer(&ReaderOptions::default());
        let mut sink = PacketQueue::new();
        // sync word followed by an invalid frame size code
        let mut data = vec![0x0b, 0x77, 0x00, 0x00, 0x3f, 0x40, 0xe1];
        data.extend(frame(9));
        p.process(input(data, 0), &mut sink).unwrap();
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.pop().unwrap().data[7], 9);
    }

    #[test]
    fn test_byte_swapped_input() {
        let mut p = Ac3Packetizer::new(
            audio_descriptor(2, CodecFamily::Ac3, "dnet"),
            true,
            &ReaderOptions::default(),
        );
        let mut sink = PacketQueue::new();
        let mut swapped = Vec::new();
        for pair in frame(5).chunks(2) {
            swapped.extend_from_slice(&[pair[1], pair[0]]);
        }
        // odd split keeps a byte across pushes
        p.process(input(swapped[..33].to_vec(), 0), &mut sink).unwrap();
        p.process(input(swapped[33..].to_vec(), -1), &mut sink).unwrap();
        assert_eq!(sink.len(), 1);
        assert_eq!(&sink.pop().unwrap().data[..], &frame(5)[..]);
    }

    #[test]
    fn test_flush_drops_incomplete_tail() {
        let options = ReaderOptions {
            strict_trailing_data: true,
            ..Default::default()
        };
        let mut p = packetizer(&options);
        let mut sink = PacketQueue::new();
        let mut data = frame(1);
        data.extend(&frame(2)[..50]);
        p.process(input(data, 0), &mut sink).unwrap();
        p.flush(&mut sink);
        assert_eq!(sink.len(), 1);
        assert_eq!(p.dropped_bytes(), 50);
        assert_eq!(p.first_header().map(|h| h.bsid), Some(8));
    }
}
