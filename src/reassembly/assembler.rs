use super::header::{parse_fragment_header, FragmentHeader};
use crate::bits::ByteCursor;
use crate::errors::CursorError;
use bytes::{BufMut, Bytes, BytesMut};
use log::{trace, warn};

/// One piece of a logical frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub offset: u32,
    pub data: Bytes,
}

/// Fragments of the frame currently being accumulated
#[derive(Debug, Clone)]
pub struct FragmentSet {
    fragments: Vec<Fragment>,
    declared_length: u32,
    merged: bool,
    keyframe: bool,
    timecode: i64,
}

impl FragmentSet {
    fn new(declared_length: u32, keyframe: bool, timecode: i64) -> Self {
        Self {
            fragments: Vec::new(),
            declared_length,
            merged: false,
            keyframe,
            timecode,
        }
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn timecode(&self) -> i64 {
        self.timecode
    }

    fn data_length(&self) -> usize {
        self.fragments.iter().map(|f| f.data.len()).sum()
    }

    /// Enough bytes arrived to fill the declared length.
    fn is_complete(&self) -> bool {
        self.data_length() >= self.declared_length as usize
    }

    /// Fragment indices sorted by offset if they tile `[0, declared_length)`
    /// exactly, `None` otherwise.
    fn consistent_layout(&self) -> Option<Vec<usize>> {
        if self.data_length() != self.declared_length as usize {
            return None;
        }
        let mut order: Vec<usize> = (0..self.fragments.len()).collect();
        order.sort_by_key(|&i| self.fragments[i].offset);
        let mut end = 0usize;
        for &i in &order {
            let f = &self.fragments[i];
            if f.offset as usize != end {
                return None;
            }
            end += f.data.len();
        }
        Some(order)
    }
}

/// A reconstructed logical frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledFrame {
    /// Frame bytes, fragments laid out by offset
    pub data: Bytes,
    /// Start offset of every originally distinct fragment inside `data`
    pub segment_offsets: Vec<u32>,
    pub merged: bool,
    pub keyframe: bool,
    pub timecode: i64,
    /// Offsets were inconsistent and fragments were laid out in arrival order
    pub relaid: bool,
}

impl AssembledFrame {
    /// The frame prefixed with its segment table: one byte holding the
    /// segment count minus one, then a little endian `(1, offset)` pair of
    /// 32-bit words per segment. Merged frames describe a single segment.
    pub fn to_payload(&self) -> Bytes {
        let offsets: &[u32] = if self.merged { &[0] } else { &self.segment_offsets };
        let mut buf = BytesMut::with_capacity(1 + offsets.len() * 8 + self.data.len());
        buf.put_u8(offsets.len().saturating_sub(1) as u8);
        for &offset in offsets {
            buf.put_u32_le(1);
            buf.put_u32_le(offset);
        }
        buf.put_slice(&self.data);
        buf.freeze()
    }
}

/// Reassembly state of one stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReassemblyState {
    Idle,
    Accumulating,
}

/// Result of feeding one chunk
#[derive(Debug, Default)]
pub struct ChunkOutcome {
    pub frames: Vec<AssembledFrame>,
    /// Set when a sub-packet header ran past the end of the chunk. Data
    /// after the broken header is discarded; pending fragments are kept.
    pub error: Option<CursorError>,
}

/// Per-stream fragment reassembly
#[derive(Debug)]
pub struct Reassembler {
    stream_id: u32,
    pending: Option<FragmentSet>,
    /// Timecode of the most recently added fragment
    last_timecode: i64,
    delivered: u64,
    relaid: u64,
}

impl Reassembler {
    pub fn new(stream_id: u32) -> Self {
        Self {
            stream_id,
            pending: None,
            last_timecode: 0,
            delivered: 0,
            relaid: 0,
        }
    }

    pub fn state(&self) -> ReassemblyState {
        if self.pending.is_some() {
            ReassemblyState::Accumulating
        } else {
            ReassemblyState::Idle
        }
    }

    pub fn pending(&self) -> Option<&FragmentSet> {
        self.pending.as_ref()
    }

    /// Frames delivered so far.
    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    /// Frames whose offsets had to be discarded.
    pub fn relaid(&self) -> u64 {
        self.relaid
    }

    /// Feed one chunk of the stream. A chunk may carry several sub-packets.
    pub fn push_chunk(&mut self, chunk: &Bytes, timecode: i64, keyframe: bool) -> ChunkOutcome {
        let mut outcome = ChunkOutcome::default();

        if self.pending.is_some() && timecode != self.last_timecode {
            outcome.frames.extend(self.flush());
        }

        // only the first frame that starts in a keyframe chunk is a keyframe
        let mut keyframe = keyframe;
        let mut bc = ByteCursor::new(chunk);
        while bc.remaining_length() > 2 {
            let header = match parse_fragment_header(&mut bc) {
                Ok(h) => h,
                Err(e) => {
                    outcome.error = Some(e);
                    break;
                }
            };
            let start = bc.position();
            let len = match header.total_length.checked_sub(header.offset) {
                Some(wanted) => bc.remaining_length().min(wanted as usize),
                None => bc.remaining_length(),
            };
            // cannot fail, `len` is bounded by the remaining length
            let _ = bc.skip(len);
            let data = chunk.slice(start..start + len);

            if let Some(frame) = self.push_fragment(&header, data, timecode, keyframe) {
                outcome.frames.push(frame);
                keyframe = false;
            }
        }

        outcome
    }

    /// Add one parsed fragment. Returns the frame when this fragment
    /// completes it.
    pub fn push_fragment(
        &mut self,
        header: &FragmentHeader,
        data: Bytes,
        chunk_timecode: i64,
        keyframe: bool,
    ) -> Option<AssembledFrame> {
        let this_timecode = header.timecode.unwrap_or(chunk_timecode);
        let len = data.len();

        trace!(
            "stream {}: fragment offset {} len {} of {} (descriptor 0x{:02x})",
            self.stream_id,
            header.offset,
            len,
            header.total_length,
            header.descriptor
        );

        let set = self
            .pending
            .get_or_insert_with(|| FragmentSet::new(header.total_length, keyframe, this_timecode));
        if header.merged {
            set.merged = true;
        }
        if header.timecode.is_some() {
            set.timecode = this_timecode;
        }
        set.fragments.push(Fragment {
            offset: header.offset,
            data,
        });
        self.last_timecode = this_timecode;

        // an end fragment alone does not close the frame: a middle fragment
        // may still be on its way
        if header.is_last_in_chain() || set.is_complete() {
            return self.flush();
        }
        None
    }

    /// Deliver whatever is pending, complete or not.
    pub fn flush(&mut self) -> Option<AssembledFrame> {
        let set = self.pending.take()?;
        if set.is_empty() {
            return None;
        }
        self.delivered += 1;
        Some(self.assemble(set))
    }

    fn assemble(&mut self, set: FragmentSet) -> AssembledFrame {
        let total = set.data_length();
        let mut data = BytesMut::with_capacity(total);
        let mut segment_offsets = Vec::with_capacity(set.len());

        let relaid = match set.consistent_layout() {
            Some(order) => {
                for i in order {
                    let f = &set.fragments[i];
                    segment_offsets.push(f.offset);
                    data.put_slice(&f.data);
                }
                false
            }
            None => {
                warn!(
                    "stream {}: packet assembly failed. Expected packet length was {} but found {} sub packets containing {} bytes. Trying to continue.",
                    self.stream_id,
                    set.declared_length,
                    set.len(),
                    total
                );
                self.relaid += 1;
                for f in &set.fragments {
                    segment_offsets.push(data.len() as u32);
                    data.put_slice(&f.data);
                }
                true
            }
        };

        AssembledFrame {
            data: data.freeze(),
            segment_offsets,
            merged: set.merged,
            keyframe: set.keyframe,
            timecode: set.timecode,
            relaid,
        }
    }
}
