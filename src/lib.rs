pub mod bits;
pub use bits::{BitCursor, ByteCursor, Endian};

pub mod streams;
pub use streams::{LocalSeekableStream, SeekableStream};

pub mod errors;
pub use errors::{CursorError, DemuxError, DemuxResult, HeaderError, SyncError};

pub mod config;
pub use config::{ReaderOptions, Verbosity};

pub mod track;
pub use track::{CodecFamily, ConnectionResult, MediaKind, StreamDescriptor};

pub mod packet;
pub use packet::{FrameType, Packet, PacketQueue, PacketSink, NO_TIMECODE};

pub mod aac;
pub mod ac3;
pub mod rv;

pub mod reassembly;
pub use reassembly::{AssembledFrame, Reassembler};

pub mod packetizer;
pub use packetizer::{Packetizer, PacketizerInput, StreamPacketizer};

pub mod rmff;
pub use rmff::{ReadStatus, RealDemuxer, RmffBuilder};

pub mod format;
pub use format::{detect_format, ContainerFormat, FileInfo, TrackInfo};

pub mod demux;
pub use demux::{identify_file, open_demuxer, open_file, Demuxer};
