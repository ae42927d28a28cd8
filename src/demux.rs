//! Format independent entry points: detect the container of a source and
//! open the matching demultiplexer.

use crate::config::ReaderOptions;
use crate::errors::{DemuxResult, HeaderError};
use crate::format::{detect_format, ContainerFormat, FileInfo};
use crate::packet::PacketSink;
use crate::rmff::{ReadStatus, RealDemuxer};
use crate::streams::{LocalSeekableStream, SeekableStream};
use crate::track::StreamDescriptor;
use log::debug;
use std::path::Path;

/// An open demultiplexer for one of the supported containers
pub enum Demuxer<S: SeekableStream> {
    RealMedia(RealDemuxer<S>),
}

impl<S: SeekableStream> Demuxer<S> {
    pub fn set_headers(&mut self, sink: &mut dyn PacketSink) {
        match self {
            Demuxer::RealMedia(d) => d.set_headers(sink),
        }
    }

    pub fn read(&mut self, sink: &mut dyn PacketSink) -> DemuxResult<ReadStatus> {
        match self {
            Demuxer::RealMedia(d) => d.read(sink),
        }
    }

    pub fn finish(&mut self, sink: &mut dyn PacketSink) -> DemuxResult<ReadStatus> {
        match self {
            Demuxer::RealMedia(d) => d.finish(sink),
        }
    }

    pub fn identify(&self) -> FileInfo {
        match self {
            Demuxer::RealMedia(d) => d.identify(),
        }
    }

    pub fn progress(&self) -> u32 {
        match self {
            Demuxer::RealMedia(d) => d.progress(),
        }
    }

    pub fn format_name(&self) -> &'static str {
        match self {
            Demuxer::RealMedia(d) => d.format_name(),
        }
    }

    pub fn streams(&self) -> Vec<&StreamDescriptor> {
        match self {
            Demuxer::RealMedia(d) => d.streams(),
        }
    }

    /// Read until the input is exhausted. Returns the number of `read()`
    /// calls that consumed data.
    pub fn run(&mut self, sink: &mut dyn PacketSink) -> DemuxResult<u64> {
        let mut reads = 0;
        while self.read(sink)? == ReadStatus::MoreData {
            reads += 1;
        }
        Ok(reads)
    }
}

/// Detect the container of `source` and open a demultiplexer for it.
pub fn open_demuxer<S: SeekableStream>(
    mut source: S,
    options: ReaderOptions,
) -> DemuxResult<Demuxer<S>> {
    let format = detect_format(&mut source)?;
    debug!("detected container: {}", format.name());
    match format {
        ContainerFormat::RealMedia => Ok(Demuxer::RealMedia(RealDemuxer::open(source, options)?)),
        ContainerFormat::Unknown(name) => {
            Err(HeaderError::new(format!("unsupported container format: {}", name)).into())
        }
    }
}

/// Open a local file.
pub fn open_file<P: AsRef<Path>>(
    path: P,
    options: ReaderOptions,
) -> DemuxResult<Demuxer<LocalSeekableStream>> {
    let stream = LocalSeekableStream::open(path)?;
    open_demuxer(stream, options)
}

/// Identify a local file without demuxing it.
pub fn identify_file<P: AsRef<Path>>(path: P) -> DemuxResult<FileInfo> {
    Ok(open_file(path, ReaderOptions::default())?.identify())
}
