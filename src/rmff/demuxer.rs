use super::objects::{
    parse_content_description, parse_file_header, parse_file_properties, parse_media_properties,
    read_data_header, read_object_header, read_packet_header, ContentDescription, FileHeader,
    FileProperties, MediaProperties, ObjectHeader, OBJECT_HEADER_SIZE, PACKET_HEADER_SIZE,
};
use super::type_specific::{parse_type_specific, AudioProps, TypeSpecific, VideoProps};
use super::{probe_source, CONT_ID, DATA_ID, MDPR_ID, PROP_ID};
use crate::aac::{parse_audio_specific_config, AacConfig, AacProfile};
use crate::config::ReaderOptions;
use crate::errors::{DemuxError, DemuxResult, HeaderError};
use crate::format::{ContainerFormat, FileInfo, TrackInfo};
use crate::packet::{FrameType, PacketSink};
use crate::packetizer::{
    AacPacketizer, Ac3Packetizer, PassthroughPacketizer, Packetizer, PacketizerInput,
    StreamPacketizer, VideoPacketizer,
};
use crate::reassembly::{AssembledFrame, Reassembler};
use crate::rv::parse_rv_dimensions;
use crate::streams::SeekableStream;
use crate::track::{
    AudioParams, CodecFamily, CodecParams, MediaKind, StreamDescriptor, VideoParams,
};
use bytes::Bytes;
use log::{debug, info, trace, warn};
use std::io::{self, SeekFrom};

/// Outcome of one `read()` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    /// A chunk was consumed; call again
    MoreData,
    /// No more chunks. Buffered state has been drained.
    Done,
}

/// A generic audio chunk waiting for its successor to learn its duration
#[derive(Debug)]
struct HeldChunk {
    data: Bytes,
    timecode: i64,
    keyframe: bool,
    /// Timecode of the chunk held before this one
    reference: Option<i64>,
}

impl HeldChunk {
    fn into_input(self, duration: i64) -> PacketizerInput {
        let frame_type = match (self.keyframe, self.reference) {
            (false, Some(reference)) => FrameType::DependsOn(reference),
            _ => FrameType::Key,
        };
        PacketizerInput::new(self.data)
            .with_timecode(self.timecode)
            .with_duration(duration)
            .with_frame_type(frame_type)
    }
}

#[derive(Debug)]
enum TrackState {
    Video {
        reassembler: Reassembler,
        /// Frame data is inspected for the real picture size
        check_dimensions: bool,
        last_parsed: Option<(u32, u32)>,
    },
    Ac3 {
        bsid: Option<u8>,
    },
    Aac,
    Generic {
        held: Option<HeldChunk>,
        first_timecode: Option<i64>,
        chunks_seen: u64,
    },
}

#[derive(Debug)]
struct Track {
    id: u32,
    fourcc: String,
    packetizer: StreamPacketizer,
    state: TrackState,
    /// Lost sync; its chunks are skipped
    disabled: bool,
}

impl Track {
    fn process_chunk(
        &mut self,
        chunk: Bytes,
        timecode: i64,
        keyframe: bool,
        options: &ReaderOptions,
        sink: &mut dyn PacketSink,
    ) -> DemuxResult<()> {
        match &mut self.state {
            TrackState::Video { reassembler, .. } => {
                let outcome = reassembler.push_chunk(&chunk, timecode, keyframe);
                if let Some(e) = outcome.error {
                    warn!(
                        "stream {}: broken video sub-packet ({}), dropping the rest of the chunk",
                        self.id, e
                    );
                }
                for frame in outcome.frames {
                    self.deliver_video_frame(frame, options, sink)?;
                }
                Ok(())
            }
            TrackState::Ac3 { .. } => self
                .packetizer
                .process(PacketizerInput::new(chunk).with_timecode(timecode), sink),
            TrackState::Aac => self.deliver_aac_frames(chunk, timecode, sink),
            TrackState::Generic {
                held,
                first_timecode,
                chunks_seen,
            } => {
                let mut reference = None;
                if let Some(previous) = held.take() {
                    reference = Some(previous.timecode);
                    let duration = timecode - previous.timecode;
                    self.packetizer
                        .process(previous.into_input(duration), sink)?;
                }
                *held = Some(HeldChunk {
                    data: chunk,
                    timecode,
                    keyframe,
                    reference,
                });
                first_timecode.get_or_insert(timecode);
                *chunks_seen += 1;
                Ok(())
            }
        }
    }

    fn deliver_video_frame(
        &mut self,
        frame: AssembledFrame,
        options: &ReaderOptions,
        sink: &mut dyn PacketSink,
    ) -> DemuxResult<()> {
        if let TrackState::Video {
            check_dimensions: true,
            last_parsed,
            ..
        } = &mut self.state
        {
            if last_parsed.is_none() || frame.keyframe {
                if let Some(dims) = parse_rv_dimensions(&frame.data) {
                    if *last_parsed != Some(dims) {
                        *last_parsed = Some(dims);
                        let descriptor = self.packetizer.descriptor_mut();
                        if correct_dimensions(descriptor, dims, options) {
                            sink.headers_changed(descriptor);
                        }
                    }
                }
            }
        }

        let frame_type = if frame.keyframe {
            FrameType::Key
        } else {
            FrameType::Predicted
        };
        let input = PacketizerInput::new(frame.to_payload())
            .with_timecode(frame.timecode)
            .with_frame_type(frame_type);
        self.packetizer.process(input, sink)
    }

    /// A chunk holds a sub-packet count in the high nibble of byte 1, a
    /// table of 16-bit lengths and then the raw frames.
    fn deliver_aac_frames(
        &mut self,
        chunk: Bytes,
        timecode: i64,
        sink: &mut dyn PacketSink,
    ) -> DemuxResult<()> {
        if chunk.len() < 2 {
            warn!(
                "Short AAC audio packet for track ID {} (length: {} < 2)",
                self.id,
                chunk.len()
            );
            return Ok(());
        }
        let count = usize::from(chunk[1] >> 4);
        let table_end = 2 + count * 2;
        if chunk.len() < table_end {
            warn!(
                "Short AAC audio packet for track ID {} (length: {} < {})",
                self.id,
                chunk.len(),
                table_end
            );
            return Ok(());
        }
        let lengths: Vec<usize> = chunk[2..table_end]
            .chunks_exact(2)
            .map(|l| usize::from(u16::from_be_bytes([l[0], l[1]])))
            .collect();
        let expected = table_end + lengths.iter().sum::<usize>();
        if expected != chunk.len() {
            warn!(
                "Inconsistent AAC audio packet for track ID {} (length: {} != {})",
                self.id,
                chunk.len(),
                expected
            );
            return Ok(());
        }

        let mut pos = table_end;
        for (i, len) in lengths.into_iter().enumerate() {
            let mut input = PacketizerInput::new(chunk.slice(pos..pos + len));
            if i == 0 {
                input = input.with_timecode(timecode);
            }
            self.packetizer.process(input, sink)?;
            pos += len;
        }
        Ok(())
    }

    /// Deliver buffered state and flush the packetizer.
    fn drain(&mut self, options: &ReaderOptions, sink: &mut dyn PacketSink) -> DemuxResult<()> {
        match &mut self.state {
            TrackState::Video { reassembler, .. } => {
                if let Some(frame) = reassembler.flush() {
                    self.deliver_video_frame(frame, options, sink)?;
                }
            }
            TrackState::Generic {
                held,
                first_timecode,
                chunks_seen,
            } => {
                if let Some(last) = held.take() {
                    let span = last.timecode - first_timecode.unwrap_or(last.timecode);
                    let duration = span / (*chunks_seen).max(1) as i64;
                    self.packetizer.process(last.into_input(duration), sink)?;
                }
            }
            TrackState::Ac3 { .. } | TrackState::Aac => {}
        }
        self.packetizer.flush(sink);
        Ok(())
    }
}

/// Update the pixel size of a video descriptor to `dims` and recompute its
/// display size. Returns whether anything changed.
fn correct_dimensions(
    descriptor: &mut StreamDescriptor,
    dims: (u32, u32),
    options: &ReaderOptions,
) -> bool {
    let id = descriptor.id;
    let video = match descriptor.video_mut() {
        Some(v) => v,
        None => return false,
    };
    if (video.pixel_width, video.pixel_height) == dims {
        return false;
    }
    let (width, height) = dims;
    let (display_width, display_height) = if let Some(display) = options.display_dimensions {
        display
    } else if let Some(ar) = options.aspect_ratio.filter(|ar| *ar > 0.0 && height > 0) {
        if ar > f64::from(width) / f64::from(height) {
            ((f64::from(height) * ar) as u32, height)
        } else {
            (width, (f64::from(width) / ar) as u32)
        }
    } else {
        (video.pixel_width, video.pixel_height)
    };

    info!(
        "stream {}: container says {}x{} but the bitstream says {}x{}, display {}x{}",
        id, video.pixel_width, video.pixel_height, width, height, display_width, display_height
    );
    video.pixel_width = width;
    video.pixel_height = height;
    video.display_width = display_width;
    video.display_height = display_height;
    true
}

fn ac3_codec_id(bsid: Option<u8>) -> &'static str {
    match bsid {
        Some(9) => "A_AC3/BSID9",
        Some(10) => "A_AC3/BSID10",
        _ => "A_AC3",
    }
}

fn is_aac(fourcc: &str) -> bool {
    fourcc.eq_ignore_ascii_case("raac") || fourcc.eq_ignore_ascii_case("racp")
}

/// Work out the AAC parameters of a stream. The flag tells whether the
/// codec data carried a config record.
fn aac_config(id: u32, fourcc: &str, audio: &AudioProps, options: &ReaderOptions) -> (AacConfig, bool) {
    let mut parsed = None;
    let mut extra_parsed = false;
    let extra = &audio.extra_data;
    if extra.len() > 4 {
        let len = u32::from_be_bytes([extra[0], extra[1], extra[2], extra[3]]) as usize;
        debug!("stream {}: AAC extra data length {}", id, len);
        if len > 0 && extra.len() >= 4 + len {
            extra_parsed = true;
            parsed = parse_audio_specific_config(&extra[5..4 + len]);
        }
    }

    let mut config = match parsed {
        Some(config) => config,
        None => {
            let sbr = fourcc.eq_ignore_ascii_case("racp") || audio.sample_rate < 44100;
            AacConfig {
                profile: if sbr { AacProfile::Sbr } else { AacProfile::Lc },
                sample_rate: audio.sample_rate,
                output_sample_rate: if sbr {
                    audio.sample_rate * 2
                } else {
                    audio.sample_rate
                },
                channels: audio.channels,
                sbr,
            }
        }
    };

    if options.is_forced_sbr(id) && !config.sbr {
        config.profile = AacProfile::Sbr;
        config.sbr = true;
        config.output_sample_rate = config.sample_rate * 2;
    }
    (config, extra_parsed)
}

/// Demultiplexer for RealMedia files
pub struct RealDemuxer<S: SeekableStream> {
    source: S,
    options: ReaderOptions,
    file_size: u64,
    file_header: FileHeader,
    properties: Option<FileProperties>,
    content: Option<ContentDescription>,
    tracks: Vec<Track>,
    packets_in_section: u32,
    packets_read: u32,
    headers_set: bool,
    done: bool,
}

fn truncated(err: io::Error) -> DemuxError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        HeaderError::new("truncated header").into()
    } else {
        err.into()
    }
}

impl<S: SeekableStream> RealDemuxer<S> {
    /// Parse the headers of `source` and set up a packetizer for every
    /// selected stream.
    pub fn open(mut source: S, options: ReaderOptions) -> DemuxResult<Self> {
        source.seek(SeekFrom::Start(0))?;
        if !probe_source(&mut source)? {
            return Err(HeaderError::new("source is not a valid RealMedia file").into());
        }
        let file_size = source.source_len()?;
        info!("Using RealMedia demultiplexer");

        let mut demuxer = Self {
            source,
            options,
            file_size,
            file_header: FileHeader {
                file_version: 0,
                num_headers: 0,
            },
            properties: None,
            content: None,
            tracks: Vec::new(),
            packets_in_section: 0,
            packets_read: 0,
            headers_set: false,
            done: false,
        };
        demuxer.parse_headers()?;
        demuxer.scan_ac3_bsids()?;
        Ok(demuxer)
    }

    fn remaining(&mut self) -> DemuxResult<u64> {
        Ok(self.file_size.saturating_sub(self.source.tell()?))
    }

    /// Read the payload of a header object, refusing sizes the file cannot
    /// hold.
    fn read_object_payload(&mut self, header: &ObjectHeader) -> DemuxResult<Vec<u8>> {
        let size = self.checked_payload_size(header)?;
        let mut payload = vec![0u8; size as usize];
        self.source.read_exact(&mut payload).map_err(truncated)?;
        Ok(payload)
    }

    fn checked_payload_size(&mut self, header: &ObjectHeader) -> DemuxResult<u32> {
        let size = header.payload_size().ok_or_else(|| {
            HeaderError::new(format!(
                "object '{}' has an impossible size of {} bytes",
                header.name(),
                header.size
            ))
        })?;
        let remaining = self.remaining()?;
        if u64::from(size) > remaining {
            return Err(HeaderError::new(format!(
                "object '{}' claims {} bytes but only {} are left",
                header.name(),
                size,
                remaining
            ))
            .into());
        }
        Ok(size)
    }

    fn parse_headers(&mut self) -> DemuxResult<()> {
        let rmf = read_object_header(&mut self.source).map_err(truncated)?;
        let payload = self.read_object_payload(&rmf)?;
        self.file_header = parse_file_header(&payload).map_err(HeaderError::from)?;
        trace!(
            "file version {}, {} headers",
            self.file_header.file_version,
            self.file_header.num_headers
        );

        loop {
            if self.remaining()? < u64::from(OBJECT_HEADER_SIZE) {
                return Err(HeaderError::new("no DATA object found").into());
            }
            let header = read_object_header(&mut self.source).map_err(truncated)?;

            match &header.id {
                id if id == DATA_ID => {
                    let data = read_data_header(&mut self.source).map_err(truncated)?;
                    self.packets_in_section = data.num_packets;
                    self.packets_read = 0;
                    debug!("DATA section with {} packets", data.num_packets);
                    return Ok(());
                }
                id if id == PROP_ID => {
                    let payload = self.read_object_payload(&header)?;
                    let props = parse_file_properties(&payload).map_err(HeaderError::from)?;
                    debug!(
                        "{} packets, {} ms, {} streams",
                        props.num_packets, props.duration, props.num_streams
                    );
                    self.properties = Some(props);
                }
                id if id == CONT_ID => {
                    let payload = self.read_object_payload(&header)?;
                    let content = parse_content_description(&payload).map_err(HeaderError::from)?;
                    if self.options.verbosity.at(2) {
                        info!("title: '{}'", content.title);
                        info!("author: '{}'", content.author);
                        info!("copyright: '{}'", content.copyright);
                        info!("comment: '{}'", content.comment);
                    }
                    self.content = Some(content);
                }
                id if id == MDPR_ID => {
                    let payload = self.read_object_payload(&header)?;
                    let mdpr = parse_media_properties(&payload).map_err(HeaderError::from)?;
                    self.add_stream(mdpr);
                }
                _ => {
                    let size = self.checked_payload_size(&header)?;
                    warn!(
                        "Unknown header type ({}), skipping {} bytes",
                        header.name(),
                        size
                    );
                    self.source.skip(u64::from(size))?;
                }
            }
        }
    }

    fn add_stream(&mut self, mdpr: MediaProperties) {
        let id = u32::from(mdpr.stream_id);
        if self.options.verbosity.at(2) {
            info!("stream_name: '{}'", mdpr.stream_name);
            info!("mime_type: '{}'", mdpr.mime_type);
        }
        if self.tracks.iter().any(|t| t.id == id) {
            warn!("stream {} is described twice, ignoring the second description", id);
            return;
        }

        match parse_type_specific(&mdpr.type_specific) {
            TypeSpecific::Video(video) if self.options.video_requested(id) => {
                let track = self.video_track(&mdpr, &video);
                self.tracks.push(track);
            }
            TypeSpecific::Audio(audio) if self.options.audio_requested(id) => {
                let track = self.audio_track(&mdpr, &audio);
                self.tracks.push(track);
            }
            TypeSpecific::Other => {
                debug!(
                    "stream {}: not an audio or video stream ({}), skipping",
                    id, mdpr.mime_type
                );
            }
            _ => debug!("stream {}: not selected", id),
        }
    }

    fn video_track(&self, mdpr: &MediaProperties, video: &VideoProps) -> Track {
        let id = u32::from(mdpr.stream_id);
        let fourcc = String::from_utf8_lossy(&video.fourcc).into_owned();
        let width = u32::from(video.width);
        let height = u32::from(video.height);
        let descriptor = StreamDescriptor {
            id,
            kind: MediaKind::Video,
            codec_id: format!("V_REAL/{}", fourcc),
            fourcc: fourcc.clone(),
            family: CodecFamily::RealVideo,
            params: CodecParams::Video(VideoParams {
                pixel_width: width,
                pixel_height: height,
                display_width: width,
                display_height: height,
                frame_rate: video.frame_rate,
            }),
            codec_private: mdpr.type_specific.clone(),
            start_time: mdpr.start_time,
            preroll: mdpr.preroll,
            duplicate_data: false,
            default_duration: None,
        };
        info!(
            "+-> Using video output module for stream {} (FourCC: {})",
            id, fourcc
        );
        Track {
            id,
            packetizer: StreamPacketizer::Video(VideoPacketizer::new(descriptor)),
            state: TrackState::Video {
                reassembler: Reassembler::new(id),
                check_dimensions: &video.fourcc == b"RV40",
                last_parsed: None,
            },
            fourcc,
            disabled: false,
        }
    }

    fn audio_track(&self, mdpr: &MediaProperties, audio: &AudioProps) -> Track {
        let id = u32::from(mdpr.stream_id);
        let fourcc_bytes = match audio.fourcc {
            Some(fourcc) => fourcc,
            None => {
                warn!(
                    "Couldn't find RealAudio FourCC for id {}, forwarding the track as '{}'",
                    id,
                    String::from_utf8_lossy(&audio.format_tag)
                );
                audio.format_tag
            }
        };
        let fourcc = String::from_utf8_lossy(&fourcc_bytes).into_owned();
        let known = audio.fourcc.is_some();

        let mut descriptor = StreamDescriptor {
            id,
            kind: MediaKind::Audio,
            codec_id: format!("A_REAL/{}", fourcc.to_uppercase()),
            fourcc: fourcc.clone(),
            family: CodecFamily::Passthrough,
            params: CodecParams::Audio(AudioParams {
                sample_rate: audio.sample_rate,
                output_sample_rate: None,
                channels: audio.channels,
                bits_per_sample: audio.sample_size,
                extra_data: audio.extra_data.clone(),
            }),
            codec_private: mdpr.type_specific.clone(),
            start_time: mdpr.start_time,
            preroll: mdpr.preroll,
            duplicate_data: false,
            default_duration: None,
        };

        let (packetizer, state) = if known && fourcc.eq_ignore_ascii_case("dnet") {
            descriptor.family = CodecFamily::Ac3;
            descriptor.codec_id = ac3_codec_id(None).to_string();
            descriptor.codec_private = Vec::new();
            if self.options.verbosity.at(1) {
                info!("+-> Using the AC3 output module for stream {} (FourCC: {})", id, fourcc);
            }
            (
                StreamPacketizer::Ac3(Ac3Packetizer::new(descriptor, true, &self.options)),
                TrackState::Ac3 { bsid: None },
            )
        } else if known && is_aac(&fourcc) {
            let (config, extra_parsed) = aac_config(id, &fourcc, audio, &self.options);
            if !config.sbr && !extra_parsed {
                warn!(
                    "RealMedia files may contain HE-AAC / AAC+ / SBR AAC audio. In some cases \
                     this can NOT be detected automatically. Set 'aac_is_sbr' for track {} if \
                     it actually contains SBR AAC.",
                    id
                );
            }
            descriptor.family = CodecFamily::Aac;
            descriptor.codec_private = Vec::new();
            descriptor.duplicate_data = true;
            if self.options.verbosity.at(1) {
                info!("+-> Using the AAC output module for stream {} (FourCC: {})", id, fourcc);
            }
            (
                StreamPacketizer::Aac(AacPacketizer::new(descriptor, config)),
                TrackState::Aac,
            )
        } else {
            info!(
                "+-> Using generic audio output module for stream {} (FourCC: {})",
                id, fourcc
            );
            (
                StreamPacketizer::Passthrough(PassthroughPacketizer::new(descriptor)),
                TrackState::Generic {
                    held: None,
                    first_timecode: None,
                    chunks_seen: 0,
                },
            )
        };

        Track {
            id,
            fourcc,
            packetizer,
            state,
            disabled: false,
        }
    }

    /// Read ahead through the first data section until the bitstream id of
    /// every byte swapped AC3 stream is known, then return to where data
    /// starts.
    fn scan_ac3_bsids(&mut self) -> DemuxResult<()> {
        let mut pending: Vec<u32> = self
            .tracks
            .iter()
            .filter(|t| matches!(t.state, TrackState::Ac3 { bsid: None }))
            .map(|t| t.id)
            .collect();
        if pending.is_empty() {
            return Ok(());
        }

        let start = self.source.tell()?;
        let mut left = self.packets_in_section;
        while !pending.is_empty() && left > 0 {
            let header = match read_packet_header(&mut self.source) {
                Ok(h) => h,
                Err(_) => break,
            };
            left -= 1;
            let len = match header.payload_length() {
                Some(len) => len,
                None => break,
            };
            let id = u32::from(header.stream_id);
            if !pending.contains(&id) {
                self.source.skip(len as u64)?;
                continue;
            }
            let mut payload = vec![0u8; len];
            if self.source.read_exact(&mut payload).is_err() {
                break;
            }
            if payload.len() > 4 {
                let bsid = payload[4] >> 3;
                if let Some(track) = self.tracks.iter_mut().find(|t| t.id == id) {
                    track.state = TrackState::Ac3 { bsid: Some(bsid) };
                    track.packetizer.descriptor_mut().codec_id = ac3_codec_id(Some(bsid)).to_string();
                    debug!("stream {}: AC3 bsid {}", id, bsid);
                }
                pending.retain(|&p| p != id);
            }
        }

        self.source.seek(SeekFrom::Start(start))?;
        Ok(())
    }

    /// Hand the final stream descriptors to `sink`: tracks named in
    /// `track_order` first, the rest in file order.
    pub fn set_headers(&mut self, sink: &mut dyn PacketSink) {
        let mut order: Vec<usize> = Vec::with_capacity(self.tracks.len());
        for id in &self.options.track_order {
            if let Some(i) = self.tracks.iter().position(|t| t.id == *id) {
                if !order.contains(&i) {
                    order.push(i);
                }
            }
        }
        for i in 0..self.tracks.len() {
            if !order.contains(&i) {
                order.push(i);
            }
        }

        let descriptors: Vec<StreamDescriptor> = order
            .iter()
            .map(|&i| self.tracks[i].packetizer.set_headers().clone())
            .collect();
        sink.set_headers(&descriptors);
        self.headers_set = true;
    }

    /// Read and route exactly one chunk.
    pub fn read(&mut self, sink: &mut dyn PacketSink) -> DemuxResult<ReadStatus> {
        if self.done {
            return Ok(ReadStatus::Done);
        }
        if !self.headers_set {
            self.set_headers(sink);
        }
        match self.read_chunk(sink) {
            Err(DemuxError::Io(e)) => {
                debug!("end of data: {}", e);
                self.finish(sink)
            }
            other => other,
        }
    }

    fn read_chunk(&mut self, sink: &mut dyn PacketSink) -> DemuxResult<ReadStatus> {
        if self.remaining()? < u64::from(PACKET_HEADER_SIZE) {
            return self.finish(sink);
        }

        if self.packets_read >= self.packets_in_section {
            let header = read_object_header(&mut self.source)?;
            if &header.id != DATA_ID {
                debug!("'{}' object reached, end of data", header.name());
                return self.finish(sink);
            }
            let data = read_data_header(&mut self.source)?;
            debug!("new DATA section with {} packets", data.num_packets);
            self.packets_in_section = data.num_packets;
            self.packets_read = 0;
            return Ok(ReadStatus::MoreData);
        }

        let pos = self.source.tell()?;
        let header = read_packet_header(&mut self.source)?;
        let len = match header.payload_length() {
            Some(len) => len,
            None => {
                warn!(
                    "Data packet length is too small: {}. Other values: version: 0x{:04x}, id: 0x{:04x}, timecode: {} ms, flags: 0x{:02x}. File position: {}. Aborting this file.",
                    header.length, header.version, header.stream_id, header.timestamp_ms, header.flags, pos
                );
                return self.finish(sink);
            }
        };
        self.packets_read += 1;

        let id = u32::from(header.stream_id);
        let index = match self.tracks.iter().position(|t| t.id == id && !t.disabled) {
            Some(i) => i,
            None => {
                self.source.skip(len as u64)?;
                return Ok(ReadStatus::MoreData);
            }
        };

        let mut payload = vec![0u8; len];
        if self.source.read_exact(&mut payload).is_err() {
            debug!("stream {}: truncated packet at {}, end of data", id, pos);
            return self.finish(sink);
        }
        if self.options.verbosity.at(4) {
            debug!("stream {}: timecode = {} ms", id, header.timestamp_ms);
        }

        let track = &mut self.tracks[index];
        let result = track.process_chunk(
            Bytes::from(payload),
            header.timecode_ns(),
            header.is_keyframe(),
            &self.options,
            sink,
        );
        match result {
            Err(DemuxError::Sync(e)) => {
                warn!("{}; disabling the stream", e);
                track.disabled = true;
                Ok(ReadStatus::MoreData)
            }
            Err(e) => Err(e),
            Ok(()) => Ok(ReadStatus::MoreData),
        }
    }

    /// Drain every stream and flush the sink. Safe to call more than once.
    pub fn finish(&mut self, sink: &mut dyn PacketSink) -> DemuxResult<ReadStatus> {
        if self.done {
            return Ok(ReadStatus::Done);
        }
        self.done = true;
        if !self.headers_set {
            self.set_headers(sink);
        }

        let options = &self.options;
        for track in self.tracks.iter_mut().filter(|t| !t.disabled) {
            if let Err(e) = track.drain(options, sink) {
                warn!("stream {}: {} while draining", track.id, e);
            }
        }
        sink.flush();
        Ok(ReadStatus::Done)
    }

    /// Log and return a description of the file and its tracks.
    pub fn identify(&self) -> FileInfo {
        info!("container: RealMedia");
        let tracks: Vec<TrackInfo> = self.tracks.iter().map(track_info).collect();
        for t in &tracks {
            info!("Track ID {}: {}", t.id, t.summary());
        }

        let text = |s: &str| (!s.is_empty()).then(|| s.to_string());
        FileInfo {
            format: ContainerFormat::RealMedia,
            size: self.file_size,
            duration: self
                .properties
                .as_ref()
                .map(|p| f64::from(p.duration) / 1000.0),
            title: self.content.as_ref().and_then(|c| text(&c.title)),
            author: self.content.as_ref().and_then(|c| text(&c.author)),
            copyright: self.content.as_ref().and_then(|c| text(&c.copyright)),
            comment: self.content.as_ref().and_then(|c| text(&c.comment)),
            tracks,
        }
    }

    /// Percentage of the current data section read so far.
    pub fn progress(&self) -> u32 {
        if self.done || self.packets_in_section == 0 {
            return 100;
        }
        (u64::from(self.packets_read) * 100 / u64::from(self.packets_in_section)) as u32
    }

    pub fn format_name(&self) -> &'static str {
        "RealMedia"
    }

    pub fn streams(&self) -> Vec<&StreamDescriptor> {
        self.tracks.iter().map(|t| t.packetizer.descriptor()).collect()
    }

    pub fn packetizer(&self, id: u32) -> Option<&StreamPacketizer> {
        self.tracks.iter().find(|t| t.id == id).map(|t| &t.packetizer)
    }

    /// Whether a stream was disabled after losing sync.
    pub fn is_disabled(&self, id: u32) -> bool {
        self.tracks.iter().any(|t| t.id == id && t.disabled)
    }

    pub fn file_header(&self) -> &FileHeader {
        &self.file_header
    }

    pub fn properties(&self) -> Option<&FileProperties> {
        self.properties.as_ref()
    }

    pub fn content(&self) -> Option<&ContentDescription> {
        self.content.as_ref()
    }

    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    pub fn into_inner(self) -> S {
        self.source
    }
}

fn track_info(track: &Track) -> TrackInfo {
    let d = track.packetizer.descriptor();
    let codec = if is_aac(&track.fourcc) {
        "AAC".to_string()
    } else {
        track.fourcc.clone()
    };
    TrackInfo {
        id: track.id,
        kind: d.kind.name().to_string(),
        codec,
        codec_id: d.codec_id.clone(),
        width: d.video().map(|v| v.pixel_width),
        height: d.video().map(|v| v.pixel_height),
        frame_rate: d.video().map(|v| v.frame_rate),
        sample_rate: d.audio().map(|a| a.sample_rate),
        channels: d.audio().map(|a| a.channels),
    }
}
