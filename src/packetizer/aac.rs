use super::{take_payload, Packetizer, PacketizerInput};
use crate::aac::{build_audio_specific_config, AacConfig, AAC_SAMPLES_PER_FRAME};
use crate::errors::DemuxResult;
use crate::packet::{Packet, PacketSink, NO_TIMECODE};
use crate::track::StreamDescriptor;

/// Raw AAC frames, one per input. Timecodes come from counting samples.
#[derive(Debug)]
pub struct AacPacketizer {
    descriptor: StreamDescriptor,
    config: AacConfig,
    base_timecode: Option<i64>,
    frames: u64,
}

impl AacPacketizer {
    pub fn new(mut descriptor: StreamDescriptor, config: AacConfig) -> Self {
        descriptor.codec_id = config.profile.codec_id().to_string();
        if let Some(audio) = descriptor.audio_mut() {
            audio.sample_rate = config.sample_rate;
            audio.channels = config.channels;
            audio.output_sample_rate = if config.sbr {
                Some(config.output_sample_rate)
            } else {
                None
            };
        }
        descriptor.default_duration = Some(frame_duration(config.sample_rate));
        Self {
            descriptor,
            config,
            base_timecode: None,
            frames: 0,
        }
    }

    pub fn config(&self) -> &AacConfig {
        &self.config
    }
}

fn frame_duration(sample_rate: u32) -> i64 {
    if sample_rate == 0 {
        return NO_TIMECODE;
    }
    i64::from(AAC_SAMPLES_PER_FRAME) * 1_000_000_000 / i64::from(sample_rate)
}

impl Packetizer for AacPacketizer {
    fn process(&mut self, input: PacketizerInput, sink: &mut dyn PacketSink) -> DemuxResult<()> {
        let base = *self
            .base_timecode
            .get_or_insert(if input.timecode >= 0 { input.timecode } else { 0 });
        let timecode = if self.config.sample_rate == 0 {
            base
        } else {
            base + (self.frames * u64::from(AAC_SAMPLES_PER_FRAME) * 1_000_000_000
                / u64::from(self.config.sample_rate)) as i64
        };

        sink.emit(Packet {
            stream_id: self.descriptor.id,
            data: take_payload(&self.descriptor, input.data),
            timecode,
            duration: frame_duration(self.config.sample_rate),
            backward_ref: NO_TIMECODE,
            forward_ref: NO_TIMECODE,
        });
        self.frames += 1;
        Ok(())
    }

    fn flush(&mut self, _sink: &mut dyn PacketSink) {}

    fn set_headers(&mut self) -> &StreamDescriptor {
        self.descriptor.codec_private = build_audio_specific_config(&self.config);
        &self.descriptor
    }

    fn descriptor(&self) -> &StreamDescriptor {
        &self.descriptor
    }

    fn descriptor_mut(&mut self) -> &mut StreamDescriptor {
        &mut self.descriptor
    }

    fn format_name(&self) -> &'static str {
        "AAC"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aac::AacProfile;
    use crate::packet::PacketQueue;
    use crate::packetizer::tests::audio_descriptor;
    use crate::track::CodecFamily;
    use bytes::Bytes;

    fn sbr_config() -> AacConfig {
        AacConfig {
            profile: AacProfile::Sbr,
            sample_rate: 24000,
            output_sample_rate: 48000,
            channels: 2,
            sbr: true,
        }
    }

    #[test]
    fn test_descriptor_follows_config() {
        let mut p = AacPacketizer::new(audio_descriptor(1, CodecFamily::Aac, "racp"), sbr_config());
        let desc = p.set_headers();
        assert_eq!(desc.codec_id, "A_AAC/MPEG4/LC/SBR");
        assert_eq!(desc.audio().unwrap().sample_rate, 24000);
        assert_eq!(desc.audio().unwrap().output_sample_rate, Some(48000));
        assert!(!desc.codec_private.is_empty());
    }

    #[test]
    fn test_timecodes_count_samples_from_first_input() {
        let mut p = AacPacketizer::new(audio_descriptor(1, CodecFamily::Aac, "raac"), sbr_config());
        let mut sink = PacketQueue::new();
        for tc in [1_000_000, -1, -1] {
            let input = PacketizerInput::new(Bytes::from_static(b"aac")).with_timecode(tc);
            p.process(input, &mut sink).unwrap();
        }
        let tcs: Vec<i64> = sink.packets().map(|p| p.timecode).collect();
        // 1024 samples at 24 kHz
        assert_eq!(tcs, vec![1_000_000, 43_666_666, 86_333_333]);
        assert!(sink.packets().all(|p| p.backward_ref == -1));
    }
}
