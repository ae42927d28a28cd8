//! A module for parsing and building MPEG-4 AudioSpecificConfig data.

use crate::bits::BitCursor;

pub const AAC_SAMPLES_PER_FRAME: u32 = 1024;

const SAMPLING_FREQUENCIES: [u32; 13] = [
    96000, 88200, 64000, 48000, 44100, 32000, 24000, 22050, 16000, 12000, 11025, 8000, 7350,
];

/// Audio object type 5: spectral band replication
const OBJECT_TYPE_SBR: u32 = 5;
/// Audio object type 29: parametric stereo (implies SBR)
const OBJECT_TYPE_PS: u32 = 29;
const SYNC_EXTENSION_TYPE: u32 = 0x2b7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AacProfile {
    Main,
    Lc,
    Ssr,
    Ltp,
    /// LC core with spectral band replication
    Sbr,
}

impl AacProfile {
    fn from_object_type(object_type: u32) -> Option<Self> {
        match object_type {
            1 => Some(AacProfile::Main),
            2 => Some(AacProfile::Lc),
            3 => Some(AacProfile::Ssr),
            4 => Some(AacProfile::Ltp),
            _ => None,
        }
    }

    /// Object type of the core coder.
    pub fn object_type(&self) -> u32 {
        match self {
            AacProfile::Main => 1,
            AacProfile::Lc | AacProfile::Sbr => 2,
            AacProfile::Ssr => 3,
            AacProfile::Ltp => 4,
        }
    }

    pub fn codec_id(&self) -> &'static str {
        match self {
            AacProfile::Main => "A_AAC/MPEG4/MAIN",
            AacProfile::Lc => "A_AAC/MPEG4/LC",
            AacProfile::Ssr => "A_AAC/MPEG4/SSR",
            AacProfile::Ltp => "A_AAC/MPEG4/LTP",
            AacProfile::Sbr => "A_AAC/MPEG4/LC/SBR",
        }
    }
}

/// Parsed AudioSpecificConfig
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AacConfig {
    pub profile: AacProfile,
    pub sample_rate: u32,
    /// Rate after SBR upsampling; equals `sample_rate` without SBR
    pub output_sample_rate: u32,
    pub channels: u16,
    pub sbr: bool,
}

pub fn sampling_frequency(index: u32) -> Option<u32> {
    SAMPLING_FREQUENCIES.get(index as usize).copied()
}

pub fn sampling_frequency_index(rate: u32) -> Option<u32> {
    SAMPLING_FREQUENCIES
        .iter()
        .position(|&r| r == rate)
        .map(|i| i as u32)
}

fn read_object_type(bc: &mut BitCursor) -> Option<u32> {
    let object_type = bc.get_bits(5).ok()?;
    if object_type == 31 {
        return Some(32 + bc.get_bits(6).ok()?);
    }
    Some(object_type)
}

fn read_frequency(bc: &mut BitCursor) -> Option<u32> {
    let index = bc.get_bits(4).ok()?;
    if index == 15 {
        return bc.get_bits(24).ok();
    }
    sampling_frequency(index)
}

/// Parse an AudioSpecificConfig (ISO/IEC 14496-3 1.6.2.1). Explicit SBR
/// signalling (object type 5 or 29) and the backward compatible sync
/// extension after a GASpecificConfig are both recognized.
pub fn parse_audio_specific_config(data: &[u8]) -> Option<AacConfig> {
    let mut bc = BitCursor::new(data);
    let mut object_type = read_object_type(&mut bc)?;
    let sample_rate = read_frequency(&mut bc)?;
    let channels = bc.get_bits(4).ok()? as u16;

    let mut sbr = false;
    let mut output_sample_rate = sample_rate;
    if object_type == OBJECT_TYPE_SBR || object_type == OBJECT_TYPE_PS {
        sbr = true;
        output_sample_rate = read_frequency(&mut bc)?;
        object_type = read_object_type(&mut bc)?;
    }

    let profile = AacProfile::from_object_type(object_type)?;

    if !sbr {
        // GASpecificConfig: frameLengthFlag, dependsOnCoreCoder, extensionFlag
        let _frame_length = bc.get_flag().ok()?;
        if bc.get_flag().ok()? {
            let _core_coder_delay = bc.get_bits(14).ok()?;
        }
        let _extension = bc.get_flag().ok()?;

        if bc.remaining_bits() >= 16 && bc.get_bits(11).ok()? == SYNC_EXTENSION_TYPE {
            if read_object_type(&mut bc)? == OBJECT_TYPE_SBR && bc.get_flag().unwrap_or(false) {
                sbr = true;
                output_sample_rate = read_frequency(&mut bc).unwrap_or(sample_rate * 2);
            }
        }
    }

    Some(AacConfig {
        profile: if sbr { AacProfile::Sbr } else { profile },
        sample_rate,
        output_sample_rate,
        channels,
        sbr,
    })
}

/// Build the AudioSpecificConfig describing `config`. SBR streams get the
/// backward compatible sync extension so that non-SBR decoders still play
/// the core.
pub fn build_audio_specific_config(config: &AacConfig) -> Vec<u8> {
    let mut w = BitWriter::default();

    let index = sampling_frequency_index(config.sample_rate).unwrap_or(15);
    w.put(config.profile.object_type(), 5);
    w.put(index, 4);
    if index == 15 {
        w.put(config.sample_rate, 24);
    }
    w.put(u32::from(config.channels), 4);
    w.put(0, 3);

    if config.sbr {
        let ext_index = sampling_frequency_index(config.output_sample_rate).unwrap_or(15);
        w.put(SYNC_EXTENSION_TYPE, 11);
        w.put(OBJECT_TYPE_SBR, 5);
        w.put(1, 1);
        w.put(ext_index, 4);
        if ext_index == 15 {
            w.put(config.output_sample_rate, 24);
        }
    }

    w.into_bytes()
}

/// MSB-first bit accumulator for the few fields of a config record.
#[derive(Default)]
struct BitWriter {
    bytes: Vec<u8>,
    acc: u64,
    nbits: u32,
}

impl BitWriter {
    fn put(&mut self, value: u32, bits: u32) {
        self.acc = (self.acc << bits) | u64::from(value & crate::bits::mask(bits));
        self.nbits += bits;
        while self.nbits >= 8 {
            self.nbits -= 8;
            self.bytes.push((self.acc >> self.nbits) as u8);
        }
        self.acc &= (1u64 << self.nbits) - 1;
    }

    fn into_bytes(mut self) -> Vec<u8> {
        if self.nbits > 0 {
            let padding = 8 - self.nbits;
            self.put(0, padding);
        }
        self.bytes
    }
}
