pub mod audio_config;

pub use audio_config::{
    build_audio_specific_config, parse_audio_specific_config, sampling_frequency,
    sampling_frequency_index, AacConfig, AacProfile, AAC_SAMPLES_PER_FRAME,
};
