pub mod header;

pub use header::{
    crc1_matches, crc1_span, find_sync_word, frame_size, parse_ac3_header, write_crc1,
    Ac3Header, AC3_HEADER_SIZE, AC3_SAMPLES_PER_FRAME, AC3_SYNC_WORD,
};
