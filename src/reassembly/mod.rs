mod assembler;
mod header;

pub use assembler::{
    AssembledFrame, ChunkOutcome, Fragment, FragmentSet, ReassemblyState, Reassembler,
};
pub use header::{parse_fragment_header, FragmentHeader};
