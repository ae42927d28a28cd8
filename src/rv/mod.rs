pub mod dimensions;

pub use dimensions::parse_rv_dimensions;
