pub mod byte_cursor;
pub mod reader;

pub use byte_cursor::{ByteCursor, Endian};
pub use reader::{mask, BitCursor};
