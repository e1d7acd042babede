pub mod encoding;
pub mod srt;

pub use encoding::{decode_caption, read_caption, sniff_encoding};
pub use srt::{SrtBlock, SrtDocument};
