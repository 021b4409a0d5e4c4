mod codec;
mod compressor;

pub use codec::{ImageCodec, ImageRsCodec};
pub use compressor::{CompressOutcome, Compressor};
