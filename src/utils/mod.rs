pub mod error;
pub mod formats;

pub use error::{CompressorError, CompressorResult, ValidationError};
pub use formats::{ImageFormat, file_stem, format_size, output_filename};
