//! Geodesy and conversion of interferometry products

pub mod convert;
pub mod geodesy;

// Re-export main types
pub use convert::{
    convert, convert_all, output_tiff_filename, ConversionJob, ConversionParams, Converter,
};
pub use geodesy::{cell_size, utm_zone};
