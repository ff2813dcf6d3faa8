//! Header parsing, format translation and raster access

pub mod gamma;
pub mod raster;
pub mod roipac;
pub mod translate;

// Re-export main types
pub use gamma::GammaHeader;
pub use raster::{Elevation, Interferogram, Raster, RasterFile};
pub use roipac::RscHeader;
pub use translate::{canonical_spec, resolve_header_destination, translate, write_ehdr};
