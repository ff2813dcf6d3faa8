use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::core::geodesy;

/// No-data value written to every canonical raster.
///
/// Zero is only an approximation for phase data: a valid zero-phase pixel
/// cannot be told apart from a missing one.
pub const NO_DATA_VALUE: f64 = 0.0;

/// Days per year used for interferogram time spans.
pub const DAYS_PER_YEAR: f64 = 365.25;

/// Speed of light in m/s, used to derive wavelength from radar frequency
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// GDAL metadata keys carried by canonical GeoTIFFs
pub mod metadata_keys {
    pub const MASTER_DATE: &str = "MASTER_DATE";
    pub const SLAVE_DATE: &str = "SLAVE_DATE";
    pub const TIME_SPAN_YEAR: &str = "TIME_SPAN_YEAR";
    pub const WAVELENGTH: &str = "WAVELENGTH_METRES";
    pub const DATUM: &str = "DATUM";
    pub const PROCESSOR: &str = "PROCESSOR";
    pub const DATA_TYPE: &str = "DATA_TYPE";

    /// Date format used for the date items
    pub const DATE_FORMAT: &str = "%Y-%m-%d";
}

/// Interferometric processing chain that produced a header/payload pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Processor {
    RoiPac,
    Gamma,
}

impl Processor {
    /// Numeric code used in processing configuration files
    pub fn code(&self) -> u8 {
        match self {
            Processor::RoiPac => 0,
            Processor::Gamma => 1,
        }
    }
}

impl std::fmt::Display for Processor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Processor::RoiPac => write!(f, "ROIPAC"),
            Processor::Gamma => write!(f, "GAMMA"),
        }
    }
}

impl TryFrom<u8> for Processor {
    type Error = ValidationError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Processor::RoiPac),
            1 => Ok(Processor::Gamma),
            other => Err(ValidationError::UnknownProcessor(other.to_string())),
        }
    }
}

impl std::str::FromStr for Processor {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "0" | "ROIPAC" | "ROI_PAC" => Ok(Processor::RoiPac),
            "1" | "GAMMA" => Ok(Processor::Gamma),
            _ => Err(ValidationError::UnknownProcessor(s.to_string())),
        }
    }
}

/// Master/slave acquisition dates of an interferogram
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AcquisitionDates {
    pub master: NaiveDate,
    pub slave: NaiveDate,
    /// Years between master and slave, using 365.25 day years
    pub time_span_years: f64,
}

impl AcquisitionDates {
    /// Build the date pair, deriving the time span from the two dates
    pub fn new(master: NaiveDate, slave: NaiveDate) -> Self {
        let days = (slave - master).num_days() as f64;
        Self {
            master,
            slave,
            time_span_years: days / DAYS_PER_YEAR,
        }
    }
}

/// Canonical header of an interferogram or DEM raster.
///
/// Produced by the ROI_PAC and GAMMA parsers, and rebuilt from canonical
/// GeoTIFFs by the raster handles. Derived fields (`x_last`, `y_last`,
/// acquisition dates for interferograms) are always filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterHeader {
    pub width: usize,
    pub height: usize,
    pub x_first: f64,
    pub y_first: f64,
    pub x_step: f64,
    pub y_step: f64,
    pub x_last: f64,
    pub y_last: f64,

    /// None for elevation models
    pub acquisition: Option<AcquisitionDates>,
    pub datum: Option<String>,
    pub projection: Option<String>,
    pub x_unit: Option<String>,
    pub y_unit: Option<String>,

    // Radar scalars, interferograms only
    pub wavelength: Option<f64>,
    pub heading: Option<f64>,
    pub incidence_angle: Option<f64>,

    /// Sample encoding the header declares, e.g. GAMMA `REAL*4`
    pub data_format: Option<String>,
    pub processor: Option<Processor>,
}

impl RasterHeader {
    /// Header with the mandatory grid fields set and `x_last`/`y_last` derived
    pub fn new(width: usize, height: usize, x_first: f64, y_first: f64, x_step: f64, y_step: f64) -> Self {
        Self {
            width,
            height,
            x_first,
            y_first,
            x_step,
            y_step,
            x_last: x_first + x_step * width as f64,
            y_last: y_first + y_step * height as f64,
            acquisition: None,
            datum: None,
            projection: None,
            x_unit: None,
            y_unit: None,
            wavelength: None,
            heading: None,
            incidence_angle: None,
            data_format: None,
            processor: None,
        }
    }

    /// DEM headers are recognised by the presence of a datum
    pub fn is_elevation_model(&self) -> bool {
        self.datum.is_some()
    }

    pub fn master_date(&self) -> Option<NaiveDate> {
        self.acquisition.map(|a| a.master)
    }

    pub fn slave_date(&self) -> Option<NaiveDate> {
        self.acquisition.map(|a| a.slave)
    }

    pub fn time_span_years(&self) -> Option<f64> {
        self.acquisition.map(|a| a.time_span_years)
    }

    /// Latitude of the lower left corner
    pub fn y_ll_corner(&self) -> f64 {
        self.y_first + self.height as f64 * self.y_step
    }

    pub fn num_cells(&self) -> usize {
        self.width * self.height
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// Column index of the centre cell
    pub fn x_centre(&self) -> usize {
        self.width / 2
    }

    /// Row index of the centre cell
    pub fn y_centre(&self) -> usize {
        self.height / 2
    }

    pub fn lat_centre(&self) -> f64 {
        self.y_first + self.y_centre() as f64 * self.y_step
    }

    pub fn long_centre(&self) -> f64 {
        self.x_first + self.x_centre() as f64 * self.x_step
    }

    /// Cell size in metres (x, y) at the raster centre
    pub fn cell_size_metres(&self) -> Result<(f64, f64), GeodesyError> {
        geodesy::cell_size(self.lat_centre(), self.long_centre(), self.x_step, self.y_step)
    }

    /// Cell width in metres at the raster centre
    pub fn x_size(&self) -> Result<f64, GeodesyError> {
        self.cell_size_metres().map(|(x, _)| x)
    }

    /// Cell height in metres at the raster centre
    pub fn y_size(&self) -> Result<f64, GeodesyError> {
        self.cell_size_metres().map(|(_, y)| y)
    }
}

/// Geospatial transformation parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub top_left_x: f64,
    pub pixel_width: f64,
    pub rotation_x: f64,
    pub top_left_y: f64,
    pub rotation_y: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    /// North-up transform of a header's grid
    pub fn from_header(header: &RasterHeader) -> Self {
        Self {
            top_left_x: header.x_first,
            pixel_width: header.x_step,
            rotation_x: 0.0,
            top_left_y: header.y_first,
            rotation_y: 0.0,
            pixel_height: header.y_step,
        }
    }

    /// From GDAL coefficient order
    pub fn from_gdal(gt: [f64; 6]) -> Self {
        Self {
            top_left_x: gt[0],
            pixel_width: gt[1],
            rotation_x: gt[2],
            top_left_y: gt[3],
            rotation_y: gt[4],
            pixel_height: gt[5],
        }
    }

    /// In GDAL coefficient order
    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.top_left_x,
            self.pixel_width,
            self.rotation_x,
            self.top_left_y,
            self.rotation_y,
            self.pixel_height,
        ]
    }
}

/// Pixel encoding of a canonical raster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelType {
    /// Signed 16 bit integer (DEM heights)
    Int16,
    /// 32 bit float (amplitude and phase)
    Float32,
}

impl PixelType {
    pub fn bits(&self) -> u32 {
        match self {
            PixelType::Int16 => 16,
            PixelType::Float32 => 32,
        }
    }

    /// Value of the EHdr `pixeltype` key
    pub fn ehdr_name(&self) -> &'static str {
        match self {
            PixelType::Int16 => "signedint",
            PixelType::Float32 => "float",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ByteOrder {
    LittleEndian,
    BigEndian,
}

impl ByteOrder {
    /// Value of the EHdr `byteorder` key
    pub fn ehdr_name(&self) -> &'static str {
        match self {
            ByteOrder::LittleEndian => "lsb",
            ByteOrder::BigEndian => "msb",
        }
    }
}

/// Cell dimensions in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CellSize {
    Uniform(f64),
    /// `y` is always positive
    Separate { x: f64, y: f64 },
}

/// Description of a canonical raster produced by the format translator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRasterSpec {
    pub width: usize,
    pub height: usize,
    pub pixel_type: PixelType,
    pub band_count: usize,
    pub byte_order: ByteOrder,
    pub no_data_value: f64,
    pub cell_size: CellSize,
    pub x_ll_corner: f64,
    pub y_ll_corner: f64,
    /// Cell size in metres at the raster centre, when defined
    pub cell_size_metres: Option<(f64, f64)>,
    pub is_elevation_model: bool,
}

/// Header parsing failures
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Malformed header line {line} in {path}: {reason}: '{content}'")]
    Malformed {
        path: PathBuf,
        line: usize,
        content: String,
        reason: &'static str,
    },

    #[error("Unrecognised header element {key}: {value}")]
    UnknownField { key: String, value: String },

    #[error("Invalid value for header element {key}: '{value}'")]
    InvalidValue { key: String, value: String },

    #[error("Missing required header element {0}")]
    MissingField(&'static str),

    #[error("Filename does not include master/slave dates: {0}")]
    MissingDates(PathBuf),

    #[error("Invalid date: '{0}'")]
    InvalidDate(String),

    #[error("Invalid Y latitude for yllcorner: {0}")]
    CornerLatitude(f64),
}

/// Geodetic computations outside their domain
#[derive(Debug, thiserror::Error)]
pub enum GeodesyError {
    #[error("No UTM zone for polar region (> 84 degrees N or < 80 degrees S): lat {latitude}, long {longitude}")]
    PolarRegion { latitude: f64, longitude: f64 },
}

/// Inputs that parse but cannot be converted
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid Y latitude for yllcorner: {0}")]
    CornerLatitude(f64),

    #[error("Processor must be ROI_PAC (0) or GAMMA (1), got '{0}'")]
    UnknownProcessor(String),

    #[error("Unrecognised file naming pattern for {0}")]
    FilenamePattern(PathBuf),

    #[error("Header is from {found}, expected {expected}")]
    ProcessorMismatch { expected: Processor, found: Processor },

    #[error("Payload {path} holds {actual} bytes, header describes {expected} ({layout})")]
    PayloadSize {
        path: PathBuf,
        expected: u64,
        actual: u64,
        layout: String,
    },

    #[error("Array shape {actual:?} does not match raster shape {expected:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },
}

/// Raster handle used in a state that does not permit the operation
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Raster {0} is already open")]
    AlreadyOpen(PathBuf),

    #[error("Raster {0} has not been opened")]
    NotOpen(PathBuf),

    #[error("Raster {0} has been closed")]
    Closed(PathBuf),
}

/// Error types for interferogram conversion and access
#[derive(Debug, thiserror::Error)]
pub enum InsarError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Geodesy(#[from] GeodesyError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),
}

/// Result type for conversion and raster operations
pub type InsarResult<T> = Result<T, InsarError>;
