//! GAMMA parameter file parsing
//!
//! GAMMA headers are `key: value [unit]` lines, optionally preceded by a
//! free-text banner line such as `Gamma DIFF&GEO DEM/MAP parameter file`.
//! Interferogram dates are not part of the parameter file; they come from
//! the `yyyymmdd-yyyymmdd` pair GAMMA puts in file names.

use crate::io::roipac::{check_corner_latitude, dates_from_filename};
use crate::types::{
    AcquisitionDates, InsarResult, ParseError, Processor, RasterHeader, SPEED_OF_LIGHT,
};
use chrono::NaiveDate;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// Every key a GAMMA parameter file may contain
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GammaField {
    Title,
    DemProjection,
    DataFormat,
    DemHgtOffset,
    DemScale,
    Width,
    Nlines,
    CornerLat,
    CornerLon,
    PostLat,
    PostLon,
    EllipsoidName,
    EllipsoidRa,
    EllipsoidReciprocalFlattening,
    DatumName,
    DatumShiftDx,
    DatumShiftDy,
    DatumShiftDz,
    DatumScaleM,
    DatumRotationAlpha,
    DatumRotationBeta,
    DatumRotationGamma,
    DatumCountryList,
    ProjectionName,
    ProjectionZone,
    FalseEasting,
    FalseNorthing,
    ProjectionK0,
    CenterLongitude,
    CenterLatitude,
    RadarFrequency,
    IncidenceAngle,
    Heading,
}

/// Keys and their fields, in file order
const REGISTRY: &[(&str, GammaField)] = &[
    ("title", GammaField::Title),
    ("DEM_projection", GammaField::DemProjection),
    ("data_format", GammaField::DataFormat),
    ("DEM_hgt_offset", GammaField::DemHgtOffset),
    ("DEM_scale", GammaField::DemScale),
    ("width", GammaField::Width),
    ("nlines", GammaField::Nlines),
    ("corner_lat", GammaField::CornerLat),
    ("corner_lon", GammaField::CornerLon),
    ("post_lat", GammaField::PostLat),
    ("post_lon", GammaField::PostLon),
    ("ellipsoid_name", GammaField::EllipsoidName),
    ("ellipsoid_ra", GammaField::EllipsoidRa),
    ("ellipsoid_reciprocal_flattening", GammaField::EllipsoidReciprocalFlattening),
    ("datum_name", GammaField::DatumName),
    ("datum_shift_dx", GammaField::DatumShiftDx),
    ("datum_shift_dy", GammaField::DatumShiftDy),
    ("datum_shift_dz", GammaField::DatumShiftDz),
    ("datum_scale_m", GammaField::DatumScaleM),
    ("datum_rotation_alpha", GammaField::DatumRotationAlpha),
    ("datum_rotation_beta", GammaField::DatumRotationBeta),
    ("datum_rotation_gamma", GammaField::DatumRotationGamma),
    ("datum_country_list", GammaField::DatumCountryList),
    ("projection_name", GammaField::ProjectionName),
    ("projection_zone", GammaField::ProjectionZone),
    ("false_easting", GammaField::FalseEasting),
    ("false_northing", GammaField::FalseNorthing),
    ("projection_k0", GammaField::ProjectionK0),
    ("center_longitude", GammaField::CenterLongitude),
    ("center_latitude", GammaField::CenterLatitude),
    ("radar_frequency", GammaField::RadarFrequency),
    ("incidence_angle", GammaField::IncidenceAngle),
    ("heading", GammaField::Heading),
];

impl GammaField {
    pub fn from_key(key: &str) -> Option<Self> {
        REGISTRY.iter().find(|(k, _)| *k == key).map(|(_, field)| *field)
    }

    pub fn key(&self) -> &'static str {
        REGISTRY
            .iter()
            .find(|(_, field)| field == self)
            .map(|(key, _)| *key)
            .unwrap_or("unknown")
    }

    fn coerce(&self, raw: &str) -> Result<GammaValue, ParseError> {
        use GammaField::*;

        let invalid = || ParseError::InvalidValue {
            key: self.key().to_string(),
            value: raw.to_string(),
        };
        // Numeric values may be followed by a unit
        let first = raw.split_whitespace().next().unwrap_or("");

        let value = match self {
            Title | DemProjection | DataFormat | EllipsoidName | DatumName | DatumCountryList
            | ProjectionName => GammaValue::Text(raw.to_string()),
            Width | Nlines | ProjectionZone => {
                GammaValue::Integer(first.parse().map_err(|_| invalid())?)
            }
            _ => GammaValue::Float(first.parse().map_err(|_| invalid())?),
        };
        Ok(value)
    }
}

impl fmt::Display for GammaField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GammaValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

/// Typed contents of a GAMMA parameter file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GammaHeader {
    /// Free-text first line, if any
    pub banner: Option<String>,
    fields: BTreeMap<GammaField, GammaValue>,
}

impl GammaHeader {
    /// Parse parameter file text. `path` is only used in error messages.
    pub fn parse(text: &str, path: &Path) -> Result<Self, ParseError> {
        let mut header = GammaHeader::default();
        let mut seen_content = false;

        for (index, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let malformed = |reason| ParseError::Malformed {
                path: path.to_path_buf(),
                line: index + 1,
                content: line.to_string(),
                reason,
            };

            let Some((key, raw)) = trimmed.split_once(':') else {
                if seen_content {
                    return Err(malformed("expected key: value"));
                }
                header.banner = Some(trimmed.to_string());
                seen_content = true;
                continue;
            };
            seen_content = true;

            let (key, raw) = (key.trim(), raw.trim());
            if key.is_empty() {
                return Err(malformed("empty key"));
            }

            let field = GammaField::from_key(key).ok_or_else(|| ParseError::UnknownField {
                key: key.to_string(),
                value: raw.to_string(),
            })?;

            let value = field.coerce(raw)?;
            if header.fields.insert(field, value).is_some() {
                return Err(malformed("duplicate element"));
            }
        }

        Ok(header)
    }

    pub fn get(&self, field: GammaField) -> Option<&GammaValue> {
        self.fields.get(&field)
    }

    pub fn integer(&self, field: GammaField) -> Option<i64> {
        match self.get(field) {
            Some(GammaValue::Integer(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn float(&self, field: GammaField) -> Option<f64> {
        match self.get(field) {
            Some(GammaValue::Float(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn text(&self, field: GammaField) -> Option<String> {
        match self.get(field) {
            Some(GammaValue::Text(v)) => Some(v.clone()),
            _ => None,
        }
    }

    fn required_dimension(&self, field: GammaField) -> Result<usize, ParseError> {
        let value = self.integer(field).ok_or(ParseError::MissingField(field.key()))?;
        usize::try_from(value)
            .ok()
            .filter(|v| *v > 0)
            .ok_or_else(|| ParseError::InvalidValue {
                key: field.key().to_string(),
                value: value.to_string(),
            })
    }

    fn required_float(&self, field: GammaField) -> Result<f64, ParseError> {
        self.float(field).ok_or(ParseError::MissingField(field.key()))
    }

    /// Derive the canonical header, taking interferogram dates from `path`
    pub fn to_raster_header(&self, path: &Path) -> Result<RasterHeader, ParseError> {
        let mut header = RasterHeader::new(
            self.required_dimension(GammaField::Width)?,
            self.required_dimension(GammaField::Nlines)?,
            self.required_float(GammaField::CornerLon)?,
            self.required_float(GammaField::CornerLat)?,
            self.required_float(GammaField::PostLon)?,
            self.required_float(GammaField::PostLat)?,
        );

        header.datum = self
            .text(GammaField::DatumName)
            .or_else(|| self.text(GammaField::EllipsoidName));
        header.projection = self.text(GammaField::DemProjection);
        header.incidence_angle = self.float(GammaField::IncidenceAngle);
        header.heading = self.float(GammaField::Heading);
        header.data_format = self.text(GammaField::DataFormat);
        header.processor = Some(Processor::Gamma);

        if let Some(frequency) = self.float(GammaField::RadarFrequency) {
            if frequency <= 0.0 {
                return Err(ParseError::InvalidValue {
                    key: GammaField::RadarFrequency.key().to_string(),
                    value: frequency.to_string(),
                });
            }
            header.wavelength = Some(SPEED_OF_LIGHT / frequency);
        }

        if !header.is_elevation_model() {
            let (master, slave) = gamma_dates_from_filename(path)?;
            header.acquisition = Some(AcquisitionDates::new(master, slave));
        }

        check_corner_latitude(header.y_ll_corner())?;
        Ok(header)
    }
}

fn full_date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?:^|[^0-9])([0-9]{8})-([0-9]{8})(?:[^0-9]|$)").expect("valid date pattern")
    })
}

/// Dates from a `yyyymmdd-yyyymmdd` file name, falling back to `yymmdd-yymmdd`
pub fn gamma_dates_from_filename(path: &Path) -> Result<(NaiveDate, NaiveDate), ParseError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let Some(captures) = full_date_pattern().captures(&name) else {
        return dates_from_filename(path);
    };

    let parse = |s: &str| {
        NaiveDate::parse_from_str(s, "%Y%m%d").map_err(|_| ParseError::InvalidDate(s.to_string()))
    };
    Ok((parse(&captures[1])?, parse(&captures[2])?))
}

/// Parse a GAMMA parameter file into a canonical header
pub fn parse_header<P: AsRef<Path>>(path: P) -> InsarResult<RasterHeader> {
    let path = path.as_ref();
    log::debug!("Parsing GAMMA header: {}", path.display());

    let text = fs::read_to_string(path)?;
    Ok(parse_header_str(&text, path)?)
}

/// Parse parameter file text as if read from `path`
pub fn parse_header_str(text: &str, path: &Path) -> Result<RasterHeader, ParseError> {
    GammaHeader::parse(text, path)?.to_raster_header(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEM_PAR: &str = "\
Gamma DIFF&GEO DEM/MAP parameter file
title: sydney
DEM_projection:     EQA
data_format:        REAL*4
DEM_hgt_offset:          0.00000
DEM_scale:               1.00000
width:                    47
nlines:                   72
corner_lat:     -34.1708333  decimal degrees
corner_lon:     150.3458333  decimal degrees
post_lat:   -8.3333333e-04  decimal degrees
post_lon:    8.3333333e-04  decimal degrees

ellipsoid_name: WGS 84
ellipsoid_ra:        6378137.000   m   1/f:      298.2572236
datum_name: WGS 1984
";

    const IFG_PAR: &str = "\
width:                    47
nlines:                   72
corner_lat:     -34.1708333  decimal degrees
corner_lon:     150.3458333  decimal degrees
post_lat:   -8.3333333e-04  decimal degrees
post_lon:    8.3333333e-04  decimal degrees
radar_frequency:  5.3310040e+09   Hz
incidence_angle:  22.5   degrees
";

    #[test]
    fn test_dem_par() {
        let header = parse_header_str(DEM_PAR, Path::new("sydney.dem.par")).unwrap();

        assert_eq!(header.width, 47);
        assert_eq!(header.height, 72);
        assert_eq!(header.x_first, 150.3458333);
        assert_eq!(header.y_first, -34.1708333);
        assert_eq!(header.x_step, 8.3333333e-04);
        assert_eq!(header.y_step, -8.3333333e-04);
        assert_eq!(header.datum.as_deref(), Some("WGS 1984"));
        assert_eq!(header.projection.as_deref(), Some("EQA"));
        assert_eq!(header.data_format.as_deref(), Some("REAL*4"));
        assert!(header.is_elevation_model());
        assert!(header.acquisition.is_none());
        assert_eq!(header.processor, Some(Processor::Gamma));
    }

    #[test]
    fn test_ifg_par_dates_and_wavelength() {
        let path = Path::new("/data/20060619-20061002_utm.unw.par");
        let header = parse_header_str(IFG_PAR, path).unwrap();

        let dates = header.acquisition.unwrap();
        assert_eq!(dates.master, NaiveDate::from_ymd_opt(2006, 6, 19).unwrap());
        assert_eq!(dates.slave, NaiveDate::from_ymd_opt(2006, 10, 2).unwrap());
        assert!((header.wavelength.unwrap() - 0.0562356468).abs() < 1e-9);
        assert_eq!(header.incidence_angle, Some(22.5));
        assert!(!header.is_elevation_model());
    }

    #[test]
    fn test_compact_filename_dates() {
        let header = parse_header_str(IFG_PAR, Path::new("geo_060619-061002.unw.par")).unwrap();
        assert_eq!(header.master_date(), NaiveDate::from_ymd_opt(2006, 6, 19));
    }

    #[test]
    fn test_missing_dates() {
        let result = parse_header_str(IFG_PAR, Path::new("ifg.unw.par"));
        assert!(matches!(result, Err(ParseError::MissingDates(_))));
    }

    #[test]
    fn test_unknown_key() {
        let text = format!("{}range_looks: 4\n", IFG_PAR);
        let result = parse_header_str(&text, Path::new("20060619-20061002.unw.par"));
        assert!(matches!(result, Err(ParseError::UnknownField { ref key, .. }) if key == "range_looks"));
    }

    #[test]
    fn test_banner_only_first() {
        let text = format!("{}stray banner\n", DEM_PAR);
        assert!(matches!(
            parse_header_str(&text, Path::new("sydney.dem.par")),
            Err(ParseError::Malformed { .. })
        ));

        let duplicate = format!("{}width: 48\n", DEM_PAR);
        assert!(matches!(
            parse_header_str(&duplicate, Path::new("sydney.dem.par")),
            Err(ParseError::Malformed { reason: "duplicate element", .. })
        ));
    }

    #[test]
    fn test_registry_keys_round_trip() {
        for (key, field) in REGISTRY {
            assert_eq!(GammaField::from_key(key), Some(*field));
            assert_eq!(field.key(), *key);
        }
    }
}
