//! ROI_PAC resource (`.rsc`) header parsing
//!
//! An RSC header is a list of whitespace separated `KEY VALUE` lines. Short
//! headers carry only the raster size, location and wavelength; long ones can
//! carry around forty elements. Every element must be known to [`RscField`].

use crate::types::{
    AcquisitionDates, InsarResult, ParseError, Processor, RasterHeader,
};
use chrono::NaiveDate;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// File extension of ROI_PAC headers
pub const RSC_EXTENSION: &str = "rsc";

/// Key column width used when writing headers
const KEY_COLUMN_WIDTH: usize = 18;

/// Value type of a header element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Float,
    Text,
    /// Compact `yymmdd` date
    Date,
    /// Compact `yymmdd-yymmdd` date range
    DatePair,
}

/// Every element a ROI_PAC header may contain
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RscField {
    Width,
    FileLength,
    XMin,
    XMax,
    YMin,
    YMax,
    RangeLooks,
    AzimuthLooks,
    ZOffset,
    ZScale,

    XUnit,
    YUnit,
    OrbitNumber,
    Datum,
    Projection,

    XFirst,
    XStep,
    YFirst,
    YStep,
    XLast,
    YLast,
    TimeSpanYear,
    CorThreshold,
    Velocity,
    Height,
    EarthRadius,
    Wavelength,
    HeadingDeg,
    /// RGE_REF1..4
    RangeRef(u8),
    /// LOOK_REF1..4
    LookRef(u8),
    /// LAT_REF1..4
    LatRef(u8),
    /// LON_REF1..4
    LonRef(u8),

    Date,
    Date12,
}

impl RscField {
    /// Look up a header key. `None` for keys outside the registry.
    pub fn from_key(key: &str) -> Option<Self> {
        use RscField::*;

        let field = match key {
            "WIDTH" => Width,
            "FILE_LENGTH" => FileLength,
            "XMIN" => XMin,
            "XMAX" => XMax,
            "YMIN" => YMin,
            "YMAX" => YMax,
            "RLOOKS" => RangeLooks,
            "ALOOKS" => AzimuthLooks,
            "Z_OFFSET" => ZOffset,
            "Z_SCALE" => ZScale,
            "X_UNIT" => XUnit,
            "Y_UNIT" => YUnit,
            "ORBIT_NUMBER" => OrbitNumber,
            "DATUM" => Datum,
            "PROJECTION" => Projection,
            "X_FIRST" => XFirst,
            "X_STEP" => XStep,
            "Y_FIRST" => YFirst,
            "Y_STEP" => YStep,
            "X_LAST" => XLast,
            "Y_LAST" => YLast,
            "TIME_SPAN_YEAR" => TimeSpanYear,
            "COR_THRESHOLD" => CorThreshold,
            "VELOCITY" => Velocity,
            "HEIGHT" => Height,
            "EARTH_RADIUS" => EarthRadius,
            "WAVELENGTH" => Wavelength,
            "HEADING_DEG" => HeadingDeg,
            "DATE" => Date,
            "DATE12" => Date12,
            _ => return Self::reference_point(key),
        };
        Some(field)
    }

    /// The four numbered reference point groups
    fn reference_point(key: &str) -> Option<Self> {
        let prefixes: [(&str, fn(u8) -> RscField); 4] = [
            ("RGE_REF", RscField::RangeRef),
            ("LOOK_REF", RscField::LookRef),
            ("LAT_REF", RscField::LatRef),
            ("LON_REF", RscField::LonRef),
        ];

        prefixes.iter().find_map(|(prefix, variant)| {
            let index: u8 = key.strip_prefix(prefix)?.parse().ok()?;
            (1..=4).contains(&index).then(|| variant(index))
        })
    }

    pub fn kind(&self) -> FieldKind {
        use RscField::*;

        match self {
            Width | FileLength | XMin | XMax | YMin | YMax | RangeLooks | AzimuthLooks
            | ZOffset | ZScale => FieldKind::Integer,
            XUnit | YUnit | OrbitNumber | Datum | Projection => FieldKind::Text,
            XFirst | XStep | YFirst | YStep | XLast | YLast | TimeSpanYear | CorThreshold
            | Velocity | Height | EarthRadius | Wavelength | HeadingDeg | RangeRef(_)
            | LookRef(_) | LatRef(_) | LonRef(_) => FieldKind::Float,
            Date => FieldKind::Date,
            Date12 => FieldKind::DatePair,
        }
    }

    /// Coerce a raw token to this element's type
    fn coerce(&self, raw: &str) -> Result<RscValue, ParseError> {
        let invalid = || ParseError::InvalidValue {
            key: self.to_string(),
            value: raw.to_string(),
        };

        let value = match self.kind() {
            FieldKind::Integer => RscValue::Integer(raw.parse().map_err(|_| invalid())?),
            FieldKind::Float => RscValue::Float(raw.parse().map_err(|_| invalid())?),
            FieldKind::Text => RscValue::Text(raw.to_string()),
            FieldKind::Date => RscValue::Date(parse_date(raw)?),
            FieldKind::DatePair => {
                let (first, second) = parse_date_pair(raw)?;
                RscValue::DatePair(first, second)
            }
        };
        Ok(value)
    }
}

impl fmt::Display for RscField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use RscField::*;

        let key = match self {
            Width => "WIDTH",
            FileLength => "FILE_LENGTH",
            XMin => "XMIN",
            XMax => "XMAX",
            YMin => "YMIN",
            YMax => "YMAX",
            RangeLooks => "RLOOKS",
            AzimuthLooks => "ALOOKS",
            ZOffset => "Z_OFFSET",
            ZScale => "Z_SCALE",
            XUnit => "X_UNIT",
            YUnit => "Y_UNIT",
            OrbitNumber => "ORBIT_NUMBER",
            Datum => "DATUM",
            Projection => "PROJECTION",
            XFirst => "X_FIRST",
            XStep => "X_STEP",
            YFirst => "Y_FIRST",
            YStep => "Y_STEP",
            XLast => "X_LAST",
            YLast => "Y_LAST",
            TimeSpanYear => "TIME_SPAN_YEAR",
            CorThreshold => "COR_THRESHOLD",
            Velocity => "VELOCITY",
            Height => "HEIGHT",
            EarthRadius => "EARTH_RADIUS",
            Wavelength => "WAVELENGTH",
            HeadingDeg => "HEADING_DEG",
            RangeRef(i) => return write!(f, "RGE_REF{}", i),
            LookRef(i) => return write!(f, "LOOK_REF{}", i),
            LatRef(i) => return write!(f, "LAT_REF{}", i),
            LonRef(i) => return write!(f, "LON_REF{}", i),
            Date => "DATE",
            Date12 => "DATE12",
        };
        f.write_str(key)
    }
}

/// A typed header value
#[derive(Debug, Clone, PartialEq)]
pub enum RscValue {
    Integer(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    DatePair(NaiveDate, NaiveDate),
}

impl fmt::Display for RscValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RscValue::Integer(v) => write!(f, "{}", v),
            RscValue::Float(v) => write!(f, "{}", v),
            RscValue::Text(v) => f.write_str(v),
            RscValue::Date(d) => write!(f, "{}", d.format("%y%m%d")),
            RscValue::DatePair(a, b) => write!(f, "{}-{}", a.format("%y%m%d"), b.format("%y%m%d")),
        }
    }
}

/// Typed contents of an RSC file, before derivation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RscHeader {
    fields: BTreeMap<RscField, RscValue>,
}

impl RscHeader {
    /// Parse header text. `path` is only used in error messages.
    pub fn parse(text: &str, path: &Path) -> Result<Self, ParseError> {
        let mut fields = BTreeMap::new();

        for (index, line) in text.lines().enumerate() {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            let (key, raw) = match tokens.as_slice() {
                [] => continue,
                [key, raw] => (*key, *raw),
                _ => {
                    return Err(ParseError::Malformed {
                        path: path.to_path_buf(),
                        line: index + 1,
                        content: line.to_string(),
                        reason: "expected KEY VALUE",
                    })
                }
            };

            let field = RscField::from_key(key).ok_or_else(|| ParseError::UnknownField {
                key: key.to_string(),
                value: raw.to_string(),
            })?;

            let value = field.coerce(raw)?;
            if fields.insert(field, value).is_some() {
                return Err(ParseError::Malformed {
                    path: path.to_path_buf(),
                    line: index + 1,
                    content: line.to_string(),
                    reason: "duplicate element",
                });
            }
        }

        Ok(Self { fields })
    }

    pub fn get(&self, field: RscField) -> Option<&RscValue> {
        self.fields.get(&field)
    }

    pub fn insert(&mut self, field: RscField, value: RscValue) {
        self.fields.insert(field, value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RscField, &RscValue)> {
        self.fields.iter()
    }

    pub fn integer(&self, field: RscField) -> Option<i64> {
        match self.get(field) {
            Some(RscValue::Integer(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn float(&self, field: RscField) -> Option<f64> {
        match self.get(field) {
            Some(RscValue::Float(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn text(&self, field: RscField) -> Option<String> {
        match self.get(field) {
            Some(RscValue::Text(v)) => Some(v.clone()),
            _ => None,
        }
    }

    fn required_dimension(&self, field: RscField, name: &'static str) -> Result<usize, ParseError> {
        let value = self.integer(field).ok_or(ParseError::MissingField(name))?;
        usize::try_from(value)
            .ok()
            .filter(|v| *v > 0)
            .ok_or_else(|| ParseError::InvalidValue {
                key: name.to_string(),
                value: value.to_string(),
            })
    }

    fn required_float(&self, field: RscField, name: &'static str) -> Result<f64, ParseError> {
        self.float(field).ok_or(ParseError::MissingField(name))
    }

    /// Derive the canonical header.
    ///
    /// Interferogram dates missing from the header are taken from the file
    /// name of `path`, and the time span is always recomputed from the dates
    /// because ROI_PAC's own value is a few hours off.
    pub fn to_raster_header(&self, path: &Path) -> Result<RasterHeader, ParseError> {
        let mut header = RasterHeader::new(
            self.required_dimension(RscField::Width, "WIDTH")?,
            self.required_dimension(RscField::FileLength, "FILE_LENGTH")?,
            self.required_float(RscField::XFirst, "X_FIRST")?,
            self.required_float(RscField::YFirst, "Y_FIRST")?,
            self.required_float(RscField::XStep, "X_STEP")?,
            self.required_float(RscField::YStep, "Y_STEP")?,
        );

        if let Some(x_last) = self.float(RscField::XLast) {
            header.x_last = x_last;
        }
        if let Some(y_last) = self.float(RscField::YLast) {
            header.y_last = y_last;
        }

        header.datum = self.text(RscField::Datum);
        header.projection = self.text(RscField::Projection);
        header.x_unit = self.text(RscField::XUnit);
        header.y_unit = self.text(RscField::YUnit);
        header.wavelength = self.float(RscField::Wavelength);
        header.heading = self.float(RscField::HeadingDeg);
        header.processor = Some(Processor::RoiPac);

        if !header.is_elevation_model() {
            let (master, slave) = match (self.get(RscField::Date), self.get(RscField::Date12)) {
                (Some(RscValue::Date(master)), Some(RscValue::DatePair(_, slave))) => {
                    (*master, *slave)
                }
                _ => dates_from_filename(path)?,
            };
            header.acquisition = Some(AcquisitionDates::new(master, slave));
        }

        check_corner_latitude(header.y_ll_corner())?;
        Ok(header)
    }
}

/// Parse a ROI_PAC header file into a canonical header
pub fn parse_header<P: AsRef<Path>>(path: P) -> InsarResult<RasterHeader> {
    let path = path.as_ref();
    log::debug!("Parsing ROI_PAC header: {}", path.display());

    let text = fs::read_to_string(path)?;
    let header = parse_header_str(&text, path)?;

    log::debug!(
        "ROI_PAC header {}: {}x{}, dem={}",
        path.display(),
        header.width,
        header.height,
        header.is_elevation_model()
    );
    Ok(header)
}

/// Parse header text as if read from `path`
pub fn parse_header_str(text: &str, path: &Path) -> Result<RasterHeader, ParseError> {
    RscHeader::parse(text, path)?.to_raster_header(path)
}

/// Lower left corner latitudes must lie within [-90, 90]
pub fn check_corner_latitude(y_ll_corner: f64) -> Result<(), ParseError> {
    if (-90.0..=90.0).contains(&y_ll_corner) {
        Ok(())
    } else {
        Err(ParseError::CornerLatitude(y_ll_corner))
    }
}

/// Parse a compact `yymmdd` date. Years 50-99 are 19xx, 00-49 are 20xx.
pub fn parse_date(s: &str) -> Result<NaiveDate, ParseError> {
    let invalid = || ParseError::InvalidDate(s.to_string());

    if s.len() != 6 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let part = |i: usize| s[i..i + 2].parse::<u32>().map_err(|_| invalid());
    let (yy, month, day) = (part(0)?, part(2)?, part(4)?);
    let year = if yy >= 50 { 1900 + yy } else { 2000 + yy };

    NaiveDate::from_ymd_opt(year as i32, month, day).ok_or_else(invalid)
}

/// Parse a compact `yymmdd-yymmdd` date range
pub fn parse_date_pair(s: &str) -> Result<(NaiveDate, NaiveDate), ParseError> {
    match s.split_once('-') {
        Some((first, second)) => Ok((parse_date(first)?, parse_date(second)?)),
        None => Err(ParseError::InvalidDate(s.to_string())),
    }
}

fn compact_date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?:^|[^0-9])([0-9]{6}-[0-9]{6})(?:[^0-9]|$)").expect("valid date pattern")
    })
}

/// Master and slave dates from a `yymmdd-yymmdd` pair in a file name
pub fn dates_from_filename(path: &Path) -> Result<(NaiveDate, NaiveDate), ParseError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    match compact_date_pattern().captures(&name).and_then(|c| c.get(1)) {
        Some(m) => parse_date_pair(m.as_str()),
        None => Err(ParseError::MissingDates(path.to_path_buf())),
    }
}

/// Header path paired with a ROI_PAC payload (`payload.rsc`)
pub fn header_path<P: AsRef<Path>>(payload: P) -> PathBuf {
    let mut name = payload.as_ref().as_os_str().to_os_string();
    name.push(".");
    name.push(RSC_EXTENSION);
    PathBuf::from(name)
}

/// Write a canonical header back out in ROI_PAC form
pub fn write_header<P: AsRef<Path>>(header: &RasterHeader, dest: P) -> InsarResult<()> {
    let mut rsc = RscHeader::default();

    rsc.insert(RscField::Width, RscValue::Integer(header.width as i64));
    rsc.insert(RscField::FileLength, RscValue::Integer(header.height as i64));
    rsc.insert(RscField::XFirst, RscValue::Float(header.x_first));
    rsc.insert(RscField::XStep, RscValue::Float(header.x_step));
    rsc.insert(RscField::YFirst, RscValue::Float(header.y_first));
    rsc.insert(RscField::YStep, RscValue::Float(header.y_step));

    let text_fields = [
        (RscField::XUnit, &header.x_unit),
        (RscField::YUnit, &header.y_unit),
        (RscField::Datum, &header.datum),
        (RscField::Projection, &header.projection),
    ];
    for (field, value) in text_fields {
        if let Some(v) = value {
            rsc.insert(field, RscValue::Text(v.clone()));
        }
    }
    if let Some(wavelength) = header.wavelength {
        rsc.insert(RscField::Wavelength, RscValue::Float(wavelength));
    }
    if let Some(heading) = header.heading {
        rsc.insert(RscField::HeadingDeg, RscValue::Float(heading));
    }
    if let Some(dates) = header.acquisition {
        rsc.insert(RscField::Date, RscValue::Date(dates.master));
        rsc.insert(RscField::Date12, RscValue::DatePair(dates.master, dates.slave));
        rsc.insert(RscField::TimeSpanYear, RscValue::Float(dates.time_span_years));
    }

    write_fields(&rsc, dest)
}

/// Write raw header elements, keys left justified
pub fn write_fields<P: AsRef<Path>>(rsc: &RscHeader, dest: P) -> InsarResult<()> {
    let mut file = fs::File::create(dest.as_ref())?;
    let mut written = 0;
    for (field, value) in rsc.iter() {
        writeln!(
            file,
            "{:<width$}{}",
            field.to_string(),
            value,
            width = KEY_COLUMN_WIDTH
        )?;
        written += 1;
    }
    log::debug!("Wrote {} ROI_PAC elements to {}", written, dest.as_ref().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHORT_HEADER: &str = "\
WIDTH             47
FILE_LENGTH       72
X_FIRST           150.910
X_STEP            0.000833333
Y_FIRST           -34.170
Y_STEP            -0.000833333
WAVELENGTH        0.0562356424
";

    fn ifg_path() -> PathBuf {
        PathBuf::from("/data/geo_060619-061002.unw.rsc")
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_date_pivot() {
        assert_eq!(parse_date("990101").unwrap(), ymd(1999, 1, 1));
        assert_eq!(parse_date("500315").unwrap(), ymd(1950, 3, 15));
        assert_eq!(parse_date("491231").unwrap(), ymd(2049, 12, 31));
        assert_eq!(parse_date("000229").unwrap(), ymd(2000, 2, 29));
    }

    #[test]
    fn test_parse_date_invalid() {
        for bad in ["061332", "06061", "0606190", "06a619", ""] {
            assert!(matches!(parse_date(bad), Err(ParseError::InvalidDate(_))), "{}", bad);
        }
        assert!(parse_date_pair("060619").is_err());
    }

    #[test]
    fn test_short_header_with_filename_dates() {
        let header = parse_header_str(SHORT_HEADER, &ifg_path()).unwrap();

        assert_eq!(header.width, 47);
        assert_eq!(header.height, 72);
        assert_eq!(header.master_date(), Some(ymd(2006, 6, 19)));
        assert_eq!(header.slave_date(), Some(ymd(2006, 10, 2)));
        assert!((header.time_span_years().unwrap() - 0.287474332649).abs() < 1e-9);
        assert_eq!(header.wavelength, Some(0.0562356424));
        assert_eq!(header.processor, Some(Processor::RoiPac));
        assert!(!header.is_elevation_model());
    }

    #[test]
    fn test_xy_last_synthesis() {
        let header = parse_header_str(SHORT_HEADER, &ifg_path()).unwrap();
        assert_eq!(header.x_last, 150.910 + 0.000833333 * 47.0);
        assert_eq!(header.y_last, -34.170 + -0.000833333 * 72.0);
    }

    #[test]
    fn test_xy_last_kept_when_present() {
        let text = format!("{}X_LAST 151.0\nY_LAST -34.3\n", SHORT_HEADER);
        let header = parse_header_str(&text, &ifg_path()).unwrap();
        assert_eq!(header.x_last, 151.0);
        assert_eq!(header.y_last, -34.3);
    }

    #[test]
    fn test_header_dates_and_time_span_override() {
        let text = format!(
            "{}DATE 060619\nDATE12 060619-061002\nTIME_SPAN_YEAR 0.2880\n",
            SHORT_HEADER
        );
        // File name carries no dates; the header does
        let header = parse_header_str(&text, Path::new("ifg.unw.rsc")).unwrap();
        assert_eq!(header.master_date(), Some(ymd(2006, 6, 19)));
        assert_eq!(header.slave_date(), Some(ymd(2006, 10, 2)));
        assert!((header.time_span_years().unwrap() - 105.0 / 365.25).abs() < 1e-12);
    }

    #[test]
    fn test_missing_dates() {
        let result = parse_header_str(SHORT_HEADER, Path::new("/data/ifg.unw.rsc"));
        assert!(matches!(result, Err(ParseError::MissingDates(_))));
    }

    #[test]
    fn test_dates_from_directory_are_ignored() {
        let result = parse_header_str(SHORT_HEADER, Path::new("/data/060619-061002/ifg.unw.rsc"));
        assert!(matches!(result, Err(ParseError::MissingDates(_))));
    }

    #[test]
    fn test_dem_header_skips_dates() {
        let text = format!("{}DATUM WGS84\nPROJECTION LL\nZ_OFFSET 0\nZ_SCALE 1\n", SHORT_HEADER);
        let header = parse_header_str(&text, Path::new("sydney.dem.rsc")).unwrap();
        assert!(header.is_elevation_model());
        assert!(header.acquisition.is_none());
        assert_eq!(header.datum.as_deref(), Some("WGS84"));
    }

    #[test]
    fn test_unknown_field() {
        let text = format!("{}FOO 1\n", SHORT_HEADER);
        let result = parse_header_str(&text, &ifg_path());
        assert!(matches!(result, Err(ParseError::UnknownField { ref key, .. }) if key == "FOO"));
    }

    #[test]
    fn test_malformed_lines() {
        let three_tokens = format!("{}X_UNIT degrees extra\n", SHORT_HEADER);
        assert!(matches!(
            parse_header_str(&three_tokens, &ifg_path()),
            Err(ParseError::Malformed { line: 8, .. })
        ));

        let duplicate = format!("{}WIDTH 48\n", SHORT_HEADER);
        assert!(matches!(
            parse_header_str(&duplicate, &ifg_path()),
            Err(ParseError::Malformed { reason: "duplicate element", .. })
        ));
    }

    #[test]
    fn test_invalid_and_missing_values() {
        let text = SHORT_HEADER.replace("47", "forty-seven");
        assert!(matches!(
            parse_header_str(&text, &ifg_path()),
            Err(ParseError::InvalidValue { .. })
        ));

        let text = SHORT_HEADER.replace("WIDTH             47\n", "");
        assert!(matches!(
            parse_header_str(&text, &ifg_path()),
            Err(ParseError::MissingField("WIDTH"))
        ));

        let text = SHORT_HEADER.replace("47", "0");
        assert!(matches!(
            parse_header_str(&text, &ifg_path()),
            Err(ParseError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_corner_latitude_out_of_range() {
        let text = SHORT_HEADER.replace("-34.170", "-89.99");
        assert!(matches!(
            parse_header_str(&text, &ifg_path()),
            Err(ParseError::CornerLatitude(_))
        ));
    }

    #[test]
    fn test_reference_point_fields() {
        assert_eq!(RscField::from_key("LAT_REF3"), Some(RscField::LatRef(3)));
        assert_eq!(RscField::from_key("RGE_REF1"), Some(RscField::RangeRef(1)));
        assert_eq!(RscField::from_key("LON_REF5"), None);
        assert_eq!(RscField::from_key("LOOK_REF"), None);
        assert_eq!(RscField::LookRef(4).to_string(), "LOOK_REF4");
        assert_eq!(RscField::RangeRef(2).kind(), FieldKind::Float);
    }

    #[test]
    fn test_determinism() {
        let a = parse_header_str(SHORT_HEADER, &ifg_path()).unwrap();
        let b = parse_header_str(SHORT_HEADER, &ifg_path()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_write_header_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let original = parse_header_str(SHORT_HEADER, &ifg_path()).unwrap();
        let dest = dir.path().join("ifg.unw.rsc");

        write_header(&original, &dest).unwrap();
        let reparsed = parse_header(&dest).unwrap();

        assert_eq!(reparsed.width, original.width);
        assert_eq!(reparsed.x_step, original.x_step);
        assert_eq!(reparsed.acquisition, original.acquisition);
        assert_eq!(reparsed.wavelength, original.wavelength);
    }

    #[test]
    fn test_header_path() {
        assert_eq!(
            header_path("/data/geo_060619-061002.unw"),
            PathBuf::from("/data/geo_060619-061002.unw.rsc")
        );
    }
}
