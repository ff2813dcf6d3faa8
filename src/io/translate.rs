//! Translation of parsed headers into GDAL readable raster descriptions
//!
//! Raw ROI_PAC and GAMMA payloads carry no self description. The translator
//! decides pixel type, band layout and cell geometry from the canonical
//! header, and writes an ESRI BIL (EHdr) `.hdr` file next to the payload so
//! GDAL's EHdr driver can read it.

use crate::types::{
    ByteOrder, CanonicalRasterSpec, CellSize, InsarError, InsarResult, PixelType, Processor,
    RasterHeader, ValidationError, NO_DATA_VALUE,
};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Extension of EHdr description files
pub const HDR_EXTENSION: &str = "hdr";

/// Bands in a ROI_PAC style interferogram payload (amplitude, phase)
pub const INTERFEROGRAM_BANDS: usize = 2;

/// Describe the canonical raster for a header without touching the disk.
///
/// DEMs become single band 16 bit integers. Interferograms become two band
/// 32 bit floats in BIL layout. Payloads are always little endian.
pub fn canonical_spec(header: &RasterHeader) -> Result<CanonicalRasterSpec, ValidationError> {
    let is_dem = header.is_elevation_model();

    let y_ll_corner = header.y_ll_corner();
    if !(-90.0..=90.0).contains(&y_ll_corner) {
        return Err(ValidationError::CornerLatitude(y_ll_corner));
    }

    let (pixel_type, band_count) = if is_dem {
        (PixelType::Int16, 1)
    } else {
        (PixelType::Float32, INTERFEROGRAM_BANDS)
    };

    let cell_size = if header.x_step.abs() == header.y_step.abs() {
        CellSize::Uniform(header.x_step.abs())
    } else {
        CellSize::Separate {
            x: header.x_step.abs(),
            y: header.y_step.abs(),
        }
    };

    let cell_size_metres = match header.cell_size_metres() {
        Ok(size) => Some(size),
        Err(e) => {
            log::warn!("Metric cell size unavailable: {}", e);
            None
        }
    };

    Ok(CanonicalRasterSpec {
        width: header.width,
        height: header.height,
        pixel_type,
        band_count,
        byte_order: ByteOrder::LittleEndian,
        no_data_value: NO_DATA_VALUE,
        cell_size,
        x_ll_corner: header.x_first,
        y_ll_corner,
        cell_size_metres,
        is_elevation_model: is_dem,
    })
}

impl CanonicalRasterSpec {
    /// Bytes a raw payload matching this description must hold
    pub fn payload_bytes(&self) -> u64 {
        let bytes_per_pixel = u64::from(self.pixel_type.bits() / 8);
        (self.width * self.height * self.band_count) as u64 * bytes_per_pixel
    }
}

/// EHdr description path for a payload (`x.unw` becomes `x.hdr`)
pub fn description_path<P: AsRef<Path>>(payload: P) -> Result<PathBuf, ValidationError> {
    let payload = payload.as_ref();
    let is_hdr = payload
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case(HDR_EXTENSION))
        .unwrap_or(false);

    if is_hdr || payload.file_name().is_none() {
        return Err(ValidationError::FilenamePattern(payload.to_path_buf()));
    }
    Ok(payload.with_extension(HDR_EXTENSION))
}

/// Destination of the EHdr file for a standalone ROI_PAC header.
///
/// `x.dem.rsc` maps to `x.hdr` for DEMs; `x.unw.rsc` and `x.tif.rsc` map to
/// `x.hdr` for interferograms. Any other name is rejected.
pub fn resolve_header_destination(
    header_path: &Path,
    is_dem: bool,
) -> Result<PathBuf, ValidationError> {
    let name = header_path.to_string_lossy();
    let suffixes: &[&str] = if is_dem {
        &["dem.rsc"]
    } else {
        &["unw.rsc", "tif.rsc"]
    };

    let stem_end = suffixes
        .iter()
        .filter_map(|suffix| name.rfind(suffix))
        .max()
        .filter(|&i| i > 0);

    match stem_end {
        Some(i) => Ok(PathBuf::from(format!("{}{}", &name[..i], HDR_EXTENSION))),
        None => Err(ValidationError::FilenamePattern(header_path.to_path_buf())),
    }
}

/// Check a payload against its description and write the EHdr file beside it
pub fn translate<P: AsRef<Path>>(
    header: &RasterHeader,
    processor: Processor,
    payload_path: P,
) -> InsarResult<CanonicalRasterSpec> {
    let payload_path = payload_path.as_ref();

    if let Some(found) = header.processor {
        if found != processor {
            return Err(ValidationError::ProcessorMismatch {
                expected: processor,
                found,
            }
            .into());
        }
    }

    let spec = canonical_spec(header)?;

    let actual = fs::metadata(payload_path)
        .map_err(|e| {
            InsarError::Io(io::Error::new(
                e.kind(),
                format!("{}: {}", payload_path.display(), e),
            ))
        })?
        .len();
    let expected = spec.payload_bytes();
    if actual != expected {
        let mut layout = format!("{} band(s) of {}", spec.band_count, spec.pixel_type.ehdr_name());
        if let Some(format) = &header.data_format {
            layout.push_str(&format!(", header declares data_format {}", format));
        }
        return Err(ValidationError::PayloadSize {
            path: payload_path.to_path_buf(),
            expected,
            actual,
            layout,
        }
        .into());
    }

    let dest = description_path(payload_path)?;
    write_ehdr(&spec, &dest)?;

    log::info!(
        "Translated {} payload {} ({}x{}, {} band(s) {})",
        processor,
        payload_path.display(),
        spec.width,
        spec.height,
        spec.band_count,
        spec.pixel_type.ehdr_name()
    );
    Ok(spec)
}

/// Write the EHdr description for a standalone ROI_PAC header file.
///
/// The destination defaults to the name derived by
/// [`resolve_header_destination`]. Returns the path written.
pub fn translate_header_file(header_path: &Path, dest: Option<&Path>) -> InsarResult<PathBuf> {
    let header = crate::io::roipac::parse_header(header_path)?;
    let spec = canonical_spec(&header)?;

    let dest = match dest {
        Some(d) => d.to_path_buf(),
        None => resolve_header_destination(header_path, spec.is_elevation_model)?,
    };
    write_ehdr(&spec, &dest)?;
    Ok(dest)
}

/// Write an EHdr description file
pub fn write_ehdr(spec: &CanonicalRasterSpec, dest: &Path) -> InsarResult<()> {
    let mut file = fs::File::create(dest)?;

    writeln!(file, "ncols {}", spec.width)?;
    writeln!(file, "nrows {}", spec.height)?;

    match spec.cell_size {
        CellSize::Uniform(size) => writeln!(file, "cellsize {}", size)?,
        CellSize::Separate { x, y } => {
            writeln!(file, "xdim {}", x)?;
            writeln!(file, "ydim {}", y)?;
        }
    }

    writeln!(file, "xllcorner {}", spec.x_ll_corner)?;
    writeln!(file, "yllcorner {}", spec.y_ll_corner)?;
    writeln!(file, "byteorder {}", spec.byte_order.ehdr_name())?;

    if !spec.is_elevation_model {
        writeln!(file, "nodata {}", spec.no_data_value)?;
        writeln!(file, "layout bil")?;
        writeln!(file, "nbands {}", spec.band_count)?;
    }

    writeln!(file, "nbits {}", spec.pixel_type.bits())?;
    writeln!(file, "pixeltype {}", spec.pixel_type.ehdr_name())?;

    log::debug!("Wrote EHdr description {}", dest.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tempfile::TempDir;

    fn ifg_header() -> RasterHeader {
        RasterHeader::new(47, 72, 150.91, -34.17, 0.000833333, -0.000833333)
    }

    fn dem_header() -> RasterHeader {
        let mut header = ifg_header();
        header.datum = Some("WGS84".to_string());
        header
    }

    fn read_keys(path: &Path) -> Vec<(String, String)> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| {
                let (k, v) = line.split_once(' ').unwrap();
                (k.to_string(), v.to_string())
            })
            .collect()
    }

    #[test]
    fn test_interferogram_spec() {
        let spec = canonical_spec(&ifg_header()).unwrap();
        assert_eq!(spec.pixel_type, PixelType::Float32);
        assert_eq!(spec.band_count, 2);
        assert_eq!(spec.byte_order, ByteOrder::LittleEndian);
        assert_eq!(spec.no_data_value, 0.0);
        assert_eq!(spec.cell_size, CellSize::Uniform(0.000833333));
        assert_relative_eq!(spec.y_ll_corner, -34.17 - 72.0 * 0.000833333, epsilon = 1e-12);
        assert!(!spec.is_elevation_model);
        assert_eq!(spec.payload_bytes(), 47 * 72 * 2 * 4);

        let (xs, ys) = spec.cell_size_metres.unwrap();
        assert!(xs > 70.0 && xs < 90.0, "xs={}", xs);
        assert!(ys > 85.0 && ys < 100.0, "ys={}", ys);
    }

    #[test]
    fn test_dem_spec() {
        let spec = canonical_spec(&dem_header()).unwrap();
        assert_eq!(spec.pixel_type, PixelType::Int16);
        assert_eq!(spec.band_count, 1);
        assert!(spec.is_elevation_model);
        assert_eq!(spec.payload_bytes(), 47 * 72 * 2);
    }

    #[test]
    fn test_separate_cell_dimensions() {
        let mut header = ifg_header();
        header.y_step = -0.0005;
        let spec = canonical_spec(&header).unwrap();
        assert_eq!(
            spec.cell_size,
            CellSize::Separate {
                x: 0.000833333,
                y: 0.0005
            }
        );
    }

    #[test]
    fn test_cell_dimensions_are_positive() {
        let mut header = ifg_header();
        header.x_step = -0.000833333;
        assert_eq!(
            canonical_spec(&header).unwrap().cell_size,
            CellSize::Uniform(0.000833333)
        );

        header.y_step = -0.0005;
        assert_eq!(
            canonical_spec(&header).unwrap().cell_size,
            CellSize::Separate {
                x: 0.000833333,
                y: 0.0005
            }
        );
    }

    #[test]
    fn test_corner_latitude_bounds() {
        // Poles themselves are valid
        let mut header = RasterHeader::new(10, 10, 0.0, -89.0, 0.1, -0.1);
        let spec = canonical_spec(&header).unwrap();
        assert_relative_eq!(spec.y_ll_corner, -90.0, epsilon = 1e-9);
        assert!(spec.cell_size_metres.is_none());

        header.y_step = -0.2;
        assert!(matches!(
            canonical_spec(&header),
            Err(ValidationError::CornerLatitude(_))
        ));
    }

    #[test]
    fn test_description_path() {
        assert_eq!(
            description_path("/d/geo_060619-061002.unw").unwrap(),
            PathBuf::from("/d/geo_060619-061002.hdr")
        );
        assert_eq!(description_path("/d/dem").unwrap(), PathBuf::from("/d/dem.hdr"));
        assert!(description_path("/d/x.hdr").is_err());
    }

    #[test]
    fn test_resolve_header_destination() {
        let ok = |p: &str, dem: bool| resolve_header_destination(Path::new(p), dem).unwrap();
        assert_eq!(ok("/d/sydney.dem.rsc", true), PathBuf::from("/d/sydney.hdr"));
        assert_eq!(
            ok("/d/geo_060619-061002.unw.rsc", false),
            PathBuf::from("/d/geo_060619-061002.hdr")
        );
        assert_eq!(ok("/d/geo.tif.rsc", false), PathBuf::from("/d/geo.hdr"));

        assert!(resolve_header_destination(Path::new("/d/geo.unw.rsc"), true).is_err());
        assert!(resolve_header_destination(Path::new("/d/sydney.dem.rsc"), false).is_err());
        assert!(resolve_header_destination(Path::new("unw.rsc"), false).is_err());
    }

    #[test]
    fn test_write_interferogram_ehdr() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("ifg.hdr");
        let spec = canonical_spec(&ifg_header()).unwrap();
        write_ehdr(&spec, &dest).unwrap();

        let keys: Vec<String> = read_keys(&dest).into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            [
                "ncols", "nrows", "cellsize", "xllcorner", "yllcorner", "byteorder", "nodata",
                "layout", "nbands", "nbits", "pixeltype"
            ]
        );

        let values = read_keys(&dest);
        assert_eq!(values[0].1, "47");
        assert_eq!(values[1].1, "72");
        assert_eq!(values[5].1, "lsb");
        assert_eq!(values[7].1, "bil");
        assert_eq!(values[8].1, "2");
        assert_eq!(values[9].1, "32");
        assert_eq!(values[10].1, "float");
    }

    #[test]
    fn test_write_dem_ehdr() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("dem.hdr");
        let mut header = dem_header();
        header.y_step = -0.0005;
        write_ehdr(&canonical_spec(&header).unwrap(), &dest).unwrap();

        let keys: Vec<String> = read_keys(&dest).into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            ["ncols", "nrows", "xdim", "ydim", "xllcorner", "yllcorner", "byteorder", "nbits", "pixeltype"]
        );
        assert!(fs::read_to_string(&dest).unwrap().contains("pixeltype signedint"));
    }

    #[test]
    fn test_translate_checks_payload() {
        let dir = TempDir::new().unwrap();
        let payload = dir.path().join("geo_060619-061002.unw");
        let header = ifg_header();

        let missing = translate(&header, Processor::RoiPac, &payload);
        assert!(matches!(missing, Err(InsarError::Io(ref e)) if e.kind() == io::ErrorKind::NotFound));

        fs::write(&payload, vec![0u8; 100]).unwrap();
        let short = translate(&header, Processor::RoiPac, &payload);
        assert!(matches!(
            short,
            Err(InsarError::Validation(ValidationError::PayloadSize { actual: 100, .. }))
        ));

        fs::write(&payload, vec![0u8; 47 * 72 * 8]).unwrap();
        let spec = translate(&header, Processor::RoiPac, &payload).unwrap();
        assert_eq!(spec.band_count, 2);
        assert!(dir.path().join("geo_060619-061002.hdr").exists());
    }

    #[test]
    fn test_payload_size_names_declared_format() {
        let dir = TempDir::new().unwrap();
        let payload = dir.path().join("sydney.dem");
        let mut header = dem_header();
        header.data_format = Some("REAL*4".to_string());

        // Four byte heights, twice what a signed 16 bit DEM needs
        fs::write(&payload, vec![0u8; 47 * 72 * 4]).unwrap();
        let err = translate(&header, Processor::Gamma, &payload).unwrap_err();
        assert!(matches!(
            err,
            InsarError::Validation(ValidationError::PayloadSize { expected, actual, .. })
                if expected == 47 * 72 * 2 && actual == 47 * 72 * 4
        ));
        let message = err.to_string();
        assert!(message.contains("data_format REAL*4"), "{}", message);
        assert!(message.contains("signedint"), "{}", message);
    }

    #[test]
    fn test_translate_header_file() {
        let dir = TempDir::new().unwrap();
        let rsc = dir.path().join("sydney.dem.rsc");
        fs::write(
            &rsc,
            "WIDTH 47\nFILE_LENGTH 72\nX_FIRST 150.91\nX_STEP 0.000833333\n\
             Y_FIRST -34.17\nY_STEP -0.000833333\nDATUM WGS84\n",
        )
        .unwrap();

        let written = translate_header_file(&rsc, None).unwrap();
        assert_eq!(written, dir.path().join("sydney.hdr"));
        assert!(fs::read_to_string(&written).unwrap().contains("pixeltype signedint"));

        let explicit = dir.path().join("other.hdr");
        assert_eq!(translate_header_file(&rsc, Some(&explicit)).unwrap(), explicit);
        assert!(explicit.exists());
    }

    #[test]
    fn test_translate_processor_mismatch() {
        let dir = TempDir::new().unwrap();
        let payload = dir.path().join("x.unw");
        fs::write(&payload, vec![0u8; 47 * 72 * 8]).unwrap();

        let mut header = ifg_header();
        header.processor = Some(Processor::Gamma);
        assert!(matches!(
            translate(&header, Processor::RoiPac, &payload),
            Err(InsarError::Validation(ValidationError::ProcessorMismatch { .. }))
        ));
    }
}
