//! Conversion of ROI_PAC and GAMMA products into canonical GeoTIFFs

use crate::io::{gamma, roipac, translate};
use crate::types::{
    metadata_keys, CanonicalRasterSpec, GeoTransform, InsarResult, PixelType, Processor,
    RasterHeader, ValidationError, NO_DATA_VALUE,
};
use gdal::raster::{Buffer, GdalType};
use gdal::spatial_ref::SpatialRef;
use gdal::{Dataset, DatasetOptions, DriverManager, Metadata};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// EPSG code of canonical rasters (WGS84 geographic)
pub const OUTPUT_EPSG: u32 = 4326;

/// Extension of coherence products
pub const COHERENCE_EXTENSION: &str = "cc";

const TIF_EXTENSION: &str = "tif";

/// Batch conversion parameters
#[derive(Debug, Clone)]
pub struct ConversionParams {
    pub processor: Processor,
    /// Directory for converted interferograms and DEMs
    pub output_dir: PathBuf,
    /// Separate directory for converted coherence (`.cc`) files
    pub coherence_dir: Option<PathBuf>,
    pub no_data_value: f64,
    /// Convert files in parallel (needs the `parallel` feature)
    pub parallel: bool,
}

impl Default for ConversionParams {
    fn default() -> Self {
        Self {
            processor: Processor::RoiPac,
            output_dir: PathBuf::from("."),
            coherence_dir: None,
            no_data_value: NO_DATA_VALUE,
            parallel: true,
        }
    }
}

/// A payload and the header describing it
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionJob {
    pub payload: PathBuf,
    pub header: PathBuf,
}

impl ConversionJob {
    pub fn new<P: AsRef<Path>, H: AsRef<Path>>(payload: P, header: H) -> Self {
        Self {
            payload: payload.as_ref().to_path_buf(),
            header: header.as_ref().to_path_buf(),
        }
    }

    /// ROI_PAC payloads keep their header alongside as `payload.rsc`
    pub fn roipac<P: AsRef<Path>>(payload: P) -> Self {
        Self::new(payload.as_ref(), roipac::header_path(payload.as_ref()))
    }

    pub fn is_coherence(&self) -> bool {
        self.payload
            .extension()
            .map(|ext| ext == COHERENCE_EXTENSION)
            .unwrap_or(false)
    }
}

/// GeoTIFF name for an input file: `name.ext` becomes `name_ext.tif`.
///
/// Inputs already named `.tif` keep their name. The result lives in
/// `output_dir`, or beside the input when no directory is given.
pub fn output_tiff_filename(input: &Path, output_dir: Option<&Path>) -> Result<PathBuf, ValidationError> {
    let invalid = || ValidationError::FilenamePattern(input.to_path_buf());

    let stem = input.file_stem().ok_or_else(invalid)?.to_string_lossy();
    let ext = input.extension().ok_or_else(invalid)?.to_string_lossy();
    if stem.is_empty() || ext.is_empty() {
        return Err(invalid());
    }

    let name = if ext == TIF_EXTENSION {
        format!("{}.{}", stem, TIF_EXTENSION)
    } else {
        format!("{}_{}.{}", stem, ext, TIF_EXTENSION)
    };

    let dir = match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => input.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    Ok(dir.join(name))
}

/// Parse a header in the dialect of `processor`
pub fn parse_header(header_path: &Path, processor: Processor) -> InsarResult<RasterHeader> {
    match processor {
        Processor::RoiPac => roipac::parse_header(header_path),
        Processor::Gamma => gamma::parse_header(header_path),
    }
}

/// Convert one header and payload pair into a GeoTIFF in `output_dir`.
///
/// Returns `Ok(None)` without touching anything when the GeoTIFF already
/// exists.
pub fn convert(
    payload: &Path,
    header_path: &Path,
    processor: Processor,
    output_dir: &Path,
    no_data_value: f64,
) -> InsarResult<Option<PathBuf>> {
    let dest = output_tiff_filename(payload, Some(output_dir))?;
    write_if_missing(payload, header_path, processor, &dest, no_data_value)
}

fn write_if_missing(
    payload: &Path,
    header_path: &Path,
    processor: Processor,
    dest: &Path,
    no_data_value: f64,
) -> InsarResult<Option<PathBuf>> {
    if dest.exists() {
        log::info!("Full-res GeoTIFF already exists: {}", dest.display());
        return Ok(None);
    }

    let header = parse_header(header_path, processor)?;
    let spec = translate::translate(&header, processor, payload)?;
    write_geotiff(&header, &spec, processor, payload, dest, no_data_value)?;

    Ok(Some(dest.to_path_buf()))
}

/// Copy a described payload into a GeoTIFF carrying the header metadata
///
/// The GeoTIFF is built at a `.tif.part` sibling and renamed onto `dest` once
/// every band is written, so a failed conversion never leaves `dest` behind.
pub fn write_geotiff(
    header: &RasterHeader,
    spec: &CanonicalRasterSpec,
    processor: Processor,
    payload: &Path,
    dest: &Path,
    no_data_value: f64,
) -> InsarResult<()> {
    log::info!("Writing GeoTIFF: {}", dest.display());

    let srs = SpatialRef::from_epsg(OUTPUT_EPSG)?;
    let source = Dataset::open_ex(
        payload,
        DatasetOptions {
            allowed_drivers: Some(&["EHdr"]),
            ..Default::default()
        },
    )?;

    let partial = partial_path(dest);
    if let Err(e) = write_dataset(&source, &srs, header, spec, processor, &partial, no_data_value) {
        if partial.exists() {
            log::debug!("Removing partial GeoTIFF: {}", partial.display());
            let _ = fs::remove_file(&partial);
        }
        return Err(e);
    }
    fs::rename(&partial, dest)?;

    log::info!(
        "GeoTIFF written: {} ({}x{}, {} band(s))",
        dest.display(),
        spec.width,
        spec.height,
        spec.band_count
    );
    Ok(())
}

/// In-progress path of a GeoTIFF, e.g. `x_unw.tif.part`
pub fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_os_string();
    name.push(".part");
    PathBuf::from(name)
}

/// Create, fill and close the GeoTIFF at `path`
fn write_dataset(
    source: &Dataset,
    srs: &SpatialRef,
    header: &RasterHeader,
    spec: &CanonicalRasterSpec,
    processor: Processor,
    path: &Path,
    no_data_value: f64,
) -> InsarResult<()> {
    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let mut dataset = match spec.pixel_type {
        PixelType::Int16 => driver.create_with_band_type::<i16, _>(
            path,
            spec.width as isize,
            spec.height as isize,
            spec.band_count as isize,
        )?,
        PixelType::Float32 => driver.create_with_band_type::<f32, _>(
            path,
            spec.width as isize,
            spec.height as isize,
            spec.band_count as isize,
        )?,
    };

    dataset.set_geo_transform(&GeoTransform::from_header(header).to_gdal())?;
    dataset.set_spatial_ref(srs)?;

    for (key, value) in metadata_items(header, processor) {
        dataset.set_metadata_item(key, &value, "")?;
    }

    match spec.pixel_type {
        PixelType::Int16 => copy_bands::<i16>(source, &dataset, spec, no_data_value)?,
        PixelType::Float32 => copy_bands::<f32>(source, &dataset, spec, no_data_value)?,
    }
    // Dropping the dataset flushes it to disk
    drop(dataset);
    Ok(())
}

fn copy_bands<T: GdalType + Copy>(
    source: &Dataset,
    dest: &Dataset,
    spec: &CanonicalRasterSpec,
    no_data_value: f64,
) -> InsarResult<()> {
    let size = (spec.width, spec.height);

    for index in 1..=spec.band_count as isize {
        let band_data = source.rasterband(index)?.read_as::<T>((0, 0), size, size, None)?;

        let mut rasterband = dest.rasterband(index)?;
        rasterband.write((0, 0), size, &Buffer::new(size, band_data.data))?;
        rasterband.set_no_data_value(Some(no_data_value))?;
    }
    Ok(())
}

/// Metadata items recorded in a canonical GeoTIFF
fn metadata_items(header: &RasterHeader, processor: Processor) -> Vec<(&'static str, String)> {
    let mut items = vec![(metadata_keys::PROCESSOR, processor.to_string())];

    if header.is_elevation_model() {
        items.push((metadata_keys::DATA_TYPE, "DEM".to_string()));
    } else {
        items.push((metadata_keys::DATA_TYPE, "ORIG".to_string()));
    }

    if let Some(datum) = &header.datum {
        items.push((metadata_keys::DATUM, datum.clone()));
    }
    if let Some(dates) = header.acquisition {
        let fmt = |d: chrono::NaiveDate| d.format(metadata_keys::DATE_FORMAT).to_string();
        items.push((metadata_keys::MASTER_DATE, fmt(dates.master)));
        items.push((metadata_keys::SLAVE_DATE, fmt(dates.slave)));
        items.push((metadata_keys::TIME_SPAN_YEAR, dates.time_span_years.to_string()));
    }
    if let Some(wavelength) = header.wavelength {
        items.push((metadata_keys::WAVELENGTH, wavelength.to_string()));
    }
    items
}

/// Batch converter for many header and payload pairs
pub struct Converter {
    params: ConversionParams,
}

impl Converter {
    pub fn new(params: ConversionParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ConversionParams {
        &self.params
    }

    /// Output path of a job; coherence files go to the coherence directory when set
    pub fn destination(&self, job: &ConversionJob) -> Result<PathBuf, ValidationError> {
        let dir = match (&self.params.coherence_dir, job.is_coherence()) {
            (Some(dir), true) => dir,
            _ => &self.params.output_dir,
        };
        output_tiff_filename(&job.payload, Some(dir))
    }

    pub fn convert_job(&self, job: &ConversionJob) -> InsarResult<Option<PathBuf>> {
        let dest = self.destination(job)?;
        write_if_missing(
            &job.payload,
            &job.header,
            self.params.processor,
            &dest,
            self.params.no_data_value,
        )
    }

    /// Convert every job independently, one result per job in input order
    ///
    /// Jobs whose payloads share an EHdr description (`x.unw` and `x.cc` both
    /// use `x.hdr`) run one after another inside their group.
    pub fn convert_all(&self, jobs: &[ConversionJob]) -> Vec<InsarResult<Option<PathBuf>>> {
        log::info!("Converting {} input file(s) to GeoTIFF", jobs.len());

        let groups = description_groups(jobs);
        let run_group = |group: &Vec<usize>| -> Vec<(usize, InsarResult<Option<PathBuf>>)> {
            group.iter().map(|&i| (i, self.convert_job(&jobs[i]))).collect()
        };

        #[cfg(feature = "parallel")]
        {
            if self.params.parallel {
                use rayon::prelude::*;

                log::info!("Running GeoTIFF conversion in parallel ({} group(s))", groups.len());
                return in_job_order(groups.par_iter().flat_map_iter(run_group).collect());
            }
        }

        log::info!("Running GeoTIFF conversion in serial");
        in_job_order(groups.iter().flat_map(run_group).collect())
    }
}

fn in_job_order(
    mut indexed: Vec<(usize, InsarResult<Option<PathBuf>>)>,
) -> Vec<InsarResult<Option<PathBuf>>> {
    indexed.sort_by_key(|(index, _)| *index);
    indexed.into_iter().map(|(_, result)| result).collect()
}

/// Job indices grouped by the EHdr description their payload is given,
/// groups ordered by first appearance
pub fn description_groups(jobs: &[ConversionJob]) -> Vec<Vec<usize>> {
    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut by_description: HashMap<PathBuf, usize> = HashMap::new();

    for (index, job) in jobs.iter().enumerate() {
        let key = translate::description_path(&job.payload).unwrap_or_else(|_| job.payload.clone());
        match by_description.get(&key) {
            Some(&group) => groups[group].push(index),
            None => {
                by_description.insert(key, groups.len());
                groups.push(vec![index]);
            }
        }
    }
    groups
}

/// Convert a batch of jobs with the given parameters
pub fn convert_all(jobs: &[ConversionJob], params: &ConversionParams) -> Vec<InsarResult<Option<PathBuf>>> {
    Converter::new(params.clone()).convert_all(jobs)
}
