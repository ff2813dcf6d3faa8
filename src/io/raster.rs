//! Interferogram and DEM handles over canonical GeoTIFF rasters
//!
//! A handle starts unopened, is opened exactly once (read-only or writable)
//! and ends closed. Band data is read on first access and cached; the cached
//! array is what statistics run over and what gets written back.

use crate::types::{
    metadata_keys, AcquisitionDates, GeoTransform, InsarError, InsarResult, ParseError,
    RasterHeader, StateError, ValidationError, NO_DATA_VALUE,
};
use chrono::NaiveDate;
use gdal::raster::{Buffer, RasterBand};
use gdal::{Dataset, DatasetOptions, GdalOpenFlags, Metadata};
use ndarray::{Array2, ArrayView1, ArrayView2, ArrayViewMut2};
use std::io;
use std::path::{Path, PathBuf};

/// Tolerance when matching cells against the no-data value
const NODATA_TOLERANCE: f32 = 1e-6;

/// Lifecycle of a raster handle
pub enum HandleState {
    Unopened,
    ReadOnly(Dataset),
    Writable(Dataset),
    Closed,
}

impl HandleState {
    fn dataset(&self) -> Option<&Dataset> {
        match self {
            HandleState::ReadOnly(ds) | HandleState::Writable(ds) => Some(ds),
            _ => None,
        }
    }
}

impl std::fmt::Debug for HandleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            HandleState::Unopened => "Unopened",
            HandleState::ReadOnly(_) => "ReadOnly",
            HandleState::Writable(_) => "Writable",
            HandleState::Closed => "Closed",
        };
        f.write_str(name)
    }
}

/// File, dataset and header shared by every raster handle
#[derive(Debug)]
pub struct RasterFile {
    path: PathBuf,
    state: HandleState,
    header: Option<RasterHeader>,
    nodata_value: f64,
}

impl RasterFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            state: HandleState::Unopened,
            header: None,
            nodata_value: NO_DATA_VALUE,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open the dataset and rebuild the header from it
    pub fn open(&mut self, readonly: bool) -> InsarResult<()> {
        match self.state {
            HandleState::Unopened => {}
            HandleState::Closed => return Err(StateError::Closed(self.path.clone()).into()),
            _ => return Err(StateError::AlreadyOpen(self.path.clone()).into()),
        }

        log::debug!(
            "Opening {} ({})",
            self.path.display(),
            if readonly { "read-only" } else { "writable" }
        );

        let dataset = if readonly {
            Dataset::open(&self.path)?
        } else {
            Dataset::open_ex(
                &self.path,
                DatasetOptions {
                    open_flags: GdalOpenFlags::GDAL_OF_UPDATE | GdalOpenFlags::GDAL_OF_RASTER,
                    ..Default::default()
                },
            )?
        };

        let header = header_from_dataset(&dataset)?;
        self.nodata_value = dataset
            .rasterband(1)?
            .no_data_value()
            .unwrap_or(NO_DATA_VALUE);
        self.header = Some(header);

        self.state = if readonly {
            HandleState::ReadOnly(dataset)
        } else {
            HandleState::Writable(dataset)
        };
        Ok(())
    }

    /// Release the dataset. Closed handles cannot be reopened.
    pub fn close(&mut self) -> Result<(), StateError> {
        match self.state {
            HandleState::ReadOnly(_) | HandleState::Writable(_) => {
                self.state = HandleState::Closed;
                log::debug!("Closed {}", self.path.display());
                Ok(())
            }
            HandleState::Unopened => Err(StateError::NotOpen(self.path.clone())),
            HandleState::Closed => Err(StateError::Closed(self.path.clone())),
        }
    }

    pub fn is_open(&self) -> bool {
        self.state.dataset().is_some()
    }

    /// Anything but a writable open handle counts as read-only
    pub fn is_read_only(&self) -> bool {
        !matches!(self.state, HandleState::Writable(_))
    }

    fn not_open(&self) -> StateError {
        match self.state {
            HandleState::Closed => StateError::Closed(self.path.clone()),
            _ => StateError::NotOpen(self.path.clone()),
        }
    }

    pub fn dataset(&self) -> Result<&Dataset, StateError> {
        self.state.dataset().ok_or_else(|| self.not_open())
    }

    pub fn header(&self) -> Result<&RasterHeader, StateError> {
        match (&self.header, self.is_open()) {
            (Some(header), true) => Ok(header),
            _ => Err(self.not_open()),
        }
    }

    pub fn nodata_value(&self) -> f64 {
        self.nodata_value
    }

    pub fn set_nodata_value(&mut self, value: f64) {
        self.nodata_value = value;
    }

    pub fn band_count(&self) -> Result<usize, StateError> {
        Ok(self.dataset()?.raster_count() as usize)
    }

    pub fn band(&self, index: isize) -> InsarResult<RasterBand<'_>> {
        Ok(self.dataset()?.rasterband(index)?)
    }

    /// Read a whole band as a (rows, columns) array
    pub fn read_band(&self, index: isize) -> InsarResult<Array2<f32>> {
        let dataset = self.dataset()?;
        let (width, height) = dataset.raster_size();

        let band_data = dataset
            .rasterband(index)?
            .read_as::<f32>((0, 0), (width, height), (width, height), None)?;
        let len = band_data.data.len();

        Array2::from_shape_vec((height, width), band_data.data).map_err(|_| {
            InsarError::from(ValidationError::ShapeMismatch {
                expected: (height, width),
                actual: (len / width.max(1), width),
            })
        })
    }

    /// Overwrite a whole band. Read-only handles are refused.
    pub fn write_band(&self, index: isize, data: &Array2<f32>) -> InsarResult<()> {
        let dataset = match &self.state {
            HandleState::Writable(ds) => ds,
            HandleState::ReadOnly(_) => {
                return Err(InsarError::Io(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    format!("{} is open read-only", self.path.display()),
                )))
            }
            _ => return Err(self.not_open().into()),
        };

        let (width, height) = dataset.raster_size();
        if data.dim() != (height, width) {
            return Err(ValidationError::ShapeMismatch {
                expected: (height, width),
                actual: data.dim(),
            }
            .into());
        }

        let flat: Vec<f32> = data.iter().copied().collect();
        let mut rasterband = dataset.rasterband(index)?;
        rasterband.write((0, 0), (width, height), &Buffer::new((width, height), flat))?;

        log::debug!("Wrote band {} of {}", index, self.path.display());
        Ok(())
    }
}

/// Rebuild a canonical header from a GeoTIFF's geotransform and metadata
pub fn header_from_dataset(dataset: &Dataset) -> InsarResult<RasterHeader> {
    let gt = GeoTransform::from_gdal(dataset.geo_transform()?);
    let (width, height) = dataset.raster_size();

    let mut header = RasterHeader::new(
        width,
        height,
        gt.top_left_x,
        gt.top_left_y,
        gt.pixel_width,
        gt.pixel_height,
    );

    let item = |key: &str| dataset.metadata_item(key, "");
    let parse_date = |s: String| {
        NaiveDate::parse_from_str(&s, metadata_keys::DATE_FORMAT)
            .map_err(|_| ParseError::InvalidDate(s))
    };
    let parse_float = |key: &str, s: String| {
        s.trim().parse::<f64>().map_err(|_| ParseError::InvalidValue {
            key: key.to_string(),
            value: s,
        })
    };

    if let (Some(master), Some(slave)) = (
        item(metadata_keys::MASTER_DATE),
        item(metadata_keys::SLAVE_DATE),
    ) {
        header.acquisition = Some(AcquisitionDates::new(parse_date(master)?, parse_date(slave)?));
    }

    header.datum = item(metadata_keys::DATUM);
    header.wavelength = item(metadata_keys::WAVELENGTH)
        .map(|s| parse_float(metadata_keys::WAVELENGTH, s))
        .transpose()?;
    header.processor = item(metadata_keys::PROCESSOR)
        .map(|s| s.parse())
        .transpose()?;

    Ok(header)
}

/// Operations common to interferogram and DEM handles
pub trait Raster {
    fn file(&self) -> &RasterFile;

    fn file_mut(&mut self) -> &mut RasterFile;

    /// Drop anything derived from band data
    fn clear_cache(&mut self);

    fn open(&mut self, readonly: bool) -> InsarResult<()> {
        self.file_mut().open(readonly)?;
        self.clear_cache();
        Ok(())
    }

    fn close(&mut self) -> Result<(), StateError> {
        self.file_mut().close()?;
        self.clear_cache();
        Ok(())
    }

    fn path(&self) -> &Path {
        self.file().path()
    }

    fn is_open(&self) -> bool {
        self.file().is_open()
    }

    fn is_read_only(&self) -> bool {
        self.file().is_read_only()
    }

    fn metadata(&self) -> Result<&RasterHeader, StateError> {
        self.file().header()
    }

    fn nodata_value(&self) -> f64 {
        self.file().nodata_value()
    }

    fn set_nodata_value(&mut self, value: f64) {
        self.file_mut().set_nodata_value(value);
    }

    fn num_cells(&self) -> Result<usize, StateError> {
        Ok(self.metadata()?.num_cells())
    }

    fn shape(&self) -> Result<(usize, usize), StateError> {
        Ok(self.metadata()?.shape())
    }

    fn x_centre(&self) -> Result<usize, StateError> {
        Ok(self.metadata()?.x_centre())
    }

    fn y_centre(&self) -> Result<usize, StateError> {
        Ok(self.metadata()?.y_centre())
    }

    fn lat_centre(&self) -> Result<f64, StateError> {
        Ok(self.metadata()?.lat_centre())
    }

    fn long_centre(&self) -> Result<f64, StateError> {
        Ok(self.metadata()?.long_centre())
    }

    /// Cell width in metres at the raster centre
    fn x_size(&self) -> InsarResult<f64> {
        Ok(self.metadata()?.x_size()?)
    }

    /// Cell height in metres at the raster centre
    fn y_size(&self) -> InsarResult<f64> {
        Ok(self.metadata()?.y_size()?)
    }
}

/// Handle over a converted interferogram (amplitude and phase bands)
#[derive(Debug)]
pub struct Interferogram {
    file: RasterFile,
    phase: Option<Array2<f32>>,
    nan_converted: bool,
    nan_fraction: Option<f64>,
}

impl Interferogram {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            file: RasterFile::new(path),
            phase: None,
            nan_converted: false,
            nan_fraction: None,
        }
    }

    /// Phase is band 2 of two band rasters and band 1 otherwise
    fn phase_band_index(&self) -> Result<isize, StateError> {
        Ok(if self.file.band_count()? >= 2 { 2 } else { 1 })
    }

    pub fn phase_band(&self) -> InsarResult<RasterBand<'_>> {
        self.file.band(self.phase_band_index()?)
    }

    fn load_phase(&mut self) -> InsarResult<&mut Array2<f32>> {
        let data = match self.phase.take() {
            Some(data) => data,
            None => {
                let index = self.phase_band_index()?;
                self.file.read_band(index)?
            }
        };
        Ok(self.phase.insert(data))
    }

    /// Phase values, read from disk on first access
    pub fn phase_data(&mut self) -> InsarResult<ArrayView2<'_, f32>> {
        Ok(self.load_phase()?.view())
    }

    /// Mutable access to the cached phase; pair with [`Self::write_modified_phase`]
    pub fn phase_data_mut(&mut self) -> InsarResult<ArrayViewMut2<'_, f32>> {
        self.nan_fraction = None;
        Ok(self.load_phase()?.view_mut())
    }

    pub fn phase_rows(&mut self) -> InsarResult<impl Iterator<Item = ArrayView1<'_, f32>> + '_> {
        let data: &Array2<f32> = self.load_phase()?;
        Ok(data.rows().into_iter())
    }

    /// Replace no-data cells with NaN. Repeated calls do nothing.
    pub fn convert_to_nans(&mut self) -> InsarResult<()> {
        if self.nan_converted {
            return Ok(());
        }

        let nodata = self.file.nodata_value() as f32;
        self.load_phase()?.mapv_inplace(|v| {
            if (v - nodata).abs() <= NODATA_TOLERANCE {
                f32::NAN
            } else {
                v
            }
        });

        self.nan_converted = true;
        self.nan_fraction = None;
        log::debug!("Converted no-data cells to NaN in {}", self.file.path().display());
        Ok(())
    }

    pub fn nan_converted(&self) -> bool {
        self.nan_converted
    }

    /// NaN cells after [`Self::convert_to_nans`], raw no-data cells before
    pub fn nan_count(&mut self) -> InsarResult<usize> {
        let converted = self.nan_converted;
        let nodata = self.file.nodata_value() as f32;
        let data = self.load_phase()?;

        let count = if converted {
            data.iter().filter(|v| v.is_nan()).count()
        } else {
            data.iter().filter(|&&v| v == nodata).count()
        };
        Ok(count)
    }

    /// Share of missing cells, cached until the phase changes
    pub fn nan_fraction(&mut self) -> InsarResult<f64> {
        if let Some(fraction) = self.nan_fraction {
            return Ok(fraction);
        }

        let num_cells = self.num_cells()?;
        let fraction = if num_cells == 0 {
            0.0
        } else {
            self.nan_count()? as f64 / num_cells as f64
        };
        self.nan_fraction = Some(fraction);
        Ok(fraction)
    }

    /// Write the cached phase, or a replacement array, to the phase band
    pub fn write_modified_phase(&mut self, data: Option<Array2<f32>>) -> InsarResult<()> {
        if self.file.is_open() && self.file.is_read_only() {
            return Err(InsarError::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("{} is open read-only", self.file.path().display()),
            )));
        }

        if let Some(data) = data {
            let expected = self.shape()?;
            if data.dim() != expected {
                return Err(ValidationError::ShapeMismatch {
                    expected,
                    actual: data.dim(),
                }
                .into());
            }
            self.phase = Some(data);
            self.nan_fraction = None;
        }

        let index = self.phase_band_index()?;
        self.load_phase()?;
        if let Some(phase) = &self.phase {
            self.file.write_band(index, phase)?;
        }
        log::info!("Wrote modified phase to {}", self.file.path().display());
        Ok(())
    }

    pub fn master_date(&self) -> Result<Option<NaiveDate>, StateError> {
        Ok(self.metadata()?.master_date())
    }

    pub fn slave_date(&self) -> Result<Option<NaiveDate>, StateError> {
        Ok(self.metadata()?.slave_date())
    }

    pub fn time_span_years(&self) -> Result<Option<f64>, StateError> {
        Ok(self.metadata()?.time_span_years())
    }

    pub fn wavelength(&self) -> Result<Option<f64>, StateError> {
        Ok(self.metadata()?.wavelength)
    }
}

impl Raster for Interferogram {
    fn file(&self) -> &RasterFile {
        &self.file
    }

    fn file_mut(&mut self) -> &mut RasterFile {
        &mut self.file
    }

    fn clear_cache(&mut self) {
        self.phase = None;
        self.nan_converted = false;
        self.nan_fraction = None;
    }
}

/// Handle over a converted digital elevation model
#[derive(Debug)]
pub struct Elevation {
    file: RasterFile,
    heights: Option<Array2<f32>>,
}

impl Elevation {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            file: RasterFile::new(path),
            heights: None,
        }
    }

    pub fn height_band(&self) -> InsarResult<RasterBand<'_>> {
        self.file.band(1)
    }

    /// Heights, read from disk on first access
    pub fn height_data(&mut self) -> InsarResult<ArrayView2<'_, f32>> {
        let data = match self.heights.take() {
            Some(data) => data,
            None => self.file.read_band(1)?,
        };
        Ok(self.heights.insert(data).view())
    }
}

impl Raster for Elevation {
    fn file(&self) -> &RasterFile {
        &self.file
    }

    fn file_mut(&mut self) -> &mut RasterFile {
        &mut self.file
    }

    fn clear_cache(&mut self) {
        self.heights = None;
    }
}
