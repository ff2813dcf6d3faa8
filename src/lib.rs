//! insarprep: ROI_PAC and GAMMA interferogram conversion
//!
//! Parses the header dialects of the ROI_PAC and GAMMA interferometry chains,
//! converts header and payload pairs into canonical GeoTIFFs, and opens those
//! as typed [`Interferogram`] and [`Elevation`] handles.

pub mod types;
pub mod io;
pub mod core;

// Re-export main types and functions for easier access
pub use crate::types::{
    AcquisitionDates, CanonicalRasterSpec, GeoTransform, InsarError, InsarResult, Processor,
    RasterHeader, NO_DATA_VALUE,
};

pub use crate::io::{Elevation, Interferogram, Raster};
pub use crate::core::{
    convert, convert_all, output_tiff_filename, ConversionJob, ConversionParams, Converter,
};

#[cfg(feature = "python")]
mod python {
    use crate::core::geodesy;
    use crate::io::{Interferogram, Raster};
    use crate::types::{InsarError, Processor};
    use numpy::{PyArray2, ToPyArray};
    use pyo3::exceptions::{PyIOError, PyRuntimeError, PyValueError};
    use pyo3::prelude::*;
    use std::path::Path;

    fn to_py_err(e: InsarError) -> PyErr {
        match e {
            InsarError::Io(_) => PyErr::new::<PyIOError, _>(format!("{}", e)),
            InsarError::State(_) | InsarError::Gdal(_) => {
                PyErr::new::<PyRuntimeError, _>(format!("{}", e))
            }
            _ => PyErr::new::<PyValueError, _>(format!("{}", e)),
        }
    }

    /// Python module definition
    #[pymodule]
    fn _core(_py: Python, m: &PyModule) -> PyResult<()> {
        m.add_class::<PyInterferogram>()?;
        m.add_function(wrap_pyfunction!(convert, m)?)?;
        m.add_function(wrap_pyfunction!(utm_zone, m)?)?;
        m.add_function(wrap_pyfunction!(cell_size, m)?)?;
        Ok(())
    }

    /// Convert one header and payload pair; returns None when the GeoTIFF exists
    #[pyfunction]
    #[pyo3(signature = (payload, header, processor, output_dir, no_data_value = 0.0))]
    fn convert(
        payload: String,
        header: String,
        processor: String,
        output_dir: String,
        no_data_value: f64,
    ) -> PyResult<Option<String>> {
        let processor: Processor = processor
            .parse()
            .map_err(|e| PyErr::new::<PyValueError, _>(format!("{}", e)))?;

        let dest = crate::core::convert(
            Path::new(&payload),
            Path::new(&header),
            processor,
            Path::new(&output_dir),
            no_data_value,
        )
        .map_err(to_py_err)?;

        Ok(dest.map(|p| p.to_string_lossy().into_owned()))
    }

    #[pyfunction]
    fn utm_zone(longitude: f64) -> u8 {
        geodesy::utm_zone(longitude)
    }

    #[pyfunction]
    fn cell_size(latitude: f64, longitude: f64, x_step: f64, y_step: f64) -> PyResult<(f64, f64)> {
        geodesy::cell_size(latitude, longitude, x_step, y_step)
            .map_err(|e| PyErr::new::<PyValueError, _>(format!("{}", e)))
    }

    /// Python wrapper for Interferogram
    #[pyclass(name = "Interferogram", unsendable)]
    struct PyInterferogram {
        inner: Interferogram,
    }

    #[pymethods]
    impl PyInterferogram {
        #[new]
        fn new(path: String) -> Self {
            PyInterferogram {
                inner: Interferogram::new(path),
            }
        }

        #[pyo3(signature = (readonly = false))]
        fn open(&mut self, readonly: bool) -> PyResult<()> {
            self.inner.open(readonly).map_err(to_py_err)
        }

        fn close(&mut self) -> PyResult<()> {
            self.inner.close().map_err(|e| to_py_err(e.into()))
        }

        #[getter]
        fn is_open(&self) -> bool {
            self.inner.is_open()
        }

        #[getter]
        fn is_read_only(&self) -> bool {
            self.inner.is_read_only()
        }

        fn phase_data<'py>(&mut self, py: Python<'py>) -> PyResult<&'py PyArray2<f32>> {
            let data = self.inner.phase_data().map_err(to_py_err)?;
            Ok(data.to_pyarray(py))
        }

        fn convert_to_nans(&mut self) -> PyResult<()> {
            self.inner.convert_to_nans().map_err(to_py_err)
        }

        #[getter]
        fn nan_converted(&self) -> bool {
            self.inner.nan_converted()
        }

        #[getter]
        fn nan_count(&mut self) -> PyResult<usize> {
            self.inner.nan_count().map_err(to_py_err)
        }

        #[getter]
        fn nan_fraction(&mut self) -> PyResult<f64> {
            self.inner.nan_fraction().map_err(to_py_err)
        }

        fn write_modified_phase(&mut self) -> PyResult<()> {
            self.inner.write_modified_phase(None).map_err(to_py_err)
        }

        #[getter]
        fn x_size(&self) -> PyResult<f64> {
            self.inner.x_size().map_err(to_py_err)
        }

        #[getter]
        fn y_size(&self) -> PyResult<f64> {
            self.inner.y_size().map_err(to_py_err)
        }

        #[getter]
        fn time_span(&self) -> PyResult<Option<f64>> {
            self.inner.time_span_years().map_err(|e| to_py_err(e.into()))
        }

        fn __repr__(&self) -> String {
            format!("Interferogram('{}')", self.inner.path().display())
        }
    }
}
