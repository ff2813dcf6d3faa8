#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

pub const WIDTH: usize = 6;
pub const HEIGHT: usize = 4;

pub const IFG_NAME: &str = "geo_060619-061002.unw";
pub const DEM_NAME: &str = "sydney_trimmed.dem";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn grid_rsc() -> String {
    format!(
        "WIDTH             {}\n\
         FILE_LENGTH       {}\n\
         X_FIRST           150.91\n\
         X_STEP            0.000833333\n\
         Y_FIRST           -34.17\n\
         Y_STEP            -0.000833333\n\
         X_UNIT            degrees\n\
         Y_UNIT            degrees\n",
        WIDTH, HEIGHT
    )
}

/// Phase values with every fourth cell (6 of 24) set to the no-data value
pub fn phase_values() -> Vec<f32> {
    (0..HEIGHT * WIDTH)
        .map(|i| if i % 4 == 0 { 0.0 } else { 0.5 + i as f32 })
        .collect()
}

/// Row interleaved amplitude and phase rows, little endian
fn bil_payload(phase: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(HEIGHT * WIDTH * 8);
    for row in 0..HEIGHT {
        for _ in 0..WIDTH {
            bytes.extend_from_slice(&1.0f32.to_le_bytes());
        }
        for col in 0..WIDTH {
            bytes.extend_from_slice(&phase[row * WIDTH + col].to_le_bytes());
        }
    }
    bytes
}

/// ROI_PAC interferogram `.unw` plus `.unw.rsc`; returns the payload path
pub fn write_roipac_ifg(dir: &Path) -> PathBuf {
    let payload = dir.join(IFG_NAME);
    let rsc = format!("{}WAVELENGTH        0.0562356424\n", grid_rsc());

    fs::write(dir.join(format!("{}.rsc", IFG_NAME)), rsc).expect("write rsc");
    fs::write(&payload, bil_payload(&phase_values())).expect("write payload");
    payload
}

/// ROI_PAC coherence `.cc` plus `.cc.rsc` sharing the interferogram stem
pub fn write_roipac_coherence(dir: &Path) -> PathBuf {
    let name = IFG_NAME.replace(".unw", ".cc");
    let payload = dir.join(&name);
    let coherence: Vec<f32> = (0..HEIGHT * WIDTH).map(|i| i as f32 / 24.0).collect();

    fs::write(dir.join(format!("{}.rsc", name)), grid_rsc()).expect("write rsc");
    fs::write(&payload, bil_payload(&coherence)).expect("write payload");
    payload
}

/// ROI_PAC DEM `.dem` plus `.dem.rsc`; returns the payload path
pub fn write_roipac_dem(dir: &Path) -> PathBuf {
    let payload = dir.join(DEM_NAME);
    let rsc = format!(
        "{}DATUM             WGS84\nPROJECTION        LATLON\n",
        grid_rsc()
    );

    let heights: Vec<u8> = (0..(HEIGHT * WIDTH) as i16)
        .flat_map(|h| (h * 10).to_le_bytes())
        .collect();

    fs::write(dir.join(format!("{}.rsc", DEM_NAME)), rsc).expect("write rsc");
    fs::write(&payload, heights).expect("write payload");
    payload
}

/// GAMMA interferogram and parameter file; returns (payload, header)
pub fn write_gamma_ifg(dir: &Path) -> (PathBuf, PathBuf) {
    let payload = dir.join("20060619-20061002_utm.unw");
    let header = dir.join("20060619-20061002_utm.unw.par");
    let par = format!(
        "width:                    {}\n\
         nlines:                   {}\n\
         corner_lat:     -34.17  decimal degrees\n\
         corner_lon:     150.91  decimal degrees\n\
         post_lat:   -8.33333e-04  decimal degrees\n\
         post_lon:    8.33333e-04  decimal degrees\n\
         radar_frequency:  5.3310040e+09   Hz\n",
        WIDTH, HEIGHT
    );

    fs::write(&header, par).expect("write par");
    fs::write(&payload, bil_payload(&phase_values())).expect("write payload");
    (payload, header)
}
