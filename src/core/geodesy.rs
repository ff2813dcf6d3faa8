//! UTM zone lookup and metric cell sizes for geographic rasters
//!
//! Cell sizes are measured by projecting a cell's two opposite corners into
//! the UTM zone of the cell on the WGS84 ellipsoid and differencing them.

use crate::types::GeodesyError;

/// WGS84 semi-major axis (m)
const WGS84_A: f64 = 6_378_137.0;

/// WGS84 flattening
const WGS84_F: f64 = 1.0 / 298.257_223_563;

/// WGS84 semi-minor axis (m)
const WGS84_B: f64 = WGS84_A * (1.0 - WGS84_F);

/// First eccentricity squared
const WGS84_E2: f64 = 2.0 * WGS84_F - WGS84_F * WGS84_F;

/// Second eccentricity squared
const WGS84_EP2: f64 = WGS84_E2 / (1.0 - WGS84_E2);

/// UTM central scale factor
const UTM_K0: f64 = 0.9996;

/// Northern limit of the UTM system
pub const UTM_MAX_LATITUDE: f64 = 84.0;

/// Southern limit of the UTM system
pub const UTM_MIN_LATITUDE: f64 = -80.0;

/// UTM zone (1-60) containing a longitude.
///
/// Accepts both the [-180, 180] and [0, 360] conventions. 180 degrees east
/// belongs to zone 60 rather than wrapping to zone 1.
pub fn utm_zone(longitude: f64) -> u8 {
    if longitude == 180.0 {
        return 60;
    }

    let wrapped = (longitude + 180.0).rem_euclid(360.0) - 180.0;
    let zone = ((wrapped + 180.0) / 6.0).floor() as i32 + 1;
    zone.clamp(1, 60) as u8
}

/// Central meridian of a UTM zone in degrees
pub fn utm_central_meridian(zone: u8) -> f64 {
    f64::from(zone) * 6.0 - 183.0
}

/// Convert a cell's degree steps to metres at the given location.
///
/// Returns absolute (x, y) sizes. Fails for latitudes outside the UTM band
/// (north of 84 degrees or south of 80 degrees south), where the projection
/// has no zone.
pub fn cell_size(
    latitude: f64,
    longitude: f64,
    x_step: f64,
    y_step: f64,
) -> Result<(f64, f64), GeodesyError> {
    if !(UTM_MIN_LATITUDE..=UTM_MAX_LATITUDE).contains(&latitude) {
        return Err(GeodesyError::PolarRegion { latitude, longitude });
    }

    let zone = utm_zone(longitude);
    let (x0, y0) = utm_forward(longitude, latitude, zone);
    let (x1, y1) = utm_forward(longitude + x_step, latitude + y_step, zone);

    Ok(((x1 - x0).abs(), (y1 - y0).abs()))
}

/// Project geographic coordinates into a UTM zone (easting, northing).
///
/// The northing carries no false northing, so southern latitudes come out
/// negative; only differences are used here.
fn utm_forward(longitude: f64, latitude: f64, zone: u8) -> (f64, f64) {
    let lat = latitude.to_radians();

    // Longitude offset from the central meridian, kept within (-180, 180]
    let mut dlon = longitude - utm_central_meridian(zone);
    if dlon > 180.0 {
        dlon -= 360.0;
    } else if dlon <= -180.0 {
        dlon += 360.0;
    }
    let dlon = dlon.to_radians();

    let n = WGS84_A / (1.0 - WGS84_E2 * lat.sin().powi(2)).sqrt();
    let t = lat.tan().powi(2);
    let c = WGS84_EP2 * lat.cos().powi(2);
    let a = dlon * lat.cos();
    let m = meridian_arc(lat);

    let easting = UTM_K0
        * n
        * (a + (1.0 - t + c) * a.powi(3) / 6.0
            + (5.0 - 18.0 * t + t.powi(2) + 72.0 * c - 58.0 * WGS84_EP2) * a.powi(5) / 120.0)
        + 500_000.0;

    let northing = UTM_K0
        * (m + n
            * lat.tan()
            * (a.powi(2) / 2.0
                + (5.0 - t + 9.0 * c + 4.0 * c.powi(2)) * a.powi(4) / 24.0
                + (61.0 - 58.0 * t + t.powi(2) + 600.0 * c - 330.0 * WGS84_EP2) * a.powi(6)
                    / 720.0));

    (easting, northing)
}

/// Meridian arc length from the equator to a latitude in radians
fn meridian_arc(lat: f64) -> f64 {
    let n = (WGS84_A - WGS84_B) / (WGS84_A + WGS84_B);

    let a0 = WGS84_A
        * (1.0 - n + (5.0 / 4.0) * (n.powi(2) - n.powi(3)) + (81.0 / 64.0) * (n.powi(4) - n.powi(5)));
    let a2 = (3.0 / 2.0)
        * WGS84_A
        * (n - n.powi(2) + (7.0 / 8.0) * (n.powi(3) - n.powi(4)) + (55.0 / 64.0) * n.powi(5));
    let a4 = (15.0 / 16.0) * WGS84_A * (n.powi(2) - n.powi(3) + (3.0 / 4.0) * (n.powi(4) - n.powi(5)));
    let a6 = (35.0 / 48.0) * WGS84_A * (n.powi(3) - n.powi(4) + (11.0 / 16.0) * n.powi(5));
    let a8 = (315.0 / 512.0) * WGS84_A * (n.powi(4) - n.powi(5));

    a0 * lat - a2 * (2.0 * lat).sin() + a4 * (4.0 * lat).sin() - a6 * (6.0 * lat).sin()
        + a8 * (8.0 * lat).sin()
}
