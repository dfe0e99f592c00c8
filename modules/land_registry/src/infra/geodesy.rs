//! Stereo 70 (EPSG:3844) to WGS84 reprojection
//!
//! Inverse oblique stereographic projection (EPSG method 9809) on the
//! Krasovsky 1940 ellipsoid, followed by a seven-parameter Helmert shift
//! (position vector convention) from Pulkovo 1942(58) to WGS84.

use crate::contract::LonLat;
use crate::domain::projection::{ProjectionError, Reprojector};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

/// Semi-major axis and inverse flattening of an ellipsoid
#[derive(Debug, Clone, Copy)]
struct Ellipsoid {
    a: f64,
    inv_f: f64,
}

impl Ellipsoid {
    fn e2(&self) -> f64 {
        let f = 1.0 / self.inv_f;
        f * (2.0 - f)
    }
}

const KRASOVSKY: Ellipsoid = Ellipsoid {
    a: 6_378_245.0,
    inv_f: 298.3,
};

const WGS84: Ellipsoid = Ellipsoid {
    a: 6_378_137.0,
    inv_f: 298.257_223_563,
};

/// Pulkovo 1942(58) to WGS84: metres, arc-seconds, ppm
const TOWGS84: [f64; 7] = [2.329, -147.042, -92.08, -0.309, 0.325, 0.497, 5.69];

const LAT_ORIGIN_DEG: f64 = 46.0;
const LON_ORIGIN_DEG: f64 = 25.0;
const SCALE: f64 = 0.99975;
const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING: f64 = 500_000.0;

/// Romania's national grid
#[derive(Debug, Clone)]
pub struct Stereo70 {
    e: f64,
    e2: f64,
    lon0: f64,
    /// Conformal sphere radius
    r: f64,
    n: f64,
    c: f64,
    chi0: f64,
}

impl Default for Stereo70 {
    fn default() -> Self {
        Self::new()
    }
}

impl Stereo70 {
    pub fn new() -> Self {
        let e2 = KRASOVSKY.e2();
        let e = e2.sqrt();
        let phi0 = LAT_ORIGIN_DEG.to_radians();
        let sin0 = phi0.sin();

        let rho0 = KRASOVSKY.a * (1.0 - e2) / (1.0 - e2 * sin0 * sin0).powf(1.5);
        let nu0 = KRASOVSKY.a / (1.0 - e2 * sin0 * sin0).sqrt();
        let r = (rho0 * nu0).sqrt();
        let n = (1.0 + e2 * phi0.cos().powi(4) / (1.0 - e2)).sqrt();

        let s1 = (1.0 + sin0) / (1.0 - sin0);
        let s2 = (1.0 - e * sin0) / (1.0 + e * sin0);
        let w1 = (s1 * s2.powf(e)).powf(n);
        let sin_chi00 = (w1 - 1.0) / (w1 + 1.0);
        let c = (n + sin0) * (1.0 - sin_chi00) / ((n - sin0) * (1.0 + sin_chi00));
        let w2 = c * w1;
        let chi0 = ((w2 - 1.0) / (w2 + 1.0)).asin();

        Self {
            e,
            e2,
            lon0: LON_ORIGIN_DEG.to_radians(),
            r,
            n,
            c,
            chi0,
        }
    }

    /// Grid coordinates to Pulkovo 1942(58) geodetic radians
    fn inverse(&self, easting: f64, northing: f64) -> (f64, f64) {
        let de = easting - FALSE_EASTING;
        let dn = northing - FALSE_NORTHING;
        let rk = self.r * SCALE;

        let g = 2.0 * rk * (FRAC_PI_4 - self.chi0 / 2.0).tan();
        let h = 4.0 * rk * self.chi0.tan() + g;
        let i = (de / (h + dn)).atan();
        let j = (de / (g - dn)).atan() - i;
        let chi = self.chi0 + 2.0 * ((dn - de * (j / 2.0).tan()) / (2.0 * rk)).atan();
        let big_lambda = j + 2.0 * i + self.lon0;
        let lon = (big_lambda - self.lon0) / self.n + self.lon0;

        let psi = 0.5 * ((1.0 + chi.sin()) / (self.c * (1.0 - chi.sin()))).ln() / self.n;
        let mut phi = 2.0 * psi.exp().atan() - FRAC_PI_2;
        for _ in 0..10 {
            let sin_phi = phi.sin();
            let psi_i = ((phi / 2.0 + FRAC_PI_4).tan()
                * ((1.0 - self.e * sin_phi) / (1.0 + self.e * sin_phi)).powf(self.e / 2.0))
            .ln();
            let next = phi
                - (psi_i - psi) * phi.cos() * (1.0 - self.e2 * sin_phi * sin_phi)
                    / (1.0 - self.e2);
            let converged = (next - phi).abs() < 1e-12;
            phi = next;
            if converged {
                break;
            }
        }

        (lon, phi)
    }
}

fn geodetic_to_geocentric(ellipsoid: Ellipsoid, lon: f64, lat: f64) -> [f64; 3] {
    let e2 = ellipsoid.e2();
    let nu = ellipsoid.a / (1.0 - e2 * lat.sin().powi(2)).sqrt();
    [
        nu * lat.cos() * lon.cos(),
        nu * lat.cos() * lon.sin(),
        nu * (1.0 - e2) * lat.sin(),
    ]
}

fn geocentric_to_geodetic(ellipsoid: Ellipsoid, [x, y, z]: [f64; 3]) -> (f64, f64) {
    let e2 = ellipsoid.e2();
    let p = (x * x + y * y).sqrt();
    let lon = y.atan2(x);
    let mut lat = z.atan2(p * (1.0 - e2));
    for _ in 0..10 {
        let nu = ellipsoid.a / (1.0 - e2 * lat.sin().powi(2)).sqrt();
        let height = p / lat.cos() - nu;
        let next = z.atan2(p * (1.0 - e2 * nu / (nu + height)));
        let converged = (next - lat).abs() < 1e-12;
        lat = next;
        if converged {
            break;
        }
    }
    (lon, lat)
}

fn helmert([x, y, z]: [f64; 3]) -> [f64; 3] {
    let [tx, ty, tz, rx, ry, rz, ppm] = TOWGS84;
    let sec = std::f64::consts::PI / (180.0 * 3600.0);
    let (rx, ry, rz) = (rx * sec, ry * sec, rz * sec);
    let m = 1.0 + ppm * 1e-6;
    [
        tx + m * (x - rz * y + ry * z),
        ty + m * (rz * x + y - rx * z),
        tz + m * (-ry * x + rx * y + z),
    ]
}

impl Reprojector for Stereo70 {
    fn name(&self) -> &'static str {
        "stereo70"
    }

    fn to_wgs84(&self, x: f64, y: f64) -> Result<LonLat, ProjectionError> {
        let fail = |reason: &str| ProjectionError {
            x,
            y,
            reason: reason.to_string(),
        };

        if !x.is_finite() || !y.is_finite() {
            return Err(fail("non-finite coordinate"));
        }

        // The grid covers Romania; anything this far out is not Stereo 70 input
        if !(0.0..=1_500_000.0).contains(&x) || !(0.0..=1_500_000.0).contains(&y) {
            return Err(fail("outside Stereo 70 extent"));
        }

        let (lon, lat) = self.inverse(x, y);
        let shifted = helmert(geodetic_to_geocentric(KRASOVSKY, lon, lat));
        let (lon, lat) = geocentric_to_geodetic(WGS84, shifted);
        let (lon, lat) = (lon.to_degrees(), lat.to_degrees());

        if !lon.is_finite() || !lat.is_finite() {
            return Err(fail("projection diverged"));
        }
        Ok([lon, lat])
    }
}
