//! Local tangent-plane projection.
//!
//! Transverse Mercator (Krüger series to sixth order in the third flattening `n`)
//! with the central meridian at the reference longitude, the origin of northing
//! at the reference latitude, unit scale and no false easting/northing. The
//! reference point therefore maps to (0, 0) exactly and distances near it are
//! true to well under a millimeter per kilometer.
//!
//! # Algorithm
//!
//! ```text
//! Forward (φ, λ) → (x, y):
//!   t  = sinh(atanh(sin φ) − e·atanh(e·sin φ))      conformal latitude
//!   ξ' = atan(t / cos Δλ)
//!   η' = atanh(sin Δλ / √(1 + t²))
//!   x  = A·(η' + Σ αⱼ cos 2jξ' sinh 2jη')
//!   y  = A·(ξ' + Σ αⱼ sin 2jξ' cosh 2jη') − y₀
//!
//! Inverse (x, y) → (φ, λ):
//!   ξ  = (y + y₀)/A,  η = x/A
//!   ξ' = ξ − Σ βⱼ sin 2jξ cosh 2jη
//!   η' = η − Σ βⱼ cos 2jξ sinh 2jη
//!   χ  = asin(sin ξ' / cosh η')
//!   φ  = 2·atan(tan(π/4 + χ/2)·((1 + e·sin φ)/(1 − e·sin φ))^(e/2)) − π/2   (fixed point)
//!   λ  = λ₀ + atan(sinh η' / cos ξ')
//! ```

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use thiserror::Error;

use crate::core::types::GeometryPoint;

/// Errors constructing a projection.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProjectionError {
    /// Reference latitude not finite or outside [-90, 90)
    #[error("invalid reference latitude {0}")]
    InvalidLatitude(f64),
    /// Reference longitude not finite
    #[error("invalid reference longitude {0}")]
    InvalidLongitude(f64),
    /// Ellipsoid parameters unusable
    #[error("invalid ellipsoid (a={semi_major}, 1/f={inverse_flattening})")]
    InvalidEllipsoid {
        /// Semi-major axis
        semi_major: f64,
        /// Inverse flattening
        inverse_flattening: f64,
    },
}

/// Reference ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    /// Semi-major axis (meters)
    pub semi_major: f64,
    /// Inverse flattening
    pub inverse_flattening: f64,
}

impl Ellipsoid {
    /// WGS-84.
    pub const WGS84: Ellipsoid = Ellipsoid {
        semi_major: 6_378_137.0,
        inverse_flattening: 298.257_223_563,
    };
}

impl Default for Ellipsoid {
    fn default() -> Self {
        Self::WGS84
    }
}

/// Projects geographic points into a local frame centered on a reference.
///
/// Both clouds of one crossing must be projected by the same projector so
/// their coordinates are directly comparable.
#[derive(Debug, Clone)]
pub struct LocalFrameProjector {
    lat0: f64,
    lon0: f64,
    /// Rectifying radius A
    radius: f64,
    /// First eccentricity
    e: f64,
    alpha: [f64; 6],
    beta: [f64; 6],
    /// Northing of the reference latitude on the central meridian
    y_origin: f64,
}

impl LocalFrameProjector {
    /// Build a WGS-84 projector centered at (lat0, lon0) in degrees.
    pub fn new(lat0: f64, lon0: f64) -> Result<Self, ProjectionError> {
        Self::with_ellipsoid(lat0, lon0, Ellipsoid::WGS84)
    }

    /// Build a projector on a specific ellipsoid.
    pub fn with_ellipsoid(
        lat0: f64,
        lon0: f64,
        ellipsoid: Ellipsoid,
    ) -> Result<Self, ProjectionError> {
        if !lat0.is_finite() || !(-90.0..90.0).contains(&lat0) {
            return Err(ProjectionError::InvalidLatitude(lat0));
        }
        if !lon0.is_finite() {
            return Err(ProjectionError::InvalidLongitude(lon0));
        }
        if !(ellipsoid.semi_major.is_finite()
            && ellipsoid.semi_major > 0.0
            && ellipsoid.inverse_flattening.is_finite()
            && ellipsoid.inverse_flattening > 1.0)
        {
            return Err(ProjectionError::InvalidEllipsoid {
                semi_major: ellipsoid.semi_major,
                inverse_flattening: ellipsoid.inverse_flattening,
            });
        }

        let f = 1.0 / ellipsoid.inverse_flattening;
        let n = f / (2.0 - f);
        let n2 = n * n;
        let n3 = n2 * n;
        let n4 = n3 * n;
        let n5 = n4 * n;
        let n6 = n5 * n;

        let radius = ellipsoid.semi_major / (1.0 + n) * (1.0 + n2 / 4.0 + n4 / 64.0 + n6 / 256.0);
        let e = (f * (2.0 - f)).sqrt();

        let alpha = [
            n / 2.0 - 2.0 / 3.0 * n2 + 5.0 / 16.0 * n3 + 41.0 / 180.0 * n4 - 127.0 / 288.0 * n5
                + 7891.0 / 37800.0 * n6,
            13.0 / 48.0 * n2 - 3.0 / 5.0 * n3 + 557.0 / 1440.0 * n4 + 281.0 / 630.0 * n5
                - 1983433.0 / 1935360.0 * n6,
            61.0 / 240.0 * n3 - 103.0 / 140.0 * n4 + 15061.0 / 26880.0 * n5
                + 167603.0 / 181440.0 * n6,
            49561.0 / 161280.0 * n4 - 179.0 / 168.0 * n5 + 6601661.0 / 7257600.0 * n6,
            34729.0 / 80640.0 * n5 - 3418889.0 / 1995840.0 * n6,
            212378941.0 / 319334400.0 * n6,
        ];
        let beta = [
            n / 2.0 - 2.0 / 3.0 * n2 + 37.0 / 96.0 * n3 - 1.0 / 360.0 * n4 - 81.0 / 512.0 * n5
                + 96199.0 / 604800.0 * n6,
            1.0 / 48.0 * n2 + 1.0 / 15.0 * n3 - 437.0 / 1440.0 * n4 + 46.0 / 105.0 * n5
                - 1118711.0 / 3870720.0 * n6,
            17.0 / 480.0 * n3 - 37.0 / 840.0 * n4 - 209.0 / 4480.0 * n5 + 5569.0 / 90720.0 * n6,
            4397.0 / 161280.0 * n4 - 11.0 / 504.0 * n5 - 830251.0 / 7257600.0 * n6,
            4583.0 / 161280.0 * n5 - 108847.0 / 3991680.0 * n6,
            20648693.0 / 638668800.0 * n6,
        ];
        let mut projector = Self {
            lat0,
            lon0,
            radius,
            e,
            alpha,
            beta,
            y_origin: 0.0,
        };
        let (_, y0) = projector.series_forward(lat0.to_radians(), 0.0);
        projector.y_origin = y0;
        Ok(projector)
    }

    /// Reference latitude (degrees).
    pub fn lat0(&self) -> f64 {
        self.lat0
    }

    /// Reference longitude (degrees).
    pub fn lon0(&self) -> f64 {
        self.lon0
    }

    /// Unshifted series evaluation; angles in radians.
    fn series_forward(&self, phi: f64, dlambda: f64) -> (f64, f64) {
        let sin_phi = phi.sin();
        let t = (sin_phi.atanh() - self.e * (self.e * sin_phi).atanh()).sinh();
        let xi_p = t.atan2(dlambda.cos());
        let eta_p = (dlambda.sin() / (1.0 + t * t).sqrt()).atanh();

        let mut xi = xi_p;
        let mut eta = eta_p;
        for (j, a) in self.alpha.iter().enumerate() {
            let k = 2.0 * (j + 1) as f64;
            xi += a * (k * xi_p).sin() * (k * eta_p).cosh();
            eta += a * (k * xi_p).cos() * (k * eta_p).sinh();
        }
        (self.radius * eta, self.radius * xi)
    }

    /// Invert the conformal latitude by fixed-point iteration.
    ///
    /// Contracts by roughly e² per step, so a handful of steps reach f64 precision.
    fn geodetic_from_conformal(&self, chi: f64) -> f64 {
        const MAX_STEPS: usize = 20;
        let half_e = 0.5 * self.e;
        let base = (FRAC_PI_4 + 0.5 * chi).tan();
        let mut phi = chi;
        for _ in 0..MAX_STEPS {
            let es = self.e * phi.sin();
            let next = 2.0 * (base * ((1.0 + es) / (1.0 - es)).powf(half_e)).atan() - FRAC_PI_2;
            if (next - phi).abs() < 1e-15 {
                return next;
            }
            phi = next;
        }
        phi
    }

    /// Geographic (lon, lat) in degrees to local (x east, y north) in meters.
    pub fn forward(&self, lon: f64, lat: f64) -> (f64, f64) {
        let dlambda = wrap_degrees(lon - self.lon0).to_radians();
        let (x, y) = self.series_forward(lat.to_radians(), dlambda);
        (x, y - self.y_origin)
    }

    /// Local (x east, y north) in meters back to geographic (lon, lat) in degrees.
    pub fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let xi = (y + self.y_origin) / self.radius;
        let eta = x / self.radius;

        let mut xi_p = xi;
        let mut eta_p = eta;
        for (j, b) in self.beta.iter().enumerate() {
            let k = 2.0 * (j + 1) as f64;
            xi_p -= b * (k * xi).sin() * (k * eta).cosh();
            eta_p -= b * (k * xi).cos() * (k * eta).sinh();
        }

        let chi = (xi_p.sin() / eta_p.cosh()).asin();
        let phi = self.geodetic_from_conformal(chi);
        let dlambda = eta_p.sinh().atan2(xi_p.cos());

        (self.lon0 + dlambda.to_degrees(), phi.to_degrees())
    }

    /// Rewrite geographic points in place into the local frame.
    ///
    /// `z` and validity are untouched. Non-finite input stays non-finite.
    pub fn project_points(&self, points: &mut [GeometryPoint]) {
        for p in points.iter_mut() {
            let (x, y) = self.forward(p.x, p.y);
            p.x = x;
            p.y = y;
        }
    }
}

/// Wrap a longitude difference into [-180, 180).
#[inline]
fn wrap_degrees(d: f64) -> f64 {
    (d + 180.0).rem_euclid(360.0) - 180.0
}
