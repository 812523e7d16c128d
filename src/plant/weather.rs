//! Synthetic hourly capacity factors with regionally correlated cloud cover.

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::sim::types::{HOURS_PER_DAY, HOURS_PER_YEAR};

/// Minimum cloud multiplier (heavy overcast).
const MULTIPLIER_MIN: f64 = 0.05;
/// Maximum cloud multiplier (enhanced irradiance from cloud edges).
const MULTIPLIER_MAX: f64 = 1.1;

/// Parameters of the synthetic weather year.
///
/// The capacity factor at hour `h` of day `d` is
/// ```text
/// cf = peak_cf * daylight(h) * season(d) * (w * m_region(t) + (1 - w) * m_site(t))
/// ```
/// where each `m` is a mean-reverting AR(1) cloud multiplier
/// ```text
/// m(t) = mean + alpha * (m(t-1) - mean) + epsilon(t)
/// ```
/// clamped to \[0.05, 1.1\], and `w` is `regional_weight`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WeatherParams {
    /// Hour of day when generation starts (inclusive).
    pub sunrise_hour: usize,
    /// Hour of day when generation ends (exclusive).
    pub sunset_hour: usize,
    /// Clear-sky capacity factor at solar noon.
    pub peak_cf: f64,
    /// Long-run mean of the cloud multiplier.
    pub mean_clearness: f64,
    /// AR(1) persistence (0.0 = uncorrelated, close to 1.0 = multi-day fronts).
    pub alpha: f64,
    /// Standard deviation of the AR(1) innovation.
    pub cloud_noise_std: f64,
    /// Share of cloud variability common to every site of a region (0.0-1.0).
    pub regional_weight: f64,
    /// First day of the monsoon season (0-based, inclusive).
    pub monsoon_start_day: usize,
    /// Last day of the monsoon season (exclusive).
    pub monsoon_end_day: usize,
    /// Fractional clear-sky reduction during the monsoon (0.0-1.0).
    pub monsoon_depth: f64,
}

impl Default for WeatherParams {
    fn default() -> Self {
        Self {
            sunrise_hour: 6,
            sunset_hour: 18,
            peak_cf: 0.78,
            mean_clearness: 0.85,
            alpha: 0.97,
            cloud_noise_std: 0.06,
            regional_weight: 0.7,
            monsoon_start_day: 165,
            monsoon_end_day: 273,
            monsoon_depth: 0.3,
        }
    }
}

/// Seeded generator of 8760-hour capacity factor series.
#[derive(Debug, Clone)]
pub struct SyntheticWeather {
    params: WeatherParams,
    seed: u64,
}

impl SyntheticWeather {
    pub fn new(params: WeatherParams, seed: u64) -> Self {
        Self { params, seed }
    }

    pub fn params(&self) -> &WeatherParams {
        &self.params
    }

    /// Cloud multiplier series shared by all sites of region `region_index`.
    pub fn region_clouds(&self, region_index: usize) -> Vec<f64> {
        let seed = mix_seed(self.seed, 0x5EED_0000 + region_index as u64);
        self.cloud_series(seed)
    }

    /// Capacity factors of one site, blending its region's clouds with local noise.
    pub fn site_capacity_factors(&self, region_clouds: &[f64], site_index: usize) -> Vec<f64> {
        let p = &self.params;
        let local = self.cloud_series(mix_seed(self.seed, 0xC0DE_0000 + site_index as u64));
        let w = p.regional_weight.clamp(0.0, 1.0);

        (0..HOURS_PER_YEAR)
            .map(|h| {
                let day = h / HOURS_PER_DAY;
                let frac = daylight_frac(h % HOURS_PER_DAY, p.sunrise_hour, p.sunset_hour);
                if frac <= 0.0 {
                    return 0.0;
                }
                let regional = region_clouds.get(h).copied().unwrap_or(p.mean_clearness);
                let clouds = w * regional + (1.0 - w) * local[h];
                (p.peak_cf * frac * self.season(day) * clouds).clamp(0.0, 1.0)
            })
            .collect()
    }

    /// Clear-sky scaling for `day`.
    fn season(&self, day: usize) -> f64 {
        let p = &self.params;
        if (p.monsoon_start_day..p.monsoon_end_day).contains(&day) {
            1.0 - p.monsoon_depth.clamp(0.0, 1.0)
        } else {
            1.0
        }
    }

    fn cloud_series(&self, seed: u64) -> Vec<f64> {
        let p = &self.params;
        let mut rng = StdRng::seed_from_u64(seed);
        let mut m = p.mean_clearness;
        (0..HOURS_PER_YEAR)
            .map(|_| {
                let epsilon = gaussian_noise(&mut rng, p.cloud_noise_std);
                m = p.mean_clearness + p.alpha * (m - p.mean_clearness) + epsilon;
                m = m.clamp(MULTIPLIER_MIN, MULTIPLIER_MAX);
                m
            })
            .collect()
    }
}

/// Half-sine daylight shape for `hour_of_day`, peaking at 1.0 mid-day.
///
/// Evaluated at the middle of the hour so the first and last daylight hours
/// produce a small positive value.
pub fn daylight_frac(hour_of_day: usize, sunrise: usize, sunset: usize) -> f64 {
    if sunrise >= sunset || hour_of_day < sunrise || hour_of_day >= sunset {
        return 0.0;
    }
    let span = (sunset - sunrise) as f64;
    let x = (hour_of_day - sunrise) as f64 + 0.5;
    (std::f64::consts::PI * x / span).sin()
}

/// Gaussian noise via the Box-Muller transform.
pub fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }

    let u1: f64 = rng.random::<f64>().clamp(1e-12, 1.0);
    let u2: f64 = rng.random::<f64>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    z0 * std_dev
}

/// SplitMix64 finaliser, decorrelates neighbouring stream ids.
fn mix_seed(seed: u64, stream: u64) -> u64 {
    let mut z = seed ^ stream.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
