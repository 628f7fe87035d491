//! Hourly feed and grid tariff inputs.

use std::f64::consts::PI;
use std::io::Read;
use std::path::{Path, PathBuf};

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::config::ProfileConfig;
use crate::sim::types::{GridPrice, HourlyRecord};

/// Failure while reading an input file.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("cannot open {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid CSV in {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Loads the hourly feed from a CSV file with a
/// `hour,date,consumption,production` header.
///
/// # Errors
///
/// Returns a [`DataError`] if the file cannot be opened or a row does not parse.
pub fn load_hourly_csv(path: &Path) -> Result<Vec<HourlyRecord>, DataError> {
    let file = std::fs::File::open(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_hourly_csv(file).map_err(|source| DataError::Csv {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads hourly records from any CSV source.
///
/// # Errors
///
/// Returns a `csv::Error` on the first malformed row.
pub fn read_hourly_csv(reader: impl Read) -> Result<Vec<HourlyRecord>, csv::Error> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
        .deserialize()
        .collect()
}

/// Loads the grid tariff table from a CSV file with a `purchase,sale` header.
///
/// # Errors
///
/// Returns a [`DataError`] if the file cannot be opened or a row does not parse.
pub fn load_grid_prices_csv(path: &Path) -> Result<Vec<GridPrice>, DataError> {
    let file = std::fs::File::open(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_grid_prices_csv(file).map_err(|source| DataError::Csv {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads grid prices from any CSV source.
///
/// # Errors
///
/// Returns a `csv::Error` on the first malformed row.
pub fn read_grid_prices_csv(reader: impl Read) -> Result<Vec<GridPrice>, csv::Error> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
        .deserialize()
        .collect()
}

/// Default 24-entry tariff: cheap nights, a daytime rate, and an evening peak.
pub fn default_grid_prices() -> Vec<GridPrice> {
    (0..24)
        .map(|hour| {
            let (purchase, sale) = match hour {
                0..=6 => (0.45, 0.15),
                7..=16 => (0.65, 0.25),
                17..=21 => (0.95, 0.35),
                _ => (0.55, 0.20),
            };
            GridPrice { purchase, sale }
        })
        .collect()
}

/// Generates `steps` hourly records from a seeded daily profile.
///
/// Consumption follows a sinusoid peaking in the evening; production is a
/// half-sine between sunrise and sunset. Both carry multiplicative Gaussian
/// noise and are clamped at zero. Identical seeds produce identical feeds.
///
/// # Arguments
///
/// * `steps` - Number of hourly records to produce
/// * `profile` - Shape of the daily profile
/// * `seed` - RNG seed
pub fn synthetic_hourly(steps: usize, profile: &ProfileConfig, seed: u64) -> Vec<HourlyRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..steps)
        .map(|step| {
            let hour = (step % 24) as u32;
            let day = step / 24 + 1;

            // peaks around 19:00
            let angle = 2.0 * PI * (f64::from(hour) - 13.0) / 24.0;
            let base = profile.base_consumption_kwh + profile.consumption_amp_kwh * angle.sin();
            let consumption = (base * (1.0 + gaussian_noise(&mut rng, profile.noise_std))).max(0.0);

            let frac = daylight_frac(hour, profile.sunrise_hour, profile.sunset_hour);
            let production = if frac > 0.0 {
                let clean = profile.peak_production_kwh * frac;
                (clean * (1.0 + gaussian_noise(&mut rng, profile.noise_std))).max(0.0)
            } else {
                0.0
            };

            HourlyRecord {
                hour,
                date: format!("day-{day:03}"),
                consumption,
                production,
            }
        })
        .collect()
}

fn daylight_frac(hour: u32, sunrise: u32, sunset: u32) -> f64 {
    if hour < sunrise || hour >= sunset {
        return 0.0;
    }
    let span = f64::from(sunset - sunrise);
    (PI * (f64::from(hour - sunrise) + 0.5) / span).sin()
}

/// Box-Muller sample with standard deviation `std_dev`.
fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }
    let u1: f64 = rng.random::<f64>().clamp(1e-12, 1.0);
    let u2: f64 = rng.random::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos() * std_dev
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hourly_csv_parses_rows() {
        let csv = "hour,date,consumption,production\n\
                   0, 2024-06-01, 3.5, 0.0\n\
                   12,2024-06-01,2.0,6.25\n";
        let rows = read_hourly_csv(csv.as_bytes()).expect("valid hourly CSV");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, "2024-06-01");
        assert_eq!(rows[1].hour, 12);
        assert_eq!(rows[1].production, 6.25);
    }

    #[test]
    fn hourly_csv_rejects_bad_number() {
        let csv = "hour,date,consumption,production\n0,2024-06-01,abc,0.0\n";
        assert!(read_hourly_csv(csv.as_bytes()).is_err());
    }

    #[test]
    fn grid_csv_parses_rows() {
        let csv = "purchase,sale\n0.5,0.2\n0.9,0.3\n";
        let prices = read_grid_prices_csv(csv.as_bytes()).expect("valid grid CSV");
        assert_eq!(
            prices,
            vec![
                GridPrice { purchase: 0.5, sale: 0.2 },
                GridPrice { purchase: 0.9, sale: 0.3 },
            ]
        );
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_grid_prices_csv(Path::new("/nonexistent/grid.csv"));
        match err {
            Err(e @ DataError::Io { .. }) => assert!(e.to_string().contains("grid.csv")),
            other => panic!("expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn default_tariff_covers_a_day() {
        let prices = default_grid_prices();
        assert_eq!(prices.len(), 24);
        assert!(prices.iter().all(|p| p.purchase > p.sale && p.sale > 0.0));
        assert!(prices[19].purchase > prices[3].purchase);
    }

    #[test]
    fn synthetic_profile_is_deterministic() {
        let profile = ProfileConfig::default();
        let a = synthetic_hourly(48, &profile, 7);
        let b = synthetic_hourly(48, &profile, 7);
        assert_eq!(a, b);
        assert_ne!(a, synthetic_hourly(48, &profile, 8));
    }

    #[test]
    fn synthetic_profile_shape() {
        let profile = ProfileConfig::default();
        let rows = synthetic_hourly(48, &profile, 1);
        assert_eq!(rows.len(), 48);
        assert_eq!(rows[25].hour, 1);
        assert_eq!(rows[25].date, "day-002");
        assert!(rows.iter().all(|r| r.consumption >= 0.0 && r.production >= 0.0));
        // no production at night
        assert_eq!(rows[2].production, 0.0);
        assert_eq!(rows[23].production, 0.0);
        assert!(rows[12].production > 0.0);
    }
}
