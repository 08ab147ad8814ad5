//! Indicator pipeline: price points in, one `IndicatorRow` per point out.
//!
//! Single pass over the input. Rolling mean of closes and rolling volatility of
//! velocity share the same trailing window and `min_periods` rule. A row value is
//! `None` until its inputs are available.

use super::energy;
use super::rolling::RollingWindow;
use crate::config::{IndicatorConfig, PotentialModel};
use crate::domain::{IndicatorRow, PricePoint};

/// Compute indicator rows. Output length always equals input length.
///
/// `config` must already be validated (`window >= 1`, `1 <= min_periods <= window`).
pub fn compute_indicators(points: &[PricePoint], config: &IndicatorConfig) -> Vec<IndicatorRow> {
    let mut closes = RollingWindow::new(config.window);
    let mut velocities = RollingWindow::new(config.window);
    let mut rows = Vec::with_capacity(points.len());
    let mut previous_close: Option<f64> = None;

    for point in points {
        let velocity = previous_close.and_then(|prev| energy::velocity(prev, point.close));
        previous_close = Some(point.close);

        closes.push(Some(point.close));
        velocities.push(velocity);

        let rolling_mean = closes
            .mean()
            .filter(|_| closes.count() >= config.min_periods);
        let volatility = velocities
            .std_dev()
            .filter(|_| velocities.count() >= config.min_periods);

        let kinetic = velocity.map(|v| energy::kinetic_energy(v, config.energy.mass));
        let potential =
            energy::potential_energy(&config.energy, point.close, rolling_mean, volatility);
        let lagrangian = match (kinetic, potential) {
            (Some(k), Some(p)) => Some(energy::lagrangian(k, p)),
            _ => None,
        };

        rows.push(IndicatorRow {
            timestamp: point.timestamp,
            close: point.close,
            velocity,
            rolling_mean,
            volatility,
            kinetic_energy: kinetic,
            potential_energy: potential,
            lagrangian,
        });
    }

    rows
}

/// Fewest points needed before the first row can have a defined Lagrangian.
pub fn required_points(config: &IndicatorConfig) -> usize {
    match config.energy.potential {
        // velocity needs t >= 1, the close window needs min_periods closes
        PotentialModel::MeanDeviation => config.min_periods.max(2),
        // the velocity window needs min_periods velocities, first one at t = 1
        PotentialModel::Volatility => config.min_periods + 1,
    }
}

/// Aggregate view over the defined rows only.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct IndicatorSummary {
    pub total_rows: usize,
    pub defined_rows: usize,
    pub mean_lagrangian: Option<f64>,
    pub max_kinetic_energy: Option<f64>,
    pub max_potential_energy: Option<f64>,
    pub max_abs_velocity: Option<f64>,
}

fn max_of(values: impl Iterator<Item = f64>) -> Option<f64> {
    values.fold(None, |acc, v| Some(acc.map_or(v, |a: f64| a.max(v))))
}

pub fn summarize(rows: &[IndicatorRow]) -> IndicatorSummary {
    let defined: Vec<&IndicatorRow> = rows.iter().filter(|r| r.is_defined()).collect();
    let lagrangians: Vec<f64> = defined.iter().filter_map(|r| r.lagrangian).collect();
    let mean_lagrangian = (!lagrangians.is_empty())
        .then(|| lagrangians.iter().sum::<f64>() / lagrangians.len() as f64);

    IndicatorSummary {
        total_rows: rows.len(),
        defined_rows: defined.len(),
        mean_lagrangian,
        max_kinetic_energy: max_of(defined.iter().filter_map(|r| r.kinetic_energy)),
        max_potential_energy: max_of(defined.iter().filter_map(|r| r.potential_energy)),
        max_abs_velocity: max_of(defined.iter().filter_map(|r| r.velocity.map(f64::abs))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnergyConfig;
    use crate::indicators::{assert_approx, make_points, DEFAULT_EPSILON};

    #[test]
    fn empty_input_empty_output() {
        let rows = compute_indicators(&[], &IndicatorConfig::default());
        assert!(rows.is_empty());
    }

    #[test]
    fn single_point_has_no_velocity() {
        let rows = compute_indicators(&make_points(&[100.0]), &IndicatorConfig::new(1, 1));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].velocity, None);
        assert_eq!(rows[0].lagrangian, None);
    }

    #[test]
    fn two_points_window_one() {
        let rows = compute_indicators(&make_points(&[100.0, 110.0]), &IndicatorConfig::new(1, 1));
        assert_eq!(rows.len(), 2);
        assert!(!rows[0].is_defined());

        let row = &rows[1];
        assert_approx(row.velocity.unwrap(), 0.10, DEFAULT_EPSILON);
        assert_approx(row.rolling_mean.unwrap(), 110.0, DEFAULT_EPSILON);
        assert_approx(row.volatility.unwrap(), 0.0, DEFAULT_EPSILON);
        assert_approx(row.kinetic_energy.unwrap(), 0.005, DEFAULT_EPSILON);
        assert_approx(row.potential_energy.unwrap(), 0.0, DEFAULT_EPSILON);
        assert_approx(row.lagrangian.unwrap(), 0.005, DEFAULT_EPSILON);
    }

    #[test]
    fn warmup_rows_are_undefined_not_zero() {
        let closes: Vec<f64> = (0..10).map(|i| 100.0 + i as f64).collect();
        let rows = compute_indicators(&make_points(&closes), &IndicatorConfig::new(5, 5));
        for row in &rows[..4] {
            assert_eq!(row.rolling_mean, None);
            assert_eq!(row.lagrangian, None);
        }
        // closes window full at t = 4
        assert_approx(rows[4].rolling_mean.unwrap(), 102.0, DEFAULT_EPSILON);
        assert!(rows[4].lagrangian.is_some());
        // velocity window has 4 defined values at t = 4, 5 at t = 5
        assert_eq!(rows[4].volatility, None);
        assert!(rows[5].volatility.is_some());
    }

    #[test]
    fn min_periods_shortens_warmup() {
        let closes = [100.0, 102.0, 101.0, 103.0];
        let rows = compute_indicators(&make_points(&closes), &IndicatorConfig::new(20, 1));
        assert_approx(rows[0].rolling_mean.unwrap(), 100.0, DEFAULT_EPSILON);
        assert_approx(rows[1].rolling_mean.unwrap(), 101.0, DEFAULT_EPSILON);
        assert!(rows[1].is_defined());
    }

    #[test]
    fn zero_previous_close_gives_undefined_velocity() {
        let rows = compute_indicators(&make_points(&[0.0, 5.0, 6.0]), &IndicatorConfig::new(1, 1));
        assert_eq!(rows[1].velocity, None);
        assert_eq!(rows[1].lagrangian, None);
        assert_approx(rows[2].velocity.unwrap(), 0.2, DEFAULT_EPSILON);
    }

    #[test]
    fn constant_prices_have_zero_energy() {
        let rows = compute_indicators(&make_points(&[100.0; 25]), &IndicatorConfig::new(20, 20));
        let defined: Vec<_> = rows.iter().filter(|r| r.is_defined()).collect();
        assert!(!defined.is_empty());
        for row in defined {
            assert_eq!(row.velocity, Some(0.0));
            assert_eq!(row.kinetic_energy, Some(0.0));
            assert_eq!(row.potential_energy, Some(0.0));
        }
    }

    #[test]
    fn volatility_model_uses_velocity_std() {
        let config = IndicatorConfig::new(3, 3).with_energy(EnergyConfig {
            potential: PotentialModel::Volatility,
            stiffness: 1.0,
            mass: 1.0,
        });
        let rows = compute_indicators(&make_points(&[100.0, 110.0, 99.0, 108.9]), &config);
        // velocities: 0.1, -0.1, 0.1
        let v = [0.1, -0.1, 0.1];
        let mean = v.iter().sum::<f64>() / 3.0;
        let std = (v.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / 3.0).sqrt();
        assert_eq!(rows[2].potential_energy, None);
        assert_approx(rows[3].potential_energy.unwrap(), std, 1e-9);
        assert_approx(
            rows[3].lagrangian.unwrap(),
            0.5 * 0.01 - std,
            1e-9,
        );
    }

    #[test]
    fn mean_deviation_potential_tracks_distance_from_average() {
        let rows = compute_indicators(&make_points(&[100.0, 100.0, 130.0]), &IndicatorConfig::new(3, 3));
        // mean = 110, deviation = 20/110
        let d = 20.0 / 110.0;
        assert_approx(rows[2].potential_energy.unwrap(), 10.0 * d * d, 1e-12);
    }

    #[test]
    fn required_points_by_model() {
        let base = IndicatorConfig::new(20, 20);
        assert_eq!(required_points(&base), 20);
        assert_eq!(required_points(&IndicatorConfig::new(1, 1)), 2);
        let vol = base.with_energy(EnergyConfig {
            potential: PotentialModel::Volatility,
            ..EnergyConfig::default()
        });
        assert_eq!(required_points(&vol), 21);
    }

    #[test]
    fn required_points_matches_first_defined_row() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64 * 0.7).sin()).collect();
        for potential in [PotentialModel::MeanDeviation, PotentialModel::Volatility] {
            for (window, min) in [(1, 1), (5, 3), (20, 20)] {
                let config = IndicatorConfig::new(window, min).with_energy(EnergyConfig {
                    potential,
                    ..EnergyConfig::default()
                });
                let rows = compute_indicators(&make_points(&closes), &config);
                let first = rows.iter().position(|r| r.lagrangian.is_some()).unwrap();
                assert_eq!(first + 1, required_points(&config), "{potential:?} {window}/{min}");
            }
        }
    }

    #[test]
    fn summary_ignores_undefined_rows() {
        let rows = compute_indicators(&make_points(&[100.0, 110.0, 99.0]), &IndicatorConfig::new(1, 1));
        let summary = summarize(&rows);
        assert_eq!(summary.total_rows, 3);
        assert_eq!(summary.defined_rows, 2);
        assert_approx(summary.max_abs_velocity.unwrap(), 0.1, DEFAULT_EPSILON);
        assert!(summary.mean_lagrangian.is_some());
    }

    #[test]
    fn summary_of_empty_rows() {
        let summary = summarize(&[]);
        assert_eq!(summary.defined_rows, 0);
        assert_eq!(summary.mean_lagrangian, None);
        assert_eq!(summary.max_kinetic_energy, None);
    }
}
