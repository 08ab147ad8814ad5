//! Energy terms of the price "Lagrangian".
//!
//! - Velocity: relative close-to-close change.
//! - Kinetic: `0.5 * mass * velocity^2`. Non-negative, zero only at zero velocity.
//! - Potential: `stiffness * deviation^2` (relative distance from the moving
//!   average) or `stiffness * volatility`. Non-negative.
//! - Lagrangian: kinetic minus potential.

use crate::config::{EnergyConfig, PotentialModel};

/// Relative change from `previous` to `current`. Undefined when `previous` is zero.
pub fn velocity(previous: f64, current: f64) -> Option<f64> {
    if previous == 0.0 {
        return None;
    }
    let v = (current - previous) / previous;
    v.is_finite().then_some(v)
}

pub fn kinetic_energy(velocity: f64, mass: f64) -> f64 {
    0.5 * mass * velocity * velocity
}

/// Potential energy under the configured model. `None` when its input is undefined.
pub fn potential_energy(
    energy: &EnergyConfig,
    close: f64,
    rolling_mean: Option<f64>,
    volatility: Option<f64>,
) -> Option<f64> {
    match energy.potential {
        PotentialModel::MeanDeviation => {
            let mean = rolling_mean?;
            if mean == 0.0 {
                return None;
            }
            let deviation = (close - mean) / mean;
            Some(energy.stiffness * deviation * deviation)
        }
        PotentialModel::Volatility => volatility.map(|vol| energy.stiffness * vol.abs()),
    }
}

pub fn lagrangian(kinetic: f64, potential: f64) -> f64 {
    kinetic - potential
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn velocity_is_relative_change() {
        assert_approx(velocity(100.0, 110.0).unwrap(), 0.10, DEFAULT_EPSILON);
        assert_approx(velocity(100.0, 95.0).unwrap(), -0.05, DEFAULT_EPSILON);
    }

    #[test]
    fn velocity_from_zero_is_undefined() {
        assert_eq!(velocity(0.0, 5.0), None);
    }

    #[test]
    fn kinetic_is_zero_only_at_rest() {
        assert_eq!(kinetic_energy(0.0, 1.0), 0.0);
        assert!(kinetic_energy(1e-6, 1.0) > 0.0);
        assert_approx(kinetic_energy(-0.1, 1.0), 0.005, DEFAULT_EPSILON);
        assert_approx(kinetic_energy(0.1, 2.0), 0.01, DEFAULT_EPSILON);
    }

    #[test]
    fn mean_deviation_potential() {
        let energy = EnergyConfig::default();
        // (110 - 100) / 100 = 0.1, 10 * 0.01 = 0.1
        assert_approx(
            potential_energy(&energy, 110.0, Some(100.0), None).unwrap(),
            0.1,
            DEFAULT_EPSILON,
        );
        assert_eq!(potential_energy(&energy, 110.0, None, Some(0.2)), None);
        assert_eq!(potential_energy(&energy, 1.0, Some(0.0), None), None);
    }

    #[test]
    fn volatility_potential() {
        let energy = EnergyConfig {
            potential: PotentialModel::Volatility,
            stiffness: 2.0,
            ..EnergyConfig::default()
        };
        assert_approx(
            potential_energy(&energy, 110.0, Some(100.0), Some(0.02)).unwrap(),
            0.04,
            DEFAULT_EPSILON,
        );
        assert_eq!(potential_energy(&energy, 110.0, Some(100.0), None), None);
    }

    #[test]
    fn lagrangian_is_difference() {
        assert_approx(lagrangian(0.3, 0.1), 0.2, DEFAULT_EPSILON);
        assert_approx(lagrangian(0.0, 0.1), -0.1, DEFAULT_EPSILON);
    }
}
