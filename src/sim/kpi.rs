//! Tracking efficiency and post-hoc run summaries.

use std::fmt;

use serde::Serialize;

use super::types::Sample;
use crate::panel::OperatingPoint;

/// `power / max_power × 100`, or 0 when `max_power` is not positive.
pub fn efficiency_pct(power: f64, max_power: f64) -> f64 {
    if max_power > 0.0 && max_power.is_finite() {
        power / max_power * 100.0
    } else {
        0.0
    }
}

/// Largest `V × I` over the given curve samples; 0 for an empty curve.
pub fn theoretical_max_power(curve: impl IntoIterator<Item = OperatingPoint>) -> f64 {
    curve.into_iter().map(|p| p.power).fold(0.0, f64::max)
}

/// Tracking efficiency of `sample` against an I-V curve, in percent.
///
/// The curve's maximum sampled power is the reference. Because the curve
/// is sampled, an operating point between samples can score slightly above
/// 100%. A curve with no positive power yields 0.
///
/// # Examples
///
/// ```
/// use mppt_sim::panel::Panel;
/// use mppt_sim::sim::kpi::tracking_efficiency;
/// use mppt_sim::sim::types::Sample;
///
/// let panel = Panel::linear(40.0, 8.5);
/// let op = panel.operating_point(20.0);
/// let sample = Sample {
///     iteration: 0,
///     time_s: 0.0,
///     voltage: op.voltage,
///     current: op.current,
///     power: op.power,
///     operating_point: 20.5,
///     irradiance: 1000.0,
///     temperature: 25.0,
///     max_power: 0.0,
/// };
/// assert!((tracking_efficiency(&sample, panel.iv_curve(401)) - 100.0).abs() < 1e-9);
/// ```
pub fn tracking_efficiency(
    sample: &Sample,
    curve: impl IntoIterator<Item = OperatingPoint>,
) -> f64 {
    efficiency_pct(sample.power, theoretical_max_power(curve))
}

/// Aggregate indicators derived from a complete run.
///
/// Computed post-hoc from the history so the report always agrees with the
/// recorded samples.
#[derive(Debug, Clone, Serialize)]
pub struct TrackingReport {
    /// Number of samples in the run.
    pub samples: usize,
    /// Power of the last sample (W).
    pub final_power_w: f64,
    /// Highest sampled power (W).
    pub peak_power_w: f64,
    /// Mean per-sample tracking efficiency (%).
    pub mean_efficiency_pct: f64,
    /// Tracking efficiency of the last sample (%).
    pub final_efficiency_pct: f64,
    /// Energy delivered, `Σ power × step` (J).
    pub energy_harvested_j: f64,
    /// Energy available at the maximum power point, `Σ max_power × step` (J).
    pub energy_available_j: f64,
    /// Times the operating point changed direction.
    pub direction_reversals: usize,
    /// Environment changes applied during the run.
    pub environment_changes: usize,
}

impl TrackingReport {
    /// Computes the report from recorded samples.
    ///
    /// # Arguments
    ///
    /// * `samples` - Complete run history
    /// * `step_s` - Simulated seconds per iteration
    /// * `environment_changes` - Number of schedule entries applied
    pub fn from_history(samples: &[Sample], step_s: f64, environment_changes: usize) -> Self {
        let Some(last) = samples.last() else {
            return Self {
                samples: 0,
                final_power_w: 0.0,
                peak_power_w: 0.0,
                mean_efficiency_pct: 0.0,
                final_efficiency_pct: 0.0,
                energy_harvested_j: 0.0,
                energy_available_j: 0.0,
                direction_reversals: 0,
                environment_changes,
            };
        };

        let n = samples.len() as f64;
        let mut peak = 0.0_f64;
        let mut eff_sum = 0.0;
        let mut harvested = 0.0;
        let mut available = 0.0;
        for s in samples {
            peak = peak.max(s.power);
            eff_sum += s.efficiency_pct();
            harvested += s.power * step_s;
            available += s.max_power * step_s;
        }

        Self {
            samples: samples.len(),
            final_power_w: last.power,
            peak_power_w: peak,
            mean_efficiency_pct: eff_sum / n,
            final_efficiency_pct: last.efficiency_pct(),
            energy_harvested_j: harvested,
            energy_available_j: available,
            direction_reversals: count_reversals(samples),
            environment_changes,
        }
    }

    /// Harvested over available energy in percent; 0 if nothing was available.
    pub fn energy_efficiency_pct(&self) -> f64 {
        efficiency_pct(self.energy_harvested_j, self.energy_available_j)
    }
}

/// Counts sign changes between consecutive non-zero operating-point moves.
///
/// Moves of zero (the controller pinned at a bound) do not reset the last
/// seen direction.
fn count_reversals(samples: &[Sample]) -> usize {
    let mut reversals = 0;
    let mut last_sign = 0.0_f64;
    let mut prev = None;
    for s in samples {
        if let Some(p) = prev {
            let delta: f64 = s.operating_point - p;
            if delta != 0.0 {
                let sign = delta.signum();
                if last_sign != 0.0 && sign != last_sign {
                    reversals += 1;
                }
                last_sign = sign;
            }
        }
        prev = Some(s.operating_point);
    }
    reversals
}

impl fmt::Display for TrackingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Tracking Report ---")?;
        writeln!(f, "Samples:               {}", self.samples)?;
        writeln!(f, "Final power:           {:.3} W", self.final_power_w)?;
        writeln!(f, "Peak power:            {:.3} W", self.peak_power_w)?;
        writeln!(f, "Mean efficiency:       {:.2}%", self.mean_efficiency_pct)?;
        writeln!(f, "Final efficiency:      {:.2}%", self.final_efficiency_pct)?;
        writeln!(
            f,
            "Energy harvested:      {:.1} J of {:.1} J ({:.2}%)",
            self.energy_harvested_j,
            self.energy_available_j,
            self.energy_efficiency_pct()
        )?;
        writeln!(f, "Direction reversals:   {}", self.direction_reversals)?;
        write!(f, "Environment changes:   {}", self.environment_changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::Panel;

    fn make_sample(k: usize, power: f64, max_power: f64, operating_point: f64) -> Sample {
        Sample {
            iteration: k,
            time_s: k as f64,
            voltage: 10.0,
            current: power / 10.0,
            power,
            operating_point,
            irradiance: 1000.0,
            temperature: 25.0,
            max_power,
        }
    }

    #[test]
    fn efficiency_guards_zero_max() {
        assert_eq!(efficiency_pct(10.0, 0.0), 0.0);
        assert_eq!(efficiency_pct(10.0, -1.0), 0.0);
        assert_eq!(efficiency_pct(10.0, f64::NAN), 0.0);
        assert_eq!(efficiency_pct(25.0, 50.0), 50.0);
    }

    #[test]
    fn tracking_efficiency_against_curve() {
        let panel = Panel::linear(40.0, 8.5);
        let s = make_sample(0, 42.5, 0.0, 0.0);
        let max = theoretical_max_power(panel.iv_curve(401));
        assert!((max - 85.0).abs() < 1e-9);
        assert!((tracking_efficiency(&s, panel.iv_curve(401)) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn tracking_efficiency_empty_curve_is_zero() {
        let panel = Panel::linear(40.0, 8.5);
        let s = make_sample(0, 42.5, 0.0, 0.0);
        assert_eq!(tracking_efficiency(&s, panel.iv_curve(0)), 0.0);
        assert_eq!(tracking_efficiency(&s, panel.iv_curve(1)), 0.0);
    }

    #[test]
    fn report_aggregates() {
        let samples = vec![
            make_sample(0, 50.0, 100.0, 1.0),
            make_sample(1, 100.0, 100.0, 2.0),
            make_sample(2, 75.0, 100.0, 1.0),
        ];
        let r = TrackingReport::from_history(&samples, 0.5, 2);
        assert_eq!(r.samples, 3);
        assert_eq!(r.final_power_w, 75.0);
        assert_eq!(r.peak_power_w, 100.0);
        assert!((r.mean_efficiency_pct - 75.0).abs() < 1e-9);
        assert_eq!(r.final_efficiency_pct, 75.0);
        assert!((r.energy_harvested_j - 112.5).abs() < 1e-9);
        assert!((r.energy_available_j - 150.0).abs() < 1e-9);
        assert!((r.energy_efficiency_pct() - 75.0).abs() < 1e-9);
        assert_eq!(r.direction_reversals, 1);
        assert_eq!(r.environment_changes, 2);
    }

    #[test]
    fn reversals_ignore_pinned_moves() {
        let ops = [0.5, 0.6, 0.6, 0.7, 0.6, 0.6, 0.5, 0.6];
        let samples: Vec<Sample> = ops
            .iter()
            .enumerate()
            .map(|(k, &op)| make_sample(k, 1.0, 1.0, op))
            .collect();
        assert_eq!(count_reversals(&samples), 2);
    }

    #[test]
    fn empty_history() {
        let r = TrackingReport::from_history(&[], 1.0, 0);
        assert_eq!(r.samples, 0);
        assert_eq!(r.mean_efficiency_pct, 0.0);
        assert!(!format!("{r}").is_empty());
    }
}
