//! Core simulation types: run configuration, samples and the history buffer.

use std::fmt;

use serde::Serialize;

/// How the engine turns a controller output into a panel voltage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatingMode {
    /// The controller commands the panel voltage directly.
    Voltage,
    /// The controller commands a converter duty cycle, mapped onto the
    /// I-V curve by [`duty_cycle_index`].
    DutyCycle,
}

impl OperatingMode {
    /// Config name of the mode.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Voltage => "voltage",
            Self::DutyCycle => "duty_cycle",
        }
    }
}

/// Time advancement between iterations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Pacing {
    /// Simulated time only; iterations run back to back.
    Logical,
    /// Sleep for one step of real time after each iteration.
    WallClock,
}

/// Run configuration shared by the clock and the engine.
///
/// # Examples
///
/// ```
/// use mppt_sim::sim::types::{OperatingMode, Pacing, SimConfig};
///
/// let cfg = SimConfig::new(0.5, 10.0, OperatingMode::Voltage);
/// assert_eq!(cfg.total_steps(), 20);
/// assert_eq!(cfg.pacing, Pacing::Logical);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimConfig {
    /// Simulated time advanced per iteration (s).
    pub step_s: f64,
    /// Run ends once simulated time reaches this value (s).
    pub duration_s: f64,
    /// Optional hard cap on the number of iterations.
    pub max_iterations: Option<usize>,
    /// Logical or wall-clock pacing.
    pub pacing: Pacing,
    /// Voltage or duty-cycle operation.
    pub mode: OperatingMode,
    /// Samples per I-V curve, used for duty-cycle mapping and efficiency.
    pub curve_points: usize,
}

/// Default number of I-V curve samples.
pub const DEFAULT_CURVE_POINTS: usize = 100;

impl SimConfig {
    /// Creates a logically paced configuration with a 100-point curve.
    ///
    /// # Panics
    ///
    /// Panics if `step_s` is not positive or `duration_s` is negative.
    pub fn new(step_s: f64, duration_s: f64, mode: OperatingMode) -> Self {
        assert!(step_s > 0.0, "step_s must be > 0");
        assert!(duration_s >= 0.0, "duration_s must be >= 0");
        Self {
            step_s,
            duration_s,
            max_iterations: None,
            pacing: Pacing::Logical,
            mode,
            curve_points: DEFAULT_CURVE_POINTS,
        }
    }

    /// Simulated time at the start of iteration `k` (s).
    pub fn time_at(&self, k: usize) -> f64 {
        k as f64 * self.step_s
    }

    /// Number of iterations the run will execute.
    ///
    /// Counts iterations whose start time is below `duration_s`, using the
    /// same arithmetic as [`SimConfig::time_at`], and never more than
    /// `max_iterations`.
    pub fn total_steps(&self) -> usize {
        let cap = self.max_iterations.unwrap_or(usize::MAX);
        // float-to-int casts saturate, so a huge ratio lands on `cap`
        let mut n = ((self.duration_s / self.step_s).ceil() as usize).min(cap);
        while n > 0 && self.time_at(n - 1) >= self.duration_s {
            n -= 1;
        }
        while n < cap && self.time_at(n) < self.duration_s {
            n += 1;
        }
        n
    }
}

/// Maps a duty cycle onto an index of an `points`-sample I-V curve.
///
/// `index = floor(points · (1 − duty))`, clamped into `[0, points − 1]`.
/// Duty 0 lands on the open-circuit end, duty near 1 on the short-circuit
/// end.
///
/// # Examples
///
/// ```
/// use mppt_sim::sim::types::duty_cycle_index;
///
/// assert_eq!(duty_cycle_index(0.0, 100), 99);
/// assert_eq!(duty_cycle_index(0.5, 100), 50);
/// assert_eq!(duty_cycle_index(0.99, 100), 1);
/// ```
pub fn duty_cycle_index(duty: f64, points: usize) -> usize {
    if points == 0 {
        return 0;
    }
    let raw = (points as f64 * (1.0 - duty)).floor();
    if raw.is_nan() || raw <= 0.0 {
        return 0;
    }
    (raw as usize).min(points - 1)
}

/// One iteration of the control loop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    /// Iteration index, starting at 0.
    pub iteration: usize,
    /// Simulated time at the start of the iteration (s).
    pub time_s: f64,
    /// Panel voltage observed this iteration (V).
    pub voltage: f64,
    /// Panel current observed this iteration (A).
    pub current: f64,
    /// `voltage × current` (W).
    pub power: f64,
    /// Operating point returned by the controller (duty cycle or volts).
    pub operating_point: f64,
    /// Irradiance in effect (W/m²).
    pub irradiance: f64,
    /// Cell temperature in effect (°C).
    pub temperature: f64,
    /// Maximum power on the I-V curve in effect (W).
    pub max_power: f64,
}

impl Sample {
    /// Tracking efficiency of this sample in percent; 0 if `max_power <= 0`.
    pub fn efficiency_pct(&self) -> f64 {
        super::kpi::efficiency_pct(self.power, self.max_power)
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "k={:>4} t={:>7.2}s | V={:>7.3} V  I={:>6.3} A  P={:>8.3} W \
             (max {:>8.3} W, {:>5.1}%) | op={:.4} | G={:.0} W/m2  T={:.1} C",
            self.iteration,
            self.time_s,
            self.voltage,
            self.current,
            self.power,
            self.max_power,
            self.efficiency_pct(),
            self.operating_point,
            self.irradiance,
            self.temperature,
        )
    }
}

/// Append-only record of a run.
///
/// Samples are pushed by the engine only; consumers get shared slices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    samples: Vec<Sample>,
}

impl History {
    /// Creates an empty history with room for `capacity` samples.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    /// All samples in iteration order.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Most recent sample.
    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    /// Number of samples recorded.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether no sample was recorded yet.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Consumes the history and returns the samples.
    pub fn into_samples(self) -> Vec<Sample> {
        self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_steps_from_duration() {
        let cfg = SimConfig::new(1.0, 100.0, OperatingMode::Voltage);
        assert_eq!(cfg.total_steps(), 100);
        let cfg = SimConfig::new(0.3, 1.0, OperatingMode::Voltage);
        assert_eq!(cfg.total_steps(), 4);
    }

    #[test]
    fn total_steps_respects_cap() {
        let mut cfg = SimConfig::new(1.0, 100.0, OperatingMode::DutyCycle);
        cfg.max_iterations = Some(10);
        assert_eq!(cfg.total_steps(), 10);
    }

    #[test]
    fn total_steps_caps_before_counting_huge_runs() {
        let mut cfg = SimConfig::new(1e-300, 1e300, OperatingMode::Voltage);
        cfg.max_iterations = Some(10);
        assert_eq!(cfg.total_steps(), 10);

        cfg.max_iterations = None;
        assert_eq!(cfg.total_steps(), usize::MAX);
    }

    #[test]
    #[should_panic]
    fn zero_step_panics() {
        SimConfig::new(0.0, 10.0, OperatingMode::Voltage);
    }

    #[test]
    fn duty_index_exact_values() {
        assert_eq!(duty_cycle_index(0.0, 100), 99);
        assert_eq!(duty_cycle_index(0.5, 100), 50);
        assert_eq!(duty_cycle_index(0.99, 100), 1);
        assert_eq!(duty_cycle_index(0.95, 100), 5);
    }

    #[test]
    fn duty_index_clamped() {
        assert_eq!(duty_cycle_index(1.0, 100), 0);
        assert_eq!(duty_cycle_index(1.5, 100), 0);
        assert_eq!(duty_cycle_index(-0.5, 100), 99);
        assert_eq!(duty_cycle_index(f64::NAN, 100), 0);
        assert_eq!(duty_cycle_index(0.3, 0), 0);
        assert_eq!(duty_cycle_index(0.3, 1), 0);
    }

    #[test]
    fn sample_display_does_not_panic() {
        let s = Sample {
            iteration: 3,
            time_s: 3.0,
            voltage: 20.0,
            current: 4.25,
            power: 85.0,
            operating_point: 20.5,
            irradiance: 1000.0,
            temperature: 25.0,
            max_power: 85.0,
        };
        assert!(!format!("{s}").is_empty());
        assert!((s.efficiency_pct() - 100.0).abs() < 1e-12);
    }

    #[test]
    fn history_appends_in_order() {
        let mut h = History::with_capacity(2);
        assert!(h.is_empty());
        for k in 0..2 {
            h.push(Sample {
                iteration: k,
                time_s: k as f64,
                voltage: 0.0,
                current: 0.0,
                power: 0.0,
                operating_point: 0.5,
                irradiance: 1000.0,
                temperature: 25.0,
                max_power: 0.0,
            });
        }
        assert_eq!(h.len(), 2);
        assert_eq!(h.last().map(|s| s.iteration), Some(1));
        assert_eq!(h.into_samples().len(), 2);
    }
}
