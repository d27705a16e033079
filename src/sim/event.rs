use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::Serialize;

/// Scheduled step-change of the panel environment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnvironmentChange {
    /// Simulated time at which the change fires (s).
    pub trigger_time: f64,
    /// New irradiance (W/m²), if it changes.
    pub irradiance: Option<f64>,
    /// New cell temperature (°C), if it changes.
    pub temperature: Option<f64>,
}

impl EnvironmentChange {
    /// Change that sets only the irradiance.
    pub fn irradiance(trigger_time: f64, irradiance: f64) -> Self {
        Self {
            trigger_time,
            irradiance: Some(irradiance),
            temperature: None,
        }
    }

    /// Change that sets only the temperature.
    pub fn temperature(trigger_time: f64, temperature: f64) -> Self {
        Self {
            trigger_time,
            irradiance: None,
            temperature: Some(temperature),
        }
    }
}

/// Ordered environment changes with apply-once semantics.
///
/// Changes are sorted by trigger time on construction (stable for equal
/// times). [`EnvironmentSchedule::due`] hands out each change exactly once,
/// the first time simulated time reaches or passes its trigger.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentSchedule {
    changes: Vec<EnvironmentChange>,
    next: usize,
}

impl EnvironmentSchedule {
    /// Builds a schedule from changes in any order.
    pub fn new(mut changes: Vec<EnvironmentChange>) -> Self {
        changes.sort_by(|a, b| a.trigger_time.total_cmp(&b.trigger_time));
        Self { changes, next: 0 }
    }

    /// Schedule with no changes.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns the changes that became due at `time_s` and marks them applied.
    pub fn due(&mut self, time_s: f64) -> &[EnvironmentChange] {
        let start = self.next;
        while self
            .changes
            .get(self.next)
            .is_some_and(|c| c.trigger_time <= time_s)
        {
            self.next += 1;
        }
        &self.changes[start..self.next]
    }

    /// All changes in trigger order.
    pub fn changes(&self) -> &[EnvironmentChange] {
        &self.changes
    }

    /// Number of changes already handed out.
    pub fn applied(&self) -> usize {
        self.next
    }

    /// Number of changes still pending.
    pub fn pending(&self) -> usize {
        self.changes.len() - self.next
    }
}

/// Minimum cloud multiplier (heavy overcast).
const MULTIPLIER_MIN: f64 = 0.2;
/// Maximum cloud multiplier (enhanced irradiance from cloud edges).
const MULTIPLIER_MAX: f64 = 1.2;

/// Generator for irradiance schedules with temporally correlated clouds.
///
/// A cloud multiplier evolves as an AR(1) process sampled every
/// `interval_s` seconds:
/// ```text
/// m(k) = alpha * m(k-1) + (1 - alpha) * (1 + epsilon(k))
/// ```
/// with Gaussian `epsilon` and `m` clamped to \[0.2, 1.2\]. Each sample
/// becomes an irradiance change of `base_irradiance * m(k)`.
#[derive(Debug, Clone)]
pub struct CloudModel {
    /// Clear-sky irradiance the multiplier scales (W/m²).
    pub base_irradiance: f64,
    /// Seconds between irradiance changes.
    pub interval_s: f64,
    /// AR(1) correlation coefficient (0.0 = uncorrelated, 1.0 = fully persistent).
    pub alpha: f64,
    /// Standard deviation of the innovation noise.
    pub noise_std: f64,
    rng: StdRng,
}

impl CloudModel {
    /// Creates a seeded cloud model.
    ///
    /// # Panics
    ///
    /// Panics if `interval_s <= 0` or `alpha` is outside `[0, 1]`.
    pub fn new(base_irradiance: f64, interval_s: f64, alpha: f64, noise_std: f64, seed: u64) -> Self {
        assert!(interval_s > 0.0, "interval_s must be > 0");
        assert!((0.0..=1.0).contains(&alpha), "alpha must be in [0, 1]");
        Self {
            base_irradiance,
            interval_s,
            alpha,
            noise_std: noise_std.max(0.0),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Generates irradiance changes at every interval in `(0, duration_s)`.
    pub fn generate(&mut self, duration_s: f64) -> Vec<EnvironmentChange> {
        let mut changes = Vec::new();
        let mut multiplier = 1.0;
        let mut k = 1_usize;
        loop {
            let t = k as f64 * self.interval_s;
            if t >= duration_s {
                break;
            }
            let eps = gaussian_noise(&mut self.rng, self.noise_std);
            multiplier = (self.alpha * multiplier + (1.0 - self.alpha) * (1.0 + eps))
                .clamp(MULTIPLIER_MIN, MULTIPLIER_MAX);
            changes.push(EnvironmentChange::irradiance(
                t,
                self.base_irradiance * multiplier,
            ));
            k += 1;
        }
        changes
    }
}

/// Gaussian noise with mean 0 via the Box-Muller transform.
fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }

    let u1: f64 = rng.random::<f64>().clamp(1e-12, 1.0);
    let u2: f64 = rng.random::<f64>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    z0 * std_dev
}
