//! Perturb-and-observe maximum power point tracking.

/// Default lower duty-cycle bound.
pub const DEFAULT_MIN_DUTY: f64 = 0.05;
/// Default upper duty-cycle bound.
pub const DEFAULT_MAX_DUTY: f64 = 0.95;

/// Contract between the simulation engine and an MPPT control law.
///
/// The controller sees only the measured voltage and current; it never
/// inspects the panel model.
pub trait MpptController {
    /// Consumes one `(voltage, current)` measurement and returns the next
    /// operating point.
    fn update(&mut self, voltage: f64, current: f64) -> f64;

    /// The operating point the controller is currently commanding.
    fn operating_point(&self) -> f64;

    /// Direction of the most recent perturbation, if any update happened.
    fn last_direction(&self) -> Option<Direction>;
}

/// Direction of a perturbation of the operating variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Operating variable moved up by one step.
    Increase,
    /// Operating variable moved down by one step.
    Decrease,
}

impl Direction {
    /// `+1.0` or `-1.0`.
    pub fn sign(self) -> f64 {
        match self {
            Self::Increase => 1.0,
            Self::Decrease => -1.0,
        }
    }
}

/// Perturbation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Uses both the power delta and the voltage delta.
    ///
    /// Advances when power rose together with voltage, or when power did not
    /// rise and voltage did not rise either; reverses otherwise.
    Directional,
    /// Uses only the power delta: `+step` on a strict power increase,
    /// `-step` otherwise. Hunts around the maximum once it gets there.
    PowerOnly,
}

impl Policy {
    /// Config name of the policy.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Directional => "directional",
            Self::PowerOnly => "power_only",
        }
    }

    fn direction(self, power: f64, prev_power: f64, voltage: f64, prev_voltage: f64) -> Direction {
        let advance = match self {
            Self::Directional => {
                (power > prev_power && voltage > prev_voltage)
                    || (power <= prev_power && voltage <= prev_voltage)
            }
            Self::PowerOnly => power > prev_power,
        };
        if advance {
            Direction::Increase
        } else {
            Direction::Decrease
        }
    }
}

/// Inclusive range the operating variable is confined to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Lower bound (inclusive).
    pub lower: f64,
    /// Upper bound (inclusive).
    pub upper: f64,
}

impl Bounds {
    /// Creates bounds `[lower, upper]`.
    ///
    /// # Panics
    ///
    /// Panics if `lower > upper` or either bound is not finite.
    pub fn new(lower: f64, upper: f64) -> Self {
        assert!(lower.is_finite() && upper.is_finite());
        assert!(lower <= upper, "lower bound must be <= upper bound");
        Self { lower, upper }
    }

    /// Voltage-domain bounds `[0, voc]`.
    pub fn voltage(voc: f64) -> Self {
        Self::new(0.0, voc.max(0.0))
    }

    /// Duty-cycle bounds.
    pub fn duty_cycle(min_duty: f64, max_duty: f64) -> Self {
        Self::new(min_duty, max_duty)
    }

    /// Clamps `value` into the bounds. NaN maps to the lower bound.
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.lower;
        }
        value.clamp(self.lower, self.upper)
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::duty_cycle(DEFAULT_MIN_DUTY, DEFAULT_MAX_DUTY)
    }
}

/// Perturb-and-observe controller.
///
/// Holds a single operating variable (voltage or duty cycle) plus the power
/// and voltage observed on the previous update. Both memories start at zero,
/// so the first update with positive power advances the operating variable.
///
/// # Examples
///
/// ```
/// use mppt_sim::sim::controller::{Bounds, MpptController, PerturbObserve, Policy};
///
/// let mut po = PerturbObserve::new(Policy::Directional, Bounds::voltage(40.0), 30.0, 0.5);
/// assert_eq!(po.update(30.0, 2.125), 30.5);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PerturbObserve {
    policy: Policy,
    bounds: Bounds,
    value: f64,
    step: f64,
    prev_power: f64,
    prev_voltage: f64,
    last_direction: Option<Direction>,
}

impl PerturbObserve {
    /// Creates a controller.
    ///
    /// # Arguments
    ///
    /// * `policy` - Perturbation rule
    /// * `bounds` - Range of the operating variable
    /// * `initial` - Starting operating point (clamped into `bounds`)
    /// * `step` - Perturbation magnitude
    ///
    /// # Panics
    ///
    /// Panics if `step` is not a positive finite number.
    pub fn new(policy: Policy, bounds: Bounds, initial: f64, step: f64) -> Self {
        assert!(step.is_finite() && step > 0.0, "step must be > 0");
        Self {
            policy,
            bounds,
            value: bounds.clamp(initial),
            step,
            prev_power: 0.0,
            prev_voltage: 0.0,
            last_direction: None,
        }
    }

    /// Active perturbation rule.
    pub fn policy(&self) -> Policy {
        self.policy
    }

    /// Operating-variable bounds.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Perturbation magnitude.
    pub fn step_size(&self) -> f64 {
        self.step
    }

    /// Replaces the perturbation magnitude.
    ///
    /// # Panics
    ///
    /// Panics if `step` is not a positive finite number.
    pub fn set_step_size(&mut self, step: f64) {
        assert!(step.is_finite() && step > 0.0, "step must be > 0");
        self.step = step;
    }

    /// Power seen on the previous update (W).
    pub fn prev_power(&self) -> f64 {
        self.prev_power
    }
}

impl MpptController for PerturbObserve {
    fn update(&mut self, voltage: f64, current: f64) -> f64 {
        let power = voltage * current;
        let direction = self
            .policy
            .direction(power, self.prev_power, voltage, self.prev_voltage);

        self.value = self.bounds.clamp(self.value + direction.sign() * self.step);
        self.prev_power = power;
        self.prev_voltage = voltage;
        self.last_direction = Some(direction);
        self.value
    }

    fn operating_point(&self) -> f64 {
        self.value
    }

    fn last_direction(&self) -> Option<Direction> {
        self.last_direction
    }
}
