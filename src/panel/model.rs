//! I-V formulas and the panel model that evaluates them.

use super::curve::{IvCurve, OperatingPoint};
use super::state::{PanelState, STC_IRRADIANCE, STC_TEMPERATURE};

/// Boltzmann constant (J/K).
const BOLTZMANN: f64 = 1.380649e-23;
/// Elementary charge (C).
const ELECTRON_CHARGE: f64 = 1.602176634e-19;
/// Offset from Celsius to Kelvin.
const KELVIN_OFFSET: f64 = 273.15;
/// Photocurrent temperature coefficient (1/°C).
const PHOTOCURRENT_TEMP_COEFF: f64 = 0.0025;
/// Beyond this exponent `exp(x) - 1` and `exp(x)` agree to machine precision.
const EXP_LINEAR_LIMIT: f64 = 50.0;

/// Selectable current-voltage relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IvFormula {
    /// `I = isc · (G/1000) · (1 − V/voc)`.
    Linear,
    /// Photocurrent minus shunt leakage minus an exponential diode term.
    SingleDiode,
}

impl IvFormula {
    /// Config name of the formula.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::SingleDiode => "single_diode",
        }
    }

    /// Evaluates the formula at a voltage already clamped into `[0, voc]`.
    ///
    /// The result is not clamped; callers clamp it to non-negative.
    fn evaluate(&self, state: &PanelState, voltage: f64) -> f64 {
        match self {
            Self::Linear => linear_current(state, voltage),
            Self::SingleDiode => single_diode_current(state, voltage),
        }
    }
}

fn linear_current(state: &PanelState, voltage: f64) -> f64 {
    if state.voc <= 0.0 {
        return 0.0;
    }
    state.isc * (state.irradiance() / STC_IRRADIANCE) * (1.0 - voltage / state.voc)
}

fn photocurrent(state: &PanelState) -> f64 {
    state.isc
        * (state.irradiance() / STC_IRRADIANCE)
        * (1.0 + PHOTOCURRENT_TEMP_COEFF * (state.temperature() - STC_TEMPERATURE))
}

/// Single-diode current.
///
/// The saturation current is solved from `I(voc) = 0` at the present
/// irradiance and temperature, so the curve always closes at `voc`. The
/// diode term is evaluated as a ratio against its value at `voc`, which
/// keeps it finite even when `exp` would overflow.
fn single_diode_current(state: &PanelState, voltage: f64) -> f64 {
    if state.voc <= 0.0 {
        return 0.0;
    }

    let i_ph = photocurrent(state);
    let offset = state.r_s * i_ph;
    let leakage = |v: f64| {
        if state.r_sh > 0.0 {
            (v + offset) / state.r_sh
        } else {
            0.0
        }
    };

    let headroom = i_ph - leakage(state.voc);
    if headroom <= 0.0 {
        return i_ph - leakage(voltage);
    }

    let temp_k = KELVIN_OFFSET + state.temperature();
    let thermal_v =
        state.diode_factor * f64::from(state.cells_in_series) * BOLTZMANN * temp_k / ELECTRON_CHARGE;

    let ratio = if thermal_v > 0.0 {
        let x = (voltage + offset) / thermal_v;
        let x_oc = (state.voc + offset) / thermal_v;
        if x_oc > EXP_LINEAR_LIMIT {
            (x - x_oc).exp()
        } else {
            x.exp_m1() / x_oc.exp_m1()
        }
    } else if voltage >= state.voc {
        1.0
    } else {
        0.0
    };

    i_ph - leakage(voltage) - headroom * ratio
}

/// PV panel: mutable environment plus a fixed I-V formula.
///
/// Evaluation never mutates state. Environment changes go through
/// [`Panel::apply_environment_change`].
///
/// # Examples
///
/// ```
/// use mppt_sim::panel::Panel;
///
/// let panel = Panel::linear(40.0, 8.5);
/// assert!((panel.current_at(20.0) - 4.25).abs() < 1e-12);
/// assert_eq!(panel.current_at(40.0), 0.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    state: PanelState,
    formula: IvFormula,
}

impl Panel {
    /// Creates a panel from its state and formula.
    pub fn new(state: PanelState, formula: IvFormula) -> Self {
        Self { state, formula }
    }

    /// Linear-model panel at standard test conditions.
    pub fn linear(voc: f64, isc: f64) -> Self {
        Self::new(
            PanelState::new(voc, isc, 0.0, 0.0, 1.0, 1),
            IvFormula::Linear,
        )
    }

    /// Returns the panel parameters.
    pub fn state(&self) -> &PanelState {
        &self.state
    }

    /// Returns the active I-V formula.
    pub fn formula(&self) -> IvFormula {
        self.formula
    }

    /// Open-circuit voltage (V).
    pub fn voc(&self) -> f64 {
        self.state.voc
    }

    /// Output current at `voltage`.
    ///
    /// The voltage is clamped into `[0, voc]` before evaluation and the
    /// result is clamped to be non-negative.
    pub fn current_at(&self, voltage: f64) -> f64 {
        let v = self.state.clamp_voltage(voltage);
        let current = self.formula.evaluate(&self.state, v);
        if current.is_nan() { 0.0 } else { current.max(0.0) }
    }

    /// Voltage, current and power at `voltage` (after clamping).
    pub fn operating_point(&self, voltage: f64) -> OperatingPoint {
        let v = self.state.clamp_voltage(voltage);
        OperatingPoint::new(v, self.current_at(v))
    }

    /// Updates irradiance and/or temperature, clamped to their valid ranges.
    pub fn apply_environment_change(&mut self, irradiance: Option<f64>, temperature: Option<f64>) {
        self.state.apply_environment_change(irradiance, temperature);
    }

    /// Lazily evaluated I-V curve with `points` samples from 0 to `voc`.
    ///
    /// Every call evaluates against the present environment.
    pub fn iv_curve(&self, points: usize) -> IvCurve<'_> {
        IvCurve::new(self, points)
    }

    /// Highest-power sample of the `points`-sample curve.
    ///
    /// Returns `None` when `points` is zero.
    pub fn maximum_power_point(&self, points: usize) -> Option<OperatingPoint> {
        self.iv_curve(points)
            .fold(None, |best: Option<OperatingPoint>, p| match best {
                Some(b) if b.power >= p.power => Some(b),
                _ => Some(p),
            })
    }
}
