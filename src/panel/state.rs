//! Electrical and environmental parameters of a PV panel.

use std::ops::RangeInclusive;

/// Valid irradiance range (W/m²). Updates outside it are clamped.
pub const IRRADIANCE_RANGE: RangeInclusive<f64> = 100.0..=1500.0;

/// Valid cell temperature range (°C). Updates outside it are clamped.
pub const TEMPERATURE_RANGE: RangeInclusive<f64> = -10.0..=80.0;

/// Standard test condition irradiance (W/m²).
pub const STC_IRRADIANCE: f64 = 1000.0;

/// Standard test condition cell temperature (°C).
pub const STC_TEMPERATURE: f64 = 25.0;

fn clamp_to(value: f64, range: &RangeInclusive<f64>) -> f64 {
    value.clamp(*range.start(), *range.end())
}

/// Panel parameters shared by every I-V formula.
///
/// `voc` and `isc` are fixed for the lifetime of the panel. Irradiance and
/// temperature change only through [`PanelState::apply_environment_change`]
/// and are always inside [`IRRADIANCE_RANGE`] and [`TEMPERATURE_RANGE`].
#[derive(Debug, Clone, PartialEq)]
pub struct PanelState {
    /// Open-circuit voltage (V).
    pub voc: f64,
    /// Short-circuit current at STC (A).
    pub isc: f64,
    /// Series resistance (Ω).
    pub r_s: f64,
    /// Shunt resistance (Ω).
    pub r_sh: f64,
    /// Diode ideality factor.
    pub diode_factor: f64,
    /// Number of series-connected cells sharing the panel voltage.
    pub cells_in_series: u32,
    irradiance: f64,
    temperature: f64,
}

impl PanelState {
    /// Creates a panel state at standard test conditions.
    ///
    /// # Arguments
    ///
    /// * `voc` - Open-circuit voltage (V)
    /// * `isc` - Short-circuit current (A)
    /// * `r_s` - Series resistance (Ω)
    /// * `r_sh` - Shunt resistance (Ω)
    /// * `diode_factor` - Diode ideality factor
    /// * `cells_in_series` - Series cell count (at least 1)
    ///
    /// Negative electrical parameters are clamped to zero.
    pub fn new(
        voc: f64,
        isc: f64,
        r_s: f64,
        r_sh: f64,
        diode_factor: f64,
        cells_in_series: u32,
    ) -> Self {
        Self {
            voc: voc.max(0.0),
            isc: isc.max(0.0),
            r_s: r_s.max(0.0),
            r_sh: r_sh.max(0.0),
            diode_factor: diode_factor.max(0.0),
            cells_in_series: cells_in_series.max(1),
            irradiance: STC_IRRADIANCE,
            temperature: STC_TEMPERATURE,
        }
    }

    /// Sets the initial environment, clamping both values into range.
    pub fn with_environment(mut self, irradiance: f64, temperature: f64) -> Self {
        self.apply_environment_change(Some(irradiance), Some(temperature));
        self
    }

    /// Current irradiance (W/m²).
    pub fn irradiance(&self) -> f64 {
        self.irradiance
    }

    /// Current cell temperature (°C).
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Updates irradiance and/or temperature in place.
    ///
    /// Each provided value is clamped to its valid range independently;
    /// `None` leaves the corresponding parameter untouched.
    pub fn apply_environment_change(&mut self, irradiance: Option<f64>, temperature: Option<f64>) {
        if let Some(g) = irradiance {
            self.irradiance = clamp_to(g, &IRRADIANCE_RANGE);
        }
        if let Some(t) = temperature {
            self.temperature = clamp_to(t, &TEMPERATURE_RANGE);
        }
    }

    /// Clamps a voltage into `[0, voc]`.
    pub fn clamp_voltage(&self, voltage: f64) -> f64 {
        if voltage.is_nan() {
            return 0.0;
        }
        voltage.clamp(0.0, self.voc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> PanelState {
        PanelState::new(40.0, 8.5, 0.5, 100.0, 1.3, 60)
    }

    #[test]
    fn starts_at_standard_conditions() {
        let s = state();
        assert_eq!(s.irradiance(), 1000.0);
        assert_eq!(s.temperature(), 25.0);
    }

    #[test]
    fn empty_change_is_noop() {
        let mut s = state().with_environment(850.0, 31.0);
        let before = s.clone();
        s.apply_environment_change(None, None);
        assert_eq!(s, before);
    }

    #[test]
    fn irradiance_clamped_to_upper_bound() {
        let mut s = state();
        s.apply_environment_change(Some(2000.0), None);
        assert_eq!(s.irradiance(), 1500.0);
        assert_eq!(s.temperature(), 25.0);
    }

    #[test]
    fn irradiance_clamped_to_lower_bound() {
        let mut s = state();
        s.apply_environment_change(Some(0.0), None);
        assert_eq!(s.irradiance(), 100.0);
    }

    #[test]
    fn temperature_clamped_independently() {
        let mut s = state();
        s.apply_environment_change(None, Some(120.0));
        assert_eq!(s.temperature(), 80.0);
        assert_eq!(s.irradiance(), 1000.0);
        s.apply_environment_change(None, Some(-40.0));
        assert_eq!(s.temperature(), -10.0);
    }

    #[test]
    fn initial_environment_is_clamped() {
        let s = state().with_environment(50.0, 95.0);
        assert_eq!(s.irradiance(), 100.0);
        assert_eq!(s.temperature(), 80.0);
    }

    #[test]
    fn negative_parameters_clamped() {
        let s = PanelState::new(-1.0, -2.0, -0.5, -100.0, -1.0, 0);
        assert_eq!(s.voc, 0.0);
        assert_eq!(s.isc, 0.0);
        assert_eq!(s.r_s, 0.0);
        assert_eq!(s.r_sh, 0.0);
        assert_eq!(s.cells_in_series, 1);
    }

    #[test]
    fn voltage_clamp() {
        let s = state();
        assert_eq!(s.clamp_voltage(-3.0), 0.0);
        assert_eq!(s.clamp_voltage(55.0), 40.0);
        assert_eq!(s.clamp_voltage(12.5), 12.5);
        assert_eq!(s.clamp_voltage(f64::NAN), 0.0);
    }
}
