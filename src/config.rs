//! TOML-based scenario configuration and preset definitions.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::panel::{IvFormula, Panel, PanelState};
use crate::sim::controller::{Bounds, DEFAULT_MAX_DUTY, DEFAULT_MIN_DUTY, PerturbObserve, Policy};
use crate::sim::engine::Engine;
use crate::sim::event::{CloudModel, EnvironmentChange, EnvironmentSchedule};
use crate::sim::types::{DEFAULT_CURVE_POINTS, OperatingMode, Pacing, SimConfig};

/// Largest number of iterations a scenario may ask for.
pub const MAX_ITERATIONS: usize = 10_000_000;

/// Top-level scenario configuration parsed from TOML.
///
/// `[panel]`, `[controller]` and `[simulation]` are mandatory and every
/// field in them must be given. The only keys that may be omitted are the
/// duty-cycle bounds (`[0.05, 0.95]`), `simulation.max_iterations`,
/// `simulation.pacing` (`"logical"`), `simulation.curve_points` (100) and
/// the `[[environment]]`/`[clouds]` sections. Load from TOML with
/// [`ScenarioConfig::from_toml_file`] or pick a preset with
/// [`ScenarioConfig::from_preset`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Panel parameters and initial environment.
    pub panel: PanelConfig,
    /// MPPT controller parameters.
    pub controller: ControllerConfig,
    /// Timing and pacing.
    pub simulation: SimulationConfig,
    /// Scheduled environment step-changes.
    #[serde(default)]
    pub environment: Vec<EnvironmentConfig>,
    /// Optional randomized cloud schedule, merged with `environment`.
    #[serde(default)]
    pub clouds: Option<CloudConfig>,
}

/// Panel parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PanelConfig {
    /// I-V formula: `"single_diode"` or `"linear"`.
    pub model: String,
    /// Open-circuit voltage (V).
    pub voc: f64,
    /// Short-circuit current (A).
    pub isc: f64,
    /// Series resistance (Ω).
    pub r_s: f64,
    /// Shunt resistance (Ω).
    pub r_sh: f64,
    /// Diode ideality factor.
    pub diode_factor: f64,
    /// Cells in series, scaling the diode thermal voltage.
    pub cells_in_series: u32,
    /// Initial irradiance (W/m², clamped to [100, 1500]).
    pub irradiance: f64,
    /// Initial cell temperature (°C, clamped to [-10, 80]).
    pub temperature: f64,
}

/// MPPT controller parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControllerConfig {
    /// Perturbation rule: `"directional"` or `"power_only"`.
    pub policy: String,
    /// Operating variable: `"voltage"` or `"duty_cycle"`.
    pub domain: String,
    /// Perturbation magnitude (V or duty fraction).
    pub step_size: f64,
    /// Starting operating point (V or duty fraction).
    pub initial: f64,
    /// Lower duty-cycle bound.
    #[serde(default = "default_min_duty")]
    pub min_duty: f64,
    /// Upper duty-cycle bound.
    #[serde(default = "default_max_duty")]
    pub max_duty: f64,
}

fn default_min_duty() -> f64 {
    DEFAULT_MIN_DUTY
}
fn default_max_duty() -> f64 {
    DEFAULT_MAX_DUTY
}

/// Simulation timing and pacing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationConfig {
    /// Simulated seconds per iteration.
    pub step: f64,
    /// Run length in simulated seconds.
    pub duration: f64,
    /// Optional cap on the number of iterations.
    #[serde(default)]
    pub max_iterations: Option<usize>,
    /// `"logical"` or `"wall_clock"`.
    #[serde(default = "default_pacing")]
    pub pacing: String,
    /// Samples per I-V curve.
    #[serde(default = "default_curve_points")]
    pub curve_points: usize,
}

fn default_pacing() -> String {
    "logical".to_string()
}
fn default_curve_points() -> usize {
    DEFAULT_CURVE_POINTS
}

/// One scheduled environment change.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentConfig {
    /// Simulated time at which the change fires (s).
    pub trigger_time: f64,
    /// New irradiance (W/m²).
    #[serde(default)]
    pub irradiance: Option<f64>,
    /// New cell temperature (°C).
    #[serde(default)]
    pub temperature: Option<f64>,
}

/// AR(1) cloud schedule parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CloudConfig {
    /// Clear-sky irradiance (W/m²).
    pub base_irradiance: f64,
    /// Seconds between irradiance changes.
    pub interval: f64,
    /// AR(1) correlation coefficient (0.0-1.0).
    pub alpha: f64,
    /// Innovation noise standard deviation.
    pub noise_std: f64,
    /// Random seed.
    pub seed: u64,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            base_irradiance: 1000.0,
            interval: 5.0,
            alpha: 0.8,
            noise_std: 0.15,
            seed: 42,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"controller.step_size"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// A validated scenario, ready to run.
#[derive(Debug, Clone)]
pub struct Scenario {
    /// Run configuration.
    pub sim_config: SimConfig,
    /// Panel at its initial environment.
    pub panel: Panel,
    /// Controller at its initial operating point.
    pub controller: PerturbObserve,
    /// Environment changes, configured and generated.
    pub schedule: EnvironmentSchedule,
}

impl Scenario {
    /// Wraps the scenario in an engine.
    pub fn into_engine(self) -> Engine {
        Engine::new(self.sim_config, self.panel, self.controller, self.schedule)
    }
}

impl ScenarioConfig {
    /// Returns the baseline scenario: single-diode panel tracked in the
    /// voltage domain while irradiance drops at t=20 and rises at t=40.
    pub fn baseline() -> Self {
        Self {
            panel: PanelConfig {
                model: "single_diode".to_string(),
                voc: 48.0,
                isc: 10.0,
                r_s: 0.5,
                r_sh: 100.0,
                diode_factor: 1.3,
                cells_in_series: 60,
                irradiance: 1000.0,
                temperature: 25.0,
            },
            controller: ControllerConfig {
                policy: "directional".to_string(),
                domain: "voltage".to_string(),
                step_size: 0.5,
                initial: 30.0,
                min_duty: DEFAULT_MIN_DUTY,
                max_duty: DEFAULT_MAX_DUTY,
            },
            simulation: SimulationConfig {
                step: 1.0,
                duration: 60.0,
                max_iterations: None,
                pacing: default_pacing(),
                curve_points: DEFAULT_CURVE_POINTS,
            },
            environment: vec![
                EnvironmentConfig {
                    trigger_time: 20.0,
                    irradiance: Some(800.0),
                    temperature: None,
                },
                EnvironmentConfig {
                    trigger_time: 40.0,
                    irradiance: Some(1200.0),
                    temperature: None,
                },
            ],
            clouds: None,
        }
    }

    /// Returns the linear preset: Voc 40 V, Isc 8.5 A, directional policy
    /// from 30 V for 100 iterations.
    pub fn linear() -> Self {
        let base = Self::baseline();
        Self {
            panel: PanelConfig {
                model: "linear".to_string(),
                voc: 40.0,
                isc: 8.5,
                ..base.panel
            },
            simulation: SimulationConfig {
                duration: 100.0,
                ..base.simulation
            },
            environment: Vec::new(),
            ..base
        }
    }

    /// Returns the power-only preset: the linear panel tracked by the
    /// power-only rule, which hunts around the maximum.
    pub fn power_only() -> Self {
        let linear = Self::linear();
        Self {
            controller: ControllerConfig {
                policy: "power_only".to_string(),
                initial: 10.0,
                ..linear.controller
            },
            ..linear
        }
    }

    /// Returns the duty-cycle preset: single-diode panel driven through
    /// the I-V curve from the open-circuit end.
    pub fn duty_cycle() -> Self {
        let base = Self::baseline();
        Self {
            controller: ControllerConfig {
                policy: "power_only".to_string(),
                domain: "duty_cycle".to_string(),
                step_size: 0.01,
                initial: DEFAULT_MIN_DUTY,
                ..base.controller
            },
            ..base
        }
    }

    /// Returns the cloudy preset: baseline with an AR(1) cloud schedule.
    pub fn cloudy() -> Self {
        Self {
            environment: Vec::new(),
            clouds: Some(CloudConfig::default()),
            ..Self::baseline()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "linear", "power_only", "duty_cycle", "cloudy"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "linear" => Ok(Self::linear()),
            "power_only" => Ok(Self::power_only()),
            "duty_cycle" => Ok(Self::duty_cycle()),
            "cloudy" => Ok(Self::cloudy()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid, misses a required
    /// field or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let p = &self.panel;
        if p.model != "single_diode" && p.model != "linear" {
            errors.push(ConfigError::new(
                "panel.model",
                format!("must be \"single_diode\" or \"linear\", got \"{}\"", p.model),
            ));
        }
        positive(&mut errors, "panel.voc", p.voc);
        positive(&mut errors, "panel.isc", p.isc);
        if !(p.r_s.is_finite() && p.r_s >= 0.0) {
            errors.push(ConfigError::new("panel.r_s", "must be >= 0"));
        }
        positive(&mut errors, "panel.r_sh", p.r_sh);
        positive(&mut errors, "panel.diode_factor", p.diode_factor);
        if p.cells_in_series == 0 {
            errors.push(ConfigError::new("panel.cells_in_series", "must be > 0"));
        }
        finite(&mut errors, "panel.irradiance", p.irradiance);
        finite(&mut errors, "panel.temperature", p.temperature);

        let c = &self.controller;
        if c.policy != "directional" && c.policy != "power_only" {
            errors.push(ConfigError::new(
                "controller.policy",
                format!("must be \"directional\" or \"power_only\", got \"{}\"", c.policy),
            ));
        }
        if c.domain != "voltage" && c.domain != "duty_cycle" {
            errors.push(ConfigError::new(
                "controller.domain",
                format!("must be \"voltage\" or \"duty_cycle\", got \"{}\"", c.domain),
            ));
        }
        positive(&mut errors, "controller.step_size", c.step_size);
        finite(&mut errors, "controller.initial", c.initial);
        if !(0.0..=1.0).contains(&c.min_duty) {
            errors.push(ConfigError::new("controller.min_duty", "must be in [0.0, 1.0]"));
        }
        if !(0.0..=1.0).contains(&c.max_duty) {
            errors.push(ConfigError::new("controller.max_duty", "must be in [0.0, 1.0]"));
        }
        if c.min_duty > c.max_duty {
            errors.push(ConfigError::new(
                "controller.min_duty",
                "must be <= controller.max_duty",
            ));
        }

        let s = &self.simulation;
        positive(&mut errors, "simulation.step", s.step);
        if !(s.duration.is_finite() && s.duration >= 0.0) {
            errors.push(ConfigError::new("simulation.duration", "must be >= 0"));
        }
        if s.pacing != "logical" && s.pacing != "wall_clock" {
            errors.push(ConfigError::new(
                "simulation.pacing",
                format!("must be \"logical\" or \"wall_clock\", got \"{}\"", s.pacing),
            ));
        }
        if s.step.is_finite() && s.step > 0.0 && s.duration.is_finite() && s.duration >= 0.0 {
            let requested = (s.duration / s.step).ceil();
            let iterations = s
                .max_iterations
                .map_or(requested, |cap| requested.min(cap as f64));
            if iterations > MAX_ITERATIONS as f64 {
                errors.push(ConfigError::new(
                    "simulation.duration",
                    format!(
                        "duration / step asks for {requested:.0} iterations, \
                         at most {MAX_ITERATIONS} allowed"
                    ),
                ));
            }
        }
        if s.curve_points < 2 {
            errors.push(ConfigError::new("simulation.curve_points", "must be >= 2"));
        }

        for (i, e) in self.environment.iter().enumerate() {
            if !(e.trigger_time.is_finite() && e.trigger_time >= 0.0) {
                errors.push(ConfigError::new(
                    format!("environment[{i}].trigger_time"),
                    "must be >= 0",
                ));
            }
            if e.irradiance.is_none() && e.temperature.is_none() {
                errors.push(ConfigError::new(
                    format!("environment[{i}]"),
                    "must set irradiance or temperature",
                ));
            }
            if let Some(g) = e.irradiance {
                finite(&mut errors, &format!("environment[{i}].irradiance"), g);
            }
            if let Some(t) = e.temperature {
                finite(&mut errors, &format!("environment[{i}].temperature"), t);
            }
        }

        if let Some(cl) = &self.clouds {
            positive(&mut errors, "clouds.base_irradiance", cl.base_irradiance);
            positive(&mut errors, "clouds.interval", cl.interval);
            if !(0.0..=1.0).contains(&cl.alpha) {
                errors.push(ConfigError::new("clouds.alpha", "must be in [0.0, 1.0]"));
            }
            if !(cl.noise_std.is_finite() && cl.noise_std >= 0.0) {
                errors.push(ConfigError::new("clouds.noise_std", "must be >= 0"));
            }
        }

        errors
    }

    /// Validates the configuration and builds the runnable scenario.
    ///
    /// # Errors
    ///
    /// Returns every validation error if the configuration is invalid.
    pub fn build(&self) -> Result<Scenario, Vec<ConfigError>> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(errors);
        }

        let s = &self.simulation;
        let mode = if self.controller.domain == "voltage" {
            OperatingMode::Voltage
        } else {
            OperatingMode::DutyCycle
        };
        let mut sim_config = SimConfig::new(s.step, s.duration, mode);
        sim_config.max_iterations = s.max_iterations;
        sim_config.curve_points = s.curve_points;
        sim_config.pacing = if s.pacing == "wall_clock" {
            Pacing::WallClock
        } else {
            Pacing::Logical
        };

        let p = &self.panel;
        let formula = if p.model == "linear" {
            IvFormula::Linear
        } else {
            IvFormula::SingleDiode
        };
        let state = PanelState::new(p.voc, p.isc, p.r_s, p.r_sh, p.diode_factor, p.cells_in_series)
            .with_environment(p.irradiance, p.temperature);
        let panel = Panel::new(state, formula);

        let c = &self.controller;
        let policy = if c.policy == "power_only" {
            Policy::PowerOnly
        } else {
            Policy::Directional
        };
        let bounds = match mode {
            OperatingMode::Voltage => Bounds::voltage(p.voc),
            OperatingMode::DutyCycle => Bounds::duty_cycle(c.min_duty, c.max_duty),
        };
        let controller = PerturbObserve::new(policy, bounds, c.initial, c.step_size);

        let mut changes: Vec<EnvironmentChange> = self
            .environment
            .iter()
            .map(|e| EnvironmentChange {
                trigger_time: e.trigger_time,
                irradiance: e.irradiance,
                temperature: e.temperature,
            })
            .collect();
        if let Some(cl) = &self.clouds {
            let mut model =
                CloudModel::new(cl.base_irradiance, cl.interval, cl.alpha, cl.noise_std, cl.seed);
            changes.extend(model.generate(s.duration));
        }

        Ok(Scenario {
            sim_config,
            panel,
            controller,
            schedule: EnvironmentSchedule::new(changes),
        })
    }
}

fn positive(errors: &mut Vec<ConfigError>, field: &str, value: f64) {
    if !(value.is_finite() && value > 0.0) {
        errors.push(ConfigError::new(field, "must be > 0"));
    }
}

fn finite(errors: &mut Vec<ConfigError>, field: &str, value: f64) {
    if !value.is_finite() {
        errors.push(ConfigError::new(field, "must be a finite number"));
    }
}
