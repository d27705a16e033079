//! Simulation runner and TUI application state.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::config::{ConfigError, ScenarioConfig};
use crate::sim::engine::Engine;
use crate::sim::types::{Pacing, Sample};

/// Maximum number of samples kept for the rolling charts.
const MAX_HISTORY: usize = 200;

/// Tick interval options in milliseconds (slowest → fastest).
const SPEED_LEVELS_MS: [u64; 6] = [500, 250, 100, 50, 20, 5];

/// Default speed index (100 ms).
const DEFAULT_SPEED_IDX: usize = 2;

/// Builds an engine for interactive use.
///
/// The UI owns the pacing, so the engine always runs logically.
fn build_engine(cfg: &ScenarioConfig) -> Result<Engine, Vec<ConfigError>> {
    let mut scenario = cfg.build()?;
    scenario.sim_config.pacing = Pacing::Logical;
    Ok(scenario.into_engine())
}

/// TUI application state.
pub struct App {
    /// Simulation engine.
    engine: Engine,
    /// Current scenario configuration (kept for restart).
    scenario: ScenarioConfig,
    /// Rolling window of samples for the charts.
    pub history: VecDeque<Sample>,
    /// Total iterations in the run.
    pub total_steps: usize,
    /// Whether the simulation is paused.
    pub paused: bool,
    /// Current index into `SPEED_LEVELS_MS`.
    pub speed_idx: usize,
    /// Whether the user has requested quit.
    pub quit: bool,
    /// When the last simulation tick was executed.
    last_tick: Instant,
    /// Name of the active preset or scenario file.
    pub preset_name: String,
}

impl App {
    /// Creates a new app for a scenario.
    ///
    /// # Errors
    ///
    /// Returns the validation errors if the scenario is invalid.
    pub fn new(scenario: ScenarioConfig, name: &str) -> Result<Self, Vec<ConfigError>> {
        let engine = build_engine(&scenario)?;
        let total_steps = engine.config().total_steps();
        Ok(Self {
            engine,
            scenario,
            history: VecDeque::with_capacity(MAX_HISTORY),
            total_steps,
            paused: false,
            speed_idx: DEFAULT_SPEED_IDX,
            quit: false,
            last_tick: Instant::now(),
            preset_name: name.to_string(),
        })
    }

    /// Advances the simulation by one iteration if not finished.
    pub fn tick(&mut self) {
        let Some(sample) = self.engine.step() else {
            return;
        };
        if self.history.len() >= MAX_HISTORY {
            self.history.pop_front();
        }
        self.history.push_back(sample);
    }

    /// Runs one iteration once the tick interval has elapsed.
    ///
    /// Returns `true` if an iteration ran. Paused or finished runs never tick.
    pub fn tick_if_due(&mut self) -> bool {
        if self.idle() || self.last_tick.elapsed() < self.tick_interval() {
            return false;
        }
        self.tick();
        self.last_tick = Instant::now();
        true
    }

    /// How long the UI may wait for input before the next iteration is due.
    ///
    /// An idle run waits a full interval so the screen is not redrawn in a
    /// busy loop.
    pub fn until_next_tick(&self) -> Duration {
        let interval = self.tick_interval();
        if self.idle() {
            return interval;
        }
        (self.last_tick + interval).saturating_duration_since(Instant::now())
    }

    fn idle(&self) -> bool {
        self.paused || self.is_finished()
    }

    fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms())
    }

    /// Toggles pause/resume.
    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// Increases simulation speed (shorter tick interval).
    pub fn speed_up(&mut self) {
        if self.speed_idx + 1 < SPEED_LEVELS_MS.len() {
            self.speed_idx += 1;
        }
    }

    /// Decreases simulation speed (longer tick interval).
    pub fn speed_down(&mut self) {
        if self.speed_idx > 0 {
            self.speed_idx -= 1;
        }
    }

    /// Returns the current tick interval in milliseconds.
    pub fn tick_interval_ms(&self) -> u64 {
        SPEED_LEVELS_MS[self.speed_idx]
    }

    /// Switches to a different preset, resetting simulation state.
    pub fn switch_preset(&mut self, name: &str) {
        let Ok(scenario) = ScenarioConfig::from_preset(name) else {
            return;
        };
        if self.load(scenario) {
            self.preset_name = name.to_string();
        }
    }

    /// Restarts the current scenario from the beginning.
    pub fn restart(&mut self) {
        self.load(self.scenario.clone());
    }

    fn load(&mut self, scenario: ScenarioConfig) -> bool {
        let Ok(engine) = build_engine(&scenario) else {
            return false;
        };
        self.total_steps = engine.config().total_steps();
        self.engine = engine;
        self.scenario = scenario;
        self.history.clear();
        self.paused = false;
        true
    }

    /// Iterations executed so far.
    pub fn iteration(&self) -> usize {
        self.engine.history().len()
    }

    /// Returns `true` when every iteration has been executed.
    pub fn is_finished(&self) -> bool {
        self.engine.is_finished()
    }

    /// Returns the most recent sample, if any.
    pub fn last_sample(&self) -> Option<&Sample> {
        self.history.back()
    }

    /// Environment changes applied so far.
    pub fn environment_changes(&self) -> usize {
        self.engine.environment_changes_applied()
    }

    /// Operating domain name of the active scenario.
    pub fn mode_name(&self) -> &'static str {
        self.engine.config().mode.name()
    }

    /// Panel I-V curve under the present environment as `(V, A)` pairs.
    ///
    /// Sampled at the scenario's `curve_points` resolution, from 0 V to Voc.
    pub fn iv_curve(&self) -> Vec<(f64, f64)> {
        self.engine
            .panel()
            .iv_curve(self.engine.config().curve_points)
            .map(|p| (p.voltage, p.current))
            .collect()
    }

    /// Latest measured `(V, A)` point, marked on the I-V chart.
    pub fn operating_marker(&self) -> Option<(f64, f64)> {
        self.last_sample().map(|s| (s.voltage, s.current))
    }

    /// Mean tracking efficiency over the whole run so far (%).
    pub fn mean_efficiency(&self) -> f64 {
        let samples = self.engine.history().samples();
        if samples.is_empty() {
            return 0.0;
        }
        samples.iter().map(Sample::efficiency_pct).sum::<f64>() / samples.len() as f64
    }
}
