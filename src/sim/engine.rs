//! Simulation engine that drives the panel, the MPPT controller and the
//! environment schedule.

use super::clock::Clock;
use super::controller::{MpptController, PerturbObserve};
use super::event::EnvironmentSchedule;
use super::kpi::theoretical_max_power;
use super::sink::SampleSink;
use super::types::{History, OperatingMode, Sample, SimConfig, duty_cycle_index};
use crate::panel::{OperatingPoint, Panel};

/// Upper bound on the history capacity reserved up front.
const PREALLOCATED_SAMPLES: usize = 4096;

/// Simulation engine owning the panel, controller, schedule and history.
///
/// Generic over `C: MpptController` for static dispatch. Sinks are boxed
/// since any number of observers can be registered.
pub struct Engine<C: MpptController = PerturbObserve> {
    config: SimConfig,
    panel: Panel,
    controller: C,
    schedule: EnvironmentSchedule,
    clock: Clock,
    history: History,
    sinks: Vec<Box<dyn SampleSink + Send>>,
}

impl<C: MpptController> Engine<C> {
    /// Creates a new simulation engine.
    ///
    /// # Arguments
    ///
    /// * `config` - Run configuration (step, duration, pacing, mode)
    /// * `panel` - Panel model at its initial environment
    /// * `controller` - MPPT control law
    /// * `schedule` - Environment changes to apply during the run
    pub fn new(
        config: SimConfig,
        panel: Panel,
        controller: C,
        schedule: EnvironmentSchedule,
    ) -> Self {
        let clock = Clock::from_config(&config);
        let history = History::with_capacity(clock.total().min(PREALLOCATED_SAMPLES));
        Self {
            config,
            panel,
            controller,
            schedule,
            clock,
            history,
            sinks: Vec::new(),
        }
    }

    /// Registers a sink that receives every sample produced from now on.
    pub fn add_sink(&mut self, sink: impl SampleSink + Send + 'static) {
        self.sinks.push(Box::new(sink));
    }

    /// Executes one iteration and returns its sample.
    ///
    /// # Returns
    ///
    /// * `Some(sample)` - The sample appended to the history
    /// * `None` - If the run has already reached its duration or iteration cap
    pub fn step(&mut self) -> Option<Sample> {
        let tick = self.clock.tick()?;

        // 1. Environment changes that became due
        for change in self.schedule.due(tick.time_s) {
            self.panel
                .apply_environment_change(change.irradiance, change.temperature);
            tracing::info!(
                iteration = tick.iteration,
                time_s = tick.time_s,
                trigger_time = change.trigger_time,
                irradiance = self.panel.state().irradiance(),
                temperature = self.panel.state().temperature(),
                "environment change applied"
            );
        }

        // 2. Physical operating point
        let max_power = theoretical_max_power(self.panel.iv_curve(self.config.curve_points));
        let point = self.measure();

        // 3. Controller update
        let operating_point = self.controller.update(point.voltage, point.current);

        // 4. Record and hand off
        let state = self.panel.state();
        let sample = Sample {
            iteration: tick.iteration,
            time_s: tick.time_s,
            voltage: point.voltage,
            current: point.current,
            power: point.power,
            operating_point,
            irradiance: state.irradiance(),
            temperature: state.temperature(),
            max_power,
        };
        tracing::debug!(
            iteration = sample.iteration,
            voltage = sample.voltage,
            power = sample.power,
            operating_point = sample.operating_point,
            "iteration complete"
        );

        self.history.push(sample.clone());
        for sink in &mut self.sinks {
            sink.on_sample(&sample);
        }

        // 5. Advance
        self.clock.pace();
        Some(sample)
    }

    /// Voltage and current at the controller's present operating point.
    fn measure(&self) -> OperatingPoint {
        let commanded = self.controller.operating_point();
        match self.config.mode {
            OperatingMode::Voltage => self.panel.operating_point(commanded),
            OperatingMode::DutyCycle => {
                let curve = self.panel.iv_curve(self.config.curve_points);
                let index = duty_cycle_index(commanded, curve.points());
                curve
                    .sample(index)
                    .unwrap_or_else(|| self.panel.operating_point(0.0))
            }
        }
    }

    /// Executes every remaining iteration and returns the history.
    pub fn run(&mut self) -> &History {
        tracing::info!(
            iterations = self.clock.total(),
            step_s = self.config.step_s,
            mode = self.config.mode.name(),
            "simulation started"
        );
        while self.step().is_some() {}
        tracing::info!(
            samples = self.history.len(),
            environment_changes = self.schedule.applied(),
            "simulation finished"
        );
        &self.history
    }

    /// Samples recorded so far.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Consumes the engine and returns the history.
    pub fn into_history(self) -> History {
        self.history
    }

    /// Returns the panel in its present environment.
    pub fn panel(&self) -> &Panel {
        &self.panel
    }

    /// Returns the controller.
    pub fn controller(&self) -> &C {
        &self.controller
    }

    /// Returns a reference to the simulation configuration.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Number of environment changes applied so far.
    pub fn environment_changes_applied(&self) -> usize {
        self.schedule.applied()
    }

    /// Whether the run has reached its duration or iteration cap.
    pub fn is_finished(&self) -> bool {
        self.clock.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;
    use crate::panel::{IvFormula, PanelState};
    use crate::sim::controller::{Bounds, Policy};
    use crate::sim::event::EnvironmentChange;

    fn linear_engine(duration_s: f64) -> Engine {
        let config = SimConfig::new(1.0, duration_s, OperatingMode::Voltage);
        let panel = Panel::linear(40.0, 8.5);
        let controller =
            PerturbObserve::new(Policy::Directional, Bounds::voltage(40.0), 30.0, 0.5);
        Engine::new(config, panel, controller, EnvironmentSchedule::empty())
    }

    #[test]
    fn run_produces_one_sample_per_step() {
        let mut engine = linear_engine(100.0);
        let n = engine.run().len();
        assert_eq!(n, 100);
        assert!(engine.is_finished());
        assert!(engine.step().is_none());
        assert_eq!(engine.history().len(), 100);
    }

    #[test]
    fn first_sample_uses_initial_voltage() {
        let mut engine = linear_engine(5.0);
        let s = engine.step().expect("first sample");
        assert_eq!(s.iteration, 0);
        assert_eq!(s.time_s, 0.0);
        assert_eq!(s.voltage, 30.0);
        assert!((s.current - 2.125).abs() < 1e-12);
        assert_eq!(s.operating_point, 30.5);
        assert!((s.max_power - 85.0).abs() < 0.1);
    }

    #[test]
    fn linear_panel_converges_to_half_voc() {
        let mut engine = linear_engine(100.0);
        engine.run();
        let tail = &engine.history().samples()[60..];
        for s in tail {
            assert!((s.voltage - 20.0).abs() <= 0.5 + 1e-9, "voltage {}", s.voltage);
        }
    }

    #[test]
    fn environment_change_applies_once_at_trigger() {
        let config = SimConfig::new(1.0, 30.0, OperatingMode::Voltage);
        let schedule = EnvironmentSchedule::new(vec![EnvironmentChange::irradiance(20.0, 800.0)]);
        let controller =
            PerturbObserve::new(Policy::Directional, Bounds::voltage(40.0), 30.0, 0.5);
        let mut engine = Engine::new(config, Panel::linear(40.0, 8.5), controller, schedule);
        engine.run();
        for s in engine.history().samples() {
            let expected = if s.time_s < 20.0 { 1000.0 } else { 800.0 };
            assert_eq!(s.irradiance, expected, "t={}", s.time_s);
        }
        assert_eq!(engine.environment_changes_applied(), 1);
        assert_eq!(engine.panel().state().irradiance(), 800.0);
    }

    #[test]
    fn duty_cycle_mode_reads_the_curve() {
        let config = SimConfig::new(1.0, 1.0, OperatingMode::DutyCycle);
        let panel = Panel::new(
            PanelState::new(48.0, 10.0, 0.5, 100.0, 1.3, 60),
            IvFormula::SingleDiode,
        );
        let expected = panel.iv_curve(100).sample(50);
        let controller = PerturbObserve::new(Policy::Directional, Bounds::default(), 0.5, 0.01);
        let mut engine = Engine::new(config, panel, controller, EnvironmentSchedule::empty());
        let s = engine.step().expect("sample");
        assert_eq!(Some(s.voltage), expected.map(|p| p.voltage));
        assert_eq!(Some(s.current), expected.map(|p| p.current));
    }

    #[test]
    fn duty_cycle_output_stays_in_bounds() {
        let config = SimConfig::new(1.0, 200.0, OperatingMode::DutyCycle);
        let controller = PerturbObserve::new(Policy::PowerOnly, Bounds::default(), 0.5, 0.01);
        let mut engine = Engine::new(
            config,
            Panel::linear(40.0, 8.5),
            controller,
            EnvironmentSchedule::empty(),
        );
        engine.run();
        assert!(
            engine
                .history()
                .samples()
                .iter()
                .all(|s| (0.05..=0.95).contains(&s.operating_point))
        );
    }

    #[test]
    fn sinks_receive_every_sample() {
        let (tx, rx) = mpsc::channel();
        let mut engine = linear_engine(10.0);
        engine.add_sink(tx);
        engine.run();
        let received: Vec<usize> = rx.try_iter().map(|s| s.iteration).collect();
        assert_eq!(received, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn iteration_cap_stops_early() {
        let mut config = SimConfig::new(1.0, 1000.0, OperatingMode::Voltage);
        config.max_iterations = Some(7);
        let controller =
            PerturbObserve::new(Policy::Directional, Bounds::voltage(40.0), 30.0, 0.5);
        let mut engine = Engine::new(
            config,
            Panel::linear(40.0, 8.5),
            controller,
            EnvironmentSchedule::empty(),
        );
        assert_eq!(engine.run().len(), 7);
        assert_eq!(engine.into_history().into_samples().len(), 7);
    }

    #[test]
    fn long_run_does_not_reserve_full_history() {
        let config = SimConfig::new(1e-3, 1e9, OperatingMode::Voltage);
        assert_eq!(config.total_steps(), 1_000_000_000_000);
        let controller =
            PerturbObserve::new(Policy::Directional, Bounds::voltage(40.0), 30.0, 0.5);
        let mut engine = Engine::new(
            config,
            Panel::linear(40.0, 8.5),
            controller,
            EnvironmentSchedule::empty(),
        );
        for _ in 0..3 {
            assert!(engine.step().is_some());
        }
        assert_eq!(engine.history().len(), 3);
        assert!(!engine.is_finished());
    }
}
