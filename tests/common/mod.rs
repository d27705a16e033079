//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use mppt_sim::panel::{IvFormula, Panel, PanelState};
use mppt_sim::sim::controller::{Bounds, PerturbObserve, Policy};
use mppt_sim::sim::engine::Engine;
use mppt_sim::sim::event::EnvironmentSchedule;
use mppt_sim::sim::types::{OperatingMode, SimConfig};

/// Linear panel used by the reference scenario (Voc 40 V, Isc 8.5 A).
pub fn linear_panel() -> Panel {
    Panel::linear(40.0, 8.5)
}

/// Single-diode panel (Voc 48 V, Isc 10 A, 0.5 Ω / 100 Ω, n = 1.3, 60 cells).
pub fn diode_panel() -> Panel {
    Panel::new(
        PanelState::new(48.0, 10.0, 0.5, 100.0, 1.3, 60),
        IvFormula::SingleDiode,
    )
}

/// Voltage-domain controller confined to `[0, voc]`.
pub fn voltage_controller(policy: Policy, voc: f64, initial: f64, step: f64) -> PerturbObserve {
    PerturbObserve::new(policy, Bounds::voltage(voc), initial, step)
}

/// Logically paced configuration with a one-second step.
pub fn logical_config(duration_s: f64, mode: OperatingMode) -> SimConfig {
    SimConfig::new(1.0, duration_s, mode)
}

/// Reference scenario: linear panel, directional policy, 0.5 V steps from
/// 30 V, 100 iterations.
pub fn reference_engine(schedule: EnvironmentSchedule) -> Engine {
    Engine::new(
        logical_config(100.0, OperatingMode::Voltage),
        linear_panel(),
        voltage_controller(Policy::Directional, 40.0, 30.0, 0.5),
        schedule,
    )
}

/// Analytical maximum power voltage of the symmetric linear model.
pub fn linear_vmpp(voc: f64) -> f64 {
    voc / 2.0
}
