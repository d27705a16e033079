//! Photovoltaic panel and perturb-and-observe MPPT simulator.

/// REST API over a finished run.
#[cfg(feature = "api")]
pub mod api;
/// Scenario configuration, presets and validation.
pub mod config;
pub mod io;
pub mod panel;
/// Simulation engine, controller, clock, schedules and reports.
pub mod sim;
/// Live terminal dashboard.
#[cfg(feature = "tui")]
pub mod tui;
