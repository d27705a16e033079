/// Simulation clock for timestep management and pacing.
pub mod clock;
pub mod controller;
pub mod engine;
/// Environment-change schedules and the cloud generator.
pub mod event;
pub mod kpi;
pub mod sink;
pub mod types;
