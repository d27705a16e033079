//! Photovoltaic panel model.

/// Operating points and the I-V curve iterator.
pub mod curve;
/// I-V formulas and the panel that evaluates them.
pub mod model;
pub mod state;

pub use curve::{IvCurve, OperatingPoint};
pub use model::{IvFormula, Panel};
pub use state::PanelState;
