//! API response and query types.

use serde::{Deserialize, Serialize};

use crate::panel::{OperatingPoint, Panel};
use crate::sim::kpi::TrackingReport;
use crate::sim::types::{Sample, SimConfig};

/// Default number of points returned by `/iv-curve`.
pub const DEFAULT_CURVE_POINTS: usize = 100;
/// Largest curve the `/iv-curve` endpoint will evaluate.
pub const MAX_CURVE_POINTS: usize = 10_000;

/// Combined state response: config, panel, report and latest sample.
#[derive(Debug, Serialize)]
pub struct StateResponse {
    /// Run configuration.
    pub config: SimConfig,
    /// Panel parameters and final environment.
    pub panel: PanelSummary,
    /// Tracking report for the run.
    pub report: TrackingReport,
    /// Last recorded sample, `null` for an empty run.
    pub latest_sample: Option<Sample>,
}

/// Panel parameters as exposed by the API.
#[derive(Debug, Serialize)]
pub struct PanelSummary {
    /// `"linear"` or `"single_diode"`.
    pub model: &'static str,
    /// Open-circuit voltage (V).
    pub voc: f64,
    /// Short-circuit current (A).
    pub isc: f64,
    /// Irradiance at the end of the run (W/m²).
    pub irradiance: f64,
    /// Cell temperature at the end of the run (°C).
    pub temperature: f64,
}

impl From<&Panel> for PanelSummary {
    fn from(panel: &Panel) -> Self {
        let state = panel.state();
        Self {
            model: panel.formula().name(),
            voc: state.voc,
            isc: state.isc,
            irradiance: state.irradiance(),
            temperature: state.temperature(),
        }
    }
}

/// I-V curve of the panel in its final environment.
#[derive(Debug, Serialize)]
pub struct CurveResponse {
    /// Irradiance the curve was evaluated at (W/m²).
    pub irradiance: f64,
    /// Temperature the curve was evaluated at (°C).
    pub temperature: f64,
    /// Curve samples from 0 V to Voc.
    pub points: Vec<OperatingPoint>,
    /// Highest-power sample.
    pub maximum_power_point: Option<OperatingPoint>,
}

/// Optional range query parameters for the history endpoint.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// First iteration (inclusive).
    pub from: Option<usize>,
    /// Last iteration (inclusive).
    pub to: Option<usize>,
}

/// Query parameters for the I-V curve endpoint.
#[derive(Debug, Deserialize)]
pub struct CurveQuery {
    /// Number of curve samples.
    pub points: Option<usize>,
}

/// Error response body for 400-class errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::{IvFormula, PanelState};

    #[test]
    fn panel_summary_reflects_environment() {
        let mut panel = Panel::new(
            PanelState::new(48.0, 10.0, 0.5, 100.0, 1.3, 60),
            IvFormula::SingleDiode,
        );
        panel.apply_environment_change(Some(800.0), Some(40.0));
        let summary = PanelSummary::from(&panel);

        assert_eq!(summary.model, "single_diode");
        assert_eq!(summary.voc, 48.0);
        assert_eq!(summary.isc, 10.0);
        assert_eq!(summary.irradiance, 800.0);
        assert_eq!(summary.temperature, 40.0);
    }
}
