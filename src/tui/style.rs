//! Color constants and auto-scaling helpers for the TUI.

use ratatui::style::Color;

/// Panel power line color.
pub const POWER_COLOR: Color = Color::Cyan;
/// Theoretical maximum power line color.
pub const MAX_POWER_COLOR: Color = Color::DarkGray;
/// Operating-point line color.
pub const OPERATING_POINT_COLOR: Color = Color::Magenta;
/// I-V curve color.
pub const IV_CURVE_COLOR: Color = Color::Blue;
/// Latest measurement marker on the I-V curve.
pub const MARKER_COLOR: Color = Color::Red;
/// Efficiency gauge color when tracking well (>= 95%).
pub const EFFICIENCY_HIGH: Color = Color::Green;
/// Efficiency gauge color when tracking loosely (>= 80%).
pub const EFFICIENCY_MID: Color = Color::Yellow;
/// Efficiency gauge color when far from the maximum (< 80%).
pub const EFFICIENCY_LOW: Color = Color::Red;
/// Header bar foreground.
pub const HEADER_FG: Color = Color::White;
/// Header bar background.
pub const HEADER_BG: Color = Color::DarkGray;
/// Footer help text color.
pub const FOOTER_FG: Color = Color::DarkGray;
/// Environment indicator color.
pub const ENVIRONMENT_FG: Color = Color::Yellow;

/// Returns a color based on the tracking efficiency in percent.
pub fn efficiency_color(pct: f64) -> Color {
    if pct >= 95.0 {
        EFFICIENCY_HIGH
    } else if pct >= 80.0 {
        EFFICIENCY_MID
    } else {
        EFFICIENCY_LOW
    }
}

/// Computes Y-axis bounds from chart data points with 10% padding.
pub fn auto_bounds_y(primary: &[(f64, f64)], secondary: &[(f64, f64)]) -> [f64; 2] {
    let all = primary.iter().chain(secondary.iter()).map(|&(_, y)| y);
    let min = all.clone().fold(f64::INFINITY, f64::min);
    let max = all.fold(f64::NEG_INFINITY, f64::max);
    if !min.is_finite() || !max.is_finite() {
        return [0.0, 1.0];
    }
    let range = (max - min).max(0.01);
    let pad = range * 0.1;
    [min - pad, max + pad]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn efficiency_thresholds() {
        assert_eq!(efficiency_color(99.0), EFFICIENCY_HIGH);
        assert_eq!(efficiency_color(85.0), EFFICIENCY_MID);
        assert_eq!(efficiency_color(10.0), EFFICIENCY_LOW);
    }

    #[test]
    fn bounds_pad_the_data() {
        let b = auto_bounds_y(&[(0.0, 10.0), (1.0, 20.0)], &[(0.0, 15.0)]);
        assert!((b[0] - 9.0).abs() < 1e-9);
        assert!((b[1] - 21.0).abs() < 1e-9);
        assert_eq!(auto_bounds_y(&[], &[]), [0.0, 1.0]);
    }
}
