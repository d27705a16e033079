//! Operating points and the lazily evaluated I-V curve.

use serde::Serialize;

use super::model::Panel;

/// A voltage/current pair and the power it delivers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OperatingPoint {
    /// Terminal voltage (V).
    pub voltage: f64,
    /// Output current (A, non-negative).
    pub current: f64,
    /// `voltage × current` (W).
    pub power: f64,
}

impl OperatingPoint {
    /// Builds an operating point, deriving power from voltage and current.
    pub fn new(voltage: f64, current: f64) -> Self {
        Self {
            voltage,
            current,
            power: voltage * current,
        }
    }
}

/// Evenly spaced samples of a panel's I-V characteristic.
///
/// Voltages follow linspace semantics over `[0, voc]`: the first sample is
/// at 0 V and, for two or more points, the last is at `voc`. Samples are
/// computed on demand from the panel's present state; nothing is cached.
#[derive(Debug, Clone)]
pub struct IvCurve<'a> {
    panel: &'a Panel,
    points: usize,
    next: usize,
}

impl<'a> IvCurve<'a> {
    pub(super) fn new(panel: &'a Panel, points: usize) -> Self {
        Self {
            panel,
            points,
            next: 0,
        }
    }

    /// Total number of samples on the curve.
    pub fn points(&self) -> usize {
        self.points
    }

    /// Voltage of sample `index`.
    pub fn voltage_at(&self, index: usize) -> f64 {
        if self.points < 2 {
            return 0.0;
        }
        self.panel.voc() * index as f64 / (self.points - 1) as f64
    }

    /// Evaluates sample `index` without advancing the iterator.
    ///
    /// Returns `None` when `index` is past the end of the curve.
    pub fn sample(&self, index: usize) -> Option<OperatingPoint> {
        if index >= self.points {
            return None;
        }
        Some(self.panel.operating_point(self.voltage_at(index)))
    }
}

impl Iterator for IvCurve<'_> {
    type Item = OperatingPoint;

    fn next(&mut self) -> Option<Self::Item> {
        let point = self.sample(self.next)?;
        self.next += 1;
        Some(point)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.points.saturating_sub(self.next);
        (remaining, Some(remaining))
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        self.next = self.next.saturating_add(n);
        self.next()
    }
}

impl ExactSizeIterator for IvCurve<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_span_zero_to_voc() {
        let panel = Panel::linear(40.0, 8.5);
        let curve: Vec<OperatingPoint> = panel.iv_curve(100).collect();
        assert_eq!(curve.len(), 100);
        assert_eq!(curve[0].voltage, 0.0);
        assert_eq!(curve[99].voltage, 40.0);
        assert_eq!(curve[99].current, 0.0);
    }

    #[test]
    fn even_spacing() {
        let panel = Panel::linear(10.0, 1.0);
        let volts: Vec<f64> = panel.iv_curve(11).map(|p| p.voltage).collect();
        for (k, v) in volts.iter().enumerate() {
            assert!((v - k as f64).abs() < 1e-12);
        }
    }

    #[test]
    fn degenerate_point_counts() {
        let panel = Panel::linear(40.0, 8.5);
        assert_eq!(panel.iv_curve(0).count(), 0);
        let single: Vec<OperatingPoint> = panel.iv_curve(1).collect();
        assert_eq!(single.len(), 1);
        assert_eq!(single[0].voltage, 0.0);
    }

    #[test]
    fn random_access_matches_iteration() {
        let panel = Panel::linear(40.0, 8.5);
        let curve = panel.iv_curve(25);
        let collected: Vec<OperatingPoint> = curve.clone().collect();
        assert_eq!(curve.sample(7), Some(collected[7]));
        assert_eq!(curve.clone().nth(7), Some(collected[7]));
        assert!(curve.sample(25).is_none());
        assert_eq!(curve.len(), 25);
    }

    #[test]
    fn recomputed_after_environment_change() {
        let mut panel = Panel::linear(40.0, 8.5);
        let before = panel.iv_curve(10).next().map(|p| p.current);
        panel.apply_environment_change(Some(500.0), None);
        let after = panel.iv_curve(10).next().map(|p| p.current);
        assert_eq!(before, Some(8.5));
        assert_eq!(after, Some(4.25));
    }

    #[test]
    fn power_is_product() {
        let p = OperatingPoint::new(12.0, 2.5);
        assert_eq!(p.power, 30.0);
    }
}
