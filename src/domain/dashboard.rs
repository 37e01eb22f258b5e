// Dashboard session state
use super::axis::AxisRange;
use super::metric::{ChartId, Co2Unit, Metric, MetricKind};
use super::reading::{BoundOverride, PlausibilityBound};
use super::series::{Series, SeriesView};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sensor layout and validation rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SensorSettingsFile")]
pub struct SensorSettings {
    pub temperature_probes: u8,
    pub co2_unit: Co2Unit,
    /// Overrides the unit's own bound when set.
    pub co2_bound: Option<PlausibilityBound>,
    pub o2_bound: PlausibilityBound,
    pub temperature_bound: PlausibilityBound,
    pub humidity_bound: PlausibilityBound,
}

impl Default for SensorSettings {
    fn default() -> Self {
        Self {
            temperature_probes: 5,
            co2_unit: Co2Unit::Percent,
            co2_bound: None,
            o2_bound: PlausibilityBound::new(0.0, 22.0),
            temperature_bound: PlausibilityBound::new(-200.0, 950.0),
            humidity_bound: PlausibilityBound::new(0.0, 100.0),
        }
    }
}

/// `[sensors]` as written in config; each bound key falls back on its own.
#[derive(Deserialize, Default)]
#[serde(default)]
struct SensorSettingsFile {
    temperature_probes: Option<u8>,
    co2_unit: Co2Unit,
    co2_bound: BoundOverride,
    o2_bound: BoundOverride,
    temperature_bound: BoundOverride,
    humidity_bound: BoundOverride,
}

impl From<SensorSettingsFile> for SensorSettings {
    fn from(file: SensorSettingsFile) -> Self {
        let defaults = SensorSettings::default();
        let co2_bound = (!file.co2_bound.is_empty()).then(|| file.co2_bound.over(file.co2_unit.default_bound()));
        Self {
            temperature_probes: file.temperature_probes.unwrap_or(defaults.temperature_probes),
            co2_unit: file.co2_unit,
            co2_bound,
            o2_bound: file.o2_bound.over(defaults.o2_bound),
            temperature_bound: file.temperature_bound.over(defaults.temperature_bound),
            humidity_bound: file.humidity_bound.over(defaults.humidity_bound),
        }
    }
}

impl SensorSettings {
    pub fn bound(&self, kind: MetricKind) -> PlausibilityBound {
        match kind {
            MetricKind::Co2 => self.co2_bound.unwrap_or_else(|| self.co2_unit.default_bound()),
            MetricKind::O2 => self.o2_bound,
            MetricKind::Temperature => self.temperature_bound,
            MetricKind::Humidity => self.humidity_bound,
        }
    }

    /// Every displayed metric, in chart order.
    pub fn metrics(&self) -> Vec<Metric> {
        let mut metrics = vec![Metric::Co2, Metric::O2];
        metrics.extend((1..=self.temperature_probes).map(Metric::Temperature));
        metrics.push(Metric::Humidity);
        metrics
    }
}

/// Everything the page session knows: one series per metric, the text of each
/// reading label and the last accepted timestamp.
#[derive(Debug, Clone)]
pub struct DashboardState {
    series: BTreeMap<Metric, Series>,
    labels: BTreeMap<String, String>,
    last_accepted_timestamp: Option<f64>,
}

impl DashboardState {
    pub fn new(metrics: &[Metric]) -> Self {
        Self {
            series: metrics.iter().map(|m| (*m, Series::new(*m))).collect(),
            labels: BTreeMap::new(),
            last_accepted_timestamp: None,
        }
    }

    pub fn series(&self, metric: Metric) -> Option<&Series> {
        self.series.get(&metric)
    }

    pub fn series_mut(&mut self, metric: Metric) -> Option<&mut Series> {
        self.series.get_mut(&metric)
    }

    /// Series drawn on `chart`, in metric order.
    pub fn chart_series(&self, chart: ChartId) -> impl Iterator<Item = &Series> {
        self.series.values().filter(move |s| s.metric().chart() == chart)
    }

    /// Every non-null value currently plotted on `chart`.
    pub fn chart_values(&self, chart: ChartId) -> Vec<f64> {
        self.chart_series(chart).flat_map(Series::present_values).collect()
    }

    pub fn label(&self, element_id: &str) -> Option<&str> {
        self.labels.get(element_id).map(String::as_str)
    }

    pub fn set_label(&mut self, element_id: String, text: String) {
        self.labels.insert(element_id, text);
    }

    pub fn last_accepted_timestamp(&self) -> Option<f64> {
        self.last_accepted_timestamp
    }

    /// Whether a message stamped `timestamp` is newer than anything accepted so far.
    pub fn is_fresh(&self, timestamp: f64) -> bool {
        self.last_accepted_timestamp.is_none_or(|last| timestamp > last)
    }

    pub fn accept_timestamp(&mut self, timestamp: f64) {
        self.last_accepted_timestamp = Some(timestamp);
    }

    pub fn labels(&self) -> &BTreeMap<String, String> {
        &self.labels
    }
}

/// A chart as handed to viewers: its series and the current axis range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartView {
    pub chart: ChartId,
    pub range: AxisRange,
    pub series: Vec<SeriesView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub last_accepted_timestamp: Option<f64>,
    pub charts: Vec<ChartView>,
    pub labels: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_metrics_cover_all_probes() {
        let metrics = SensorSettings::default().metrics();
        assert_eq!(metrics.len(), 8);
        assert_eq!(metrics[2], Metric::Temperature(1));
        assert_eq!(metrics[6], Metric::Temperature(5));
    }

    #[test]
    fn test_co2_bound_defaults_to_unit_unless_overridden() {
        let mut settings = SensorSettings {
            co2_unit: Co2Unit::Ppm,
            ..SensorSettings::default()
        };
        assert_eq!(settings.bound(MetricKind::Co2).max, 390_000.0);

        settings.co2_bound = Some(PlausibilityBound::new(0.0, 10_000.0));
        assert_eq!(settings.bound(MetricKind::Co2).max, 10_000.0);
    }

    #[test]
    fn test_partial_bounds_keep_per_sensor_defaults() {
        let settings: SensorSettings = serde_json::from_value(serde_json::json!({
            "co2_unit": "ppm",
            "co2_bound": {"max": 5000.0},
            "temperature_bound": {"max": 60.0},
        }))
        .unwrap();

        assert_eq!(settings.temperature_probes, 5);
        assert_eq!(settings.bound(MetricKind::Co2), PlausibilityBound::new(0.0, 5000.0));
        assert_eq!(settings.bound(MetricKind::Temperature), PlausibilityBound::new(-200.0, 60.0));
        assert_eq!(settings.bound(MetricKind::O2), PlausibilityBound::new(0.0, 22.0));
    }

    #[test]
    fn test_freshness_is_strictly_increasing() {
        let mut state = DashboardState::new(&[Metric::Co2]);
        assert!(state.is_fresh(0.0));

        state.accept_timestamp(100.0);
        assert!(!state.is_fresh(100.0));
        assert!(!state.is_fresh(99.0));
        assert!(state.is_fresh(101.0));
    }

    #[test]
    fn test_chart_values_merge_probe_series() {
        let mut state = DashboardState::new(&[Metric::Temperature(1), Metric::Temperature(2), Metric::Humidity]);
        state.series_mut(Metric::Temperature(1)).unwrap().append("a", Some(20.0));
        state.series_mut(Metric::Temperature(2)).unwrap().append("a", Some(22.0));
        state.series_mut(Metric::Humidity).unwrap().append("a", Some(50.0));

        let mut values = state.chart_values(ChartId::Temperature);
        values.sort_by(f64::total_cmp);
        assert_eq!(values, vec![20.0, 22.0]);
    }
}
