// Metric identities shared by ingestion, charts and labels
use super::reading::PlausibilityBound;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A displayed measurement series.
///
/// Temperature probes are numbered from 1, matching the `temp{N}` element ids
/// on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Co2,
    O2,
    Temperature(u8),
    Humidity,
}

/// Metric family, used to pick plausibility bounds and axis rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Co2,
    O2,
    Temperature,
    Humidity,
}

/// Charts on the dashboard. All temperature probes share one chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartId {
    Co2,
    O2,
    Temperature,
    Humidity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Co2Unit {
    #[default]
    Percent,
    Ppm,
}

impl Co2Unit {
    pub fn suffix(self) -> &'static str {
        match self {
            Co2Unit::Percent => "%",
            Co2Unit::Ppm => "ppm",
        }
    }

    /// Plausible CO₂ readings in this unit. 39 % and 390 000 ppm are the same
    /// sensor ceiling.
    pub fn default_bound(self) -> PlausibilityBound {
        match self {
            Co2Unit::Percent => PlausibilityBound::new(0.0, 39.0),
            Co2Unit::Ppm => PlausibilityBound::new(0.0, 390_000.0),
        }
    }
}

impl Metric {
    pub fn kind(self) -> MetricKind {
        match self {
            Metric::Co2 => MetricKind::Co2,
            Metric::O2 => MetricKind::O2,
            Metric::Temperature(_) => MetricKind::Temperature,
            Metric::Humidity => MetricKind::Humidity,
        }
    }

    pub fn chart(self) -> ChartId {
        match self.kind() {
            MetricKind::Co2 => ChartId::Co2,
            MetricKind::O2 => ChartId::O2,
            MetricKind::Temperature => ChartId::Temperature,
            MetricKind::Humidity => ChartId::Humidity,
        }
    }

    /// Id of the text element showing the latest reading.
    pub fn element_id(self) -> String {
        match self {
            Metric::Co2 => "co2".to_string(),
            Metric::O2 => "o2".to_string(),
            Metric::Temperature(probe) => format!("temp{}", probe),
            Metric::Humidity => "humidity".to_string(),
        }
    }

    /// Human-readable reading, e.g. "21.5 °C".
    pub fn format_reading(self, value: f64, co2_unit: Co2Unit) -> String {
        let unit = match self.kind() {
            MetricKind::Co2 => co2_unit.suffix(),
            MetricKind::O2 | MetricKind::Humidity => "%",
            MetricKind::Temperature => "°C",
        };
        format!("{} {}", value, unit)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.element_id())
    }
}
