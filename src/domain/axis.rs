// Y-axis range estimation for dashboard charts
use super::metric::{ChartId, Co2Unit};
use super::reading::{BoundOverride, PlausibilityBound};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

/// Derives an axis range from the values currently in a chart's window.
///
/// Implementations must return their default range for an empty window.
pub trait RangeStrategy: Send + Sync {
    fn range(&self, values: &[f64]) -> AxisRange;
}

fn window_max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

fn window_min(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

/// CO₂ on a percentage scale: a floor of `floor_max`, otherwise the window max
/// plus `headroom`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Co2PercentRange {
    pub floor_max: f64,
    pub headroom: f64,
}

impl Default for Co2PercentRange {
    fn default() -> Self {
        Self {
            floor_max: 0.1,
            headroom: 0.05,
        }
    }
}

impl RangeStrategy for Co2PercentRange {
    fn range(&self, values: &[f64]) -> AxisRange {
        let max = match window_max(values) {
            Some(m) if m > self.floor_max => m + self.headroom,
            _ => self.floor_max,
        };
        AxisRange::new(0.0, max)
    }
}

/// CO₂ in ppm: the window max plus `headroom`, rounded up to a multiple of
/// `step`, never below `floor_max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Co2PpmRange {
    pub floor_max: f64,
    pub step: f64,
    pub headroom: f64,
}

impl Default for Co2PpmRange {
    fn default() -> Self {
        Self {
            floor_max: 1000.0,
            step: 100.0,
            headroom: 100.0,
        }
    }
}

impl RangeStrategy for Co2PpmRange {
    fn range(&self, values: &[f64]) -> AxisRange {
        let max = match window_max(values) {
            Some(m) => (((m + self.headroom) / self.step).ceil() * self.step).max(self.floor_max),
            None => self.floor_max,
        };
        AxisRange::new(0.0, max)
    }
}

/// Keeps a reference band always visible and widens only when readings leave it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandedRange {
    pub floor: f64,
    pub ceil: f64,
}

impl Default for BandedRange {
    fn default() -> Self {
        Self {
            floor: 13.0,
            ceil: 21.0,
        }
    }
}

impl RangeStrategy for BandedRange {
    fn range(&self, values: &[f64]) -> AxisRange {
        let min = window_min(values).map_or(self.floor, |m| m.min(self.floor));
        let max = window_max(values).map_or(self.ceil, |m| m.max(self.ceil));
        AxisRange::new(min, max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixedRange {
    pub min: f64,
    pub max: f64,
}

impl FixedRange {
    fn overridden(self, keys: BoundOverride) -> Self {
        let bound = keys.over(PlausibilityBound::new(self.min, self.max));
        Self {
            min: bound.min,
            max: bound.max,
        }
    }
}

impl RangeStrategy for FixedRange {
    fn range(&self, _values: &[f64]) -> AxisRange {
        AxisRange::new(self.min, self.max)
    }
}

/// Tunable constants for every chart's axis rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "AxisSettingsFile")]
pub struct AxisSettings {
    pub co2_percent: Co2PercentRange,
    pub co2_ppm: Co2PpmRange,
    pub temperature: BandedRange,
    pub o2: FixedRange,
    pub humidity: FixedRange,
}

impl Default for AxisSettings {
    fn default() -> Self {
        Self {
            co2_percent: Co2PercentRange::default(),
            co2_ppm: Co2PpmRange::default(),
            temperature: BandedRange::default(),
            o2: FixedRange { min: 0.0, max: 25.0 },
            humidity: FixedRange { min: 0.0, max: 100.0 },
        }
    }
}

/// `[axis]` as written in config. Fixed ranges differ per chart, so their
/// missing keys are filled from that chart's own default.
#[derive(Deserialize, Default)]
#[serde(default)]
struct AxisSettingsFile {
    co2_percent: Co2PercentRange,
    co2_ppm: Co2PpmRange,
    temperature: BandedRange,
    o2: BoundOverride,
    humidity: BoundOverride,
}

impl From<AxisSettingsFile> for AxisSettings {
    fn from(file: AxisSettingsFile) -> Self {
        let defaults = AxisSettings::default();
        Self {
            co2_percent: file.co2_percent,
            co2_ppm: file.co2_ppm,
            temperature: file.temperature,
            o2: defaults.o2.overridden(file.o2),
            humidity: defaults.humidity.overridden(file.humidity),
        }
    }
}

/// One strategy per chart; the CO₂ strategy follows the unit in force.
pub struct AxisEstimator {
    co2: Box<dyn RangeStrategy>,
    o2: Box<dyn RangeStrategy>,
    temperature: Box<dyn RangeStrategy>,
    humidity: Box<dyn RangeStrategy>,
}

impl AxisEstimator {
    pub fn new(settings: &AxisSettings, co2_unit: Co2Unit) -> Self {
        let co2: Box<dyn RangeStrategy> = match co2_unit {
            Co2Unit::Percent => Box::new(settings.co2_percent),
            Co2Unit::Ppm => Box::new(settings.co2_ppm),
        };
        Self {
            co2,
            o2: Box::new(settings.o2),
            temperature: Box::new(settings.temperature),
            humidity: Box::new(settings.humidity),
        }
    }

    /// Range for `chart` given every non-null value across its series.
    pub fn compute_range(&self, chart: ChartId, values: &[f64]) -> AxisRange {
        let strategy = match chart {
            ChartId::Co2 => &self.co2,
            ChartId::O2 => &self.o2,
            ChartId::Temperature => &self.temperature,
            ChartId::Humidity => &self.humidity,
        };
        strategy.range(values)
    }
}
