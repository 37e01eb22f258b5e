// Rolling window of recent samples for one metric
use super::metric::Metric;
use serde::Serialize;
use std::collections::VecDeque;

/// Number of samples kept per series.
pub const WINDOW_CAPACITY: usize = 10;

/// Fixed-capacity FIFO of (label, value) pairs.
///
/// `labels` and `values` are index-aligned and never longer than
/// [`WINDOW_CAPACITY`]. Values may be `None` for gaps; the store itself does no
/// validation.
#[derive(Debug, Clone)]
pub struct Series {
    metric: Metric,
    labels: VecDeque<String>,
    values: VecDeque<Option<f64>>,
}

impl Series {
    pub fn new(metric: Metric) -> Self {
        Self {
            metric,
            labels: VecDeque::with_capacity(WINDOW_CAPACITY),
            values: VecDeque::with_capacity(WINDOW_CAPACITY),
        }
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// Append a sample, evicting the oldest one when full.
    ///
    /// A label equal to the most recent one does not open a new slot: the most
    /// recent value is replaced instead.
    pub fn append(&mut self, label: impl Into<String>, value: Option<f64>) {
        let label = label.into();

        if self.labels.back() == Some(&label) {
            if let Some(last) = self.values.back_mut() {
                *last = value;
            }
            return;
        }

        if self.labels.len() == WINDOW_CAPACITY {
            self.labels.pop_front();
            self.values.pop_front();
        }
        self.labels.push_back(label);
        self.values.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = Option<f64>> + '_ {
        self.values.iter().copied()
    }

    /// Non-null values, oldest first.
    pub fn present_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().filter_map(|v| *v)
    }

    pub fn latest(&self) -> Option<(&str, Option<f64>)> {
        match (self.labels.back(), self.values.back()) {
            (Some(label), Some(value)) => Some((label.as_str(), *value)),
            _ => None,
        }
    }

    pub fn to_view(&self) -> SeriesView {
        SeriesView {
            metric: self.metric,
            labels: self.labels.iter().cloned().collect(),
            values: self.values.iter().copied().collect(),
        }
    }
}

/// Serializable copy of a series, handed to viewers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesView {
    pub metric: Metric,
    pub labels: Vec<String>,
    pub values: Vec<Option<f64>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_length_tracks_appends_up_to_capacity() {
        let mut series = Series::new(Metric::Co2);
        for i in 0..25 {
            series.append(format!("t{}", i), Some(i as f64));
            assert_eq!(series.len(), (i + 1).min(WINDOW_CAPACITY));
            assert_eq!(series.labels().count(), series.values().count());
        }
    }

    #[test]
    fn test_window_keeps_most_recent_in_arrival_order() {
        let mut series = Series::new(Metric::O2);
        for i in 0..13 {
            series.append(format!("t{}", i), Some(i as f64));
        }

        let labels: Vec<&str> = series.labels().collect();
        assert_eq!(labels.first(), Some(&"t3"));
        assert_eq!(labels.last(), Some(&"t12"));

        let values: Vec<f64> = series.present_values().collect();
        assert_eq!(values, (3..13).map(|i| i as f64).collect::<Vec<_>>());
    }

    #[test]
    fn test_same_label_replaces_latest_value() {
        let mut series = Series::new(Metric::Humidity);
        series.append("12:00:00", Some(40.0));
        series.append("12:00:01", Some(41.0));
        series.append("12:00:01", Some(42.5));

        assert_eq!(series.len(), 2);
        assert_eq!(series.latest(), Some(("12:00:01", Some(42.5))));
    }

    #[test]
    fn test_store_accepts_gaps() {
        let mut series = Series::new(Metric::Temperature(1));
        series.append("a", None);
        series.append("b", Some(20.0));

        assert_eq!(series.values().collect::<Vec<_>>(), vec![None, Some(20.0)]);
        assert_eq!(series.present_values().collect::<Vec<_>>(), vec![20.0]);
    }
}
