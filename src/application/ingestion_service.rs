// Ingestion of push updates into the dashboard state
use crate::application::dashboard_view::DashboardView;
use crate::domain::axis::{AxisEstimator, AxisSettings};
use crate::domain::dashboard::{ChartView, DashboardSnapshot, DashboardState, SensorSettings};
use crate::domain::metric::ChartId;
use crate::domain::reading::{Reading, NOT_CONNECTED};
use crate::domain::series::Series;
use crate::domain::update::RawUpdate;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Delivery acknowledgement for one push event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Ack {
    Accepted { applied: usize, rejected: usize },
    Stale { timestamp: f64 },
    Malformed { reason: String },
    Received,
}

pub type Acknowledger = oneshot::Sender<Ack>;

/// Owns the dashboard state and applies updates to it, one at a time.
pub struct DashboardController {
    state: DashboardState,
    settings: SensorSettings,
    estimator: AxisEstimator,
    view: Arc<dyn DashboardView>,
}

impl DashboardController {
    pub fn new(settings: SensorSettings, axis: &AxisSettings, view: Arc<dyn DashboardView>) -> Self {
        let state = DashboardState::new(&settings.metrics());
        let estimator = AxisEstimator::new(axis, settings.co2_unit);
        Self {
            state,
            settings,
            estimator,
            view,
        }
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    /// Apply an `update_dashboard` payload and acknowledge it exactly once.
    pub fn on_update(&mut self, raw: RawUpdate, ack: Option<Acknowledger>) -> Ack {
        let outcome = self.apply(raw);
        if let Some(ack) = ack {
            // The sender may have given up waiting; nothing to do then.
            let _ = ack.send(outcome.clone());
        }
        outcome
    }

    fn apply(&mut self, raw: RawUpdate) -> Ack {
        let update = match raw.decode(&self.settings) {
            Ok(update) => update,
            Err(e) => {
                tracing::warn!("Dropping malformed update: {}", e);
                return Ack::Malformed {
                    reason: e.to_string(),
                };
            }
        };

        if !self.state.is_fresh(update.timestamp) {
            tracing::debug!(
                "Ignoring stale update at {} (last accepted {:?})",
                update.timestamp,
                self.state.last_accepted_timestamp()
            );
            return Ack::Stale {
                timestamp: update.timestamp,
            };
        }
        self.state.accept_timestamp(update.timestamp);

        let label = format_label(update.timestamp);
        let mut touched = BTreeSet::new();
        let (mut applied, mut rejected) = (0, 0);

        for sample in update.samples {
            let element_id = sample.metric.element_id();
            let text = match sample.reading {
                Reading::Valid(value) => {
                    let Some(series) = self.state.series_mut(sample.metric) else {
                        continue;
                    };
                    series.append(label.clone(), Some(value));
                    touched.insert(sample.metric.chart());
                    applied += 1;
                    sample.metric.format_reading(value, self.settings.co2_unit)
                }
                Reading::Invalid => {
                    tracing::debug!("Rejected reading for {}", sample.metric);
                    rejected += 1;
                    NOT_CONNECTED.to_string()
                }
            };
            self.view.set_label(&element_id, &text);
            self.state.set_label(element_id, text);
        }

        for chart in touched {
            self.view.redraw(&self.chart_view(chart));
        }

        Ack::Accepted { applied, rejected }
    }

    /// Chart contents with a freshly computed axis range.
    pub fn chart_view(&self, chart: ChartId) -> ChartView {
        let range = self.estimator.compute_range(chart, &self.state.chart_values(chart));
        ChartView {
            chart,
            range,
            series: self.state.chart_series(chart).map(Series::to_view).collect(),
        }
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        let charts = [ChartId::Co2, ChartId::O2, ChartId::Temperature, ChartId::Humidity]
            .into_iter()
            .map(|chart| self.chart_view(chart))
            .collect();

        DashboardSnapshot {
            last_accepted_timestamp: self.state.last_accepted_timestamp(),
            charts,
            labels: self.state.labels().clone(),
        }
    }
}

/// Chart label for a sample stamped `timestamp` (seconds since the epoch).
fn format_label(timestamp: f64) -> String {
    let secs = timestamp.floor();
    let nanos = ((timestamp - secs) * 1e9) as u32;
    match DateTime::from_timestamp(secs as i64, nanos) {
        Some(time) => time.with_timezone(&Local).format("%H:%M:%S").to_string(),
        None => timestamp.to_string(),
    }
}
