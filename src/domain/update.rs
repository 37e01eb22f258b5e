// Decoding of `update_dashboard` payloads into validated samples
use super::dashboard::SensorSettings;
use super::metric::Metric;
use super::reading::Reading;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// One measurement field from a push update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub metric: Metric,
    pub timestamp: f64,
    pub reading: Reading,
}

/// Payload as it arrives on the wire. Every field is optional and untyped.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawUpdate {
    #[serde(default)]
    pub timestamp: Option<Value>,
    #[serde(default)]
    pub co2: Option<Value>,
    #[serde(default)]
    pub o2: Option<Value>,
    #[serde(default)]
    pub temperature: Option<Value>,
    #[serde(default)]
    pub temperatures: Option<Value>,
    #[serde(default)]
    pub humidity: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedUpdate {
    pub timestamp: f64,
    pub samples: Vec<Sample>,
}

#[derive(Debug, Error, PartialEq)]
pub enum DecodeError {
    #[error("update has no timestamp")]
    MissingTimestamp,
    #[error("timestamp {0} is not a finite number")]
    BadTimestamp(String),
}

impl RawUpdate {
    pub fn from_value(value: Value) -> Self {
        // Non-object payloads carry no fields and fail on the missing timestamp.
        serde_json::from_value(value).unwrap_or_default()
    }

    /// Validate every present field. Absent fields produce no sample.
    pub fn decode(&self, settings: &SensorSettings) -> Result<DecodedUpdate, DecodeError> {
        let timestamp = match &self.timestamp {
            None | Some(Value::Null) => return Err(DecodeError::MissingTimestamp),
            Some(Value::Number(n)) => n
                .as_f64()
                .filter(|t| t.is_finite())
                .ok_or_else(|| DecodeError::BadTimestamp(n.to_string()))?,
            Some(other) => return Err(DecodeError::BadTimestamp(other.to_string())),
        };

        let mut samples = Vec::new();
        let mut push = |metric: Metric, raw: &Value| {
            let reading = Reading::decode(raw, &settings.bound(metric.kind()));
            samples.push(Sample {
                metric,
                timestamp,
                reading,
            });
        };

        if let Some(raw) = &self.co2 {
            push(Metric::Co2, raw);
        }
        if let Some(raw) = &self.o2 {
            push(Metric::O2, raw);
        }

        match (&self.temperatures, &self.temperature) {
            (Some(Value::Array(probes)), _) => {
                for (probe, raw) in (1..=settings.temperature_probes).zip(probes) {
                    push(Metric::Temperature(probe), raw);
                }
            }
            (Some(other), _) => {
                // A non-array probe list counts as one bad reading for probe 1.
                if settings.temperature_probes > 0 {
                    push(Metric::Temperature(1), other);
                }
            }
            (None, Some(raw)) => {
                if settings.temperature_probes > 0 {
                    push(Metric::Temperature(1), raw);
                }
            }
            (None, None) => {}
        }

        if let Some(raw) = &self.humidity {
            push(Metric::Humidity, raw);
        }

        Ok(DecodedUpdate { timestamp, samples })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(value: Value) -> Result<DecodedUpdate, DecodeError> {
        RawUpdate::from_value(value).decode(&SensorSettings::default())
    }

    #[test]
    fn test_decode_requires_numeric_timestamp() {
        assert_eq!(decode(json!({"co2": 0.04})), Err(DecodeError::MissingTimestamp));
        assert!(matches!(decode(json!({"timestamp": "soon"})), Err(DecodeError::BadTimestamp(_))));
        assert_eq!(decode(json!([1, 2, 3])), Err(DecodeError::MissingTimestamp));
    }

    #[test]
    fn test_decode_skips_absent_fields() {
        let update = decode(json!({"timestamp": 10, "o2": 20.9})).unwrap();
        assert_eq!(update.timestamp, 10.0);
        assert_eq!(update.samples.len(), 1);
        assert_eq!(update.samples[0].metric, Metric::O2);
        assert_eq!(update.samples[0].reading, Reading::Valid(20.9));
    }

    #[test]
    fn test_decode_maps_probe_positions() {
        let update = decode(json!({"timestamp": 1, "temperatures": [12, 14, 970, 20, 21, 99]})).unwrap();
        let metrics: Vec<Metric> = update.samples.iter().map(|s| s.metric).collect();
        assert_eq!(metrics, (1..=5).map(Metric::Temperature).collect::<Vec<_>>());
        assert_eq!(update.samples[2].reading, Reading::Invalid);
    }

    #[test]
    fn test_probe_list_wins_over_single_temperature() {
        let update = decode(json!({"timestamp": 1, "temperature": 30, "temperatures": [18]})).unwrap();
        assert_eq!(update.samples.len(), 1);
        assert_eq!(update.samples[0].reading, Reading::Valid(18.0));
    }

    #[test]
    fn test_single_temperature_feeds_first_probe() {
        let update = decode(json!({"timestamp": 1, "temperature": "22.5"})).unwrap();
        assert_eq!(update.samples[0].metric, Metric::Temperature(1));
        assert_eq!(update.samples[0].reading, Reading::Valid(22.5));
    }
}
