//! Conversion between host metrics and wire metrics.
//!
//! Encoding is total for every timestamp representable as `i64`
//! nanoseconds (roughly years 1677 to 2262). Decoding never fails: a field
//! whose discriminant is unknown, or whose declared slot is empty, is dropped
//! with a warning and the rest of the metric is kept, so an older peer keeps
//! working when newer value kinds appear.

use crate::error::{ProtocolError, Result};
use crate::wire::{FieldType, WireField, WireMetric, WireTag, kind_from_i32, kind_to_i32};
use chrono::DateTime;
use exo_core::{Field, FieldValue, Metric, Tag};

/// Encodes a metric for transmission.
///
/// # Errors
///
/// Returns `ProtocolError::TimestampOutOfRange` if the timestamp does not fit
/// in `i64` nanoseconds since the epoch.
///
/// # Examples
///
/// ```
/// use exo_core::Metric;
/// use exo_protocol::{encode_metric, FieldType};
///
/// let metric = Metric::builder("mem").field("free", 1024_u64).build();
/// let wire = encode_metric(&metric).unwrap();
/// assert_eq!(wire.fields[0].field_type, FieldType::Uint64.as_i32());
/// assert_eq!(wire.fields[0].value_u64, Some(1024));
/// ```
pub fn encode_metric(metric: &Metric) -> Result<WireMetric> {
    let time = metric
        .time()
        .timestamp_nanos_opt()
        .ok_or_else(|| ProtocolError::TimestampOutOfRange {
            name: metric.name().to_string(),
        })?;

    Ok(WireMetric {
        name: metric.name().to_string(),
        tags: metric
            .tags()
            .iter()
            .map(|t| WireTag {
                key: t.key.clone(),
                value: t.value.clone(),
            })
            .collect(),
        fields: metric.fields().iter().map(encode_field).collect(),
        time,
        kind: kind_to_i32(metric.kind()),
    })
}

/// Encodes a batch of metrics, preserving order.
///
/// # Errors
///
/// Fails on the first metric whose timestamp is out of range.
pub fn encode_metrics(metrics: &[Metric]) -> Result<Vec<WireMetric>> {
    metrics.iter().map(encode_metric).collect()
}

fn encode_field(field: &Field) -> WireField {
    let mut wire = WireField {
        key: field.key.clone(),
        ..WireField::default()
    };
    let kind = match &field.value {
        FieldValue::Int(v) => {
            wire.value_i64 = Some(*v);
            FieldType::Int64
        }
        FieldValue::Uint(v) => {
            wire.value_u64 = Some(*v);
            FieldType::Uint64
        }
        FieldValue::Float(v) => {
            wire.value_f64 = Some(*v);
            FieldType::Float64
        }
        FieldValue::String(v) => {
            wire.value_string = Some(v.clone());
            FieldType::String
        }
        FieldValue::Bool(v) => {
            wire.value_bool = Some(*v);
            FieldType::Bool
        }
    };
    wire.field_type = kind.as_i32();
    wire
}

/// Decodes a wire metric.
///
/// # Examples
///
/// ```
/// use exo_core::MetricKind;
/// use exo_protocol::{decode_metric, WireField, WireMetric};
///
/// let wire = WireMetric {
///     name: "disk".to_string(),
///     tags: vec![],
///     fields: vec![WireField {
///         key: "future".to_string(),
///         field_type: 99,
///         ..WireField::default()
///     }],
///     time: -5,
///     kind: 0,
/// };
///
/// let metric = decode_metric(wire);
/// assert!(metric.fields().is_empty());
/// assert_eq!(metric.kind(), MetricKind::Untyped);
/// assert_eq!(metric.time().timestamp_nanos_opt(), Some(-5));
/// ```
#[must_use]
pub fn decode_metric(wire: WireMetric) -> Metric {
    let WireMetric {
        name,
        tags,
        fields,
        time,
        kind,
    } = wire;

    let tags = tags
        .into_iter()
        .map(|t| Tag {
            key: t.key,
            value: t.value,
        })
        .collect();

    let fields = fields
        .into_iter()
        .filter_map(|f| {
            let key = f.key.clone();
            let decoded = decode_field(f);
            if decoded.is_none() {
                tracing::warn!(metric = %name, field = %key, "dropping field with unknown or empty value slot");
            }
            decoded
        })
        .collect();

    Metric::new(
        name,
        tags,
        fields,
        DateTime::from_timestamp_nanos(time),
        kind_from_i32(kind),
    )
}

/// Decodes a batch of metrics, preserving order.
#[must_use]
pub fn decode_metrics(wire: Vec<WireMetric>) -> Vec<Metric> {
    wire.into_iter().map(decode_metric).collect()
}

fn decode_field(wire: WireField) -> Option<Field> {
    let value = match FieldType::from_i32(wire.field_type)? {
        FieldType::Int64 => FieldValue::Int(wire.value_i64?),
        FieldType::Uint64 => FieldValue::Uint(wire.value_u64?),
        FieldType::Float64 => FieldValue::Float(wire.value_f64?),
        FieldType::String => FieldValue::String(wire.value_string?),
        FieldType::Bool => FieldValue::Bool(wire.value_bool?),
    };
    Some(Field {
        key: wire.key,
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use exo_core::MetricKind;

    fn epoch() -> chrono::DateTime<chrono::Utc> {
        DateTime::from_timestamp_nanos(0)
    }

    #[test]
    fn test_counter_metric_survives_round_trip() {
        let metric = Metric::builder("cpu")
            .tag("host", "a")
            .field("value", 42_i64)
            .kind(MetricKind::Counter)
            .time(epoch())
            .build();

        let decoded = decode_metric(encode_metric(&metric).unwrap());

        assert_eq!(decoded.kind(), MetricKind::Counter);
        assert_eq!(decoded.tag("host"), Some("a"));
        assert_eq!(decoded.field("value"), Some(&FieldValue::Int(42)));
        assert_eq!(decoded.time().timestamp_nanos_opt(), Some(0));
        assert_eq!(decoded, metric);
    }

    #[test]
    fn test_every_value_kind_keeps_its_type() {
        let metric = Metric::builder("mixed")
            .field("i", -7_i64)
            .field("u", u64::MAX)
            .field("f", 0.25)
            .field("s", "text")
            .field("b", false)
            .time(epoch())
            .build();

        let wire = encode_metric(&metric).unwrap();
        let types: Vec<_> = wire.fields.iter().map(|f| f.field_type).collect();
        assert_eq!(types, [1, 2, 3, 4, 5]);

        assert_eq!(decode_metric(wire), metric);
    }

    #[test]
    fn test_pre_epoch_timestamp_is_not_clamped() {
        let t = DateTime::from_timestamp_nanos(-1_500_000_000);
        let metric = Metric::builder("old").field("v", 1_i64).time(t).build();

        let wire = encode_metric(&metric).unwrap();
        assert_eq!(wire.time, -1_500_000_000);
        assert_eq!(decode_metric(wire).time(), t);
    }

    #[test]
    fn test_out_of_range_timestamp_is_rejected() {
        let far = DateTime::from_timestamp(10_000_000_000, 0).unwrap();
        let metric = Metric::builder("future").time(far).build();

        let err = encode_metric(&metric).unwrap_err();
        assert!(matches!(err, ProtocolError::TimestampOutOfRange { .. }));
    }

    #[test]
    fn test_empty_slot_drops_only_that_field() {
        let wire = WireMetric {
            name: "partial".into(),
            tags: vec![],
            fields: vec![
                WireField {
                    key: "broken".into(),
                    field_type: FieldType::Int64.as_i32(),
                    value_u64: Some(3),
                    ..WireField::default()
                },
                WireField {
                    key: "ok".into(),
                    field_type: FieldType::Bool.as_i32(),
                    value_bool: Some(true),
                    ..WireField::default()
                },
            ],
            time: 0,
            kind: 2,
        };

        let metric = decode_metric(wire);
        assert_eq!(metric.fields().len(), 1);
        assert_eq!(metric.field("ok"), Some(&FieldValue::Bool(true)));
        assert_eq!(metric.kind(), MetricKind::Gauge);
    }

    #[test]
    fn test_decode_reads_only_declared_slot() {
        let wire = WireField {
            key: "v".into(),
            field_type: FieldType::Float64.as_i32(),
            value_i64: Some(1),
            value_f64: Some(2.5),
            ..WireField::default()
        };
        let field = decode_field(wire).unwrap();
        assert_eq!(field.value, FieldValue::Float(2.5));
    }

    #[test]
    fn test_batch_preserves_order() {
        let metrics: Vec<_> = ["a", "b", "c"]
            .into_iter()
            .map(|n| Metric::builder(n).time(epoch()).build())
            .collect();

        let decoded = decode_metrics(encode_metrics(&metrics).unwrap());
        assert_eq!(decoded, metrics);
    }
}
