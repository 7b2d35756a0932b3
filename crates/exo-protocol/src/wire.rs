//! Wire representation of metrics and domain errors.
//!
//! Every field declares its value kind through an explicit integer
//! discriminant and stores its value in the matching slot, so decoding never
//! infers a type from the message shape. Discriminant `0` is reserved for
//! "unset".
//!
//! The float slot carries the IEEE 754 bit pattern rather than a JSON number,
//! since JSON has no representation for infinities or NaN.

use exo_core::MetricKind;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Discriminant of a wire field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum FieldType {
    /// `value_i64` slot
    Int64 = 1,
    /// `value_u64` slot
    Uint64 = 2,
    /// `value_f64` slot
    Float64 = 3,
    /// `value_string` slot
    String = 4,
    /// `value_bool` slot
    Bool = 5,
}

impl FieldType {
    /// Returns the integer transmitted on the wire.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Parses a wire discriminant; unknown values yield `None`.
    ///
    /// # Examples
    ///
    /// ```
    /// use exo_protocol::FieldType;
    ///
    /// assert_eq!(FieldType::from_i32(1), Some(FieldType::Int64));
    /// assert_eq!(FieldType::from_i32(0), None);
    /// assert_eq!(FieldType::from_i32(42), None);
    /// ```
    #[must_use]
    pub const fn from_i32(value: i32) -> Option<Self> {
        match value {
            1 => Some(Self::Int64),
            2 => Some(Self::Uint64),
            3 => Some(Self::Float64),
            4 => Some(Self::String),
            5 => Some(Self::Bool),
            _ => None,
        }
    }
}

/// Converts a metric kind to its wire integer.
#[must_use]
pub const fn kind_to_i32(kind: MetricKind) -> i32 {
    match kind {
        MetricKind::Untyped => 0,
        MetricKind::Counter => 1,
        MetricKind::Gauge => 2,
        MetricKind::Summary => 3,
        MetricKind::Histogram => 4,
    }
}

/// Converts a wire integer to a metric kind; unset or unknown is untyped.
#[must_use]
pub const fn kind_from_i32(value: i32) -> MetricKind {
    match value {
        1 => MetricKind::Counter,
        2 => MetricKind::Gauge,
        3 => MetricKind::Summary,
        4 => MetricKind::Histogram,
        _ => MetricKind::Untyped,
    }
}

/// A tag on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireTag {
    /// Tag key
    pub key: String,
    /// Tag value
    pub value: String,
}

/// A field on the wire: key, discriminant and one populated slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireField {
    /// Field key
    pub key: String,
    /// Raw [`FieldType`] discriminant
    #[serde(rename = "type", default)]
    pub field_type: i32,
    /// Signed integer slot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_i64: Option<i64>,
    /// Unsigned integer slot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_u64: Option<u64>,
    /// Float slot, transmitted as `value_f64_bits`
    #[serde(
        rename = "value_f64_bits",
        default,
        skip_serializing_if = "Option::is_none",
        with = "float_bits"
    )]
    pub value_f64: Option<f64>,
    /// String slot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_string: Option<String>,
    /// Boolean slot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_bool: Option<bool>,
}

mod float_bits {
    use super::{Deserialize, Deserializer, Serialize, Serializer};

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(
        value: &Option<f64>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        value.map(f64::to_bits).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<f64>, D::Error> {
        Ok(Option::<u64>::deserialize(deserializer)?.map(f64::from_bits))
    }
}

/// A metric on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMetric {
    /// Measurement name
    pub name: String,
    /// Tags in order
    #[serde(default)]
    pub tags: Vec<WireTag>,
    /// Fields in order
    #[serde(default)]
    pub fields: Vec<WireField>,
    /// Nanoseconds since the Unix epoch, negative before it
    pub time: i64,
    /// Raw metric kind; absent means untyped
    #[serde(default)]
    pub kind: i32,
}

/// Domain error channel carried inside a successful response.
///
/// An absent or `false` flag means success.
///
/// # Examples
///
/// ```
/// use exo_protocol::WireError;
///
/// let ok: WireError = serde_json::from_str("{}").unwrap();
/// assert!(!ok.is_error);
///
/// let err = WireError::error("missing field");
/// assert_eq!(err.into_result(), Err("missing field".to_string()));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireError {
    /// Whether the operation failed
    #[serde(default)]
    pub is_error: bool,
    /// Failure description, empty on success
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

impl WireError {
    /// The success value.
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            is_error: false,
            message: String::new(),
        }
    }

    /// A failure carrying `message`.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            is_error: true,
            message: message.into(),
        }
    }

    /// Converts into a `Result`, yielding the message on failure.
    ///
    /// # Errors
    ///
    /// Returns the carried message when the error flag is set.
    pub fn into_result(self) -> std::result::Result<(), String> {
        if self.is_error {
            Err(self.message)
        } else {
            Ok(())
        }
    }
}

impl<E: std::fmt::Display> From<std::result::Result<(), E>> for WireError {
    fn from(result: std::result::Result<(), E>) -> Self {
        match result {
            Ok(()) => Self::ok(),
            Err(e) => Self::error(e.to_string()),
        }
    }
}
