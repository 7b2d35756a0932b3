//! Metric model shared by the host and plugin processes.
//!
//! Field values are a closed sum type over the five kinds the wire protocol
//! can carry, so a value that cannot be transmitted cannot be constructed in
//! the first place.
//!
//! # Examples
//!
//! ```
//! use exo_core::{FieldValue, Metric, MetricKind};
//!
//! let metric = Metric::builder("cpu")
//!     .tag("host", "a")
//!     .field("usage_idle", 93.5)
//!     .field("cores", 8_u64)
//!     .kind(MetricKind::Gauge)
//!     .build();
//!
//! assert_eq!(metric.name(), "cpu");
//! assert_eq!(metric.field("cores"), Some(&FieldValue::Uint(8)));
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a metric, mirroring the value types of common time-series stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// No particular semantics
    #[default]
    Untyped,
    /// Monotonically increasing value
    Counter,
    /// Point-in-time value
    Gauge,
    /// Pre-aggregated quantiles
    Summary,
    /// Bucketed distribution
    Histogram,
}

impl MetricKind {
    /// Returns the lowercase name of the kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use exo_core::MetricKind;
    ///
    /// assert_eq!(MetricKind::Counter.as_str(), "counter");
    /// assert_eq!(MetricKind::default().as_str(), "untyped");
    /// ```
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Untyped => "untyped",
            Self::Counter => "counter",
            Self::Gauge => "gauge",
            Self::Summary => "summary",
            Self::Histogram => "histogram",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed field value.
///
/// Narrower numeric types convert into the widest representation of their
/// signedness class: `i8..i32` into `Int`, `u8..u32` into `Uint` and `f32`
/// into `Float`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Signed 64-bit integer
    Int(i64),
    /// Unsigned 64-bit integer
    Uint(u64),
    /// 64-bit float
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Boolean
    Bool(bool),
}

impl FieldValue {
    /// Returns the name of the value kind.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int64",
            Self::Uint(_) => "uint64",
            Self::Float(_) => "float64",
            Self::String(_) => "string",
            Self::Bool(_) => "bool",
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}i"),
            Self::Uint(v) => write!(f, "{v}u"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v:?}"),
            Self::Bool(v) => write!(f, "{v}"),
        }
    }
}

macro_rules! impl_from_value {
    ($variant:ident, $target:ty, $($source:ty),+) => {
        $(
            impl From<$source> for FieldValue {
                fn from(value: $source) -> Self {
                    Self::$variant(<$target>::from(value))
                }
            }
        )+
    };
}

impl_from_value!(Int, i64, i8, i16, i32, i64);
impl_from_value!(Uint, u64, u8, u16, u32, u64);
impl_from_value!(Float, f64, f32, f64);
impl_from_value!(Bool, bool, bool);
impl_from_value!(String, String, String, &str);

/// A tag key/value pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    /// Tag key
    pub key: String,
    /// Tag value
    pub value: String,
}

/// A field key and its typed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Field key
    pub key: String,
    /// Typed value
    pub value: FieldValue,
}

/// A single measurement.
///
/// Tags and fields keep their insertion order; the codec preserves that order
/// across the process boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    name: String,
    tags: Vec<Tag>,
    fields: Vec<Field>,
    time: DateTime<Utc>,
    kind: MetricKind,
}

impl Metric {
    /// Creates a metric from its parts.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        tags: Vec<Tag>,
        fields: Vec<Field>,
        time: DateTime<Utc>,
        kind: MetricKind,
    ) -> Self {
        Self {
            name: name.into(),
            tags,
            fields,
            time,
            kind,
        }
    }

    /// Starts building a metric with the given name.
    ///
    /// The timestamp defaults to the current time and the kind to
    /// [`MetricKind::Untyped`].
    #[must_use]
    pub fn builder(name: impl Into<String>) -> MetricBuilder {
        MetricBuilder {
            name: name.into(),
            tags: Vec::new(),
            fields: Vec::new(),
            time: None,
            kind: MetricKind::Untyped,
        }
    }

    /// Returns the metric name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the tags in order.
    #[must_use]
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Returns the fields in order.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Returns the timestamp.
    #[must_use]
    pub const fn time(&self) -> DateTime<Utc> {
        self.time
    }

    /// Returns the metric kind.
    #[must_use]
    pub const fn kind(&self) -> MetricKind {
        self.kind
    }

    /// Looks up a tag value by key.
    ///
    /// # Examples
    ///
    /// ```
    /// use exo_core::Metric;
    ///
    /// let m = Metric::builder("mem").tag("host", "a").field("used", 1_i64).build();
    /// assert_eq!(m.tag("host"), Some("a"));
    /// assert_eq!(m.tag("region"), None);
    /// ```
    #[must_use]
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.key == key)
            .map(|t| t.value.as_str())
    }

    /// Looks up a field value by key.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|f| f.key == key).map(|f| &f.value)
    }
}

/// Builder for [`Metric`].
#[derive(Debug, Clone)]
pub struct MetricBuilder {
    name: String,
    tags: Vec<Tag>,
    fields: Vec<Field>,
    time: Option<DateTime<Utc>>,
    kind: MetricKind,
}

impl MetricBuilder {
    /// Appends a tag.
    #[must_use]
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push(Tag {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    /// Appends a field.
    #[must_use]
    pub fn field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.push(Field {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    /// Sets the timestamp.
    #[must_use]
    pub const fn time(mut self, time: DateTime<Utc>) -> Self {
        self.time = Some(time);
        self
    }

    /// Sets the metric kind.
    #[must_use]
    pub const fn kind(mut self, kind: MetricKind) -> Self {
        self.kind = kind;
        self
    }

    /// Finishes the metric.
    #[must_use]
    pub fn build(self) -> Metric {
        Metric {
            name: self.name,
            tags: self.tags,
            fields: self.fields,
            time: self.time.unwrap_or_else(Utc::now),
            kind: self.kind,
        }
    }
}
