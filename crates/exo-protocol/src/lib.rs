//! Wire protocol between the exo agent and external plugin processes.
//!
//! A plugin process is driven over its stdin/stdout pipes with a small
//! request/response protocol:
//!
//! - [`frame`] - length-prefixed framing (4-byte big-endian length)
//! - [`handshake`] - protocol version + magic cookie check and session key
//!   exchange, run once per subprocess before any RPC
//! - [`channel`] - every post-handshake frame carries a BLAKE3 keyed MAC
//!   bound to its direction and sequence number
//! - [`messages`] - the five input operations and their responses
//! - [`codec`] - conversion between [`exo_core::Metric`] and [`WireMetric`]
//! - [`service`] - the [`InputService`] trait implemented by both the
//!   host-side stub and the plugin-side server
//!
//! # Examples
//!
//! ```
//! use exo_core::{Metric, MetricKind};
//! use exo_protocol::{decode_metric, encode_metric};
//!
//! let metric = Metric::builder("cpu")
//!     .tag("host", "a")
//!     .field("value", 42_i64)
//!     .kind(MetricKind::Counter)
//!     .time(chrono::DateTime::from_timestamp_nanos(0))
//!     .build();
//!
//! let wire = encode_metric(&metric).unwrap();
//! assert_eq!(decode_metric(wire), metric);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

pub mod channel;
pub mod codec;
pub mod error;
pub mod frame;
pub mod handshake;
pub mod messages;
pub mod service;
pub mod wire;

pub use channel::{Role, SecureChannel, SessionKey};
pub use codec::{decode_metric, decode_metrics, encode_metric, encode_metrics};
pub use error::{ProtocolError, Result};
pub use frame::Transport;
pub use handshake::{host_handshake, plugin_handshake};
pub use messages::{Envelope, HostHello, PluginHello, Request, Response, SERVICE_INPUT};
pub use service::{InputService, RpcError};
pub use wire::{FieldType, WireError, WireField, WireMetric, WireTag};
