//! # Workqueue Rust Producer
//!
//! A Rust producer library for submitting background work ("events") to a
//! workqueue backend over HTTP.
//!
//! Callers describe an event with an [`Input`] (event name, payload, delivery
//! [`Options`] and correlation ids) and hand it to a [`Publisher`]. The bundled
//! [`Producer`] validates the input, fills in default options, reshapes it into
//! the backend's JSON envelope and POSTs it to `{host}/event/publisher`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use serde_json::json;
//! use tokio_util::sync::CancellationToken;
//! use workqueue::{Duration, Input, Options, Producer, Publisher};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Options used whenever an input carries none
//!     let defaults = Options::builder()
//!         .queue_type("internal.medium")
//!         .max_retries(5)
//!         .retention("168h".parse()?)
//!         .schedule_in("5min".parse()?)
//!         .build();
//!
//!     let producer = Producer::new("http://localhost:8080", "your-token", defaults)?;
//!     let cancel = CancellationToken::new();
//!
//!     // Explicit options for a critical event
//!     let input = Input::builder()
//!         .event("user.created")
//!         .data(json!({"input": "value"}))
//!         .options(
//!             Options::builder()
//!                 .queue_type("internal.critical")
//!                 .max_retries(5)
//!                 .schedule_in(Duration::from_mins(5))
//!                 .build(),
//!         )
//!         .build();
//!     producer.publish(&cancel, input).await?;
//!
//!     // Producer defaults apply here
//!     let input = Input::builder()
//!         .event("user.created")
//!         .data(json!({"input": "value"}))
//!         .build();
//!     producer.publish(&cancel, input).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Single attempt** - One HTTP request per publish; no retries, batching or queueing
//! - **Cancellation** - Every publish honours a [`CancellationToken`](tokio_util::sync::CancellationToken)
//! - **Short timeout** - 50ms client timeout by default, tuned for a co-located backend
//! - **Typed payloads** - Any `Serialize` type can be the event data
//! - **Error handling** - One error per failing stage, with retryable classification
//! - **Go-compatible durations** - [`Duration`] speaks `"5m0s"` / `"168h0m0s"` on the wire
//!
//! ## Configuration
//!
//! Use [`ProducerConfigBuilder`] to tune the client:
//!
//! ```no_run
//! use workqueue::{Options, Producer};
//! use std::time::Duration;
//!
//! # fn example() -> Result<(), workqueue::WorkqueueError> {
//! let producer = Producer::with_config(
//!     Producer::builder()
//!         .host("http://queue.example.com")
//!         .token("your-token")
//!         .timeout(Duration::from_millis(500))
//!         .default_options(Options::builder().queue_type("internal.low").build())
//!         .build(),
//! )?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod duration;
pub mod error;
pub mod input;
pub mod options;
pub mod payload;
pub mod producer;

pub use config::{ProducerConfig, ProducerConfigBuilder};
pub use duration::{Duration, DurationParseError};
pub use error::{Result, TransportError, WorkqueueError};
pub use input::{Input, InputBuilder};
pub use options::{Options, OptionsBuilder};
pub use payload::Payload;
pub use producer::{Producer, Publisher};
