use crate::duration::Duration;
use serde::{Deserialize, Serialize};

/// Delivery options attached to a single publish request.
///
/// Every field is optional; unset fields are omitted from the request body and
/// the backend applies its own defaults for them. An `Options` with no field
/// set is treated by [`Producer`](crate::Producer) as "no options given" and is
/// replaced by the producer's configured default options.
///
/// # Examples
///
/// ```
/// use workqueue::{Duration, Options};
///
/// let options = Options::builder()
///     .queue_type("internal.critical")
///     .max_retries(5)
///     .retention(Duration::from_hours(168))
///     .schedule_in(Duration::from_mins(5))
///     .build();
///
/// assert_eq!(options.max_retries, Some(5));
/// assert!(!options.is_unset());
/// assert!(Options::default().is_unset());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
    /// Queue class the backend should route the event to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_type: Option<String>,
    /// Maximum number of delivery attempts after the first failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
    /// Delay before the first delivery attempt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_in: Option<Duration>,
    /// How long the backend keeps the job record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retention: Option<Duration>,
    /// Deduplication window for identical events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_ttl: Option<Duration>,
}

impl Options {
    pub fn builder() -> OptionsBuilder {
        OptionsBuilder::new()
    }

    /// Returns `true` when no field has been set.
    pub fn is_unset(&self) -> bool {
        self.queue_type.is_none()
            && self.max_retries.is_none()
            && self.schedule_in.is_none()
            && self.retention.is_none()
            && self.unique_ttl.is_none()
    }
}

/// Fluent builder for [`Options`].
///
/// Setting a field twice keeps the last value. Building with nothing set
/// yields [`Options::default()`].
#[derive(Debug, Clone, Default)]
pub struct OptionsBuilder {
    options: Options,
}

impl OptionsBuilder {
    pub fn new() -> Self {
        Self {
            options: Options::default(),
        }
    }

    pub fn queue_type(mut self, queue_type: impl Into<String>) -> Self {
        self.options.queue_type = Some(queue_type.into());
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.options.max_retries = Some(max_retries);
        self
    }

    pub fn schedule_in(mut self, schedule_in: Duration) -> Self {
        self.options.schedule_in = Some(schedule_in);
        self
    }

    pub fn retention(mut self, retention: Duration) -> Self {
        self.options.retention = Some(retention);
        self
    }

    pub fn unique_ttl(mut self, unique_ttl: Duration) -> Self {
        self.options.unique_ttl = Some(unique_ttl);
        self
    }

    pub fn build(self) -> Options {
        self.options
    }
}
