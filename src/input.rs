use crate::options::Options;
use serde_json::Value;

/// A single event to publish.
///
/// `Input` is what application code hands to [`Publisher::publish`](crate::Publisher::publish).
/// The producer reshapes it into the wire envelope; correlation and event ids
/// travel as metadata headers and are opaque to this library.
///
/// The business payload defaults to [`serde_json::Value`] but may be any
/// `Serialize` type.
///
/// # Examples
///
/// ```
/// use workqueue::Input;
/// use serde_json::json;
///
/// let input = Input::builder()
///     .event("user.created")
///     .data(json!({"input": "value"}))
///     .correlation_id("req-42")
///     .build();
///
/// assert_eq!(input.event, "user.created");
/// assert!(input.options.is_unset());
/// assert_eq!(input.event_id, "");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Input<T = Value> {
    /// Event name; must be non-empty when published
    pub event: String,
    /// Business payload
    pub data: T,
    /// Delivery options; unset means "use the producer's defaults"
    pub options: Options,
    pub correlation_id: String,
    pub event_id: String,
}

impl<T> Input<T> {
    pub fn new(event: impl Into<String>, data: T) -> Self {
        Self {
            event: event.into(),
            data,
            options: Options::default(),
            correlation_id: String::new(),
            event_id: String::new(),
        }
    }
}

impl Input {
    pub fn builder() -> InputBuilder {
        InputBuilder::new()
    }
}

/// Fluent builder for [`Input`].
///
/// The builder only assembles; it never validates. An empty event name is
/// accepted here and rejected when the input is published.
#[derive(Debug, Clone)]
pub struct InputBuilder<T = Value> {
    input: Input<T>,
}

impl InputBuilder {
    pub fn new() -> Self {
        Self {
            input: Input::new(String::new(), Value::Null),
        }
    }
}

impl Default for InputBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> InputBuilder<T> {
    pub fn event(mut self, event: impl Into<String>) -> Self {
        self.input.event = event.into();
        self
    }

    /// Sets the payload, switching the builder to the payload's type.
    pub fn data<U>(self, data: U) -> InputBuilder<U> {
        let Input {
            event,
            options,
            correlation_id,
            event_id,
            ..
        } = self.input;

        InputBuilder {
            input: Input {
                event,
                data,
                options,
                correlation_id,
                event_id,
            },
        }
    }

    pub fn options(mut self, options: Options) -> Self {
        self.input.options = options;
        self
    }

    pub fn correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.input.correlation_id = correlation_id.into();
        self
    }

    pub fn event_id(mut self, event_id: impl Into<String>) -> Self {
        self.input.event_id = event_id.into();
        self
    }

    pub fn build(self) -> Input<T> {
        self.input
    }
}
