use crate::{
    config::{ProducerConfig, ProducerConfigBuilder},
    error::{Result, TransportError, WorkqueueError},
    input::Input,
    options::Options,
    payload::Payload,
};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug_span, Instrument};

const PUBLISH_PATH: &str = "/event/publisher";

/// Anything that can publish events to the workqueue backend.
///
/// Application services depend on this trait rather than on [`Producer`]
/// directly, which keeps them testable with an in-memory implementation.
/// `publish` is generic over the payload, so the trait is not object safe:
/// hold a `P: Publisher` type parameter rather than an `Arc<dyn Publisher>`.
///
/// # Examples
///
/// ```no_run
/// use serde_json::json;
/// use tokio_util::sync::CancellationToken;
/// use workqueue::{Input, Publisher};
///
/// struct SignupService<P> {
///     events: P,
/// }
///
/// impl<P: Publisher> SignupService<P> {
///     async fn register(&self, cancel: &CancellationToken) -> workqueue::Result<()> {
///         let input = Input::builder()
///             .event("user.created")
///             .data(json!({"input": "value"}))
///             .build();
///         self.events.publish(cancel, input).await
///     }
/// }
/// ```
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publishes one event, honoring `cancel` for the duration of the call.
    async fn publish<T>(&self, cancel: &CancellationToken, input: Input<T>) -> Result<()>
    where
        T: Serialize + Send + Sync;
}

/// HTTP producer for the workqueue backend.
///
/// A `Producer` is built once and shared; it holds no per-call state, and
/// cloning it shares the underlying connection pool. Each publish makes
/// exactly one POST to `{host}/event/publisher` and never retries.
///
/// # Examples
///
/// ```no_run
/// use serde_json::json;
/// use tokio_util::sync::CancellationToken;
/// use workqueue::{Duration, Input, Options, Producer, Publisher};
///
/// #[tokio::main]
/// async fn main() -> Result<(), workqueue::WorkqueueError> {
///     let defaults = Options::builder()
///         .queue_type("internal.medium")
///         .max_retries(5)
///         .retention(Duration::from_hours(168))
///         .schedule_in(Duration::from_mins(5))
///         .build();
///
///     let producer = Producer::new("http://localhost:8080", "your-token", defaults)?;
///
///     let input = Input::builder()
///         .event("user.created")
///         .data(json!({"input": "value"}))
///         .build();
///
///     producer.publish(&CancellationToken::new(), input).await?;
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Producer {
    client: reqwest::Client,
    config: ProducerConfig,
    endpoint: String,
}

impl Producer {
    /// Creates a producer with the default 50ms client timeout.
    ///
    /// `default_options` are used for every input whose options are unset.
    /// Note that an input cannot ask for "backend defaults only" while the
    /// producer carries non-empty defaults: unset options always fall back
    /// to `default_options`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkqueueError::Configuration`] if the HTTP client cannot be built.
    pub fn new(
        host: impl Into<String>,
        token: impl Into<String>,
        default_options: Options,
    ) -> Result<Self> {
        let config = ProducerConfigBuilder::new()
            .host(host)
            .token(token)
            .default_options(default_options)
            .build();

        Self::with_config(config)
    }

    /// Creates a producer from a full [`ProducerConfig`].
    ///
    /// ```no_run
    /// use std::time::Duration;
    /// use workqueue::Producer;
    ///
    /// # fn example() -> workqueue::Result<()> {
    /// let producer = Producer::with_config(
    ///     Producer::builder()
    ///         .host("http://queue.internal:8080")
    ///         .token("your-token")
    ///         .timeout(Duration::from_millis(500))
    ///         .build(),
    /// )?;
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`WorkqueueError::Configuration`] if the HTTP client cannot be built.
    pub fn with_config(config: ProducerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                WorkqueueError::Configuration(format!("failed to build HTTP client: {e}"))
            })?;

        let endpoint = format!("{}{}", config.host.trim_end_matches('/'), PUBLISH_PATH);

        Ok(Self {
            client,
            config,
            endpoint,
        })
    }

    pub fn builder() -> ProducerConfigBuilder {
        ProducerConfigBuilder::new()
    }

    pub fn host(&self) -> &str {
        &self.config.host
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }

    pub fn default_options(&self) -> &Options {
        &self.config.default_options
    }

    /// Picks the options to transmit: the input's own if any field is set,
    /// otherwise the producer defaults. The two are never merged.
    fn resolve_options<'a>(&'a self, requested: &'a Options) -> &'a Options {
        if requested.is_unset() {
            &self.config.default_options
        } else {
            requested
        }
    }

    async fn send(&self, cancel: &CancellationToken, body: Vec<u8>) -> Result<()> {
        let request = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, format!("Basic {}", self.config.token))
            .body(body)
            .build()
            .map_err(TransportError::Request)?;

        let exchange = async {
            tracing::debug!("Sending event");

            let response = self
                .client
                .execute(request)
                .await
                .map_err(|e| self.transport_error(e))?;

            let status = response.status().as_u16();
            let ack = response.bytes().await.map_err(WorkqueueError::AckRead)?;

            Ok::<_, WorkqueueError>((status, ack))
        };

        let (status, ack) = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("Publish cancelled");
                return Err(TransportError::Cancelled.into());
            }
            result = exchange => result?,
        };

        if status > 399 {
            return Err(WorkqueueError::Backend {
                status,
                body: String::from_utf8_lossy(&ack).into_owned(),
            });
        }

        tracing::debug!(status, "Event acknowledged");
        Ok(())
    }

    fn transport_error(&self, error: reqwest::Error) -> WorkqueueError {
        let error = if error.is_timeout() {
            TransportError::Timeout {
                timeout_ms: saturating_millis(self.config.timeout),
            }
        } else if error.is_builder() {
            TransportError::Request(error)
        } else {
            TransportError::Network(error)
        };
        error.into()
    }
}

fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[async_trait]
impl Publisher for Producer {
    /// Validates, fills in default options, and sends the event.
    ///
    /// # Errors
    ///
    /// * [`WorkqueueError::Validation`] if `input.event` is empty; nothing is sent
    /// * [`WorkqueueError::Serialization`] if `input.data` cannot be encoded as JSON
    /// * [`WorkqueueError::Transport`] for request, network, timeout or cancellation failures
    /// * [`WorkqueueError::AckRead`] if the response body cannot be read
    /// * [`WorkqueueError::Backend`] if the backend answers with a status above 399
    async fn publish<T>(&self, cancel: &CancellationToken, input: Input<T>) -> Result<()>
    where
        T: Serialize + Send + Sync,
    {
        if input.event.is_empty() {
            return Err(WorkqueueError::Validation(
                "event cannot be empty".to_string(),
            ));
        }

        let options = self.resolve_options(&input.options);
        let body = serde_json::to_vec(&Payload::new(&input, options))?;

        let span = debug_span!(
            "publish",
            event = %input.event,
            endpoint = %self.endpoint,
            event_id = %input.event_id,
            correlation_id = %input.correlation_id
        );

        self.send(cancel, body).instrument(span).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duration::Duration as WireDuration;
    use serde::ser::Error as _;
    use serde_json::json;
    use std::time::Instant;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

    const LOCAL_HOST: &str = "http://localhost:8080";

    fn test_producer(server: &MockServer, default_options: Options) -> Producer {
        Producer::with_config(
            Producer::builder()
                .host(server.uri())
                .token("secret-token")
                .timeout(Duration::from_secs(2))
                .default_options(default_options)
                .build(),
        )
        .unwrap()
    }

    fn producer_defaults() -> Options {
        Options::builder()
            .queue_type("internal.medium")
            .max_retries(5)
            .retention(WireDuration::from_hours(168))
            .schedule_in(WireDuration::from_mins(5))
            .build()
    }

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S>(&self, _serializer: S) -> std::result::Result<S::Ok, S::Error>
        where
            S: serde::Serializer,
        {
            Err(S::Error::custom("payload refuses to serialize"))
        }
    }

    #[test]
    fn test_endpoint_from_host() {
        let producer = Producer::new(LOCAL_HOST, "token", Options::default()).unwrap();
        assert_eq!(producer.endpoint(), "http://localhost:8080/event/publisher");
        assert_eq!(producer.host(), "http://localhost:8080");

        let producer = Producer::new("http://localhost:8080/", "t", Options::default()).unwrap();
        assert_eq!(producer.endpoint(), "http://localhost:8080/event/publisher");
    }

    #[test]
    fn test_new_uses_short_timeout() {
        let producer = Producer::new(LOCAL_HOST, "token", producer_defaults()).unwrap();
        assert_eq!(producer.timeout(), Duration::from_millis(50));
        assert_eq!(producer.default_options(), &producer_defaults());
    }

    #[test]
    fn test_saturating_millis() {
        assert_eq!(saturating_millis(Duration::from_millis(50)), 50);
        assert_eq!(saturating_millis(Duration::MAX), u64::MAX);
    }

    #[test]
    fn test_resolve_options() {
        let producer = Producer::new(LOCAL_HOST, "token", producer_defaults()).unwrap();

        let unset = Options::default();
        assert_eq!(producer.resolve_options(&unset), &producer_defaults());

        let explicit = Options::builder().max_retries(1).build();
        assert_eq!(producer.resolve_options(&explicit), &explicit);
    }

    #[tokio::test]
    async fn test_publish_success() {
        let server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .and(matchers::path("/event/publisher"))
            .and(matchers::header("content-type", "application/json"))
            .and(matchers::header("authorization", "Basic secret-token"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let producer = test_producer(&server, Options::default());
        let input = Input::new("user.created", json!({"input": "value"}));

        let result = producer.publish(&CancellationToken::new(), input).await;
        assert!(result.is_ok(), "publish failed: {:?}", result.err());

        server.verify().await;
    }

    #[tokio::test]
    async fn test_publish_empty_event_sends_nothing() {
        let server = MockServer::start().await;

        Mock::given(matchers::any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let producer = test_producer(&server, producer_defaults());
        let input = Input::builder().data(json!({"input": "value"})).build();

        match producer.publish(&CancellationToken::new(), input).await {
            Err(WorkqueueError::Validation(msg)) => assert_eq!(msg, "event cannot be empty"),
            other => panic!("Expected validation error, got {:?}", other),
        }

        server.verify().await;
    }

    #[tokio::test]
    async fn test_publish_fills_default_options() {
        let server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .and(matchers::body_json(json!({
                "event_name": "user.created",
                "data": {"input": "value"},
                "opts": {
                    "queue_type": "internal.medium",
                    "max_retries": 5,
                    "schedule_in": "5m0s",
                    "retention": "168h0m0s"
                },
                "metadata": {"headers": {"correlation_id": "", "event_id": ""}}
            })))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let producer = test_producer(&server, producer_defaults());
        let input = Input::builder()
            .event("user.created")
            .data(json!({"input": "value"}))
            .build();

        producer
            .publish(&CancellationToken::new(), input)
            .await
            .unwrap();

        server.verify().await;
    }

    #[tokio::test]
    async fn test_publish_explicit_options_not_merged() {
        let server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .and(matchers::body_json(json!({
                "event_name": "invoice.overdue",
                "data": [1, 2],
                "opts": {"unique_ttl": "30s"},
                "metadata": {"headers": {"correlation_id": "corr-7", "event_id": "evt-7"}}
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let producer = test_producer(&server, producer_defaults());
        let input = Input::builder()
            .event("invoice.overdue")
            .data(json!([1, 2]))
            .options(Options::builder().unique_ttl(WireDuration::from_secs(30)).build())
            .correlation_id("corr-7")
            .event_id("evt-7")
            .build();

        producer
            .publish(&CancellationToken::new(), input)
            .await
            .unwrap();

        server.verify().await;
    }

    #[tokio::test]
    async fn test_publish_backend_error_keeps_body() {
        let server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .expect(1)
            .mount(&server)
            .await;

        let producer = test_producer(&server, Options::default());
        let input = Input::new("user.created", json!({}));

        let error = producer
            .publish(&CancellationToken::new(), input)
            .await
            .unwrap_err();

        match &error {
            WorkqueueError::Backend { status, body } => {
                assert_eq!(*status, 500);
                assert_eq!(body, "internal error");
            }
            other => panic!("Expected backend error, got {:?}", other),
        }
        assert!(error.to_string().contains("internal error"));
    }

    #[tokio::test]
    async fn test_publish_status_400_is_error() {
        let server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
            .mount(&server)
            .await;

        let producer = test_producer(&server, Options::default());
        let result = producer
            .publish(&CancellationToken::new(), Input::new("a", json!(null)))
            .await;

        assert!(matches!(
            result,
            Err(WorkqueueError::Backend { status: 400, .. })
        ));
    }

    #[tokio::test]
    async fn test_publish_success_ignores_body() {
        let server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"error\":\"ignored\"}"))
            .mount(&server)
            .await;

        let producer = test_producer(&server, Options::default());
        let result = producer
            .publish(&CancellationToken::new(), Input::new("a", json!(null)))
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_publish_serialization_error_sends_nothing() {
        let server = MockServer::start().await;

        Mock::given(matchers::any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let producer = test_producer(&server, Options::default());
        let input = Input::new("user.created", Unserializable);

        let error = producer
            .publish(&CancellationToken::new(), input)
            .await
            .unwrap_err();

        assert!(matches!(error, WorkqueueError::Serialization(_)));
        assert!(error.to_string().contains("payload refuses to serialize"));

        server.verify().await;
    }

    #[tokio::test]
    async fn test_publish_already_cancelled() {
        let server = MockServer::start().await;

        Mock::given(matchers::any())
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .expect(0)
            .mount(&server)
            .await;

        let producer = Producer::with_config(
            Producer::builder()
                .host(server.uri())
                .timeout(Duration::from_secs(10))
                .build(),
        )
        .unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();

        let started = Instant::now();
        let error = producer
            .publish(&cancel, Input::new("user.created", json!({})))
            .await
            .unwrap_err();

        assert!(error.is_cancelled());
        assert!(started.elapsed() < Duration::from_secs(1));

        server.verify().await;
    }

    #[tokio::test]
    async fn test_publish_cancelled_in_flight() {
        let server = MockServer::start().await;

        Mock::given(matchers::any())
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let producer = Producer::with_config(
            Producer::builder()
                .host(server.uri())
                .timeout(Duration::from_secs(10))
                .build(),
        )
        .unwrap();

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        let error = producer
            .publish(&cancel, Input::new("user.created", json!({})))
            .await
            .unwrap_err();

        assert!(error.is_cancelled());
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_publish_timeout() {
        let server = MockServer::start().await;

        Mock::given(matchers::any())
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let producer = Producer::new(server.uri(), "token", Options::default()).unwrap();

        let error = producer
            .publish(&CancellationToken::new(), Input::new("user.created", json!({})))
            .await
            .unwrap_err();

        match error {
            WorkqueueError::Transport(TransportError::Timeout { timeout_ms }) => {
                assert_eq!(timeout_ms, 50)
            }
            other => panic!("Expected timeout error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_publish_invalid_host_is_request_error() {
        let producer = Producer::new("not a url", "token", Options::default()).unwrap();

        let error = producer
            .publish(&CancellationToken::new(), Input::new("user.created", json!({})))
            .await
            .unwrap_err();

        assert!(matches!(
            error,
            WorkqueueError::Transport(TransportError::Request(_))
        ));
        assert!(!error.is_retryable());
    }

    #[tokio::test]
    async fn test_publish_connection_refused_is_network_error() {
        let producer = Producer::with_config(
            Producer::builder()
                .host("http://127.0.0.1:1")
                .timeout(Duration::from_secs(2))
                .build(),
        )
        .unwrap();

        let error = producer
            .publish(&CancellationToken::new(), Input::new("user.created", json!({})))
            .await
            .unwrap_err();

        assert!(matches!(
            error,
            WorkqueueError::Transport(TransportError::Network(_))
        ));
        assert!(error.is_retryable());
    }

    #[tokio::test]
    async fn test_publish_truncated_ack_is_ack_read_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // Promises 100 body bytes, sends 5, then closes the connection.
        let backend = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 4096];
            let _ = stream.read(&mut request).await.unwrap();
            stream
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\nshort")
                .await
                .unwrap();
            stream.shutdown().await.unwrap();
        });

        let producer = Producer::with_config(
            Producer::builder()
                .host(format!("http://{addr}"))
                .timeout(Duration::from_secs(2))
                .build(),
        )
        .unwrap();

        let error = producer
            .publish(&CancellationToken::new(), Input::new("user.created", json!({})))
            .await
            .unwrap_err();

        assert!(matches!(error, WorkqueueError::AckRead(_)));
        assert!(!error.is_retryable());
        assert!(error.to_string().starts_with("failed to confirm ack:"));

        backend.await.unwrap();
    }
}
