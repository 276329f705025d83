//! `SignalServiceClient` - channel/signal service client implementation.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;

use super::api::LocalSignalService;
use super::error::ServiceError;
use super::json::{ChannelListResponse, CreateChannelResponse, SignalListResponse};
use super::params::{MessageBatch, NewChannel, SignalQuery};
use super::types::{Channel, ErrorBody, IngestReport, ScrapeReport, Signal};

/// Default per-request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Body for `DELETE <signals>`.
#[derive(Debug, Serialize)]
struct DeleteSignalBody {
    id: i64,
}

/// Channel/signal service client.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct SignalServiceClient {
    /// HTTP client (reqwest, gzip enabled, per-request timeout).
    http_client: Client,
    /// Channel list/create endpoint.
    channels_url: Url,
    /// Signal list/delete/ingest endpoint.
    signals_url: Url,
    /// Scrape trigger endpoint (optional).
    scrape_url: Option<Url>,
}

/// Builder for `SignalServiceClient`.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct SignalServiceClientBuilder {
    channels_url: Option<Url>,
    signals_url: Option<Url>,
    scrape_url: Option<Url>,
    user_agent: Option<String>,
    timeout: Option<Duration>,
}

impl SignalServiceClientBuilder {
    /// Creates a new builder.
    const fn new() -> Self {
        Self {
            channels_url: None,
            signals_url: None,
            scrape_url: None,
            user_agent: None,
            timeout: None,
        }
    }

    /// Sets the channel endpoint (required).
    #[must_use]
    pub fn channels_url(mut self, url: Url) -> Self {
        self.channels_url = Some(url);
        self
    }

    /// Sets the signal endpoint (required).
    #[must_use]
    pub fn signals_url(mut self, url: Url) -> Self {
        self.signals_url = Some(url);
        self
    }

    /// Sets the scrape trigger endpoint.
    #[must_use]
    pub fn scrape_url(mut self, url: Url) -> Self {
        self.scrape_url = Some(url);
        self
    }

    /// Sets the User-Agent (required).
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Sets the per-request timeout (default: 15s).
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// - `channels_url`, `signals_url` or `user_agent` is not set.
    /// - `reqwest::Client` build fails.
    pub fn build(self) -> Result<SignalServiceClient> {
        let channels_url = self.channels_url.context("channels_url is required")?;
        let signals_url = self.signals_url.context("signals_url is required")?;
        let user_agent = self.user_agent.context("user_agent is required")?;

        let http_client = Client::builder()
            .user_agent(&user_agent)
            .gzip(true)
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()
            .context("failed to build HTTP client")?;

        Ok(SignalServiceClient {
            http_client,
            channels_url,
            signals_url,
            scrape_url: self.scrape_url,
        })
    }
}

impl SignalServiceClient {
    /// Creates a new builder.
    #[must_use]
    pub const fn builder() -> SignalServiceClientBuilder {
        SignalServiceClientBuilder::new()
    }

    /// Sends a request and returns the raw body of a 2xx response.
    ///
    /// Attaches a [`ServiceError`] to every failure that comes from the
    /// service or the network.
    #[instrument(skip_all, fields(operation))]
    async fn send(&self, operation: &'static str, builder: RequestBuilder) -> Result<String> {
        let request = builder
            .build()
            .with_context(|| format!("failed to build request: {operation}"))?;

        tracing::debug!(
            method = %request.method(),
            url = %request.url(),
            "Service request"
        );

        let response = self
            .http_client
            .execute(request)
            .await
            .context(ServiceError::Transport { operation })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context(ServiceError::Transport { operation })?;
        tracing::debug!(%status, body_len = body.len(), "Service response");

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .unwrap_or_default()
                .into_message();
            tracing::warn!(
                operation,
                code = status.as_u16(),
                message = message.as_deref().unwrap_or("-"),
                "Service returned an error status"
            );
            return Err(ServiceError::Status {
                operation,
                status: status.as_u16(),
                message,
            }
            .into());
        }

        Ok(body)
    }

    /// Sends a request and decodes the 2xx body as `T`.
    async fn send_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        builder: RequestBuilder,
    ) -> Result<T> {
        let body = self.send(operation, builder).await?;
        let raw_result: std::result::Result<T, _> = serde_json::from_str(&body);
        raw_result.context(ServiceError::Decode { operation })
    }
}

impl LocalSignalService for SignalServiceClient {
    #[instrument(skip_all)]
    async fn list_channels(&self) -> Result<Vec<Channel>> {
        let builder = self.http_client.get(self.channels_url.clone());
        let response: ChannelListResponse = self.send_json("list_channels", builder).await?;
        Ok(response.channels)
    }

    #[instrument(skip_all, fields(channel = %channel.channel_username))]
    async fn create_channel(&self, channel: &NewChannel) -> Result<Option<Channel>> {
        let builder = self.http_client.post(self.channels_url.clone()).json(channel);
        let body = self.send("create_channel", builder).await?;
        // The list is reloaded after a create, so an odd echo is not fatal.
        Ok(serde_json::from_str::<CreateChannelResponse>(&body)
            .ok()
            .and_then(|r| r.channel))
    }

    #[instrument(skip_all)]
    async fn list_signals(&self, query: &SignalQuery) -> Result<Vec<Signal>> {
        let builder = self
            .http_client
            .get(self.signals_url.clone())
            .query(&query.to_query());
        let response: SignalListResponse = self.send_json("list_signals", builder).await?;
        Ok(response.signals)
    }

    #[instrument(skip_all, fields(id))]
    async fn delete_signal(&self, id: i64) -> Result<()> {
        let builder = self
            .http_client
            .delete(self.signals_url.clone())
            .json(&DeleteSignalBody { id });
        self.send("delete_signal", builder).await?;
        Ok(())
    }

    #[instrument(skip_all, fields(channel = %batch.channel_username))]
    async fn ingest_messages(&self, batch: &MessageBatch) -> Result<IngestReport> {
        let builder = self.http_client.put(self.signals_url.clone()).json(batch);
        self.send_json("ingest_messages", builder).await
    }

    #[instrument(skip_all)]
    async fn trigger_scrape(&self) -> Result<ScrapeReport> {
        let Some(url) = self.scrape_url.clone() else {
            bail!("scrape endpoint is not configured");
        };
        let builder = self.http_client.get(url);
        self.send_json("trigger_scrape", builder).await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::service::{RawMessage, SignalType};

    fn client_for(server: &MockServer) -> SignalServiceClient {
        SignalServiceClient::builder()
            .channels_url(format!("{}/channels", server.uri()).parse().unwrap())
            .signals_url(format!("{}/signals", server.uri()).parse().unwrap())
            .scrape_url(format!("{}/scrape", server.uri()).parse().unwrap())
            .user_agent("test/0.0.0")
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_requires_channels_url() {
        // Arrange & Act
        let result = SignalServiceClient::builder()
            .signals_url(Url::parse("http://localhost/signals").unwrap())
            .user_agent("test/0.0.0")
            .build();

        // Assert
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("channels_url is required")
        );
    }

    #[test]
    fn test_builder_requires_user_agent() {
        // Arrange & Act
        let result = SignalServiceClient::builder()
            .channels_url(Url::parse("http://localhost/channels").unwrap())
            .signals_url(Url::parse("http://localhost/signals").unwrap())
            .build();

        // Assert
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("user_agent is required")
        );
    }

    #[test]
    fn test_builder_with_required_fields_succeeds() {
        // Arrange & Act
        let client = SignalServiceClient::builder()
            .channels_url(Url::parse("http://localhost/channels").unwrap())
            .signals_url(Url::parse("http://localhost/signals").unwrap())
            .user_agent("test/0.0.0")
            .build()
            .unwrap();

        // Assert
        assert!(client.scrape_url.is_none());
    }

    #[tokio::test]
    async fn test_list_channels_via_http() {
        // Arrange
        let server = MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/service/channels.json");
        Mock::given(method("GET"))
            .and(path("/channels"))
            .respond_with(ResponseTemplate::new(200).set_body_string(json_body))
            .mount(&server)
            .await;
        let client = client_for(&server);

        // Act
        let channels = client.list_channels().await.unwrap();

        // Assert
        assert_eq!(channels.len(), 3);
        assert_eq!(channels[0].channel_username, "invest_ru");
        assert_eq!(channels[2].channel_title, "startup_money");
        assert!(!channels[1].is_active);
    }

    #[tokio::test]
    async fn test_list_channels_missing_field_is_empty() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/channels"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .mount(&server)
            .await;
        let client = client_for(&server);

        // Act
        let channels = client.list_channels().await.unwrap();

        // Assert
        assert!(channels.is_empty());
    }

    #[tokio::test]
    async fn test_list_signals_sends_query() {
        // Arrange
        let server = MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/service/signals.json");
        Mock::given(method("GET"))
            .and(path("/signals"))
            .and(query_param("limit", "50"))
            .and(query_param("ticker", "SBER"))
            .respond_with(ResponseTemplate::new(200).set_body_string(json_body))
            .expect(1)
            .mount(&server)
            .await;
        let client = client_for(&server);

        // Act
        let signals = client
            .list_signals(&SignalQuery::new().limit(50).ticker("SBER"))
            .await
            .unwrap();

        // Assert
        assert_eq!(signals.len(), 6);
        assert_eq!(signals[0].signal_type, SignalType::Buy);
    }

    #[tokio::test]
    async fn test_create_channel_sends_body() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/channels"))
            .and(body_json(serde_json::json!({
                "channel_username": "alpha",
                "channel_title": "alpha"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_string(
                r#"{"channel": {"id": 11, "channel_username": "alpha", "channel_title": "alpha",
                    "is_active": true, "last_message_id": 0}}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;
        let client = client_for(&server);

        // Act
        let created = client
            .create_channel(&NewChannel::from_handle("alpha"))
            .await
            .unwrap();

        // Assert
        assert_eq!(created.unwrap().id, 11);
    }

    #[tokio::test]
    async fn test_create_channel_error_status() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_string(r#"{"error": "channel_username required"}"#),
            )
            .mount(&server)
            .await;
        let client = client_for(&server);

        // Act
        let err = client
            .create_channel(&NewChannel::from_handle("x"))
            .await
            .unwrap_err();

        // Assert
        assert_eq!(
            ServiceError::classify(&err),
            Some(&ServiceError::Status {
                operation: "create_channel",
                status: 400,
                message: Some(String::from("channel_username required")),
            })
        );
    }

    #[tokio::test]
    async fn test_delete_signal_sends_id_in_body() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/signals"))
            .and(body_json(serde_json::json!({"id": 42})))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"success": true}"#))
            .expect(1)
            .mount(&server)
            .await;
        let client = client_for(&server);

        // Act & Assert (mock expect(1) verifies the body)
        client.delete_signal(42).await.unwrap();
    }

    #[tokio::test]
    async fn test_ingest_messages_via_http() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/signals"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"parsed_count": 1, "total_messages": 2}"#),
            )
            .mount(&server)
            .await;
        let client = client_for(&server);
        let batch = MessageBatch {
            channel_username: String::from("alpha"),
            messages: vec![
                RawMessage {
                    id: 1,
                    text: String::from("SBER buy 250"),
                    date: None,
                },
                RawMessage {
                    id: 2,
                    text: String::from("good morning"),
                    date: None,
                },
            ],
        };

        // Act
        let report = client.ingest_messages(&batch).await.unwrap();

        // Assert
        assert_eq!(report.parsed_count, 1);
        assert_eq!(report.total_messages, 2);
    }

    #[tokio::test]
    async fn test_trigger_scrape_success() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/scrape"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"status": "success", "parsed_messages": 7}"#),
            )
            .mount(&server)
            .await;
        let client = client_for(&server);

        // Act
        let report = client.trigger_scrape().await.unwrap();

        // Assert
        assert_eq!(report.status, "success");
        assert_eq!(report.parsed_messages, 7);
    }

    #[tokio::test]
    async fn test_trigger_scrape_error_status() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/scrape"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_string(r#"{"status": "error", "message": "session expired"}"#),
            )
            .mount(&server)
            .await;
        let client = client_for(&server);

        // Act
        let err = client.trigger_scrape().await.unwrap_err();

        // Assert
        assert!(err.to_string().contains("HTTP 500: session expired"));
    }

    #[tokio::test]
    async fn test_trigger_scrape_without_endpoint() {
        // Arrange
        let client = SignalServiceClient::builder()
            .channels_url(Url::parse("http://localhost/channels").unwrap())
            .signals_url(Url::parse("http://localhost/signals").unwrap())
            .user_agent("test/0.0.0")
            .build()
            .unwrap();

        // Act
        let err = client.trigger_scrape().await.unwrap_err();

        // Assert
        assert!(err.to_string().contains("scrape endpoint is not configured"));
        assert!(ServiceError::classify(&err).is_none());
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;
        let client = client_for(&server);

        // Act
        let err = client.list_signals(&SignalQuery::new()).await.unwrap_err();

        // Assert
        assert_eq!(
            ServiceError::classify(&err),
            Some(&ServiceError::Decode {
                operation: "list_signals"
            })
        );
    }

    #[tokio::test]
    async fn test_timeout_is_transport_error() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("{}")
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;
        let client = SignalServiceClient::builder()
            .channels_url(format!("{}/channels", server.uri()).parse().unwrap())
            .signals_url(format!("{}/signals", server.uri()).parse().unwrap())
            .user_agent("test/0.0.0")
            .timeout(Duration::from_millis(50))
            .build()
            .unwrap();

        // Act
        let err = client.list_channels().await.unwrap_err();

        // Assert
        assert!(ServiceError::classify(&err).unwrap().is_transport());
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        // Arrange
        let server = MockServer::start().await;
        let uri = server.uri();
        drop(server);
        let client = SignalServiceClient::builder()
            .channels_url(format!("{uri}/channels").parse().unwrap())
            .signals_url(format!("{uri}/signals").parse().unwrap())
            .user_agent("test/0.0.0")
            .build()
            .unwrap();

        // Act
        let err = client.list_channels().await.unwrap_err();

        // Assert
        assert!(ServiceError::classify(&err).unwrap().is_transport());
    }
}
