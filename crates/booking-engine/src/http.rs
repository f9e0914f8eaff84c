//! `reqwest`-backed [`BookingBackend`].

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde_json::{json, Value};
use tracing::debug;

use crate::backend::{
    AvailabilityPayload, AvailabilityRequest, BookingBackend, BookingsQuery, CreateBookingRequest,
    CreatedBooking, DayWindowRequest,
};
use crate::config::EngineConfig;
use crate::error::RemoteError;

/// HTTP client for the bookings API rooted at `base_url`.
///
/// Every call is a single attempt with the configured timeout; retrying is
/// left to the user.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
    api_token: Option<String>,
}

impl HttpBackend {
    pub fn new(config: &EngineConfig) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| RemoteError::Transport(format!("invalid base url {}: {e}", config.base_url)))?;
        Ok(Self {
            client,
            base_url,
            api_token: config.api_token.clone(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, RemoteError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| RemoteError::Transport(format!("base url {} cannot have a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, RemoteError> {
        let url = self.endpoint(segments)?;
        debug!(%method, %url, "booking api request");
        let builder = self.client.request(method, url);
        Ok(match &self.api_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Value, RemoteError> {
        let response = builder
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        debug!(%status, bytes = body.len(), "booking api response");

        if !status.is_success() {
            let message = error_message(status, &body);
            return Err(match status {
                StatusCode::NOT_FOUND | StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED => {
                    RemoteError::Unsupported(message)
                }
                _ => RemoteError::Status {
                    status: status.as_u16(),
                    message,
                },
            });
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| RemoteError::Decode(e.to_string()))
    }
}

#[async_trait]
impl BookingBackend for HttpBackend {
    async fn list_bookings(&self, query: &BookingsQuery) -> Result<Vec<Value>, RemoteError> {
        let body = self
            .send(self.request(Method::GET, &["bookings"])?.query(query))
            .await?;
        match body {
            Value::Array(items) => Ok(items),
            Value::Object(mut map) => match map.remove("bookings").or_else(|| map.remove("data")) {
                Some(Value::Array(items)) => Ok(items),
                _ => Err(RemoteError::Decode("bookings response has no list".into())),
            },
            Value::Null => Ok(Vec::new()),
            other => Err(RemoteError::Decode(format!("unexpected bookings response: {other}"))),
        }
    }

    async fn availability(
        &self,
        request: &AvailabilityRequest,
    ) -> Result<AvailabilityPayload, RemoteError> {
        let body = self
            .send(self.request(Method::GET, &["availability"])?.query(request))
            .await?;
        AvailabilityPayload::from_value(body)
    }

    async fn booking_availability(
        &self,
        request: &DayWindowRequest,
    ) -> Result<AvailabilityPayload, RemoteError> {
        let body = self
            .send(self.request(Method::GET, &["booking-availability"])?.query(request))
            .await?;
        AvailabilityPayload::from_value(body)
    }

    async fn create_booking(
        &self,
        request: &CreateBookingRequest,
    ) -> Result<CreatedBooking, RemoteError> {
        let body = self
            .send(self.request(Method::POST, &["bookings"])?.json(request))
            .await?;
        Ok(CreatedBooking::from_value(&body))
    }

    async fn cancel_booking(&self, booking_id: &str) -> Result<(), RemoteError> {
        self.send(self.request(Method::POST, &["bookings", booking_id, "cancel"])?)
            .await?;
        Ok(())
    }

    async fn add_note(&self, lead_id: &str, text: &str) -> Result<(), RemoteError> {
        self.send(
            self.request(Method::POST, &["leads", lead_id, "notes"])?
                .json(&json!({ "note": text })),
        )
        .await?;
        Ok(())
    }
}

/// Prefer the body's `error`/`message` field, then its raw text, then the
/// status reason.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        let field = value
            .get("error")
            .and_then(|e| e.as_str().or_else(|| e.get("message").and_then(Value::as_str)))
            .or_else(|| value.get("message").and_then(Value::as_str));
        if let Some(message) = field {
            return message.to_string();
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        status.canonical_reason().unwrap_or("request failed").to_string()
    } else {
        trimmed.to_string()
    }
}
