use crate::{
    catalog::{EndpointSpec, HttpVerb},
    config::PixelLabConfig,
    error::{PixelLabError, Result, TransportErrorKind},
    logger,
    payload::RequestPayload,
};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde_json::Value;

/// Sends exactly one authenticated request per call.
#[derive(Clone)]
pub struct Transport {
    client: Client,
    headers: HeaderMap,
    config: PixelLabConfig,
}

impl Transport {
    pub fn new(config: &PixelLabConfig) -> Result<Self> {
        let api_key = config.require_api_key()?;
        let headers = build_headers(api_key)?;

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| PixelLabError::ConfigError(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            headers,
            config: config.clone(),
        })
    }

    pub async fn send(&self, spec: &EndpointSpec, payload: &RequestPayload) -> Result<Value> {
        let url = self.config.endpoint_url(spec.path);
        let _timer = logger::timer(&format!("{} {}", spec.name, spec.path));

        let request = match spec.verb {
            HttpVerb::Get => self.client.get(&url),
            HttpVerb::Post => self.client.post(&url).json(payload.body()),
        };

        match payload.method() {
            Some(option) => log::info!(
                "Calling {} ({} fields, method {} via {})",
                url,
                payload.body().len(),
                option.method,
                option.field
            ),
            None => log::info!("Calling {} ({} fields)", url, payload.body().len()),
        }

        let response = request
            .headers(self.headers.clone())
            .send()
            .await
            .map_err(|e| self.connection_error(e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.connection_error(e))?;

        if !status.is_success() {
            log::warn!("{} returned HTTP {}", spec.path, status.as_u16());
            return Err(classify_status(status.as_u16(), &body));
        }

        serde_json::from_str(&body)
            .map_err(|e| PixelLabError::DecodeError(format!("response is not valid JSON: {}", e)))
    }

    fn connection_error(&self, err: reqwest::Error) -> PixelLabError {
        let message = if err.is_timeout() {
            format!("request timed out after {}s", self.config.timeout_secs)
        } else {
            err.to_string()
        };
        log::error!("Request failed: {}", message);
        PixelLabError::TransportError {
            status: None,
            kind: TransportErrorKind::Connection,
            message,
        }
    }
}

fn build_headers(api_key: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    let bearer = HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(|_| {
        PixelLabError::ConfigError("PIXELLAB_API_KEY contains invalid characters".into())
    })?;
    headers.insert(AUTHORIZATION, bearer);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    Ok(headers)
}

/// Turn a non-2xx status and its body into a `TransportError`.
pub fn classify_status(status: u16, body: &str) -> PixelLabError {
    let (kind, meaning) = TransportErrorKind::from_status(status);
    let detail = error_detail(body);

    let message = match (kind, detail) {
        (TransportErrorKind::Server, Some(detail)) => format!("{}: {}", meaning, detail),
        (TransportErrorKind::Server, None) if !body.trim().is_empty() => {
            format!("{}: {}", meaning, body.trim())
        }
        (_, Some(detail)) => format!("{} ({})", meaning, detail),
        (_, None) => meaning.to_string(),
    };

    PixelLabError::TransportError {
        status: Some(status),
        kind,
        message,
    }
}

fn error_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}
