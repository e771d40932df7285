//! Executes `HttpRequest` values over the network.
//!
//! # Design
//! `Transport` is the one seam between the pure request builder and real
//! I/O. `UreqTransport` is the blocking implementation; it disables ureq's
//! status-as-error behavior so 4xx/5xx responses come back as data.
//! Multipart forms are encoded here with ureq's `multipart` support.

use std::time::Duration;

use ureq::http::Response;
use ureq::typestate::WithBody;
use ureq::unversioned::multipart::{Form, Part};
use ureq::{Agent, Body, RequestBuilder};

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, MultipartForm, RequestBody};

/// Default cap on how much of a response body is read.
pub const DEFAULT_MAX_BODY_BYTES: u64 = 64 * 1024 * 1024;

/// Performs one HTTP round-trip.
pub trait Transport: Send + Sync {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// Blocking transport backed by a shared `ureq::Agent`.
#[derive(Clone)]
pub struct UreqTransport {
    agent: Agent,
    max_body_bytes: u64,
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(None, DEFAULT_MAX_BODY_BYTES)
    }
}

impl UreqTransport {
    pub fn new(timeout: Option<Duration>, max_body_bytes: u64) -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build()
            .new_agent();
        Self {
            agent,
            max_body_bytes,
        }
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let HttpRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let mut response = match method {
            HttpMethod::Get => with_headers(self.agent.get(&url), &headers)
                .call()
                .map_err(transport_error)?,
            HttpMethod::Delete => with_headers(self.agent.delete(&url), &headers)
                .call()
                .map_err(transport_error)?,
            HttpMethod::Post => send(with_headers(self.agent.post(&url), &headers), body)?,
            HttpMethod::Put => send(with_headers(self.agent.put(&url), &headers), body)?,
        };

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        // Bytes, not text: a status must survive a body in a non-UTF-8 charset.
        let bytes = response
            .body_mut()
            .with_config()
            .limit(self.max_body_bytes)
            .read_to_vec()
            .map_err(transport_error)?;
        let body = String::from_utf8_lossy(&bytes).into_owned();

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn send(builder: RequestBuilder<WithBody>, body: Option<RequestBody>) -> Result<Response<Body>, ApiError> {
    match body {
        Some(RequestBody::Bytes(bytes)) => builder.send(&bytes[..]),
        Some(RequestBody::Multipart(form)) => builder.send(encode_multipart(&form)?),
        None => builder.send_empty(),
    }
    .map_err(transport_error)
}

/// Borrow `form` into a ureq `Form`; ureq writes the boundary and part headers.
fn encode_multipart(form: &MultipartForm) -> Result<Form<'_>, ApiError> {
    let mut encoded = form
        .fields
        .iter()
        .fold(Form::new(), |encoded, (name, value)| encoded.text(name, value));
    for (name, upload) in &form.files {
        let part = Part::bytes(&upload.bytes)
            .file_name(&upload.file_name)
            .mime_str(&upload.content_type)
            .map_err(transport_error)?;
        encoded = encoded.part(name, part);
    }
    Ok(encoded)
}

fn transport_error(err: ureq::Error) -> ApiError {
    ApiError::Transport(err.to_string())
}

fn with_headers<B>(mut builder: RequestBuilder<B>, headers: &[(String, String)]) -> RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}
