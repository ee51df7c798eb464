//! `NetworkProvider`: build, intercept, dispatch, intercept, return.
//!
//! # Design
//! A provider owns a `ClientConfig` and a shared `Transport`. It carries no
//! mutable state of its own, so one provider can serve any number of
//! concurrent callers. `extend` never mutates the receiver; it returns a new
//! provider whose hooks run after the receiver's.
//!
//! No retries and no timeouts live here. If the transport call fails, the
//! before-hook output is dropped and after-hooks never run.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::{ClientConfig, ConfigPatch};
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, RequestOptions};
use crate::interceptors::{run_after, run_before};
use crate::transport::Transport;

#[derive(Clone)]
pub struct NetworkProvider {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
}

impl NetworkProvider {
    pub fn new(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Initial request for `path`, before any hook has run.
    pub fn build_request(&self, path: &str, options: &RequestOptions) -> HttpRequest {
        HttpRequest {
            method: options.method,
            url: self.config.url_for(path),
            headers: options.headers.clone(),
            body: options.body.clone(),
        }
    }

    /// The request exactly as it would be dispatched, without dispatching it.
    pub fn prepare(&self, path: &str, options: &RequestOptions) -> Result<HttpRequest, ApiError> {
        run_before(
            self.config.interceptors().before_request(),
            self.build_request(path, options),
        )
    }

    pub fn request(&self, path: &str, options: RequestOptions) -> Result<HttpResponse, ApiError> {
        let request = self.prepare(path, &options)?;

        debug!(method = request.method.as_str(), url = %request.url, "dispatching request");
        let response = self.transport.send(&request).map_err(|e| {
            warn!(method = request.method.as_str(), url = %request.url, error = %e, "transport failed");
            ApiError::Transport(e)
        })?;
        debug!(status = response.status, url = %request.url, "response received");

        // After-hooks run on error statuses too, so rotated tokens on a 401
        // are still captured.
        let response = run_after(
            self.config.interceptors().after_request(),
            &request,
            &options,
            response,
        )?;

        if !response.is_success() {
            warn!(status = response.status, url = %request.url, "request failed");
            return Err(ApiError::Http {
                status: response.status,
                body: parse_error_body(&response.body),
            });
        }
        Ok(response)
    }

    /// `request`, then deserialize the 2xx body as JSON.
    pub fn request_json<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let response = self.request(path, options)?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    pub fn extend(&self, patch: impl Into<ConfigPatch>) -> NetworkProvider {
        NetworkProvider {
            config: self.config.merge(&patch.into()),
            transport: Arc::clone(&self.transport),
        }
    }
}

impl fmt::Debug for NetworkProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkProvider")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn parse_error_body(body: &str) -> serde_json::Value {
    if body.is_empty() {
        return serde_json::Value::Null;
    }
    serde_json::from_str(body).unwrap_or_else(|_| serde_json::Value::String(body.to_string()))
}
