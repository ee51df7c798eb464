//! Ordered before/after hooks applied around a single request.
//!
//! # Design
//! `Interceptors` is an append-only builder: hooks run in the order they
//! were added, and `merged` concatenates two lists with the receiver's hooks
//! first. Each hook gets the output of the previous one; there is no other
//! shared state between hooks.
//!
//! Hooks are `Arc`'d closures so one hook list can back many providers and
//! be invoked from several threads at once. A panicking hook is caught and
//! reported as `HookError::Panicked`, the same as a hook returning `Err`.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crate::error::{ApiError, HookError};
use crate::http::{HttpRequest, HttpResponse, RequestOptions};

pub type BeforeRequestHook =
    Arc<dyn Fn(HttpRequest) -> Result<HttpRequest, HookError> + Send + Sync>;

pub type AfterRequestHook = Arc<
    dyn Fn(&HttpRequest, &RequestOptions, HttpResponse) -> Result<HttpResponse, HookError>
        + Send
        + Sync,
>;

#[derive(Clone, Default)]
pub struct Interceptors {
    before_request: Vec<BeforeRequestHook>,
    after_request: Vec<AfterRequestHook>,
}

impl Interceptors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn before<F>(mut self, hook: F) -> Self
    where
        F: Fn(HttpRequest) -> Result<HttpRequest, HookError> + Send + Sync + 'static,
    {
        self.before_request.push(Arc::new(hook));
        self
    }

    pub fn after<F>(mut self, hook: F) -> Self
    where
        F: Fn(&HttpRequest, &RequestOptions, HttpResponse) -> Result<HttpResponse, HookError>
            + Send
            + Sync
            + 'static,
    {
        self.after_request.push(Arc::new(hook));
        self
    }

    pub fn before_hook(mut self, hook: BeforeRequestHook) -> Self {
        self.before_request.push(hook);
        self
    }

    pub fn after_hook(mut self, hook: AfterRequestHook) -> Self {
        self.after_request.push(hook);
        self
    }

    /// `self`'s hooks followed by `other`'s, for both phases.
    pub fn merged(&self, other: &Interceptors) -> Interceptors {
        Interceptors {
            before_request: self
                .before_request
                .iter()
                .chain(&other.before_request)
                .cloned()
                .collect(),
            after_request: self
                .after_request
                .iter()
                .chain(&other.after_request)
                .cloned()
                .collect(),
        }
    }

    pub fn before_request(&self) -> &[BeforeRequestHook] {
        &self.before_request
    }

    pub fn after_request(&self) -> &[AfterRequestHook] {
        &self.after_request
    }
}

impl fmt::Debug for Interceptors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interceptors")
            .field("before_request", &self.before_request.len())
            .field("after_request", &self.after_request.len())
            .finish()
    }
}

/// Fold `hooks` over `request`, left to right.
pub fn run_before(
    hooks: &[BeforeRequestHook],
    request: HttpRequest,
) -> Result<HttpRequest, ApiError> {
    let mut request = request;
    for (index, hook) in hooks.iter().enumerate() {
        request = guarded(|| hook(request)).map_err(|source| {
            tracing::warn!(index, error = %source, "before-request hook failed");
            ApiError::BeforeHook { index, source }
        })?;
    }
    Ok(request)
}

/// Fold `hooks` over `response`, left to right.
///
/// On failure the error carries the response as it stood before the
/// failing hook ran.
pub fn run_after(
    hooks: &[AfterRequestHook],
    request: &HttpRequest,
    options: &RequestOptions,
    response: HttpResponse,
) -> Result<HttpResponse, ApiError> {
    let mut response = response;
    for (index, hook) in hooks.iter().enumerate() {
        let snapshot = response.clone();
        response = match guarded(|| hook(request, options, response)) {
            Ok(next) => next,
            Err(source) => {
                tracing::warn!(
                    index,
                    status = snapshot.status,
                    error = %source,
                    "after-request hook failed"
                );
                return Err(ApiError::AfterHook {
                    index,
                    source,
                    response: Box::new(snapshot),
                });
            }
        };
    }
    Ok(response)
}

fn guarded<T>(f: impl FnOnce() -> Result<T, HookError>) -> Result<T, HookError> {
    catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        Err(HookError::Panicked(message))
    })
}
