//! The two concrete clients and the hooks they are made of.
//!
//! The public client appends the API key to every request and persists
//! rotated tokens from every response. The private client is the public one
//! extended with a bearer-token hook, so the key is always appended first.

use std::fmt;
use std::sync::Arc;

use tracing::info;

use crate::config::{ClientConfig, Settings};
use crate::error::{ConfigError, HookError};
use crate::http::{HttpRequest, HttpResponse, RequestOptions};
use crate::interceptors::{AfterRequestHook, BeforeRequestHook, Interceptors};
use crate::provider::NetworkProvider;
use crate::token_store::TokenStore;
use crate::transport::Transport;

pub const API_KEY_HEADER: &str = "APIKey";
pub const AUTHORIZATION_HEADER: &str = "Authorization";
pub const REFRESH_TOKEN_HEADER: &str = "Refresh-Token";

/// What the bearer hook does when no access token is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingTokenPolicy {
    /// Send `Authorization: Bearer ` with an empty token and let the server
    /// answer.
    #[default]
    PassThrough,
    /// Fail with `HookError::AuthRequired`; nothing is sent.
    Require,
}

pub fn append_api_key(api_key: impl Into<String>) -> BeforeRequestHook {
    let api_key = api_key.into();
    Arc::new(move |request: HttpRequest| -> Result<HttpRequest, HookError> {
        Ok(request.with_header(API_KEY_HEADER, api_key.as_str()))
    })
}

/// Reads the store when the request is built, not when the hook is made,
/// so a token rotated between calls is picked up.
pub fn authenticate_request(
    store: Arc<dyn TokenStore>,
    policy: MissingTokenPolicy,
) -> BeforeRequestHook {
    Arc::new(move |request: HttpRequest| -> Result<HttpRequest, HookError> {
        let token = match (store.access_token(), policy) {
            (Some(token), _) => token,
            (None, MissingTokenPolicy::PassThrough) => String::new(),
            (None, MissingTokenPolicy::Require) => return Err(HookError::AuthRequired),
        };
        Ok(request.with_header(AUTHORIZATION_HEADER, format!("Bearer {token}")))
    })
}

/// Store whichever rotation headers the response carries. Absent or empty
/// headers leave their slot alone. The response is passed on unchanged.
pub fn persist_tokens(store: Arc<dyn TokenStore>) -> AfterRequestHook {
    Arc::new(
        move |_: &HttpRequest, _: &RequestOptions, response: HttpResponse| -> Result<HttpResponse, HookError> {
            if let Some(token) = non_empty(response.headers.get(AUTHORIZATION_HEADER)) {
                store.set_access_token(token)?;
                info!(status = response.status, "stored rotated access token");
            }
            if let Some(token) = non_empty(response.headers.get(REFRESH_TOKEN_HEADER)) {
                store.set_refresh_token(token)?;
                info!(status = response.status, "stored rotated refresh token");
            }
            Ok(response)
        },
    )
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// The public and private clients built from one set of `Settings`, and
/// the token store their hooks read and write.
#[derive(Clone)]
pub struct Clients {
    pub public: NetworkProvider,
    pub private: NetworkProvider,
    store: Arc<dyn TokenStore>,
}

impl Clients {
    pub fn new(
        settings: &Settings,
        store: Arc<dyn TokenStore>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ConfigError> {
        Self::with_policy(settings, store, transport, MissingTokenPolicy::default())
    }

    pub fn with_policy(
        settings: &Settings,
        store: Arc<dyn TokenStore>,
        transport: Arc<dyn Transport>,
        policy: MissingTokenPolicy,
    ) -> Result<Self, ConfigError> {
        let base = Interceptors::new()
            .before_hook(append_api_key(settings.api_key()))
            .after_hook(persist_tokens(Arc::clone(&store)));
        let public = NetworkProvider::new(ClientConfig::new(settings.api_url(), base)?, transport);

        let private = public.extend(
            Interceptors::new().before_hook(authenticate_request(Arc::clone(&store), policy)),
        );

        Ok(Self {
            public,
            private,
            store,
        })
    }

    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }
}

impl fmt::Debug for Clients {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Clients")
            .field("public", &self.public)
            .field("private", &self.private)
            .finish_non_exhaustive()
    }
}
