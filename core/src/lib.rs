//! Network client core for the Eventio API.
//!
//! # Overview
//! Every call goes through a `NetworkProvider`: the request is built from a
//! base URL and per-call options, folded through ordered before-request
//! hooks, sent over a `Transport`, and the response is folded through
//! after-request hooks before it reaches the caller.
//!
//! # Design
//! - `Clients` builds the two providers the application uses. `public`
//!   appends the `APIKey` header and persists rotated tokens; `private` is
//!   `public` extended with a bearer-token hook.
//! - Hooks are plain closures; `Interceptors` is an append-only list of
//!   them, and extending a provider concatenates lists rather than
//!   subclassing anything.
//! - The token store is injected, never global, so tests use
//!   `MemoryTokenStore` and applications can use `FileTokenStore`.
//! - `Settings` is read once at startup; a missing URL or key is a
//!   `ConfigError` and no client gets built.

pub mod api;
pub mod clients;
pub mod config;
pub mod error;
pub mod http;
pub mod interceptors;
pub mod provider;
pub mod token_store;
pub mod transport;
pub mod types;

pub use api::EventioApi;
pub use clients::{Clients, MissingTokenPolicy};
pub use config::{ClientConfig, ConfigPatch, Settings};
pub use error::{ApiError, ConfigError, HookError, TokenStoreError, TransportError};
pub use http::{Headers, HttpMethod, HttpRequest, HttpResponse, RequestOptions};
pub use interceptors::{AfterRequestHook, BeforeRequestHook, Interceptors};
pub use provider::NetworkProvider;
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore, Tokens};
pub use transport::{Transport, UreqTransport};
pub use types::{Credentials, Event, EventFilter, RefreshRequest, User};
