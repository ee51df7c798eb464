//! Typed Eventio operations on top of the public and private clients.
//!
//! # Design
//! `EventioApi` picks the right client per endpoint and deserializes the
//! body. Token handling stays in the hooks: logging in is just a public
//! POST whose response headers the after-hook persists.

use chrono::Utc;
use uuid::Uuid;

use crate::clients::Clients;
use crate::error::{ApiError, TokenStoreError};
use crate::http::{HttpMethod, RequestOptions};
use crate::types::{Credentials, Event, EventFilter, RefreshRequest, User};

pub const LOGIN_PATH: &str = "/auth/native";
pub const EVENTS_PATH: &str = "/events";
pub const ME_PATH: &str = "/me";

#[derive(Debug, Clone)]
pub struct EventioApi {
    clients: Clients,
}

impl EventioApi {
    pub fn new(clients: Clients) -> Self {
        Self { clients }
    }

    pub fn clients(&self) -> &Clients {
        &self.clients
    }

    pub fn login(&self, credentials: &Credentials) -> Result<User, ApiError> {
        let opts = RequestOptions::json(HttpMethod::Post, credentials)?;
        self.clients.public.request_json(LOGIN_PATH, opts)
    }

    /// Trade the stored refresh token for a new token pair.
    pub fn refresh_session(&self) -> Result<User, ApiError> {
        let refresh_token = self
            .clients
            .store()
            .refresh_token()
            .ok_or(ApiError::MissingRefreshToken)?;
        let opts = RequestOptions::json(HttpMethod::Post, &RefreshRequest { refresh_token })?;
        self.clients.public.request_json(LOGIN_PATH, opts)
    }

    /// Forget both tokens. No request is made.
    pub fn sign_out(&self) -> Result<(), TokenStoreError> {
        self.clients.store().clear()
    }

    pub fn list_events(&self) -> Result<Vec<Event>, ApiError> {
        self.clients.public.request_json(EVENTS_PATH, RequestOptions::get())
    }

    /// `list_events`, keeping only events on `filter`'s side of now.
    pub fn list_events_filtered(&self, filter: EventFilter) -> Result<Vec<Event>, ApiError> {
        let now = Utc::now();
        let mut events = self.list_events()?;
        events.retain(|event| filter.matches(event, now));
        Ok(events)
    }

    pub fn get_event(&self, id: Uuid) -> Result<Event, ApiError> {
        self.clients
            .public
            .request_json(&format!("{EVENTS_PATH}/{id}"), RequestOptions::get())
    }

    pub fn me(&self) -> Result<User, ApiError> {
        self.clients.private.request_json(ME_PATH, RequestOptions::get())
    }
}
