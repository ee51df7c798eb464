//! Eventio DTOs.
//!
//! # Design
//! These mirror the backend's camelCase JSON but are defined independently
//! from the mock-server crate; the integration test catches schema drift.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Email/password pair posted to the login endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Body of a session refresh: the stored refresh token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    /// RFC 3339 timestamp, passed through as the server sent it.
    pub starts_at: String,
    pub capacity: u32,
    pub owner: User,
    #[serde(default)]
    pub attendees: Vec<User>,
}

/// Which events a listing keeps, relative to the current time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventFilter {
    #[default]
    All,
    Future,
    Past,
}

impl EventFilter {
    /// An event whose `starts_at` does not parse is kept only by `All`.
    pub fn matches(self, event: &Event, now: DateTime<Utc>) -> bool {
        if self == EventFilter::All {
            return true;
        }
        let Ok(starts_at) = DateTime::parse_from_rfc3339(&event.starts_at) else {
            return false;
        };
        let starts_at = starts_at.with_timezone(&Utc);
        match self {
            EventFilter::Future => starts_at > now,
            EventFilter::Past => starts_at <= now,
            EventFilter::All => true,
        }
    }
}
