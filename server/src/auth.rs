//! Request identity.
//!
//! Sessions are owned by an upstream gateway, which authenticates the
//! caller and forwards who they are in `x-user-*` headers. The [`Actor`]
//! extractor turns those headers into an explicit request context that
//! handlers pass into every service call.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::models::event::Event;
use crate::utils::error::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";
pub const USER_NAME_HEADER: &str = "x-user-name";
pub const USER_EMAIL_HEADER: &str = "x-user-email";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Subscriber,
    /// Accepted from the gateway but grants nothing extra: anyone may create
    /// events, and managing one depends on owning it.
    Organizer,
    /// Door and registration-desk staff.
    Staff,
    Admin,
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "subscriber" => Ok(Role::Subscriber),
            "organizer" => Ok(Role::Organizer),
            "staff" => Ok(Role::Staff),
            "admin" | "administrator" => Ok(Role::Admin),
            other => Err(AppError::AuthError(format!("Unknown role '{}'", other))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: Role,
    pub display_name: String,
    pub email: String,
}

impl Actor {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self {
            user_id,
            role,
            display_name: String::new(),
            email: String::new(),
        }
    }

    pub fn with_profile(mut self, display_name: impl Into<String>, email: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self.email = email.into();
        self
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Organizer of the event or an administrator.
    pub fn can_manage(&self, event: &Event) -> bool {
        event.organizer_id == self.user_id || self.is_admin()
    }

    /// Anyone allowed to review registrations and check guests in.
    pub fn is_staff_for(&self, event: &Event) -> bool {
        self.can_manage(event) || self.role == Role::Staff
    }

    pub fn ensure_can_manage(&self, event: &Event) -> Result<(), AppError> {
        if self.can_manage(event) {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Only the event organizer or an administrator can change this event".to_string(),
            ))
        }
    }

    pub fn ensure_staff_for(&self, event: &Event) -> Result<(), AppError> {
        if self.is_staff_for(event) {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Only event staff can perform this action".to_string(),
            ))
        }
    }
}

fn header_str<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw_id = header_str(parts, USER_ID_HEADER)
            .ok_or_else(|| AppError::AuthError("Missing user identity".to_string()))?;
        let user_id = Uuid::parse_str(raw_id)
            .map_err(|_| AppError::AuthError("Malformed user identity".to_string()))?;

        let role = match header_str(parts, USER_ROLE_HEADER) {
            Some(raw) => raw.parse::<Role>()?,
            None => Role::Subscriber,
        };

        Ok(Actor::new(user_id, role).with_profile(
            header_str(parts, USER_NAME_HEADER).unwrap_or_default(),
            header_str(parts, USER_EMAIL_HEADER).unwrap_or_default(),
        ))
    }
}
