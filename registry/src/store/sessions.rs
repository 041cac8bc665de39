//! Sessions and the registrations that reference them

use chrono::{NaiveDate, NaiveTime};
use sdk::errors::RegistryError;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::accounts::Account;
use super::{new_id, now_millis};

/// Conference session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub title: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub room: String,
    pub track: String,
    pub description: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSession {
    pub title: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub room: String,
    pub track: String,
    pub description: String,
}

/// Attendance record linking a user to a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    pub id: String,
    pub session_id: String,
    /// Title at registration time
    pub session_title: String,
    pub user_name: String,
    pub user_email: String,
    pub registered_at: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionStore {
    sessions: Vec<Session>,
    registrations: Vec<Registration>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_session(&mut self, new: NewSession) -> Session {
        if new.end_time < new.start_time {
            warn!(
                "Session '{}' ends ({}) before it starts ({})",
                new.title, new.end_time, new.start_time
            );
        }

        let session = Session {
            id: new_id(),
            title: new.title,
            date: new.date,
            start_time: new.start_time,
            end_time: new.end_time,
            room: new.room,
            track: new.track,
            description: new.description,
            created_at: now_millis(),
        };

        info!("Created session {} '{}'", session.id, session.title);
        self.sessions.push(session.clone());
        session
    }

    pub fn get(&self, session_id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == session_id)
    }

    /// Register a user for a session
    pub fn register(
        &mut self,
        session_id: &str,
        user: &Account,
    ) -> Result<Registration, RegistryError> {
        let session = self
            .get(session_id)
            .ok_or_else(|| RegistryError::SessionNotFound(session_id.to_string()))?;

        if self.is_registered(session_id, &user.email) {
            warn!("{} already registered for session {}", user.email, session_id);
            return Err(RegistryError::AlreadyRegistered {
                session_id: session_id.to_string(),
                user: user.email.clone(),
            });
        }

        let registration = Registration {
            id: new_id(),
            session_id: session.id.clone(),
            session_title: session.title.clone(),
            user_name: user.name.clone(),
            user_email: user.email.clone(),
            registered_at: now_millis(),
        };

        info!("{} registered for session {}", user.email, session_id);
        self.registrations.push(registration.clone());
        Ok(registration)
    }

    /// Remove a user's registration, returning it
    pub fn unregister(
        &mut self,
        session_id: &str,
        user_email: &str,
    ) -> Result<Registration, RegistryError> {
        let index = self
            .registrations
            .iter()
            .position(|r| r.session_id == session_id && r.user_email == user_email)
            .ok_or_else(|| RegistryError::NotRegistered {
                session_id: session_id.to_string(),
                user: user_email.to_string(),
            })?;

        info!("{} unregistered from session {}", user_email, session_id);
        Ok(self.registrations.remove(index))
    }

    /// Delete a session and cascade to its registrations
    ///
    /// Returns the removed session and the number of registrations removed.
    pub fn delete_session(&mut self, session_id: &str) -> Result<(Session, usize), RegistryError> {
        let index = self
            .sessions
            .iter()
            .position(|s| s.id == session_id)
            .ok_or_else(|| RegistryError::SessionNotFound(session_id.to_string()))?;

        let session = self.sessions.remove(index);
        let before = self.registrations.len();
        self.registrations.retain(|r| r.session_id != session_id);
        let cascaded = before - self.registrations.len();

        info!(
            "Deleted session {} and {} registration(s)",
            session_id, cascaded
        );
        Ok((session, cascaded))
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn registrations(&self) -> &[Registration] {
        &self.registrations
    }

    pub fn registrations_for<'a>(
        &'a self,
        session_id: &'a str,
    ) -> impl Iterator<Item = &'a Registration> + 'a {
        self.registrations
            .iter()
            .filter(move |r| r.session_id == session_id)
    }

    pub fn registrations_of<'a>(
        &'a self,
        user_email: &'a str,
    ) -> impl Iterator<Item = &'a Registration> + 'a {
        self.registrations
            .iter()
            .filter(move |r| r.user_email == user_email)
    }

    pub fn is_registered(&self, session_id: &str, user_email: &str) -> bool {
        self.registrations
            .iter()
            .any(|r| r.session_id == session_id && r.user_email == user_email)
    }
}
