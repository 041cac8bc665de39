//! Meeting requests between participants and reviewers

use chrono::{NaiveDate, NaiveTime};
use sdk::errors::RegistryError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

use super::accounts::Account;
use super::{new_id, now_millis};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeetingStatus {
    Pending,
    Confirmed,
    Declined,
}

impl MeetingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeetingStatus::Pending => "Pending",
            MeetingStatus::Confirmed => "Confirmed",
            MeetingStatus::Declined => "Declined",
        }
    }
}

impl fmt::Display for MeetingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MeetingStatus {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(MeetingStatus::Pending),
            "confirmed" | "accept" | "accepted" => Ok(MeetingStatus::Confirmed),
            "declined" | "decline" => Ok(MeetingStatus::Declined),
            _ => Err(RegistryError::invalid_field(
                "status",
                format!("unknown meeting status '{}'", s),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meeting {
    pub id: String,
    pub student_name: String,
    pub student_email: String,
    pub professor_name: String,
    pub professor_email: String,
    pub department: Option<String>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub topic: String,
    pub status: MeetingStatus,
    pub scheduled_at: i64,
}

impl Meeting {
    /// True when the user is either side of the meeting
    pub fn involves(&self, email: &str) -> bool {
        self.student_email == email || self.professor_email == email
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewMeeting {
    pub professor_email: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub topic: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeetingStore {
    meetings: Vec<Meeting>,
}

impl MeetingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pending meeting
    ///
    /// `professor` must already be resolved to a reviewer account; its name
    /// and department are copied onto the meeting.
    pub fn request(&mut self, student: &Account, professor: &Account, new: NewMeeting) -> Meeting {
        let meeting = Meeting {
            id: new_id(),
            student_name: student.name.clone(),
            student_email: student.email.clone(),
            professor_name: professor.name.clone(),
            professor_email: professor.email.clone(),
            department: professor.affiliation.clone(),
            date: new.date,
            time: new.time,
            topic: new.topic,
            status: MeetingStatus::Pending,
            scheduled_at: now_millis(),
        };

        info!(
            "Meeting {} requested by {} with {}",
            meeting.id, meeting.student_email, meeting.professor_email
        );
        self.meetings.push(meeting.clone());
        meeting
    }

    pub fn get(&self, meeting_id: &str) -> Option<&Meeting> {
        self.meetings.iter().find(|m| m.id == meeting_id)
    }

    /// Overwrite a meeting's status, returning the previous one
    ///
    /// With `strict` only Pending meetings may change.
    pub fn update_status(
        &mut self,
        meeting_id: &str,
        status: MeetingStatus,
        strict: bool,
    ) -> Result<MeetingStatus, RegistryError> {
        let meeting = self
            .meetings
            .iter_mut()
            .find(|m| m.id == meeting_id)
            .ok_or_else(|| RegistryError::MeetingNotFound(meeting_id.to_string()))?;
        let previous = meeting.status;

        if strict && previous != MeetingStatus::Pending {
            warn!(
                "Refused status change of meeting {} from {} to {}",
                meeting_id, previous, status
            );
            return Err(RegistryError::InvalidTransition {
                entity: "meeting",
                from: previous.to_string(),
                to: status.to_string(),
            });
        }

        meeting.status = status;
        info!("Meeting {} status {} -> {}", meeting_id, previous, status);
        Ok(previous)
    }

    pub fn list(&self) -> &[Meeting] {
        &self.meetings
    }

    pub fn for_student<'a>(&'a self, email: &'a str) -> impl Iterator<Item = &'a Meeting> + 'a {
        self.meetings.iter().filter(move |m| m.student_email == email)
    }

    pub fn for_professor<'a>(&'a self, email: &'a str) -> impl Iterator<Item = &'a Meeting> + 'a {
        self.meetings
            .iter()
            .filter(move |m| m.professor_email == email)
    }

    pub fn for_participant<'a>(
        &'a self,
        email: &'a str,
    ) -> impl Iterator<Item = &'a Meeting> + 'a {
        self.meetings.iter().filter(move |m| m.involves(email))
    }

    pub fn len(&self) -> usize {
        self.meetings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meetings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::accounts::Role;

    fn account(email: &str, name: &str, role: Role, affiliation: &str) -> Account {
        Account {
            email: email.to_string(),
            password: "pass123".to_string(),
            name: name.to_string(),
            role,
            affiliation: Some(affiliation.to_string()),
        }
    }

    fn request(store: &mut MeetingStore) -> Meeting {
        let student = account("s@x.com", "Alice", Role::Participant, "MIT");
        let professor = account("p@x.com", "Dr. P", Role::Reviewer, "Data Science");
        store.request(
            &student,
            &professor,
            NewMeeting {
                professor_email: "p@x.com".to_string(),
                date: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
                time: NaiveTime::from_hms_opt(14, 30, 0).unwrap(),
                topic: "Thesis".to_string(),
            },
        )
    }

    #[test]
    fn test_request_copies_professor() {
        let mut store = MeetingStore::new();
        let meeting = request(&mut store);

        assert_eq!(meeting.status, MeetingStatus::Pending);
        assert_eq!(meeting.professor_name, "Dr. P");
        assert_eq!(meeting.department.as_deref(), Some("Data Science"));
        assert_eq!(store.for_student("s@x.com").count(), 1);
        assert_eq!(store.for_professor("p@x.com").count(), 1);
        assert_eq!(store.for_participant("p@x.com").count(), 1);
        assert_eq!(store.for_participant("other@x.com").count(), 0);
    }

    #[test]
    fn test_update_status_permissive() {
        let mut store = MeetingStore::new();
        let meeting = request(&mut store);

        store
            .update_status(&meeting.id, MeetingStatus::Confirmed, false)
            .unwrap();
        let previous = store
            .update_status(&meeting.id, MeetingStatus::Declined, false)
            .unwrap();

        assert_eq!(previous, MeetingStatus::Confirmed);
        assert_eq!(store.get(&meeting.id).unwrap().status, MeetingStatus::Declined);
    }

    #[test]
    fn test_update_status_strict() {
        let mut store = MeetingStore::new();
        let meeting = request(&mut store);

        store
            .update_status(&meeting.id, MeetingStatus::Declined, true)
            .unwrap();
        let result = store.update_status(&meeting.id, MeetingStatus::Confirmed, true);

        assert!(matches!(result, Err(RegistryError::InvalidTransition { .. })));
        assert_eq!(store.get(&meeting.id).unwrap().status, MeetingStatus::Declined);
    }

    #[test]
    fn test_update_unknown_meeting() {
        let mut store = MeetingStore::new();
        let result = store.update_status("nope", MeetingStatus::Confirmed, false);
        assert!(matches!(result, Err(RegistryError::MeetingNotFound(_))));
    }
}
