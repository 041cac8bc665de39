//! In-memory conference registry
//!
//! Each collection lives in its own store with a narrow method surface. The
//! [`Registry`] owns every store and coordinates the operations that span
//! more than one of them: resolving emails to accounts, bumping a paper's
//! review counter when a review lands, and publishing a notice after each
//! mutation.
//!
//! All operations are synchronous and take `&self` or `&mut self`. A failed
//! operation leaves every store unchanged.

pub mod accounts;
pub mod meetings;
pub mod papers;
pub mod reviews;
pub mod sessions;
pub mod snapshot;

use sdk::errors::{RegistryError, RegistryErrorExt};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::notifications::NoticeBus;
use accounts::{Account, AccountDirectory, NewAccount, Role};
use meetings::{Meeting, MeetingStatus, MeetingStore, NewMeeting};
use papers::{NewPaper, Paper, PaperStatus, PaperStore};
use reviews::{NewReview, Review, ReviewStore};
use sessions::{NewSession, Registration, Session, SessionStore};
use snapshot::RegistrySnapshot;

/// Fresh opaque entity id
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Milliseconds since the Unix epoch
pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Which state-machine guards are enforced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Policy {
    /// Papers leave UnderReview once, meetings leave Pending once
    pub strict_transitions: bool,
    /// A reviewer may review a given paper only once
    pub one_review_per_reviewer: bool,
}

impl Policy {
    pub fn strict() -> Self {
        Self {
            strict_transitions: true,
            one_review_per_reviewer: true,
        }
    }
}

pub struct Registry {
    accounts: AccountDirectory,
    papers: PaperStore,
    reviews: ReviewStore,
    sessions: SessionStore,
    meetings: MeetingStore,
    policy: Policy,
    notices: Option<Arc<NoticeBus>>,
}

impl Registry {
    /// Empty registry with no accounts
    pub fn new(policy: Policy) -> Self {
        Self::with_accounts(AccountDirectory::new(), policy)
    }

    /// Registry seeded with the built-in test accounts
    pub fn with_test_accounts(policy: Policy) -> Self {
        Self::with_accounts(AccountDirectory::with_test_accounts(), policy)
    }

    pub fn with_accounts(accounts: AccountDirectory, policy: Policy) -> Self {
        Self {
            accounts,
            papers: PaperStore::new(),
            reviews: ReviewStore::new(),
            sessions: SessionStore::new(),
            meetings: MeetingStore::new(),
            policy,
            notices: None,
        }
    }

    /// Rebuild a registry from a saved snapshot
    pub fn from_snapshot(snapshot: RegistrySnapshot, policy: Policy) -> Self {
        Self {
            accounts: snapshot.accounts,
            papers: snapshot.papers,
            reviews: snapshot.reviews,
            sessions: snapshot.sessions,
            meetings: snapshot.meetings,
            policy,
            notices: None,
        }
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot::new(
            self.accounts.clone(),
            self.papers.clone(),
            self.reviews.clone(),
            self.sessions.clone(),
            self.meetings.clone(),
        )
    }

    /// Publish notices for every following operation on `bus`
    pub fn attach_notices(&mut self, bus: Arc<NoticeBus>) {
        self.notices = Some(bus);
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    pub fn accounts(&self) -> &AccountDirectory {
        &self.accounts
    }

    pub fn papers(&self) -> &PaperStore {
        &self.papers
    }

    pub fn reviews(&self) -> &ReviewStore {
        &self.reviews
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn meetings(&self) -> &MeetingStore {
        &self.meetings
    }

    /// Publish the outcome of an operation and pass it through
    ///
    /// Errors always produce an error notice carrying the user hint.
    /// Successes produce a notice only when `message` yields one.
    fn settle<T>(
        &self,
        result: Result<T, RegistryError>,
        message: impl FnOnce(&T) -> Option<String>,
    ) -> Result<T, RegistryError> {
        if let Some(bus) = &self.notices {
            match &result {
                Ok(value) => {
                    if let Some(text) = message(value) {
                        bus.success(text);
                    }
                }
                Err(e) => bus.error(e.user_hint()),
            }
        }
        result
    }

    // ---- accounts ----

    pub fn login(&self, email: &str, password: &str, role: Role) -> Result<Account, RegistryError> {
        let result = self.accounts.authenticate(email, password, role).cloned();
        self.settle(result, |_| None)
    }

    pub fn signup(&mut self, new: NewAccount) -> Result<Account, RegistryError> {
        let result = self.accounts.signup(new);
        self.settle(result, |_| None)
    }

    // ---- papers ----

    pub fn submit_paper(&mut self, author_email: &str, new: NewPaper) -> Result<Paper, RegistryError> {
        let result = match self.accounts.find_by_email(author_email) {
            Some(author) => Ok(self.papers.submit(author, new)),
            None => Err(RegistryError::AccountNotFound(author_email.to_string())),
        };
        self.settle(result, |_| Some("Paper submitted successfully!".to_string()))
    }

    pub fn set_paper_status(
        &mut self,
        paper_id: &str,
        status: PaperStatus,
    ) -> Result<PaperStatus, RegistryError> {
        let result = self
            .papers
            .set_status(paper_id, status, self.policy.strict_transitions);
        self.settle(result, |_| Some(paper_status_notice(status)))
    }

    pub fn assign_reviewer(
        &mut self,
        paper_id: &str,
        reviewer_email: &str,
    ) -> Result<Account, RegistryError> {
        let result = match self.accounts.find_reviewer(reviewer_email) {
            Some(reviewer) => self
                .papers
                .assign_reviewer(paper_id, &reviewer.email)
                .map(|()| reviewer.clone()),
            None => {
                warn!("No reviewer account for {}", reviewer_email);
                Err(RegistryError::ReviewerNotFound(reviewer_email.to_string()))
            }
        };
        self.settle(result, |reviewer| {
            Some(format!("{} assigned as reviewer!", reviewer.name))
        })
    }

    // ---- reviews ----

    /// Record a review and bump the paper's review counter
    ///
    /// Assignment is not checked: any reviewer may review any paper.
    pub fn submit_review(
        &mut self,
        paper_id: &str,
        reviewer_email: &str,
        new: NewReview,
    ) -> Result<Review, RegistryError> {
        let result = self.create_review(paper_id, reviewer_email, new);
        self.settle(result, |_| Some("Review submitted successfully!".to_string()))
    }

    fn create_review(
        &mut self,
        paper_id: &str,
        reviewer_email: &str,
        new: NewReview,
    ) -> Result<Review, RegistryError> {
        if self.papers.get(paper_id).is_none() {
            return Err(RegistryError::PaperNotFound(paper_id.to_string()));
        }
        let reviewer = self
            .accounts
            .find_by_email(reviewer_email)
            .ok_or_else(|| RegistryError::AccountNotFound(reviewer_email.to_string()))?;

        if self.policy.one_review_per_reviewer && self.reviews.has_reviewed(paper_id, reviewer_email) {
            warn!("{} already reviewed paper {}", reviewer_email, paper_id);
            return Err(RegistryError::DuplicateReview {
                paper_id: paper_id.to_string(),
                reviewer: reviewer_email.to_string(),
            });
        }

        let review = self.reviews.create(paper_id, reviewer, new);
        self.papers.record_review(paper_id)?;
        Ok(review)
    }

    // ---- sessions ----

    pub fn create_session(&mut self, new: NewSession) -> Session {
        let session = self.sessions.create_session(new);
        if let Some(bus) = &self.notices {
            bus.success("Session created successfully!");
        }
        session
    }

    pub fn register(&mut self, session_id: &str, user_email: &str) -> Result<Registration, RegistryError> {
        let result = match self.accounts.find_by_email(user_email) {
            Some(user) => self.sessions.register(session_id, user),
            None => Err(RegistryError::AccountNotFound(user_email.to_string())),
        };
        self.settle(result, |_| {
            Some("Successfully registered for session!".to_string())
        })
    }

    pub fn unregister(
        &mut self,
        session_id: &str,
        user_email: &str,
    ) -> Result<Registration, RegistryError> {
        let result = self.sessions.unregister(session_id, user_email);
        self.settle(result, |_| {
            Some("Successfully unregistered from session!".to_string())
        })
    }

    /// Delete a session and every registration referencing it
    pub fn delete_session(&mut self, session_id: &str) -> Result<(Session, usize), RegistryError> {
        let result = self.sessions.delete_session(session_id);
        self.settle(result, |_| Some("Session deleted successfully!".to_string()))
    }

    // ---- meetings ----

    pub fn request_meeting(
        &mut self,
        student_email: &str,
        new: NewMeeting,
    ) -> Result<Meeting, RegistryError> {
        let result = self.create_meeting(student_email, new);
        self.settle(result, |_| {
            Some("Meeting request sent successfully!".to_string())
        })
    }

    fn create_meeting(&mut self, student_email: &str, new: NewMeeting) -> Result<Meeting, RegistryError> {
        let student = self
            .accounts
            .find_by_email(student_email)
            .ok_or_else(|| RegistryError::AccountNotFound(student_email.to_string()))?;
        let professor = self
            .accounts
            .find_reviewer(&new.professor_email)
            .ok_or_else(|| RegistryError::ProfessorNotFound(new.professor_email.clone()))?;
        Ok(self.meetings.request(student, professor, new))
    }

    pub fn update_meeting_status(
        &mut self,
        meeting_id: &str,
        status: MeetingStatus,
    ) -> Result<MeetingStatus, RegistryError> {
        let result = self
            .meetings
            .update_status(meeting_id, status, self.policy.strict_transitions);
        self.settle(result, |_| Some(meeting_status_notice(status)))
    }

    // ---- queries ----

    pub fn paper(&self, paper_id: &str) -> Result<&Paper, RegistryError> {
        debug!("Looking up paper {}", paper_id);
        self.papers
            .get(paper_id)
            .ok_or_else(|| RegistryError::PaperNotFound(paper_id.to_string()))
    }

    pub fn session(&self, session_id: &str) -> Result<&Session, RegistryError> {
        self.sessions
            .get(session_id)
            .ok_or_else(|| RegistryError::SessionNotFound(session_id.to_string()))
    }

    pub fn meeting(&self, meeting_id: &str) -> Result<&Meeting, RegistryError> {
        self.meetings
            .get(meeting_id)
            .ok_or_else(|| RegistryError::MeetingNotFound(meeting_id.to_string()))
    }
}

fn paper_status_notice(status: PaperStatus) -> String {
    match status {
        PaperStatus::UnderReview => "Paper returned to review successfully!".to_string(),
        PaperStatus::Accepted | PaperStatus::Rejected => {
            format!("Paper {} successfully!", status.as_str().to_lowercase())
        }
    }
}

fn meeting_status_notice(status: MeetingStatus) -> String {
    match status {
        MeetingStatus::Pending => "Meeting reset to pending successfully!".to_string(),
        MeetingStatus::Confirmed | MeetingStatus::Declined => {
            format!("Meeting {} successfully!", status.as_str().to_lowercase())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::NoticeLevel;
    use chrono::{NaiveDate, NaiveTime};
    use reviews::{Rating, Recommendation};

    fn paper() -> NewPaper {
        NewPaper {
            title: "Title".to_string(),
            abstract_text: "Abstract".to_string(),
            keywords: vec!["AI".to_string()],
        }
    }

    fn review(rating: i64) -> NewReview {
        NewReview {
            rating: Rating::new(rating).unwrap(),
            comments: String::new(),
            recommendation: Recommendation::Accept,
        }
    }

    fn meeting(professor: &str) -> NewMeeting {
        NewMeeting {
            professor_email: professor.to_string(),
            date: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            topic: "Thesis".to_string(),
        }
    }

    #[test]
    fn test_submit_review_bumps_count() {
        let mut registry = Registry::with_test_accounts(Policy::default());
        let p = registry.submit_paper("student1@test.com", paper()).unwrap();

        registry
            .submit_review(&p.id, "employee1@test.com", review(4))
            .unwrap();
        registry
            .submit_review(&p.id, "employee1@test.com", review(2))
            .unwrap();

        assert_eq!(registry.paper(&p.id).unwrap().review_count, 2);
        assert_eq!(registry.reviews().for_paper(&p.id).count(), 2);
    }

    #[test]
    fn test_submit_review_missing_paper_changes_nothing() {
        let mut registry = Registry::with_test_accounts(Policy::default());
        let result = registry.submit_review("missing", "employee1@test.com", review(3));

        assert!(matches!(result, Err(RegistryError::PaperNotFound(_))));
        assert!(registry.reviews().is_empty());
    }

    #[test]
    fn test_strict_policy_rejects_second_review() {
        let mut registry = Registry::with_test_accounts(Policy::strict());
        let p = registry.submit_paper("student1@test.com", paper()).unwrap();

        registry
            .submit_review(&p.id, "employee1@test.com", review(4))
            .unwrap();
        let second = registry.submit_review(&p.id, "employee1@test.com", review(5));

        assert!(matches!(second, Err(RegistryError::DuplicateReview { .. })));
        assert_eq!(registry.paper(&p.id).unwrap().review_count, 1);
    }

    #[test]
    fn test_assign_reviewer_requires_reviewer_account() {
        let mut registry = Registry::with_test_accounts(Policy::default());
        let p = registry.submit_paper("student1@test.com", paper()).unwrap();

        let result = registry.assign_reviewer(&p.id, "student2@test.com");
        assert!(matches!(result, Err(RegistryError::ReviewerNotFound(_))));

        let reviewer = registry.assign_reviewer(&p.id, "employee2@test.com").unwrap();
        assert_eq!(reviewer.name, "Dr. Emma Brown");
    }

    #[test]
    fn test_request_meeting_professor_must_be_reviewer() {
        let mut registry = Registry::with_test_accounts(Policy::default());

        let result = registry.request_meeting("student1@test.com", meeting("student2@test.com"));
        assert!(matches!(result, Err(RegistryError::ProfessorNotFound(_))));
        assert!(registry.meetings().is_empty());

        let m = registry
            .request_meeting("student1@test.com", meeting("employee3@test.com"))
            .unwrap();
        assert_eq!(m.professor_name, "Dr. Frank Miller");
        assert_eq!(m.department.as_deref(), Some("Data Science"));
        assert_eq!(m.student_name, "Alice Johnson");
    }

    #[test]
    fn test_notices_use_portal_wording() {
        let mut registry = Registry::with_test_accounts(Policy::default());
        let bus = Arc::new(NoticeBus::new());
        let mut rx = bus.subscribe(NoticeLevel::All);
        registry.attach_notices(bus);

        let p = registry.submit_paper("student1@test.com", paper()).unwrap();
        registry.set_paper_status(&p.id, PaperStatus::Accepted).unwrap();
        registry.assign_reviewer(&p.id, "employee1@test.com").unwrap();
        let _ = registry.assign_reviewer(&p.id, "employee1@test.com");
        let _ = registry.login("admin@test.com", "wrong", Role::Admin);

        let messages: Vec<String> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|n| n.message)
            .collect();
        assert_eq!(
            messages,
            vec![
                "Paper submitted successfully!",
                "Paper accepted successfully!",
                "Dr. David Wilson assigned as reviewer!",
                "Reviewer already assigned to this paper!",
                "Invalid credentials. Try one of the test accounts.",
            ]
        );
    }

    #[test]
    fn test_meeting_notice_wording() {
        let mut registry = Registry::with_test_accounts(Policy::default());
        let bus = Arc::new(NoticeBus::new());
        let mut rx = bus.subscribe(NoticeLevel::Success);
        registry.attach_notices(bus);

        let m = registry
            .request_meeting("student1@test.com", meeting("employee1@test.com"))
            .unwrap();
        registry
            .update_meeting_status(&m.id, MeetingStatus::Declined)
            .unwrap();

        assert_eq!(rx.try_recv().unwrap().message, "Meeting request sent successfully!");
        assert_eq!(rx.try_recv().unwrap().message, "Meeting declined successfully!");
    }

    #[test]
    fn test_status_reset_notice_wording() {
        let mut registry = Registry::with_test_accounts(Policy::default());
        let bus = Arc::new(NoticeBus::new());
        let mut rx = bus.subscribe(NoticeLevel::Success);
        registry.attach_notices(bus);

        let p = registry.submit_paper("student1@test.com", paper()).unwrap();
        registry.set_paper_status(&p.id, PaperStatus::Rejected).unwrap();
        registry
            .set_paper_status(&p.id, PaperStatus::UnderReview)
            .unwrap();
        let m = registry
            .request_meeting("student1@test.com", meeting("employee1@test.com"))
            .unwrap();
        registry
            .update_meeting_status(&m.id, MeetingStatus::Confirmed)
            .unwrap();
        registry
            .update_meeting_status(&m.id, MeetingStatus::Pending)
            .unwrap();

        let messages: Vec<String> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|n| n.message)
            .collect();
        assert_eq!(
            messages,
            vec![
                "Paper submitted successfully!",
                "Paper rejected successfully!",
                "Paper returned to review successfully!",
                "Meeting request sent successfully!",
                "Meeting confirmed successfully!",
                "Meeting reset to pending successfully!",
            ]
        );
    }
}
