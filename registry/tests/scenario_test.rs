//! End-to-end scenarios against the in-memory registry

use chrono::{NaiveDate, NaiveTime};
use conference_registry::aggregate;
use conference_registry::store::accounts::Role;
use conference_registry::store::meetings::{MeetingStatus, NewMeeting};
use conference_registry::store::papers::{NewPaper, PaperStatus};
use conference_registry::store::reviews::{NewReview, Rating, Recommendation};
use conference_registry::store::sessions::NewSession;
use conference_registry::store::accounts::NewAccount;
use conference_registry::{Policy, Registry};
use sdk::errors::{ErrorKind, RegistryError};

fn alice_registry() -> Registry {
    let mut registry = Registry::with_test_accounts(Policy::default());
    registry
        .signup(NewAccount {
            name: "Alice".to_string(),
            email: "alice@x.com".to_string(),
            password: "secret1".to_string(),
            role: Role::Participant,
            affiliation: None,
        })
        .unwrap();
    registry
}

fn keynote() -> NewSession {
    NewSession {
        title: "Keynote".to_string(),
        date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        start_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
        room: "Hall A".to_string(),
        track: "AI & Machine Learning".to_string(),
        description: "Opening keynote".to_string(),
    }
}

fn title_paper() -> NewPaper {
    NewPaper {
        title: "Title".to_string(),
        abstract_text: "Abstract".to_string(),
        keywords: vec!["AI".to_string()],
    }
}

fn review(rating: i64) -> NewReview {
    NewReview {
        rating: Rating::new(rating).unwrap(),
        comments: "Comments".to_string(),
        recommendation: Recommendation::Accept,
    }
}

#[test]
fn test_keynote_registration_scenario() {
    let mut registry = alice_registry();
    let session = registry.create_session(keynote());

    registry.register(&session.id, "alice@x.com").unwrap();
    assert_eq!(aggregate::attendee_count(&registry, &session.id), 1);

    let again = registry.register(&session.id, "alice@x.com").unwrap_err();
    assert_eq!(again.kind(), ErrorKind::Conflict);
    assert_eq!(aggregate::attendee_count(&registry, &session.id), 1);

    let (_, cascaded) = registry.delete_session(&session.id).unwrap();
    assert_eq!(cascaded, 1);
    assert_eq!(aggregate::attendee_count(&registry, &session.id), 0);
    assert!(registry.sessions().registrations().is_empty());
}

#[test]
fn test_paper_status_scenario_permissive() {
    let mut registry = alice_registry();
    let paper = registry.submit_paper("alice@x.com", title_paper()).unwrap();
    assert_eq!(paper.status.as_str(), "UnderReview");

    registry
        .set_paper_status(&paper.id, PaperStatus::Accepted)
        .unwrap();
    assert_eq!(registry.paper(&paper.id).unwrap().status.as_str(), "Accepted");

    registry
        .set_paper_status(&paper.id, PaperStatus::Rejected)
        .unwrap();
    assert_eq!(registry.paper(&paper.id).unwrap().status.as_str(), "Rejected");
}

#[test]
fn test_paper_status_scenario_strict() {
    let mut registry = Registry::with_test_accounts(Policy::strict());
    let paper = registry
        .submit_paper("student1@test.com", title_paper())
        .unwrap();

    registry
        .set_paper_status(&paper.id, PaperStatus::Accepted)
        .unwrap();
    let err = registry
        .set_paper_status(&paper.id, PaperStatus::Rejected)
        .unwrap_err();

    assert!(matches!(err, RegistryError::InvalidTransition { entity: "paper", .. }));
    assert_eq!(registry.paper(&paper.id).unwrap().status, PaperStatus::Accepted);
}

#[test]
fn test_review_flow_average_and_workload() {
    let mut registry = Registry::with_test_accounts(Policy::default());
    let paper = registry
        .submit_paper("student2@test.com", title_paper())
        .unwrap();
    assert_eq!(aggregate::average_rating(&registry, &paper.id).to_string(), "N/A");

    for reviewer in ["employee1@test.com", "employee2@test.com", "employee3@test.com"] {
        registry.assign_reviewer(&paper.id, reviewer).unwrap();
    }
    assert_eq!(
        aggregate::reviewer_workload(&registry, "employee2@test.com").pending,
        1
    );

    registry
        .submit_review(&paper.id, "employee1@test.com", review(5))
        .unwrap();
    registry
        .submit_review(&paper.id, "employee2@test.com", review(3))
        .unwrap();
    registry
        .submit_review(&paper.id, "employee3@test.com", review(4))
        .unwrap();

    assert_eq!(aggregate::average_rating(&registry, &paper.id).to_string(), "4.0");
    assert_eq!(registry.paper(&paper.id).unwrap().review_count, 3);

    let load = aggregate::reviewer_workload(&registry, "employee2@test.com");
    assert_eq!(load.assigned, 1);
    assert_eq!(load.completed, 1);
    assert_eq!(load.pending, 0);
}

#[test]
fn test_unassigned_reviewer_may_still_review() {
    let mut registry = Registry::with_test_accounts(Policy::default());
    let paper = registry
        .submit_paper("student1@test.com", title_paper())
        .unwrap();

    registry
        .submit_review(&paper.id, "employee3@test.com", review(2))
        .unwrap();

    assert_eq!(registry.paper(&paper.id).unwrap().review_count, 1);
    assert!(registry.paper(&paper.id).unwrap().assigned_reviewers.is_empty());
}

#[test]
fn test_meeting_flow_and_counts() {
    let mut registry = Registry::with_test_accounts(Policy::default());
    let request = |topic: &str| NewMeeting {
        professor_email: "employee1@test.com".to_string(),
        date: NaiveDate::from_ymd_opt(2025, 6, 3).unwrap(),
        time: NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
        topic: topic.to_string(),
    };

    let first = registry
        .request_meeting("student1@test.com", request("Thesis"))
        .unwrap();
    let second = registry
        .request_meeting("student1@test.com", request("Internship"))
        .unwrap();
    registry
        .request_meeting("student2@test.com", request("Course"))
        .unwrap();

    registry
        .update_meeting_status(&first.id, MeetingStatus::Confirmed)
        .unwrap();
    registry
        .update_meeting_status(&second.id, MeetingStatus::Declined)
        .unwrap();

    let student = aggregate::meeting_counts(&registry, "student1@test.com");
    assert_eq!((student.pending, student.confirmed, student.declined), (0, 1, 1));

    let professor = aggregate::meeting_counts(&registry, "employee1@test.com");
    assert_eq!(professor.total(), 3);
    assert_eq!(professor.pending, 1);
}

#[test]
fn test_failed_operations_leave_state_unchanged() {
    let mut registry = Registry::with_test_accounts(Policy::default());
    let paper = registry
        .submit_paper("student1@test.com", title_paper())
        .unwrap();
    registry
        .assign_reviewer(&paper.id, "employee1@test.com")
        .unwrap();
    let before = serde_json::to_value(registry.snapshot()).unwrap();

    assert!(registry.assign_reviewer(&paper.id, "employee1@test.com").is_err());
    assert!(registry.assign_reviewer("missing", "employee2@test.com").is_err());
    assert!(registry.register("missing", "student1@test.com").is_err());
    assert!(registry.delete_session("missing").is_err());
    assert!(registry
        .submit_review("missing", "employee1@test.com", review(3))
        .is_err());

    assert_eq!(serde_json::to_value(registry.snapshot()).unwrap(), before);
}

#[test]
fn test_login_portals() {
    let registry = Registry::with_test_accounts(Policy::default());

    let admin = registry
        .login("admin@test.com", "admin123", Role::Admin)
        .unwrap();
    assert_eq!(admin.name, "Admin User");

    let err = registry
        .login("admin@test.com", "admin123", Role::Reviewer)
        .unwrap_err();
    assert!(matches!(err, RegistryError::InvalidCredentials));
}
