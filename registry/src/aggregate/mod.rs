//! Derived dashboard views
//!
//! Everything here is recomputed from the stores on each call; nothing is
//! cached, so the numbers always match the current registry state.

use serde::{Serialize, Serializer};
use std::fmt;

use crate::store::meetings::MeetingStatus;
use crate::store::papers::PaperStatus;
use crate::store::Registry;

/// Mean review rating of a paper, shown with one decimal or as "N/A"
///
/// Kept as the exact sum and count so the display can round half up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AverageRating {
    NoReviews,
    Mean { sum: u32, count: u32 },
}

impl AverageRating {
    pub fn value(&self) -> Option<f64> {
        match self {
            AverageRating::NoReviews => None,
            AverageRating::Mean { sum, count } => Some(*sum as f64 / *count as f64),
        }
    }

    /// Mean in tenths, ties rounded up
    pub fn tenths(&self) -> Option<u32> {
        match self {
            AverageRating::NoReviews => None,
            AverageRating::Mean { sum, count } => Some((20 * sum + count) / (2 * count)),
        }
    }
}

impl fmt::Display for AverageRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tenths() {
            None => f.write_str("N/A"),
            Some(tenths) => write!(f, "{}.{}", tenths / 10, tenths % 10),
        }
    }
}

impl Serialize for AverageRating {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Per-user meeting tallies, over meetings where the user is either side
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MeetingCounts {
    pub pending: usize,
    pub confirmed: usize,
    pub declined: usize,
}

impl MeetingCounts {
    pub fn total(&self) -> usize {
        self.pending + self.confirmed + self.declined
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReviewerWorkload {
    pub assigned: usize,
    pub completed: usize,
    /// Assigned papers this reviewer has not reviewed yet
    pub pending: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PaperStatusCounts {
    pub under_review: usize,
    pub accepted: usize,
    pub rejected: usize,
}

/// Admin dashboard totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConferenceStats {
    pub papers: usize,
    pub sessions: usize,
    pub reviews: usize,
    pub registrations: usize,
    pub by_status: PaperStatusCounts,
}

/// Participant dashboard numbers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ParticipantSummary {
    pub papers_submitted: usize,
    pub papers_accepted: usize,
    pub sessions_registered: usize,
    pub meetings: MeetingCounts,
}

/// Mean of a set of ratings
pub fn mean_rating<I: IntoIterator<Item = u8>>(ratings: I) -> AverageRating {
    let (sum, count) = ratings
        .into_iter()
        .fold((0u32, 0u32), |(sum, count), r| (sum + r as u32, count + 1));

    if count == 0 {
        AverageRating::NoReviews
    } else {
        AverageRating::Mean { sum, count }
    }
}

pub fn average_rating(registry: &Registry, paper_id: &str) -> AverageRating {
    mean_rating(registry.reviews().for_paper(paper_id).map(|r| r.rating.value()))
}

pub fn attendee_count(registry: &Registry, session_id: &str) -> usize {
    registry.sessions().registrations_for(session_id).count()
}

pub fn meeting_counts(registry: &Registry, email: &str) -> MeetingCounts {
    registry
        .meetings()
        .for_participant(email)
        .fold(MeetingCounts::default(), |mut counts, m| {
            match m.status {
                MeetingStatus::Pending => counts.pending += 1,
                MeetingStatus::Confirmed => counts.confirmed += 1,
                MeetingStatus::Declined => counts.declined += 1,
            }
            counts
        })
}

pub fn reviewer_workload(registry: &Registry, email: &str) -> ReviewerWorkload {
    let assigned: Vec<&str> = registry
        .papers()
        .assigned_to(email)
        .map(|p| p.id.as_str())
        .collect();
    let pending = assigned
        .iter()
        .filter(|id| !registry.reviews().has_reviewed(id, email))
        .count();

    ReviewerWorkload {
        assigned: assigned.len(),
        completed: registry.reviews().by_reviewer(email).count(),
        pending,
    }
}

pub fn paper_status_counts(registry: &Registry) -> PaperStatusCounts {
    registry
        .papers()
        .list()
        .iter()
        .fold(PaperStatusCounts::default(), |mut counts, p| {
            match p.status {
                PaperStatus::UnderReview => counts.under_review += 1,
                PaperStatus::Accepted => counts.accepted += 1,
                PaperStatus::Rejected => counts.rejected += 1,
            }
            counts
        })
}

pub fn conference_stats(registry: &Registry) -> ConferenceStats {
    ConferenceStats {
        papers: registry.papers().len(),
        sessions: registry.sessions().sessions().len(),
        reviews: registry.reviews().len(),
        registrations: registry.sessions().registrations().len(),
        by_status: paper_status_counts(registry),
    }
}

pub fn participant_summary(registry: &Registry, email: &str) -> ParticipantSummary {
    let papers: Vec<_> = registry.papers().by_author(email).collect();

    ParticipantSummary {
        papers_submitted: papers.len(),
        papers_accepted: papers
            .iter()
            .filter(|p| p.status == PaperStatus::Accepted)
            .count(),
        sessions_registered: registry.sessions().registrations_of(email).count(),
        meetings: meeting_counts(registry, email),
    }
}
