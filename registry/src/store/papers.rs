//! Paper store
//!
//! Submissions, their decision status and the reviewers assigned to them.

use sdk::errors::RegistryError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

use super::accounts::Account;
use super::{new_id, now_millis};

/// Paper decision status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaperStatus {
    UnderReview,
    Accepted,
    Rejected,
}

impl PaperStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaperStatus::UnderReview => "UnderReview",
            PaperStatus::Accepted => "Accepted",
            PaperStatus::Rejected => "Rejected",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PaperStatus::UnderReview => "Under Review",
            PaperStatus::Accepted => "Accepted",
            PaperStatus::Rejected => "Rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaperStatus::UnderReview)
    }
}

impl fmt::Display for PaperStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaperStatus {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "underreview" => Ok(PaperStatus::UnderReview),
            "accepted" | "accept" => Ok(PaperStatus::Accepted),
            "rejected" | "reject" => Ok(PaperStatus::Rejected),
            _ => Err(RegistryError::invalid_field(
                "status",
                format!("unknown paper status '{}'", s),
            )),
        }
    }
}

/// Paper record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    pub id: String,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub keywords: Vec<String>,
    pub author_name: String,
    pub author_email: String,
    pub status: PaperStatus,
    /// Reviewer emails in assignment order, no duplicates
    pub assigned_reviewers: Vec<String>,
    pub review_count: u32,
    pub submitted_at: i64,
}

impl Paper {
    pub fn is_assigned(&self, reviewer_email: &str) -> bool {
        self.assigned_reviewers.iter().any(|r| r == reviewer_email)
    }
}

/// Submission request
#[derive(Debug, Clone, PartialEq)]
pub struct NewPaper {
    pub title: String,
    pub abstract_text: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaperStore {
    papers: Vec<Paper>,
}

impl PaperStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Submit a paper; always succeeds
    pub fn submit(&mut self, author: &Account, new: NewPaper) -> Paper {
        let paper = Paper {
            id: new_id(),
            title: new.title,
            abstract_text: new.abstract_text,
            keywords: new.keywords,
            author_name: author.name.clone(),
            author_email: author.email.clone(),
            status: PaperStatus::UnderReview,
            assigned_reviewers: Vec::new(),
            review_count: 0,
            submitted_at: now_millis(),
        };

        info!("Paper {} submitted by {}", paper.id, paper.author_email);
        self.papers.push(paper.clone());
        paper
    }

    pub fn get(&self, paper_id: &str) -> Option<&Paper> {
        self.papers.iter().find(|p| p.id == paper_id)
    }

    fn get_mut(&mut self, paper_id: &str) -> Result<&mut Paper, RegistryError> {
        self.papers
            .iter_mut()
            .find(|p| p.id == paper_id)
            .ok_or_else(|| RegistryError::PaperNotFound(paper_id.to_string()))
    }

    /// Overwrite the status of a paper
    ///
    /// Without `strict` any status replaces any other. With `strict` only an
    /// UnderReview paper may change. Returns the previous status.
    pub fn set_status(
        &mut self,
        paper_id: &str,
        status: PaperStatus,
        strict: bool,
    ) -> Result<PaperStatus, RegistryError> {
        let paper = self.get_mut(paper_id)?;
        let previous = paper.status;

        if strict && previous.is_terminal() {
            warn!(
                "Refused status change of paper {} from {} to {}",
                paper_id, previous, status
            );
            return Err(RegistryError::InvalidTransition {
                entity: "paper",
                from: previous.to_string(),
                to: status.to_string(),
            });
        }

        paper.status = status;
        info!("Paper {} status {} -> {}", paper_id, previous, status);
        Ok(previous)
    }

    /// Append a reviewer to the paper's assignment list
    ///
    /// The caller resolves the reviewer account first.
    pub fn assign_reviewer(
        &mut self,
        paper_id: &str,
        reviewer_email: &str,
    ) -> Result<(), RegistryError> {
        let paper = self.get_mut(paper_id)?;

        if paper.is_assigned(reviewer_email) {
            warn!("{} already assigned to paper {}", reviewer_email, paper_id);
            return Err(RegistryError::ReviewerAlreadyAssigned {
                paper_id: paper_id.to_string(),
                reviewer: reviewer_email.to_string(),
            });
        }

        paper.assigned_reviewers.push(reviewer_email.to_string());
        info!("Assigned {} to paper {}", reviewer_email, paper_id);
        Ok(())
    }

    /// Bump the review counter, returns the new count
    pub fn record_review(&mut self, paper_id: &str) -> Result<u32, RegistryError> {
        let paper = self.get_mut(paper_id)?;
        paper.review_count += 1;
        Ok(paper.review_count)
    }

    pub fn list(&self) -> &[Paper] {
        &self.papers
    }

    pub fn by_author<'a>(&'a self, email: &'a str) -> impl Iterator<Item = &'a Paper> + 'a {
        self.papers.iter().filter(move |p| p.author_email == email)
    }

    pub fn assigned_to<'a>(&'a self, email: &'a str) -> impl Iterator<Item = &'a Paper> + 'a {
        self.papers.iter().filter(move |p| p.is_assigned(email))
    }

    pub fn len(&self) -> usize {
        self.papers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.papers.is_empty()
    }
}
