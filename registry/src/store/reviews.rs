//! Review store

use sdk::errors::RegistryError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::info;

use super::accounts::Account;
use super::{new_id, now_millis};

/// Review score, always within 1..=5
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: i64) -> Result<Self, RegistryError> {
        if (Self::MIN as i64..=Self::MAX as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(RegistryError::invalid_field(
                "rating",
                format!("{} is not between {} and {}", value, Self::MIN, Self::MAX),
            ))
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = RegistryError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Rating::new(value as i64)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

/// Reviewer's overall recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Recommendation {
    Accept,
    #[serde(rename = "Minor Revisions")]
    MinorRevisions,
    #[serde(rename = "Major Revisions")]
    MajorRevisions,
    Reject,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::Accept => "Accept",
            Recommendation::MinorRevisions => "Minor Revisions",
            Recommendation::MajorRevisions => "Major Revisions",
            Recommendation::Reject => "Reject",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Recommendation {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "accept" => Ok(Recommendation::Accept),
            "minorrevisions" | "minor" => Ok(Recommendation::MinorRevisions),
            "majorrevisions" | "major" => Ok(Recommendation::MajorRevisions),
            "reject" => Ok(Recommendation::Reject),
            _ => Err(RegistryError::invalid_field(
                "recommendation",
                format!("unknown recommendation '{}'", s),
            )),
        }
    }
}

/// Review record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub paper_id: String,
    pub reviewer_name: String,
    pub reviewer_email: String,
    pub rating: Rating,
    pub comments: String,
    pub recommendation: Recommendation,
    pub submitted_at: i64,
}

/// Review submission
#[derive(Debug, Clone, PartialEq)]
pub struct NewReview {
    pub rating: Rating,
    pub comments: String,
    pub recommendation: Recommendation,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewStore {
    reviews: Vec<Review>,
}

impl ReviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a review row
    ///
    /// Does not check that the paper exists or that the reviewer was
    /// assigned; the registry handles cross-store checks.
    pub fn create(&mut self, paper_id: &str, reviewer: &Account, new: NewReview) -> Review {
        let review = Review {
            id: new_id(),
            paper_id: paper_id.to_string(),
            reviewer_name: reviewer.name.clone(),
            reviewer_email: reviewer.email.clone(),
            rating: new.rating,
            comments: new.comments,
            recommendation: new.recommendation,
            submitted_at: now_millis(),
        };

        info!(
            "Review {} of paper {} by {} (rating {})",
            review.id,
            paper_id,
            review.reviewer_email,
            review.rating.value()
        );
        self.reviews.push(review.clone());
        review
    }

    pub fn for_paper<'a>(&'a self, paper_id: &'a str) -> impl Iterator<Item = &'a Review> + 'a {
        self.reviews.iter().filter(move |r| r.paper_id == paper_id)
    }

    pub fn by_reviewer<'a>(&'a self, email: &'a str) -> impl Iterator<Item = &'a Review> + 'a {
        self.reviews.iter().filter(move |r| r.reviewer_email == email)
    }

    pub fn has_reviewed(&self, paper_id: &str, email: &str) -> bool {
        self.reviews
            .iter()
            .any(|r| r.paper_id == paper_id && r.reviewer_email == email)
    }

    pub fn list(&self) -> &[Review] {
        &self.reviews
    }

    pub fn len(&self) -> usize {
        self.reviews.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::accounts::Role;

    fn reviewer() -> Account {
        Account {
            email: "r@x.com".to_string(),
            password: "pass123".to_string(),
            name: "Dr. R".to_string(),
            role: Role::Reviewer,
            affiliation: Some("AI Research".to_string()),
        }
    }

    fn review(rating: i64) -> NewReview {
        NewReview {
            rating: Rating::new(rating).unwrap(),
            comments: "Solid work".to_string(),
            recommendation: Recommendation::MinorRevisions,
        }
    }

    #[test]
    fn test_rating_bounds() {
        assert!(Rating::new(0).is_err());
        assert!(Rating::new(6).is_err());
        assert!(Rating::new(-3).is_err());
        assert_eq!(Rating::new(1).unwrap().value(), 1);
        assert_eq!(Rating::new(5).unwrap().value(), 5);
    }

    #[test]
    fn test_rating_deserialize_rejects_out_of_range() {
        assert!(serde_json::from_str::<Rating>("7").is_err());
        assert_eq!(serde_json::from_str::<Rating>("4").unwrap().value(), 4);
    }

    #[test]
    fn test_multiple_reviews_same_reviewer_allowed() {
        let mut store = ReviewStore::new();
        store.create("p1", &reviewer(), review(4));
        store.create("p1", &reviewer(), review(2));

        assert_eq!(store.for_paper("p1").count(), 2);
        assert_eq!(store.by_reviewer("r@x.com").count(), 2);
        assert!(store.has_reviewed("p1", "r@x.com"));
        assert!(!store.has_reviewed("p2", "r@x.com"));
    }

    #[test]
    fn test_recommendation_round_trip_names() {
        assert_eq!(
            "Minor Revisions".parse::<Recommendation>().unwrap(),
            Recommendation::MinorRevisions
        );
        assert_eq!(
            "major-revisions".parse::<Recommendation>().unwrap(),
            Recommendation::MajorRevisions
        );
        assert_eq!(
            serde_json::to_string(&Recommendation::MajorRevisions).unwrap(),
            "\"Major Revisions\""
        );
        assert!("maybe".parse::<Recommendation>().is_err());
    }
}
