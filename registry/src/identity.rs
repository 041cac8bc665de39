//! Active identity of the shell
//!
//! `confreg login` stores who the following commands act as. Only the
//! email, display name and portal are kept; the password never touches disk.

use sdk::errors::RegistryError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::store::accounts::{Account, Role};
use crate::store::meetings::Meeting;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveIdentity {
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl From<&Account> for ActiveIdentity {
    fn from(account: &Account) -> Self {
        Self {
            email: account.email.clone(),
            name: account.name.clone(),
            role: account.role,
        }
    }
}

impl ActiveIdentity {
    pub async fn load(path: &Path) -> Result<Option<Self>, RegistryError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = tokio::fs::read_to_string(path).await?;
        let identity = serde_json::from_str(&content)
            .map_err(|e| RegistryError::Snapshot(format!("{}: {}", path.display(), e)))?;
        Ok(Some(identity))
    }

    pub async fn save(&self, path: &Path) -> Result<(), RegistryError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| RegistryError::Snapshot(e.to_string()))?;
        tokio::fs::write(path, content).await?;

        debug!("Active identity is now {} ({})", self.email, self.role);
        Ok(())
    }

    /// Remove the stored identity; returns false when none was stored
    pub async fn clear(path: &Path) -> Result<bool, RegistryError> {
        if !path.exists() {
            return Ok(false);
        }
        tokio::fs::remove_file(path).await?;
        Ok(true)
    }

    /// Fail with `Forbidden` unless the identity holds one of `allowed`
    pub fn require(&self, allowed: &[Role], action: &str) -> Result<(), RegistryError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(RegistryError::Forbidden {
                action: action.to_string(),
                role: self.role.to_string(),
            })
        }
    }

    /// Only the reviewer a meeting was requested from may answer it
    pub fn require_professor_of(&self, meeting: &Meeting) -> Result<(), RegistryError> {
        if self.role == Role::Reviewer && meeting.professor_email == self.email {
            Ok(())
        } else {
            Err(RegistryError::Forbidden {
                action: "answer another reviewer's meetings".to_string(),
                role: self.role.to_string(),
            })
        }
    }
}

/// The shell signs up participants and reviewers, never admins
pub fn check_signup_role(role: Role) -> Result<(), RegistryError> {
    if role == Role::Admin {
        return Err(RegistryError::Forbidden {
            action: "sign up".to_string(),
            role: role.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::meetings::NewMeeting;
    use crate::store::{Policy, Registry};
    use chrono::{NaiveDate, NaiveTime};
    use tempfile::TempDir;

    fn identity(role: Role) -> ActiveIdentity {
        ActiveIdentity {
            email: "admin@test.com".to_string(),
            name: "Admin User".to_string(),
            role,
        }
    }

    #[tokio::test]
    async fn test_save_load_clear() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("identity.json");

        assert!(ActiveIdentity::load(&path).await.unwrap().is_none());

        identity(Role::Admin).save(&path).await.unwrap();
        let loaded = ActiveIdentity::load(&path).await.unwrap().unwrap();
        assert_eq!(loaded, identity(Role::Admin));

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(!content.contains("password"));

        assert!(ActiveIdentity::clear(&path).await.unwrap());
        assert!(!ActiveIdentity::clear(&path).await.unwrap());
    }

    #[test]
    fn test_require_role() {
        let reviewer = identity(Role::Reviewer);
        assert!(reviewer.require(&[Role::Reviewer], "review papers").is_ok());
        assert!(matches!(
            reviewer.require(&[Role::Admin], "delete sessions"),
            Err(RegistryError::Forbidden { .. })
        ));
    }

    #[test]
    fn test_admin_signup_refused() {
        assert!(matches!(
            check_signup_role(Role::Admin),
            Err(RegistryError::Forbidden { .. })
        ));
        assert!(check_signup_role(Role::Participant).is_ok());
        assert!(check_signup_role(Role::Reviewer).is_ok());
    }

    #[test]
    fn test_only_requested_reviewer_answers_meeting() {
        let mut registry = Registry::with_test_accounts(Policy::default());
        let meeting = registry
            .request_meeting(
                "student1@test.com",
                NewMeeting {
                    professor_email: "employee1@test.com".to_string(),
                    date: NaiveDate::from_ymd_opt(2030, 6, 2).unwrap(),
                    time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                    topic: "Thesis".to_string(),
                },
            )
            .unwrap();

        let as_identity = |email: &str| {
            ActiveIdentity::from(registry.accounts().find_by_email(email).unwrap())
        };

        assert!(as_identity("employee1@test.com")
            .require_professor_of(&meeting)
            .is_ok());
        assert!(matches!(
            as_identity("employee2@test.com").require_professor_of(&meeting),
            Err(RegistryError::Forbidden { .. })
        ));
        assert!(matches!(
            as_identity("student1@test.com").require_professor_of(&meeting),
            Err(RegistryError::Forbidden { .. })
        ));
    }
}
