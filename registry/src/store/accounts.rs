//! Account directory
//!
//! Identity records for every portal. Lookups compare email, password and
//! role by exact string equality; there is no hashing and no session token,
//! the caller keeps whichever account `authenticate` returned.

use sdk::errors::RegistryError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Portal role of an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    /// Paper author and session attendee
    Participant,
    /// Paper reviewer, also the professor side of meetings
    Reviewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Participant => "participant",
            Role::Reviewer => "reviewer",
        }
    }

    /// Portal label shown on the login screen
    pub fn label(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Participant => "Participant",
            Role::Reviewer => "Reviewer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = RegistryError;

    /// Accepts the role names and the older portal names
    /// ("student" for participant, "employee" for reviewer).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "participant" | "student" | "author" => Ok(Role::Participant),
            "reviewer" | "employee" | "professor" => Ok(Role::Reviewer),
            other => Err(RegistryError::invalid_field(
                "role",
                format!("unknown role '{}'", other),
            )),
        }
    }
}

/// Account record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: Role,
    /// University for participants, department for reviewers
    pub affiliation: Option<String>,
}

/// Account without its password, safe to print
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountProfile {
    pub email: String,
    pub name: String,
    pub role: Role,
    pub affiliation: Option<String>,
}

impl From<&Account> for AccountProfile {
    fn from(account: &Account) -> Self {
        Self {
            email: account.email.clone(),
            name: account.name.clone(),
            role: account.role,
            affiliation: account.affiliation.clone(),
        }
    }
}

/// Signup request
#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub affiliation: Option<String>,
}

/// Directory of all known accounts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountDirectory {
    accounts: Vec<Account>,
}

impl AccountDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a directory holding the built-in test accounts
    pub fn with_test_accounts() -> Self {
        Self {
            accounts: test_accounts(),
        }
    }

    /// Find an account; every provided field must match exactly
    pub fn find_account(
        &self,
        email: &str,
        password: Option<&str>,
        role: Option<Role>,
    ) -> Option<&Account> {
        self.accounts.iter().find(|acc| {
            acc.email == email
                && password.map_or(true, |p| acc.password == p)
                && role.map_or(true, |r| acc.role == r)
        })
    }

    pub fn find_by_email(&self, email: &str) -> Option<&Account> {
        self.find_account(email, None, None)
    }

    /// Find a reviewer-role account by email
    pub fn find_reviewer(&self, email: &str) -> Option<&Account> {
        self.find_account(email, None, Some(Role::Reviewer))
    }

    /// Check credentials for a portal login
    pub fn authenticate(
        &self,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<&Account, RegistryError> {
        match self.find_account(email, Some(password), Some(role)) {
            Some(account) => {
                debug!("Authenticated {} for the {} portal", email, role);
                Ok(account)
            }
            None => {
                warn!("Rejected login for {} on the {} portal", email, role);
                Err(RegistryError::InvalidCredentials)
            }
        }
    }

    /// Register a new account
    ///
    /// Emails are unique across the directory. Participants without an
    /// affiliation get "New University", reviewers get "New Department".
    pub fn signup(&mut self, new: NewAccount) -> Result<Account, RegistryError> {
        if self.find_by_email(&new.email).is_some() {
            warn!("Signup rejected, {} already exists", new.email);
            return Err(RegistryError::DuplicateAccount(new.email));
        }

        let affiliation = new.affiliation.or_else(|| match new.role {
            Role::Participant => Some("New University".to_string()),
            Role::Reviewer => Some("New Department".to_string()),
            Role::Admin => None,
        });

        let account = Account {
            email: new.email,
            password: new.password,
            name: new.name,
            role: new.role,
            affiliation,
        };

        info!("Created {} account {}", account.role, account.email);
        self.accounts.push(account.clone());
        Ok(account)
    }

    /// Reviewer accounts, in directory order
    pub fn reviewers(&self) -> impl Iterator<Item = &Account> {
        self.accounts.iter().filter(|acc| acc.role == Role::Reviewer)
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

fn account(
    email: &str,
    password: &str,
    name: &str,
    role: Role,
    affiliation: Option<&str>,
) -> Account {
    Account {
        email: email.to_string(),
        password: password.to_string(),
        name: name.to_string(),
        role,
        affiliation: affiliation.map(String::from),
    }
}

/// Pre-configured test accounts
fn test_accounts() -> Vec<Account> {
    vec![
        account("admin@test.com", "admin123", "Admin User", Role::Admin, None),
        account("student1@test.com", "pass123", "Alice Johnson", Role::Participant, Some("MIT")),
        account("student2@test.com", "pass123", "Bob Smith", Role::Participant, Some("Stanford")),
        account("student3@test.com", "pass123", "Carol Davis", Role::Participant, Some("Harvard")),
        account("employee1@test.com", "pass123", "Dr. David Wilson", Role::Reviewer, Some("Computer Science")),
        account("employee2@test.com", "pass123", "Dr. Emma Brown", Role::Reviewer, Some("AI Research")),
        account("employee3@test.com", "pass123", "Dr. Frank Miller", Role::Reviewer, Some("Data Science")),
    ]
}
