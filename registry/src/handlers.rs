//! Command handlers for CLI operations
//!
//! Every handler loads the registry snapshot, runs one registry operation
//! on behalf of the active identity, prints the outcome and saves the
//! snapshot again when something changed. Field values go through the form
//! layer first, exactly like a submitted form.
//!
//! Handlers only return errors. [`report_error`] prints them once, as a
//! `✗` line in text mode or as an `{"error", "hint", "notices"}` object
//! with `--json`.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use sdk::errors::{RegistryError, RegistryErrorExt};
use sdk::types::FormInput;
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::aggregate;
use crate::cli::{MeetingAction, PaperAction, ReviewAction, ReviewArgs, SessionAction, SessionArgs};
use crate::config::Config;
use crate::forms;
use crate::identity::{self, ActiveIdentity};
use crate::notifications::{Notice, NoticeBus, NoticeLevel};
use crate::store::accounts::{AccountProfile, Role};
use crate::store::meetings::{Meeting, MeetingStatus};
use crate::store::papers::{Paper, PaperStatus};
use crate::store::reviews::Review;
use crate::store::snapshot::{RegistrySnapshot, SnapshotLock};
use crate::store::Registry;

/// Output format for command results
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

/// A failed registry operation along with the notices it published
#[derive(Debug)]
pub struct Failure {
    pub error: RegistryError,
    pub notices: Vec<Notice>,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl std::error::Error for Failure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.error)
    }
}

fn registry_error(err: &anyhow::Error) -> Option<&RegistryError> {
    match err.downcast_ref::<Failure>() {
        Some(failure) => Some(&failure.error),
        None => err
            .chain()
            .find_map(|cause| cause.downcast_ref::<RegistryError>()),
    }
}

/// JSON error object for any handler error
pub fn error_report(err: &anyhow::Error) -> serde_json::Value {
    let notices: &[Notice] = err
        .downcast_ref::<Failure>()
        .map(|failure| failure.notices.as_slice())
        .unwrap_or_default();
    let hint = registry_error(err).map(|e| e.user_hint());

    json!({
        "error": format!("{:#}", err),
        "hint": hint,
        "notices": notices,
    })
}

/// `✗` lines for a handler error: the published notices when there are
/// any, otherwise the error and its hint
pub fn error_lines(err: &anyhow::Error) -> Vec<String> {
    if let Some(failure) = err.downcast_ref::<Failure>() {
        if !failure.notices.is_empty() {
            return failure
                .notices
                .iter()
                .map(|notice| format!("✗ {}", notice.message))
                .collect();
        }
    }

    let mut lines = vec![format!("✗ {:#}", err)];
    if let Some(e) = registry_error(err) {
        lines.push(format!("  {}", e.user_hint()));
    }
    lines
}

/// Print a handler error once, in the requested format
pub fn report_error(err: &anyhow::Error, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let output = error_report(err);
            match serde_json::to_string_pretty(&output) {
                Ok(text) => println!("{}", text),
                Err(_) => println!("{}", output),
            }
        }
        OutputFormat::Text => {
            for line in error_lines(err) {
                eprintln!("{}", line);
            }
        }
    }
}

/// Registry state for the duration of one command
struct Shell<'a> {
    config: &'a Config,
    registry: Registry,
    notices: mpsc::Receiver<Notice>,
    format: OutputFormat,
    _lock: SnapshotLock,
}

impl<'a> Shell<'a> {
    async fn open(config: &'a Config, format: OutputFormat) -> Result<Self> {
        let lock = SnapshotLock::acquire(&config.snapshot_path()).await?;
        let snapshot = RegistrySnapshot::load(&config.snapshot_path())
            .await
            .context("Failed to load registry state")?;

        let mut registry = match snapshot {
            Some(snapshot) => Registry::from_snapshot(snapshot, config.policy()),
            None if config.accounts.seed_test_accounts => {
                tracing::info!("Starting a new registry with the test accounts");
                Registry::with_test_accounts(config.policy())
            }
            None => Registry::new(config.policy()),
        };

        let bus = Arc::new(NoticeBus::with_dismiss_after(config.dismiss_after()));
        let notices = bus.subscribe(NoticeLevel::All);
        registry.attach_notices(bus);

        Ok(Self {
            config,
            registry,
            notices,
            format,
            _lock: lock,
        })
    }

    async fn identity(&self) -> Result<ActiveIdentity> {
        ActiveIdentity::load(&self.config.identity_path())
            .await
            .context("Failed to read active identity")?
            .ok_or_else(|| RegistryError::NotSignedIn.into())
    }

    /// Active identity, which must hold one of `allowed`
    async fn identity_as(&self, allowed: &[Role], action: &str) -> Result<ActiveIdentity> {
        let me = self.identity().await?;
        me.require(allowed, action)?;
        Ok(me)
    }

    async fn save(&self) -> Result<()> {
        self.registry
            .snapshot()
            .save(&self.config.snapshot_path())
            .await
            .context("Failed to save registry state")
    }

    fn drain_notices(&mut self) -> Vec<Notice> {
        let mut notices = Vec::new();
        while let Ok(notice) = self.notices.try_recv() {
            notices.push(notice);
        }
        notices
    }

    /// Unwrap a registry result, attaching the published notices on failure
    fn check<T>(&mut self, result: Result<T, RegistryError>) -> Result<T> {
        result.map_err(|error| {
            Failure {
                error,
                notices: self.drain_notices(),
            }
            .into()
        })
    }

    /// Print the pending notices followed by the command result
    fn emit(&mut self, result: serde_json::Value, lines: &[String]) -> Result<()> {
        let notices = self.drain_notices();
        match self.format {
            OutputFormat::Text => {
                for notice in &notices {
                    let marker = match notice.level {
                        NoticeLevel::Error => "✗",
                        _ => "✓",
                    };
                    println!("{} {}", marker, notice.message);
                }
                for line in lines {
                    println!("{}", line);
                }
            }
            OutputFormat::Json => {
                let output = json!({
                    "result": result,
                    "notices": notices,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
        }
        Ok(())
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn prompt_password(given: Option<String>) -> Result<String> {
    match given {
        Some(password) => Ok(password),
        None => rpassword::prompt_password_stdout("Password: ").context("Failed to read password"),
    }
}

fn paper_line(paper: &Paper, registry: &Registry) -> String {
    format!(
        "{}  {}  [{}]  by {}  reviews: {}  avg: {}",
        paper.id,
        paper.title,
        paper.status.label(),
        paper.author_name,
        paper.review_count,
        aggregate::average_rating(registry, &paper.id)
    )
}

fn review_line(review: &Review) -> String {
    format!(
        "{}  paper {}  {} / 5  {}  by {}",
        review.id,
        review.paper_id,
        review.rating.value(),
        review.recommendation,
        review.reviewer_name
    )
}

fn meeting_line(meeting: &Meeting) -> String {
    format!(
        "{}  {} {}  {} with {}  \"{}\"  [{}]",
        meeting.id,
        meeting.date,
        meeting.time.format("%H:%M"),
        meeting.student_name,
        meeting.professor_name,
        meeting.topic,
        meeting.status
    )
}

// ---- identity ----

pub async fn handle_login(
    email: String,
    role: String,
    password: Option<String>,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let mut shell = Shell::open(config, format).await?;
    let password = prompt_password(password)?;

    let input = FormInput::new("login")
        .with_field("email", email)
        .with_field("password", password)
        .with_field("role", role);
    let request = forms::parse_login(&input)?;

    let result = shell
        .registry
        .login(&request.email, &request.password, request.role);
    let account = shell.check(result)?;

    let identity = ActiveIdentity::from(&account);
    identity
        .save(&config.identity_path())
        .await
        .context("Failed to store active identity")?;

    shell.emit(
        json!(AccountProfile::from(&account)),
        &[format!(
            "Logged in as {} ({} portal)",
            account.name,
            account.role.label()
        )],
    )
}

pub async fn handle_logout(config: &Config, format: OutputFormat) -> Result<()> {
    let removed = ActiveIdentity::clear(&config.identity_path())
        .await
        .context("Failed to clear active identity")?;

    match format {
        OutputFormat::Text => {
            if removed {
                println!("Logged out");
            } else {
                println!("Not logged in");
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ "logged_out": removed }))?);
        }
    }
    Ok(())
}

pub async fn handle_whoami(config: &Config, format: OutputFormat) -> Result<()> {
    let identity = ActiveIdentity::load(&config.identity_path())
        .await
        .context("Failed to read active identity")?;

    match format {
        OutputFormat::Text => match &identity {
            Some(me) => println!("{} <{}> ({} portal)", me.name, me.email, me.role.label()),
            None => println!("Not logged in"),
        },
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ "identity": identity }))?);
        }
    }
    Ok(())
}

pub async fn handle_signup(
    name: String,
    email: String,
    role: String,
    affiliation: Option<String>,
    password: Option<String>,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let mut shell = Shell::open(config, format).await?;
    let password = prompt_password(password)?;

    let input = FormInput::new("signup")
        .with_field("name", name)
        .with_field("email", email)
        .with_field("password", password)
        .with_field("role", role)
        .with_optional_field("affiliation", affiliation);
    let new = forms::parse_signup(&input)?;

    identity::check_signup_role(new.role)?;

    let result = shell.registry.signup(new);
    let account = shell.check(result)?;
    shell.save().await?;

    ActiveIdentity::from(&account)
        .save(&config.identity_path())
        .await
        .context("Failed to store active identity")?;

    shell.emit(
        json!(AccountProfile::from(&account)),
        &[format!("Account created, logged in as {}", account.name)],
    )
}

pub async fn handle_accounts(config: &Config, format: OutputFormat) -> Result<()> {
    let mut shell = Shell::open(config, format).await?;
    shell.identity_as(&[Role::Admin], "list accounts").await?;

    let profiles: Vec<AccountProfile> = shell
        .registry
        .accounts()
        .accounts()
        .iter()
        .map(AccountProfile::from)
        .collect();

    let lines: Vec<String> = profiles
        .iter()
        .map(|p| {
            format!(
                "{:<24} {:<20} {:<12} {}",
                p.email,
                p.name,
                p.role.as_str(),
                p.affiliation.as_deref().unwrap_or("-")
            )
        })
        .collect();

    shell.emit(json!(profiles), &lines)
}

// ---- papers ----

pub async fn handle_paper(action: PaperAction, config: &Config, format: OutputFormat) -> Result<()> {
    let mut shell = Shell::open(config, format).await?;

    match action {
        PaperAction::Submit {
            title,
            abstract_text,
            keywords,
        } => {
            let me = shell
                .identity_as(&[Role::Participant], "submit papers")
                .await?;
            let input = FormInput::new("paper")
                .with_field("title", title)
                .with_field("abstract", abstract_text)
                .with_field("keywords", keywords);
            let new = forms::parse_paper(&input)?;

            let result = shell.registry.submit_paper(&me.email, new);
            let paper = shell.check(result)?;
            shell.save().await?;

            let line = paper_line(&paper, &shell.registry);
            shell.emit(json!(paper), &[line])
        }

        PaperAction::List { status } => {
            let me = shell.identity().await?;
            let status = status.map(|s| s.parse::<PaperStatus>()).transpose()?;

            let papers: Vec<&Paper> = match me.role {
                Role::Admin => shell.registry.papers().list().iter().collect(),
                Role::Participant => shell.registry.papers().by_author(&me.email).collect(),
                Role::Reviewer => shell.registry.papers().assigned_to(&me.email).collect(),
            };
            let papers: Vec<Paper> = papers
                .into_iter()
                .filter(|p| status.map_or(true, |s| p.status == s))
                .cloned()
                .collect();

            let mut lines: Vec<String> = papers
                .iter()
                .map(|p| paper_line(p, &shell.registry))
                .collect();
            if lines.is_empty() {
                lines.push("No papers".to_string());
            }
            shell.emit(json!(papers), &lines)
        }

        PaperAction::Status { paper_id, status } => {
            shell
                .identity_as(&[Role::Admin], "decide on papers")
                .await?;
            let status: PaperStatus = status.parse()?;

            let result = shell.registry.set_paper_status(&paper_id, status);
            let previous = shell.check(result)?;
            shell.save().await?;

            shell.emit(
                json!({ "paper_id": paper_id, "previous": previous, "status": status }),
                &[],
            )
        }

        PaperAction::Assign { paper_id, reviewer } => {
            shell
                .identity_as(&[Role::Admin], "assign reviewers")
                .await?;

            let result = shell.registry.assign_reviewer(&paper_id, &reviewer);
            let account = shell.check(result)?;
            shell.save().await?;

            shell.emit(
                json!({ "paper_id": paper_id, "reviewer": AccountProfile::from(&account) }),
                &[],
            )
        }

        PaperAction::Show { paper_id } => {
            shell.identity().await?;
            let paper = shell.registry.paper(&paper_id)?.clone();
            let reviews: Vec<Review> = shell.registry.reviews().for_paper(&paper_id).cloned().collect();
            let average = aggregate::average_rating(&shell.registry, &paper_id);

            let mut lines = vec![
                format!("{} [{}]", paper.title, paper.status.label()),
                format!("Author: {} <{}>", paper.author_name, paper.author_email),
                format!("Keywords: {}", paper.keywords.join(", ")),
                format!("Reviewers: {}", paper.assigned_reviewers.join(", ")),
                format!("Average rating: {}", average),
                String::new(),
                paper.abstract_text.clone(),
            ];
            for review in &reviews {
                lines.push(String::new());
                lines.push(review_line(review));
                lines.push(format!("  {}", review.comments));
            }

            shell.emit(
                json!({ "paper": paper, "reviews": reviews, "average_rating": average }),
                &lines,
            )
        }
    }
}

// ---- reviews ----

pub async fn handle_review(action: ReviewAction, config: &Config, format: OutputFormat) -> Result<()> {
    let mut shell = Shell::open(config, format).await?;

    match action {
        ReviewAction::Submit(ReviewArgs {
            paper_id,
            rating,
            comments,
            recommendation,
        }) => {
            let me = shell
                .identity_as(&[Role::Reviewer], "review papers")
                .await?;
            let input = FormInput::new("review")
                .with_field("rating", rating)
                .with_field("comments", comments)
                .with_field("recommendation", recommendation);
            let new = forms::parse_review(&input)?;

            let result = shell.registry.submit_review(&paper_id, &me.email, new);
            let review = shell.check(result)?;
            shell.save().await?;

            let line = review_line(&review);
            shell.emit(json!(review), &[line])
        }

        ReviewAction::List { paper } => {
            let me = shell.identity().await?;
            let reviews: Vec<Review> = match (&paper, me.role) {
                (Some(paper_id), _) => {
                    shell.registry.paper(paper_id)?;
                    shell.registry.reviews().for_paper(paper_id).cloned().collect()
                }
                (None, Role::Reviewer) => shell.registry.reviews().by_reviewer(&me.email).cloned().collect(),
                (None, Role::Participant) => {
                    let own: Vec<&str> = shell
                        .registry
                        .papers()
                        .by_author(&me.email)
                        .map(|p| p.id.as_str())
                        .collect();
                    shell
                        .registry
                        .reviews()
                        .list()
                        .iter()
                        .filter(|r| own.contains(&r.paper_id.as_str()))
                        .cloned()
                        .collect()
                }
                (None, Role::Admin) => shell.registry.reviews().list().to_vec(),
            };

            let mut lines: Vec<String> = reviews.iter().map(review_line).collect();
            if lines.is_empty() {
                lines.push("No reviews".to_string());
            }
            shell.emit(json!(reviews), &lines)
        }
    }
}

// ---- sessions ----

pub async fn handle_session(action: SessionAction, config: &Config, format: OutputFormat) -> Result<()> {
    let mut shell = Shell::open(config, format).await?;

    match action {
        SessionAction::Create(SessionArgs {
            title,
            date,
            start,
            end,
            room,
            track,
            description,
        }) => {
            shell
                .identity_as(&[Role::Admin], "create sessions")
                .await?;
            let input = FormInput::new("session")
                .with_field("title", title)
                .with_field("date", date)
                .with_field("start_time", start)
                .with_field("end_time", end)
                .with_field("room", room)
                .with_field("track", track)
                .with_field("description", description);
            let new = forms::parse_session(&input, today())?;

            let session = shell.registry.create_session(new);
            shell.save().await?;

            let line = format!("{}  {}", session.id, session.title);
            shell.emit(json!(session), &[line])
        }

        SessionAction::List => {
            let me = shell.identity().await.ok();
            let rows: Vec<serde_json::Value> = shell
                .registry
                .sessions()
                .sessions()
                .iter()
                .map(|s| {
                    let registered = me
                        .as_ref()
                        .map(|me| shell.registry.sessions().is_registered(&s.id, &me.email));
                    json!({
                        "session": s,
                        "attendees": aggregate::attendee_count(&shell.registry, &s.id),
                        "registered": registered,
                    })
                })
                .collect();

            let mut lines: Vec<String> = shell
                .registry
                .sessions()
                .sessions()
                .iter()
                .map(|s| {
                    let mark = match &me {
                        Some(me) if shell.registry.sessions().is_registered(&s.id, &me.email) => "*",
                        _ => " ",
                    };
                    format!(
                        "{} {}  {}  {} {}-{}  {}  [{}]  attendees: {}",
                        mark,
                        s.id,
                        s.title,
                        s.date,
                        s.start_time.format("%H:%M"),
                        s.end_time.format("%H:%M"),
                        s.room,
                        s.track,
                        aggregate::attendee_count(&shell.registry, &s.id)
                    )
                })
                .collect();
            if lines.is_empty() {
                lines.push("No sessions".to_string());
            }
            shell.emit(json!(rows), &lines)
        }

        SessionAction::Register { session_id } => {
            let me = shell.identity().await?;
            let result = shell.registry.register(&session_id, &me.email);
            let registration = shell.check(result)?;
            shell.save().await?;

            shell.emit(json!(registration), &[])
        }

        SessionAction::Unregister { session_id } => {
            let me = shell.identity().await?;
            let result = shell.registry.unregister(&session_id, &me.email);
            let registration = shell.check(result)?;
            shell.save().await?;

            shell.emit(json!(registration), &[])
        }

        SessionAction::Delete { session_id } => {
            shell
                .identity_as(&[Role::Admin], "delete sessions")
                .await?;
            let result = shell.registry.delete_session(&session_id);
            let (session, cascaded) = shell.check(result)?;
            shell.save().await?;

            shell.emit(
                json!({ "session": session, "registrations_removed": cascaded }),
                &[format!("Removed {} registration(s)", cascaded)],
            )
        }
    }
}

// ---- meetings ----

pub async fn handle_meeting(action: MeetingAction, config: &Config, format: OutputFormat) -> Result<()> {
    let mut shell = Shell::open(config, format).await?;

    match action {
        MeetingAction::Request {
            professor,
            date,
            time,
            topic,
        } => {
            let me = shell
                .identity_as(&[Role::Participant], "request meetings")
                .await?;
            let input = FormInput::new("meeting")
                .with_field("professor", professor)
                .with_field("date", date)
                .with_field("time", time)
                .with_field("topic", topic);
            let new = forms::parse_meeting(&input, today())?;

            let result = shell.registry.request_meeting(&me.email, new);
            let meeting = shell.check(result)?;
            shell.save().await?;

            let line = meeting_line(&meeting);
            shell.emit(json!(meeting), &[line])
        }

        MeetingAction::List => {
            let me = shell.identity().await?;
            let meetings: Vec<Meeting> = match me.role {
                Role::Admin => shell.registry.meetings().list().to_vec(),
                _ => shell
                    .registry
                    .meetings()
                    .for_participant(&me.email)
                    .cloned()
                    .collect(),
            };

            let mut lines: Vec<String> = meetings.iter().map(meeting_line).collect();
            if lines.is_empty() {
                lines.push("No meetings".to_string());
            }
            shell.emit(json!(meetings), &lines)
        }

        MeetingAction::Accept { meeting_id } => {
            answer_meeting(&mut shell, &meeting_id, MeetingStatus::Confirmed).await
        }

        MeetingAction::Decline { meeting_id } => {
            answer_meeting(&mut shell, &meeting_id, MeetingStatus::Declined).await
        }
    }
}

async fn answer_meeting(shell: &mut Shell<'_>, meeting_id: &str, status: MeetingStatus) -> Result<()> {
    let me = shell
        .identity_as(&[Role::Reviewer], "answer meeting requests")
        .await?;

    me.require_professor_of(shell.registry.meeting(meeting_id)?)?;

    let result = shell.registry.update_meeting_status(meeting_id, status);
    let previous = shell.check(result)?;
    shell.save().await?;

    shell.emit(
        json!({ "meeting_id": meeting_id, "previous": previous, "status": status }),
        &[],
    )
}

// ---- dashboard ----

pub async fn handle_stats(config: &Config, format: OutputFormat) -> Result<()> {
    let mut shell = Shell::open(config, format).await?;
    let me = shell.identity().await?;

    match me.role {
        Role::Admin => {
            let stats = aggregate::conference_stats(&shell.registry);
            let lines = vec![
                format!("Papers:        {}", stats.papers),
                format!("  Under review {}", stats.by_status.under_review),
                format!("  Accepted     {}", stats.by_status.accepted),
                format!("  Rejected     {}", stats.by_status.rejected),
                format!("Sessions:      {}", stats.sessions),
                format!("Reviews:       {}", stats.reviews),
                format!("Registrations: {}", stats.registrations),
            ];
            shell.emit(json!(stats), &lines)
        }
        Role::Participant => {
            let summary = aggregate::participant_summary(&shell.registry, &me.email);
            let lines = vec![
                format!("Papers submitted:    {}", summary.papers_submitted),
                format!("Papers accepted:     {}", summary.papers_accepted),
                format!("Sessions registered: {}", summary.sessions_registered),
                format!(
                    "Meetings:            {} pending, {} confirmed, {} declined",
                    summary.meetings.pending, summary.meetings.confirmed, summary.meetings.declined
                ),
            ];
            shell.emit(json!(summary), &lines)
        }
        Role::Reviewer => {
            let workload = aggregate::reviewer_workload(&shell.registry, &me.email);
            let meetings = aggregate::meeting_counts(&shell.registry, &me.email);
            let lines = vec![
                format!("Assigned papers:   {}", workload.assigned),
                format!("Reviews completed: {}", workload.completed),
                format!("Reviews pending:   {}", workload.pending),
                format!(
                    "Meetings:          {} pending, {} confirmed, {} declined",
                    meetings.pending, meetings.confirmed, meetings.declined
                ),
            ];
            shell.emit(json!({ "workload": workload, "meetings": meetings }), &lines)
        }
    }
}
