//! CLI interface for confreg
//!
//! Command-line shell over the registry, using clap's derive API. Field
//! values are taken as plain strings and validated by the form layer, the
//! same way a submitted web form would be.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Conference registry
///
/// Paper submission and review, session registration and meeting requests
/// for a small conference. Log in with one of the portal roles first.
#[derive(Parser, Debug)]
#[command(name = "confreg")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in to a portal
    Login {
        #[arg(long)]
        email: String,

        /// Portal: admin, participant or reviewer
        #[arg(long)]
        role: String,

        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// Forget the active identity
    Logout,

    /// Show the active identity
    Whoami,

    /// Create an account and sign in with it
    Signup {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        /// participant or reviewer
        #[arg(long)]
        role: String,

        /// University or department
        #[arg(long)]
        affiliation: Option<String>,

        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// List all accounts (admin)
    Accounts,

    /// Papers
    Paper {
        #[command(subcommand)]
        action: PaperAction,
    },

    /// Reviews
    Review {
        #[command(subcommand)]
        action: ReviewAction,
    },

    /// Sessions and registrations
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },

    /// Meetings with reviewers
    Meeting {
        #[command(subcommand)]
        action: MeetingAction,
    },

    /// Dashboard numbers for the active identity
    Stats,
}

#[derive(Subcommand, Debug)]
pub enum PaperAction {
    /// Submit a paper (participant)
    Submit {
        #[arg(long)]
        title: String,

        #[arg(long = "abstract")]
        abstract_text: String,

        /// Comma separated
        #[arg(long)]
        keywords: String,
    },

    /// List papers visible to the active identity
    List {
        /// Only papers with this status
        #[arg(long)]
        status: Option<String>,
    },

    /// Accept or reject a paper (admin)
    Status {
        paper_id: String,

        /// Accepted, Rejected or UnderReview
        status: String,
    },

    /// Assign a reviewer to a paper (admin)
    Assign {
        paper_id: String,

        /// Reviewer email
        reviewer: String,
    },

    /// Show a paper with its reviews
    Show { paper_id: String },
}

#[derive(Subcommand, Debug)]
pub enum ReviewAction {
    /// Review a paper (reviewer)
    Submit(ReviewArgs),

    /// List reviews, of one paper or by the active reviewer
    List {
        #[arg(long)]
        paper: Option<String>,
    },
}

#[derive(Args, Debug)]
pub struct ReviewArgs {
    pub paper_id: String,

    /// 1 to 5
    #[arg(long)]
    pub rating: String,

    #[arg(long)]
    pub comments: String,

    /// Accept, Minor Revisions, Major Revisions or Reject
    #[arg(long)]
    pub recommendation: String,
}

#[derive(Subcommand, Debug)]
pub enum SessionAction {
    /// Create a session (admin)
    Create(SessionArgs),

    /// List sessions with attendee counts
    List,

    /// Register the active identity for a session
    Register { session_id: String },

    /// Withdraw the active identity from a session
    Unregister { session_id: String },

    /// Delete a session and its registrations (admin)
    Delete { session_id: String },
}

#[derive(Args, Debug)]
pub struct SessionArgs {
    #[arg(long)]
    pub title: String,

    /// YYYY-MM-DD
    #[arg(long)]
    pub date: String,

    /// HH:MM
    #[arg(long)]
    pub start: String,

    /// HH:MM
    #[arg(long)]
    pub end: String,

    #[arg(long)]
    pub room: String,

    #[arg(long)]
    pub track: String,

    #[arg(long)]
    pub description: String,
}

#[derive(Subcommand, Debug)]
pub enum MeetingAction {
    /// Ask a reviewer for a meeting (participant)
    Request {
        /// Reviewer email
        #[arg(long)]
        professor: String,

        /// YYYY-MM-DD
        #[arg(long)]
        date: String,

        /// HH:MM
        #[arg(long)]
        time: String,

        #[arg(long)]
        topic: String,
    },

    /// List meetings of the active identity
    List,

    /// Confirm a meeting request (reviewer)
    Accept { meeting_id: String },

    /// Decline a meeting request (reviewer)
    Decline { meeting_id: String },
}
