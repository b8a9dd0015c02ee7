//! Error taxonomy shared by every Hackbot crate.

use thiserror::Error;

/// Result alias used across the workspace.
pub type Result<T> = std::result::Result<T, HackError>;

#[derive(Debug, Error)]
pub enum HackError {
    /// Malformed participant input. Recovered locally by re-prompting.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Conflict: {0}")]
    Conflict(Conflict),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A single outbound message could not be delivered.
    #[error("Delivery error: {0}")]
    Delivery(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Channel error: {0}")]
    Channel(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HackError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Returns the conflict kind when this is a uniqueness/capacity conflict.
    pub fn conflict(&self) -> Option<Conflict> {
        match self {
            Self::Conflict(c) => Some(*c),
            _ => None,
        }
    }
}

impl From<Conflict> for HackError {
    fn from(c: Conflict) -> Self {
        Self::Conflict(c)
    }
}

/// Uniqueness or capacity conflicts raised by the store or the team registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Conflict {
    /// The participant already belongs to a team of this hackathon
    /// (or already is a member of this very team).
    #[error("participant already belongs to a team in this hackathon")]
    DuplicateMembership,
    /// A generated join code is already in use.
    #[error("join code already taken")]
    JoinCodeTaken,
    #[error("team is full")]
    TeamFull,
}

/// Rejected dialog input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("birth date must look like DD.MM.YYYY")]
    BirthDate,
    #[error("national id must be exactly 14 digits")]
    NationalId,
    #[error("link must be an absolute http(s) URL")]
    Link,
    #[error("phone number is not valid")]
    Phone,
    #[error("unknown gender option")]
    Gender,
    #[error("unsupported language")]
    Language,
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("{0} is too long (max {1} characters)")]
    TooLong(&'static str, usize),
}
