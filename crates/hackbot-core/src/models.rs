//! Domain models owned by the store.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Chat-platform user id of a participant.
pub type ParticipantId = i64;
pub type HackathonId = i64;
pub type StageId = i64;
pub type TeamId = i64;

/// Languages a participant may pick.
pub const SUPPORTED_LANGUAGES: &[&str] = &["en", "uz", "ru"];
pub const DEFAULT_LANGUAGE: &str = "en";

/// A registered participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
    pub gender: Gender,
    pub location: String,
    pub phone: String,
    /// 14-digit national identification token.
    pub pinfl: String,
    pub language: String,
    pub consent_at: DateTime<Utc>,
    pub registration_complete: bool,
    pub created_at: DateTime<Utc>,
}

impl Participant {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub const ALL: [Gender; 2] = [Gender::Male, Gender::Female];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
        }
    }
}

impl std::str::FromStr for Gender {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" => Ok(Self::Male),
            "female" | "f" => Ok(Self::Female),
            _ => Err(ValidationError::Gender),
        }
    }
}

/// Profile columns that may be edited after registration.
/// The store refuses anything outside this set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
    FirstName,
    LastName,
    BirthDate,
    Gender,
    Location,
    Language,
}

impl ProfileField {
    /// Fields offered by the edit-profile menu (language has its own command).
    pub const EDITABLE: [ProfileField; 5] = [
        ProfileField::FirstName,
        ProfileField::LastName,
        ProfileField::BirthDate,
        ProfileField::Gender,
        ProfileField::Location,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
            Self::BirthDate => "birth_date",
            Self::Gender => "gender",
            Self::Location => "location",
            Self::Language => "language",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::FirstName => "First name",
            Self::LastName => "Last name",
            Self::BirthDate => "Birth date",
            Self::Gender => "Gender",
            Self::Location => "Location",
            Self::Language => "Language",
        }
    }

    pub fn from_column(s: &str) -> Option<Self> {
        match s {
            "first_name" => Some(Self::FirstName),
            "last_name" => Some(Self::LastName),
            "birth_date" => Some(Self::BirthDate),
            "gender" => Some(Self::Gender),
            "location" => Some(Self::Location),
            "language" => Some(Self::Language),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hackathon {
    pub id: HackathonId,
    pub name: String,
    pub description: String,
    pub deadline: Option<DateTime<Utc>>,
    pub prize_pool: Option<String>,
    pub is_active: bool,
}

/// A dated sub-round of a hackathon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub id: StageId,
    pub hackathon_id: HackathonId,
    pub number: u32,
    pub name: String,
    pub description: String,
    pub deadline: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl Stage {
    /// Submissions are accepted while the stage is active and its deadline
    /// (if any) has not passed.
    pub fn accepts_submissions(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.deadline.is_none_or(|d| now <= d)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub hackathon_id: HackathonId,
    pub name: String,
    /// Unique, immutable join code.
    pub code: String,
    pub leader_id: ParticipantId,
    pub field: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    pub team_id: TeamId,
    pub participant_id: ParticipantId,
    pub role: String,
    pub portfolio: Option<String>,
    pub is_leader: bool,
    pub joined_at: DateTime<Utc>,
}

/// What happened when a member left a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Departure {
    Removed,
    /// The leader left; the given member now leads.
    LeaderTransferred(ParticipantId),
    /// The last member left and the team is gone.
    TeamDeleted,
}

/// Input for creating a team together with its leader's membership.
#[derive(Debug, Clone)]
pub struct NewTeam {
    pub hackathon_id: HackathonId,
    pub name: String,
    pub leader_id: ParticipantId,
    pub leader_role: String,
    pub leader_portfolio: Option<String>,
    pub field: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewMembership {
    pub team_id: TeamId,
    pub participant_id: ParticipantId,
    pub role: String,
    pub portfolio: Option<String>,
    pub is_leader: bool,
}

/// At most one per (stage, team); resubmission overwrites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub stage_id: StageId,
    pub team_id: TeamId,
    pub participant_id: ParticipantId,
    pub link: String,
    pub submitted_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn stage(active: bool, deadline: Option<DateTime<Utc>>) -> Stage {
        Stage {
            id: 1,
            hackathon_id: 1,
            number: 1,
            name: "Idea".into(),
            description: String::new(),
            deadline,
            is_active: active,
        }
    }

    #[test]
    fn test_submission_window() {
        let now = Utc::now();
        assert!(stage(true, None).accepts_submissions(now));
        assert!(stage(true, Some(now)).accepts_submissions(now));
        assert!(stage(true, Some(now + Duration::hours(1))).accepts_submissions(now));
        assert!(!stage(true, Some(now - Duration::seconds(1))).accepts_submissions(now));
        assert!(!stage(false, None).accepts_submissions(now));
    }

    #[test]
    fn test_gender_parse() {
        assert_eq!("Male".parse::<Gender>(), Ok(Gender::Male));
        assert_eq!(" f ".parse::<Gender>(), Ok(Gender::Female));
        assert_eq!("other".parse::<Gender>(), Err(ValidationError::Gender));
    }

    #[test]
    fn test_profile_field_columns() {
        for field in ProfileField::EDITABLE {
            assert_eq!(ProfileField::from_column(field.column()), Some(field));
        }
        assert_eq!(ProfileField::from_column("pinfl"), None);
    }
}
