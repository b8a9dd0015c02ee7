//! Pure conversation state machine.
//!
//! `advance(session, input)` never touches the store: it validates the
//! answer and says what should happen next. Anything that needs I/O comes
//! back as an [`Effect`] for the controller to carry out.

use chrono::NaiveDate;
use hackbot_core::error::ValidationError;
use hackbot_core::models::{
    Gender, HackathonId, ProfileField, SUPPORTED_LANGUAGES, StageId, TeamId,
};

use crate::validate;

pub const NAME_MAX: usize = 64;
pub const LOCATION_MAX: usize = 128;
pub const TEAM_NAME_MAX: usize = 64;
pub const ROLE_MAX: usize = 64;
pub const FIELD_MAX: usize = 64;
pub const CODE_MAX: usize = 16;

/// Where a participant currently is in a flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogState {
    // Registration
    Offer,
    FirstName,
    LastName,
    BirthDate,
    Gender,
    Location,
    Phone,
    Pinfl,
    // Team creation
    TeamName { hackathon_id: HackathonId },
    TeamRole { hackathon_id: HackathonId },
    TeamField { hackathon_id: HackathonId },
    TeamPortfolio { hackathon_id: HackathonId },
    // Team joining
    JoinCode { hackathon_id: HackathonId },
    JoinRole { hackathon_id: HackathonId, team_id: TeamId },
    JoinPortfolio { hackathon_id: HackathonId, team_id: TeamId },
    // Submission
    SubmitLink { stage_id: StageId },
    // Profile edit
    EditValue { field: ProfileField },
}

/// Answers collected so far in the current flow.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Answers {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub location: Option<String>,
    pub phone: Option<String>,
    pub team_name: Option<String>,
    pub role: Option<String>,
    pub field: Option<String>,
}

/// One participant's in-flight flow.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub state: DialogState,
    pub answers: Answers,
}

impl Session {
    fn at(state: DialogState) -> Self {
        Self {
            state,
            answers: Answers::default(),
        }
    }

    pub fn registration() -> Self {
        Self::at(DialogState::Offer)
    }

    pub fn create_team(hackathon_id: HackathonId) -> Self {
        Self::at(DialogState::TeamName { hackathon_id })
    }

    pub fn join_team(hackathon_id: HackathonId) -> Self {
        Self::at(DialogState::JoinCode { hackathon_id })
    }

    pub fn submit(stage_id: StageId) -> Self {
        Self::at(DialogState::SubmitLink { stage_id })
    }

    pub fn edit(field: ProfileField) -> Self {
        Self::at(DialogState::EditValue { field })
    }
}

/// A participant action fed into the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Text(String),
    /// Phone number shared through the transport's contact button.
    Contact(String),
    Consent(bool),
    /// Value of a choice button (e.g. a gender option).
    Choice(String),
    Skip,
}

/// Completed flow, ready to be persisted as exactly one mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Commit {
    Register(Registration),
    CreateTeam {
        hackathon_id: HackathonId,
        name: String,
        role: String,
        field: String,
        portfolio: Option<String>,
    },
    JoinTeam {
        hackathon_id: HackathonId,
        team_id: TeamId,
        role: String,
        portfolio: Option<String>,
    },
    Submit {
        stage_id: StageId,
        link: String,
    },
    EditField {
        field: ProfileField,
        value: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
    pub gender: Gender,
    pub location: String,
    pub phone: String,
    pub pinfl: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Prompt for the state in `next`.
    Ask,
    /// Answer rejected; prompt the same state again.
    Reprompt(ValidationError),
    /// Consent declined; the offer stays open.
    ConsentRequired,
    /// Input of the wrong kind for this state (e.g. a stray button).
    Unexpected,
    /// The typed code must be looked up before the flow can continue.
    ResolveJoinCode {
        hackathon_id: HackathonId,
        code: String,
    },
    /// Flow finished; `next` is `None`.
    Commit(Commit),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub next: Option<Session>,
    pub effect: Effect,
}

fn ask(state: DialogState, answers: Answers) -> Transition {
    Transition {
        next: Some(Session { state, answers }),
        effect: Effect::Ask,
    }
}

fn stay(state: DialogState, answers: Answers, effect: Effect) -> Transition {
    Transition {
        next: Some(Session { state, answers }),
        effect,
    }
}

fn finish(commit: Commit) -> Transition {
    Transition {
        next: None,
        effect: Effect::Commit(commit),
    }
}

/// Free text, or a choice button's value.
fn text_of(input: &Input) -> Option<&str> {
    match input {
        Input::Text(t) | Input::Choice(t) => Some(t.as_str()),
        _ => None,
    }
}

/// Validate the text answer of a required step and continue with `then`.
fn required<T>(
    state: DialogState,
    answers: Answers,
    input: &Input,
    parse: impl FnOnce(&str) -> Result<T, ValidationError>,
    then: impl FnOnce(T, Answers) -> Transition,
) -> Transition {
    let Some(raw) = text_of(input) else {
        return stay(state, answers, Effect::Unexpected);
    };
    match parse(raw) {
        Ok(value) => then(value, answers),
        Err(e) => stay(state, answers, Effect::Reprompt(e)),
    }
}

/// Like `required`, but a skip yields `None`.
fn optional_link(
    state: DialogState,
    answers: Answers,
    input: &Input,
    then: impl FnOnce(Option<String>, Answers) -> Transition,
) -> Transition {
    match input {
        Input::Skip => then(None, answers),
        Input::Text(t) if validate::is_skip(t) => then(None, answers),
        _ => required(state, answers, input, validate::link, |link, a| then(Some(link), a)),
    }
}

fn edit_value(field: ProfileField, raw: &str) -> Result<String, ValidationError> {
    match field {
        ProfileField::BirthDate => {
            validate::parse_birth_date(raw).map(|d| d.format("%Y-%m-%d").to_string())
        }
        ProfileField::Gender => raw.parse::<Gender>().map(|g| g.as_str().to_string()),
        ProfileField::Language => {
            let code = raw.trim().to_lowercase();
            if SUPPORTED_LANGUAGES.contains(&code.as_str()) {
                Ok(code)
            } else {
                Err(ValidationError::Language)
            }
        }
        ProfileField::Location => validate::text("location", raw, LOCATION_MAX),
        ProfileField::FirstName => validate::text("first name", raw, NAME_MAX),
        ProfileField::LastName => validate::text("last name", raw, NAME_MAX),
    }
}

/// Advance one step.
pub fn advance(session: Session, input: Input) -> Transition {
    use DialogState as S;

    let Session { state, answers } = session;
    match state {
        S::Offer => match input {
            Input::Consent(true) => ask(S::FirstName, answers),
            Input::Consent(false) => stay(state, answers, Effect::ConsentRequired),
            _ => stay(state, answers, Effect::Unexpected),
        },
        S::FirstName => required(
            state,
            answers,
            &input,
            |t| validate::text("first name", t, NAME_MAX),
            |v, mut a| {
                a.first_name = Some(v);
                ask(S::LastName, a)
            },
        ),
        S::LastName => required(
            state,
            answers,
            &input,
            |t| validate::text("last name", t, NAME_MAX),
            |v, mut a| {
                a.last_name = Some(v);
                ask(S::BirthDate, a)
            },
        ),
        S::BirthDate => required(state, answers, &input, validate::parse_birth_date, |d, mut a| {
            a.birth_date = Some(d);
            ask(S::Gender, a)
        }),
        S::Gender => required(state, answers, &input, |t| t.parse::<Gender>(), |g, mut a| {
            a.gender = Some(g);
            ask(S::Location, a)
        }),
        S::Location => required(
            state,
            answers,
            &input,
            |t| validate::text("location", t, LOCATION_MAX),
            |v, mut a| {
                a.location = Some(v);
                ask(S::Phone, a)
            },
        ),
        S::Phone => match &input {
            // A shared contact is trusted as-is.
            Input::Contact(number) if !number.trim().is_empty() => {
                let mut answers = answers;
                answers.phone = Some(number.trim().to_string());
                ask(S::Pinfl, answers)
            }
            _ => required(state, answers, &input, validate::phone, |p, mut a| {
                a.phone = Some(p);
                ask(S::Pinfl, a)
            }),
        },
        S::Pinfl => required(state, answers, &input, validate::national_id, |pinfl, a| {
            match registration(a, pinfl) {
                Some(reg) => finish(Commit::Register(reg)),
                // Lost answers cannot be recovered; start over.
                None => ask(S::Offer, Answers::default()),
            }
        }),

        S::TeamName { hackathon_id } => required(
            state,
            answers,
            &input,
            |t| validate::text("team name", t, TEAM_NAME_MAX),
            |v, mut a| {
                a.team_name = Some(v);
                ask(S::TeamRole { hackathon_id }, a)
            },
        ),
        S::TeamRole { hackathon_id } => required(
            state,
            answers,
            &input,
            |t| validate::text("role", t, ROLE_MAX),
            |v, mut a| {
                a.role = Some(v);
                ask(S::TeamField { hackathon_id }, a)
            },
        ),
        S::TeamField { hackathon_id } => required(
            state,
            answers,
            &input,
            |t| validate::text("field", t, FIELD_MAX),
            |v, mut a| {
                a.field = Some(v);
                ask(S::TeamPortfolio { hackathon_id }, a)
            },
        ),
        S::TeamPortfolio { hackathon_id } => {
            optional_link(state, answers, &input, |portfolio, a| {
                match (a.team_name, a.role, a.field) {
                    (Some(name), Some(role), Some(field)) => finish(Commit::CreateTeam {
                        hackathon_id,
                        name,
                        role,
                        field,
                        portfolio,
                    }),
                    _ => ask(S::TeamName { hackathon_id }, Answers::default()),
                }
            })
        }

        S::JoinCode { hackathon_id } => required(
            state,
            answers,
            &input,
            |t| validate::text("join code", t, CODE_MAX),
            |code, a| {
                stay(
                    S::JoinCode { hackathon_id },
                    a,
                    Effect::ResolveJoinCode { hackathon_id, code },
                )
            },
        ),
        S::JoinRole {
            hackathon_id,
            team_id,
        } => required(
            state,
            answers,
            &input,
            |t| validate::text("role", t, ROLE_MAX),
            |v, mut a| {
                a.role = Some(v);
                ask(
                    S::JoinPortfolio {
                        hackathon_id,
                        team_id,
                    },
                    a,
                )
            },
        ),
        S::JoinPortfolio {
            hackathon_id,
            team_id,
        } => optional_link(state, answers, &input, |portfolio, a| match a.role {
            Some(role) => finish(Commit::JoinTeam {
                hackathon_id,
                team_id,
                role,
                portfolio,
            }),
            None => ask(
                S::JoinRole {
                    hackathon_id,
                    team_id,
                },
                Answers::default(),
            ),
        }),

        S::SubmitLink { stage_id } => required(state, answers, &input, validate::link, |link, _| {
            finish(Commit::Submit { stage_id, link })
        }),

        S::EditValue { field } => required(
            state,
            answers,
            &input,
            |t| edit_value(field, t),
            |value, _| finish(Commit::EditField { field, value }),
        ),
    }
}

/// Continue a join flow once the controller found the team behind the code.
pub fn code_resolved(session: Session, team_id: TeamId) -> Transition {
    match session.state {
        DialogState::JoinCode { hackathon_id } => ask(
            DialogState::JoinRole {
                hackathon_id,
                team_id,
            },
            session.answers,
        ),
        state => stay(state, session.answers, Effect::Unexpected),
    }
}

fn registration(a: Answers, pinfl: String) -> Option<Registration> {
    Some(Registration {
        first_name: a.first_name?,
        last_name: a.last_name?,
        birth_date: a.birth_date?,
        gender: a.gender?,
        location: a.location?,
        phone: a.phone?,
        pinfl,
    })
}
