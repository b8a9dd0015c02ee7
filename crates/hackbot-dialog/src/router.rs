//! Button interaction routing.
//!
//! Callback data is `tag` or `tag:arg`. The set of tags is closed, so a
//! static table maps each one to its parser.

use hackbot_core::models::{Gender, HackathonId, ProfileField, StageId};

/// A decoded button press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    Consent(bool),
    Hackathons,
    Hackathon(HackathonId),
    CreateTeam(HackathonId),
    JoinTeam(HackathonId),
    LeaveTeam(HackathonId),
    Stages(HackathonId),
    Submit(StageId),
    Profile,
    Edit(ProfileField),
    Gender(Gender),
    Language(String),
    Skip,
    Help,
}

type Parser = fn(&str) -> Option<Interaction>;

const ROUTES: &[(&str, Parser)] = &[
    ("consent", |arg| match arg {
        "yes" => Some(Interaction::Consent(true)),
        "no" => Some(Interaction::Consent(false)),
        _ => None,
    }),
    ("hackathons", |_| Some(Interaction::Hackathons)),
    ("hackathon", |arg| arg.parse().ok().map(Interaction::Hackathon)),
    ("create_team", |arg| arg.parse().ok().map(Interaction::CreateTeam)),
    ("join_team", |arg| arg.parse().ok().map(Interaction::JoinTeam)),
    ("leave_team", |arg| arg.parse().ok().map(Interaction::LeaveTeam)),
    ("stages", |arg| arg.parse().ok().map(Interaction::Stages)),
    ("submit", |arg| arg.parse().ok().map(Interaction::Submit)),
    ("profile", |_| Some(Interaction::Profile)),
    ("edit", |arg| ProfileField::from_column(arg).map(Interaction::Edit)),
    ("gender", |arg| arg.parse().ok().map(Interaction::Gender)),
    ("lang", |arg| Some(Interaction::Language(arg.to_string()))),
    ("skip", |_| Some(Interaction::Skip)),
    ("help", |_| Some(Interaction::Help)),
];

impl Interaction {
    /// Decode callback data; unknown tags or bad arguments yield `None`.
    pub fn parse(data: &str) -> Option<Self> {
        let (tag, arg) = data.split_once(':').unwrap_or((data, ""));
        ROUTES
            .iter()
            .find(|(name, _)| *name == tag)
            .and_then(|(_, parse)| parse(arg))
    }

    /// Encode back into callback data.
    pub fn data(&self) -> String {
        match self {
            Self::Consent(yes) => format!("consent:{}", if *yes { "yes" } else { "no" }),
            Self::Hackathons => "hackathons".into(),
            Self::Hackathon(id) => format!("hackathon:{id}"),
            Self::CreateTeam(id) => format!("create_team:{id}"),
            Self::JoinTeam(id) => format!("join_team:{id}"),
            Self::LeaveTeam(id) => format!("leave_team:{id}"),
            Self::Stages(id) => format!("stages:{id}"),
            Self::Submit(id) => format!("submit:{id}"),
            Self::Profile => "profile".into(),
            Self::Edit(field) => format!("edit:{}", field.column()),
            Self::Gender(g) => format!("gender:{}", g.as_str()),
            Self::Language(code) => format!("lang:{code}"),
            Self::Skip => "skip".into(),
            Self::Help => "help".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_tags() {
        assert_eq!(Interaction::parse("consent:yes"), Some(Interaction::Consent(true)));
        assert_eq!(Interaction::parse("hackathon:12"), Some(Interaction::Hackathon(12)));
        assert_eq!(
            Interaction::parse("edit:birth_date"),
            Some(Interaction::Edit(ProfileField::BirthDate))
        );
        assert_eq!(Interaction::parse("gender:female"), Some(Interaction::Gender(Gender::Female)));
        assert_eq!(Interaction::parse("lang:uz"), Some(Interaction::Language("uz".into())));
        assert_eq!(Interaction::parse("skip"), Some(Interaction::Skip));
    }

    #[test]
    fn test_rejects_unknown_or_malformed() {
        assert_eq!(Interaction::parse("teleport:1"), None);
        assert_eq!(Interaction::parse("submit:abc"), None);
        assert_eq!(Interaction::parse("edit:pinfl"), None);
        assert_eq!(Interaction::parse("consent:maybe"), None);
    }

    #[test]
    fn test_data_is_parseable() {
        for interaction in [
            Interaction::JoinTeam(4),
            Interaction::Edit(ProfileField::Location),
            Interaction::Gender(Gender::Male),
            Interaction::Consent(false),
        ] {
            assert_eq!(Interaction::parse(&interaction.data()), Some(interaction));
        }
    }
}
