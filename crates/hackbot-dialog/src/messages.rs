//! Reply texts and keyboards (English).

use chrono::{DateTime, Utc};
use hackbot_core::config::SupportConfig;
use hackbot_core::error::ValidationError;
use hackbot_core::models::{
    Gender, Hackathon, Participant, ParticipantId, ProfileField, Stage, Submission, Team,
    TeamMember,
};
use hackbot_core::types::{Button, Keyboard, OutgoingMessage};

use crate::machine::DialogState;
use crate::router::Interaction;

fn button(label: impl Into<String>, interaction: Interaction) -> Button {
    Button::new(label, interaction.data())
}

fn skip_keyboard() -> Keyboard {
    Keyboard::Inline(vec![vec![button("Skip", Interaction::Skip)]])
}

fn gender_keyboard() -> Keyboard {
    Keyboard::Inline(vec![
        Gender::ALL
            .iter()
            .map(|g| button(g.label(), Interaction::Gender(*g)))
            .collect(),
    ])
}

pub fn main_menu() -> Keyboard {
    Keyboard::Inline(vec![
        vec![button("🏆 Hackathons", Interaction::Hackathons)],
        vec![
            button("👤 Profile", Interaction::Profile),
            button("❓ Help", Interaction::Help),
        ],
    ])
}

fn format_deadline(deadline: Option<DateTime<Utc>>) -> String {
    deadline
        .map(|d| d.format("%d.%m.%Y %H:%M UTC").to_string())
        .unwrap_or_else(|| "no deadline".into())
}

/// The question asked in each state.
pub fn prompt(to: ParticipantId, state: &DialogState) -> OutgoingMessage {
    let (text, keyboard) = match state {
        DialogState::Offer => (
            "👋 Welcome! To take part we need to store your personal data \
             (name, birth date, contacts and national ID) for the event. Do you agree?"
                .to_string(),
            Some(Keyboard::Inline(vec![vec![
                button("✅ I agree", Interaction::Consent(true)),
                button("❌ Decline", Interaction::Consent(false)),
            ]])),
        ),
        DialogState::FirstName => ("What is your first name?".into(), Some(Keyboard::Remove)),
        DialogState::LastName => ("What is your last name?".into(), None),
        DialogState::BirthDate => ("Your birth date (DD.MM.YYYY)?".into(), None),
        DialogState::Gender => ("Your gender?".into(), Some(gender_keyboard())),
        DialogState::Location => ("Where do you live (city/region)?".into(), None),
        DialogState::Phone => (
            "Share your phone number with the button below or type it.".into(),
            Some(Keyboard::RequestContact("📱 Share phone number".into())),
        ),
        DialogState::Pinfl => (
            "Your national ID (PINFL, 14 digits)?".into(),
            Some(Keyboard::Remove),
        ),
        DialogState::TeamName { .. } => ("Team name?".into(), None),
        DialogState::TeamRole { .. } | DialogState::JoinRole { .. } => (
            "Your role in the team (e.g. Backend, Designer)?".into(),
            None,
        ),
        DialogState::TeamField { .. } => ("Team field or category (e.g. EdTech)?".into(), None),
        DialogState::TeamPortfolio { .. } | DialogState::JoinPortfolio { .. } => (
            "Portfolio link (optional). Send a link, or \"-\" to skip.".into(),
            Some(skip_keyboard()),
        ),
        DialogState::JoinCode { .. } => ("Enter the team's join code.".into(), None),
        DialogState::SubmitLink { .. } => (
            "Send the link to your work (http:// or https://).".into(),
            None,
        ),
        DialogState::EditValue { field } => (
            format!("New value for {}?", field.label().to_lowercase()),
            match field {
                ProfileField::Gender => Some(gender_keyboard()),
                _ => None,
            },
        ),
    };
    let message = OutgoingMessage::text(to, text);
    match keyboard {
        Some(k) => message.with_keyboard(k),
        None => message,
    }
}

pub fn invalid(err: &ValidationError) -> String {
    match err {
        ValidationError::BirthDate => {
            "⚠️ That date is not valid. Use DD.MM.YYYY, for example 23.10.2007.".into()
        }
        ValidationError::NationalId => "⚠️ The national ID must be exactly 14 digits.".into(),
        ValidationError::Link => {
            "⚠️ That is not a valid link. It must start with http:// or https://.".into()
        }
        ValidationError::Phone => "⚠️ That phone number is not valid.".into(),
        ValidationError::Gender => "⚠️ Please pick one of the options.".into(),
        other => format!("⚠️ {}.", capitalize(&other.to_string())),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn consent_required() -> &'static str {
    "Registration needs your consent. You can agree whenever you are ready."
}

pub fn unexpected() -> &'static str {
    "Please answer the question above."
}

pub fn registered(first_name: &str) -> String {
    format!("🎉 Registration complete, {first_name}! Pick a hackathon to get started.")
}

pub fn welcome_back(first_name: &str) -> String {
    format!("👋 Welcome back, {first_name}!")
}

pub fn registration_required() -> &'static str {
    "Please register first with /start."
}

pub fn cancelled() -> &'static str {
    "Cancelled. Nothing was saved."
}

pub fn nothing_to_cancel() -> &'static str {
    "There is nothing to cancel."
}

pub fn idle() -> &'static str {
    "Use the menu below, or /help."
}

pub fn unknown_command() -> &'static str {
    "Unknown command. Try /help."
}

pub fn generic_failure() -> &'static str {
    "😕 Something went wrong. Please try again later."
}

pub fn help(support: &SupportConfig) -> String {
    let mut text = String::from(
        "ℹ️ Commands:\n\
         /start - register or open the menu\n\
         /hackathons - browse hackathons\n\
         /profile - view or edit your profile\n\
         /language - change language\n\
         /cancel - abandon the current step\n",
    );
    text.push_str(&format!("\nSupport: {}", support.email));
    if let Some(faq) = &support.faq_url {
        text.push_str(&format!("\nFAQ: {faq}"));
    }
    text
}

pub fn hackathon_list(to: ParticipantId, hackathons: &[Hackathon]) -> OutgoingMessage {
    if hackathons.is_empty() {
        return OutgoingMessage::text(to, "There are no active hackathons right now.");
    }
    let rows = hackathons
        .iter()
        .map(|h| vec![button(format!("🏆 {}", h.name), Interaction::Hackathon(h.id))])
        .collect();
    OutgoingMessage::text(to, "Active hackathons:").with_keyboard(Keyboard::Inline(rows))
}

pub fn hackathon_details(
    to: ParticipantId,
    hackathon: &Hackathon,
    team: Option<(&Team, &[(TeamMember, String)])>,
) -> OutgoingMessage {
    let mut text = format!(
        "🏆 {}\n\n{}\n\n⏰ Deadline: {}",
        hackathon.name,
        hackathon.description,
        format_deadline(hackathon.deadline)
    );
    if let Some(prize) = &hackathon.prize_pool {
        text.push_str(&format!("\n💰 Prize pool: {prize}"));
    }
    let rows = match team {
        Some((team, members)) => {
            text.push_str("\n\n");
            text.push_str(&team_card(team, members));
            vec![
                vec![button("📋 Stages", Interaction::Stages(hackathon.id))],
                vec![button("🚪 Leave team", Interaction::LeaveTeam(hackathon.id))],
            ]
        }
        None => vec![
            vec![
                button("➕ Create team", Interaction::CreateTeam(hackathon.id)),
                button("🔑 Join team", Interaction::JoinTeam(hackathon.id)),
            ],
            vec![button("📋 Stages", Interaction::Stages(hackathon.id))],
        ],
    };
    OutgoingMessage::text(to, text).with_keyboard(Keyboard::Inline(rows))
}

/// Team summary; `members` pairs each membership with a display name.
pub fn team_card(team: &Team, members: &[(TeamMember, String)]) -> String {
    let mut text = format!("👥 Team: {}\n🔑 Code: {}", team.name, team.code);
    if let Some(field) = &team.field {
        text.push_str(&format!("\n🎯 Field: {field}"));
    }
    text.push_str(&format!("\nMembers ({}):", members.len()));
    for (m, name) in members {
        let marker = if m.is_leader { " 👑" } else { "" };
        text.push_str(&format!("\n• {name} ({}){marker}", m.role));
    }
    text
}

pub fn stage_list(
    to: ParticipantId,
    hackathon: &Hackathon,
    stages: &[(Stage, Option<Submission>)],
    now: DateTime<Utc>,
) -> OutgoingMessage {
    if stages.is_empty() {
        return OutgoingMessage::text(to, format!("{} has no stages yet.", hackathon.name));
    }
    let mut text = format!("📋 Stages of {}:", hackathon.name);
    let mut rows = Vec::new();
    for (stage, submission) in stages {
        let open = stage.accepts_submissions(now);
        text.push_str(&format!(
            "\n\n{} Stage {}: {}\n{}\n⏰ {}",
            if open { "🟢" } else { "🔴" },
            stage.number,
            stage.name,
            stage.description,
            format_deadline(stage.deadline)
        ));
        if let Some(sub) = submission {
            text.push_str(&format!("\n📎 Submitted: {}", sub.link));
        }
        if open {
            rows.push(vec![button(
                format!("📤 Submit stage {}", stage.number),
                Interaction::Submit(stage.id),
            )]);
        }
    }
    let message = OutgoingMessage::text(to, text);
    if rows.is_empty() {
        message
    } else {
        message.with_keyboard(Keyboard::Inline(rows))
    }
}

pub fn profile(to: ParticipantId, p: &Participant) -> OutgoingMessage {
    let text = format!(
        "👤 {}\n🎂 {}\n⚧ {}\n📍 {}\n📱 {}\n🌐 {}",
        p.full_name(),
        p.birth_date.format("%d.%m.%Y"),
        p.gender.label(),
        p.location,
        p.phone,
        p.language
    );
    let rows = ProfileField::EDITABLE
        .iter()
        .map(|f| vec![button(format!("✏️ {}", f.label()), Interaction::Edit(*f))])
        .collect();
    OutgoingMessage::text(to, text).with_keyboard(Keyboard::Inline(rows))
}

pub fn language_picker(to: ParticipantId) -> OutgoingMessage {
    let row = [("🇬🇧 English", "en"), ("🇺🇿 O'zbek", "uz"), ("🇷🇺 Русский", "ru")]
        .into_iter()
        .map(|(label, code)| button(label, Interaction::Language(code.into())))
        .collect();
    OutgoingMessage::text(to, "Choose your language:").with_keyboard(Keyboard::Inline(vec![row]))
}

pub fn language_saved(code: &str) -> String {
    format!("🌐 Language set to {code}.")
}

pub fn unsupported_language() -> &'static str {
    "That language is not supported."
}

pub fn hackathon_unavailable() -> &'static str {
    "This hackathon is not available."
}

pub fn already_in_team(team: &Team) -> String {
    format!("You are already in team {} for this hackathon.", team.name)
}

pub fn duplicate_membership() -> &'static str {
    "❌ You already belong to a team in this hackathon."
}

pub fn team_created(team: &Team) -> String {
    format!(
        "✅ Team {} created! Share this join code with your teammates: {}",
        team.name, team.code
    )
}

pub fn unknown_code() -> &'static str {
    "❌ No team with that code in this hackathon. Check the code and try again."
}

pub fn team_full(max: usize) -> String {
    format!("❌ This team is full ({max} members).")
}

pub fn team_gone() -> &'static str {
    "❌ That team no longer exists."
}

pub fn joined_team(team: &Team) -> String {
    format!("✅ You joined team {}!", team.name)
}

pub fn member_joined(name: &str, team: &Team) -> String {
    format!("➕ {name} joined your team {}.", team.name)
}

pub fn not_in_team() -> &'static str {
    "You are not in a team for this hackathon."
}

pub fn left_team(team: &Team) -> String {
    format!("🚪 You left team {}.", team.name)
}

pub fn left_and_deleted(team: &Team) -> String {
    format!("🚪 You left team {}. It had no other members and was removed.", team.name)
}

pub fn new_leader(team: &Team) -> String {
    format!("👑 You are now the leader of team {}.", team.name)
}

pub fn stage_unknown() -> &'static str {
    "That stage does not exist."
}

pub fn submission_closed() -> &'static str {
    "⛔ Submissions for this stage are closed."
}

pub fn team_required() -> &'static str {
    "You need a team in this hackathon before you can submit."
}

pub fn submission_saved(stage: &Stage, replaced: bool) -> String {
    if replaced {
        format!("✅ Submission for stage {} updated.", stage.number)
    } else {
        format!("✅ Submission for stage {} saved.", stage.number)
    }
}

pub fn field_updated(field: ProfileField) -> String {
    format!("✅ {} updated.", field.label())
}
