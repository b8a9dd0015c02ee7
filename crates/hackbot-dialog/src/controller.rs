//! Dialog controller: applies conversation steps against the store.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use hackbot_core::config::SupportConfig;
use hackbot_core::error::{Conflict, HackError, Result};
use hackbot_core::models::{
    DEFAULT_LANGUAGE, HackathonId, NewMembership, NewTeam, Participant, ParticipantId,
    ProfileField, SUPPORTED_LANGUAGES, StageId, TeamId, TeamMember,
};
use hackbot_core::traits::Store;
use hackbot_core::types::{IncomingMessage, OutgoingMessage, Payload};
use hackbot_teams::{Departure, TeamRegistry};
use tokio::sync::Mutex;

use crate::machine::{self, Commit, DialogState, Effect, Input, Registration, Session};
use crate::messages;
use crate::router::Interaction;

type Replies = Vec<OutgoingMessage>;
type SessionSlot = Arc<Mutex<Option<Session>>>;

/// Per-participant session slots. Holding a slot's lock is what serializes
/// steps for one participant; different participants never contend.
#[derive(Default)]
struct SessionTable {
    slots: std::sync::Mutex<HashMap<ParticipantId, SessionSlot>>,
}

impl SessionTable {
    fn slot(&self, id: ParticipantId) -> SessionSlot {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.entry(id).or_default().clone()
    }

    /// Drop an idle slot nobody else is holding.
    fn release(&self, id: ParticipantId, slot: &SessionSlot) {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        let idle = Arc::strong_count(slot) == 2
            && slot.try_lock().map(|s| s.is_none()).unwrap_or(false);
        if idle {
            slots.remove(&id);
        }
    }
}

fn text(to: ParticipantId, content: impl Into<String>) -> OutgoingMessage {
    OutgoingMessage::text(to, content)
}

/// Routes every inbound event of every participant.
pub struct DialogController {
    store: Arc<dyn Store>,
    teams: Arc<TeamRegistry>,
    support: SupportConfig,
    sessions: SessionTable,
}

impl DialogController {
    pub fn new(store: Arc<dyn Store>, teams: Arc<TeamRegistry>, support: SupportConfig) -> Self {
        Self {
            store,
            teams,
            support,
            sessions: SessionTable::default(),
        }
    }

    /// Handle one inbound event and return the replies to send.
    ///
    /// Never fails: an unexpected store error discards the participant's
    /// flow and answers with a generic failure message.
    pub async fn handle(&self, msg: IncomingMessage) -> Replies {
        let who = msg.sender_id;
        let slot = self.sessions.slot(who);
        let mut session = slot.lock().await;

        let replies = match self.dispatch(&msg, &mut session).await {
            Ok(replies) => replies,
            Err(e) => {
                tracing::error!("Dialog step failed for participant {who}: {e}");
                *session = None;
                vec![text(who, messages::generic_failure())]
            }
        };

        let idle = session.is_none();
        drop(session);
        if idle {
            self.sessions.release(who, &slot);
        }
        replies
    }

    /// Current dialog state of a participant, if a flow is in progress.
    pub async fn session_state(&self, who: ParticipantId) -> Option<DialogState> {
        let slot = self.sessions.slot(who);
        let state = slot.lock().await.as_ref().map(|s| s.state);
        if state.is_none() {
            self.sessions.release(who, &slot);
        }
        state
    }

    async fn dispatch(&self, msg: &IncomingMessage, session: &mut Option<Session>) -> Result<Replies> {
        match &msg.payload {
            Payload::Command(cmd) => self.on_command(msg, cmd, session).await,
            Payload::Callback(data) => match Interaction::parse(data) {
                Some(interaction) => self.on_interaction(msg, interaction, session).await,
                None => {
                    tracing::debug!("Ignoring unknown interaction '{data}' from {}", msg.sender_id);
                    Ok(Vec::new())
                }
            },
            Payload::Text(t) => self.on_input(msg, Input::Text(t.clone()), session).await,
            Payload::Contact(phone) => self.on_input(msg, Input::Contact(phone.clone()), session).await,
        }
    }

    /// Registered participant, or `None` while registration is incomplete.
    async fn participant(&self, who: ParticipantId) -> Result<Option<Participant>> {
        Ok(self
            .store
            .get_participant(who)
            .await?
            .filter(|p| p.registration_complete))
    }

    fn ask_current(&self, who: ParticipantId, session: &Option<Session>) -> Replies {
        session
            .iter()
            .map(|s| messages::prompt(who, &s.state))
            .collect()
    }

    fn begin(&self, who: ParticipantId, session: &mut Option<Session>, fresh: Session) -> Replies {
        tracing::debug!("Participant {who} starts flow at {:?}", fresh.state);
        let reply = messages::prompt(who, &fresh.state);
        *session = Some(fresh);
        vec![reply]
    }

    // ── Commands ──────────────────────────────────────

    async fn on_command(
        &self,
        msg: &IncomingMessage,
        cmd: &str,
        session: &mut Option<Session>,
    ) -> Result<Replies> {
        let who = msg.sender_id;
        match cmd {
            "start" => {
                if let Some(p) = self.participant(who).await? {
                    *session = None;
                    return Ok(vec![
                        text(who, messages::welcome_back(&p.first_name))
                            .with_keyboard(messages::main_menu()),
                    ]);
                }
                Ok(self.begin(who, session, Session::registration()))
            }
            "cancel" => Ok(match session.take() {
                Some(abandoned) => {
                    tracing::debug!("Participant {who} cancelled at {:?}", abandoned.state);
                    vec![text(who, messages::cancelled()).with_keyboard(messages::main_menu())]
                }
                None => vec![text(who, messages::nothing_to_cancel())],
            }),
            "help" => Ok(vec![text(who, messages::help(&self.support))]),
            "hackathons" => self.show_hackathons(who).await,
            "profile" => self.show_profile(who).await,
            "language" => match self.participant(who).await? {
                Some(_) => Ok(vec![messages::language_picker(who)]),
                None => Ok(vec![text(who, messages::registration_required())]),
            },
            _ => Ok(vec![text(who, messages::unknown_command())]),
        }
    }

    // ── Buttons ───────────────────────────────────────

    async fn on_interaction(
        &self,
        msg: &IncomingMessage,
        interaction: Interaction,
        session: &mut Option<Session>,
    ) -> Result<Replies> {
        let who = msg.sender_id;
        match interaction {
            Interaction::Consent(yes) => self.on_input(msg, Input::Consent(yes), session).await,
            Interaction::Gender(g) => {
                self.on_input(msg, Input::Choice(g.as_str().to_string()), session)
                    .await
            }
            Interaction::Skip => self.on_input(msg, Input::Skip, session).await,
            Interaction::Hackathons => self.show_hackathons(who).await,
            Interaction::Hackathon(id) => self.show_hackathon(who, id).await,
            Interaction::CreateTeam(id) => {
                self.begin_team_flow(who, id, session, Session::create_team(id))
                    .await
            }
            Interaction::JoinTeam(id) => {
                self.begin_team_flow(who, id, session, Session::join_team(id))
                    .await
            }
            Interaction::LeaveTeam(id) => self.leave_team(who, id).await,
            Interaction::Stages(id) => self.show_stages(who, id).await,
            Interaction::Submit(stage_id) => self.begin_submission(who, stage_id, session).await,
            Interaction::Profile => self.show_profile(who).await,
            Interaction::Edit(field) => {
                if self.participant(who).await?.is_none() {
                    return Ok(vec![text(who, messages::registration_required())]);
                }
                Ok(self.begin(who, session, Session::edit(field)))
            }
            Interaction::Language(code) => self.set_language(who, &code).await,
            Interaction::Help => Ok(vec![text(who, messages::help(&self.support))]),
        }
    }

    // ── Flow steps ────────────────────────────────────

    async fn on_input(
        &self,
        msg: &IncomingMessage,
        input: Input,
        session: &mut Option<Session>,
    ) -> Result<Replies> {
        let who = msg.sender_id;
        let Some(current) = session.take() else {
            return Ok(vec![text(who, messages::idle()).with_keyboard(messages::main_menu())]);
        };
        let from = current.state;
        let transition = machine::advance(current, input);
        *session = transition.next;
        tracing::debug!(
            "Participant {who}: {from:?} → {:?}",
            session.as_ref().map(|s| s.state)
        );

        match transition.effect {
            Effect::Ask => Ok(self.ask_current(who, session)),
            Effect::Reprompt(err) => {
                let mut out = vec![text(who, messages::invalid(&err))];
                out.extend(self.ask_current(who, session));
                Ok(out)
            }
            Effect::ConsentRequired => {
                let mut out = vec![text(who, messages::consent_required())];
                out.extend(self.ask_current(who, session));
                Ok(out)
            }
            Effect::Unexpected => {
                let mut out = vec![text(who, messages::unexpected())];
                out.extend(self.ask_current(who, session));
                Ok(out)
            }
            Effect::ResolveJoinCode { hackathon_id, code } => {
                self.resolve_join_code(who, hackathon_id, &code, session)
                    .await
            }
            Effect::Commit(commit) => self.commit(msg, commit).await,
        }
    }

    async fn resolve_join_code(
        &self,
        who: ParticipantId,
        hackathon_id: HackathonId,
        code: &str,
        session: &mut Option<Session>,
    ) -> Result<Replies> {
        // Unknown codes are correctable: stay on the code prompt.
        let Some(team) = self.teams.resolve_code(code, hackathon_id).await? else {
            let mut out = vec![text(who, messages::unknown_code())];
            out.extend(self.ask_current(who, session));
            return Ok(out);
        };
        let members = self.store.get_team_members(team.id).await?;
        if members.len() >= self.teams.max_team_size() {
            *session = None;
            return Ok(vec![text(who, messages::team_full(self.teams.max_team_size()))]);
        }
        if let Some(current) = session.take() {
            *session = machine::code_resolved(current, team.id).next;
        }
        Ok(self.ask_current(who, session))
    }

    /// Persist a finished flow. Exactly one mutation, or none.
    async fn commit(&self, msg: &IncomingMessage, commit: Commit) -> Result<Replies> {
        let who = msg.sender_id;
        match commit {
            Commit::Register(reg) => self.register(msg, reg).await,
            Commit::CreateTeam {
                hackathon_id,
                name,
                role,
                field,
                portfolio,
            } => {
                let new = NewTeam {
                    hackathon_id,
                    name,
                    leader_id: who,
                    leader_role: role,
                    leader_portfolio: portfolio,
                    field: Some(field),
                };
                match self.teams.create_team(new).await {
                    Ok(team) => Ok(vec![text(who, messages::team_created(&team))]),
                    Err(e) if e.conflict() == Some(Conflict::DuplicateMembership) => {
                        Ok(vec![text(who, messages::duplicate_membership())])
                    }
                    Err(e) => Err(e),
                }
            }
            Commit::JoinTeam {
                hackathon_id,
                team_id,
                role,
                portfolio,
            } => {
                let membership = NewMembership {
                    team_id,
                    participant_id: who,
                    role,
                    portfolio,
                    is_leader: false,
                };
                if let Err(e) = self.teams.add_member(membership).await {
                    let reply = match e.conflict() {
                        Some(Conflict::DuplicateMembership) => {
                            messages::duplicate_membership().to_string()
                        }
                        Some(Conflict::TeamFull) => messages::team_full(self.teams.max_team_size()),
                        _ if matches!(e, HackError::NotFound(_)) => messages::team_gone().to_string(),
                        _ => return Err(e),
                    };
                    return Ok(vec![text(who, reply)]);
                }
                let team = self
                    .store
                    .get_team(team_id)
                    .await?
                    .ok_or_else(|| HackError::not_found(format!("team {team_id}")))?;
                tracing::info!("🔑 Participant {who} joined team {team_id} in hackathon {hackathon_id}");
                let mut out = vec![text(who, messages::joined_team(&team))];
                if team.leader_id != who {
                    let name = match self.store.get_participant(who).await? {
                        Some(p) => p.full_name(),
                        None => msg.sender_name.clone().unwrap_or_else(|| who.to_string()),
                    };
                    out.push(text(team.leader_id, messages::member_joined(&name, &team)));
                }
                Ok(out)
            }
            Commit::Submit { stage_id, link } => {
                // The stage may have closed while the link was being typed.
                let Some(stage) = self.store.get_stage(stage_id).await? else {
                    return Ok(vec![text(who, messages::stage_unknown())]);
                };
                if !stage.accepts_submissions(Utc::now()) {
                    return Ok(vec![text(who, messages::submission_closed())]);
                }
                let Some(team) = self
                    .store
                    .get_user_team_for_hackathon(who, stage.hackathon_id)
                    .await?
                else {
                    return Ok(vec![text(who, messages::team_required())]);
                };
                let replaced = self
                    .store
                    .get_submission_for_team_stage(stage.id, team.id)
                    .await?
                    .is_some();
                self.store
                    .upsert_submission(stage.id, team.id, who, &link)
                    .await?;
                tracing::info!("📤 Team {} submitted stage {} (by {who})", team.id, stage.id);
                Ok(vec![text(who, messages::submission_saved(&stage, replaced))])
            }
            Commit::EditField { field, value } => {
                self.store.update_participant_field(who, field, &value).await?;
                tracing::info!("✏️ Participant {who} updated {}", field.column());
                let mut out = vec![text(who, messages::field_updated(field))];
                if let Some(p) = self.participant(who).await? {
                    out.push(messages::profile(who, &p));
                }
                Ok(out)
            }
        }
    }

    async fn register(&self, msg: &IncomingMessage, reg: Registration) -> Result<Replies> {
        let who = msg.sender_id;
        let now = Utc::now();
        let participant = Participant {
            id: who,
            username: msg.username.clone(),
            first_name: reg.first_name,
            last_name: reg.last_name,
            birth_date: reg.birth_date,
            gender: reg.gender,
            location: reg.location,
            phone: reg.phone,
            pinfl: reg.pinfl,
            language: DEFAULT_LANGUAGE.to_string(),
            consent_at: now,
            registration_complete: true,
            created_at: now,
        };
        self.store.upsert_participant(&participant).await?;
        tracing::info!("📝 Participant {who} registered");
        Ok(vec![
            text(who, messages::registered(&participant.first_name))
                .with_keyboard(messages::main_menu()),
        ])
    }

    // ── Views and one-shot actions ────────────────────

    async fn show_hackathons(&self, who: ParticipantId) -> Result<Replies> {
        if self.participant(who).await?.is_none() {
            return Ok(vec![text(who, messages::registration_required())]);
        }
        let hackathons = self.store.get_active_hackathons().await?;
        Ok(vec![messages::hackathon_list(who, &hackathons)])
    }

    async fn show_hackathon(&self, who: ParticipantId, id: HackathonId) -> Result<Replies> {
        if self.participant(who).await?.is_none() {
            return Ok(vec![text(who, messages::registration_required())]);
        }
        let Some(hackathon) = self.store.get_hackathon(id).await?.filter(|h| h.is_active) else {
            return Ok(vec![text(who, messages::hackathon_unavailable())]);
        };
        let reply = match self.store.get_user_team_for_hackathon(who, id).await? {
            Some(team) => {
                let members = self.named_members(team.id).await?;
                messages::hackathon_details(who, &hackathon, Some((&team, &members)))
            }
            None => messages::hackathon_details(who, &hackathon, None),
        };
        Ok(vec![reply])
    }

    async fn named_members(&self, team_id: TeamId) -> Result<Vec<(TeamMember, String)>> {
        let members = self.store.get_team_members(team_id).await?;
        let mut named = Vec::with_capacity(members.len());
        for m in members {
            let name = match self.store.get_participant(m.participant_id).await? {
                Some(p) => p.full_name(),
                None => m.participant_id.to_string(),
            };
            named.push((m, name));
        }
        Ok(named)
    }

    async fn show_stages(&self, who: ParticipantId, id: HackathonId) -> Result<Replies> {
        if self.participant(who).await?.is_none() {
            return Ok(vec![text(who, messages::registration_required())]);
        }
        let Some(hackathon) = self.store.get_hackathon(id).await?.filter(|h| h.is_active) else {
            return Ok(vec![text(who, messages::hackathon_unavailable())]);
        };
        let team = self.store.get_user_team_for_hackathon(who, id).await?;
        let mut stages = Vec::new();
        for stage in self.store.list_stages_for_hackathon(id).await? {
            let submission = match &team {
                Some(team) => {
                    self.store
                        .get_submission_for_team_stage(stage.id, team.id)
                        .await?
                }
                None => None,
            };
            stages.push((stage, submission));
        }
        Ok(vec![messages::stage_list(who, &hackathon, &stages, Utc::now())])
    }

    async fn show_profile(&self, who: ParticipantId) -> Result<Replies> {
        match self.participant(who).await? {
            Some(p) => Ok(vec![messages::profile(who, &p)]),
            None => Ok(vec![text(who, messages::registration_required())]),
        }
    }

    async fn begin_team_flow(
        &self,
        who: ParticipantId,
        id: HackathonId,
        session: &mut Option<Session>,
        fresh: Session,
    ) -> Result<Replies> {
        if self.participant(who).await?.is_none() {
            return Ok(vec![text(who, messages::registration_required())]);
        }
        if self.store.get_hackathon(id).await?.filter(|h| h.is_active).is_none() {
            *session = None;
            return Ok(vec![text(who, messages::hackathon_unavailable())]);
        }
        if let Some(team) = self.store.get_user_team_for_hackathon(who, id).await? {
            *session = None;
            return Ok(vec![text(who, messages::already_in_team(&team))]);
        }
        Ok(self.begin(who, session, fresh))
    }

    async fn begin_submission(
        &self,
        who: ParticipantId,
        stage_id: StageId,
        session: &mut Option<Session>,
    ) -> Result<Replies> {
        if self.participant(who).await?.is_none() {
            return Ok(vec![text(who, messages::registration_required())]);
        }
        let Some(stage) = self.store.get_stage(stage_id).await? else {
            *session = None;
            return Ok(vec![text(who, messages::stage_unknown())]);
        };
        if !stage.accepts_submissions(Utc::now()) {
            *session = None;
            return Ok(vec![text(who, messages::submission_closed())]);
        }
        if self
            .store
            .get_user_team_for_hackathon(who, stage.hackathon_id)
            .await?
            .is_none()
        {
            *session = None;
            return Ok(vec![text(who, messages::team_required())]);
        }
        Ok(self.begin(who, session, Session::submit(stage.id)))
    }

    async fn leave_team(&self, who: ParticipantId, id: HackathonId) -> Result<Replies> {
        if self.participant(who).await?.is_none() {
            return Ok(vec![text(who, messages::registration_required())]);
        }
        let Some(team) = self.store.get_user_team_for_hackathon(who, id).await? else {
            return Ok(vec![text(who, messages::not_in_team())]);
        };
        let out = match self.teams.remove_member(team.id, who).await? {
            Departure::Removed => vec![text(who, messages::left_team(&team))],
            Departure::LeaderTransferred(successor) => vec![
                text(who, messages::left_team(&team)),
                text(successor, messages::new_leader(&team)),
            ],
            Departure::TeamDeleted => vec![text(who, messages::left_and_deleted(&team))],
        };
        Ok(out)
    }

    async fn set_language(&self, who: ParticipantId, code: &str) -> Result<Replies> {
        if !SUPPORTED_LANGUAGES.contains(&code) {
            return Ok(vec![text(who, messages::unsupported_language())]);
        }
        if self.participant(who).await?.is_none() {
            return Ok(vec![text(who, messages::registration_required())]);
        }
        self.store
            .update_participant_field(who, ProfileField::Language, code)
            .await?;
        tracing::info!("🌐 Participant {who} switched language to {code}");
        Ok(vec![text(who, messages::language_saved(code))])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use hackbot_core::config::TeamConfig;
    use hackbot_core::models::{Hackathon, Stage, Team};
    use hackbot_db::{NewHackathon, NewStage, SqliteStore};

    const A: ParticipantId = 100;
    const B: ParticipantId = 200;
    const C: ParticipantId = 300;

    struct Harness {
        store: Arc<SqliteStore>,
        dialog: DialogController,
    }

    impl Harness {
        fn new() -> Self {
            Self::with_teams(TeamConfig::default())
        }

        fn with_teams(config: TeamConfig) -> Self {
            let store = Arc::new(SqliteStore::open_in_memory().unwrap());
            let teams = Arc::new(TeamRegistry::new(store.clone(), &config));
            let dialog = DialogController::new(store.clone(), teams, SupportConfig::default());
            Self { store, dialog }
        }

        async fn send(&self, who: ParticipantId, payload: Payload) -> Replies {
            self.dialog.handle(IncomingMessage::new("test", who, payload)).await
        }

        async fn say(&self, who: ParticipantId, s: &str) -> Replies {
            self.send(who, Payload::Text(s.into())).await
        }

        async fn press(&self, who: ParticipantId, interaction: Interaction) -> Replies {
            self.send(who, Payload::Callback(interaction.data())).await
        }

        async fn command(&self, who: ParticipantId, name: &str) -> Replies {
            self.send(who, Payload::Command(name.into())).await
        }

        async fn register(&self, who: ParticipantId) {
            self.command(who, "start").await;
            self.press(who, Interaction::Consent(true)).await;
            self.say(who, "Ada").await;
            self.say(who, "Lovelace").await;
            self.say(who, "23.10.2007").await;
            self.press(who, Interaction::Gender(hackbot_core::models::Gender::Female))
                .await;
            self.say(who, "Tashkent").await;
            self.send(who, Payload::Contact("+998901234567".into())).await;
            self.say(who, "12345678901234").await;
        }

        fn hackathon(&self) -> Hackathon {
            self.store
                .create_hackathon(&NewHackathon {
                    name: "Spring Hack".into(),
                    description: "Build something".into(),
                    deadline: None,
                    prize_pool: None,
                    is_active: true,
                })
                .unwrap()
        }

        fn stage(&self, hackathon_id: HackathonId, deadline: chrono::DateTime<Utc>) -> Stage {
            self.store
                .create_stage(&NewStage {
                    hackathon_id,
                    number: 1,
                    name: "MVP".into(),
                    description: String::new(),
                    deadline: Some(deadline),
                    is_active: true,
                })
                .unwrap()
        }

        async fn create_team(&self, who: ParticipantId, hackathon_id: HackathonId) -> Team {
            self.press(who, Interaction::CreateTeam(hackathon_id)).await;
            self.say(who, "Rocket").await;
            self.say(who, "Backend").await;
            self.say(who, "EdTech").await;
            self.press(who, Interaction::Skip).await;
            self.store
                .get_user_team_for_hackathon(who, hackathon_id)
                .await
                .unwrap()
                .unwrap()
        }

        async fn join(&self, who: ParticipantId, hackathon_id: HackathonId, code: &str) -> Replies {
            self.press(who, Interaction::JoinTeam(hackathon_id)).await;
            self.say(who, code).await;
            self.say(who, "Designer").await;
            self.say(who, "-").await
        }
    }

    fn contains(replies: &Replies, needle: &str) -> bool {
        replies.iter().any(|r| r.content.contains(needle))
    }

    #[tokio::test]
    async fn test_registration_persists_participant() {
        let h = Harness::new();
        h.register(A).await;

        let p = h.store.get_participant(A).await.unwrap().unwrap();
        assert_eq!(p.birth_date, NaiveDate::from_ymd_opt(2007, 10, 23).unwrap());
        assert_eq!(p.pinfl, "12345678901234");
        assert_eq!(p.language, "en");
        assert!(p.registration_complete);
        assert!(p.consent_at <= Utc::now());
        assert!(h.dialog.session_state(A).await.is_none());

        let replies = h.command(A, "start").await;
        assert!(contains(&replies, "Welcome back, Ada"));
    }

    #[tokio::test]
    async fn test_steps_for_one_participant_run_one_at_a_time() {
        let h = Harness::new();
        h.command(A, "start").await;
        h.press(A, Interaction::Consent(true)).await;

        // Hold A's slot so both answers queue up behind it.
        let slot = h.dialog.sessions.slot(A);
        let guard = slot.lock().await;
        let (first, second, ()) = tokio::join!(h.say(A, "Ada"), h.say(A, "Lovelace"), async {
            tokio::task::yield_now().await;
            drop(guard);
        });

        assert!(contains(&first, "last name"));
        assert!(contains(&second, "birth date"));
        assert_eq!(h.dialog.session_state(A).await, Some(DialogState::BirthDate));

        h.say(A, "23.10.2007").await;
        h.press(A, Interaction::Gender(hackbot_core::models::Gender::Female))
            .await;
        h.say(A, "Tashkent").await;
        h.send(A, Payload::Contact("+998901234567".into())).await;
        h.say(A, "12345678901234").await;
        let p = h.store.get_participant(A).await.unwrap().unwrap();
        assert_eq!((p.first_name.as_str(), p.last_name.as_str()), ("Ada", "Lovelace"));
    }

    #[tokio::test]
    async fn test_invalid_birth_date_keeps_state() {
        let h = Harness::new();
        h.command(A, "start").await;
        h.press(A, Interaction::Consent(true)).await;
        h.say(A, "Ada").await;
        h.say(A, "Lovelace").await;

        let replies = h.say(A, "31.13.2007").await;
        assert!(contains(&replies, "not valid"));
        assert_eq!(h.dialog.session_state(A).await, Some(DialogState::BirthDate));
    }

    #[tokio::test]
    async fn test_cancel_discards_partial_registration() {
        let h = Harness::new();
        h.command(A, "start").await;
        h.press(A, Interaction::Consent(false)).await;
        assert_eq!(h.dialog.session_state(A).await, Some(DialogState::Offer));
        h.press(A, Interaction::Consent(true)).await;
        h.say(A, "Ada").await;

        let replies = h.command(A, "cancel").await;
        assert!(contains(&replies, "Cancelled"));
        assert!(h.dialog.session_state(A).await.is_none());
        assert!(h.store.get_participant(A).await.unwrap().is_none());

        // Text without a flow only points at the menu.
        let replies = h.say(A, "hello").await;
        assert!(contains(&replies, "menu"));
    }

    #[tokio::test]
    async fn test_flows_require_registration() {
        let h = Harness::new();
        let hackathon = h.hackathon();
        let replies = h.press(A, Interaction::CreateTeam(hackathon.id)).await;
        assert!(contains(&replies, "register first"));
        assert!(h.dialog.session_state(A).await.is_none());
    }

    #[tokio::test]
    async fn test_create_and_join_team() {
        let h = Harness::new();
        let hackathon = h.hackathon();
        h.register(A).await;
        h.register(B).await;

        let team = h.create_team(A, hackathon.id).await;
        assert_eq!(team.leader_id, A);
        assert_eq!(team.field.as_deref(), Some("EdTech"));

        let replies = h.join(B, hackathon.id, &team.code.to_lowercase()).await;
        assert!(contains(&replies, "You joined team Rocket"));
        // The leader hears about it.
        assert!(replies.iter().any(|r| r.recipient == A));

        let members = h.store.get_team_members(team.id).await.unwrap();
        assert_eq!(members.len(), 2);
        assert!(members.iter().any(|m| m.participant_id == A && m.is_leader));
        assert!(members.iter().any(|m| m.participant_id == B && !m.is_leader && m.role == "Designer"));

        // Already in a team: the flow does not even start.
        let replies = h.press(B, Interaction::CreateTeam(hackathon.id)).await;
        assert!(contains(&replies, "already in team Rocket"));
        assert!(h.dialog.session_state(B).await.is_none());
    }

    #[tokio::test]
    async fn test_unknown_code_reprompts() {
        let h = Harness::new();
        let hackathon = h.hackathon();
        h.register(A).await;
        h.press(A, Interaction::JoinTeam(hackathon.id)).await;

        let replies = h.say(A, "NOPE42").await;
        assert!(contains(&replies, "No team with that code"));
        assert_eq!(
            h.dialog.session_state(A).await,
            Some(DialogState::JoinCode {
                hackathon_id: hackathon.id
            })
        );
    }

    #[tokio::test]
    async fn test_duplicate_membership_ends_flow() {
        let h = Harness::new();
        let hackathon = h.hackathon();
        for who in [A, B, C] {
            h.register(who).await;
        }
        let team = h.create_team(A, hackathon.id).await;

        // B starts joining, but meanwhile founds a team of their own.
        h.press(B, Interaction::JoinTeam(hackathon.id)).await;
        h.say(B, &team.code).await;
        h.store
            .create_team(
                &NewTeam {
                    hackathon_id: hackathon.id,
                    name: "Other".into(),
                    leader_id: B,
                    leader_role: "Lead".into(),
                    leader_portfolio: None,
                    field: None,
                },
                "OTHER1",
            )
            .await
            .unwrap();
        h.say(B, "Designer").await;
        let replies = h.press(B, Interaction::Skip).await;

        assert!(contains(&replies, "already belong to a team"));
        assert!(h.dialog.session_state(B).await.is_none());
        assert_eq!(h.store.get_team_members(team.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_full_team_ends_join() {
        let h = Harness::with_teams(TeamConfig {
            max_team_size: 1,
            ..TeamConfig::default()
        });
        let hackathon = h.hackathon();
        h.register(A).await;
        h.register(B).await;
        let team = h.create_team(A, hackathon.id).await;

        h.press(B, Interaction::JoinTeam(hackathon.id)).await;
        let replies = h.say(B, &team.code).await;
        assert!(contains(&replies, "team is full"));
        assert!(h.dialog.session_state(B).await.is_none());
    }

    #[tokio::test]
    async fn test_leader_leaving_hands_over() {
        let h = Harness::new();
        let hackathon = h.hackathon();
        h.register(A).await;
        h.register(B).await;
        let team = h.create_team(A, hackathon.id).await;
        h.join(B, hackathon.id, &team.code).await;

        let replies = h.press(A, Interaction::LeaveTeam(hackathon.id)).await;
        assert!(replies.iter().any(|r| r.recipient == B && r.content.contains("leader")));
        assert_eq!(h.store.get_team(team.id).await.unwrap().unwrap().leader_id, B);

        let replies = h.press(B, Interaction::LeaveTeam(hackathon.id)).await;
        assert!(contains(&replies, "was removed"));
        assert!(h.store.get_team(team.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_submission_saved_and_overwritten() {
        let h = Harness::new();
        let hackathon = h.hackathon();
        h.register(A).await;
        let team = h.create_team(A, hackathon.id).await;
        let stage = h.stage(hackathon.id, Utc::now() + Duration::days(1));

        h.press(A, Interaction::Submit(stage.id)).await;
        let replies = h.say(A, "github.com/rocket").await;
        assert!(contains(&replies, "not a valid link"));
        let replies = h.say(A, "https://github.com/rocket/v1").await;
        assert!(contains(&replies, "saved"));

        h.press(A, Interaction::Submit(stage.id)).await;
        let replies = h.say(A, "https://github.com/rocket/v2").await;
        assert!(contains(&replies, "updated"));

        let sub = h
            .store
            .get_submission_for_team_stage(stage.id, team.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(sub.link, "https://github.com/rocket/v2");
    }

    #[tokio::test]
    async fn test_submission_after_deadline_is_closed() {
        let h = Harness::new();
        let hackathon = h.hackathon();
        h.register(A).await;
        let team = h.create_team(A, hackathon.id).await;
        let stage = h.stage(hackathon.id, Utc::now() - Duration::hours(1));

        let replies = h.press(A, Interaction::Submit(stage.id)).await;
        assert!(contains(&replies, "closed"));
        assert!(h.dialog.session_state(A).await.is_none());
        assert!(
            h.store
                .get_submission_for_team_stage(stage.id, team.id)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_stage_closing_mid_flow_blocks_submission() {
        let h = Harness::new();
        let hackathon = h.hackathon();
        h.register(A).await;
        let team = h.create_team(A, hackathon.id).await;
        let stage = h.stage(hackathon.id, Utc::now() + Duration::days(3));

        h.press(A, Interaction::Submit(stage.id)).await;
        h.store.set_stage_active(stage.id, false).unwrap();
        let replies = h.say(A, "https://github.com/rocket/app").await;
        assert!(contains(&replies, "closed"));
        assert!(
            h.store
                .get_submission_for_team_stage(stage.id, team.id)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_submission_requires_team() {
        let h = Harness::new();
        let hackathon = h.hackathon();
        h.register(A).await;
        let stage = h.stage(hackathon.id, Utc::now() + Duration::days(1));

        let replies = h.press(A, Interaction::Submit(stage.id)).await;
        assert!(contains(&replies, "need a team"));
        assert!(h.dialog.session_state(A).await.is_none());
    }

    #[tokio::test]
    async fn test_edit_profile_and_language() {
        let h = Harness::new();
        h.register(A).await;

        h.press(A, Interaction::Edit(ProfileField::BirthDate)).await;
        let replies = h.say(A, "1999-01-01").await;
        assert!(contains(&replies, "not valid"));
        h.say(A, "1.1.1999").await;

        h.press(A, Interaction::Edit(ProfileField::Location)).await;
        h.say(A, "Bukhara").await;

        let replies = h.press(A, Interaction::Language("ru".into())).await;
        assert!(contains(&replies, "Language set to ru"));
        let replies = h.press(A, Interaction::Language("xx".into())).await;
        assert!(contains(&replies, "not supported"));

        let p = h.store.get_participant(A).await.unwrap().unwrap();
        assert_eq!(p.birth_date, NaiveDate::from_ymd_opt(1999, 1, 1).unwrap());
        assert_eq!(p.location, "Bukhara");
        assert_eq!(p.language, "ru");
    }

    #[tokio::test]
    async fn test_help_and_unknown_input() {
        let h = Harness::new();
        let replies = h.command(A, "help").await;
        assert!(contains(&replies, "support@example.org"));
        assert!(contains(&h.command(A, "dance").await, "Unknown command"));
        assert!(h.send(A, Payload::Callback("bogus".into())).await.is_empty());
    }
}
