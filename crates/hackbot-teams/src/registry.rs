//! Team registry. All team creation, joining, leaving and leader changes go through here.

use std::sync::Arc;

use hackbot_core::config::TeamConfig;
use hackbot_core::error::{Conflict, HackError, Result};
use hackbot_core::models::{
    Departure, HackathonId, NewMembership, NewTeam, ParticipantId, Team, TeamId, TeamMember,
};
use hackbot_core::traits::Store;

use crate::code::CodeGenerator;

/// Team lifecycle on top of a shared `Store`.
///
/// Join-code uniqueness and one-team-per-hackathon are enforced by the
/// store's unique constraints; the registry retries code collisions and
/// orders leader succession before removal.
pub struct TeamRegistry {
    store: Arc<dyn Store>,
    codes: CodeGenerator,
    max_team_size: usize,
    max_code_attempts: u32,
}

impl TeamRegistry {
    pub fn new(store: Arc<dyn Store>, config: &TeamConfig) -> Self {
        Self {
            store,
            codes: CodeGenerator::from_config(config),
            max_team_size: config.max_team_size,
            max_code_attempts: config.max_code_attempts.max(1),
        }
    }

    pub fn max_team_size(&self) -> usize {
        self.max_team_size
    }

    /// Create a team led by `new.leader_id`, drawing join codes until one is free.
    pub async fn create_team(&self, new: NewTeam) -> Result<Team> {
        for attempt in 1..=self.max_code_attempts {
            let code = self.codes.generate();
            if self.store.get_team_by_code(&code).await?.is_some() {
                tracing::debug!("Join code collision (attempt {attempt})");
                continue;
            }
            match self.store.create_team(&new, &code).await {
                Ok(team) => {
                    tracing::info!(
                        "👥 Team {} created in hackathon {} by {}",
                        team.id,
                        team.hackathon_id,
                        team.leader_id
                    );
                    return Ok(team);
                }
                // Lost a race against a concurrent creator; draw again.
                Err(e) if e.conflict() == Some(Conflict::JoinCodeTaken) => {
                    tracing::debug!("Join code taken concurrently (attempt {attempt})");
                }
                Err(e) => return Err(e),
            }
        }
        Err(HackError::Store(format!(
            "no free join code after {} attempts",
            self.max_code_attempts
        )))
    }

    /// Find the team a typed code points at, limited to one hackathon.
    pub async fn resolve_code(&self, code: &str, hackathon_id: HackathonId) -> Result<Option<Team>> {
        let code = CodeGenerator::normalize(code);
        if code.is_empty() {
            return Ok(None);
        }
        Ok(self
            .store
            .get_team_by_code(&code)
            .await?
            .filter(|t| t.hackathon_id == hackathon_id))
    }

    /// Add a member. Fails with `Conflict::TeamFull` at capacity and
    /// `Conflict::DuplicateMembership` when the participant already has a
    /// team in this hackathon.
    pub async fn add_member(&self, membership: NewMembership) -> Result<TeamMember> {
        if self.store.get_team(membership.team_id).await?.is_none() {
            return Err(HackError::not_found(format!("team {}", membership.team_id)));
        }
        let members = self.store.get_team_members(membership.team_id).await?;
        if members
            .iter()
            .any(|m| m.participant_id == membership.participant_id)
        {
            return Err(Conflict::DuplicateMembership.into());
        }
        if members.len() >= self.max_team_size {
            return Err(Conflict::TeamFull.into());
        }
        let member = self.store.add_team_member(&membership).await?;
        tracing::info!(
            "➕ Participant {} joined team {}",
            member.participant_id,
            member.team_id
        );
        Ok(member)
    }

    /// Remove a member. A departing leader hands over to the earliest-joined
    /// remaining member first; the last member leaving deletes the team.
    /// The store applies all of it as one unit.
    pub async fn remove_member(
        &self,
        team_id: TeamId,
        participant_id: ParticipantId,
    ) -> Result<Departure> {
        let departure = self
            .store
            .remove_member_with_succession(team_id, participant_id)
            .await?;
        match departure {
            Departure::TeamDeleted => {
                tracing::info!("🗑️ Team {team_id} deleted (last member {participant_id} left)");
            }
            Departure::LeaderTransferred(successor) => {
                tracing::info!("👑 Team {team_id} leadership: {participant_id} → {successor}");
            }
            Departure::Removed => {
                tracing::info!("➖ Participant {participant_id} left team {team_id}");
            }
        }
        Ok(departure)
    }

    pub async fn transfer_leadership(&self, team_id: TeamId, new_leader: ParticipantId) -> Result<()> {
        self.store.update_team_leader(team_id, new_leader).await?;
        tracing::info!("👑 Team {team_id} leadership moved to {new_leader}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{NaiveDate, Utc};
    use hackbot_core::models::{
        Gender, Hackathon, Participant, ProfileField, Stage, StageId, Submission,
    };
    use hackbot_db::{NewHackathon, SqliteStore};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    /// Wraps a real store. Can hold one participant's departure until
    /// released, and can report a number of join codes as taken at insert
    /// time while claiming they are free on lookup.
    struct ScriptedStore {
        inner: Arc<SqliteStore>,
        held_departure: Option<(ParticipantId, Arc<Notify>, Arc<Notify>)>,
        codes_taken: AtomicUsize,
        codes_tried: Mutex<Vec<String>>,
    }

    impl ScriptedStore {
        fn new(inner: Arc<SqliteStore>) -> Self {
            Self {
                inner,
                held_departure: None,
                codes_taken: AtomicUsize::new(0),
                codes_tried: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Store for ScriptedStore {
        async fn get_participant(&self, id: ParticipantId) -> Result<Option<Participant>> {
            self.inner.get_participant(id).await
        }
        async fn upsert_participant(&self, participant: &Participant) -> Result<()> {
            self.inner.upsert_participant(participant).await
        }
        async fn update_participant_field(
            &self,
            id: ParticipantId,
            field: ProfileField,
            value: &str,
        ) -> Result<()> {
            self.inner.update_participant_field(id, field, value).await
        }
        async fn get_active_hackathons(&self) -> Result<Vec<Hackathon>> {
            self.inner.get_active_hackathons().await
        }
        async fn get_hackathon(&self, id: HackathonId) -> Result<Option<Hackathon>> {
            self.inner.get_hackathon(id).await
        }
        async fn list_stages_for_hackathon(&self, id: HackathonId) -> Result<Vec<Stage>> {
            self.inner.list_stages_for_hackathon(id).await
        }
        async fn get_stage(&self, id: StageId) -> Result<Option<Stage>> {
            self.inner.get_stage(id).await
        }
        async fn get_active_stages(&self) -> Result<Vec<Stage>> {
            self.inner.get_active_stages().await
        }
        async fn create_team(&self, team: &NewTeam, code: &str) -> Result<Team> {
            self.codes_tried.lock().unwrap().push(code.to_string());
            let taken = self
                .codes_taken
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if taken {
                return Err(Conflict::JoinCodeTaken.into());
            }
            self.inner.create_team(team, code).await
        }
        async fn get_team(&self, id: TeamId) -> Result<Option<Team>> {
            self.inner.get_team(id).await
        }
        async fn get_team_by_code(&self, _code: &str) -> Result<Option<Team>> {
            Ok(None)
        }
        async fn get_team_members(&self, team_id: TeamId) -> Result<Vec<TeamMember>> {
            self.inner.get_team_members(team_id).await
        }
        async fn add_team_member(&self, membership: &NewMembership) -> Result<TeamMember> {
            self.inner.add_team_member(membership).await
        }
        async fn remove_team_member(
            &self,
            team_id: TeamId,
            participant_id: ParticipantId,
        ) -> Result<bool> {
            self.inner.remove_team_member(team_id, participant_id).await
        }
        async fn remove_member_with_succession(
            &self,
            team_id: TeamId,
            participant_id: ParticipantId,
        ) -> Result<Departure> {
            if let Some((held, entered, release)) = &self.held_departure {
                if *held == participant_id {
                    entered.notify_one();
                    release.notified().await;
                }
            }
            self.inner
                .remove_member_with_succession(team_id, participant_id)
                .await
        }
        async fn update_team_leader(&self, team_id: TeamId, leader_id: ParticipantId) -> Result<()> {
            self.inner.update_team_leader(team_id, leader_id).await
        }
        async fn delete_team(&self, team_id: TeamId) -> Result<()> {
            self.inner.delete_team(team_id).await
        }
        async fn get_user_team_for_hackathon(
            &self,
            participant_id: ParticipantId,
            hackathon_id: HackathonId,
        ) -> Result<Option<Team>> {
            self.inner
                .get_user_team_for_hackathon(participant_id, hackathon_id)
                .await
        }
        async fn upsert_submission(
            &self,
            stage_id: StageId,
            team_id: TeamId,
            participant_id: ParticipantId,
            link: &str,
        ) -> Result<Submission> {
            self.inner
                .upsert_submission(stage_id, team_id, participant_id, link)
                .await
        }
        async fn get_submission_for_team_stage(
            &self,
            stage_id: StageId,
            team_id: TeamId,
        ) -> Result<Option<Submission>> {
            self.inner.get_submission_for_team_stage(stage_id, team_id).await
        }
        async fn record_reminder_receipt_if_absent(
            &self,
            stage_id: StageId,
            participant_id: ParticipantId,
            days_left: i64,
        ) -> Result<bool> {
            self.inner
                .record_reminder_receipt_if_absent(stage_id, participant_id, days_left)
                .await
        }
        async fn get_hackathon_participants(
            &self,
            hackathon_id: HackathonId,
        ) -> Result<Vec<ParticipantId>> {
            self.inner.get_hackathon_participants(hackathon_id).await
        }
    }

    async fn setup(config: TeamConfig, ids: &[ParticipantId]) -> (Arc<SqliteStore>, TeamRegistry, HackathonId) {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        for id in ids {
            store
                .upsert_participant(&Participant {
                    id: *id,
                    username: None,
                    first_name: format!("P{id}"),
                    last_name: "Test".into(),
                    birth_date: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
                    gender: Gender::Male,
                    location: "Tashkent".into(),
                    phone: "+998901112233".into(),
                    pinfl: "12345678901234".into(),
                    language: "en".into(),
                    consent_at: Utc::now(),
                    registration_complete: true,
                    created_at: Utc::now(),
                })
                .await
                .unwrap();
        }
        let hackathon = store
            .create_hackathon(&NewHackathon {
                name: "Hack".into(),
                description: String::new(),
                deadline: None,
                prize_pool: None,
                is_active: true,
            })
            .unwrap();
        let registry = TeamRegistry::new(store.clone(), &config);
        (store, registry, hackathon.id)
    }

    fn new_team(hackathon_id: HackathonId, leader_id: ParticipantId, name: &str) -> NewTeam {
        NewTeam {
            hackathon_id,
            name: name.into(),
            leader_id,
            leader_role: "Lead".into(),
            leader_portfolio: None,
            field: None,
        }
    }

    fn join(team_id: TeamId, participant_id: ParticipantId) -> NewMembership {
        NewMembership {
            team_id,
            participant_id,
            role: "Dev".into(),
            portfolio: None,
            is_leader: false,
        }
    }

    async fn assert_leader_is_member(store: &SqliteStore, team_id: TeamId) {
        let team = store.get_team(team_id).await.unwrap().unwrap();
        let members = store.get_team_members(team_id).await.unwrap();
        let leaders: Vec<_> = members.iter().filter(|m| m.is_leader).collect();
        assert_eq!(leaders.len(), 1);
        assert_eq!(leaders[0].participant_id, team.leader_id);
    }

    #[tokio::test]
    async fn test_create_then_join_by_code() {
        let (store, registry, h) = setup(TeamConfig::default(), &[1, 2]).await;
        let team = registry.create_team(new_team(h, 1, "Rocket")).await.unwrap();
        assert_eq!(team.code.len(), 6);

        let found = registry
            .resolve_code(&team.code.to_lowercase(), h)
            .await
            .unwrap()
            .unwrap();
        registry.add_member(join(found.id, 2)).await.unwrap();

        let members = store.get_team_members(team.id).await.unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(store.get_team(team.id).await.unwrap().unwrap().leader_id, 1);
        assert_leader_is_member(&store, team.id).await;

        // Same code, different hackathon: not resolvable.
        assert!(registry.resolve_code(&team.code, h + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_codes_are_unique_under_collisions() {
        // A two-code space forces collisions on the third team.
        let config = TeamConfig {
            code_alphabet: "AB".into(),
            code_min_len: 1,
            code_max_len: 1,
            max_code_attempts: 64,
            ..TeamConfig::default()
        };
        let (_store, registry, h) = setup(config, &[1, 2, 3]).await;
        let a = registry.create_team(new_team(h, 1, "A")).await.unwrap();
        let b = registry.create_team(new_team(h, 2, "B")).await.unwrap();
        assert_ne!(a.code, b.code);

        let err = registry.create_team(new_team(h, 3, "C")).await.unwrap_err();
        assert!(matches!(err, HackError::Store(_)));
    }

    #[tokio::test]
    async fn test_duplicate_membership_and_capacity() {
        let config = TeamConfig {
            max_team_size: 2,
            ..TeamConfig::default()
        };
        let (_store, registry, h) = setup(config, &[1, 2, 3]).await;
        let team = registry.create_team(new_team(h, 1, "Duo")).await.unwrap();

        let err = registry.add_member(join(team.id, 1)).await.unwrap_err();
        assert_eq!(err.conflict(), Some(Conflict::DuplicateMembership));

        registry.add_member(join(team.id, 2)).await.unwrap();
        let err = registry.add_member(join(team.id, 3)).await.unwrap_err();
        assert_eq!(err.conflict(), Some(Conflict::TeamFull));
    }

    #[tokio::test]
    async fn test_leader_departure_and_last_member() {
        let (store, registry, h) = setup(TeamConfig::default(), &[1, 2]).await;
        let team = registry.create_team(new_team(h, 1, "Rocket")).await.unwrap();
        registry.add_member(join(team.id, 2)).await.unwrap();

        let outcome = registry.remove_member(team.id, 1).await.unwrap();
        assert_eq!(outcome, Departure::LeaderTransferred(2));
        assert_leader_is_member(&store, team.id).await;
        assert_eq!(store.get_team_members(team.id).await.unwrap().len(), 1);

        let outcome = registry.remove_member(team.id, 2).await.unwrap();
        assert_eq!(outcome, Departure::TeamDeleted);
        assert!(store.get_team(team.id).await.unwrap().is_none());
        assert!(store.get_hackathon_participants(h).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_succession_picks_earliest_joined() {
        let (store, registry, h) = setup(TeamConfig::default(), &[1, 2, 3]).await;
        let team = registry.create_team(new_team(h, 1, "Trio")).await.unwrap();
        registry.add_member(join(team.id, 3)).await.unwrap();
        registry.add_member(join(team.id, 2)).await.unwrap();

        // Non-leader leaving keeps the leader.
        assert_eq!(registry.remove_member(team.id, 2).await.unwrap(), Departure::Removed);
        assert_eq!(store.get_team(team.id).await.unwrap().unwrap().leader_id, 1);

        registry.add_member(join(team.id, 2)).await.unwrap();
        assert_eq!(
            registry.remove_member(team.id, 1).await.unwrap(),
            Departure::LeaderTransferred(3)
        );
        assert_leader_is_member(&store, team.id).await;

        let err = registry.remove_member(team.id, 1).await.unwrap_err();
        assert!(matches!(err, HackError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_transfer_leadership() {
        let (store, registry, h) = setup(TeamConfig::default(), &[1, 2]).await;
        let team = registry.create_team(new_team(h, 1, "Rocket")).await.unwrap();
        registry.add_member(join(team.id, 2)).await.unwrap();

        registry.transfer_leadership(team.id, 2).await.unwrap();
        assert_eq!(store.get_team(team.id).await.unwrap().unwrap().leader_id, 2);
        assert_leader_is_member(&store, team.id).await;
        assert!(registry.transfer_leadership(team.id, 9).await.is_err());
    }

    #[tokio::test]
    async fn test_code_taken_at_insert_is_redrawn() {
        let (store, _, h) = setup(TeamConfig::default(), &[1]).await;
        let scripted = Arc::new(ScriptedStore::new(store.clone()));
        scripted.codes_taken.store(1, Ordering::SeqCst);
        let registry = TeamRegistry::new(scripted.clone(), &TeamConfig::default());

        let team = registry.create_team(new_team(h, 1, "Rocket")).await.unwrap();

        let tried = scripted.codes_tried.lock().unwrap().clone();
        assert_eq!(tried.len(), 2);
        assert_eq!(team.code, tried[1]);
        assert_eq!(store.get_team(team.id).await.unwrap().unwrap().leader_id, 1);
    }

    #[tokio::test]
    async fn test_concurrent_departures_keep_team_consistent() {
        let (store, _, h) = setup(TeamConfig::default(), &[1, 2]).await;
        let registry = TeamRegistry::new(store.clone(), &TeamConfig::default());
        let team = registry.create_team(new_team(h, 1, "Rocket")).await.unwrap();
        registry.add_member(join(team.id, 2)).await.unwrap();

        // Member 2 asks to leave first but is held; the leader leaves meanwhile.
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let scripted = Arc::new(ScriptedStore {
            held_departure: Some((2, entered.clone(), release.clone())),
            ..ScriptedStore::new(store.clone())
        });
        let registry = Arc::new(TeamRegistry::new(scripted, &TeamConfig::default()));

        let member_leaving = tokio::spawn({
            let registry = registry.clone();
            async move { registry.remove_member(team.id, 2).await }
        });
        entered.notified().await;

        let leader = registry.remove_member(team.id, 1).await.unwrap();
        assert_eq!(leader, Departure::LeaderTransferred(2));

        release.notify_one();
        let member = member_leaving.await.unwrap().unwrap();

        // Member 2 had become the sole leader, so their exit removes the team.
        assert_eq!(member, Departure::TeamDeleted);
        assert!(store.get_team(team.id).await.unwrap().is_none());
        assert!(store.get_team_members(team.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_simultaneous_departures_never_strand_the_team() {
        let (store, registry, h) = setup(TeamConfig::default(), &[1, 2, 3]).await;
        let team = registry.create_team(new_team(h, 1, "Trio")).await.unwrap();
        registry.add_member(join(team.id, 2)).await.unwrap();
        registry.add_member(join(team.id, 3)).await.unwrap();

        let (a, b) = tokio::join!(
            registry.remove_member(team.id, 1),
            registry.remove_member(team.id, 2)
        );
        a.unwrap();
        b.unwrap();

        let members = store.get_team_members(team.id).await.unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].participant_id, 3);
        assert_leader_is_member(&store, team.id).await;
    }
}
