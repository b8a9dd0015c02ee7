//! Store trait: durable persistence for every hackathon entity.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    Departure, Hackathon, HackathonId, NewMembership, NewTeam, Participant, ParticipantId, ProfileField,
    Stage, StageId, Submission, Team, TeamId, TeamMember,
};

/// Transactional store consumed by the dialog, team and reminder components.
///
/// Uniqueness rules live here: join codes, one membership per participant
/// per hackathon, one submission per (stage, team), one reminder receipt
/// per (stage, participant, days left). Violations surface as
/// `HackError::Conflict`.
#[async_trait]
pub trait Store: Send + Sync {
    // ── Participants ──────────────────────────────────

    async fn get_participant(&self, id: ParticipantId) -> Result<Option<Participant>>;

    /// Insert or fully replace a participant profile.
    async fn upsert_participant(&self, participant: &Participant) -> Result<()>;

    /// Update one allow-listed profile column.
    async fn update_participant_field(
        &self,
        id: ParticipantId,
        field: ProfileField,
        value: &str,
    ) -> Result<()>;

    // ── Hackathons & stages ───────────────────────────

    async fn get_active_hackathons(&self) -> Result<Vec<Hackathon>>;

    async fn get_hackathon(&self, id: HackathonId) -> Result<Option<Hackathon>>;

    /// All stages of a hackathon ordered by stage number.
    async fn list_stages_for_hackathon(&self, id: HackathonId) -> Result<Vec<Stage>>;

    async fn get_stage(&self, id: StageId) -> Result<Option<Stage>>;

    /// Active stages that belong to active hackathons.
    async fn get_active_stages(&self) -> Result<Vec<Stage>>;

    // ── Teams ─────────────────────────────────────────

    /// Insert the team and its leader's membership as one unit.
    /// Fails with `Conflict::JoinCodeTaken` when `code` is in use and with
    /// `Conflict::DuplicateMembership` when the leader already has a team
    /// in this hackathon.
    async fn create_team(&self, team: &NewTeam, code: &str) -> Result<Team>;

    async fn get_team(&self, id: TeamId) -> Result<Option<Team>>;

    async fn get_team_by_code(&self, code: &str) -> Result<Option<Team>>;

    /// Members ordered by join time (earliest first).
    async fn get_team_members(&self, team_id: TeamId) -> Result<Vec<TeamMember>>;

    /// Fails with `Conflict::DuplicateMembership`. A leader membership also
    /// moves leadership to the new member.
    async fn add_team_member(&self, membership: &NewMembership) -> Result<TeamMember>;

    /// Returns false when there was no such membership.
    async fn remove_team_member(&self, team_id: TeamId, participant_id: ParticipantId)
    -> Result<bool>;

    /// Remove a member as one unit: a departing leader hands over to the
    /// earliest-joined remaining member, and the last member leaving
    /// deletes the team. Membership is re-read inside the unit, so
    /// concurrent departures and joins see each other's effects.
    /// Fails with `NotFound` when the participant is not in the team.
    async fn remove_member_with_succession(
        &self,
        team_id: TeamId,
        participant_id: ParticipantId,
    ) -> Result<Departure>;

    /// Point the team at a new leader and flip membership flags atomically.
    async fn update_team_leader(&self, team_id: TeamId, leader_id: ParticipantId) -> Result<()>;

    /// Delete a team along with its memberships and submissions.
    async fn delete_team(&self, team_id: TeamId) -> Result<()>;

    async fn get_user_team_for_hackathon(
        &self,
        participant_id: ParticipantId,
        hackathon_id: HackathonId,
    ) -> Result<Option<Team>>;

    // ── Submissions ───────────────────────────────────

    /// Insert or overwrite the (stage, team) submission.
    async fn upsert_submission(
        &self,
        stage_id: StageId,
        team_id: TeamId,
        participant_id: ParticipantId,
        link: &str,
    ) -> Result<Submission>;

    async fn get_submission_for_team_stage(
        &self,
        stage_id: StageId,
        team_id: TeamId,
    ) -> Result<Option<Submission>>;

    // ── Reminders ─────────────────────────────────────

    /// Atomically record a receipt; true only when it did not exist before.
    async fn record_reminder_receipt_if_absent(
        &self,
        stage_id: StageId,
        participant_id: ParticipantId,
        days_left: i64,
    ) -> Result<bool>;

    /// Distinct ids of everyone currently in a team of this hackathon.
    async fn get_hackathon_participants(&self, hackathon_id: HackathonId)
    -> Result<Vec<ParticipantId>>;
}
