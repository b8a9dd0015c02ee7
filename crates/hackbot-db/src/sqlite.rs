//! SQLite implementation of `Store`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use hackbot_core::error::{Conflict, HackError, Result, ValidationError};
use hackbot_core::models::{
    Departure, Gender, Hackathon, HackathonId, NewMembership, NewTeam, Participant, ParticipantId,
    ProfileField, SUPPORTED_LANGUAGES, Stage, StageId, Submission, Team, TeamId, TeamMember,
};
use hackbot_core::traits::Store;
use rusqlite::types::Type;
use rusqlite::{
    Connection, ErrorCode, OptionalExtension, Params, Row, TransactionBehavior, ffi, params,
};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::schema::SCHEMA;

/// SQLite-backed store. One connection behind a mutex; every trait call
/// runs to completion while holding it, so multi-statement writes are
/// wrapped in transactions and never interleave.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

/// Admin input for a new hackathon.
#[derive(Debug, Clone)]
pub struct NewHackathon {
    pub name: String,
    pub description: String,
    pub deadline: Option<DateTime<Utc>>,
    pub prize_pool: Option<String>,
    pub is_active: bool,
}

/// Admin input for a new stage.
#[derive(Debug, Clone)]
pub struct NewStage {
    pub hackathon_id: HackathonId,
    pub number: u32,
    pub name: String,
    pub description: String,
    pub deadline: Option<DateTime<Utc>>,
    pub is_active: bool,
}

const PARTICIPANT_SELECT: &str = "SELECT id, username, first_name, last_name, birth_date, gender, location, phone, pinfl, language, consent_at, registration_complete, created_at FROM participants";
const HACKATHON_SELECT: &str =
    "SELECT id, name, description, deadline, prize_pool, is_active FROM hackathons";
const STAGE_SELECT: &str =
    "SELECT s.id, s.hackathon_id, s.number, s.name, s.description, s.deadline, s.is_active FROM stages s";
const TEAM_SELECT: &str =
    "SELECT t.id, t.hackathon_id, t.name, t.code, t.leader_id, t.field, t.created_at FROM teams t";
const MEMBER_SELECT: &str =
    "SELECT team_id, participant_id, role, portfolio, is_leader, joined_at FROM team_members";

fn row_to_participant(row: &Row) -> rusqlite::Result<Participant> {
    let gender: String = row.get(5)?;
    Ok(Participant {
        id: row.get(0)?,
        username: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        birth_date: row.get(4)?,
        gender: gender
            .parse()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?,
        location: row.get(6)?,
        phone: row.get(7)?,
        pinfl: row.get(8)?,
        language: row.get(9)?,
        consent_at: row.get(10)?,
        registration_complete: row.get(11)?,
        created_at: row.get(12)?,
    })
}

fn row_to_hackathon(row: &Row) -> rusqlite::Result<Hackathon> {
    Ok(Hackathon {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        deadline: row.get(3)?,
        prize_pool: row.get(4)?,
        is_active: row.get(5)?,
    })
}

fn row_to_stage(row: &Row) -> rusqlite::Result<Stage> {
    Ok(Stage {
        id: row.get(0)?,
        hackathon_id: row.get(1)?,
        number: row.get(2)?,
        name: row.get(3)?,
        description: row.get(4)?,
        deadline: row.get(5)?,
        is_active: row.get(6)?,
    })
}

fn row_to_team(row: &Row) -> rusqlite::Result<Team> {
    Ok(Team {
        id: row.get(0)?,
        hackathon_id: row.get(1)?,
        name: row.get(2)?,
        code: row.get(3)?,
        leader_id: row.get(4)?,
        field: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn row_to_member(row: &Row) -> rusqlite::Result<TeamMember> {
    Ok(TeamMember {
        team_id: row.get(0)?,
        participant_id: row.get(1)?,
        role: row.get(2)?,
        portfolio: row.get(3)?,
        is_leader: row.get(4)?,
        joined_at: row.get(5)?,
    })
}

fn db_err(e: rusqlite::Error) -> HackError {
    HackError::Store(e.to_string())
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == ErrorCode::ConstraintViolation
                && (err.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
                    || err.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
    )
}

/// Unique violations become the given conflict; anything else is a store failure.
fn conflict_or_db(e: rusqlite::Error, conflict: Conflict) -> HackError {
    if is_unique_violation(&e) {
        conflict.into()
    } else {
        db_err(e)
    }
}

/// Delete a team with its memberships and submissions. False when the
/// team did not exist.
fn delete_team_rows(conn: &Connection, team_id: TeamId) -> Result<bool> {
    conn.execute("DELETE FROM submissions WHERE team_id = ?1", [team_id])
        .map_err(db_err)?;
    conn.execute("DELETE FROM team_members WHERE team_id = ?1", [team_id])
        .map_err(db_err)?;
    let changed = conn
        .execute("DELETE FROM teams WHERE id = ?1", [team_id])
        .map_err(db_err)?;
    Ok(changed > 0)
}

fn query_list<T, P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
    map: fn(&Row) -> rusqlite::Result<T>,
) -> Result<Vec<T>> {
    let mut stmt = conn.prepare(sql).map_err(db_err)?;
    let rows = stmt
        .query_map(params, map)
        .map_err(db_err)?
        .collect::<rusqlite::Result<Vec<T>>>()
        .map_err(db_err)?;
    Ok(rows)
}

fn query_opt<T, P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
    map: fn(&Row) -> rusqlite::Result<T>,
) -> Result<Option<T>> {
    conn.query_row(sql, params, map).optional().map_err(db_err)
}

impl SqliteStore {
    /// Open or create the database file, then migrate.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)
            .map_err(|e| HackError::Store(format!("DB open error: {e}")))?;
        Self::init(conn)
    }

    /// Fresh private database, used by tests and dry runs.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| HackError::Store(format!("DB open error: {e}")))?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )
        .map_err(|e| HackError::Store(format!("DB pragma error: {e}")))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<()> {
        self.conn()?
            .execute_batch(SCHEMA)
            .map_err(|e| HackError::Store(format!("DB migration error: {e}")))
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| HackError::Store(format!("database lock poisoned: {e}")))
    }

    // ── Admin helpers ─────────────────────────────────

    pub fn create_hackathon(&self, new: &NewHackathon) -> Result<Hackathon> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO hackathons (name, description, deadline, prize_pool, is_active) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![new.name, new.description, new.deadline, new.prize_pool, new.is_active],
        )
        .map_err(db_err)?;
        let id = conn.last_insert_rowid();
        tracing::info!("🏁 Hackathon created: '{}' ({id})", new.name);
        Ok(Hackathon {
            id,
            name: new.name.clone(),
            description: new.description.clone(),
            deadline: new.deadline,
            prize_pool: new.prize_pool.clone(),
            is_active: new.is_active,
        })
    }

    pub fn create_stage(&self, new: &NewStage) -> Result<Stage> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO stages (hackathon_id, number, name, description, deadline, is_active) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                new.hackathon_id,
                new.number,
                new.name,
                new.description,
                new.deadline,
                new.is_active
            ],
        )
        .map_err(db_err)?;
        let id = conn.last_insert_rowid();
        tracing::info!(
            "🗂️ Stage {} created for hackathon {} ({id})",
            new.number,
            new.hackathon_id
        );
        Ok(Stage {
            id,
            hackathon_id: new.hackathon_id,
            number: new.number,
            name: new.name.clone(),
            description: new.description.clone(),
            deadline: new.deadline,
            is_active: new.is_active,
        })
    }

    pub fn set_stage_active(&self, id: StageId, active: bool) -> Result<()> {
        let changed = self
            .conn()?
            .execute(
                "UPDATE stages SET is_active = ?2 WHERE id = ?1",
                params![id, active],
            )
            .map_err(db_err)?;
        if changed == 0 {
            return Err(HackError::not_found(format!("stage {id}")));
        }
        Ok(())
    }

    pub fn set_hackathon_active(&self, id: HackathonId, active: bool) -> Result<()> {
        let changed = self
            .conn()?
            .execute(
                "UPDATE hackathons SET is_active = ?2 WHERE id = ?1",
                params![id, active],
            )
            .map_err(db_err)?;
        if changed == 0 {
            return Err(HackError::not_found(format!("hackathon {id}")));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn get_participant(&self, id: ParticipantId) -> Result<Option<Participant>> {
        let conn = self.conn()?;
        query_opt(
            &conn,
            &format!("{PARTICIPANT_SELECT} WHERE id = ?1"),
            [id],
            row_to_participant,
        )
    }

    async fn upsert_participant(&self, p: &Participant) -> Result<()> {
        self.conn()?
            .execute(
                "INSERT INTO participants (id, username, first_name, last_name, birth_date, gender, location, phone, pinfl, language, consent_at, registration_complete, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                 ON CONFLICT(id) DO UPDATE SET
                    username = excluded.username,
                    first_name = excluded.first_name,
                    last_name = excluded.last_name,
                    birth_date = excluded.birth_date,
                    gender = excluded.gender,
                    location = excluded.location,
                    phone = excluded.phone,
                    pinfl = excluded.pinfl,
                    language = excluded.language,
                    consent_at = excluded.consent_at,
                    registration_complete = excluded.registration_complete",
                params![
                    p.id,
                    p.username,
                    p.first_name,
                    p.last_name,
                    p.birth_date,
                    p.gender.as_str(),
                    p.location,
                    p.phone,
                    p.pinfl,
                    p.language,
                    p.consent_at,
                    p.registration_complete,
                    p.created_at
                ],
            )
            .map_err(db_err)?;
        Ok(())
    }

    async fn update_participant_field(
        &self,
        id: ParticipantId,
        field: ProfileField,
        value: &str,
    ) -> Result<()> {
        // Normalize to the stored representation of each column.
        let value = match field {
            ProfileField::BirthDate => NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .map_err(|_| ValidationError::BirthDate)?
                .format("%Y-%m-%d")
                .to_string(),
            ProfileField::Gender => value.parse::<Gender>()?.as_str().to_string(),
            ProfileField::Language => {
                if !SUPPORTED_LANGUAGES.contains(&value) {
                    return Err(ValidationError::Language.into());
                }
                value.to_string()
            }
            ProfileField::FirstName | ProfileField::LastName | ProfileField::Location => {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err(ValidationError::Empty(field.column()).into());
                }
                trimmed.to_string()
            }
        };
        let sql = format!(
            "UPDATE participants SET {} = ?2 WHERE id = ?1",
            field.column()
        );
        let changed = self
            .conn()?
            .execute(&sql, params![id, value])
            .map_err(db_err)?;
        if changed == 0 {
            return Err(HackError::not_found(format!("participant {id}")));
        }
        Ok(())
    }

    async fn get_active_hackathons(&self) -> Result<Vec<Hackathon>> {
        let conn = self.conn()?;
        query_list(
            &conn,
            &format!("{HACKATHON_SELECT} WHERE is_active = 1 ORDER BY id"),
            [],
            row_to_hackathon,
        )
    }

    async fn get_hackathon(&self, id: HackathonId) -> Result<Option<Hackathon>> {
        let conn = self.conn()?;
        query_opt(
            &conn,
            &format!("{HACKATHON_SELECT} WHERE id = ?1"),
            [id],
            row_to_hackathon,
        )
    }

    async fn list_stages_for_hackathon(&self, id: HackathonId) -> Result<Vec<Stage>> {
        let conn = self.conn()?;
        query_list(
            &conn,
            &format!("{STAGE_SELECT} WHERE s.hackathon_id = ?1 ORDER BY s.number"),
            [id],
            row_to_stage,
        )
    }

    async fn get_stage(&self, id: StageId) -> Result<Option<Stage>> {
        let conn = self.conn()?;
        query_opt(
            &conn,
            &format!("{STAGE_SELECT} WHERE s.id = ?1"),
            [id],
            row_to_stage,
        )
    }

    async fn get_active_stages(&self) -> Result<Vec<Stage>> {
        let conn = self.conn()?;
        query_list(
            &conn,
            &format!(
                "{STAGE_SELECT} JOIN hackathons h ON h.id = s.hackathon_id
                 WHERE s.is_active = 1 AND h.is_active = 1
                 ORDER BY s.hackathon_id, s.number"
            ),
            [],
            row_to_stage,
        )
    }

    async fn create_team(&self, team: &NewTeam, code: &str) -> Result<Team> {
        let now = Utc::now();
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(db_err)?;
        tx.execute(
            "INSERT INTO teams (hackathon_id, name, code, leader_id, field, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![team.hackathon_id, team.name, code, team.leader_id, team.field, now],
        )
        .map_err(|e| conflict_or_db(e, Conflict::JoinCodeTaken))?;
        let id = tx.last_insert_rowid();
        tx.execute(
            "INSERT INTO team_members (team_id, hackathon_id, participant_id, role, portfolio, is_leader, joined_at) VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)",
            params![
                id,
                team.hackathon_id,
                team.leader_id,
                team.leader_role,
                team.leader_portfolio,
                now
            ],
        )
        .map_err(|e| conflict_or_db(e, Conflict::DuplicateMembership))?;
        tx.commit().map_err(db_err)?;

        Ok(Team {
            id,
            hackathon_id: team.hackathon_id,
            name: team.name.clone(),
            code: code.to_string(),
            leader_id: team.leader_id,
            field: team.field.clone(),
            created_at: now,
        })
    }

    async fn get_team(&self, id: TeamId) -> Result<Option<Team>> {
        let conn = self.conn()?;
        query_opt(
            &conn,
            &format!("{TEAM_SELECT} WHERE t.id = ?1"),
            [id],
            row_to_team,
        )
    }

    async fn get_team_by_code(&self, code: &str) -> Result<Option<Team>> {
        let conn = self.conn()?;
        query_opt(
            &conn,
            &format!("{TEAM_SELECT} WHERE t.code = ?1"),
            [code],
            row_to_team,
        )
    }

    async fn get_team_members(&self, team_id: TeamId) -> Result<Vec<TeamMember>> {
        let conn = self.conn()?;
        query_list(
            &conn,
            &format!("{MEMBER_SELECT} WHERE team_id = ?1 ORDER BY joined_at, id"),
            [team_id],
            row_to_member,
        )
    }

    async fn add_team_member(&self, m: &NewMembership) -> Result<TeamMember> {
        let now = Utc::now();
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(db_err)?;
        let hackathon_id: HackathonId = tx
            .query_row(
                "SELECT hackathon_id FROM teams WHERE id = ?1",
                [m.team_id],
                |r| r.get(0),
            )
            .optional()
            .map_err(db_err)?
            .ok_or_else(|| HackError::not_found(format!("team {}", m.team_id)))?;

        if m.is_leader {
            tx.execute(
                "UPDATE team_members SET is_leader = 0 WHERE team_id = ?1",
                [m.team_id],
            )
            .map_err(db_err)?;
        }
        tx.execute(
            "INSERT INTO team_members (team_id, hackathon_id, participant_id, role, portfolio, is_leader, joined_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                m.team_id,
                hackathon_id,
                m.participant_id,
                m.role,
                m.portfolio,
                m.is_leader,
                now
            ],
        )
        .map_err(|e| conflict_or_db(e, Conflict::DuplicateMembership))?;
        if m.is_leader {
            tx.execute(
                "UPDATE teams SET leader_id = ?2 WHERE id = ?1",
                params![m.team_id, m.participant_id],
            )
            .map_err(db_err)?;
        }
        tx.commit().map_err(db_err)?;

        Ok(TeamMember {
            team_id: m.team_id,
            participant_id: m.participant_id,
            role: m.role.clone(),
            portfolio: m.portfolio.clone(),
            is_leader: m.is_leader,
            joined_at: now,
        })
    }

    async fn remove_team_member(
        &self,
        team_id: TeamId,
        participant_id: ParticipantId,
    ) -> Result<bool> {
        let changed = self
            .conn()?
            .execute(
                "DELETE FROM team_members WHERE team_id = ?1 AND participant_id = ?2",
                params![team_id, participant_id],
            )
            .map_err(db_err)?;
        Ok(changed > 0)
    }

    async fn remove_member_with_succession(
        &self,
        team_id: TeamId,
        participant_id: ParticipantId,
    ) -> Result<Departure> {
        let mut conn = self.conn()?;
        // IMMEDIATE takes the write lock up front so other processes sharing
        // the file cannot change the membership between our read and writes.
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(db_err)?;
        let team = query_opt(
            &tx,
            &format!("{TEAM_SELECT} WHERE t.id = ?1"),
            [team_id],
            row_to_team,
        )?
        .ok_or_else(|| HackError::not_found(format!("team {team_id}")))?;
        let members = query_list(
            &tx,
            &format!("{MEMBER_SELECT} WHERE team_id = ?1 ORDER BY joined_at, id"),
            [team_id],
            row_to_member,
        )?;
        if !members.iter().any(|m| m.participant_id == participant_id) {
            return Err(HackError::not_found(format!(
                "participant {participant_id} in team {team_id}"
            )));
        }

        let successor = members
            .iter()
            .find(|m| m.participant_id != participant_id)
            .map(|m| m.participant_id);
        let departure = match successor {
            None => {
                delete_team_rows(&tx, team_id)?;
                Departure::TeamDeleted
            }
            Some(successor) if team.leader_id == participant_id => {
                tx.execute(
                    "UPDATE team_members SET is_leader = (participant_id = ?2) WHERE team_id = ?1",
                    params![team_id, successor],
                )
                .map_err(db_err)?;
                tx.execute(
                    "UPDATE teams SET leader_id = ?2 WHERE id = ?1",
                    params![team_id, successor],
                )
                .map_err(db_err)?;
                Departure::LeaderTransferred(successor)
            }
            Some(_) => Departure::Removed,
        };
        if departure != Departure::TeamDeleted {
            tx.execute(
                "DELETE FROM team_members WHERE team_id = ?1 AND participant_id = ?2",
                params![team_id, participant_id],
            )
            .map_err(db_err)?;
        }
        tx.commit().map_err(db_err)?;
        Ok(departure)
    }

    async fn update_team_leader(&self, team_id: TeamId, leader_id: ParticipantId) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(db_err)?;
        let is_member: bool = tx
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM team_members WHERE team_id = ?1 AND participant_id = ?2)",
                params![team_id, leader_id],
                |r| r.get(0),
            )
            .map_err(db_err)?;
        if !is_member {
            return Err(HackError::not_found(format!(
                "participant {leader_id} in team {team_id}"
            )));
        }
        tx.execute(
            "UPDATE team_members SET is_leader = (participant_id = ?2) WHERE team_id = ?1",
            params![team_id, leader_id],
        )
        .map_err(db_err)?;
        tx.execute(
            "UPDATE teams SET leader_id = ?2 WHERE id = ?1",
            params![team_id, leader_id],
        )
        .map_err(db_err)?;
        tx.commit().map_err(db_err)
    }

    async fn delete_team(&self, team_id: TeamId) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(db_err)?;
        if !delete_team_rows(&tx, team_id)? {
            return Err(HackError::not_found(format!("team {team_id}")));
        }
        tx.commit().map_err(db_err)
    }

    async fn get_user_team_for_hackathon(
        &self,
        participant_id: ParticipantId,
        hackathon_id: HackathonId,
    ) -> Result<Option<Team>> {
        let conn = self.conn()?;
        query_opt(
            &conn,
            &format!(
                "{TEAM_SELECT} JOIN team_members m ON m.team_id = t.id
                 WHERE m.participant_id = ?1 AND m.hackathon_id = ?2"
            ),
            params![participant_id, hackathon_id],
            row_to_team,
        )
    }

    async fn upsert_submission(
        &self,
        stage_id: StageId,
        team_id: TeamId,
        participant_id: ParticipantId,
        link: &str,
    ) -> Result<Submission> {
        let now = Utc::now();
        self.conn()?
            .execute(
                "INSERT INTO submissions (stage_id, team_id, participant_id, link, submitted_at) VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(stage_id, team_id) DO UPDATE SET
                    participant_id = excluded.participant_id,
                    link = excluded.link,
                    submitted_at = excluded.submitted_at",
                params![stage_id, team_id, participant_id, link, now],
            )
            .map_err(db_err)?;
        Ok(Submission {
            stage_id,
            team_id,
            participant_id,
            link: link.to_string(),
            submitted_at: now,
        })
    }

    async fn get_submission_for_team_stage(
        &self,
        stage_id: StageId,
        team_id: TeamId,
    ) -> Result<Option<Submission>> {
        let conn = self.conn()?;
        query_opt(
            &conn,
            "SELECT stage_id, team_id, participant_id, link, submitted_at FROM submissions WHERE stage_id = ?1 AND team_id = ?2",
            params![stage_id, team_id],
            |row| {
                Ok(Submission {
                    stage_id: row.get(0)?,
                    team_id: row.get(1)?,
                    participant_id: row.get(2)?,
                    link: row.get(3)?,
                    submitted_at: row.get(4)?,
                })
            },
        )
    }

    async fn record_reminder_receipt_if_absent(
        &self,
        stage_id: StageId,
        participant_id: ParticipantId,
        days_left: i64,
    ) -> Result<bool> {
        let changed = self
            .conn()?
            .execute(
                "INSERT OR IGNORE INTO reminder_receipts (stage_id, participant_id, days_left, recorded_at) VALUES (?1, ?2, ?3, ?4)",
                params![stage_id, participant_id, days_left, Utc::now()],
            )
            .map_err(db_err)?;
        Ok(changed == 1)
    }

    async fn get_hackathon_participants(
        &self,
        hackathon_id: HackathonId,
    ) -> Result<Vec<ParticipantId>> {
        let conn = self.conn()?;
        query_list(
            &conn,
            "SELECT DISTINCT participant_id FROM team_members WHERE hackathon_id = ?1 ORDER BY participant_id",
            [hackathon_id],
            |r| r.get(0),
        )
    }
}
