//! Database schema. Every statement is idempotent so `migrate` can run on each open.

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS participants (
    id INTEGER PRIMARY KEY,
    username TEXT,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    birth_date TEXT NOT NULL,
    gender TEXT NOT NULL,
    location TEXT NOT NULL,
    phone TEXT NOT NULL,
    pinfl TEXT NOT NULL,
    language TEXT NOT NULL DEFAULT 'en',
    consent_at TEXT NOT NULL,
    registration_complete INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS hackathons (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    deadline TEXT,
    prize_pool TEXT,
    is_active INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS stages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    hackathon_id INTEGER NOT NULL REFERENCES hackathons(id),
    number INTEGER NOT NULL,
    name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    deadline TEXT,
    is_active INTEGER NOT NULL DEFAULT 0,
    UNIQUE(hackathon_id, number)
);

CREATE TABLE IF NOT EXISTS teams (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    hackathon_id INTEGER NOT NULL REFERENCES hackathons(id),
    name TEXT NOT NULL,
    code TEXT NOT NULL UNIQUE,
    leader_id INTEGER NOT NULL REFERENCES participants(id),
    field TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS team_members (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    team_id INTEGER NOT NULL REFERENCES teams(id),
    hackathon_id INTEGER NOT NULL REFERENCES hackathons(id),
    participant_id INTEGER NOT NULL REFERENCES participants(id),
    role TEXT NOT NULL,
    portfolio TEXT,
    is_leader INTEGER NOT NULL DEFAULT 0,
    joined_at TEXT NOT NULL,
    UNIQUE(team_id, participant_id),
    UNIQUE(hackathon_id, participant_id)
);

CREATE TABLE IF NOT EXISTS submissions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    stage_id INTEGER NOT NULL REFERENCES stages(id),
    team_id INTEGER NOT NULL REFERENCES teams(id),
    participant_id INTEGER NOT NULL REFERENCES participants(id),
    link TEXT NOT NULL,
    submitted_at TEXT NOT NULL,
    UNIQUE(stage_id, team_id)
);

CREATE TABLE IF NOT EXISTS reminder_receipts (
    stage_id INTEGER NOT NULL,
    participant_id INTEGER NOT NULL,
    days_left INTEGER NOT NULL,
    recorded_at TEXT NOT NULL,
    PRIMARY KEY (stage_id, participant_id, days_left)
);

CREATE INDEX IF NOT EXISTS idx_stages_hackathon ON stages(hackathon_id);
CREATE INDEX IF NOT EXISTS idx_teams_hackathon ON teams(hackathon_id);
CREATE INDEX IF NOT EXISTS idx_members_participant ON team_members(participant_id);
";
