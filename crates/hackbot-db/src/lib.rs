//! # Hackbot DB
//! SQLite persistence for participants, hackathons, stages, teams,
//! submissions and reminder receipts.

pub mod schema;
pub mod sqlite;

pub use sqlite::{NewHackathon, NewStage, SqliteStore};
