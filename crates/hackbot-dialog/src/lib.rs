//! # Hackbot Dialog
//! Drives registration, team creation, team joining, submissions and
//! profile edits as one state machine per participant.
//!
//! Transitions are pure (`machine::advance`); the controller applies their
//! effects against the store and the team registry.

pub mod controller;
pub mod machine;
pub mod messages;
pub mod router;
pub mod validate;

pub use controller::DialogController;
pub use machine::{Commit, DialogState, Effect, Input, Session, Transition};
pub use router::Interaction;
