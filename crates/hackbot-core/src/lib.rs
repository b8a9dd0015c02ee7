//! # Hackbot Core
//! Shared building blocks for the hackathon bot: configuration, the error
//! taxonomy, domain models, transport-neutral message types and the traits
//! every other crate plugs into (`Store`, `Channel`).

pub mod config;
pub mod error;
pub mod models;
pub mod traits;
pub mod types;

pub use config::HackbotConfig;
pub use error::{Conflict, HackError, Result, ValidationError};
pub use traits::{Channel, Store};
