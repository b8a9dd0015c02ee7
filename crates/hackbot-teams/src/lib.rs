//! # Hackbot Teams
//! Team creation with unique join codes, capacity-checked joining and
//! leader succession when members leave.

pub mod code;
pub mod registry;

pub use code::CodeGenerator;
pub use hackbot_core::models::Departure;
pub use registry::TeamRegistry;
