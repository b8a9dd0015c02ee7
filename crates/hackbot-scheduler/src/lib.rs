//! # Hackbot Scheduler
//! Deadline reminders: an hourly scan over active stages that sends each
//! (stage, participant, milestone) reminder at most once.
//!
//! ## Architecture
//! ```text
//! interval tick → ReminderScheduler::tick → Store (stages, receipts)
//!                                        → NotificationDispatcher → Channel
//! ```

pub mod dispatch;
pub mod engine;
pub mod milestone;

pub use dispatch::{DispatchReport, NotificationDispatcher};
pub use engine::{ReminderScheduler, TickReport, days_left, spawn_reminder_loop};
pub use milestone::Milestone;
