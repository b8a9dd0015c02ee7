//! Countdown milestones and their reminder texts.

use hackbot_core::models::{Hackathon, Stage};

/// Days-left offsets at which a reminder is due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Milestone {
    ThreeDays,
    TwoDays,
    Tomorrow,
    LastDay,
}

impl Milestone {
    pub const ALL: [Milestone; 4] = [
        Milestone::ThreeDays,
        Milestone::TwoDays,
        Milestone::Tomorrow,
        Milestone::LastDay,
    ];

    pub fn from_days_left(days: i64) -> Option<Self> {
        match days {
            3 => Some(Self::ThreeDays),
            2 => Some(Self::TwoDays),
            1 => Some(Self::Tomorrow),
            0 => Some(Self::LastDay),
            _ => None,
        }
    }

    pub fn days_left(&self) -> i64 {
        match self {
            Self::ThreeDays => 3,
            Self::TwoDays => 2,
            Self::Tomorrow => 1,
            Self::LastDay => 0,
        }
    }

    pub fn message(&self, hackathon: &Hackathon, stage: &Stage) -> String {
        let subject = format!("stage {} \"{}\" of {}", stage.number, stage.name, hackathon.name);
        match self {
            Self::ThreeDays => format!("⏳ Heads up: 3 days left to submit {subject}."),
            Self::TwoDays => format!("⏳ Heads up: 2 days left to submit {subject}."),
            Self::Tomorrow => format!("⚠️ The deadline for {subject} is tomorrow!"),
            Self::LastDay => format!("🚨 Last day! Submissions for {subject} close today."),
        }
    }
}
