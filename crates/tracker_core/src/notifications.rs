use serde::{Deserialize, Serialize};

use crate::analytics::ReminderStatus;
use crate::calendar::TrackedMonth;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderNotice {
    pub month: TrackedMonth,
    pub today: Option<u32>,
    pub previous: ReminderStatus,
    pub status: ReminderStatus,
    pub monthly_completion: u32,
}

impl ReminderNotice {
    pub fn message(&self) -> &'static str {
        match self.status {
            ReminderStatus::OnTrack => "You're on track this month. Keep it up!",
            ReminderStatus::NeedsFocus => "A little behind this month. Focus on today.",
            ReminderStatus::Hidden => "",
        }
    }
}

/// Platform-specific reminder adapters implement this trait.
pub trait ReminderSink: Send + Sync {
    fn reminder_changed(&self, notice: &ReminderNotice);
}
