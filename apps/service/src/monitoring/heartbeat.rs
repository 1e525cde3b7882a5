//! Deadline evaluation for passively pinged cron monitors.

use chrono::{DateTime, Duration, Utc};

/// Inputs of one heartbeat evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatWindow {
    pub expected_interval_minutes: u32,
    pub grace_period_minutes: u32,
    pub last_ping_at: Option<DateTime<Utc>>,
    pub monitor_created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeartbeatVerdict {
    /// Last ping is within the window
    OnSchedule,
    /// Never pinged, but the first deadline has not passed yet. Nothing is written.
    AwaitingFirstPing,
    /// Deadline passed
    Missed { minutes_overdue: i64, message: String },
}

impl HeartbeatWindow {
    pub fn tolerance(&self) -> Duration {
        Duration::minutes(i64::from(self.expected_interval_minutes) + i64::from(self.grace_period_minutes))
    }

    pub fn deadline(&self) -> DateTime<Utc> {
        self.last_ping_at.unwrap_or(self.monitor_created_at) + self.tolerance()
    }

    pub fn evaluate(&self, now: DateTime<Utc>) -> HeartbeatVerdict {
        let deadline = self.deadline();

        if now <= deadline {
            return match self.last_ping_at {
                Some(_) => HeartbeatVerdict::OnSchedule,
                None => HeartbeatVerdict::AwaitingFirstPing,
            };
        }

        let minutes_overdue = (now - deadline).num_minutes();
        let message = match self.last_ping_at {
            None => "Never received initial ping".to_string(),
            Some(last) => format!(
                "Missed ping by {} minutes (last ping {} minutes ago, expected every {} minutes with {} minute grace period)",
                minutes_overdue,
                (now - last).num_minutes(),
                self.expected_interval_minutes,
                self.grace_period_minutes,
            ),
        };

        HeartbeatVerdict::Missed { minutes_overdue, message }
    }
}
