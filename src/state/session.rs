use chrono::NaiveDate;

use super::record::UserRecord;
use crate::errors::BotError;
use crate::types::PendingInput;

/// One user's slot in the store: the record (once `setdate` succeeded) plus
/// the pending-input marker.
#[derive(Debug, Default)]
pub struct UserSession {
    pub record: Option<UserRecord>,
    pub pending: PendingInput,
}

impl UserSession {
    /// Replace the record with a fresh one starting at `start_date`.
    /// Returns the record that was replaced, if any.
    pub fn reset(&mut self, start_date: NaiveDate) -> Option<UserRecord> {
        self.record.replace(UserRecord::new(start_date))
    }

    pub fn record(&self) -> Result<&UserRecord, BotError> {
        self.record.as_ref().ok_or(BotError::NoRecord)
    }

    pub fn record_mut(&mut self) -> Result<&mut UserRecord, BotError> {
        self.record.as_mut().ok_or(BotError::NoRecord)
    }

    /// Arm a new pending state, discarding whatever was pending.
    pub fn arm(&mut self, pending: PendingInput) -> PendingInput {
        std::mem::replace(&mut self.pending, pending)
    }

    /// Consume the pending state, leaving the session idle.
    pub fn take_pending(&mut self) -> PendingInput {
        std::mem::take(&mut self.pending)
    }
}

/// Strict ISO calendar date.
pub fn parse_date(input: &str) -> Result<NaiveDate, BotError> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|_| BotError::InvalidDateFormat(input.to_string()))
}
