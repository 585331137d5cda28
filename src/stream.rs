//! Stream records and their lifecycle fields.

use crate::address::Address;
use crate::amount::rate_per_second;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Store-assigned stream identifier. Sequential from 1, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamId(pub u64);

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stored lifecycle status.
///
/// Only `Active` and `Cancelled` are ever written. Completion is derived
/// from time, see [`crate::accrual::StreamPhase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamStatus {
    Active,
    Cancelled,
    Completed,
}

impl fmt::Display for StreamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StreamStatus::Active => "active",
            StreamStatus::Cancelled => "cancelled",
            StreamStatus::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// A continuous transfer of `amount` atomic units from `sender` to
/// `recipient` between `start_time` and `end_time`.
///
/// # Invariants
///
/// - `end_time > start_time`
/// - `withdrawn_amount <= amount`
/// - `sender != recipient`
///
/// These are enforced by the store on every write; a `Stream` built by hand
/// may violate them, which is why accrual still checks timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stream {
    pub id: StreamId,
    pub sender: Address,
    pub recipient: Address,

    /// Total atomic units to be streamed.
    pub amount: u64,

    /// Unix seconds.
    pub start_time: i64,
    pub end_time: i64,

    /// Derived at creation, not recomputed afterwards.
    #[serde(with = "rust_decimal::serde::str")]
    pub rate_per_second: Decimal,

    /// Cumulative atomic units already withdrawn by the recipient.
    pub withdrawn_amount: u64,

    pub status: StreamStatus,

    /// When the sender cancelled. Accrual freezes at this instant.
    pub cancelled_at: Option<i64>,
}

impl Stream {
    /// Total streaming duration in seconds.
    ///
    /// Widened so that any pair of `i64` timestamps fits.
    pub fn duration(&self) -> i128 {
        i128::from(self.end_time) - i128::from(self.start_time)
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == StreamStatus::Cancelled
    }

    /// Returns `true` if `address` is the sender or the recipient.
    pub fn involves(&self, address: &Address) -> bool {
        &self.sender == address || &self.recipient == address
    }

    /// Applies a partial update in place.
    pub(crate) fn apply(&mut self, update: &StreamUpdate) {
        if let Some(withdrawn) = update.withdrawn_amount {
            self.withdrawn_amount = withdrawn;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(cancelled_at) = update.cancelled_at {
            self.cancelled_at = Some(cancelled_at);
        }
    }
}

/// A stream that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewStream {
    pub sender: Address,
    pub recipient: Address,
    pub amount: u64,
    pub start_time: i64,
    pub end_time: i64,
}

impl NewStream {
    pub fn new(
        sender: Address,
        recipient: Address,
        amount: u64,
        start_time: i64,
        end_time: i64,
    ) -> Self {
        NewStream {
            sender,
            recipient,
            amount,
            start_time,
            end_time,
        }
    }

    /// Materializes the record under `id` with a fresh active state.
    pub(crate) fn into_stream(self, id: StreamId) -> Stream {
        let rate = rate_per_second(
            self.amount,
            i128::from(self.end_time) - i128::from(self.start_time),
        );
        Stream {
            id,
            sender: self.sender,
            recipient: self.recipient,
            amount: self.amount,
            start_time: self.start_time,
            end_time: self.end_time,
            rate_per_second: rate,
            withdrawn_amount: 0,
            status: StreamStatus::Active,
            cancelled_at: None,
        }
    }
}

/// Fields that may change after creation. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamUpdate {
    pub withdrawn_amount: Option<u64>,
    pub status: Option<StreamStatus>,
    pub cancelled_at: Option<i64>,
}

impl StreamUpdate {
    pub fn withdrawn(amount: u64) -> Self {
        StreamUpdate {
            withdrawn_amount: Some(amount),
            ..Default::default()
        }
    }

    pub fn cancelled(at: i64) -> Self {
        StreamUpdate {
            status: Some(StreamStatus::Cancelled),
            cancelled_at: Some(at),
            ..Default::default()
        }
    }
}
