//! Accrual math: how much of a stream has been released at a given time.
//!
//! Everything here is a pure function of a [`Stream`] and a timestamp. The
//! caller supplies `now` so results are reproducible.

use crate::error::{Result, StreamError};
use crate::stream::{Stream, StreamStatus};
use serde::Serialize;
use std::fmt;

/// Display values for a stream at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Accrual {
    /// Whole percent of the duration elapsed, 0..=100.
    pub progress_pct: u8,

    /// Atomic units released to the recipient so far.
    pub streamed_amount: u64,

    /// Released but not yet withdrawn.
    pub available_amount: u64,
}

impl Accrual {
    const NONE: Accrual = Accrual {
        progress_pct: 0,
        streamed_amount: 0,
        available_amount: 0,
    };
}

/// Computes progress, streamed and withdrawable amounts at `now`.
///
/// For a cancelled stream with a recorded cancellation time the evaluation
/// time is clamped to that instant, so nothing accrues after cancellation.
///
/// Fails with [`StreamError::InvalidStreamTiming`] when `end_time <= start_time`.
///
/// # Examples
///
/// ```
/// # use std::str::FromStr;
/// # use flowfi_streams::{Address, NewStream, InMemoryStore, StreamStore, compute_accrual};
/// # let a = Address::from_str(&format!("0x{}", "a".repeat(64))).unwrap();
/// # let b = Address::from_str(&format!("0x{}", "b".repeat(64))).unwrap();
/// let store = InMemoryStore::new();
/// let id = store.add(NewStream::new(a, b, 100_000_000, 0, 3600)).unwrap();
/// let stream = store.get_by_id(id).unwrap();
///
/// let accrual = compute_accrual(&stream, 1800).unwrap();
/// assert_eq!(accrual.progress_pct, 50);
/// assert_eq!(accrual.available_amount, 50_000_000);
/// ```
pub fn compute_accrual(stream: &Stream, now: i64) -> Result<Accrual> {
    if stream.end_time <= stream.start_time {
        return Err(StreamError::InvalidStreamTiming {
            start_time: stream.start_time,
            end_time: stream.end_time,
        });
    }

    let at = effective_time(stream, now);

    if at < stream.start_time {
        return Ok(Accrual::NONE);
    }

    if at >= stream.end_time {
        return Ok(Accrual {
            progress_pct: 100,
            streamed_amount: stream.amount,
            available_amount: stream.amount.saturating_sub(stream.withdrawn_amount),
        });
    }

    // Both spans are positive here and elapsed < total.
    let total = stream.duration() as u128;
    let elapsed = (i128::from(at) - i128::from(stream.start_time)) as u128;

    let progress_pct = (elapsed * 100 / total) as u8;
    let streamed_amount = (stream.amount as u128 * elapsed / total) as u64;

    Ok(Accrual {
        progress_pct,
        streamed_amount,
        available_amount: streamed_amount.saturating_sub(stream.withdrawn_amount),
    })
}

/// Atomic units the sender would get back by cancelling at `now`.
///
/// Zero for a stream that is already cancelled.
pub fn refundable_amount(stream: &Stream, now: i64) -> Result<u64> {
    if stream.is_cancelled() {
        return Ok(0);
    }
    let accrual = compute_accrual(stream, now)?;
    Ok(stream.amount.saturating_sub(accrual.streamed_amount))
}

fn effective_time(stream: &Stream, now: i64) -> i64 {
    match (stream.status, stream.cancelled_at) {
        (StreamStatus::Cancelled, Some(cancelled_at)) => now.min(cancelled_at),
        _ => now,
    }
}

/// Where a stream is in its life, derived from stored status and time.
///
/// `Completed` is never stored; it is read off the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamPhase {
    /// Start time is in the future.
    Pending,
    /// Funds are being released.
    Streaming,
    /// End time has passed without cancellation.
    Completed,
    /// Sender cancelled the stream.
    Cancelled,
}

impl StreamPhase {
    pub fn of(stream: &Stream, now: i64) -> Self {
        match stream.status {
            StreamStatus::Cancelled => StreamPhase::Cancelled,
            StreamStatus::Completed => StreamPhase::Completed,
            StreamStatus::Active if now < stream.start_time => StreamPhase::Pending,
            StreamStatus::Active if now >= stream.end_time => StreamPhase::Completed,
            StreamStatus::Active => StreamPhase::Streaming,
        }
    }
}

impl fmt::Display for StreamPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StreamPhase::Pending => "pending",
            StreamPhase::Streaming => "streaming",
            StreamPhase::Completed => "completed",
            StreamPhase::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}
