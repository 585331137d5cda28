//! Error types for the stream engine.

use crate::stream::StreamId;
use thiserror::Error;

/// Result type alias for stream operations
pub type Result<T> = std::result::Result<T, StreamError>;

/// Errors that can occur while creating, mutating or evaluating streams.
#[derive(Error, Debug)]
pub enum StreamError {
    /// Stream end time is not strictly after its start time
    #[error("Invalid stream timing: end time {end_time} must be after start time {start_time}")]
    InvalidStreamTiming { start_time: i64, end_time: i64 },

    /// No stream exists with the given id
    #[error("Stream {0} not found")]
    StreamNotFound(StreamId),

    /// Address is not `0x` followed by 64 hex characters
    #[error("Invalid address: {0:?}")]
    InvalidAddress(String),

    /// Amount is zero, negative, or not a number
    #[error("Invalid amount: {0:?}")]
    InvalidAmount(String),

    /// Sender and recipient are the same account
    #[error("Sender and recipient must be different accounts")]
    SelfStream,

    /// A write would push the withdrawn amount past the deposit
    #[error("Withdrawn amount {withdrawn} exceeds stream amount {amount}")]
    WithdrawalExceedsAmount { withdrawn: u64, amount: u64 },

    /// Caller is not the stream sender
    #[error("Account {0} is not the sender of this stream")]
    NotSender(String),

    /// Caller is not the stream recipient
    #[error("Account {0} is not the recipient of this stream")]
    NotRecipient(String),

    /// Stream has already been cancelled
    #[error("Stream {0} is not active")]
    StreamNotActive(StreamId),

    /// Stream has fully streamed and can no longer be cancelled
    #[error("Stream {0} is already settled")]
    StreamSettled(StreamId),

    /// Nothing has accrued beyond what was already withdrawn
    #[error("Nothing to withdraw from stream {0}")]
    NothingToWithdraw(StreamId),

    /// Failed to open or read the input file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing error
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid command record
    #[error("Invalid command at row {row}: {message}")]
    InvalidRecord { row: usize, message: String },

    /// Evaluation time could not be parsed
    #[error("Invalid evaluation time {0:?}, expected Unix seconds")]
    InvalidNow(String),

    /// Missing input file argument
    #[error("Missing input file argument. Usage: flowfi-streams <commands.csv> [now]")]
    MissingArgument,
}
