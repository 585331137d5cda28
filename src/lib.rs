//! # FlowFi Streams
//!
//! Payment streams: a sender commits an amount that is released to a
//! recipient continuously between a start and an end time. The recipient can
//! withdraw whatever has accrued; the sender can cancel, freezing accrual.
//!
//! ## Design Principles
//!
//! - **Integer atomic units**: amounts are `u64` atomic units (10^-8 APT);
//!   accrual truncates, never rounds up
//! - **Pure accrual**: [`compute_accrual`] takes the evaluation time as an
//!   argument and has no side effects
//! - **Validated writes**: the [`StreamStore`] rejects any write that would
//!   break a stream invariant
//! - **Simulated ledger**: receipts carry random stand-in hashes
//!
//! ## Example
//!
//! ```no_run
//! use flowfi_streams::StreamEngine;
//! use std::io::Cursor;
//!
//! let a = format!("0x{}", "a".repeat(64));
//! let b = format!("0x{}", "b".repeat(64));
//! let csv = format!(
//!     "type,time,account,stream,recipient,amount,duration\ncreate,0,{},,{},1.0,1\n",
//!     a, b
//! );
//! let engine = StreamEngine::new();
//! engine.process_csv(Cursor::new(csv)).unwrap();
//! engine.write_output(std::io::stdout(), 1800).unwrap();
//! ```

pub mod accrual;
pub mod address;
pub mod amount;
pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod receipt;
pub mod store;
pub mod stream;

pub use accrual::{compute_accrual, refundable_amount, Accrual, StreamPhase};
pub use address::Address;
pub use amount::{format_apt, parse_apt, Apt, ATOMIC_UNITS_PER_APT};
pub use command::{CommandKind, CommandRecord, ParsedCommand};
pub use config::Config;
pub use engine::{AccountStreams, StreamEngine, StreamView};
pub use error::{Result, StreamError};
pub use receipt::{TxHash, TxReceipt};
pub use store::{InMemoryStore, StreamStore};
pub use stream::{NewStream, Stream, StreamId, StreamStatus, StreamUpdate};
