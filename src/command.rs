//! Command models for CSV parsing and internal representation.

use crate::address::Address;
use crate::amount::Apt;
use crate::error::{Result, StreamError};
use crate::stream::StreamId;
use serde::Deserialize;
use std::str::FromStr;

/// Raw command record as read from CSV.
///
/// Columns not used by a command type may be left empty.
#[derive(Debug, Deserialize)]
pub struct CommandRecord {
    /// Command type: create, withdraw, cancel
    #[serde(rename = "type")]
    pub cmd_type: String,

    /// Unix seconds at which the command is issued
    pub time: i64,

    /// Acting account: the sender for create and cancel, the recipient for withdraw
    pub account: String,

    /// Target stream (withdraw, cancel)
    pub stream: Option<u64>,

    /// Recipient address (create)
    pub recipient: Option<String>,

    /// Amount in APT (create)
    pub amount: Option<String>,

    /// Duration in whole hours (create)
    pub duration: Option<String>,
}

impl CommandRecord {
    /// Parses the raw CSV record into a typed command.
    ///
    /// `row` is only used to label the error.
    pub fn parse(&self, row: usize) -> Result<ParsedCommand> {
        let invalid = |message: String| StreamError::InvalidRecord { row, message };

        let account = Address::from_str(&self.account).map_err(|e| invalid(e.to_string()))?;
        let cmd_type = self.cmd_type.trim().to_lowercase();

        let kind = match cmd_type.as_str() {
            "create" => {
                let recipient = self
                    .recipient
                    .as_deref()
                    .ok_or_else(|| invalid("create requires a recipient".to_string()))?;
                let recipient = Address::from_str(recipient).map_err(|e| invalid(e.to_string()))?;

                let amount = required(&self.amount)
                    .ok_or_else(|| invalid("create requires an amount".to_string()))?;
                let amount = Apt::from_str(amount).map_err(|e| invalid(e.to_string()))?;

                let duration = required(&self.duration)
                    .ok_or_else(|| invalid("create requires a duration".to_string()))?;
                let duration_hours = duration
                    .parse::<u32>()
                    .map_err(|_| invalid(format!("invalid duration {:?}", duration)))?;

                CommandKind::Create {
                    recipient,
                    amount,
                    duration_hours,
                }
            }
            "withdraw" => CommandKind::Withdraw(self.stream_id(row)?),
            "cancel" => CommandKind::Cancel(self.stream_id(row)?),
            other => return Err(invalid(format!("unknown command type {:?}", other))),
        };

        Ok(ParsedCommand {
            time: self.time,
            account,
            kind,
        })
    }

    fn stream_id(&self, row: usize) -> Result<StreamId> {
        self.stream
            .map(StreamId)
            .ok_or_else(|| StreamError::InvalidRecord {
                row,
                message: format!("{} requires a stream id", self.cmd_type.trim()),
            })
    }
}

fn required(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// A parsed and validated command ready for the engine.
#[derive(Debug, Clone)]
pub struct ParsedCommand {
    /// Unix seconds
    pub time: i64,

    /// Acting account
    pub account: Address,

    /// Command type with associated data
    pub kind: CommandKind,
}

/// Command variants with associated data.
#[derive(Debug, Clone)]
pub enum CommandKind {
    /// Open a stream from the acting account, starting at the command time.
    Create {
        recipient: Address,
        amount: Apt,
        duration_hours: u32,
    },

    /// Recipient claims everything accrued so far.
    Withdraw(StreamId),

    /// Sender stops the stream.
    Cancel(StreamId),
}
