//! Stream business operations.
//!
//! The engine owns a [`StreamStore`] and layers the business rules on top of
//! it: who may withdraw or cancel, how much a withdrawal takes, and when a
//! cancellation is still allowed. It also drives batch processing of CSV
//! command files.

use crate::accrual::{compute_accrual, refundable_amount, Accrual, StreamPhase};
use crate::address::Address;
use crate::amount::Apt;
use crate::command::{CommandKind, CommandRecord, ParsedCommand};
use crate::error::{Result, StreamError};
use crate::receipt::TxReceipt;
use crate::store::{InMemoryStore, StreamStore};
use crate::stream::{NewStream, Stream, StreamId, StreamUpdate};
use csv::{ReaderBuilder, Trim};
use log::{debug, info, warn};
use std::io::{Read, Write};
use std::sync::{Mutex, PoisonError};

const SECONDS_PER_HOUR: i64 = 3600;

/// Streams an account takes part in, split by direction.
#[derive(Debug, Clone, Default)]
pub struct AccountStreams {
    /// Streams paying into the account.
    pub incoming: Vec<Stream>,

    /// Streams the account is paying out.
    pub outgoing: Vec<Stream>,
}

/// A stream together with everything a presentation layer needs to render it.
#[derive(Debug, Clone)]
pub struct StreamView {
    pub stream: Stream,
    pub accrual: Accrual,
    pub phase: StreamPhase,
    pub refundable: u64,
}

/// The stream engine.
///
/// All mutating operations are serialized, so a shared engine never lets
/// two withdrawals read the same accrual.
pub struct StreamEngine<S: StreamStore = InMemoryStore> {
    store: S,
    writes: Mutex<()>,
}

impl StreamEngine<InMemoryStore> {
    /// Creates an engine over an empty in-memory store.
    pub fn new() -> Self {
        Self::with_store(InMemoryStore::new())
    }
}

impl Default for StreamEngine<InMemoryStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: StreamStore> StreamEngine<S> {
    pub fn with_store(store: S) -> Self {
        StreamEngine {
            store,
            writes: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Creates a stream with explicit timestamps.
    pub fn create_stream(&self, stream: NewStream) -> Result<TxReceipt> {
        let _guard = self.writes.lock().unwrap_or_else(PoisonError::into_inner);

        let amount = stream.amount;
        let id = self.store.add(stream)?;
        let receipt = TxReceipt::new(id, amount);

        info!("Created stream {} for {} units, tx {}", id, amount, receipt.hash);
        Ok(receipt)
    }

    /// Creates a stream that starts at `now` and runs for `duration_hours`.
    pub fn create_with_duration(
        &self,
        sender: Address,
        recipient: Address,
        amount: Apt,
        duration_hours: u32,
        now: i64,
    ) -> Result<TxReceipt> {
        let end_time = i64::from(duration_hours)
            .checked_mul(SECONDS_PER_HOUR)
            .and_then(|secs| now.checked_add(secs))
            .ok_or(StreamError::InvalidStreamTiming {
                start_time: now,
                end_time: now,
            })?;

        let stream = NewStream::new(sender, recipient, amount.to_atomic()?, now, end_time);
        self.create_stream(stream)
    }

    /// Withdraws everything currently available to the recipient.
    ///
    /// Allowed on a cancelled stream for whatever accrued before cancellation.
    pub fn withdraw(&self, caller: &Address, id: StreamId, now: i64) -> Result<TxReceipt> {
        let _guard = self.writes.lock().unwrap_or_else(PoisonError::into_inner);

        let stream = self.fetch(id)?;
        if &stream.recipient != caller {
            return Err(StreamError::NotRecipient(caller.to_string()));
        }

        let accrual = compute_accrual(&stream, now)?;
        if accrual.available_amount == 0 {
            return Err(StreamError::NothingToWithdraw(id));
        }

        let withdrawn = stream.withdrawn_amount + accrual.available_amount;
        if !self.store.update(id, StreamUpdate::withdrawn(withdrawn))? {
            return Err(StreamError::StreamNotFound(id));
        }

        let receipt = TxReceipt::new(id, accrual.available_amount);
        info!(
            "Withdrew {} units from stream {}, tx {}",
            accrual.available_amount, id, receipt.hash
        );
        Ok(receipt)
    }

    /// Cancels an active stream on behalf of its sender.
    ///
    /// The receipt carries the unstreamed units returned to the sender.
    pub fn cancel(&self, caller: &Address, id: StreamId, now: i64) -> Result<TxReceipt> {
        let _guard = self.writes.lock().unwrap_or_else(PoisonError::into_inner);

        let stream = self.fetch(id)?;
        if &stream.sender != caller {
            return Err(StreamError::NotSender(caller.to_string()));
        }

        if stream.is_cancelled() {
            return Err(StreamError::StreamNotActive(id));
        }

        let accrual = compute_accrual(&stream, now)?;
        if accrual.streamed_amount >= stream.amount {
            return Err(StreamError::StreamSettled(id));
        }

        if !self.store.update(id, StreamUpdate::cancelled(now))? {
            return Err(StreamError::StreamNotFound(id));
        }

        let refund = stream.amount - accrual.streamed_amount;
        let receipt = TxReceipt::new(id, refund);
        info!(
            "Cancelled stream {}, refunding {} units, tx {}",
            id, refund, receipt.hash
        );
        Ok(receipt)
    }

    /// Incoming and outgoing streams for `address`.
    pub fn streams_for_account(&self, address: &Address) -> AccountStreams {
        // Every listed stream involves `address`, so anything not incoming is outgoing.
        let (incoming, outgoing) = self
            .store
            .list_by_address(address)
            .into_iter()
            .partition(|s| &s.recipient == address);

        AccountStreams { incoming, outgoing }
    }

    /// Evaluates a single stream at `now`.
    pub fn stream_view(&self, id: StreamId, now: i64) -> Result<StreamView> {
        let stream = self.fetch(id)?;
        view_of(stream, now)
    }

    fn fetch(&self, id: StreamId) -> Result<Stream> {
        self.store
            .get_by_id(id)
            .ok_or(StreamError::StreamNotFound(id))
    }

    /// Processes commands from a CSV reader in streaming fashion.
    ///
    /// Invalid or rejected commands are logged at warn level and skipped.
    pub fn process_csv<R: Read>(&self, reader: R) -> Result<()> {
        let mut csv_reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(reader);

        for (row_idx, result) in csv_reader.deserialize::<CommandRecord>().enumerate() {
            let row_num = row_idx + 2; // 1-indexed, accounting for header row

            match result {
                Ok(record) => match record.parse(row_num) {
                    Ok(cmd) => {
                        if let Err(e) = self.process_command(cmd, row_num) {
                            warn!("Row {}: {}", row_num, e);
                        }
                    }
                    Err(e) => warn!("{}", e),
                },
                Err(e) => {
                    warn!("Row {}: CSV parse error: {}", row_num, e);
                }
            }
        }

        Ok(())
    }

    fn process_command(&self, cmd: ParsedCommand, row: usize) -> Result<()> {
        match cmd.kind {
            CommandKind::Create {
                recipient,
                amount,
                duration_hours,
            } => {
                let receipt =
                    self.create_with_duration(cmd.account, recipient, amount, duration_hours, cmd.time)?;
                debug!("Row {}: Created stream {}", row, receipt.stream_id);
            }
            CommandKind::Withdraw(id) => {
                let receipt = self.withdraw(&cmd.account, id, cmd.time)?;
                debug!(
                    "Row {}: Withdrew {} units from stream {}",
                    row, receipt.amount, id
                );
            }
            CommandKind::Cancel(id) => {
                self.cancel(&cmd.account, id, cmd.time)?;
                debug!("Row {}: Cancelled stream {}", row, id);
            }
        }

        Ok(())
    }

    /// Writes every stream's state at `now` to CSV, in id order.
    pub fn write_output<W: Write>(&self, writer: W, now: i64) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "id",
            "sender",
            "recipient",
            "amount",
            "withdrawn",
            "status",
            "phase",
            "progress",
            "streamed",
            "available",
        ])?;

        let mut streams = self.store.list_all();
        streams.sort_by_key(|s| s.id);

        for stream in streams {
            let view = view_of(stream, now)?;
            csv_writer.write_record([
                view.stream.id.to_string(),
                view.stream.sender.to_string(),
                view.stream.recipient.to_string(),
                view.stream.amount.to_string(),
                view.stream.withdrawn_amount.to_string(),
                view.stream.status.to_string(),
                view.phase.to_string(),
                view.accrual.progress_pct.to_string(),
                view.accrual.streamed_amount.to_string(),
                view.accrual.available_amount.to_string(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}

fn view_of(stream: Stream, now: i64) -> Result<StreamView> {
    let accrual = compute_accrual(&stream, now)?;
    let refundable = refundable_amount(&stream, now)?;
    let phase = StreamPhase::of(&stream, now);
    Ok(StreamView {
        stream,
        accrual,
        phase,
        refundable,
    })
}
