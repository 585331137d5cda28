//! Stream storage.
//!
//! The engine talks to storage only through [`StreamStore`]. Every write is
//! validated here, so no caller can persist a stream that breaks its
//! invariants.

use crate::address::Address;
use crate::error::{Result, StreamError};
use crate::stream::{NewStream, Stream, StreamId, StreamUpdate};
use log::debug;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Repository of stream records.
pub trait StreamStore {
    /// Validates and appends a stream, returning its newly assigned id.
    fn add(&self, stream: NewStream) -> Result<StreamId>;

    /// Looks up a stream by id.
    fn get_by_id(&self, id: StreamId) -> Option<Stream>;

    /// Merges `update` into the stream with `id`.
    ///
    /// Returns `Ok(false)` if no such stream exists. A write that would break
    /// an invariant is rejected and the stored record is left unchanged.
    fn update(&self, id: StreamId, update: StreamUpdate) -> Result<bool>;

    /// All streams where `address` is the sender or recipient, in insertion order.
    fn list_by_address(&self, address: &Address) -> Vec<Stream>;

    /// Every stream, in insertion order.
    fn list_all(&self) -> Vec<Stream>;
}

/// Process-local store. Operations are serialized through a single mutex.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    streams: Mutex<Vec<Stream>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        InMemoryStore {
            streams: Mutex::new(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Stream>> {
        // Records are only replaced wholesale after validation, so a panic
        // elsewhere cannot leave one half-written.
        self.streams.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StreamStore for InMemoryStore {
    fn add(&self, stream: NewStream) -> Result<StreamId> {
        validate_new(&stream)?;

        let mut streams = self.lock();
        let id = StreamId(streams.len() as u64 + 1);
        streams.push(stream.into_stream(id));

        debug!("Stored stream {}", id);
        Ok(id)
    }

    fn get_by_id(&self, id: StreamId) -> Option<Stream> {
        self.lock().iter().find(|s| s.id == id).cloned()
    }

    fn update(&self, id: StreamId, update: StreamUpdate) -> Result<bool> {
        let mut streams = self.lock();
        let slot = match streams.iter_mut().find(|s| s.id == id) {
            Some(slot) => slot,
            None => return Ok(false),
        };

        let mut merged = slot.clone();
        merged.apply(&update);
        validate_stored(&merged)?;

        *slot = merged;
        debug!("Updated stream {}", id);
        Ok(true)
    }

    fn list_by_address(&self, address: &Address) -> Vec<Stream> {
        self.lock()
            .iter()
            .filter(|s| s.involves(address))
            .cloned()
            .collect()
    }

    fn list_all(&self) -> Vec<Stream> {
        self.lock().clone()
    }
}

fn validate_new(stream: &NewStream) -> Result<()> {
    check_timing(stream.start_time, stream.end_time)?;

    if stream.amount == 0 {
        return Err(StreamError::InvalidAmount(stream.amount.to_string()));
    }

    if stream.sender == stream.recipient {
        return Err(StreamError::SelfStream);
    }

    Ok(())
}

fn validate_stored(stream: &Stream) -> Result<()> {
    check_timing(stream.start_time, stream.end_time)?;

    if stream.withdrawn_amount > stream.amount {
        return Err(StreamError::WithdrawalExceedsAmount {
            withdrawn: stream.withdrawn_amount,
            amount: stream.amount,
        });
    }

    Ok(())
}

fn check_timing(start_time: i64, end_time: i64) -> Result<()> {
    if end_time <= start_time {
        return Err(StreamError::InvalidStreamTiming {
            start_time,
            end_time,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::StreamStatus;
    use std::str::FromStr;
    use std::sync::Arc;
    use std::thread;

    fn addr(fill: char) -> Address {
        Address::from_str(&format!("0x{}", fill.to_string().repeat(64))).unwrap()
    }

    fn new_stream(sender: char, recipient: char) -> NewStream {
        NewStream::new(addr(sender), addr(recipient), 1_000, 0, 100)
    }

    #[test]
    fn test_add_assigns_sequential_ids() {
        let store = InMemoryStore::new();
        assert_eq!(store.add(new_stream('a', 'b')).unwrap(), StreamId(1));
        assert_eq!(store.add(new_stream('a', 'c')).unwrap(), StreamId(2));
        assert_eq!(store.add(new_stream('c', 'b')).unwrap(), StreamId(3));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_add_rejects_bad_timing_without_storing() {
        let store = InMemoryStore::new();
        let bad = NewStream::new(addr('a'), addr('b'), 1_000, 100, 100);

        assert!(matches!(
            store.add(bad),
            Err(StreamError::InvalidStreamTiming { .. })
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_add_rejects_zero_amount_and_self_stream() {
        let store = InMemoryStore::new();
        let zero = NewStream::new(addr('a'), addr('b'), 0, 0, 100);
        assert!(matches!(store.add(zero), Err(StreamError::InvalidAmount(_))));
        assert!(matches!(
            store.add(new_stream('a', 'a')),
            Err(StreamError::SelfStream)
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_rejected_add_does_not_consume_an_id() {
        let store = InMemoryStore::new();
        let _ = store.add(new_stream('a', 'a'));
        assert_eq!(store.add(new_stream('a', 'b')).unwrap(), StreamId(1));
    }

    #[test]
    fn test_get_by_id() {
        let store = InMemoryStore::new();
        let id = store.add(new_stream('a', 'b')).unwrap();

        let stream = store.get_by_id(id).unwrap();
        assert_eq!(stream.sender, addr('a'));
        assert!(store.get_by_id(StreamId(99)).is_none());
    }

    #[test]
    fn test_update_merges_fields() {
        let store = InMemoryStore::new();
        let id = store.add(new_stream('a', 'b')).unwrap();

        assert!(store.update(id, StreamUpdate::withdrawn(250)).unwrap());
        assert!(store.update(id, StreamUpdate::cancelled(50)).unwrap());

        let stream = store.get_by_id(id).unwrap();
        assert_eq!(stream.withdrawn_amount, 250);
        assert_eq!(stream.status, StreamStatus::Cancelled);
        assert_eq!(stream.cancelled_at, Some(50));
    }

    #[test]
    fn test_update_unknown_id_returns_false() {
        let store = InMemoryStore::new();
        assert!(!store.update(StreamId(7), StreamUpdate::withdrawn(1)).unwrap());
    }

    #[test]
    fn test_update_rejects_overdraw_and_keeps_record() {
        let store = InMemoryStore::new();
        let id = store.add(new_stream('a', 'b')).unwrap();
        store.update(id, StreamUpdate::withdrawn(400)).unwrap();

        let result = store.update(id, StreamUpdate::withdrawn(1_001));
        assert!(matches!(
            result,
            Err(StreamError::WithdrawalExceedsAmount {
                withdrawn: 1_001,
                amount: 1_000
            })
        ));
        assert_eq!(store.get_by_id(id).unwrap().withdrawn_amount, 400);
    }

    #[test]
    fn test_list_by_address_matches_either_side() {
        let store = InMemoryStore::new();
        store.add(new_stream('a', 'b')).unwrap();
        store.add(new_stream('c', 'a')).unwrap();
        store.add(new_stream('b', 'c')).unwrap();

        let ids: Vec<_> = store.list_by_address(&addr('a')).iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![StreamId(1), StreamId(2)]);
        assert!(store.list_by_address(&addr('d')).is_empty());
    }

    #[test]
    fn test_concurrent_adds_get_unique_ids() {
        let store = Arc::new(InMemoryStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    (0..25)
                        .map(|_| store.add(new_stream('a', 'b')).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids: Vec<_> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 200);
        assert_eq!(ids.last(), Some(&StreamId(200)));
    }
}
