//! # Snapshot Store
//!
//! Holds the latest fetched conversation list and price book as immutable,
//! wholesale-replaced snapshots. Every fetch takes a ticket; a response may
//! publish only while its ticket is still the newest issued for that
//! endpoint, so a slow stale response can never overwrite fresher data.

use chrono::{DateTime, Utc};
use log::debug;
use std::sync::{Arc, Mutex};

use crate::models::ConversationRecord;
use crate::pricebook::PriceBook;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Conversations,
    Pricing,
}

/// Proof of a dispatched fetch. Consumed on publish.
#[derive(Debug)]
pub struct Ticket {
    endpoint: Endpoint,
    seq: u64,
}

pub struct Snapshot<T> {
    pub data: Arc<T>,
    pub fetched_at: DateTime<Utc>,
}

// Manual impl: cloning shares the Arc, so T itself need not be Clone.
impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Snapshot {
            data: Arc::clone(&self.data),
            fetched_at: self.fetched_at,
        }
    }
}

#[derive(Default)]
struct Inner {
    next_seq: u64,
    latest_conversations_seq: u64,
    latest_pricing_seq: u64,
    conversations: Option<Snapshot<Vec<ConversationRecord>>>,
    pricebook: Option<Snapshot<PriceBook>>,
}

/// Explicitly-owned store; constructed by the caller and passed around,
/// never a process-wide singleton.
#[derive(Default)]
pub struct SnapshotStore {
    inner: Mutex<Inner>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        SnapshotStore::default()
    }

    /// Register an outgoing fetch. Any ticket issued later for the same
    /// endpoint supersedes this one.
    pub fn begin(&self, endpoint: Endpoint) -> Ticket {
        let mut inner = self.inner.lock().expect("snapshot store poisoned");
        inner.next_seq += 1;
        let seq = inner.next_seq;
        match endpoint {
            Endpoint::Conversations => inner.latest_conversations_seq = seq,
            Endpoint::Pricing => inner.latest_pricing_seq = seq,
        }
        Ticket { endpoint, seq }
    }

    /// Publish a conversation snapshot. Returns false (and keeps the
    /// previous snapshot) when the ticket has been superseded.
    pub fn publish_conversations(&self, ticket: Ticket, data: Vec<ConversationRecord>) -> bool {
        assert_eq!(ticket.endpoint, Endpoint::Conversations);
        let mut inner = self.inner.lock().expect("snapshot store poisoned");
        if ticket.seq != inner.latest_conversations_seq {
            debug!("discarding stale conversation response (ticket {})", ticket.seq);
            return false;
        }
        inner.conversations = Some(Snapshot {
            data: Arc::new(data),
            fetched_at: Utc::now(),
        });
        true
    }

    pub fn publish_pricebook(&self, ticket: Ticket, book: PriceBook) -> bool {
        assert_eq!(ticket.endpoint, Endpoint::Pricing);
        let mut inner = self.inner.lock().expect("snapshot store poisoned");
        if ticket.seq != inner.latest_pricing_seq {
            debug!("discarding stale pricing response (ticket {})", ticket.seq);
            return false;
        }
        inner.pricebook = Some(Snapshot {
            data: Arc::new(book),
            fetched_at: Utc::now(),
        });
        true
    }

    /// Latest published conversations, if any fetch has succeeded yet.
    pub fn conversations(&self) -> Option<Snapshot<Vec<ConversationRecord>>> {
        self.inner
            .lock()
            .expect("snapshot store poisoned")
            .conversations
            .clone()
    }

    pub fn pricebook(&self) -> Option<Snapshot<PriceBook>> {
        self.inner
            .lock()
            .expect("snapshot store poisoned")
            .pricebook
            .clone()
    }
}
