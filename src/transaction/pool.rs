use super::model::{Transaction, TxId};
use crate::ledger::Rejection;
use crate::registry::ParticipantId;

/// Pending transfers plus the id bookkeeping that guards them.
///
/// Ids below `watermark` were issued before the last commit that captured
/// transfers and can no longer enter a block; ids at or above `next_id` were
/// never issued.
#[derive(Debug, Default, Clone)]
pub struct PendingPool {
    transactions: Vec<Transaction>,
    next_id: TxId,
    watermark: TxId,
    commits_in_flight: usize,
}

impl PendingPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a pool from persisted counters, with no pending entries.
    pub fn with_counters(next_id: TxId, watermark: TxId) -> Self {
        Self {
            transactions: Vec::new(),
            next_id,
            watermark,
            commits_in_flight: 0,
        }
    }

    pub fn issue_id(&mut self) -> TxId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn next_id(&self) -> TxId {
        self.next_id
    }

    pub fn watermark(&self) -> TxId {
        self.watermark
    }

    pub fn is_committing(&self) -> bool {
        self.commits_in_flight > 0
    }

    pub(crate) fn begin_commit(&mut self) {
        self.commits_in_flight += 1;
    }

    /// Returns true once no commit is left in flight.
    pub(crate) fn end_commit(&mut self) -> bool {
        self.commits_in_flight = self.commits_in_flight.saturating_sub(1);
        self.commits_in_flight == 0
    }

    /// Id-level admission rule: issued, not yet committed, not already pending.
    pub fn check_id(&self, id: TxId) -> Result<(), Rejection> {
        if id >= self.next_id {
            return Err(Rejection::UnissuedTransaction(id));
        }
        if id < self.watermark {
            return Err(Rejection::CommittedTransaction(id));
        }
        if self.transactions.iter().any(|t| t.id == id) {
            return Err(Rejection::DuplicateTransaction(id));
        }
        Ok(())
    }

    /// Total VC `sender` has already committed to outgoing pending transfers.
    pub fn pending_outgoing(&self, sender: ParticipantId) -> i64 {
        self.transactions
            .iter()
            .filter(|t| t.sender == sender && t.recipient != sender)
            .map(Transaction::value)
            .sum()
    }

    pub(crate) fn push(&mut self, tx: Transaction) {
        self.transactions.push(tx);
    }

    /// Capture-and-clear step of a block commit: hands over every pending
    /// transfer in arrival order. Capturing at least one transfer retires all
    /// ids issued so far; an empty capture leaves the watermark alone.
    pub(crate) fn drain_for_commit(&mut self) -> Vec<Transaction> {
        if !self.transactions.is_empty() {
            self.watermark = self.next_id;
        }
        std::mem::take(&mut self.transactions)
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}
