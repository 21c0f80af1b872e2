//! Ledger snapshots: a full copy of chain, pool counters, pending transfers
//! and registry, written after every commit and re-validated on reload.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

use super::{Rejection, check_admission};
use crate::blockchain::{Block, ChainState};
use crate::registry::{Participant, ParticipantId, Registry};
use crate::transaction::{PendingPool, Transaction, TxId};

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("snapshot I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("snapshot encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Reasons a loaded snapshot cannot be trusted.
#[derive(Debug, Error)]
pub enum RecoveryError {
    #[error("participant id {0} appears twice")]
    DuplicateParticipant(ParticipantId),

    #[error("invalid entry: {0}")]
    Invalid(#[from] Rejection),

    #[error("recorded {field} does not match replayed history")]
    Mismatch { field: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub participants: Vec<Participant>,
    pub blocks: Vec<Block>,
    pub pending: Vec<Transaction>,
    pub head_hash: String,
    pub next_block_id: u64,
    pub difficulty: u32,
    pub next_transaction_id: TxId,
    pub watermark: TxId,
}

impl LedgerSnapshot {
    pub fn capture(chain: &ChainState, pool: &PendingPool, registry: &Registry) -> Self {
        Self {
            participants: registry.iter().cloned().collect(),
            blocks: chain.blocks().to_vec(),
            pending: pool.transactions().to_vec(),
            head_hash: chain.head_hash().to_string(),
            next_block_id: chain.next_block_id(),
            difficulty: chain.difficulty(),
            next_transaction_id: pool.next_id(),
            watermark: pool.watermark(),
        }
    }
}

/// Durable home for ledger snapshots.
pub trait SnapshotStore: Send + Sync {
    fn save(&self, snapshot: &LedgerSnapshot) -> Result<(), PersistError>;

    /// `Ok(None)` when nothing was ever saved.
    fn load(&self) -> Result<Option<LedgerSnapshot>, PersistError>;

    /// Lets the ledger skip building snapshots nobody keeps.
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Store that keeps nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopStore;

impl SnapshotStore for NoopStore {
    fn save(&self, _snapshot: &LedgerSnapshot) -> Result<(), PersistError> {
        Ok(())
    }

    fn load(&self) -> Result<Option<LedgerSnapshot>, PersistError> {
        Ok(None)
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

/// Pretty-printed JSON file, replaced atomically on every save.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SnapshotStore for JsonFileStore {
    fn save(&self, snapshot: &LedgerSnapshot) -> Result<(), PersistError> {
        let bytes = serde_json::to_vec_pretty(snapshot)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn load(&self) -> Result<Option<LedgerSnapshot>, PersistError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Rebuild ledger state from a snapshot, replaying every block and
/// re-admitting every pending transfer. All or nothing.
pub fn restore(
    snapshot: LedgerSnapshot,
) -> Result<(ChainState, PendingPool, Registry), RecoveryError> {
    let mut registry = Registry::new();
    for participant in snapshot.participants {
        let id = participant.id;
        if !registry.restore(participant) {
            return Err(RecoveryError::DuplicateParticipant(id));
        }
    }

    let chain = ChainState::replay(&snapshot.blocks, &registry)?;
    if chain.head_hash() != snapshot.head_hash {
        return Err(RecoveryError::Mismatch { field: "head hash" });
    }
    if chain.next_block_id() != snapshot.next_block_id {
        return Err(RecoveryError::Mismatch {
            field: "next block id",
        });
    }
    if chain.difficulty() != snapshot.difficulty {
        return Err(RecoveryError::Mismatch { field: "difficulty" });
    }

    if snapshot.watermark > snapshot.next_transaction_id {
        return Err(RecoveryError::Mismatch { field: "watermark" });
    }
    let committed_beyond_watermark = chain
        .blocks()
        .iter()
        .flat_map(|b| &b.transactions)
        .any(|t| t.id >= snapshot.watermark);
    if committed_beyond_watermark {
        return Err(RecoveryError::Mismatch { field: "watermark" });
    }

    let mut pool = PendingPool::with_counters(snapshot.next_transaction_id, snapshot.watermark);
    for tx in snapshot.pending {
        check_admission(&chain, &pool, &registry, &tx)?;
        pool.push(tx);
    }

    Ok((chain, pool, registry))
}

#[cfg(test)]
mod tests {
    use super::{JsonFileStore, LedgerSnapshot, RecoveryError, SnapshotStore, restore};
    use crate::blockchain::Block;
    use crate::ledger::Ledger;
    use crate::registry::{ParticipantId, Role};
    use crate::transaction::Transaction;
    use crate::wallet::Wallet;
    use std::sync::atomic::AtomicBool;

    fn mine(ledger: &Ledger, id: ParticipantId, wallet: &Wallet) {
        let mut b = Block::mine(&ledger.mining_job(), id, "miner0", &AtomicBool::new(false)).unwrap();
        b.sign(wallet);
        ledger.admit_block(b).unwrap();
    }

    /// Two blocks, one committed and one pending transfer.
    fn populated(ledger: &Ledger) -> (ParticipantId, ParticipantId) {
        let mw = Wallet::generate();
        let uw = Wallet::generate();
        let m = ledger.register_participant("miner0", Role::Miner, mw.public_key_bytes());
        let u = ledger.register_participant("Anna", Role::Standard, uw.public_key_bytes());
        mine(ledger, m, &mw);
        let id = ledger.next_transaction_id().unwrap();
        ledger
            .admit_transaction(Transaction::new(id, u, m, 20).signed(&uw))
            .unwrap();
        mine(ledger, m, &mw);
        let id = ledger.next_transaction_id().unwrap();
        ledger
            .admit_transaction(Transaction::new(id, u, m, 5).signed(&uw))
            .unwrap();
        (m, u)
    }

    #[test]
    fn snapshot_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("block.chain.json");

        let ledger = Ledger::with_store(Box::new(JsonFileStore::new(&path)));
        let (m, u) = populated(&ledger);
        // the file reflects the last commit, the pending transfer came later
        let on_disk = JsonFileStore::new(&path).load().unwrap().unwrap();
        assert_eq!(on_disk.blocks.len(), 2);
        assert!(on_disk.pending.is_empty());

        let store = JsonFileStore::new(&path);
        store.save(&ledger.snapshot()).unwrap();
        let recovered = Ledger::recover(Box::new(store));
        assert_eq!(recovered.height(), 2);
        assert_eq!(recovered.head_hash(), ledger.head_hash());
        assert_eq!(recovered.balance_of(m), Some(320));
        assert_eq!(recovered.balance_of(u), Some(80));
        assert_eq!(recovered.pending().len(), 1);
        assert_eq!(recovered.pool_stats(), ledger.pool_stats());
    }

    #[test]
    fn one_bad_entry_discards_everything() {
        let ledger = Ledger::new();
        let (m, _) = populated(&ledger);

        let mut snapshot = ledger.snapshot();
        snapshot.blocks[1].transactions[0].amount = 90;
        assert!(matches!(restore(snapshot), Err(RecoveryError::Invalid(_))));

        let mut snapshot = ledger.snapshot();
        snapshot.blocks[0].previous_hash = "1".into();
        assert!(restore(snapshot).is_err());

        let mut snapshot = ledger.snapshot();
        snapshot.pending[0].amount = 500;
        assert!(restore(snapshot).is_err());

        let mut snapshot = ledger.snapshot();
        snapshot.difficulty += 1;
        assert!(matches!(
            restore(snapshot),
            Err(RecoveryError::Mismatch { field: "difficulty" })
        ));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("block.chain.json");
        let mut snapshot: LedgerSnapshot = ledger.snapshot();
        snapshot.participants.retain(|p| p.id != m);
        JsonFileStore::new(&path).save(&snapshot).unwrap();
        let fresh = Ledger::recover(Box::new(JsonFileStore::new(&path)));
        assert_eq!(fresh.height(), 0);
        assert_eq!(fresh.head_hash(), "0");
        assert!(fresh.participants().is_empty());
    }

    #[test]
    fn unreadable_or_missing_file_means_genesis() {
        let dir = tempfile::tempdir().unwrap();
        let missing = Ledger::recover(Box::new(JsonFileStore::new(dir.path().join("none.json"))));
        assert_eq!(missing.height(), 0);

        let garbage = dir.path().join("garbage.json");
        std::fs::write(&garbage, b"{ not json").unwrap();
        let store = JsonFileStore::new(&garbage);
        assert!(store.load().is_err());
        assert_eq!(Ledger::recover(Box::new(store)).next_block_id(), 1);
    }
}
