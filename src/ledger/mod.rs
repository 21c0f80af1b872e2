//! Shared ledger: chain history, pending pool and identity registry behind
//! the locks that let miners and spenders race against one instance.
//!
//! Lock order is chain -> pool -> registry. A block commit holds the chain
//! write lock throughout and counts itself in flight on the pool until it
//! has released that lock; id issuance and transfer admission wait on
//! `commit_done` while any commit is in flight.

mod error;
pub mod persistence;
mod report;

pub use error::Rejection;
pub use persistence::{JsonFileStore, LedgerSnapshot, NoopStore, PersistError, SnapshotStore};

use log::{debug, info, warn};
use serde::Serialize;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard};

use crate::blockchain::block::MiningJob;
use crate::blockchain::model::check_transfer;
use crate::blockchain::{Adjustment, Block, ChainState};
use crate::registry::{Participant, ParticipantId, Registry, Role};
use crate::transaction::{PendingPool, Transaction, TxId};

/// What the ledger reports back for an admitted block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockReceipt {
    pub block_id: u64,
    pub hash: String,
    pub transactions: usize,
    pub difficulty: u32,
    pub adjustment: Adjustment,
}

/// Pool counters at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub pending: usize,
    pub next_transaction_id: TxId,
    pub watermark: TxId,
}

pub struct Ledger {
    chain: RwLock<ChainState>,
    pool: Mutex<PendingPool>,
    commit_done: Condvar,
    registry: RwLock<Registry>,
    store: Box<dyn SnapshotStore>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    /// Fresh in-memory ledger at genesis, without persistence.
    pub fn new() -> Self {
        Self::with_store(Box::new(NoopStore))
    }

    /// Fresh ledger at genesis that snapshots to `store` after every commit.
    pub fn with_store(store: Box<dyn SnapshotStore>) -> Self {
        Self::from_parts(ChainState::new(), PendingPool::new(), Registry::new(), store)
    }

    /// Reload the snapshot held by `store`, re-validating all of it. Any
    /// invalid entry (or an unreadable snapshot) means a fresh genesis.
    pub fn recover(store: Box<dyn SnapshotStore>) -> Self {
        match store.load() {
            Ok(Some(snapshot)) => match persistence::restore(snapshot) {
                Ok((chain, pool, registry)) => {
                    info!(
                        "Recovered ledger snapshot: {} blocks, {} pending transfers, {} participants",
                        chain.len(),
                        pool.len(),
                        registry.len()
                    );
                    Self::from_parts(chain, pool, registry, store)
                }
                Err(e) => {
                    warn!("Discarding ledger snapshot, starting from genesis: {e}");
                    Self::with_store(store)
                }
            },
            Ok(None) => Self::with_store(store),
            Err(e) => {
                warn!("Could not read ledger snapshot, starting from genesis: {e}");
                Self::with_store(store)
            }
        }
    }

    fn from_parts(
        chain: ChainState,
        pool: PendingPool,
        registry: Registry,
        store: Box<dyn SnapshotStore>,
    ) -> Self {
        Self {
            chain: RwLock::new(chain),
            pool: Mutex::new(pool),
            commit_done: Condvar::new(),
            registry: RwLock::new(registry),
            store,
        }
    }

    fn read_chain(&self) -> RwLockReadGuard<'_, ChainState> {
        self.chain.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_registry(&self) -> RwLockReadGuard<'_, Registry> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_pool(&self) -> MutexGuard<'_, PendingPool> {
        self.pool.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pool lock, held only once no block commit is in flight.
    fn lock_pool_between_commits(&self) -> Result<MutexGuard<'_, PendingPool>, Rejection> {
        let mut pool = self.pool.lock().map_err(|_| Rejection::Interrupted)?;
        while pool.is_committing() {
            pool = self
                .commit_done
                .wait(pool)
                .map_err(|_| Rejection::Interrupted)?;
        }
        Ok(pool)
    }

    /* -------------------- Registry -------------------- */

    /// Register an identity. Must happen before workers start.
    pub fn register_participant(
        &self,
        name: impl Into<String>,
        role: Role,
        public_key: Vec<u8>,
    ) -> ParticipantId {
        let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
        let name = name.into();
        let id = registry.register(name.clone(), role, public_key);
        debug!("Registered participant #{id} {name} ({role:?})");
        id
    }

    pub fn participant(&self, id: ParticipantId) -> Option<Participant> {
        self.read_registry().get(id).cloned()
    }

    pub fn participants(&self) -> Vec<Participant> {
        self.read_registry().iter().cloned().collect()
    }

    /* -------------------- Reads -------------------- */

    pub fn head_hash(&self) -> String {
        self.read_chain().head_hash().to_string()
    }

    pub fn difficulty(&self) -> u32 {
        self.read_chain().difficulty()
    }

    pub fn next_block_id(&self) -> u64 {
        self.read_chain().next_block_id()
    }

    /// Head hash, next id and difficulty from one consistent read.
    pub fn mining_job(&self) -> MiningJob {
        self.read_chain().mining_job()
    }

    /// Committed balance of `participant`, or `None` if it is not registered.
    pub fn balance_of(&self, participant: ParticipantId) -> Option<i64> {
        let chain = self.read_chain();
        if !self.read_registry().contains(participant) {
            return None;
        }
        Some(chain.balance_of(participant))
    }

    pub fn blocks(&self) -> Vec<Block> {
        self.read_chain().blocks().to_vec()
    }

    pub fn height(&self) -> usize {
        self.read_chain().len()
    }

    pub fn pending(&self) -> Vec<Transaction> {
        self.lock_pool().transactions().to_vec()
    }

    pub fn pool_stats(&self) -> PoolStats {
        let pool = self.lock_pool();
        PoolStats {
            pending: pool.len(),
            next_transaction_id: pool.next_id(),
            watermark: pool.watermark(),
        }
    }

    /// Replay the committed chain from genesis and re-check every block and
    /// transfer in it.
    pub fn validate_chain(&self) -> Result<(), Rejection> {
        let chain = self.read_chain();
        let registry = self.read_registry();
        ChainState::replay(chain.blocks(), &registry).map(|_| ())
    }

    /* -------------------- Transactions -------------------- */

    /// Issue a fresh transaction id, waiting out any block commit in flight.
    pub fn next_transaction_id(&self) -> Result<TxId, Rejection> {
        let mut pool = self.lock_pool_between_commits()?;
        Ok(pool.issue_id())
    }

    /// Validate a signed transfer and queue it for the next block.
    pub fn admit_transaction(&self, tx: Transaction) -> Result<(), Rejection> {
        let chain = self.chain.read().map_err(|_| Rejection::Interrupted)?;
        let mut pool = self.lock_pool_between_commits()?;
        let verdict = {
            let registry = self.read_registry();
            check_admission(&chain, &pool, &registry, &tx)
        };
        if let Err(reason) = verdict {
            debug!("Transfer #{} rejected: {reason}", tx.id);
            return Err(reason);
        }
        debug!(
            "Transfer #{} queued: {} -> {} ({} VC), pool size {}",
            tx.id,
            tx.sender,
            tx.recipient,
            tx.amount,
            pool.len() + 1
        );
        pool.push(tx);
        Ok(())
    }

    /* -------------------- Blocks -------------------- */

    /// Validate a mined candidate and, if it extends the current head,
    /// commit it together with every pending transfer.
    pub fn admit_block(&self, mut candidate: Block) -> Result<BlockReceipt, Rejection> {
        let mut chain = self.chain.write().map_err(|_| Rejection::Interrupted)?;
        let verdict = {
            let registry = self.read_registry();
            chain.check_candidate(&candidate, &registry)
        };
        if let Err(reason) = verdict {
            debug!(
                "Block #{} from {} rejected: {reason}",
                candidate.id, candidate.creator_name
            );
            return Err(reason);
        }

        candidate.transactions = {
            let mut pool = self.pool.lock().map_err(|_| Rejection::Interrupted)?;
            pool.begin_commit();
            pool.drain_for_commit()
        };
        let in_flight = CommitInFlight {
            pool: &self.pool,
            done: &self.commit_done,
        };

        let (block, adjustment) = chain.commit(candidate);
        let block = block.clone();
        let receipt = BlockReceipt {
            block_id: block.id,
            hash: block.hash.clone(),
            transactions: block.transactions.len(),
            difficulty: chain.difficulty(),
            adjustment,
        };

        info!(
            "{}",
            report::describe(&block, &self.read_registry(), adjustment, receipt.difficulty)
        );
        self.persist(&chain);

        drop(chain);
        drop(in_flight);
        Ok(receipt)
    }

    /* -------------------- Persistence -------------------- */

    /// Full copy of the ledger state.
    pub fn snapshot(&self) -> LedgerSnapshot {
        let chain = self.read_chain();
        self.snapshot_of(&chain)
    }

    fn snapshot_of(&self, chain: &ChainState) -> LedgerSnapshot {
        let pool = self.lock_pool();
        let registry = self.read_registry();
        LedgerSnapshot::capture(chain, &pool, &registry)
    }

    fn persist(&self, chain: &ChainState) {
        if !self.store.is_enabled() {
            return;
        }
        if let Err(e) = self.store.save(&self.snapshot_of(chain)) {
            warn!("Snapshot write failed, continuing in memory: {e}");
        }
    }
}

/// Admission predicate for a pending transfer: id rules, parties and
/// signature, then funds. The sender's own pending outgoing transfers count
/// against the committed balance; nobody else's do.
pub(crate) fn check_admission(
    chain: &ChainState,
    pool: &PendingPool,
    registry: &Registry,
    tx: &Transaction,
) -> Result<(), Rejection> {
    pool.check_id(tx.id)?;
    check_transfer(tx, registry)?;
    let available = chain.balance_of(tx.sender) - pool.pending_outgoing(tx.sender);
    if available < tx.value() {
        return Err(Rejection::InsufficientFunds {
            available,
            requested: tx.amount,
        });
    }
    Ok(())
}

/// Ends one in-flight commit when dropped and wakes waiters once none is
/// left, so a failed or panicking commit never strands them.
struct CommitInFlight<'a> {
    pool: &'a Mutex<PendingPool>,
    done: &'a Condvar,
}

impl Drop for CommitInFlight<'_> {
    fn drop(&mut self) {
        let idle = self
            .pool
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .end_commit();
        if idle {
            self.done.notify_all();
        }
    }
}
