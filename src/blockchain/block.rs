use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use super::DifficultyTarget;
use crate::registry::ParticipantId;
use crate::transaction::Transaction;
use crate::wallet::{Wallet, verify_signature};

/// What a miner needs to know to build the next candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiningJob {
    pub block_id: u64,
    pub previous_hash: String,
    pub difficulty: u32,
}

/// A block of the chain. Candidates leave the miner with no transactions;
/// the ledger fills `transactions` with the pending pool when it admits them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: u64,
    pub creator_id: ParticipantId,
    pub creator_name: String,
    #[serde(with = "crate::serde_hex")]
    pub creator_signature: Vec<u8>,
    pub timestamp: i64, // Unix millis (UTC), fixed for the whole search
    pub previous_hash: String,
    pub magic_number: i64, // Proof-of-Work nonce
    pub hash: String,
    pub transactions: Vec<Transaction>,
    pub generation_secs: u64,
}

impl Block {
    /// Exact text the block hash commits to.
    pub fn hash_input(id: u64, timestamp: i64, previous_hash: &str, magic_number: i64) -> String {
        format!("[{id}, {timestamp}, {previous_hash}, {magic_number}]")
    }

    pub fn compute_hash(&self) -> String {
        let preimage = Self::hash_input(
            self.id,
            self.timestamp,
            &self.previous_hash,
            self.magic_number,
        );
        hex::encode(Sha256::digest(preimage.as_bytes()))
    }

    /// Proof-of-Work search: draw random nonces until the hash meets the
    /// job's difficulty. Returns `None` if `cancel` is raised first.
    ///
    /// The result is unsigned; call `sign()` before submitting it.
    pub fn mine(
        job: &MiningJob,
        creator_id: ParticipantId,
        creator_name: &str,
        cancel: &AtomicBool,
    ) -> Option<Self> {
        let target = DifficultyTarget::new(job.difficulty);
        let timestamp = Utc::now().timestamp_millis();
        let mut rng = rand::thread_rng();
        let started = Instant::now();

        loop {
            if cancel.load(Ordering::Relaxed) {
                return None;
            }
            let magic_number: i64 = rng.r#gen();
            let preimage = Self::hash_input(job.block_id, timestamp, &job.previous_hash, magic_number);
            let hash = hex::encode(Sha256::digest(preimage.as_bytes()));
            if target.is_met_by(&hash) {
                return Some(Self {
                    id: job.block_id,
                    creator_id,
                    creator_name: creator_name.to_string(),
                    creator_signature: Vec::new(),
                    timestamp,
                    previous_hash: job.previous_hash.clone(),
                    magic_number,
                    hash,
                    transactions: Vec::new(),
                    generation_secs: started.elapsed().as_secs(),
                });
            }
        }
    }

    /// Attribute the block: the creator signs its own name.
    pub fn sign(&mut self, wallet: &Wallet) {
        self.creator_signature = wallet.sign(self.creator_name.as_bytes());
    }

    pub fn verify_creator(&self, public_key: &[u8]) -> bool {
        verify_signature(
            public_key,
            &self.creator_signature,
            self.creator_name.as_bytes(),
        )
    }

    /// True when the cached hash matches the block's contents.
    pub fn has_consistent_hash(&self) -> bool {
        self.hash == self.compute_hash()
    }
}

#[cfg(test)]
mod tests {
    use super::{Block, MiningJob};
    use crate::wallet::Wallet;
    use std::sync::atomic::AtomicBool;

    fn job(difficulty: u32) -> MiningJob {
        MiningJob {
            block_id: 1,
            previous_hash: "0".into(),
            difficulty,
        }
    }

    #[test]
    fn hash_input_layout() {
        assert_eq!(
            Block::hash_input(3, 1700000000000, "ab12", -42),
            "[3, 1700000000000, ab12, -42]"
        );
    }

    #[test]
    fn mining_produces_leading_zeros() {
        let b = Block::mine(&job(2), 0, "miner0", &AtomicBool::new(false)).unwrap();
        assert!(b.hash.starts_with("00"));
        assert_eq!(b.hash.len(), 64);
        assert!(b.has_consistent_hash());
        assert!(b.transactions.is_empty());
    }

    #[test]
    fn cancelled_search_yields_nothing() {
        // difficulty 64 is unreachable; only the flag can end the search
        let cancel = AtomicBool::new(true);
        assert!(Block::mine(&job(64), 0, "miner0", &cancel).is_none());
    }

    #[test]
    fn invalid_when_mutated() {
        let mut b = Block::mine(&job(1), 0, "miner0", &AtomicBool::new(false)).unwrap();
        b.magic_number = b.magic_number.wrapping_add(1);
        assert!(!b.has_consistent_hash());
    }

    #[test]
    fn creator_signature_covers_name() {
        let w = Wallet::generate();
        let mut b = Block::mine(&job(0), 0, "miner0", &AtomicBool::new(false)).unwrap();
        b.sign(&w);
        assert!(b.verify_creator(&w.public_key_bytes()));
        b.creator_name = "miner1".into();
        assert!(!b.verify_creator(&w.public_key_bytes()));
    }
}
