use std::collections::{HashMap, HashSet};

use super::difficulty::{self, Adjustment, DifficultyTarget};
use super::{
    BLOCK_REWARD, Block, FIRST_BLOCK_ID, GENESIS_CREDIT, GENESIS_HASH, INITIAL_DIFFICULTY,
    block::MiningJob,
};
use crate::ledger::Rejection;
use crate::registry::{ParticipantId, Registry};
use crate::transaction::Transaction;

/// Committed chain history together with the head, next id and difficulty
/// that the next candidate has to satisfy.
#[derive(Debug, Clone)]
pub struct ChainState {
    blocks: Vec<Block>,
    head_hash: String,
    next_block_id: u64,
    target: DifficultyTarget,
}

impl Default for ChainState {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainState {
    /// Empty chain at genesis.
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            head_hash: GENESIS_HASH.to_string(),
            next_block_id: FIRST_BLOCK_ID,
            target: DifficultyTarget::new(INITIAL_DIFFICULTY),
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn head_hash(&self) -> &str {
        &self.head_hash
    }

    pub fn next_block_id(&self) -> u64 {
        self.next_block_id
    }

    pub fn difficulty(&self) -> u32 {
        self.target.zeros()
    }

    pub fn mining_job(&self) -> MiningJob {
        MiningJob {
            block_id: self.next_block_id,
            previous_hash: self.head_hash.clone(),
            difficulty: self.difficulty(),
        }
    }

    /// Block admission predicate, evaluated against the current head and the
    /// difficulty in force right now (not the one the miner started with).
    pub fn check_candidate(&self, block: &Block, registry: &Registry) -> Result<(), Rejection> {
        let creator = registry
            .get(block.creator_id)
            .ok_or(Rejection::UnknownCreator(block.creator_id))?;
        if !block.verify_creator(&creator.public_key) {
            return Err(Rejection::BadCreatorSignature);
        }
        if block.id != self.next_block_id {
            return Err(Rejection::WrongBlockId {
                expected: self.next_block_id,
                got: block.id,
            });
        }
        if block.previous_hash != self.head_hash {
            return Err(Rejection::StaleHead {
                got: block.previous_hash.clone(),
            });
        }
        if !block.has_consistent_hash() {
            return Err(Rejection::HashMismatch);
        }
        if !self.target.is_met_by(&block.hash) {
            return Err(Rejection::InsufficientWork(self.difficulty()));
        }
        Ok(())
    }

    /// Append an already validated block (transactions captured) and step
    /// the difficulty controller.
    pub fn commit(&mut self, block: Block) -> (&Block, Adjustment) {
        let (difficulty, adjustment) = difficulty::adjust(self.difficulty(), block.generation_secs);
        if adjustment != Adjustment::Unchanged {
            self.target = DifficultyTarget::new(difficulty);
        }
        self.next_block_id = block.id + 1;
        self.head_hash = block.hash.clone();
        let index = self.blocks.len();
        self.blocks.push(block);
        (&self.blocks[index], adjustment)
    }

    /// Committed balance: genesis credit, plus a reward per authored block,
    /// plus the net of every committed transfer touching `participant`.
    pub fn balance_of(&self, participant: ParticipantId) -> i64 {
        self.blocks.iter().fold(GENESIS_CREDIT, |acc, block| {
            let reward = if block.creator_id == participant {
                BLOCK_REWARD
            } else {
                0
            };
            let net: i64 = block
                .transactions
                .iter()
                .map(|t| t.delta_for(participant))
                .sum();
            acc + reward + net
        })
    }

    /// Rebuild a chain from recorded history, re-checking every block and
    /// every captured transfer as if it were admitted again.
    pub fn replay(blocks: &[Block], registry: &Registry) -> Result<Self, Rejection> {
        let mut state = Self::new();
        let mut seen = HashSet::new();
        for block in blocks {
            state.check_candidate(block, registry)?;
            let mut outgoing = HashMap::<ParticipantId, i64>::new();
            for tx in &block.transactions {
                if !seen.insert(tx.id) {
                    return Err(Rejection::CommittedTransaction(tx.id));
                }
                check_transfer(tx, registry)?;
                let spent = outgoing.entry(tx.sender).or_insert(0);
                let available = state.balance_of(tx.sender) - *spent;
                if available < tx.value() {
                    return Err(Rejection::InsufficientFunds {
                        available,
                        requested: tx.amount,
                    });
                }
                if tx.recipient != tx.sender {
                    *spent += tx.value();
                }
            }
            state.commit(block.clone());
        }
        Ok(state)
    }
}

/// Stateless part of transfer validation: amount, parties and signature.
pub fn check_transfer(tx: &Transaction, registry: &Registry) -> Result<(), Rejection> {
    if tx.amount == 0 {
        return Err(Rejection::NonPositiveAmount);
    }
    if i64::try_from(tx.amount).is_err() {
        return Err(Rejection::AmountOutOfRange(tx.amount));
    }
    let sender = registry
        .get(tx.sender)
        .ok_or(Rejection::UnknownSender(tx.sender))?;
    if !registry.contains(tx.recipient) {
        return Err(Rejection::UnknownRecipient(tx.recipient));
    }
    if !tx.verify(&sender.public_key) {
        return Err(Rejection::BadSignature);
    }
    Ok(())
}
