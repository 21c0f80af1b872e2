use std::sync::atomic::AtomicBool;

use crate::blockchain::Block;
use crate::blockchain::block::MiningJob;
use crate::ledger::{BlockReceipt, Ledger, Rejection};
use crate::registry::{ParticipantId, Role};
use crate::transaction::{Transaction, TxId};
use crate::wallet::Wallet;

/// A registered participant together with its private key.
#[derive(Debug)]
pub struct Identity {
    pub id: ParticipantId,
    pub name: String,
    pub role: Role,
    wallet: Wallet,
}

impl Identity {
    /// Generate keys and register the public half with `ledger`.
    pub fn register(ledger: &Ledger, name: impl Into<String>, role: Role) -> Self {
        let name = name.into();
        let wallet = Wallet::generate();
        let id = ledger.register_participant(name.clone(), role, wallet.public_key_bytes());
        Self {
            id,
            name,
            role,
            wallet,
        }
    }

    /// Mine one candidate on the current head and submit it.
    /// `None` means the search was cancelled before a nonce was found.
    pub fn mine_block(
        &self,
        ledger: &Ledger,
        cancel: &AtomicBool,
    ) -> Option<Result<BlockReceipt, Rejection>> {
        self.mine_job(ledger, &ledger.mining_job(), cancel)
    }

    /// Like `mine_block`, for a job the caller already fetched.
    pub fn mine_job(
        &self,
        ledger: &Ledger,
        job: &MiningJob,
        cancel: &AtomicBool,
    ) -> Option<Result<BlockReceipt, Rejection>> {
        let mut block = Block::mine(job, self.id, &self.name, cancel)?;
        block.sign(&self.wallet);
        Some(ledger.admit_block(block))
    }

    /// Request an id, sign a transfer of `amount` VC to `recipient` and submit it.
    pub fn spend(
        &self,
        ledger: &Ledger,
        amount: u64,
        recipient: ParticipantId,
    ) -> Result<TxId, Rejection> {
        let id = ledger.next_transaction_id()?;
        let tx = Transaction::new(id, self.id, recipient, amount).signed(&self.wallet);
        ledger.admit_transaction(tx)?;
        Ok(id)
    }
}
