use thiserror::Error;

use crate::registry::ParticipantId;
use crate::transaction::TxId;

/// Why the ledger refused a block or a transfer.
///
/// Callers only branch on accepted/rejected; the variant is there for logs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("block creator {0} is not registered")]
    UnknownCreator(ParticipantId),

    #[error("creator signature does not verify")]
    BadCreatorSignature,

    #[error("block id {got} does not follow chain (expected {expected})")]
    WrongBlockId { expected: u64, got: u64 },

    #[error("stale candidate: previous hash {got} is not the current head")]
    StaleHead { got: String },

    #[error("block hash does not match its contents")]
    HashMismatch,

    #[error("block hash does not meet difficulty {0}")]
    InsufficientWork(u32),

    #[error("transaction {0} was never issued")]
    UnissuedTransaction(TxId),

    #[error("transaction {0} is already committed")]
    CommittedTransaction(TxId),

    #[error("transaction {0} is already pending")]
    DuplicateTransaction(TxId),

    #[error("transfer amount must be positive")]
    NonPositiveAmount,

    #[error("transfer amount {0} VC exceeds any possible balance")]
    AmountOutOfRange(u64),

    #[error("sender {0} is not registered")]
    UnknownSender(ParticipantId),

    #[error("recipient {0} is not registered")]
    UnknownRecipient(ParticipantId),

    #[error("transaction signature does not verify")]
    BadSignature,

    #[error("insufficient funds: available {available} VC, requested {requested} VC")]
    InsufficientFunds { available: i64, requested: u64 },

    #[error("ledger lock poisoned, operation abandoned")]
    Interrupted,
}
