use serde::{Deserialize, Serialize};

use crate::registry::ParticipantId;
use crate::wallet::{Wallet, verify_signature};

/// Transaction identifier, issued by the ledger.
pub type TxId = u64;

/// A signed transfer of value credits between two participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TxId,
    pub sender: ParticipantId,
    pub recipient: ParticipantId,
    pub amount: u64,
    #[serde(with = "crate::serde_hex")]
    pub signature: Vec<u8>,
}

impl Transaction {
    /// Build an unsigned transfer. Call `sign()` before submitting it.
    pub fn new(id: TxId, sender: ParticipantId, recipient: ParticipantId, amount: u64) -> Self {
        Self {
            id,
            sender,
            recipient,
            amount,
            signature: Vec::new(),
        }
    }

    /// Canonical signing payload. Stored signatures commit to this exact layout.
    pub fn signing_bytes(&self) -> Vec<u8> {
        format!(
            "Id:{}From:{}To:{}VC:{}",
            self.id, self.sender, self.recipient, self.amount
        )
        .into_bytes()
    }

    pub fn sign(&mut self, wallet: &Wallet) {
        self.signature = wallet.sign(&self.signing_bytes());
    }

    pub fn signed(mut self, wallet: &Wallet) -> Self {
        self.sign(wallet);
        self
    }

    pub fn verify(&self, public_key: &[u8]) -> bool {
        verify_signature(public_key, &self.signature, &self.signing_bytes())
    }

    /// Amount as a balance quantity. Transfers above `i64::MAX` never pass
    /// admission; for those this saturates instead of wrapping.
    pub fn value(&self) -> i64 {
        i64::try_from(self.amount).unwrap_or(i64::MAX)
    }

    /// Signed balance change this transfer causes for `participant`.
    pub fn delta_for(&self, participant: ParticipantId) -> i64 {
        let amount = self.value();
        match (self.sender == participant, self.recipient == participant) {
            (true, true) | (false, false) => 0,
            (true, false) => -amount,
            (false, true) => amount,
        }
    }
}
