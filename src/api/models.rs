use serde::Serialize;

use crate::blockchain::Block;
use crate::registry::{ParticipantId, Role};
use crate::transaction::TxId;

/* ---------- Chain API Models ---------- */

#[derive(Serialize)]
pub struct ChainResponse {
    pub length: usize,
    pub difficulty: u32,
    pub head_hash: String,
    pub chain: Vec<Block>,
}

#[derive(Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub length: usize,
    pub reason: Option<String>,
}

#[derive(Serialize)]
pub struct DifficultyResponse {
    pub difficulty: u32,
}

/* ---------- Participant API Models ---------- */

#[derive(Serialize)]
pub struct BalanceResponse {
    pub id: ParticipantId,
    pub name: String,
    pub balance: i64,
}

#[derive(Serialize)]
pub struct ParticipantResponse {
    pub id: ParticipantId,
    pub name: String,
    pub role: Role,
    pub public_key: String,
    pub balance: i64,
}

/* ---------- Pool API Models ---------- */

#[derive(Serialize)]
pub struct MempoolResponse {
    pub size: usize,
    pub transactions: Vec<TxId>, // ids only, for brevity
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub height: usize,
    pub difficulty: u32,
    pub next_block_id: u64,
    pub head_hash: String,
    pub participants: usize,
    pub mempool_size: usize,
    pub next_transaction_id: TxId,
    pub watermark: TxId,
    pub last_generation_secs: Option<u64>,
    pub avg_generation_secs: Option<f64>,
}
