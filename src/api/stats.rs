use actix_web::{HttpResponse, Responder, get, web};

use super::models::StatsResponse;
use crate::ledger::Ledger;

#[get("/stats/")]
pub async fn get_stats(ledger: web::Data<Ledger>) -> impl Responder {
    let blocks = ledger.blocks();
    let last_generation_secs = blocks.last().map(|b| b.generation_secs);
    let avg_generation_secs = if blocks.is_empty() {
        None
    } else {
        let total: u64 = blocks.iter().map(|b| b.generation_secs).sum();
        Some(total as f64 / blocks.len() as f64)
    };

    // pool counters under their own short lock
    let pool = ledger.pool_stats();

    HttpResponse::Ok().json(StatsResponse {
        height: blocks.len(),
        difficulty: ledger.difficulty(),
        next_block_id: ledger.next_block_id(),
        head_hash: ledger.head_hash(),
        participants: ledger.participants().len(),
        mempool_size: pool.pending,
        next_transaction_id: pool.next_transaction_id,
        watermark: pool.watermark,
        last_generation_secs,
        avg_generation_secs,
    })
}
