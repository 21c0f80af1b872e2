use actix_web::{HttpResponse, Responder, get, web};
use log::warn;

use super::models::{ChainResponse, DifficultyResponse, ValidateResponse};
use crate::ledger::Ledger;

/// Get the full blockchain.
#[get("/chain/")]
pub async fn get_chain(ledger: web::Data<Ledger>) -> impl Responder {
    let chain = ledger.blocks();
    HttpResponse::Ok().json(ChainResponse {
        length: chain.len(),
        difficulty: ledger.difficulty(),
        head_hash: ledger.head_hash(),
        chain,
    })
}

/// Replay and re-check the whole chain.
#[get("/validate/")]
pub async fn validate_chain(ledger: web::Data<Ledger>) -> impl Responder {
    let replay = web::block(move || (ledger.validate_chain(), ledger.height())).await;
    let (verdict, length) = match replay {
        Ok(replay) => replay,
        Err(e) => {
            warn!("GET /validate/ - replay did not complete: {e}");
            return HttpResponse::InternalServerError().finish();
        }
    };
    if let Err(reason) = &verdict {
        warn!("GET /validate/ - chain failed re-validation: {reason}");
    }
    HttpResponse::Ok().json(ValidateResponse {
        valid: verdict.is_ok(),
        length,
        reason: verdict.err().map(|r| r.to_string()),
    })
}

/// Get current PoW difficulty.
#[get("/difficulty/")]
pub async fn get_difficulty(ledger: web::Data<Ledger>) -> impl Responder {
    HttpResponse::Ok().json(DifficultyResponse {
        difficulty: ledger.difficulty(),
    })
}
