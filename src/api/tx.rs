use actix_web::{HttpResponse, Responder, get, web};

use super::models::MempoolResponse;
use crate::ledger::Ledger;

/// List pending transfers (ids only, in arrival order).
#[get("/mempool/")]
pub async fn get_mempool(ledger: web::Data<Ledger>) -> impl Responder {
    let ids = ledger.pending().iter().map(|t| t.id).collect::<Vec<_>>();
    HttpResponse::Ok().json(MempoolResponse {
        size: ids.len(),
        transactions: ids,
    })
}
