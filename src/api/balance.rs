use actix_web::{HttpResponse, Responder, get, web};
use log::warn;

use super::models::{BalanceResponse, ParticipantResponse};
use crate::ledger::Ledger;
use crate::registry::ParticipantId;

#[get("/balance/{id}/")]
pub async fn get_balance(ledger: web::Data<Ledger>, path: web::Path<(ParticipantId,)>) -> impl Responder {
    let id = path.into_inner().0;

    match (ledger.participant(id), ledger.balance_of(id)) {
        (Some(participant), Some(balance)) => HttpResponse::Ok().json(BalanceResponse {
            id,
            name: participant.name,
            balance,
        }),
        _ => HttpResponse::NotFound().body(format!("participant {id} is not registered")),
    }
}

#[get("/participants/")]
pub async fn get_participants(ledger: web::Data<Ledger>) -> impl Responder {
    // one full-history fold per participant, off the async workers
    let listing = web::block(move || {
        ledger
            .participants()
            .into_iter()
            .map(|p| ParticipantResponse {
                balance: ledger.balance_of(p.id).unwrap_or_default(),
                id: p.id,
                name: p.name,
                role: p.role,
                public_key: hex::encode(&p.public_key),
            })
            .collect::<Vec<_>>()
    })
    .await;

    match listing {
        Ok(listing) => HttpResponse::Ok().json(listing),
        Err(e) => {
            warn!("GET /participants/ - balance listing failed: {e}");
            HttpResponse::InternalServerError().finish()
        }
    }
}
