//! Read-only HTTP view of a running ledger.

mod balance;
mod chain;
mod health;
pub mod models;
mod stats;
mod tx;

use actix_web::web::{self, ServiceConfig};

pub fn init_routes(cfg: &mut ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(health::health_check)
            .service(chain::get_chain)
            .service(chain::validate_chain)
            .service(chain::get_difficulty)
            .service(balance::get_balance)
            .service(balance::get_participants)
            .service(tx::get_mempool)
            .service(stats::get_stats),
    );
}
