use actix_web::{App, HttpServer, web};
use dotenvy::dotenv;
use log::{error, info};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread;

use vc_ledger::api;
use vc_ledger::config::SimConfig;
use vc_ledger::ledger::{JsonFileStore, Ledger, NoopStore, SnapshotStore};
use vc_ledger::sim::{SimReport, Simulation};

fn print_report(report: &SimReport) {
    println!("Chain height: {} (difficulty {})", report.height, report.difficulty);
    for (name, balance) in &report.balances {
        println!("{name}: {balance} VC");
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let _ = dotenv();
    env_logger::init();

    let config = match SimConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {e}");
            return Err(std::io::Error::other(e.to_string()));
        }
    };

    let store: Box<dyn SnapshotStore> = match &config.snapshot {
        Some(path) => Box::new(JsonFileStore::new(path)),
        None => Box::new(NoopStore),
    };
    let ledger = Arc::new(if config.resume {
        Ledger::recover(store)
    } else {
        Ledger::with_store(store)
    });

    let simulation = Simulation::new(ledger.clone(), config.clone());
    let stop = simulation.stop_handle();
    let worker = thread::spawn(move || simulation.run());

    if config.api_enabled {
        println!(
            "⛓️ Serving ledger API at http://{}:{}",
            config.host, config.port
        );
        let data = web::Data::from(ledger.clone());
        HttpServer::new(move || App::new().app_data(data.clone()).configure(api::init_routes))
            .bind((config.host.as_str(), config.port))?
            .run()
            .await?;
        info!("API stopped, cancelling workers");
        stop.store(true, Ordering::Relaxed);
    }

    match worker.join() {
        Ok(report) => print_report(&report),
        Err(_) => error!("Simulation thread panicked"),
    }
    Ok(())
}
