//! Simulation driver: registers miners and spenders, runs them on their own
//! threads against one shared ledger and stops them once the target block
//! count is reached.

mod identity;

pub use identity::Identity;

use log::{debug, info, warn};
use rand::Rng;
use rand::seq::SliceRandom;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crate::config::SimConfig;
use crate::ledger::{Ledger, Rejection};
use crate::registry::{ParticipantId, Role};

/// Pause between spending rolls that did not spend.
const IDLE_PAUSE: Duration = Duration::from_millis(10);

/// Outcome of a finished run.
#[derive(Debug, Clone)]
pub struct SimReport {
    pub height: usize,
    pub difficulty: u32,
    pub balances: Vec<(String, i64)>,
}

pub struct Simulation {
    ledger: Arc<Ledger>,
    identities: Vec<Arc<Identity>>,
    config: SimConfig,
    stop: Arc<AtomicBool>,
}

impl Simulation {
    /// Register `config.miners` miners followed by the standard users.
    pub fn new(ledger: Arc<Ledger>, config: SimConfig) -> Self {
        let mut identities = Vec::with_capacity(config.miners + config.users.len());
        for i in 0..config.miners {
            identities.push(Arc::new(Identity::register(
                &ledger,
                format!("miner{i}"),
                Role::Miner,
            )));
        }
        for name in &config.users {
            identities.push(Arc::new(Identity::register(&ledger, name.clone(), Role::Standard)));
        }
        Self {
            ledger,
            identities,
            config,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn identities(&self) -> &[Arc<Identity>] {
        &self.identities
    }

    /// Raising this flag cancels every worker at its next check.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    /// Run every worker to completion. Returns once all threads are joined.
    pub fn run(&self) -> SimReport {
        let recipients: Arc<Vec<ParticipantId>> = Arc::new(
            self.ledger
                .participants()
                .into_iter()
                .map(|p| p.id)
                .collect(),
        );
        info!(
            "Simulation started: {} miners, {} participants, target {} blocks",
            self.config.miners,
            recipients.len(),
            self.config.target_blocks
        );

        let miners: Vec<_> = self
            .identities
            .iter()
            .filter(|i| i.role == Role::Miner)
            .map(|identity| {
                let ledger = self.ledger.clone();
                let identity = identity.clone();
                let stop = self.stop.clone();
                let target = self.config.target_blocks;
                thread::spawn(move || mine_until(&ledger, &identity, &stop, target))
            })
            .collect();

        let spenders: Vec<_> = self
            .identities
            .iter()
            .map(|identity| {
                let ledger = self.ledger.clone();
                let identity = identity.clone();
                let stop = self.stop.clone();
                let recipients = recipients.clone();
                let config = self.config.clone();
                thread::spawn(move || spend_until(&ledger, &identity, &recipients, &stop, &config))
            })
            .collect();

        for handle in miners {
            if handle.join().is_err() {
                warn!("A mining worker panicked");
            }
        }
        self.stop.store(true, Ordering::Relaxed);
        for handle in spenders {
            if handle.join().is_err() {
                warn!("A spending worker panicked");
            }
        }

        let report = SimReport {
            height: self.ledger.height(),
            difficulty: self.ledger.difficulty(),
            balances: self
                .ledger
                .participants()
                .into_iter()
                .map(|p| {
                    let balance = self.ledger.balance_of(p.id).unwrap_or_default();
                    (p.name, balance)
                })
                .collect(),
        };
        info!(
            "Simulation finished at height {} (difficulty {})",
            report.height, report.difficulty
        );
        report
    }
}

fn target_reached(ledger: &Ledger, target: u64) -> bool {
    ledger.next_block_id() > target
}

/// Mine until block `target` is on the chain. Jobs past the target are never
/// started, so the chain stops at exactly `target` blocks.
fn mine_until(ledger: &Ledger, identity: &Identity, stop: &AtomicBool, target: u64) {
    while !stop.load(Ordering::Relaxed) {
        let job = ledger.mining_job();
        if job.block_id > target {
            break;
        }
        match identity.mine_job(ledger, &job, stop) {
            None => break,
            Some(Ok(receipt)) => {
                if receipt.block_id >= target {
                    stop.store(true, Ordering::Relaxed);
                }
            }
            Some(Err(Rejection::Interrupted)) => {
                warn!("{} stops mining: ledger lock poisoned", identity.name);
                break;
            }
            Some(Err(reason)) => debug!("{} re-mines: {reason}", identity.name),
        }
    }
}

fn spend_until(
    ledger: &Ledger,
    identity: &Identity,
    recipients: &[ParticipantId],
    stop: &AtomicBool,
    config: &SimConfig,
) {
    let others: Vec<ParticipantId> = recipients
        .iter()
        .copied()
        .filter(|&id| id != identity.id)
        .collect();
    let mut rng = rand::thread_rng();

    while !stop.load(Ordering::Relaxed) && !target_reached(ledger, config.target_blocks) {
        if !rng.gen_bool(config.spend_chance) {
            thread::sleep(IDLE_PAUSE);
            continue;
        }
        let Some(&recipient) = others.choose(&mut rng) else {
            break;
        };
        let amount = rng.gen_range(1..=100);
        match identity.spend(ledger, amount, recipient) {
            Ok(id) => debug!("{} sent {amount} VC to #{recipient} (tx {id})", identity.name),
            Err(Rejection::Interrupted) => {
                warn!("{} stops spending: ledger lock poisoned", identity.name);
                break;
            }
            Err(reason) => debug!("{} could not send {amount} VC: {reason}", identity.name),
        }
        thread::sleep(config.spend_pause);
    }
}
