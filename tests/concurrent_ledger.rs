use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use vc_ledger::blockchain::{BLOCK_REWARD, GENESIS_CREDIT, GENESIS_HASH};
use vc_ledger::ledger::{Ledger, Rejection};
use vc_ledger::registry::Role;
use vc_ledger::sim::Identity;
use vc_ledger::transaction::TxId;

fn register(ledger: &Ledger, prefix: &str, role: Role, n: usize) -> Vec<Arc<Identity>> {
    (0..n)
        .map(|i| Arc::new(Identity::register(ledger, format!("{prefix}{i}"), role)))
        .collect()
}

fn mine_to(ledger: &Arc<Ledger>, miners: &[Arc<Identity>], height: usize, stop: &Arc<AtomicBool>) {
    let handles: Vec<_> = miners
        .iter()
        .map(|miner| {
            let ledger = ledger.clone();
            let miner = miner.clone();
            let stop = stop.clone();
            thread::spawn(move || {
                while !stop.load(Ordering::Relaxed) {
                    let job = ledger.mining_job();
                    if job.block_id as usize > height {
                        break;
                    }
                    match miner.mine_job(&ledger, &job, &stop) {
                        None => break,
                        Some(Ok(receipt)) if receipt.block_id as usize >= height => {
                            stop.store(true, Ordering::Relaxed);
                        }
                        Some(_) => {}
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}

fn assert_linked(ledger: &Ledger) {
    let blocks = ledger.blocks();
    let mut previous = GENESIS_HASH.to_string();
    for (i, block) in blocks.iter().enumerate() {
        assert_eq!(block.id, i as u64 + 1);
        assert_eq!(block.previous_hash, previous);
        assert_eq!(block.hash, block.compute_hash());
        previous = block.hash.clone();
    }
    assert_eq!(ledger.head_hash(), previous);
    assert_eq!(ledger.validate_chain(), Ok(()));
}

#[test]
fn racing_miners_extend_one_linear_chain() {
    let ledger = Arc::new(Ledger::new());
    let miners = register(&ledger, "miner", Role::Miner, 4);
    let stop = Arc::new(AtomicBool::new(false));

    mine_to(&ledger, &miners, 6, &stop);

    // losers of the final race never append past the winner
    assert_eq!(ledger.height(), 6);
    assert_linked(&ledger);

    let blocks = ledger.blocks();
    let mut rewards: HashMap<u64, i64> = HashMap::new();
    for block in &blocks {
        *rewards.entry(block.creator_id).or_default() += BLOCK_REWARD;
    }
    for miner in &miners {
        let expected = GENESIS_CREDIT + rewards.get(&miner.id).copied().unwrap_or_default();
        assert_eq!(ledger.balance_of(miner.id), Some(expected));
    }
}

#[test]
fn concurrent_spends_are_never_lost_or_doubled() {
    let ledger = Arc::new(Ledger::new());
    let miners = register(&ledger, "miner", Role::Miner, 2);
    let users = register(&ledger, "user", Role::Standard, 6);
    let everyone: Vec<_> = miners.iter().chain(&users).map(|i| i.id).collect();
    let stop = Arc::new(AtomicBool::new(false));

    let spenders: Vec<_> = users
        .iter()
        .enumerate()
        .map(|(n, user)| {
            let ledger = ledger.clone();
            let user = user.clone();
            let stop = stop.clone();
            let everyone = everyone.clone();
            thread::spawn(move || {
                let mut admitted: Vec<TxId> = Vec::new();
                let mut round = 0usize;
                while !stop.load(Ordering::Relaxed) {
                    let recipient = everyone[(n + round + 1) % everyone.len()];
                    let amount = (round % 40) as u64 + 1;
                    match user.spend(&ledger, amount, recipient) {
                        Ok(id) => admitted.push(id),
                        Err(Rejection::Interrupted) => break,
                        Err(_) => {}
                    }
                    round += 1;
                    thread::yield_now();
                }
                admitted
            })
        })
        .collect();

    mine_to(&ledger, &miners, 5, &stop);
    stop.store(true, Ordering::Relaxed);

    let mut admitted: Vec<TxId> = Vec::new();
    for handle in spenders {
        admitted.extend(handle.join().unwrap());
    }

    assert_linked(&ledger);

    let mut placements: HashMap<TxId, usize> = HashMap::new();
    for block in ledger.blocks() {
        for tx in &block.transactions {
            *placements.entry(tx.id).or_default() += 1;
        }
    }
    for tx in ledger.pending() {
        *placements.entry(tx.id).or_default() += 1;
    }
    for id in &admitted {
        assert_eq!(placements.get(id), Some(&1), "tx {id} placed wrongly");
    }
    assert_eq!(placements.len(), admitted.len());

    let balances: Vec<i64> = everyone
        .iter()
        .map(|&id| ledger.balance_of(id).unwrap())
        .collect();
    assert!(balances.iter().all(|&b| b >= 0));
    let supply: i64 = balances.iter().sum();
    assert_eq!(
        supply,
        everyone.len() as i64 * GENESIS_CREDIT + ledger.height() as i64 * BLOCK_REWARD
    );
}

#[test]
fn issued_ids_are_unique_across_threads() {
    let ledger = Arc::new(Ledger::new());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let ledger = ledger.clone();
            thread::spawn(move || {
                (0..50)
                    .map(|_| ledger.next_transaction_id().unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut ids: Vec<TxId> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 400);
    assert_eq!(ledger.pool_stats().next_transaction_id, 400);
}
