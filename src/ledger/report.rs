use std::fmt::Write;

use crate::blockchain::{Adjustment, BLOCK_REWARD, Block};
use crate::registry::Registry;

fn name_of(registry: &Registry, id: u64) -> String {
    registry
        .get(id)
        .map(|p| p.name.clone())
        .unwrap_or_else(|| format!("#{id}"))
}

/// Human-readable commit report logged for every admitted block.
pub fn describe(block: &Block, registry: &Registry, adjustment: Adjustment, difficulty: u32) -> String {
    let mut out = String::new();
    // writing into a String cannot fail
    let _ = writeln!(out, "Block:");
    let _ = writeln!(out, "Created by {}", block.creator_name);
    let _ = writeln!(out, "{} gets {} VC", block.creator_name, BLOCK_REWARD);
    let _ = writeln!(out, "Id: {}", block.id);
    let _ = writeln!(out, "Timestamp: {}", block.timestamp);
    let _ = writeln!(out, "Magic number: {}", block.magic_number);
    let _ = writeln!(out, "Hash of the previous block:\n{}", block.previous_hash);
    let _ = writeln!(out, "Hash of the block:\n{}", block.hash);
    if block.transactions.is_empty() {
        let _ = writeln!(out, "Block data: No transactions");
    } else {
        let _ = writeln!(out, "Block data:");
        for tx in &block.transactions {
            let _ = writeln!(
                out,
                "{} sent {} VC to {}",
                name_of(registry, tx.sender),
                tx.amount,
                name_of(registry, tx.recipient)
            );
        }
    }
    let _ = writeln!(out, "Block was generating for {} seconds", block.generation_secs);
    let _ = write!(
        out,
        "{}",
        match adjustment {
            Adjustment::Increased => format!("N was increased to {difficulty}"),
            Adjustment::Decreased => format!("N was decreased to {difficulty}"),
            Adjustment::Unchanged => "N stays the same".to_string(),
        }
    );
    out
}

#[cfg(test)]
mod tests {
    use super::describe;
    use crate::blockchain::{Adjustment, Block};
    use crate::registry::{Registry, Role};
    use crate::transaction::Transaction;

    #[test]
    fn lists_transfers_by_name() {
        let mut reg = Registry::new();
        let m = reg.register("miner0".into(), Role::Miner, vec![]);
        let u = reg.register("Alice".into(), Role::Standard, vec![]);
        let block = Block {
            id: 2,
            creator_id: m,
            creator_name: "miner0".into(),
            creator_signature: vec![],
            timestamp: 1,
            previous_hash: "0abc".into(),
            magic_number: -7,
            hash: "00ff".into(),
            transactions: vec![Transaction::new(0, u, m, 50)],
            generation_secs: 0,
        };
        let text = describe(&block, &reg, Adjustment::Increased, 2);
        assert!(text.contains("Created by miner0"));
        assert!(text.contains("Alice sent 50 VC to miner0"));
        assert!(text.ends_with("N was increased to 2"));
    }
}
