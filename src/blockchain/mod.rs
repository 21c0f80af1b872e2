pub mod block;
pub mod difficulty;
pub mod model;

pub use block::Block;
pub use difficulty::{Adjustment, DifficultyTarget};
pub use model::ChainState;

/// Previous-hash of block 1.
pub const GENESIS_HASH: &str = "0";

/// Id of the first block in the chain.
pub const FIRST_BLOCK_ID: u64 = 1;

/// Difficulty (leading zero hex digits) of a fresh chain.
pub const INITIAL_DIFFICULTY: u32 = 0;

/// Upper bound the difficulty controller steps back down from.
pub const MAX_DIFFICULTY: u32 = 4;

/// Credit every participant starts with.
pub const GENESIS_CREDIT: i64 = 100;

/// Reward for each admitted block, paid to its creator.
pub const BLOCK_REWARD: i64 = 100;
