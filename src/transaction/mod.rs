pub mod model;
pub mod pool;

pub use model::{Transaction, TxId};
pub use pool::PendingPool;
