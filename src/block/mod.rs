//! The block planner and worker pool: splitting an input buffer into
//! independently codeable blocks and draining them across a fixed thread pool.

pub mod planner;
pub mod pool;

pub use planner::{plan_blocks, BlockPlan, BlockSpan};
pub use pool::{run_pool, PoolError};
