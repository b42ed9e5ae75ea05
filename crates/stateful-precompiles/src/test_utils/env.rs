use alloy_primitives::{Address, U256};
use revm::context::BlockEnv;

/// Returns a block environment at `number` and `timestamp`.
pub fn block_env(number: u64, timestamp: u64) -> BlockEnv {
    BlockEnv { number: U256::from(number), timestamp: U256::from(timestamp), ..Default::default() }
}

/// Returns a block environment at `number` whose fees go to `beneficiary`.
pub fn block_env_with_beneficiary(number: u64, beneficiary: Address) -> BlockEnv {
    BlockEnv { beneficiary, ..block_env(number, 0) }
}
