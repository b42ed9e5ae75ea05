//! Constants of the native contract call protocol.
//!
//! Constants that belong to a single native contract live in a sub-module named after it.

/// Width of a function selector, the prefix of the call data that picks the function.
pub const SELECTOR_LEN: usize = 4;

/// Constants of the fish store demo contract.
pub mod fish_store {
    use revm::interpreter::gas;

    /// Gas charged by `storeFish(uint256)`: one fresh storage slot plus a one-topic log.
    pub const WRITE_GAS: u64 = gas::SSTORE_SET + gas::LOG + gas::LOGTOPIC + 32 * gas::LOGDATA;

    /// Gas charged by `fishCount()`: one cold storage read.
    pub const READ_GAS: u64 = gas::COLD_SLOAD_COST;

    /// Storage slot holding the fish count.
    pub const COUNT_SLOT: u64 = 0;
}
