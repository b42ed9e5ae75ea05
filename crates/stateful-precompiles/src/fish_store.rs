//! The fish store: a small native contract keeping a counter in its own storage.
//!
//! | Function             | Selector     | Gas           |
//! |----------------------|--------------|---------------|
//! | `fish()`             | `0x713e02da` | 0             |
//! | `storeFish(uint256)` | generated    | [`WRITE_GAS`] |
//! | `fishCount()`        | generated    | [`READ_GAS`]  |
//!
//! `fish()` returns the raw bytes `bytestring` without ABI encoding. `storeFish` adds to the
//! counter and emits `FishStored`. It cannot be called in a static frame.
//!
//! The account at [`FISH_STORE_ADDRESS`] must not be empty at genesis, otherwise EIP-161 state
//! clearing drops the counter at the end of every transaction.
//!
//! [`WRITE_GAS`]: crate::constants::fish_store::WRITE_GAS
//! [`READ_GAS`]: crate::constants::fish_store::READ_GAS

use alloy_primitives::{address, fixed_bytes, Address, Bytes, Log, Selector, U256};
use alloy_sol_types::{sol, SolCall, SolError, SolEvent, SolValue};

use crate::{
    constants::fish_store as constants, FnNativeFunction, FunctionError, NativeContract,
    NativeContractRegistry, PrecompileContext, RegistryError,
};

sol! {
    /// Interface of the fish store.
    #[allow(missing_docs)]
    interface IFishStore {
        /// Emitted when fish are added to the store.
        event FishStored(uint256 count);

        /// The counter would exceed `uint256`.
        error FishCountOverflow(uint256 stored, uint256 count);

        /// Adds `count` fish to the store.
        function storeFish(uint256 count) external;

        /// Returns the number of stored fish.
        function fishCount() external view returns (uint256);
    }
}

/// Address of the fish store.
pub const FISH_STORE_ADDRESS: Address = address!("0x6342000000000000000000000000000000000f15");

/// Name of the fish store contract.
pub const FISH_STORE_NAME: &str = "FishStore";

/// Selector of `fish()`.
pub const FISH_SELECTOR: Selector = fixed_bytes!("713e02da");

/// Output of `fish()`.
pub const FISH_OUTPUT: &[u8] = b"bytestring";

/// Returns the fish store contract.
pub fn contract() -> NativeContract {
    build_contract().expect("fish store selectors are distinct")
}

fn build_contract() -> Result<NativeContract, RegistryError> {
    Ok(NativeContract::builder(FISH_STORE_NAME)
        .function(FISH_SELECTOR, FnNativeFunction::fixed("fish", 0, fish))?
        .function(
            IFishStore::storeFishCall::SELECTOR,
            FnNativeFunction::fixed("storeFish", constants::WRITE_GAS, store_fish),
        )?
        .function(
            IFishStore::fishCountCall::SELECTOR,
            FnNativeFunction::fixed("fishCount", constants::READ_GAS, fish_count),
        )?
        .build())
}

/// Returns a registry holding only the fish store at [`FISH_STORE_ADDRESS`].
pub fn registry() -> Result<NativeContractRegistry, RegistryError> {
    Ok(NativeContractRegistry::builder().with_contract(FISH_STORE_ADDRESS, contract())?.build())
}

fn fish(_ctx: &mut PrecompileContext<'_>, _payload: &[u8]) -> Result<Bytes, FunctionError> {
    Ok(Bytes::from_static(FISH_OUTPUT))
}

fn store_fish(ctx: &mut PrecompileContext<'_>, payload: &[u8]) -> Result<Bytes, FunctionError> {
    if ctx.is_static() {
        return Err(FunctionError::StaticCallViolation);
    }
    let count = U256::abi_decode(payload)
        .map_err(|_| FunctionError::InvalidInput("storeFish expects a single uint256"))?;

    let address = ctx.address();
    let slot = U256::from(constants::COUNT_SLOT);
    let stored = ctx.sload(address, slot)?;
    let Some(total) = stored.checked_add(count) else {
        return Err(FunctionError::Revert(
            IFishStore::FishCountOverflow { stored, count }.abi_encode().into(),
        ));
    };
    ctx.sstore(address, slot, total)?;
    ctx.log(Log { address, data: IFishStore::FishStored { count }.encode_log_data() });
    Ok(Bytes::new())
}

fn fish_count(ctx: &mut PrecompileContext<'_>, _payload: &[u8]) -> Result<Bytes, FunctionError> {
    let address = ctx.address();
    let total = ctx.sload(address, U256::from(constants::COUNT_SLOT))?;
    Ok(total.abi_encode().into())
}
