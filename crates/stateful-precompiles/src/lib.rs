//! Stateful precompiles for the `MegaETH` EVM.
//!
//! A native contract is a set of functions implemented in Rust and bound to a fixed address.
//! Unlike classic precompiles, native functions can read and write the world state of the
//! executing transaction through a [`PrecompileContext`].
//!
//! The pieces fit together as follows:
//!
//! - [`NativeFunction`] prices a payload and executes it.
//! - [`NativeContract`] maps 4-byte selectors to functions.
//! - [`NativeContractRegistry`] maps addresses to contracts.
//! - [`dispatch`] runs one call against a contract, charging gas up front.
//! - [`NativePrecompiles`] plugs a registry into revm as a [`PrecompileProvider`].
//!
//! [`PrecompileProvider`]: revm::handler::PrecompileProvider
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod constants;

mod context;
pub use context::*;

mod contract;
pub use contract::*;

mod dispatch;
pub use dispatch::*;

mod function;
pub use function::*;

mod observer;
pub use observer::*;

mod provider;
pub use provider::*;

mod registry;
pub use registry::*;

mod state;
pub use state::*;

pub mod fish_store;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
