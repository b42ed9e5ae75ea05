//! Test utilities for native contracts.

mod env;
mod functions;
mod state;

pub use env::*;
pub use functions::*;
pub use state::*;
