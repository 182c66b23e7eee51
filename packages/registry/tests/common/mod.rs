// Common test utilities
#![allow(dead_code)]

pub mod fixtures;
pub mod harness;
pub mod yielding_store;

pub use fixtures::*;
pub use harness::*;
pub use yielding_store::YieldingStore;
