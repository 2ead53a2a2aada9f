//! Inviter services implementations

pub mod clock;
pub mod ledger_store;
pub mod vk_client;

#[cfg(test)]
pub mod tests;

pub use clock::*;
pub use ledger_store::*;
pub use vk_client::*;
