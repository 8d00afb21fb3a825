//! Single-node Proof of Value Contribution chain core: accounts and
//! transactions, blocks and the chain manager, and the PoVC engine that
//! produces blocks and adjusts rewards through an external scoring oracle.

pub mod api;
pub mod blockchain;
pub mod config;
pub mod consensus;
pub mod transaction;
pub mod wallet;

#[cfg(test)]
mod testing;
