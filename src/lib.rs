//! MOTRA presale client - buy presale tokens with USDC from the terminal.
//!
//! This library provides:
//! - The cost calculator and allowance checks for stablecoin purchases
//! - The approval-then-purchase sequencer
//! - The presale contract client and fiat on-ramp link builder
//! - The presentation model for the purchase screen

pub mod config;
pub mod domain;
pub mod infra;
