//! Integration tests for the presale purchase flow.
//!
//! Drives the purchase controller (sequencer, spawned chain tasks and view) against an
//! in-memory presale contract:
//! - Approval before purchase, and approval skipped when allowance suffices
//! - Failure mapping into the error modal
//! - Single-flight rejection of overlapping intents
//! - Disconnected wallet shows the connect prompt and never reads the chain

pub mod mock_presale;
pub mod purchase_flow;
