pub mod amount;
pub mod revert;
pub mod sequencer;
pub mod token_info;
pub mod view;
