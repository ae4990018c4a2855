pub mod client;
pub mod contracts;
pub mod controller;
pub mod flow;
pub mod onramp;
