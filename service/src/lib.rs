#![deny(
    clippy::expect_used,
    clippy::panic,
    clippy::print_stdout,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used
)]

pub mod clock;
pub mod config;
pub mod sources;
pub mod store;
pub mod sync;
