//! Composition root library for the `vocora` binary.
//!
//! Kept as a library + thin `main.rs` (mirroring `gglib-cli`'s split) so
//! the wiring in [`bootstrap`] is unit-testable without a process boundary.

pub mod backends;
pub mod bootstrap;
pub mod cli;
pub mod events;

pub use bootstrap::{bootstrap, CliContext};
pub use cli::Cli;
