//! Stomplight controller library.
//!
//! Exposes the device abstraction and mode logic for integration testing
//! and external inspection. Everything that talks to real GPIO goes through
//! the external line tools behind the `LineQuery`/`LineHold` ports, so the
//! whole stack runs against in-memory fakes in tests.

pub mod config;
pub mod diagnostics;
pub mod fsm;
pub mod hardware;
pub mod input;
pub mod layout;
pub mod pins;

pub mod adapters;
pub mod drivers;
pub mod error;
pub mod rng;
pub mod shutdown;
