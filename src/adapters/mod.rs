//! Adapters between the outside world and the tick loop.

pub mod keyboard;
