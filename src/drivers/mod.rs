//! GPIO device abstraction layer.
//!
//! Leaf to root: external command execution, the debounce/edge filters,
//! the two line archetypes (sampled input, held-process output), the pin
//! registry that enforces exclusive ownership, and the two domain devices
//! (`Button`, `Led`) the inventory assembles from them.

pub mod button;
pub mod command;
pub mod debounce;
pub mod edge;
pub mod input_line;
pub mod led;
pub mod output_line;
pub mod registry;

#[cfg(test)]
pub(crate) mod testutil;
