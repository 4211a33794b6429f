//! CLI Interface: User input and terminal rendering
//!
//! # Components
//! - `input.rs`: Keystroke capture and key-to-selection mapping
//! - `display.rs`: Menu, trial and diagnosis screens

pub mod display;
pub mod input;

pub use display::Display;
pub use input::{InputHandler, MenuChoice};
