//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Frame timing (`clock`)
//! - Input events to movement intent (`input`)
//! - LocalStorage persistence (`storage`)
//! - The wasm-bindgen host object (`web`, wasm32 only)

pub mod clock;
pub mod input;
pub mod storage;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use clock::FrameClock;
pub use input::InputState;
