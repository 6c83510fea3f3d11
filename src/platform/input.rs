//! Keyboard and touch input to movement intent
//!
//! Keys are tracked by lowercase `KeyboardEvent.key` names. A touch drag acts
//! as a virtual stick: the offset from the touch origin divided by
//! `TOUCH_SCALE`, clamped per axis, overriding the keyboard once it leaves the
//! dead zone.

use std::collections::HashSet;

use glam::Vec2;

use crate::sim::TickInput;

/// Pixels of drag for full deflection on one axis
pub const TOUCH_SCALE: f32 = 50.0;
/// Per-axis deflection below which the touch stick is ignored
pub const TOUCH_DEADZONE: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Touch {
    origin: Vec2,
    current: Vec2,
}

/// Live input state, sampled once per frame
#[derive(Debug, Clone, Default)]
pub struct InputState {
    held: HashSet<String>,
    touch: Option<Touch>,
    pause_requested: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the key is one the game handles (the host should
    /// prevent its default action)
    pub fn key_down(&mut self, key: &str) -> bool {
        let key = key.to_lowercase();
        if matches!(key.as_str(), "escape" | "p") {
            self.pause_requested = true;
            return true;
        }
        let handled = is_movement_key(&key);
        self.held.insert(key);
        handled
    }

    pub fn key_up(&mut self, key: &str) {
        self.held.remove(&key.to_lowercase());
    }

    pub fn touch_start(&mut self, x: f32, y: f32) {
        let p = Vec2::new(x, y);
        self.touch = Some(Touch {
            origin: p,
            current: p,
        });
    }

    pub fn touch_move(&mut self, x: f32, y: f32) {
        if let Some(touch) = &mut self.touch {
            touch.current = Vec2::new(x, y);
        }
    }

    pub fn touch_end(&mut self) {
        self.touch = None;
    }

    /// Request a pause toggle on the next frame (host auto-pause)
    pub fn request_pause(&mut self) {
        self.pause_requested = true;
    }

    /// Drop held keys and touches (window lost focus)
    pub fn clear(&mut self) {
        self.held.clear();
        self.touch = None;
    }

    fn held(&self, a: &str, b: &str) -> bool {
        self.held.contains(a) || self.held.contains(b)
    }

    /// Touch stick deflection, clamped to [-1, 1] per axis
    pub fn touch_vector(&self) -> Vec2 {
        match self.touch {
            Some(t) => ((t.current - t.origin) / TOUCH_SCALE).clamp(Vec2::NEG_ONE, Vec2::ONE),
            None => Vec2::ZERO,
        }
    }

    /// Unit-length (or zero) movement direction
    pub fn move_intent(&self) -> Vec2 {
        let stick = self.touch_vector();
        let raw = if stick.x.abs() > TOUCH_DEADZONE || stick.y.abs() > TOUCH_DEADZONE {
            stick
        } else {
            let mut d = Vec2::ZERO;
            if self.held("w", "arrowup") {
                d.y = -1.0;
            }
            if self.held("s", "arrowdown") {
                d.y = 1.0;
            }
            if self.held("a", "arrowleft") {
                d.x = -1.0;
            }
            if self.held("d", "arrowright") {
                d.x = 1.0;
            }
            d
        };
        raw.normalize_or_zero()
    }

    /// Build this frame's tick input, consuming any pending pause request
    pub fn sample(&mut self) -> TickInput {
        TickInput {
            move_intent: self.move_intent(),
            pause: std::mem::take(&mut self.pause_requested),
        }
    }
}

fn is_movement_key(key: &str) -> bool {
    matches!(
        key,
        "w" | "a" | "s" | "d" | "arrowup" | "arrowdown" | "arrowleft" | "arrowright" | " "
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagonal_keys_normalized() {
        let mut input = InputState::new();
        assert!(input.key_down("W"));
        assert!(input.key_down("ArrowRight"));
        let intent = input.move_intent();
        assert!((intent.length() - 1.0).abs() < 1e-5);
        assert!(intent.x > 0.0 && intent.y < 0.0);
        input.key_up("w");
        assert_eq!(input.move_intent(), Vec2::X);
    }

    #[test]
    fn test_touch_deadzone_and_override() {
        let mut input = InputState::new();
        input.key_down("a");
        input.touch_start(100.0, 100.0);
        input.touch_move(103.0, 102.0);
        // Inside the dead zone: keyboard wins
        assert_eq!(input.move_intent(), Vec2::NEG_X);
        input.touch_move(400.0, 100.0);
        assert_eq!(input.touch_vector(), Vec2::new(1.0, 0.0));
        assert_eq!(input.move_intent(), Vec2::X);
        input.touch_end();
        assert_eq!(input.move_intent(), Vec2::NEG_X);
    }

    #[test]
    fn test_pause_request_consumed_once() {
        let mut input = InputState::new();
        input.key_down("Escape");
        assert!(input.sample().pause);
        assert!(!input.sample().pause);
    }

    #[test]
    fn test_clear_releases_everything() {
        let mut input = InputState::new();
        input.key_down("d");
        input.touch_start(0.0, 0.0);
        input.clear();
        assert_eq!(input.move_intent(), Vec2::ZERO);
    }
}
