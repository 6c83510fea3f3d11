//! Browser host
//!
//! `WebGame` is exported to JavaScript. The page owns the canvas, DOM overlays
//! and the `requestAnimationFrame` loop; it forwards input events here, calls
//! `frame(timestamp)` once per animation frame and draws from
//! `snapshot_json()`.

use wasm_bindgen::prelude::*;

use super::{FrameClock, InputState};
use crate::audio::AudioManager;
use crate::records::Records;
use crate::settings::Settings;
use crate::sim::{
    FrameSnapshot, GameEvent, GamePhase, GameState, HudSnapshot, UpgradeId, select_upgrade, tick,
};

/// Install the panic hook and console logger once
fn init_logging() {
    console_error_panic_hook::set_once();
    // Fails only if a logger is already installed
    let _ = console_log::init_with_level(log::Level::Info);
}

fn new_seed() -> u64 {
    js_sys::Date::now() as u64
}

#[wasm_bindgen]
pub struct WebGame {
    state: GameState,
    clock: FrameClock,
    input: InputState,
    audio: AudioManager,
    settings: Settings,
    records: Records,
    /// Events of the last frame, serialized for the page
    last_events: Vec<GameEvent>,
}

#[wasm_bindgen]
impl WebGame {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WebGame {
        init_logging();
        let settings = Settings::load();
        let records = Records::load();
        let mut audio = AudioManager::new();
        audio.apply_settings(&settings);

        let seed = new_seed();
        let mut state = GameState::new(seed);
        state.particle_cap = settings.max_particles();
        state.unlocked = records.achievements.clone();
        log::info!("Pixel Survivors starting with seed {}", seed);

        WebGame {
            state,
            clock: FrameClock::default(),
            input: InputState::new(),
            audio,
            settings,
            records,
            last_events: Vec::new(),
        }
    }

    /// Advance one animation frame (`timestamp` in milliseconds)
    pub fn frame(&mut self, timestamp: f64) {
        let dt = self.clock.advance(timestamp);
        let input = self.input.sample();
        tick(&mut self.state, &input, dt);

        let events = self.state.drain_events();
        for event in &events {
            match event {
                GameEvent::Sound(cue) => self.audio.play(*cue),
                GameEvent::GameOver(summary) => {
                    if let Some(rank) = self.records.merge(summary, js_sys::Date::now()) {
                        log::info!("Run ranked #{} on the leaderboard", rank);
                    }
                    self.records.save();
                }
                _ => {}
            }
        }
        self.last_events = events;
    }

    /// Returns true if the page should suppress the key's default action
    pub fn key_down(&mut self, key: &str) -> bool {
        self.audio.resume();
        self.input.key_down(key)
    }

    pub fn key_up(&mut self, key: &str) {
        self.input.key_up(key);
    }

    pub fn touch_start(&mut self, x: f32, y: f32) {
        self.audio.resume();
        self.input.touch_start(x, y);
    }

    pub fn touch_move(&mut self, x: f32, y: f32) {
        self.input.touch_move(x, y);
    }

    pub fn touch_end(&mut self) {
        self.input.touch_end();
    }

    /// Host auto-pause (tab hidden, window blur)
    pub fn auto_pause(&mut self) {
        if !self.settings.pause_on_blur {
            return;
        }
        self.input.clear();
        if self.state.phase == GamePhase::Running {
            self.input.request_pause();
            log::info!("Auto-paused");
        }
    }

    /// Manual pause toggle (pause button, resume button)
    pub fn toggle_pause(&mut self) {
        self.input.request_pause();
        self.clock.reset();
    }

    /// Pick one of the offered upgrades by its snake_case id
    pub fn select_upgrade(&mut self, id: &str) -> Result<(), JsValue> {
        let id: UpgradeId = serde_json::from_value(serde_json::Value::String(id.to_owned()))
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        select_upgrade(&mut self.state, id).map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.clock.reset();
        for event in self.state.drain_events() {
            self.last_events.push(event);
        }
        Ok(())
    }

    pub fn restart(&mut self) {
        let seed = new_seed();
        self.state.reset(seed);
        self.clock.reset();
        self.input.clear();
        self.last_events.clear();
    }

    /// Resize the logical viewport (spawn ring and camera follow it)
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        if width > 0.0 && height > 0.0 {
            self.state.tuning.viewport = glam::Vec2::new(width, height);
            self.state.update_camera();
        }
    }

    /// Apply settings JSON from the options screen and persist it
    pub fn set_settings_json(&mut self, json: &str) -> Result<(), JsValue> {
        let settings: Settings =
            serde_json::from_str(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.audio.apply_settings(&settings);
        self.state.particle_cap = settings.max_particles();
        settings.save();
        self.settings = settings;
        Ok(())
    }

    pub fn settings_json(&self) -> String {
        serde_json::to_string(&self.settings).unwrap_or_default()
    }

    pub fn snapshot_json(&self) -> String {
        serde_json::to_string(&FrameSnapshot::capture(&self.state)).unwrap_or_default()
    }

    pub fn hud_json(&self) -> String {
        serde_json::to_string(&HudSnapshot::capture(&self.state)).unwrap_or_default()
    }

    /// Events from the last frame (sounds are already played)
    pub fn events_json(&self) -> String {
        serde_json::to_string(&self.last_events).unwrap_or_default()
    }

    pub fn records_json(&self) -> String {
        serde_json::to_string(&self.records).unwrap_or_default()
    }

    pub fn damage_numbers_enabled(&self) -> bool {
        self.settings.damage_numbers
    }

    pub fn screen_shake_enabled(&self) -> bool {
        self.settings.effective_screen_shake()
    }
}

impl Default for WebGame {
    fn default() -> Self {
        Self::new()
    }
}
