//! Audio system using Web Audio API
//!
//! Procedurally generated sound effects - no external files needed!
//! Each `SoundCue` maps to a single oscillator with a frequency schedule and
//! an exponential gain decay.

use crate::sim::SoundCue;

/// Oscillator waveform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
}

/// How the pitch changes over the tone
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pitch {
    /// Exponential glide from `from` to `to` over `secs`
    Glide { from: f32, to: f32, secs: f32 },
    /// Hard steps: `(offset_secs, hz)`
    Steps(&'static [(f32, f32)]),
}

/// Description of one synthesized sound
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub waveform: Waveform,
    pub pitch: Pitch,
    /// Fraction of the effective volume at onset
    pub gain: f32,
    /// Seconds until the gain has decayed and the oscillator stops
    pub duration: f32,
}

pub fn tone_for(cue: SoundCue) -> Tone {
    match cue {
        SoundCue::Shoot => Tone {
            waveform: Waveform::Square,
            pitch: Pitch::Glide {
                from: 600.0,
                to: 200.0,
                secs: 0.1,
            },
            gain: 1.0,
            duration: 0.1,
        },
        SoundCue::Hit => Tone {
            waveform: Waveform::Sawtooth,
            pitch: Pitch::Glide {
                from: 150.0,
                to: 50.0,
                secs: 0.15,
            },
            gain: 1.0,
            duration: 0.15,
        },
        SoundCue::Kill => Tone {
            waveform: Waveform::Square,
            pitch: Pitch::Glide {
                from: 200.0,
                to: 800.0,
                secs: 0.1,
            },
            gain: 1.0,
            duration: 0.15,
        },
        SoundCue::Xp => Tone {
            waveform: Waveform::Sine,
            pitch: Pitch::Steps(&[(0.0, 880.0), (0.05, 1100.0)]),
            gain: 1.0,
            duration: 0.1,
        },
        SoundCue::Coin => Tone {
            waveform: Waveform::Square,
            pitch: Pitch::Steps(&[(0.0, 1200.0), (0.05, 1500.0)]),
            gain: 1.0,
            duration: 0.1,
        },
        SoundCue::LevelUp => Tone {
            waveform: Waveform::Square,
            pitch: Pitch::Steps(&[(0.0, 440.0), (0.1, 550.0), (0.2, 660.0), (0.3, 880.0)]),
            gain: 0.5,
            duration: 0.5,
        },
        SoundCue::Hurt => Tone {
            waveform: Waveform::Sawtooth,
            pitch: Pitch::Glide {
                from: 200.0,
                to: 80.0,
                secs: 0.2,
            },
            gain: 1.0,
            duration: 0.2,
        },
        SoundCue::GameOver => Tone {
            waveform: Waveform::Sawtooth,
            pitch: Pitch::Glide {
                from: 440.0,
                to: 110.0,
                secs: 0.8,
            },
            gain: 1.0,
            duration: 1.0,
        },
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, AudioContextState, OscillatorType};

    use super::{Pitch, Tone, Waveform, tone_for};
    use crate::settings::Settings;
    use crate::sim::SoundCue;

    /// Base loudness relative to the settings volume
    const BASE_GAIN: f32 = 0.3;

    /// Audio manager for the game
    pub struct AudioManager {
        ctx: Option<AudioContext>,
        volume: f32,
    }

    impl Default for AudioManager {
        fn default() -> Self {
            Self::new()
        }
    }

    impl AudioManager {
        pub fn new() -> Self {
            // May fail outside a secure context
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self { ctx, volume: 0.8 }
        }

        /// Resume audio context (required after user gesture)
        pub fn resume(&self) {
            if let Some(ctx) = &self.ctx {
                let _ = ctx.resume();
            }
        }

        pub fn apply_settings(&mut self, settings: &Settings) {
            self.volume = settings.effective_volume();
        }

        /// Play a sound cue; failures are silent
        pub fn play(&self, cue: SoundCue) {
            if self.volume <= 0.0 {
                return;
            }
            let Some(ctx) = &self.ctx else { return };

            if ctx.state() == AudioContextState::Suspended {
                let _ = ctx.resume();
            }
            if self.play_tone(ctx, &tone_for(cue)).is_none() {
                log::debug!("Sound {:?} could not be scheduled", cue);
            }
        }

        fn play_tone(&self, ctx: &AudioContext, tone: &Tone) -> Option<()> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;
            osc.set_type(match tone.waveform {
                Waveform::Sine => OscillatorType::Sine,
                Waveform::Square => OscillatorType::Square,
                Waveform::Sawtooth => OscillatorType::Sawtooth,
            });
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            let t = ctx.current_time();
            let freq = osc.frequency();
            match tone.pitch {
                Pitch::Glide { from, to, secs } => {
                    freq.set_value_at_time(from, t).ok()?;
                    freq.exponential_ramp_to_value_at_time(to, t + f64::from(secs))
                        .ok()?;
                }
                Pitch::Steps(steps) => {
                    for (offset, hz) in steps {
                        freq.set_value_at_time(*hz, t + f64::from(*offset)).ok()?;
                    }
                }
            }

            let end = t + f64::from(tone.duration);
            gain.gain()
                .set_value_at_time(self.volume * BASE_GAIN * tone.gain, t)
                .ok()?;
            gain.gain().exponential_ramp_to_value_at_time(0.01, end).ok()?;

            osc.start().ok()?;
            osc.stop_with_when(end).ok()?;
            Some(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_cue_has_a_finite_tone() {
        let cues = [
            SoundCue::Shoot,
            SoundCue::Hit,
            SoundCue::Kill,
            SoundCue::Xp,
            SoundCue::Coin,
            SoundCue::LevelUp,
            SoundCue::Hurt,
            SoundCue::GameOver,
        ];
        for cue in cues {
            let tone = tone_for(cue);
            assert!(tone.duration > 0.0 && tone.gain > 0.0, "{cue:?}");
            match tone.pitch {
                // Exponential ramps cannot target zero
                Pitch::Glide { from, to, secs } => {
                    assert!(from > 0.0 && to > 0.0 && secs <= tone.duration)
                }
                Pitch::Steps(steps) => assert!(steps.iter().all(|(t, _)| *t < tone.duration)),
            }
        }
    }

    #[test]
    fn test_level_up_arpeggio() {
        let Pitch::Steps(steps) = tone_for(SoundCue::LevelUp).pitch else {
            panic!("level-up is stepped");
        };
        let hz: Vec<f32> = steps.iter().map(|(_, hz)| *hz).collect();
        assert_eq!(hz, vec![440.0, 550.0, 660.0, 880.0]);
    }
}
