//! The top-level synth: owns the parameter store, the fixed-size voice
//! pool, and the handful of live-path globals (pitch bend, mod wheel,
//! sustain) that bypass the deferred-parameter snapshot taken at trigger
//! time.
//!
//! Single-threaded, cooperative, no internal synchronization (§5): every
//! method here is expected to run on one thread, typically the realtime
//! audio thread itself.

use crate::audio::voice::{pitch_bend_to_ratio, Voice, VoiceState};
use crate::error::Status;
use crate::params::{GlobalParamId, ParamId, ParameterStore};
use crate::OPERATORS;

pub struct Engine {
    sample_rate: f32,
    inv_sample_rate: f32,
    params: ParameterStore,
    voices: Vec<Voice>,
    bend: f32,
    wheel: f32,
    sustained: bool,
}

impl Engine {
    /// Allocates the voice pool once; no further allocation happens after
    /// construction (§5 — zero allocation on the hot path).
    pub fn new(sample_rate: f32, max_voices: usize) -> Self {
        let mut engine = Self {
            sample_rate,
            inv_sample_rate: 1.0 / sample_rate,
            params: ParameterStore::default(),
            voices: (0..max_voices).map(|_| Voice::new()).collect(),
            bend: 1.0,
            wheel: 0.0,
            sustained: false,
        };
        engine.reset();
        engine
    }

    /// Re-initializes voices and parameters to their default state,
    /// equivalent to constructing a fresh engine at the same sample rate
    /// and polyphony.
    pub fn reset(&mut self) {
        for voice in &mut self.voices {
            *voice = Voice::new();
        }
        self.params = ParameterStore::default();
        self.bend = 1.0;
        self.wheel = 0.0;
        self.sustained = false;
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn max_voices(&self) -> usize {
        self.voices.len()
    }

    /// Lifecycle state of voice pool slot `index`. Mainly useful for tests
    /// and diagnostics; ordinary embedders drive the engine through the
    /// control surface and `render` alone.
    pub fn voice_state(&self, index: usize) -> VoiceState {
        self.voices[index].state
    }

    /// Per-operator sample-step rate currently loaded into voice pool slot
    /// `index`. Exposed for tests that check pitch-bend recomputation.
    pub fn voice_step_rate(&self, index: usize) -> [f32; OPERATORS] {
        *self.voices[index].step_rate()
    }

    // --- Parameter store -------------------------------------------------

    /// Store-only; out-of-range ids are silently ignored. Effect is
    /// deferred to the next note-trigger (§4.2).
    pub fn set_parameter(&mut self, id: ParamId, operator: usize, value: f32) {
        self.params.set_parameter(id, operator, value);
    }

    pub fn get_parameter(&self, id: ParamId, operator: usize) -> f32 {
        self.params.get_parameter(id, operator)
    }

    pub fn set_global_parameter(&mut self, id: GlobalParamId, value: f32) {
        self.params.set_global_parameter(id, value);
    }

    pub fn get_global_parameter(&self, id: GlobalParamId) -> f32 {
        self.params.get_global_parameter(id)
    }

    pub(crate) fn params(&self) -> &ParameterStore {
        &self.params
    }

    pub(crate) fn params_mut(&mut self) -> &mut ParameterStore {
        &mut self.params
    }

    // --- Control surface ---------------------------------------------------

    /// Allocates the first `Inactive` voice in index order and triggers it.
    /// No voice-stealing: a full pool returns `Busy` rather than cutting
    /// off an existing note.
    pub fn note_on(&mut self, note: u8, velocity: u8) -> Status {
        let Some(voice) = self.voices.iter_mut().find(|v| v.state == VoiceState::Inactive) else {
            return Status::Busy;
        };
        voice.trigger(
            &self.params,
            note,
            velocity,
            self.bend,
            self.wheel,
            self.inv_sample_rate,
            self.params.lfo_freq(),
        );
        Status::Ok
    }

    /// Every `Running` voice matching `note` is released, or moved to
    /// `Sustained` if the sustain pedal is currently held.
    pub fn note_off(&mut self, note: u8) {
        for voice in &mut self.voices {
            if voice.note == note && voice.state == VoiceState::Running {
                if self.sustained {
                    voice.state = VoiceState::Sustained;
                } else {
                    voice.release();
                }
            }
        }
    }

    /// Edge-triggered: releasing the pedal (`true` -> `false`) releases
    /// every currently `Sustained` voice.
    pub fn set_sustain(&mut self, on: bool) {
        let releasing = self.sustained && !on;
        self.sustained = on;
        if releasing {
            for voice in &mut self.voices {
                if voice.state == VoiceState::Sustained {
                    voice.release();
                }
            }
        }
    }

    /// `w` is a raw 0-127 MIDI value; recomputes `wheel_amp`/`read_mod` for
    /// every active voice immediately (a live path, unlike
    /// `set_parameter`).
    pub fn set_mod_wheel(&mut self, w: u8) {
        self.wheel = w as f32 / 127.0;
        let mod_sensitivity = *self.params.row(ParamId::ModWheelSensitivity);
        for voice in &mut self.voices {
            if voice.is_active() {
                voice.apply_mod_wheel(&mod_sensitivity, self.wheel);
            }
        }
    }

    /// `v14` is a 14-bit MIDI pitch-bend value; recomputes `step_rate` for
    /// every active voice from its stored `base_freq`.
    pub fn set_pitch_bend(&mut self, v14: u16) {
        self.bend = pitch_bend_to_ratio(v14);
        let freq_mod = *self.params.row(ParamId::FreqMod);
        let freq_offset = *self.params.row(ParamId::FreqOffset);
        for voice in &mut self.voices {
            if voice.is_active() {
                voice.apply_pitch_bend(&freq_mod, &freq_offset, self.bend, self.inv_sample_rate);
            }
        }
    }

    /// Releases every voice, even `Running` or `Sustained` ones, and clears
    /// the sustain latch.
    pub fn release_all(&mut self) {
        for voice in &mut self.voices {
            voice.release();
        }
        self.sustained = false;
    }

    // --- Rendering -----------------------------------------------------

    /// Additively mixes `frames` samples of audio into `left`/`right` from
    /// every non-`Inactive` voice and returns the number still active
    /// afterward. The caller owns buffer clearing; this never allocates.
    pub fn render(&mut self, left: &mut [f32], right: &mut [f32], frames: usize) -> usize {
        debug_assert!(left.len() >= frames && right.len() >= frames);
        let mut active = 0;
        for voice in &mut self.voices {
            if voice.is_active() {
                voice.render(&self.params, &mut left[..frames], &mut right[..frames], frames);
                if voice.update_active() {
                    active += 1;
                }
            }
        }
        active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_defaults_leave_buffers_untouched() {
        let mut engine = Engine::new(44100.0, 64);
        let mut left = vec![0.0f32; 64];
        let mut right = vec![0.0f32; 64];
        let active = engine.render(&mut left, &mut right, 64);
        assert_eq!(active, 0);
        assert!(left.iter().all(|&s| s == 0.0));
        assert!(right.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn single_tone_is_audible_and_bounded() {
        let mut engine = Engine::new(44100.0, 4);
        assert_eq!(engine.note_on(69, 127), Status::Ok);

        let frames = 44100;
        let mut left = vec![0.0f32; frames];
        let mut right = vec![0.0f32; frames];
        engine.render(&mut left, &mut right, frames);

        let peak = left.iter().fold(0.0f32, |m, &s| m.max(s.abs()));
        assert!(peak > 0.0);
        assert!(peak <= 0.25, "peak {peak} exceeds volume + margin");

        let mut crossings = 0;
        for w in left.windows(2) {
            if w[0] <= 0.0 && w[1] > 0.0 {
                crossings += 1;
            }
        }
        let measured_hz = crossings as f32 * (44100.0 / frames as f32);
        assert!((measured_hz - 440.0).abs() < 1.0, "measured {measured_hz} Hz");
    }

    #[test]
    fn polyphony_cap_returns_busy_on_exhaustion() {
        let mut engine = Engine::new(44100.0, 4);
        assert_eq!(engine.note_on(60, 100), Status::Ok);
        assert_eq!(engine.note_on(62, 100), Status::Ok);
        assert_eq!(engine.note_on(64, 100), Status::Ok);
        assert_eq!(engine.note_on(65, 100), Status::Ok);
        assert_eq!(engine.note_on(67, 100), Status::Busy);

        let mut left = vec![0.0f32; 16];
        let mut right = vec![0.0f32; 16];
        assert_eq!(engine.render(&mut left, &mut right, 16), 4);
    }

    #[test]
    fn sustain_hold_lifecycle() {
        let mut engine = Engine::new(44100.0, 4);
        engine.set_sustain(true);
        engine.note_on(60, 100);
        engine.note_off(60);
        assert_eq!(engine.voices[0].state, VoiceState::Sustained);

        engine.set_sustain(false);
        assert_eq!(engine.voices[0].state, VoiceState::Released);

        let mut left = vec![0.0f32; 64];
        let mut right = vec![0.0f32; 64];
        for _ in 0..(44100 * 2 / 64) {
            engine.render(&mut left, &mut right, 64);
        }
        assert_eq!(engine.voices[0].state, VoiceState::Inactive);
    }

    #[test]
    fn pitch_bend_center_matches_pre_bend_step_rate() {
        let mut engine = Engine::new(44100.0, 1);
        engine.note_on(69, 127);
        let before = *engine.voices[0].step_rate();
        engine.set_pitch_bend(8192);
        let after = *engine.voices[0].step_rate();
        for o in 0..OPERATORS {
            assert!((before[o] - after[o]).abs() < 1e-6);
        }
    }
}
