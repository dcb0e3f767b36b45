//! A single polyphonic voice: phases, envelope, LFO, and per-operator gains
//! for one note instance. Owned exclusively by the engine's voice pool —
//! never heap-allocated or freed individually (see the engine for
//! allocation).

use crate::dsp::envelope::{build_segments, falloff, step_toward, target_released, target_running};
use crate::dsp::oscillator::{sin_approx, wrap_phase};
use crate::dsp::Lfo;
use crate::params::{ParamId, ParameterStore};
use crate::{FRAMES_PER_LFO, OPERATORS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Inactive,
    Running,
    Sustained,
    Released,
}

/// Per-note synthesis state. Struct-of-arrays layout (each field below is a
/// flat `[f32; OPERATORS]`, one lane per operator) so a later SIMD backend
/// can vectorize the inner loop without reshaping the voice.
#[derive(Debug, Clone)]
pub struct Voice {
    pub state: VoiceState,
    pub note: u8,
    base_freq: f32,
    enable_mask: u8,
    dead_mask: u8,
    pos: f32,
    speed: f32,
    count: u32,
    lfo: Lfo,

    phases: [f32; OPERATORS],
    env: [f32; OPERATORS],
    read_mod: [f32; OPERATORS],
    target_env_step: [f32; OPERATORS],
    step_rate: [f32; OPERATORS],
    lfo_freq_mod: [f32; OPERATORS],
    pan_amp: [[f32; OPERATORS]; 2],
    falloff: [f32; OPERATORS],
    end_time: [f32; OPERATORS],
    target_env: [f32; OPERATORS],
    release_time: [f32; OPERATORS],
    target: [[f32; OPERATORS]; 4],
    time: [[f32; OPERATORS]; 4],
    lerp: [[f32; OPERATORS]; 3],
    amp: [f32; OPERATORS],
    wheel_amp: [f32; OPERATORS],
    lfo_amp: [f32; OPERATORS],
}

impl Voice {
    /// A freshly constructed, inactive voice. Matches the reference
    /// library's `fmsynth_init_voices`: the multiplicative gain fields
    /// start at 1.0 rather than 0.0, so a voice that somehow rendered before
    /// its first trigger would be silent only because `env`/`amp` are zero,
    /// not because a gain term happens to be zero too.
    pub fn new() -> Self {
        Self {
            state: VoiceState::Inactive,
            note: 0,
            base_freq: 0.0,
            enable_mask: 0,
            dead_mask: 0,
            pos: 0.0,
            speed: 0.0,
            count: 0,
            lfo: Lfo { phase: 0.25, step: 0.0 },
            phases: [0.0; OPERATORS],
            env: [0.0; OPERATORS],
            read_mod: [0.0; OPERATORS],
            target_env_step: [0.0; OPERATORS],
            step_rate: [0.0; OPERATORS],
            lfo_freq_mod: [1.0; OPERATORS],
            pan_amp: [[1.0; OPERATORS]; 2],
            falloff: [0.0; OPERATORS],
            end_time: [0.0; OPERATORS],
            target_env: [0.0; OPERATORS],
            release_time: [0.0; OPERATORS],
            target: [[0.0; OPERATORS]; 4],
            time: [[0.0; OPERATORS]; 4],
            lerp: [[0.0; OPERATORS]; 3],
            amp: [1.0; OPERATORS],
            wheel_amp: [1.0; OPERATORS],
            lfo_amp: [1.0; OPERATORS],
        }
    }

    pub fn is_active(&self) -> bool {
        self.state != VoiceState::Inactive
    }

    pub(crate) fn step_rate(&self) -> &[f32; OPERATORS] {
        &self.step_rate
    }

    /// Trigger this voice for `(note, velocity)`. `bend`/`wheel`/`volume`
    /// are the engine's current live-path values; `params` is the snapshot
    /// this note will run with until its next trigger (§4.2's deferred
    /// parameter semantics).
    pub fn trigger(
        &mut self,
        params: &ParameterStore,
        note: u8,
        velocity: u8,
        bend: f32,
        wheel: f32,
        inv_sample_rate: f32,
        global_lfo_freq: f32,
    ) {
        self.note = note;
        self.base_freq = note_to_frequency(note);

        let freq = bend * self.base_freq;
        let mod_vel = velocity as f32 / 127.0;

        let freq_mod = params.row(ParamId::FreqMod);
        let freq_offset = params.row(ParamId::FreqOffset);
        for o in 0..OPERATORS {
            self.step_rate[o] = (freq * freq_mod[o] + freq_offset[o]) * inv_sample_rate;
        }

        self.speed = inv_sample_rate;
        self.reset_voice(params, mod_vel, self.base_freq, wheel, params.volume());
        self.update_read_mod();

        self.lfo = Lfo::triggered(FRAMES_PER_LFO as f32 * global_lfo_freq * inv_sample_rate);
        self.count = 0;
        self.state = VoiceState::Running;
    }

    /// `base_freq` here is the *unbent* note frequency: §4.3 step 3 derives
    /// the keyboard-scaling ratio from `base_freq`, not from the
    /// bend-adjusted frequency used for `step_rate`.
    fn reset_voice(&mut self, params: &ParameterStore, velocity: f32, base_freq: f32, wheel: f32, volume: f32) {
        self.enable_mask = 0;

        let vel_sens = params.row(ParamId::VelocitySensitivity);
        let mid_point = params.row(ParamId::KeyboardScalingMidPoint);
        let low_factor = params.row(ParamId::KeyboardScalingLowFactor);
        let high_factor = params.row(ParamId::KeyboardScalingHighFactor);
        let enable = params.row(ParamId::Enable);
        let amp_param = params.row(ParamId::Amp);
        let mod_sens = params.row(ParamId::ModWheelSensitivity);
        let pan = params.row(ParamId::Pan);
        let carriers = params.row(ParamId::Carriers);

        for o in 0..OPERATORS {
            self.phases[o] = 0.25;

            let mut mod_amp = 1.0 - vel_sens[o] + vel_sens[o] * velocity;
            let ratio = base_freq / mid_point[o];
            let factor = if ratio > 1.0 { high_factor[o] } else { low_factor[o] };
            mod_amp *= ratio.powf(factor);

            let op_enabled = enable[o] > 0.5;
            if op_enabled {
                self.enable_mask |= 1 << o;
            }
            self.amp[o] = if op_enabled { mod_amp * amp_param[o] } else { 0.0 };

            self.wheel_amp[o] = 1.0 - mod_sens[o] + mod_sens[o] * wheel;
            self.pan_amp[0][o] = volume * (1.0 - pan[o]).min(1.0) * carriers[o];
            self.pan_amp[1][o] = volume * (1.0 + pan[o]).min(1.0) * carriers[o];

            self.lfo_amp[o] = 1.0;
            self.lfo_freq_mod[o] = 1.0;
        }

        self.reset_envelope(params);
    }

    fn reset_envelope(&mut self, params: &ParameterStore) {
        self.pos = 0.0;
        self.count = 0;
        self.dead_mask = 0;

        let targets = [
            *params.row(ParamId::EnvelopeTarget0),
            *params.row(ParamId::EnvelopeTarget1),
            *params.row(ParamId::EnvelopeTarget2),
        ];
        let delays = [
            *params.row(ParamId::EnvelopeDelay0),
            *params.row(ParamId::EnvelopeDelay1),
            *params.row(ParamId::EnvelopeDelay2),
        ];
        let release = params.row(ParamId::EnvelopeReleaseTime);

        for o in 0..OPERATORS {
            let segments = build_segments(
                [targets[0][o], targets[1][o], targets[2][o]],
                [delays[0][o], delays[1][o], delays[2][o]],
            );
            self.env[o] = 0.0;
            for j in 0..4 {
                self.target[j][o] = segments.target[j];
                self.time[j][o] = segments.time[j];
            }
            for j in 0..3 {
                self.lerp[j][o] = segments.lerp[j];
            }
            self.release_time[o] = release[o];
            self.falloff[o] = falloff(self.release_time[o], FRAMES_PER_LFO, self.speed);
        }

        self.update_target_envelope();
    }

    fn update_read_mod(&mut self) {
        for o in 0..OPERATORS {
            self.read_mod[o] = self.wheel_amp[o] * self.lfo_amp[o] * self.amp[o];
        }
    }

    /// Envelope tick, run once every `FRAMES_PER_LFO` samples.
    fn update_target_envelope(&mut self) {
        self.pos += self.speed * FRAMES_PER_LFO as f32;

        if self.state == VoiceState::Released {
            for o in 0..OPERATORS {
                self.target_env[o] = target_released(self.target_env[o], self.falloff[o]);
                if self.pos >= self.end_time[o] {
                    self.dead_mask |= 1 << o;
                }
            }
        } else {
            for o in 0..OPERATORS {
                let segments = crate::dsp::envelope::Segments {
                    target: [
                        self.target[0][o],
                        self.target[1][o],
                        self.target[2][o],
                        self.target[3][o],
                    ],
                    time: [self.time[0][o], self.time[1][o], self.time[2][o], self.time[3][o]],
                    lerp: [self.lerp[0][o], self.lerp[1][o], self.lerp[2][o]],
                };
                self.target_env[o] = target_running(self.pos, &segments);
            }
        }

        for o in 0..OPERATORS {
            self.target_env_step[o] = step_toward(self.env[o], self.target_env[o], FRAMES_PER_LFO);
        }
    }

    /// Transition to `RELEASED`: set per-operator release deadlines from
    /// the current position.
    pub fn release(&mut self) {
        self.state = VoiceState::Released;
        for o in 0..OPERATORS {
            self.end_time[o] = self.pos + self.release_time[o];
        }
    }

    /// Recompute `wheel_amp`/`read_mod` after a live mod-wheel change. Only
    /// called on non-inactive voices.
    pub fn apply_mod_wheel(&mut self, mod_sensitivity: &[f32; OPERATORS], wheel: f32) {
        for o in 0..OPERATORS {
            self.wheel_amp[o] = 1.0 - mod_sensitivity[o] + mod_sensitivity[o] * wheel;
        }
        self.update_read_mod();
    }

    /// Recompute `step_rate` after a live pitch-bend change, from the
    /// voice's stored `base_freq`.
    pub fn apply_pitch_bend(
        &mut self,
        freq_mod: &[f32; OPERATORS],
        freq_offset: &[f32; OPERATORS],
        bend: f32,
        inv_sample_rate: f32,
    ) {
        let freq = bend * self.base_freq;
        for o in 0..OPERATORS {
            self.step_rate[o] = (freq * freq_mod[o] + freq_offset[o]) * inv_sample_rate;
        }
    }

    fn set_lfo_value(&mut self, lfo_amp_depth: &[f32; OPERATORS], lfo_freq_mod_depth: &[f32; OPERATORS], value: f32) {
        for o in 0..OPERATORS {
            self.lfo_amp[o] = 1.0 + lfo_amp_depth[o] * value;
            self.lfo_freq_mod[o] = 1.0 + lfo_freq_mod_depth[o] * value;
        }
        self.update_read_mod();
    }

    /// Render up to `frames` samples into `left`/`right`, stopping at the
    /// next LFO-tick slab boundary, advancing the envelope/LFO when a slab
    /// completes. Returns the number of frames actually written (always
    /// `frames` unless the caller passed more than fits — callers should
    /// loop as the engine's render dispatcher does).
    pub fn render(&mut self, params: &ParameterStore, left: &mut [f32], right: &mut [f32], frames: usize) {
        let mut offset = 0usize;
        let mut remaining = frames;
        let mod_to_carriers = params.mod_to_carriers_matrix();

        while remaining > 0 {
            let to_render = (FRAMES_PER_LFO as usize - self.count as usize).min(remaining);
            self.process_frames(&mod_to_carriers, &mut left[offset..offset + to_render], &mut right[offset..offset + to_render]);

            offset += to_render;
            remaining -= to_render;
            self.count += to_render as u32;

            if self.count == FRAMES_PER_LFO {
                let lfo_value = self.lfo.tick();
                self.count = 0;
                self.set_lfo_value(
                    params.row(ParamId::LfoAmpDepth),
                    params.row(ParamId::LfoFreqModDepth),
                    lfo_value,
                );
                self.update_target_envelope();
            }
        }
    }

    /// The inner FM-matrix loop (§4.4): constant-within-slab terms
    /// (`read_mod`, `pan_amp`, `step_rate`, `lfo_freq_mod`,
    /// `target_env_step`) are read once per sample but not recomputed;
    /// `env`/`phases` evolve per sample.
    fn process_frames(&mut self, mod_to_carriers: &[[f32; OPERATORS]; OPERATORS], left: &mut [f32], right: &mut [f32]) {
        let mut cached = [0.0f32; OPERATORS];
        let mut cached_modulator = [0.0f32; OPERATORS];
        let mut steps = [0.0f32; OPERATORS];

        for f in 0..left.len() {
            for o in 0..OPERATORS {
                steps[o] = self.lfo_freq_mod[o] * self.step_rate[o];
            }

            for o in 0..OPERATORS {
                let value = self.env[o] * self.read_mod[o] * sin_approx(self.phases[o]);
                cached[o] = value;
                cached_modulator[o] = value * self.step_rate[o];
                self.env[o] += self.target_env_step[o];
            }

            for o in 0..OPERATORS {
                let scalar = cached_modulator[o];
                let row = &mod_to_carriers[o];
                for j in 0..OPERATORS {
                    steps[j] += scalar * row[j];
                }
            }

            for o in 0..OPERATORS {
                self.phases[o] = wrap_phase(self.phases[o] + steps[o]);
            }

            for o in 0..OPERATORS {
                left[f] += cached[o] * self.pan_amp[0][o];
                right[f] += cached[o] * self.pan_amp[1][o];
            }
        }
    }

    /// `true` while this voice still has an audible operator; transitions
    /// `self.state` to `Inactive` and returns `false` otherwise.
    pub fn update_active(&mut self) -> bool {
        if self.enable_mask & !self.dead_mask != 0 {
            true
        } else {
            self.state = VoiceState::Inactive;
            false
        }
    }
}

impl Default for Voice {
    fn default() -> Self {
        Self::new()
    }
}

pub fn note_to_frequency(note: u8) -> f32 {
    440.0 * 2f32.powf((note as f32 - 69.0) / 12.0)
}

pub fn pitch_bend_to_ratio(bend: u16) -> f32 {
    2f32.powf((bend as f32 - 8192.0) / (8192.0 * 6.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParameterStore;
    use approx::assert_relative_eq;

    fn triggered_voice(sample_rate: f32) -> Voice {
        let params = ParameterStore::default();
        let mut voice = Voice::new();
        voice.trigger(&params, 69, 127, 1.0, 0.0, 1.0 / sample_rate, params.lfo_freq());
        voice
    }

    #[test]
    fn trigger_sets_running_state_and_unit_phase() {
        let voice = triggered_voice(44100.0);
        assert_eq!(voice.state, VoiceState::Running);
        for p in voice.phases {
            assert_relative_eq!(p, 0.25, epsilon = 1e-6);
        }
    }

    #[test]
    fn pitch_bend_center_is_identity() {
        assert_relative_eq!(pitch_bend_to_ratio(8192), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn note_69_is_440hz() {
        assert_relative_eq!(note_to_frequency(69), 440.0, epsilon = 1e-3);
    }

    #[test]
    fn render_stays_within_unit_phase_and_produces_nonzero_signal() {
        let mut voice = triggered_voice(44100.0);
        let params = ParameterStore::default();
        let frames = 4096;
        let mut left = vec![0.0f32; frames];
        let mut right = vec![0.0f32; frames];
        voice.render(&params, &mut left, &mut right, frames);

        for &p in voice.phases.iter() {
            assert!((0.0..1.0).contains(&p));
        }
        assert!(left.iter().any(|&s| s.abs() > 1e-6));
    }

    #[test]
    fn released_voice_eventually_goes_inactive() {
        let mut voice = triggered_voice(44100.0);
        let params = ParameterStore::default();
        voice.release();

        let mut left = vec![0.0f32; 64];
        let mut right = vec![0.0f32; 64];
        let mut became_inactive = false;
        for _ in 0..(44100 * 2 / 64) {
            voice.render(&params, &mut left, &mut right, 64);
            if !voice.update_active() {
                became_inactive = true;
                break;
            }
        }
        assert!(became_inactive);
    }
}
