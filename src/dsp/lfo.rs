//! Per-voice LFO: a single oscillator, ticked once every `FRAMES_PER_LFO`
//! samples rather than once per sample. Its output scales amplitude and
//! frequency depth for every operator of the voice that owns it.
//!
//! This is a much smaller shape than a general-purpose multi-waveform LFO:
//! the reference always uses the sine oscillator primitive at a decimated
//! rate, so there is no waveform selection, no retriggering mode, and no
//! independent sample-rate conversion to worry about.

use crate::dsp::oscillator::{sin_approx, wrap_phase};

/// Decimated sine LFO. `phase` and `step` follow the voice's sample clock
/// directly: `step` is pre-scaled by `FRAMES_PER_LFO` so that one `tick()`
/// call corresponds to one slab boundary in the render dispatcher.
#[derive(Debug, Clone, Copy)]
pub struct Lfo {
    pub phase: f32,
    pub step: f32,
}

impl Lfo {
    /// A freshly triggered LFO starts at the oscillator's peak, matching the
    /// per-voice phase convention used for audio-rate oscillators.
    pub fn triggered(step: f32) -> Self {
        Self { phase: 0.25, step }
    }

    /// Advance one decimated tick and return the new sample value.
    pub fn tick(&mut self) -> f32 {
        let value = sin_approx(self.phase);
        self.phase = wrap_phase(self.phase + self.step);
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_stays_in_unit_range_after_many_ticks() {
        let mut lfo = Lfo::triggered(0.037);
        for _ in 0..10_000 {
            lfo.tick();
            assert!(lfo.phase >= 0.0 && lfo.phase < 1.0);
        }
    }

    #[test]
    fn first_tick_returns_peak_value() {
        let mut lfo = Lfo::triggered(0.1);
        assert!((lfo.tick() - 1.0).abs() < 1e-5);
    }
}
