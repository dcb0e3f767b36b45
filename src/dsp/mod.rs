//! Digital-signal primitives shared by the voice inner loop: the polynomial
//! sine oscillator, the decimated per-voice LFO, and the piecewise-linear
//! envelope math.

pub mod envelope;
pub mod lfo;
pub mod oscillator;

pub use lfo::Lfo;
pub use oscillator::{sin_approx, wrap_phase};
