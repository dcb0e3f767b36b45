//! The only oscillator primitive the inner loop needs: a polynomial
//! approximation of `sin(2*pi*phase)` cheap enough to call once per operator
//! per sample, eight times over, without a trig table or libm call.

use std::f32::consts::PI;

const INV_FACTORIAL_3_2PIPOW3: f32 = (1.0 / 6.0) * (2.0 * PI) * (2.0 * PI) * (2.0 * PI);
const INV_FACTORIAL_5_2PIPOW5: f32 =
    (1.0 / 120.0) * (2.0 * PI) * (2.0 * PI) * (2.0 * PI) * (2.0 * PI) * (2.0 * PI);
const INV_FACTORIAL_7_2PIPOW7: f32 = (1.0 / 5040.0)
    * (2.0 * PI)
    * (2.0 * PI)
    * (2.0 * PI)
    * (2.0 * PI)
    * (2.0 * PI)
    * (2.0 * PI)
    * (2.0 * PI);

/// Approximates `sin(2*pi*phase)` for `phase` in `[0, 1)` via a 7th-order odd
/// Taylor expansion applied to a folded argument. `phases[o] == 0.25` is the
/// oscillator's peak, which is why voices trigger with `phases[o] = 0.25`
/// for a click-free onset instead of `0.0`.
///
/// Gives >= 80 dB SNR against a true sine, the numerical contract any
/// replacement implementation of the inner loop (e.g. a SIMD lane-wise
/// version) must preserve.
#[inline]
pub fn sin_approx(phase: f32) -> f32 {
    let mut x = if phase < 0.5 { phase - 0.25 } else { 0.75 - phase };

    let x2 = x * x;
    let x3 = x2 * x;
    x *= 2.0 * PI;
    x -= x3 * INV_FACTORIAL_3_2PIPOW3;

    let x5 = x3 * x2;
    x += x5 * INV_FACTORIAL_5_2PIPOW5;

    let x7 = x5 * x2;
    x -= x7 * INV_FACTORIAL_7_2PIPOW7;

    x
}

/// Wraps `phase` into `[0, 1)`. Handles negative increments, which arise
/// from negative `freq_offset` parameters or deep negative FM.
#[inline]
pub fn wrap_phase(phase: f32) -> f32 {
    phase - phase.floor()
}
