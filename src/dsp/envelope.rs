//! Piecewise-linear 3-segment attack/decay envelope with exponential
//! release, evaluated once per LFO tick (every `FRAMES_PER_LFO` samples)
//! rather than per sample.
//!
//! This is deliberately a free-function toolkit instead of a stateful
//! `Envelope` type: each call operates on one operator's scalars, the same
//! shape as the reference implementation's per-operator loop, and `Voice`
//! owns the actual per-operator arrays (struct-of-arrays, to keep the inner
//! loop vectorizable one lane per operator).

/// The four breakpoints of one operator's envelope: `time[0] == 0` and
/// `target[0] == 0` always; `time[3]`/`target[3]` is the sustain plateau.
#[derive(Debug, Clone, Copy, Default)]
pub struct Segments {
    pub target: [f32; 4],
    pub time: [f32; 4],
    pub lerp: [f32; 3],
}

/// Build the segment breakpoints from the three envelope targets and
/// delays stored in the parameter store. A zero-duration segment (delay ==
/// 0, so `time[j+1] == time[j]`) yields `lerp = 0.0`: since the active
/// segment is chosen by the descending comparison in
/// [`target_running`], a later zero-length segment's breakpoint still wins,
/// matching the envelope segment search tie-break called out in the design
/// notes.
pub fn build_segments(targets: [f32; 3], delays: [f32; 3]) -> Segments {
    let mut target = [0.0f32; 4];
    let mut time = [0.0f32; 4];
    for j in 0..3 {
        target[j + 1] = targets[j];
        time[j + 1] = delays[j] + time[j];
    }

    let mut lerp = [0.0f32; 3];
    for j in 0..3 {
        let dt = time[j + 1] - time[j];
        lerp[j] = if dt != 0.0 {
            (target[j + 1] - target[j]) / dt
        } else {
            0.0
        };
    }

    Segments { target, time, lerp }
}

/// Per-LFO-tick decay multiplier such that a released envelope drops 60 dB
/// over `release_time` seconds.
pub fn falloff(release_time: f32, frames_per_lfo: u32, inv_sample_rate: f32) -> f32 {
    (0.001f32.ln() * frames_per_lfo as f32 * inv_sample_rate / release_time).exp()
}

/// Evaluate the running (non-released) target envelope value at `pos`
/// seconds since trigger. Segments are checked highest-index first: a
/// later breakpoint at the same `pos` must win over an earlier one.
pub fn target_running(pos: f32, segments: &Segments) -> f32 {
    let Segments { target, time, lerp } = segments;
    if pos >= time[3] {
        target[3]
    } else if pos >= time[2] {
        target[2] + (pos - time[2]) * lerp[2]
    } else if pos >= time[1] {
        target[1] + (pos - time[1]) * lerp[1]
    } else {
        target[0] + (pos - time[0]) * lerp[0]
    }
}

/// Evaluate the released target envelope value: exponential decay from the
/// previous target.
pub fn target_released(previous_target_env: f32, falloff: f32) -> f32 {
    previous_target_env * falloff
}

/// Per-sample increment that will carry `env` to `target_env` over the next
/// `FRAMES_PER_LFO` samples.
pub fn step_toward(env: f32, target_env: f32, frames_per_lfo: u32) -> f32 {
    (target_env - env) / frames_per_lfo as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_chain_from_zero() {
        let s = build_segments([1.0, 0.5, 0.25], [0.05, 0.05, 0.25]);
        assert_eq!(s.time[0], 0.0);
        assert_eq!(s.target[0], 0.0);
        assert!((s.time[1] - 0.05).abs() < 1e-6);
        assert!((s.time[2] - 0.10).abs() < 1e-6);
        assert!((s.time[3] - 0.35).abs() < 1e-6);
    }

    #[test]
    fn zero_length_segment_does_not_panic_and_later_breakpoint_wins() {
        let s = build_segments([1.0, 0.5, 0.25], [0.05, 0.0, 0.25]);
        // time[1] == time[2]; at pos == time[1] the descending search must
        // pick the time[2] breakpoint (target[2]), not time[1]'s.
        let v = target_running(s.time[1], &s);
        assert!((v - s.target[2]).abs() < 1e-6);
    }

    #[test]
    fn sustain_plateau_holds_past_time3() {
        let s = build_segments([1.0, 0.5, 0.25], [0.05, 0.05, 0.25]);
        assert_eq!(target_running(s.time[3] + 10.0, &s), s.target[3]);
    }

    #[test]
    fn falloff_is_in_open_unit_interval() {
        let f = falloff(0.5, 32, 1.0 / 44100.0);
        assert!(f > 0.0 && f < 1.0);
    }

    #[test]
    fn released_target_decays_monotonically() {
        let f = falloff(0.1, 32, 1.0 / 44100.0);
        let mut target_env = 1.0f32;
        for _ in 0..10 {
            let next = target_released(target_env, f);
            assert!(next < target_env);
            target_env = next;
        }
    }
}
