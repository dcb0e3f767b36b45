//! Parameter store: per-operator and global synthesis parameters, their
//! descriptors (range + curve), and normalized get/set for host adapters.
//!
//! The store is a flat `(parameter_id, operator_index)` matrix rather than a
//! struct of named fields, because the preset codec (`crate::preset`) must
//! serialize it as exactly that matrix, row-major by parameter id.
//! `ParamId::ALL` and `#[repr(usize)]` keep the enum ordinal identical to
//! the row index a descriptor lookup or preset offset needs.

use crate::OPERATORS;

/// Identifies one of the 28 per-operator parameters. Ordinal order matches
/// the binary preset layout and must not be reordered without bumping the
/// preset format version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum ParamId {
    Amp = 0,
    Pan,
    FreqMod,
    FreqOffset,
    EnvelopeTarget0,
    EnvelopeTarget1,
    EnvelopeTarget2,
    EnvelopeDelay0,
    EnvelopeDelay1,
    EnvelopeDelay2,
    EnvelopeReleaseTime,
    KeyboardScalingMidPoint,
    KeyboardScalingLowFactor,
    KeyboardScalingHighFactor,
    VelocitySensitivity,
    ModWheelSensitivity,
    LfoAmpDepth,
    LfoFreqModDepth,
    Enable,
    Carriers,
    ModToCarriers0,
    ModToCarriers1,
    ModToCarriers2,
    ModToCarriers3,
    ModToCarriers4,
    ModToCarriers5,
    ModToCarriers6,
    ModToCarriers7,
}

/// Number of distinct per-operator parameter rows.
pub const PARAM_END: usize = 28;

impl ParamId {
    pub const ALL: [ParamId; PARAM_END] = [
        ParamId::Amp,
        ParamId::Pan,
        ParamId::FreqMod,
        ParamId::FreqOffset,
        ParamId::EnvelopeTarget0,
        ParamId::EnvelopeTarget1,
        ParamId::EnvelopeTarget2,
        ParamId::EnvelopeDelay0,
        ParamId::EnvelopeDelay1,
        ParamId::EnvelopeDelay2,
        ParamId::EnvelopeReleaseTime,
        ParamId::KeyboardScalingMidPoint,
        ParamId::KeyboardScalingLowFactor,
        ParamId::KeyboardScalingHighFactor,
        ParamId::VelocitySensitivity,
        ParamId::ModWheelSensitivity,
        ParamId::LfoAmpDepth,
        ParamId::LfoFreqModDepth,
        ParamId::Enable,
        ParamId::Carriers,
        ParamId::ModToCarriers0,
        ParamId::ModToCarriers1,
        ParamId::ModToCarriers2,
        ParamId::ModToCarriers3,
        ParamId::ModToCarriers4,
        ParamId::ModToCarriers5,
        ParamId::ModToCarriers6,
        ParamId::ModToCarriers7,
    ];

    /// Recover a `ParamId` from a row index, if it's in range.
    pub fn from_index(index: usize) -> Option<ParamId> {
        ParamId::ALL.get(index).copied()
    }

    /// `{min, max, default, logarithmic}` descriptor for this row.
    ///
    /// Values are reproduced from the reference implementation's
    /// `parameter_data[]` table; they are load-bearing for preset
    /// compatibility and for the normalization formula in
    /// [`ParameterDescriptor`].
    pub fn descriptor(self) -> ParameterDescriptor {
        use ParamId::*;
        match self {
            Amp => ParameterDescriptor::new(0.005, 16.0, 1.0, true),
            Pan => ParameterDescriptor::new(-1.0, 1.0, 0.0, false),
            FreqMod => ParameterDescriptor::new(0.0, 16.0, 1.0, false),
            FreqOffset => ParameterDescriptor::new(-128.0, 128.0, 0.0, false),
            EnvelopeTarget0 => ParameterDescriptor::new(0.0, 1.0, 1.0, false),
            EnvelopeTarget1 => ParameterDescriptor::new(0.0, 1.0, 0.5, false),
            EnvelopeTarget2 => ParameterDescriptor::new(0.0, 1.0, 0.25, false),
            EnvelopeDelay0 => ParameterDescriptor::new(0.005, 8.0, 0.05, true),
            EnvelopeDelay1 => ParameterDescriptor::new(0.005, 8.0, 0.05, true),
            EnvelopeDelay2 => ParameterDescriptor::new(0.005, 8.0, 0.25, true),
            EnvelopeReleaseTime => ParameterDescriptor::new(0.005, 8.0, 0.5, true),
            KeyboardScalingMidPoint => ParameterDescriptor::new(50.0, 5000.0, 440.0, true),
            KeyboardScalingLowFactor => ParameterDescriptor::new(-2.0, 2.0, 0.0, false),
            KeyboardScalingHighFactor => ParameterDescriptor::new(-2.0, 2.0, 0.0, false),
            VelocitySensitivity => ParameterDescriptor::new(0.0, 1.0, 1.0, false),
            ModWheelSensitivity => ParameterDescriptor::new(0.0, 1.0, 0.0, false),
            LfoAmpDepth => ParameterDescriptor::new(0.0, 1.0, 0.0, false),
            LfoFreqModDepth => ParameterDescriptor::new(0.0, 0.025, 0.0, false),
            Enable => ParameterDescriptor::new(0.0, 1.0, 1.0, false),
            Carriers => ParameterDescriptor::new(0.0, 1.0, 1.0, false),
            ModToCarriers0 | ModToCarriers1 | ModToCarriers2 | ModToCarriers3
            | ModToCarriers4 | ModToCarriers5 | ModToCarriers6 | ModToCarriers7 => {
                ParameterDescriptor::new(0.0, 1.0, 0.0, false)
            }
        }
    }
}

/// The two global parameters: master volume and the shared per-voice LFO rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum GlobalParamId {
    Volume = 0,
    LfoFreq,
}

pub const GLOBAL_PARAM_END: usize = 2;

impl GlobalParamId {
    pub const ALL: [GlobalParamId; GLOBAL_PARAM_END] =
        [GlobalParamId::Volume, GlobalParamId::LfoFreq];

    pub fn from_index(index: usize) -> Option<GlobalParamId> {
        GlobalParamId::ALL.get(index).copied()
    }

    pub fn descriptor(self) -> ParameterDescriptor {
        match self {
            GlobalParamId::Volume => ParameterDescriptor::new(0.0, 1.0, 0.2, false),
            GlobalParamId::LfoFreq => ParameterDescriptor::new(0.1, 64.0, 0.1, true),
        }
    }
}

/// Range and curve metadata for one parameter row. Descriptors drive
/// normalization only — they never clamp a raw `set_parameter` write.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterDescriptor {
    pub min: f32,
    pub max: f32,
    pub default: f32,
    pub logarithmic: bool,
}

impl ParameterDescriptor {
    const fn new(min: f32, max: f32, default: f32, logarithmic: bool) -> Self {
        Self {
            min,
            max,
            default,
            logarithmic,
        }
    }

    /// Map a raw parameter value to `[0, 1]` using this descriptor's curve.
    /// Assumes `v > 0` when `logarithmic`.
    pub fn to_normalized(&self, v: f32) -> f32 {
        if self.logarithmic {
            (v.log2() - self.min.log2()) / (self.max.log2() - self.min.log2())
        } else {
            (v - self.min) / (self.max - self.min)
        }
    }

    /// Inverse of [`ParameterDescriptor::to_normalized`].
    pub fn from_normalized(&self, n: f32) -> f32 {
        if self.logarithmic {
            2f32.powf(self.min.log2() + n * (self.max.log2() - self.min.log2()))
        } else {
            self.min + n * (self.max - self.min)
        }
    }
}

/// Holds every per-operator parameter as a flat `PARAM_END x OPERATORS`
/// row-major matrix, plus the two global parameters.
///
/// The flat layout (rather than named `[f32; OPERATORS]` fields per
/// parameter) is deliberate: the preset codec serializes this store as
/// exactly that matrix (§6), and `set_parameter`/`get_parameter` already
/// want row/column addressing, so there is no separate "logical" struct to
/// keep in sync with a "wire" struct.
#[derive(Debug, Clone)]
pub struct ParameterStore {
    rows: [[f32; OPERATORS]; PARAM_END],
    volume: f32,
    lfo_freq: f32,
}

impl Default for ParameterStore {
    fn default() -> Self {
        let mut rows = [[0.0f32; OPERATORS]; PARAM_END];
        for id in ParamId::ALL {
            let default = id.descriptor().default;
            rows[id as usize] = [default; OPERATORS];
        }
        // Carriers default is special-cased: only operator 0 carries by
        // default. `ParamId::Carriers`'s descriptor default of 1.0 describes
        // a single slot's value, not "every operator defaults to 1.0" — the
        // reference library sets the remaining seven to zero explicitly.
        let mut carriers = [0.0f32; OPERATORS];
        carriers[0] = 1.0;
        rows[ParamId::Carriers as usize] = carriers;

        Self {
            rows,
            volume: GlobalParamId::Volume.descriptor().default,
            lfo_freq: GlobalParamId::LfoFreq.descriptor().default,
        }
    }
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Out-of-range ids are silently ignored, per the control surface contract.
    pub fn set_parameter(&mut self, id: ParamId, operator: usize, value: f32) {
        if operator < OPERATORS {
            self.rows[id as usize][operator] = value;
        }
    }

    pub fn get_parameter(&self, id: ParamId, operator: usize) -> f32 {
        if operator < OPERATORS {
            self.rows[id as usize][operator]
        } else {
            0.0
        }
    }

    pub fn set_global_parameter(&mut self, id: GlobalParamId, value: f32) {
        match id {
            GlobalParamId::Volume => self.volume = value,
            GlobalParamId::LfoFreq => self.lfo_freq = value,
        }
    }

    pub fn get_global_parameter(&self, id: GlobalParamId) -> f32 {
        match id {
            GlobalParamId::Volume => self.volume,
            GlobalParamId::LfoFreq => self.lfo_freq,
        }
    }

    /// Row for one parameter across all 8 operators, e.g. `row(ParamId::Amp)`.
    pub fn row(&self, id: ParamId) -> &[f32; OPERATORS] {
        &self.rows[id as usize]
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn lfo_freq(&self) -> f32 {
        self.lfo_freq
    }

    /// The FM routing matrix as `[source_operator][destination_operator]`.
    /// Backed by the eight `ModToCarriersN` rows, one per source operator.
    pub fn mod_to_carriers_matrix(&self) -> [[f32; OPERATORS]; OPERATORS] {
        [
            *self.row(ParamId::ModToCarriers0),
            *self.row(ParamId::ModToCarriers1),
            *self.row(ParamId::ModToCarriers2),
            *self.row(ParamId::ModToCarriers3),
            *self.row(ParamId::ModToCarriers4),
            *self.row(ParamId::ModToCarriers5),
            *self.row(ParamId::ModToCarriers6),
            *self.row(ParamId::ModToCarriers7),
        ]
    }

    /// Iterate every row in preset order, for the binary codec.
    pub(crate) fn rows_in_order(&self) -> impl Iterator<Item = &[f32; OPERATORS]> {
        self.rows.iter()
    }

    pub(crate) fn rows_in_order_mut(&mut self) -> impl Iterator<Item = &mut [f32; OPERATORS]> {
        self.rows.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_table() {
        let store = ParameterStore::default();
        assert_eq!(store.get_parameter(ParamId::Amp, 0), 1.0);
        assert_eq!(store.get_parameter(ParamId::Pan, 3), 0.0);
        assert_eq!(store.get_parameter(ParamId::Carriers, 0), 1.0);
        assert_eq!(store.get_parameter(ParamId::Carriers, 1), 0.0);
        assert_eq!(store.get_parameter(ParamId::EnvelopeTarget0, 2), 1.0);
        assert_eq!(store.get_parameter(ParamId::EnvelopeTarget1, 2), 0.5);
        assert_eq!(store.get_parameter(ParamId::EnvelopeTarget2, 2), 0.25);
        assert_eq!(store.get_parameter(ParamId::EnvelopeReleaseTime, 0), 0.5);
        assert_eq!(store.get_parameter(ParamId::KeyboardScalingMidPoint, 0), 440.0);
        assert_eq!(store.get_global_parameter(GlobalParamId::Volume), 0.2);
        assert_eq!(store.get_global_parameter(GlobalParamId::LfoFreq), 0.1);
    }

    #[test]
    fn out_of_range_operator_is_ignored_not_panicking() {
        let mut store = ParameterStore::default();
        store.set_parameter(ParamId::Amp, 99, 4.0);
        assert_eq!(store.get_parameter(ParamId::Amp, 99), 0.0);
    }

    #[test]
    fn normalization_round_trips_within_epsilon() {
        let d = ParamId::EnvelopeReleaseTime.descriptor();
        for raw in [0.01, 0.5, 1.0, 4.0, 7.9] {
            let n = d.to_normalized(raw);
            let back = d.from_normalized(n);
            assert!((back - raw).abs() < 1e-3, "{back} vs {raw}");
        }

        let d = ParamId::Pan.descriptor();
        for raw in [-1.0, -0.25, 0.0, 0.6, 1.0] {
            let n = d.to_normalized(raw);
            let back = d.from_normalized(n);
            assert!((back - raw).abs() < 1e-5, "{back} vs {raw}");
        }
    }

    #[test]
    fn param_id_ordinal_matches_preset_row_order() {
        assert_eq!(ParamId::Amp as usize, 0);
        assert_eq!(ParamId::ModToCarriers0 as usize, 20);
        assert_eq!(ParamId::ModToCarriers7 as usize, 27);
        assert_eq!(PARAM_END, 28);
    }
}
