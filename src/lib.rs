//! An 8-operator FM synthesis engine: parameter store, voice pool,
//! envelope/LFO/oscillator primitives, MIDI decoding and a binary preset
//! format.
//!
//! `audio::engine::Engine` is the entry point; everything else supports it.
//!
//! The inner loop (`audio::voice::Voice::process_frames`) is written as a
//! plain scalar loop over `OPERATORS` lanes. SIMD is a local optimization
//! left to a later backend — see the numerical contract in
//! `dsp::oscillator::sin_approx`'s docs — not something this crate commits
//! to at the type level.

/// Number of FM operators per voice. Load-bearing: the parameter matrix,
/// the cross-modulation matrix, and the preset layout are all sized from
/// this constant.
pub const OPERATORS: usize = 8;

/// Envelope and LFO state advance once every this many rendered frames.
pub const FRAMES_PER_LFO: u32 = 32;

/// Byte length of each NUL-terminated metadata string in a preset (name,
/// author), including the terminator.
pub const PRESET_STRING_SIZE: usize = 64;

/// Magic bytes at the start of every preset buffer.
pub const PRESET_MAGIC: &[u8; 8] = b"FMSYNTH1";

/// Current preset format version.
pub const PRESET_VERSION: u32 = 2;

pub mod audio;
pub mod dsp;
pub mod error;
pub mod midi;
pub mod params;
pub mod preset;
