//! # Audio module
//!
//! The core synthesis pipeline: the voice pool (`voice`) and the engine that
//! owns it (`engine`). Unlike a plugin-host-facing design, there is no
//! producer/consumer parameter bridge here — control calls and `render` are
//! expected to run on the same thread, so the engine's methods are plain
//! synchronous calls.
//!
//! Cross-thread delivery of MIDI/GUI events, if an embedder needs it, is
//! its job to build outside this module — e.g. the demo binary's
//! `crossbeam-channel` queue from its MIDI input thread into its audio
//! callback thread (`src/bin/fm8_demo.rs`).

pub mod engine;

/// Platform audio I/O for the standalone demo binary only; not part of the
/// core engine's contract.
#[cfg(feature = "standalone")]
pub mod output;

/// Per-note synthesis state: phases, envelope, LFO, step rates, pan gains.
pub mod voice;
