//! Single-message MIDI decoding into control-surface calls, plus (behind
//! the `standalone` feature) a thin `midir` input handler for the demo
//! binary.
//!
//! The reference decoder this is grounded on reads three bytes
//! unconditionally for every channel message; a caller handing it a short
//! slice would read past the end. This decoder instead takes a length and
//! returns [`Status::MessageUnknown`] on truncation rather than panicking
//! or reading uninitialized data — the one deliberate deviation from the
//! reference's byte-level behavior this crate takes.

use crate::audio::engine::Engine;
use crate::error::Status;

/// Decode one complete MIDI message and apply it to `engine`. The caller is
/// responsible for framing (this never looks past `data`'s end, and never
/// interprets multiple messages from one call).
pub fn parse_midi(engine: &mut Engine, data: &[u8]) -> Status {
    let Some(&status) = data.first() else {
        return Status::MessageUnknown;
    };

    match status & 0xf0 {
        0x90 if data.len() >= 3 => {
            let (note, velocity) = (data[1], data[2]);
            if velocity != 0 {
                engine.note_on(note, velocity)
            } else {
                engine.note_off(note);
                Status::Ok
            }
        }
        0x80 if data.len() >= 3 => {
            engine.note_off(data[1]);
            Status::Ok
        }
        0xb0 if data.len() >= 3 => match data[1] {
            64 => {
                engine.set_sustain(data[2] >= 64);
                Status::Ok
            }
            1 => {
                engine.set_mod_wheel(data[2]);
                Status::Ok
            }
            120 | 123 => {
                engine.release_all();
                Status::Ok
            }
            _ => Status::MessageUnknown,
        },
        0xe0 if data.len() >= 3 => {
            let bend = data[1] as u16 | ((data[2] as u16) << 7);
            engine.set_pitch_bend(bend);
            Status::Ok
        }
        _ => match status {
            0xff | 0xfc => {
                engine.release_all();
                Status::Ok
            }
            0xf8 => Status::Ok,
            _ => Status::MessageUnknown,
        },
    }
}

#[cfg(feature = "standalone")]
mod input {
    use super::parse_midi;
    use crate::audio::engine::Engine;
    use crossbeam_channel::{unbounded, Receiver, Sender};
    use midir::{MidiInput, MidiInputConnection};
    use std::error::Error;

    /// Owns a live MIDI input port and forwards raw message bytes to
    /// whichever thread drains [`MidiPort::receiver`]. Decoding happens on
    /// the receiving side (typically the audio callback thread) via
    /// [`parse_midi`], so this type never touches the engine itself.
    pub struct MidiPort {
        _connection: Option<MidiInputConnection<()>>,
        receiver: Receiver<Vec<u8>>,
    }

    impl MidiPort {
        /// Connects to the first available input port, if any.
        pub fn open(client_name: &str) -> Result<Self, Box<dyn Error>> {
            let (tx, rx): (Sender<Vec<u8>>, Receiver<Vec<u8>>) = unbounded();
            let midi_in = MidiInput::new(client_name)?;
            let ports = midi_in.ports();

            let connection = if let Some(port) = ports.first() {
                let name = midi_in.port_name(port)?;
                println!("fm8: connecting to MIDI input '{name}'");
                Some(midi_in.connect(
                    port,
                    "fm8-input",
                    move |_timestamp, message, _| {
                        let _ = tx.send(message.to_vec());
                    },
                    (),
                )?)
            } else {
                println!("fm8: no MIDI input ports available");
                None
            };

            Ok(Self {
                _connection: connection,
                receiver: rx,
            })
        }

        pub fn receiver(&self) -> &Receiver<Vec<u8>> {
            &self.receiver
        }

        /// Drain every pending message and apply it to `engine` directly.
        /// Convenient for a single-threaded demo; a real-time audio
        /// callback would instead drain `receiver()` itself.
        pub fn apply_pending(&self, engine: &mut Engine) {
            for message in self.receiver.try_iter() {
                parse_midi(engine, &message);
            }
        }
    }

    pub fn list_input_ports() -> Result<Vec<String>, Box<dyn Error>> {
        let midi_in = MidiInput::new("fm8 port listing")?;
        midi_in
            .ports()
            .iter()
            .map(|p| midi_in.port_name(p).map_err(Into::into))
            .collect()
    }
}

#[cfg(feature = "standalone")]
pub use input::{list_input_ports, MidiPort};
