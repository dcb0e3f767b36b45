//! Standalone demo: wires `cpal` audio output and `midir` MIDI input to the
//! core engine. Owns no synthesis semantics of its own — this is the one
//! place in the repo allowed to touch an audio device or a MIDI port
//! (§1's "external collaborator" boundary).

#[cfg(feature = "standalone")]
use crossbeam_channel::bounded;
#[cfg(feature = "standalone")]
use fm8::audio::engine::Engine;
#[cfg(feature = "standalone")]
use fm8::audio::output::{AudioOutput, MidiMessage};
#[cfg(feature = "standalone")]
use fm8::midi::{list_input_ports, MidiPort};

#[cfg(feature = "standalone")]
const SAMPLE_RATE: f32 = 44100.0;
#[cfg(feature = "standalone")]
const MAX_VOICES: usize = 16;

#[cfg(feature = "standalone")]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("fm8 — 8-operator FM synthesizer");
    println!("================================\n");

    let engine = Engine::new(SAMPLE_RATE, MAX_VOICES);
    let (event_tx, event_rx) = bounded::<MidiMessage>(1024);

    println!("Starting audio output...");
    let _audio_output = match AudioOutput::new(engine, event_rx) {
        Ok(output) => {
            println!("audio output started at {} Hz", output.sample_rate());
            Some(output)
        }
        Err(e) => {
            eprintln!("failed to start audio: {e}");
            None
        }
    };

    println!("\nStarting MIDI input...");
    match list_input_ports() {
        Ok(ports) if !ports.is_empty() => {
            println!("available MIDI ports: {ports:?}");
        }
        Ok(_) => println!("no MIDI input ports available"),
        Err(e) => eprintln!("failed to enumerate MIDI ports: {e}"),
    }

    let midi_port = match MidiPort::open("fm8-demo") {
        Ok(port) => Some(port),
        Err(e) => {
            eprintln!("failed to open MIDI input: {e}");
            eprintln!("   (this is OK — MIDI input is optional, the demo still plays silence)");
            None
        }
    };

    println!("\nPress Ctrl+C to quit.");
    loop {
        if let Some(port) = &midi_port {
            for message in port.receiver().try_iter() {
                let _ = event_tx.try_send(message);
            }
        }
        std::thread::sleep(std::time::Duration::from_millis(10));
    }
}

#[cfg(not(feature = "standalone"))]
fn main() {
    eprintln!("This binary requires the 'standalone' feature.");
    eprintln!("Build with: cargo build --features standalone");
    std::process::exit(1);
}
