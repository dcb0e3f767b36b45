use std::error::Error;
use std::fmt;

/// Status codes returned by the control surface and preset codec.
///
/// Mirrors a C-style status-code contract rather than a layered Rust error
/// hierarchy: the engine has exactly six outcomes and none of them carry
/// payload beyond what the caller already knows (the note, the buffer, the
/// parameter id), so a flat enum is all this needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The call completed normally.
    Ok,
    /// `note_on` found no inactive voice to allocate.
    Busy,
    /// A caller-supplied buffer is smaller than required.
    BufferTooSmall,
    /// A metadata string is missing its terminating NUL at the expected index.
    NoNulTerminate,
    /// A preset buffer's magic or size did not match what was expected.
    InvalidFormat,
    /// A MIDI byte sequence did not match any recognized message.
    MessageUnknown,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Status::Ok => "ok",
            Status::Busy => "voice pool exhausted",
            Status::BufferTooSmall => "buffer too small",
            Status::NoNulTerminate => "metadata string is not NUL-terminated",
            Status::InvalidFormat => "preset buffer has invalid format",
            Status::MessageUnknown => "unrecognized MIDI message",
        };
        f.write_str(msg)
    }
}

impl Error for Status {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_text_is_non_empty_for_every_variant() {
        let variants = [
            Status::Ok,
            Status::Busy,
            Status::BufferTooSmall,
            Status::NoNulTerminate,
            Status::InvalidFormat,
            Status::MessageUnknown,
        ];
        for v in variants {
            assert!(!v.to_string().is_empty());
        }
    }
}
