//! Binary preset codec: a fixed-size, big-endian, lossy-float encoding of
//! an engine's full parameter store plus two metadata strings.
//!
//! Layout (see [`preset_size`]):
//!
//! ```text
//! offset  size                        content
//!   0     8                           magic "FMSYNTH1"
//!   8     PRESET_STRING_SIZE          name   (UTF-8, NUL-terminated)
//!  72     PRESET_STRING_SIZE          author (UTF-8, NUL-terminated)
//! 136     4 * GLOBAL_PARAM_END        packed globals: volume, lfo_freq
//! 144     4 * PARAM_END * OPERATORS   packed params, row-major
//! ```

use crate::audio::engine::Engine;
use crate::error::Status;
use crate::params::{GlobalParamId, ParamId, GLOBAL_PARAM_END, PARAM_END};
use crate::{OPERATORS, PRESET_MAGIC, PRESET_STRING_SIZE};

const METADATA_OFFSET: usize = 8;
const GLOBALS_OFFSET: usize = METADATA_OFFSET + 2 * PRESET_STRING_SIZE;
const PARAMS_OFFSET: usize = GLOBALS_OFFSET + 4 * GLOBAL_PARAM_END;

/// Total size in bytes of one preset buffer. A pure function of the
/// format constants, as required for callers to size their buffers ahead
/// of [`save`].
pub const fn preset_size() -> usize {
    PARAMS_OFFSET + 4 * PARAM_END * OPERATORS
}

/// Packs `v` into a portable 32-bit word: lossy in the mantissa, exact in
/// exponent range. `0.0` packs to `0x0000_0000` regardless of sign.
fn pack_float(v: f32) -> u32 {
    if v == 0.0 {
        return 0;
    }
    let (mantissa, exp) = frexp(v);
    let q = (mantissa * 32768.0).round().clamp(-32768.0, 32767.0) as i32 as i16;
    ((exp as i16 as u16 as u32) << 16) | (q as u16 as u32)
}

fn unpack_float(word: u32) -> f32 {
    if word == 0 {
        return 0.0;
    }
    let exp = (word >> 16) as u16 as i16;
    let q = (word & 0xffff) as u16 as i16;
    ldexp(q as f32 / 32768.0, exp as i32)
}

/// `frexp`-equivalent: splits `v` into `(mantissa, exp)` with
/// `mantissa in [0.5, 1.0)` (or `(-1.0, -0.5]` for negative `v`) such that
/// `v == mantissa * 2^exp`. `libm`/`frexpf` is the usual source for this in
/// C; the standard library doesn't expose it, so this reconstructs it from
/// the IEEE-754 bit pattern.
fn frexp(v: f32) -> (f32, i32) {
    let bits = v.to_bits();
    let sign = bits & 0x8000_0000;
    let raw_exp = ((bits >> 23) & 0xff) as i32;
    let mantissa_bits = bits & 0x007f_ffff;

    if raw_exp == 0 {
        // Subnormal: normalize by hand.
        let normalized = v * 2f32.powi(32);
        let (m, e) = frexp(normalized);
        return (m, e - 32);
    }

    let exp = raw_exp - 126;
    let out_bits = sign | (126 << 23) | mantissa_bits;
    (f32::from_bits(out_bits), exp)
}

fn ldexp(v: f32, exp: i32) -> f32 {
    v * 2f32.powi(exp)
}

fn write_metadata(buf: &mut [u8], offset: usize, text: &str) -> Status {
    let bytes = text.as_bytes();
    if bytes.len() >= PRESET_STRING_SIZE {
        return Status::NoNulTerminate;
    }
    let region = &mut buf[offset..offset + PRESET_STRING_SIZE];
    region.fill(0);
    region[..bytes.len()].copy_from_slice(bytes);
    Status::Ok
}

fn read_metadata(buf: &[u8], offset: usize) -> Result<String, Status> {
    let region = &buf[offset..offset + PRESET_STRING_SIZE];
    if region[PRESET_STRING_SIZE - 1] != 0 {
        return Err(Status::NoNulTerminate);
    }
    let end = region.iter().position(|&b| b == 0).unwrap_or(PRESET_STRING_SIZE);
    Ok(String::from_utf8_lossy(&region[..end]).into_owned())
}

/// Serializes `engine`'s current parameter store and the given metadata
/// strings into `buf`. Per the reference's open question on metadata
/// handling, the terminator is validated on load regardless of whether the
/// caller asked for the strings back; here on save the strings are always
/// required to be representable (shorter than `PRESET_STRING_SIZE`).
pub fn save(engine: &Engine, name: &str, author: &str, buf: &mut [u8]) -> Status {
    if buf.len() < preset_size() {
        return Status::BufferTooSmall;
    }

    buf[..8].copy_from_slice(PRESET_MAGIC);

    let status = write_metadata(buf, METADATA_OFFSET, name);
    if status != Status::Ok {
        return status;
    }
    let status = write_metadata(buf, METADATA_OFFSET + PRESET_STRING_SIZE, author);
    if status != Status::Ok {
        return status;
    }

    let params = engine.params();
    let globals = [
        params.get_global_parameter(GlobalParamId::Volume),
        params.get_global_parameter(GlobalParamId::LfoFreq),
    ];
    for (i, &value) in globals.iter().enumerate() {
        let offset = GLOBALS_OFFSET + 4 * i;
        buf[offset..offset + 4].copy_from_slice(&pack_float(value).to_be_bytes());
    }

    for (row_index, row) in params.rows_in_order().enumerate() {
        for (col, &value) in row.iter().enumerate() {
            let offset = PARAMS_OFFSET + 4 * (row_index * OPERATORS + col);
            buf[offset..offset + 4].copy_from_slice(&pack_float(value).to_be_bytes());
        }
    }

    Status::Ok
}

/// Metadata recovered from [`load`], when requested.
pub struct PresetMetadata {
    pub name: String,
    pub author: String,
}

/// Deserializes `buf` into `engine`'s parameter store, overwriting it only
/// on full success (any error leaves `engine` untouched). `want_metadata`
/// controls whether the name/author strings are copied out; the NUL
/// terminator is validated either way.
pub fn load(engine: &mut Engine, buf: &[u8], want_metadata: bool) -> Result<Option<PresetMetadata>, Status> {
    if buf.len() < preset_size() {
        return Err(Status::BufferTooSmall);
    }
    if &buf[..8] != PRESET_MAGIC {
        return Err(Status::InvalidFormat);
    }

    let name = read_metadata(buf, METADATA_OFFSET)?;
    let author = read_metadata(buf, METADATA_OFFSET + PRESET_STRING_SIZE)?;

    let mut globals = [0.0f32; GLOBAL_PARAM_END];
    for (i, slot) in globals.iter_mut().enumerate() {
        let offset = GLOBALS_OFFSET + 4 * i;
        let word = u32::from_be_bytes(buf[offset..offset + 4].try_into().unwrap());
        *slot = unpack_float(word);
    }

    let mut rows = [[0.0f32; OPERATORS]; PARAM_END];
    for (row_index, row) in rows.iter_mut().enumerate() {
        for (col, slot) in row.iter_mut().enumerate() {
            let offset = PARAMS_OFFSET + 4 * (row_index * OPERATORS + col);
            let word = u32::from_be_bytes(buf[offset..offset + 4].try_into().unwrap());
            *slot = unpack_float(word);
        }
    }

    let params = engine.params_mut();
    params.set_global_parameter(GlobalParamId::Volume, globals[0]);
    params.set_global_parameter(GlobalParamId::LfoFreq, globals[1]);
    for (dst, src) in params.rows_in_order_mut().zip(rows.iter()) {
        *dst = *src;
    }

    if want_metadata {
        Ok(Some(PresetMetadata { name, author }))
    } else {
        Ok(None)
    }
}
