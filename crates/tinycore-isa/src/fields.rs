//! Bit offsets and masks for the 16-bit instruction word.
//!
//! ```text
//! 15..12  11   10..8   7..6   5..0
//! OPCODE   D    OPB     OPA   IMMED
//! ```

/// Offset of the 4-bit OPCODE field.
pub const OPCODE_OFS: u32 = 12;
/// Mask (post-shift) for the OPCODE field.
pub const OPCODE_MASK: u16 = 0b1111;

/// Offset of the single-bit D (direction/polarity) field.
pub const D_OFS: u32 = 11;
/// Mask (post-shift) for the D field.
pub const D_MASK: u16 = 0b1;

/// Offset of the 3-bit OPB (operand B form) field.
pub const OPB_OFS: u32 = 8;
/// Mask (post-shift) for the OPB field.
pub const OPB_MASK: u16 = 0b111;

/// Offset of the 2-bit OPA (operand A register) field.
pub const OPA_OFS: u32 = 6;
/// Mask (post-shift) for the OPA field.
pub const OPA_MASK: u16 = 0b11;

/// Offset of the 6-bit IMMED field.
pub const IMMED_OFS: u32 = 0;
/// Mask (post-shift) for the IMMED field.
pub const IMMED_MASK: u16 = 0b11_1111;

/// Lowest value representable in the signed 6-bit IMMED field.
pub const IMMED_MIN: i32 = -32;
/// Highest value representable in the signed 6-bit IMMED field.
pub const IMMED_MAX: i32 = 31;

/// Sign-extend a 6-bit field (already shifted down to bits 5..0) to `i16`.
#[must_use]
pub const fn sign_extend_immed(raw: u16) -> i16 {
    let bits = raw & IMMED_MASK;
    if bits & 0b10_0000 != 0 {
        (bits | !IMMED_MASK) as i16
    } else {
        bits as i16
    }
}

/// Truncate a signed value already known to be in range into the 6-bit field.
#[must_use]
pub const fn truncate_immed(value: i16) -> u16 {
    (value as u16) & IMMED_MASK
}
