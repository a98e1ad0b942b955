//! Transient ALU condition flags.
//!
//! Unlike a real status register these are never stored on the CPU between
//! instructions — spec's data model is explicit that "no separate flags
//! register is visible to software; condition flags are transient within an
//! instruction." [`Flags`] exists only as the return value of an ALU helper
//! feeding one `Execute` phase's predicate evaluation.

use bitflags::bitflags;

bitflags! {
    /// Condition flags produced by an ALU add/subtract, consumed the same
    /// tick by the four predicate opcodes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Flags: u8 {
        /// Borrow-style carry: set when the subtraction `a - b` underflowed
        /// unsigned (`a < b`). This is the complement of a raw adder's
        /// 17th output bit — see `alu::sub` for the derivation — chosen so
        /// that `LTU`'s condition is literally `CARRY` with no extra
        /// negation, matching the ALU semantics paragraph's wording.
        const CARRY = 1 << 0;
        /// Set when the result word is all zero bits.
        const ZERO = 1 << 1;
        /// Set when bit 15 of the result is set (two's-complement sign).
        const SIGN = 1 << 2;
        /// Set on signed arithmetic overflow.
        const OVERFLOW = 1 << 3;
    }
}

impl Flags {
    /// Derive ZERO/SIGN from a result word; CARRY/OVERFLOW are the caller's
    /// job since they depend on the two input operands, not just the
    /// result.
    #[must_use]
    pub fn from_result(result: u16, carry: bool, overflow: bool) -> Self {
        let mut flags = Self::empty();
        flags.set(Self::ZERO, result == 0);
        flags.set(Self::SIGN, result & 0x8000 != 0);
        flags.set(Self::CARRY, carry);
        flags.set(Self::OVERFLOW, overflow);
        flags
    }
}
