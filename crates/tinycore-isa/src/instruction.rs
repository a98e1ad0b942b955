//! The canonical encoder/decoder pair. Pure functions, no hidden state.

use crate::fields::{
    self, D_OFS, IMMED_MAX, IMMED_MIN, IMMED_OFS, OPA_OFS, OPB_OFS, OPCODE_OFS,
};
use crate::opcode::Opcode;
use crate::operand::Opb;
use crate::register::Register;
use thiserror::Error;

/// Errors raised constructing an [`Instruction`] from already-resolved field
/// values (not raised by `decode`, which never fails: every 16-bit pattern
/// decodes to *some* instruction).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// The signed immediate does not fit in the 6-bit field (`-32..=31`).
    #[error("immediate {0} out of range -32..=31")]
    ImmediateOutOfRange(i32),
}

/// A fully decoded instruction: opcode, direction bit, destination register,
/// operand B descriptor, and sign-extended immediate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    /// The operation class.
    pub opcode: Opcode,
    /// Direction / polarity bit; meaning depends on `opcode.group()`.
    pub d: bool,
    /// OPA: always a register selector.
    pub opa: Register,
    /// OPB: base and form for operand B.
    pub opb: Opb,
    /// Sign-extended 6-bit immediate, already in `-32..=31`.
    pub immed: i16,
}

impl Instruction {
    /// Build an instruction from already-validated fields, checking only the
    /// immediate's range.
    pub fn new(
        opcode: Opcode,
        d: bool,
        opa: Register,
        opb: Opb,
        immed: i32,
    ) -> Result<Self, EncodeError> {
        if !(IMMED_MIN..=IMMED_MAX).contains(&immed) {
            return Err(EncodeError::ImmediateOutOfRange(immed));
        }
        Ok(Self {
            opcode,
            d,
            opa,
            opb,
            immed: immed as i16,
        })
    }

    /// Encode to the 16-bit instruction word.
    #[must_use]
    pub fn encode(self) -> u16 {
        encode(
            self.opcode,
            self.d,
            self.opa,
            self.opb,
            fields::truncate_immed(self.immed),
        )
    }

    /// Decode a 16-bit instruction word. Total: every `u16` is a legal
    /// instruction (the `Reserved` opcode decodes rather than failing).
    #[must_use]
    pub fn decode(word: u16) -> Self {
        let (opcode, d, opa, opb, immed) = decode(word);
        Self {
            opcode,
            d,
            opa,
            opb,
            immed,
        }
    }
}

/// Pack fields into the 16-bit instruction word.
///
/// `imm6` is the already-masked 6-bit two's-complement field (use
/// [`fields::truncate_immed`] if starting from a signed value known to be in
/// range).
#[must_use]
pub const fn encode(opcode: Opcode, d: bool, opa: Register, opb: Opb, imm6: u16) -> u16 {
    (opcode.code() << OPCODE_OFS)
        | ((d as u16) << D_OFS)
        | (opb.code() << OPB_OFS)
        | (opa.code() << OPA_OFS)
        | ((imm6 & fields::IMMED_MASK) << IMMED_OFS)
}

/// Unpack a 16-bit instruction word into its fields, sign-extending IMMED.
#[must_use]
pub const fn decode(word: u16) -> (Opcode, bool, Register, Opb, i16) {
    let opcode = Opcode::from_code(word >> OPCODE_OFS);
    let d = (word >> D_OFS) & fields::D_MASK != 0;
    let opb = Opb::from_code(word >> OPB_OFS);
    let opa = Register::from_code(word >> OPA_OFS);
    let immed = fields::sign_extend_immed(word >> IMMED_OFS);
    (opcode, d, opa, opb, immed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operand::{OpbBase, OperandForm};
    use proptest::prelude::*;

    #[test]
    fn encode_decode_known_word() {
        // SWAP $sp, [5]  ->  opcode=Swap d=1 opa=Sp opb=mem/bare imm=5
        let opb = Opb {
            form: OperandForm::Memory,
            base: OpbBase::Bare,
        };
        let word = encode(Opcode::Swap, true, Register::Sp, opb, fields::truncate_immed(5));
        let (op, d, opa, decoded_opb, imm) = decode(word);
        assert_eq!(op, Opcode::Swap);
        assert!(d);
        assert_eq!(opa, Register::Sp);
        assert_eq!(decoded_opb, opb);
        assert_eq!(imm, 5);
    }

    #[test]
    fn negative_immediate_sign_extends() {
        let opb = Opb {
            form: OperandForm::Value,
            base: OpbBase::Bare,
        };
        let inst = Instruction::new(Opcode::Mov, false, Register::R0, opb, -4).unwrap();
        let word = inst.encode();
        let decoded = Instruction::decode(word);
        assert_eq!(decoded.immed, -4);
    }

    #[test]
    fn out_of_range_immediate_is_rejected() {
        let opb = Opb {
            form: OperandForm::Value,
            base: OpbBase::Bare,
        };
        assert_eq!(
            Instruction::new(Opcode::Mov, false, Register::R0, opb, 32),
            Err(EncodeError::ImmediateOutOfRange(32))
        );
        assert_eq!(
            Instruction::new(Opcode::Mov, false, Register::R0, opb, -33),
            Err(EncodeError::ImmediateOutOfRange(-33))
        );
    }

    proptest! {
        #[test]
        fn decode_encode_round_trips_every_word(word: u16) {
            let decoded = Instruction::decode(word);
            prop_assert_eq!(decoded.encode(), word);
        }

        #[test]
        fn encode_decode_bijection(
            opcode_code in 0u16..16,
            d in any::<bool>(),
            opa_code in 0u16..4,
            opb_code in 0u16..8,
            immed in -32i32..=31,
        ) {
            let opcode = Opcode::from_code(opcode_code);
            let opa = Register::from_code(opa_code);
            let opb = Opb::from_code(opb_code);
            let inst = Instruction::new(opcode, d, opa, opb, immed).unwrap();
            let word = inst.encode();
            let decoded = Instruction::decode(word);
            prop_assert_eq!(decoded.opcode, opcode);
            prop_assert_eq!(decoded.d, d);
            prop_assert_eq!(decoded.opa, opa);
            prop_assert_eq!(decoded.opb, opb);
            prop_assert_eq!(decoded.immed, immed as i16);
        }
    }
}
