//! Operand B: the 3-bit field selecting a base register and whether the
//! operand is a memory reference or a plain value.

use crate::register::Register;
use std::fmt;

/// Whether operand B names a memory cell or is itself the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandForm {
    /// `mem[base+imm]` — bit 2 of OPB clear.
    Memory,
    /// `base+imm` (or bare `imm`) — bit 2 of OPB set.
    Value,
}

/// The base contributing to `base + imm`. `Bare` means base is the constant
/// zero, freeing the OPB code that `$r1` can never occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpbBase {
    /// `$pc`.
    Pc,
    /// `$sp`.
    Sp,
    /// `$r0`.
    R0,
    /// No register; `base` contributes `0`.
    Bare,
}

impl OpbBase {
    const fn from_low_bits(bits: u16) -> Self {
        match bits & 0b11 {
            0b00 => Self::Pc,
            0b01 => Self::Sp,
            0b10 => Self::R0,
            _ => Self::Bare,
        }
    }

    const fn low_bits(self) -> u16 {
        match self {
            Self::Pc => 0b00,
            Self::Sp => 0b01,
            Self::R0 => 0b10,
            Self::Bare => 0b11,
        }
    }

    /// The register this base reads from, or `None` for the bare form.
    #[must_use]
    pub const fn register(self) -> Option<Register> {
        match self {
            Self::Pc => Some(Register::Pc),
            Self::Sp => Some(Register::Sp),
            Self::R0 => Some(Register::R0),
            Self::Bare => None,
        }
    }

    /// Build the base corresponding to a register. Returns `None` for `$r1`,
    /// which is never a legal OPB base.
    #[must_use]
    pub const fn from_register(reg: Register) -> Option<Self> {
        match reg {
            Register::Pc => Some(Self::Pc),
            Register::Sp => Some(Self::Sp),
            Register::R0 => Some(Self::R0),
            Register::R1 => None,
        }
    }
}

/// The fully decoded OPB field: a base and a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Opb {
    /// Memory-reference or plain-value form.
    pub form: OperandForm,
    /// The base register, or `Bare` for the zero-base forms.
    pub base: OpbBase,
}

impl Opb {
    /// Decode the 3-bit OPB field.
    #[must_use]
    pub const fn from_code(code: u16) -> Self {
        let form = if code & 0b100 == 0 {
            OperandForm::Memory
        } else {
            OperandForm::Value
        };
        Self {
            form,
            base: OpbBase::from_low_bits(code),
        }
    }

    /// The 3-bit encoding of this OPB value.
    #[must_use]
    pub const fn code(self) -> u16 {
        let form_bit = match self.form {
            OperandForm::Memory => 0b000,
            OperandForm::Value => 0b100,
        };
        form_bit | self.base.low_bits()
    }
}

impl fmt::Display for Opb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base = match self.base {
            OpbBase::Pc => "$pc",
            OpbBase::Sp => "$sp",
            OpbBase::R0 => "$r0",
            OpbBase::Bare => "",
        };
        match self.form {
            OperandForm::Memory => write!(f, "[{base}]"),
            OperandForm::Value => write!(f, "{base}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_round_trip() {
        for code in 0..8u16 {
            assert_eq!(Opb::from_code(code).code(), code);
        }
    }

    #[test]
    fn bare_forms_have_no_base_register() {
        let mem_bare = Opb::from_code(0b011);
        let val_bare = Opb::from_code(0b111);
        assert_eq!(mem_bare.base.register(), None);
        assert_eq!(val_bare.base.register(), None);
        assert_eq!(mem_bare.form, OperandForm::Memory);
        assert_eq!(val_bare.form, OperandForm::Value);
    }

    #[test]
    fn r1_has_no_base_encoding() {
        assert_eq!(OpbBase::from_register(Register::R1), None);
        assert_eq!(OpbBase::from_register(Register::R0), Some(OpbBase::R0));
    }
}
