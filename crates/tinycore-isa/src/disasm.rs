//! The thin disassembler: a trivial inverse of [`crate::instruction::encode`]
//! used only to label events in the simulator's trace output. Not part of
//! execution semantics.

use crate::instruction::Instruction;
use crate::opcode::{Group, Opcode};
use crate::operand::{Opb, OpbBase, OperandForm};

/// Disassemble a 16-bit instruction word to `MNEMONIC OPA_TEXT, OPB_TEXT`
/// (or, when the destination is memory, `MNEMONIC OPB_TEXT, OPA_TEXT` — the
/// same left-to-right "destination first" reading the assembler's
/// memory-first syntax uses).
#[must_use]
pub fn disassemble(word: u16) -> String {
    let inst = Instruction::decode(word);
    let opa_text = inst.opa.to_string();
    let opb_text = format_opb(inst.opb, inst.immed);

    match inst.opcode.group() {
        Group::Special => {
            let mnemonic = if inst.d { "SWAP" } else { "SWAPI" };
            format!("{mnemonic} {opa_text}, {opb_text}")
        }
        Group::Predicate => {
            let mnemonic = predicate_mnemonic(inst.opcode, inst.d);
            format!("{mnemonic} {opa_text}, {opb_text}")
        }
        Group::Binary | Group::Unary => {
            let mnemonic = direction_mnemonic(inst.opcode, inst.d);
            if inst.d {
                format!("{mnemonic} {opb_text}, {opa_text}")
            } else {
                format!("{mnemonic} {opa_text}, {opb_text}")
            }
        }
    }
}

/// `SUB`/`ISUB` swap identity when D selects a memory destination, so that
/// the printed "first operand is destination" reading stays correct even
/// though the ALU's fixed formula is `OPA - opB`. Every other binary/unary
/// opcode's name is unaffected by D (D only moves the destination).
fn direction_mnemonic(opcode: Opcode, d: bool) -> &'static str {
    match (opcode, d) {
        (Opcode::Sub, true) => "ISUB",
        (Opcode::Isub, true) => "SUB",
        _ => opcode.mnemonic(),
    }
}

fn predicate_mnemonic(opcode: Opcode, d: bool) -> &'static str {
    match (opcode, d) {
        (Opcode::Eq, false) => "IF_EQ",
        (Opcode::Eq, true) => "IF_NEQ",
        (Opcode::Ltu, false) => "IF_LTU",
        (Opcode::Ltu, true) => "IF_GEU",
        (Opcode::Lts, false) => "IF_LTS",
        (Opcode::Lts, true) => "IF_GES",
        (Opcode::Les, false) => "IF_LES",
        (Opcode::Les, true) => "IF_GTS",
        _ => unreachable!("only predicate opcodes reach this function"),
    }
}

fn format_opb(opb: Opb, immed: i16) -> String {
    let offset = |imm: i16| {
        if imm == 0 {
            String::new()
        } else if imm > 0 {
            format!("+{imm}")
        } else {
            format!("{imm}")
        }
    };

    match (opb.form, opb.base) {
        (OperandForm::Memory, OpbBase::Bare) => format!("[{immed}]"),
        (OperandForm::Value, OpbBase::Bare) => format!("{immed}"),
        (OperandForm::Memory, base) => {
            format!("[{}{}]", base.register().unwrap(), offset(immed))
        }
        (OperandForm::Value, base) => {
            format!("{}{}", base.register().unwrap(), offset(immed))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::encode;
    use crate::register::Register;

    fn opb(form: OperandForm, base: OpbBase) -> Opb {
        Opb { form, base }
    }

    #[test]
    fn mov_register_form() {
        let word = encode(
            Opcode::Mov,
            false,
            Register::Sp,
            opb(OperandForm::Value, OpbBase::Bare),
            crate::fields::truncate_immed(3),
        );
        assert_eq!(disassemble(word), "MOV $sp, 3");
    }

    #[test]
    fn mov_memory_destination_prints_memory_first() {
        let word = encode(
            Opcode::Mov,
            true,
            Register::R0,
            opb(OperandForm::Memory, OpbBase::Bare),
            crate::fields::truncate_immed(5),
        );
        assert_eq!(disassemble(word), "MOV [5], $r0");
    }

    #[test]
    fn swap_and_swapi_text_forms() {
        let swap = encode(
            Opcode::Swap,
            true,
            Register::Sp,
            opb(OperandForm::Memory, OpbBase::Bare),
            crate::fields::truncate_immed(5),
        );
        assert_eq!(disassemble(swap), "SWAP $sp, [5]");

        let swapi = encode(
            Opcode::Swap,
            false,
            Register::Sp,
            opb(OperandForm::Memory, OpbBase::Bare),
            crate::fields::truncate_immed(1),
        );
        assert_eq!(disassemble(swapi), "SWAPI $sp, [1]");
    }

    #[test]
    fn predicate_inversion() {
        let eq = encode(
            Opcode::Eq,
            false,
            Register::R0,
            opb(OperandForm::Value, OpbBase::Bare),
            crate::fields::truncate_immed(4),
        );
        assert_eq!(disassemble(eq), "IF_EQ $r0, 4");

        let neq = encode(
            Opcode::Eq,
            true,
            Register::R0,
            opb(OperandForm::Value, OpbBase::Bare),
            crate::fields::truncate_immed(4),
        );
        assert_eq!(disassemble(neq), "IF_NEQ $r0, 4");
    }

    #[test]
    fn sub_isub_inversion_on_memory_destination() {
        let sub_to_reg = encode(
            Opcode::Sub,
            false,
            Register::R0,
            opb(OperandForm::Memory, OpbBase::Bare),
            crate::fields::truncate_immed(2),
        );
        assert_eq!(disassemble(sub_to_reg), "SUB $r0, [2]");

        let sub_to_mem = encode(
            Opcode::Sub,
            true,
            Register::R0,
            opb(OperandForm::Memory, OpbBase::Bare),
            crate::fields::truncate_immed(2),
        );
        assert_eq!(disassemble(sub_to_mem), "ISUB [2], $r0");
    }
}
