//! Operand-B parsing and the per-mnemonic instruction parsers.
//!
//! Operand syntax (spec §4.1): `r` ranges over the four registers for OPA;
//! `b` ranges over the three base-legal registers (`$r1` is never a base)
//! for OPB. Dual-arg forms are `OPA, OPB` or `[b[+imm]], OPA` / `[imm], OPA`;
//! single-arg forms are `OPA` or `[b[+imm]]` / `[imm]`.

use crate::error::{AsmError, Result};
use crate::expr::Expression;
use crate::section::AsmInstruction;
use tinycore_isa::{Opb, OpbBase, Opcode, OperandForm, Register};

fn tok<'a>(tokens: &'a [String], cursor: usize) -> Result<&'a str> {
    tokens
        .get(cursor)
        .map(String::as_str)
        .ok_or_else(|| AsmError::Syntax("line is too short, can't understand it".to_string()))
}

fn parse_register(text: &str) -> Result<Register> {
    Register::parse(text).ok_or_else(|| AsmError::InvalidRegister(text.to_string()))
}

/// Grab tokens up to (not including) the first `]` or `,`, as a deferred
/// expression. `force_plus` requires the slice to open with an explicit
/// sign, used for the `base+imm` / `base-imm` continuation after a base
/// register.
fn parse_constant_expression(
    tokens: &[String],
    cursor: usize,
    force_plus: bool,
) -> Result<(Expression, usize)> {
    if force_plus {
        let first = tok(tokens, cursor)?;
        if first != "+" && first != "-" {
            return Err(AsmError::Syntax(
                "constant offset must start with + or -".to_string(),
            ));
        }
    }
    let start = cursor;
    let mut end = cursor;
    while end < tokens.len() && tokens[end] != "]" && tokens[end] != "," {
        end += 1;
    }
    if end == start {
        return Err(AsmError::Syntax("expected an expression".to_string()));
    }
    Ok((Expression::new(&tokens[start..end]), end))
}

/// Classify a token as a base-legal register, `$r1` (an error), or neither
/// (a non-register token, which starts a bare expression instead).
enum BaseToken {
    Base(OpbBase),
    R1,
    NotARegister,
}

fn classify_base_token(text: &str) -> BaseToken {
    match Register::parse(text) {
        Some(Register::R1) => BaseToken::R1,
        Some(reg) => BaseToken::Base(OpbBase::from_register(reg).expect("non-R1 register has a base")),
        None => BaseToken::NotARegister,
    }
}

/// Parse operand B starting at `cursor`. Returns the decoded `Opb`, its
/// immediate expression, and the cursor past the operand.
fn parse_opb(tokens: &[String], cursor: usize, allow_immed: bool) -> Result<(Opb, Expression, usize)> {
    if tok(tokens, cursor)? == "[" {
        let mut cursor = cursor + 1;
        let next = tok(tokens, cursor)?;
        let (base, immed) = match classify_base_token(next) {
            BaseToken::R1 => return Err(AsmError::InvalidRegister(next.to_string())),
            BaseToken::Base(base) => {
                cursor += 1;
                if tok(tokens, cursor)? == "]" {
                    (base, Expression::constant(0))
                } else {
                    let (immed, new_cursor) = parse_constant_expression(tokens, cursor, true)?;
                    cursor = new_cursor;
                    (base, immed)
                }
            }
            BaseToken::NotARegister => {
                let (immed, new_cursor) = parse_constant_expression(tokens, cursor, false)?;
                cursor = new_cursor;
                (OpbBase::Bare, immed)
            }
        };
        if tok(tokens, cursor)? != "]" {
            return Err(AsmError::Syntax(
                "memory reference is not terminated properly".to_string(),
            ));
        }
        cursor += 1;
        Ok((
            Opb {
                form: OperandForm::Memory,
                base,
            },
            immed,
            cursor,
        ))
    } else if allow_immed {
        let next = tok(tokens, cursor)?;
        match classify_base_token(next) {
            BaseToken::R1 => Err(AsmError::InvalidRegister(next.to_string())),
            BaseToken::Base(base) => {
                let mut cursor = cursor + 1;
                let immed = if cursor == tokens.len() || tokens[cursor] == "," {
                    Expression::constant(0)
                } else {
                    let (immed, new_cursor) = parse_constant_expression(tokens, cursor, true)?;
                    cursor = new_cursor;
                    immed
                };
                Ok((
                    Opb {
                        form: OperandForm::Value,
                        base,
                    },
                    immed,
                    cursor,
                ))
            }
            BaseToken::NotARegister => {
                let (immed, cursor) = parse_constant_expression(tokens, cursor, false)?;
                Ok((
                    Opb {
                        form: OperandForm::Value,
                        base: OpbBase::Bare,
                    },
                    immed,
                    cursor,
                ))
            }
        }
    } else {
        Err(AsmError::Syntax(format!(
            "'{next}' is invalid as operand B",
            next = tok(tokens, cursor)?
        )))
    }
}

fn finish(tokens: &[String], cursor: usize) -> Result<()> {
    if cursor != tokens.len() {
        return Err(AsmError::Syntax(
            "line is too long, can't understand it".to_string(),
        ));
    }
    Ok(())
}

/// `OPA, OPB` or `[b[+imm]], OPA` / `[imm], OPA`. Returns the instruction with
/// `d` reflecting which syntactic form was used (memory-first sets `d=1`).
pub fn parse_dual_arg(opcode: Opcode, tokens: &[String]) -> Result<AsmInstruction> {
    let mut cursor = 1;
    let (d, opa, opb, immed);
    if tok(tokens, cursor)? == "[" {
        d = true;
        let (parsed_opb, parsed_immed, new_cursor) = parse_opb(tokens, cursor, false)?;
        cursor = new_cursor;
        if tok(tokens, cursor)? != "," {
            return Err(AsmError::Syntax(
                "there must be a comma after the first operand".to_string(),
            ));
        }
        cursor += 1;
        opa = parse_register(tok(tokens, cursor)?)?;
        cursor += 1;
        opb = parsed_opb;
        immed = parsed_immed;
    } else {
        let first = tok(tokens, cursor)?;
        opa = parse_register(first)?;
        d = false;
        cursor += 1;
        if tok(tokens, cursor)? != "," {
            return Err(AsmError::Syntax(
                "there must be a comma after the first operand".to_string(),
            ));
        }
        cursor += 1;
        let (parsed_opb, parsed_immed, new_cursor) = parse_opb(tokens, cursor, true)?;
        cursor = new_cursor;
        opb = parsed_opb;
        immed = parsed_immed;
    }
    finish(tokens, cursor)?;
    Ok(AsmInstruction {
        opcode,
        d,
        opa,
        opb,
        immed,
    })
}

/// `OPA` or `[b[+imm]]` / `[imm]`. The memory form always targets `$pc` for
/// the unused OPA field (its value never participates in the operation).
pub fn parse_single_arg(opcode: Opcode, tokens: &[String]) -> Result<AsmInstruction> {
    let cursor = 1;
    if tok(tokens, cursor)? == "[" {
        let (opb, immed, cursor) = parse_opb(tokens, cursor, false)?;
        finish(tokens, cursor)?;
        Ok(AsmInstruction {
            opcode,
            d: true,
            opa: Register::Pc,
            opb,
            immed,
        })
    } else {
        let opa = parse_register(tok(tokens, cursor)?)?;
        finish(tokens, cursor + 1)?;
        Ok(AsmInstruction {
            opcode,
            d: false,
            opa,
            opb: Opb {
                form: OperandForm::Value,
                base: OpbBase::Bare,
            },
            immed: Expression::constant(0),
        })
    }
}

/// `SWAP` always emits with `d=1` (memory-form reading on the RHS).
pub fn parse_swap(opcode: Opcode, tokens: &[String]) -> Result<AsmInstruction> {
    let mut inst = parse_dual_arg(opcode, tokens)?;
    inst.d = true;
    Ok(inst)
}

/// `SWAPI` always emits with `d=0` (the bare-immediate `[imm]` form).
pub fn parse_swapi(opcode: Opcode, tokens: &[String]) -> Result<AsmInstruction> {
    let mut inst = parse_dual_arg(opcode, tokens)?;
    inst.d = false;
    Ok(inst)
}

/// `SUB a, b`; memory-first syntax re-encodes as `ISUB` to keep "first
/// operand is destination" (the ALU's `Sub` formula is always `opA - opB`).
pub fn parse_sub(opcode: Opcode, tokens: &[String]) -> Result<AsmInstruction> {
    let mut inst = parse_dual_arg(opcode, tokens)?;
    if inst.d {
        inst.opcode = Opcode::Isub;
    }
    Ok(inst)
}

/// `ISUB a, b`; memory-first syntax re-encodes as `SUB`, symmetric to
/// [`parse_sub`].
pub fn parse_isub(opcode: Opcode, tokens: &[String]) -> Result<AsmInstruction> {
    let mut inst = parse_dual_arg(opcode, tokens)?;
    if inst.d {
        inst.opcode = Opcode::Sub;
    }
    Ok(inst)
}

/// `IF_EQ` — positive polarity, `d=0`.
pub fn parse_eq(opcode: Opcode, tokens: &[String]) -> Result<AsmInstruction> {
    let mut inst = parse_dual_arg(opcode, tokens)?;
    inst.d = false;
    Ok(inst)
}

/// `IF_NEQ` — negative polarity, `d=1`.
pub fn parse_neq(opcode: Opcode, tokens: &[String]) -> Result<AsmInstruction> {
    let mut inst = parse_dual_arg(opcode, tokens)?;
    inst.d = true;
    Ok(inst)
}

/// `IF_LTU` / `IF_LTS` / `IF_LES` — positive polarity; a swapped operand
/// order (memory-first) flips the condition via the `d` bit dual_arg already
/// set, which is exactly the desired inversion.
pub fn parse_pos_pred(opcode: Opcode, tokens: &[String]) -> Result<AsmInstruction> {
    parse_dual_arg(opcode, tokens)
}

/// `IF_GEU` / `IF_GES` / `IF_GTS` — negative polarity, always `d=1`.
pub fn parse_neg_pred(opcode: Opcode, tokens: &[String]) -> Result<AsmInstruction> {
    let mut inst = parse_dual_arg(opcode, tokens)?;
    inst.d = true;
    Ok(inst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse(line: &str, opcode: Opcode, f: fn(Opcode, &[String]) -> Result<AsmInstruction>) -> AsmInstruction {
        let tokens = tokenize(line);
        f(opcode, &tokens).unwrap()
    }

    #[test]
    fn mov_register_form() {
        let inst = parse("MOV $sp, 3", Opcode::Mov, parse_dual_arg);
        assert!(!inst.d);
        assert_eq!(inst.opa, Register::Sp);
        assert_eq!(inst.opb.form, OperandForm::Value);
        assert_eq!(inst.opb.base, OpbBase::Bare);
    }

    #[test]
    fn mov_memory_destination() {
        let inst = parse("MOV [$r0-2], $pc", Opcode::Mov, parse_dual_arg);
        assert!(inst.d);
        assert_eq!(inst.opa, Register::Pc);
        assert_eq!(inst.opb.base, OpbBase::R0);
        assert_eq!(inst.opb.form, OperandForm::Memory);
    }

    #[test]
    fn r1_rejected_as_base() {
        let tokens = tokenize("MOV [$r1-1], $sp");
        let err = parse_dual_arg(Opcode::Mov, &tokens).unwrap_err();
        assert_eq!(err, AsmError::InvalidRegister("$r1".to_string()));
    }

    #[test]
    fn sub_memory_first_becomes_isub() {
        let tokens = tokenize("SUB [5], $r0");
        let inst = parse_sub(Opcode::Sub, &tokens).unwrap();
        assert_eq!(inst.opcode, Opcode::Isub);
        assert!(inst.d);
    }

    #[test]
    fn isub_memory_first_becomes_sub() {
        let tokens = tokenize("ISUB [5], $r0");
        let inst = parse_isub(Opcode::Isub, &tokens).unwrap();
        assert_eq!(inst.opcode, Opcode::Sub);
        assert!(inst.d);
    }

    #[test]
    fn rol_memory_form_targets_pc_as_opa() {
        let tokens = tokenize("ROL [$sp-2]");
        let inst = parse_single_arg(Opcode::Rol, &tokens).unwrap();
        assert!(inst.d);
        assert_eq!(inst.opa, Register::Pc);
        assert_eq!(inst.opb.base, OpbBase::Sp);
    }

    #[test]
    fn neg_pred_forces_d_true() {
        let tokens = tokenize("IF_GEU $sp, $r0");
        let inst = parse_neg_pred(Opcode::Ltu, &tokens).unwrap();
        assert!(inst.d);
    }
}
