//! Pure instruction-set model for the tinycore 16-bit word-addressed
//! architecture: field layout, the register file, the opcode and operand-B
//! taxonomies, the encoder/decoder pair, and a thin disassembler.
//!
//! This crate has no I/O and no hidden state — every public function is a
//! pure transform over `u16` words and the small enums that describe their
//! fields. [`tinycore_asm`](https://docs.rs/tinycore-asm) and
//! [`tinycore_sim`](https://docs.rs/tinycore-sim) both depend on it so that
//! the assembler and the simulator can never disagree about what a bit
//! pattern means.

#![warn(missing_docs)]

/// The thin disassembler used only to label simulator trace events.
pub mod disasm;
/// Bit offsets and masks for the 16-bit instruction word.
pub mod fields;
/// The canonical encoder/decoder pair.
pub mod instruction;
/// The 16-entry opcode table.
pub mod opcode;
/// Operand B: base register and memory-vs-value form.
pub mod operand;
/// The four-entry register file.
pub mod register;

pub use disasm::disassemble;
pub use instruction::{decode, encode, EncodeError, Instruction};
pub use opcode::{Group, Opcode};
pub use operand::{Opb, OpbBase, OperandForm};
pub use register::Register;
