//! The assembler's error taxonomy. Every error aborts the enclosing
//! `assemble()` call; there is no partial/recoverable assembly.

use thiserror::Error;

/// Everything that can go wrong turning source text into a word image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AsmError {
    /// Unrecognized mnemonic, malformed operand, unbalanced `[`, missing comma.
    #[error("syntax error: {0}")]
    Syntax(String),

    /// `$r1` used as an OPB base, or an unknown register mnemonic.
    #[error("invalid register: {0}")]
    InvalidRegister(String),

    /// Fix-point symbol resolution terminated with names still unresolved.
    #[error("unresolved symbol(s): {}", .0.join(", "))]
    UnresolvedSymbol(Vec<String>),

    /// IMMED did not fit in `-32..=31` after resolution.
    #[error("immediate {0} out of range -32..=31")]
    ImmediateOutOfRange(i32),

    /// Two emitters claim the same absolute word address.
    #[error("overlapping definition at address 0x{0:04x}")]
    OverlappingDefinition(u16),

    /// An instruction or pseudo-op appeared before any `.section` directive.
    #[error("no active section; use .section to start one")]
    SectionNotActive,

    /// A symbol name was defined more than once.
    #[error("symbol {0} is already defined")]
    DuplicateSymbol(String),

    /// A value (`.word` operand, or a resolved constant) doesn't fit 16 bits.
    #[error("value {0} doesn't fit in 16 bits")]
    ValueOutOfRange(i64),
}

/// Convenience alias for fallible assembler operations.
pub type Result<T> = std::result::Result<T, AsmError>;
