//! The micro-sequencer's phase enum. One `tick()` call advances the CPU by
//! exactly one phase, producing zero or more events.

/// Every phase the CPU can be in, spanning both the three-phase reset
/// sub-sequence and the seven-phase execute sub-sequence (spec §4.3). Named
/// explicitly, rather than a bare phase counter, so a debugger or trace log
/// can print where the CPU is without decoding an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CpuState {
    /// Reset phase A: read `mem[0]` into a temporary.
    #[default]
    ResetRead,
    /// Reset phase B: write that value back (the read was destructive).
    ResetWriteback,
    /// Reset phase C: `$pc <- temporary`; reset sub-sequence complete.
    ResetSetPc,
    /// Fetch `mem[$pc]` into the instruction register.
    Fetch,
    /// Write the fetched word back to `mem[$pc]`.
    Refresh,
    /// Compute `mem_op_addr`, gather `alu_opa`/`alu_opb`.
    OperandGather,
    /// SWAP-only: write the gathered operand B into the OPA register.
    SwapRegWrite,
    /// Write gathered operand B back to memory on non-memory-result
    /// instructions (read-refresh write-back).
    WriteBack,
    /// Apply the opcode, produce `alu_result`/`noskip`, commit the
    /// destination.
    Execute,
    /// Advance or branch `$pc`; toggle `inten` for SWAPI.
    PcUpdate,
}

impl CpuState {
    /// The phase that follows this one in the execute sub-sequence, given
    /// whether the current instruction is a `SWAP`. Reset states and
    /// `PcUpdate` (which loops back to `Fetch`) are handled by the caller,
    /// not this table, since they don't depend on `is_swap`.
    #[must_use]
    pub const fn next_execute_phase(self, is_swap: bool) -> Self {
        match self {
            Self::Fetch => Self::Refresh,
            Self::Refresh => Self::OperandGather,
            Self::OperandGather => {
                if is_swap {
                    Self::SwapRegWrite
                } else {
                    Self::WriteBack
                }
            }
            Self::SwapRegWrite => Self::WriteBack,
            Self::WriteBack => Self::Execute,
            Self::Execute => Self::PcUpdate,
            other => other,
        }
    }
}
