//! The observable event stream: what each tick printed, in the order
//! produced. Spec's external-interfaces section treats this text as
//! binding — tests match against it — so the four event kinds inherited
//! from the Python reference (`Read`, `Write`, `RegUpdate`, and the implicit
//! termination report) keep its exact wording.

use std::collections::BTreeMap;
use std::fmt;
use tinycore_isa::Register;

/// One observable effect of a single tick. Multiple events may be produced
/// by one tick (e.g. a memory-form `SWAP` both reads and later writes);
/// they are recorded in the order they occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimEvent {
    /// A destructive memory read.
    Read {
        /// The address read.
        addr: u16,
        /// The value returned (and removed from the cell).
        data: u16,
    },
    /// A memory write, including write-backs that restore a destructively
    /// read cell.
    Write {
        /// The address written.
        addr: u16,
        /// The value written.
        data: u16,
    },
    /// A register changed value.
    RegUpdate {
        /// Which register.
        register: Register,
        /// Its value before the update.
        old: u16,
        /// Its value after the update.
        new: u16,
    },
    /// An instruction word was fetched; carries its disassembly for trace
    /// printing.
    InstFetch {
        /// `$pc` at the time of fetch.
        addr: u16,
        /// The raw instruction word.
        word: u16,
        /// `tinycore_isa::disassemble(word)`.
        disasm: String,
    },
    /// A snapshot of the full register file, emitted at the end of every
    /// instruction's `PcUpdate` phase.
    CpuStatus {
        /// Program counter, after this instruction's update.
        pc: u16,
        /// Stack pointer.
        sp: u16,
        /// General-purpose register 0.
        r0: u16,
        /// General-purpose register 1.
        r1: u16,
        /// Interrupt-enable flag.
        inten: bool,
    },
    /// The terminator device was written to; the run ends after this tick.
    Terminate {
        /// The word written, used as the simulation's exit code.
        code: u16,
    },
    /// A full memory dump, keyed by address; `None` marks a cell that was
    /// never written (spec's "undefined", printed as `xxxx`).
    MemDump(BTreeMap<u16, Option<u16>>),
}

impl fmt::Display for SimEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { addr, data } => {
                write!(f, "read MEM[0x{addr:04x}] returned 0x{data:04x}")
            }
            Self::Write { addr, data } => {
                write!(f, "write MEM[0x{addr:04x}] to 0x{data:04x}")
            }
            Self::RegUpdate { register, old, new } => {
                write!(f, "reg {register} updated from 0x{old:04x} to 0x{new:04x}")
            }
            Self::InstFetch { addr, word, disasm } => {
                write!(f, "fetch MEM[0x{addr:04x}] = 0x{word:04x} ({disasm})")
            }
            Self::CpuStatus { pc, sp, r0, r1, inten } => {
                write!(f, "cpu $pc=0x{pc:04x} $sp=0x{sp:04x} $r0=0x{r0:04x} $r1=0x{r1:04x} inten={inten}")
            }
            Self::Terminate { code } => {
                write!(f, "terminate with exit code {code} (0x{code:04x})")
            }
            Self::MemDump(map) => {
                writeln!(f, "mem dump:")?;
                for (i, (addr, value)) in map.iter().enumerate() {
                    let text = match value {
                        Some(word) => format!("0x{word:04x}"),
                        None => "xxxx".to_string(),
                    };
                    if i + 1 == map.len() {
                        write!(f, "  0x{addr:04x}: {text}")?;
                    } else {
                        writeln!(f, "  0x{addr:04x}: {text}")?;
                    }
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_text_matches_reference_wording() {
        let event = SimEvent::Read { addr: 0, data: 0x1000 };
        assert_eq!(event.to_string(), "read MEM[0x0000] returned 0x1000");
    }

    #[test]
    fn write_text_matches_reference_wording() {
        let event = SimEvent::Write { addr: 0, data: 0x1000 };
        assert_eq!(event.to_string(), "write MEM[0x0000] to 0x1000");
    }

    #[test]
    fn reg_update_names_registers_with_dollar_prefix() {
        let event = SimEvent::RegUpdate {
            register: Register::Pc,
            old: 0,
            new: 0x1000,
        };
        assert_eq!(event.to_string(), "reg $pc updated from 0x0000 to 0x1000");
    }

    #[test]
    fn terminate_reports_decimal_and_hex() {
        let event = SimEvent::Terminate { code: 0 };
        assert_eq!(event.to_string(), "terminate with exit code 0 (0x0000)");
    }
}
