//! Cycle-accurate simulator for the tinycore 16-bit word-addressed
//! architecture: the bus, the core memory and terminator devices, the CPU
//! micro-sequencer, and the event stream they emit.
//!
//! [`System`] is the composition root most callers want: it wires a [`Cpu`]
//! to a [`Bus`] carrying the two built-in devices and drives the tick loop.
//! Callers who need finer control (a custom device set, stepping one phase
//! at a time) can assemble a [`Bus`]/[`Cpu`] pair directly.

#![warn(missing_docs)]

/// Pure arithmetic/bit-rotation helpers shared by the `Execute` phase.
pub mod alu;
/// The address-mapped device registry.
pub mod bus;
/// Simulator construction parameters.
pub mod config;
/// The register file and the phase-by-phase micro-sequencer.
pub mod cpu;
/// The bus-attached device contract.
pub mod device;
/// The observable event stream.
pub mod event;
/// Transient ALU condition flags.
pub mod flags;
/// The destructive-read, write-back core memory device.
pub mod memory;
/// The micro-sequencer's phase enum.
pub mod state;
/// The composition root wiring a CPU to a bus with its built-in devices.
pub mod system;
/// The `0xFFFF` terminator port device.
pub mod terminator;

pub use bus::Bus;
pub use config::SimulatorConfig;
pub use cpu::Cpu;
pub use device::Device;
pub use event::SimEvent;
pub use memory::{Memory, MemoryDiff};
pub use state::CpuState;
pub use system::{RunOutcome, System};
pub use terminator::Terminator;
