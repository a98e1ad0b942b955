//! The composition root: wires a [`Cpu`] to a [`Bus`] carrying the two
//! built-in devices (core memory and the terminator) and drives the tick
//! loop to a caller-supplied limit.

use std::collections::BTreeMap;

use crate::bus::Bus;
use crate::config::SimulatorConfig;
use crate::cpu::Cpu;
use crate::event::SimEvent;
use crate::memory::{Memory, MemoryDiff};
use crate::terminator::Terminator;

/// How a [`System::run`] call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The terminator device was written to; carries its exit code and the
    /// number of CPU ticks executed before termination was observed.
    Terminated {
        /// The word written to the terminator.
        code: u16,
        /// CPU ticks executed before the driver halted.
        ticks: u32,
    },
    /// `max_ticks` elapsed with no write to the terminator.
    Timeout,
}

/// A fully wired tinycore machine: CPU, bus, core memory, terminator.
pub struct System {
    bus: Bus,
    cpu: Cpu,
    config: SimulatorConfig,
}

impl System {
    /// Build a fresh machine. The CPU starts in its reset sub-sequence; call
    /// [`System::load`] or [`System::load_asm`] to seed memory first.
    #[must_use]
    pub fn new(config: SimulatorConfig) -> Self {
        let mut bus = Bus::new();
        bus.register(0, Box::new(Memory::new(config.memory_words)));
        bus.register(config.terminator_addr, Box::new(Terminator::new()));
        Self {
            bus,
            cpu: Cpu::new(),
            config,
        }
    }

    fn memory_mut(&mut self) -> &mut Memory {
        self.bus
            .device_at_mut(0)
            .expect("memory device must be registered at address 0")
            .as_any_mut()
            .downcast_mut::<Memory>()
            .expect("device at address 0 must be Memory")
    }

    fn memory(&self) -> &Memory {
        self.bus
            .device_at(0)
            .expect("memory device must be registered at address 0")
            .as_any()
            .downcast_ref::<Memory>()
            .expect("device at address 0 must be Memory")
    }

    fn terminator_exit_code(&self) -> Option<u16> {
        self.bus
            .device_at(self.config.terminator_addr)?
            .as_any()
            .downcast_ref::<Terminator>()?
            .exit_code()
    }

    /// Load `words` at `addr`, overwriting any existing content.
    pub fn load(&mut self, addr: u16, words: &[u16]) {
        self.memory_mut().load(addr, words);
    }

    /// Assemble `text` and load the resulting image at its own base address.
    ///
    /// # Errors
    /// Returns whatever [`tinycore_asm::assemble`] reports.
    pub fn load_asm(&mut self, text: &str) -> tinycore_asm::Result<()> {
        let (base, words) = tinycore_asm::assemble(text)?;
        self.load(base as u16, &words);
        Ok(())
    }

    /// Compare current memory contents against an expected `{addr: words}`
    /// map.
    #[must_use]
    pub fn memory_diff(&self, expected: &BTreeMap<u16, Vec<u16>>) -> MemoryDiff {
        self.memory().compare(expected)
    }

    /// The CPU, for tests that want to inspect register state directly.
    #[must_use]
    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    /// Advance by exactly one driver step: if the terminator has already
    /// latched an exit code, yield a single `Terminate` event and advance no
    /// further (spec: "the next simulation step yields a `SimEventTerminate`
    /// and the driver halts the run"). Otherwise run one CPU phase tick.
    pub fn step(&mut self) -> Vec<SimEvent> {
        if let Some(code) = self.terminator_exit_code() {
            let event = SimEvent::Terminate { code };
            log::info!("{event}");
            return vec![event];
        }
        let events = self.cpu.tick(&mut self.bus);
        for event in &events {
            log::trace!("{event}");
        }
        events
    }

    /// Run up to `max_ticks` driver steps, collecting every event produced
    /// and stopping early on termination.
    pub fn run(&mut self, max_ticks: u32) -> (Vec<SimEvent>, RunOutcome) {
        let mut events = Vec::new();
        for tick in 0..max_ticks {
            if let Some(code) = self.terminator_exit_code() {
                let event = SimEvent::Terminate { code };
                log::info!("{event}");
                events.push(event);
                return (events, RunOutcome::Terminated { code, ticks: tick });
            }
            events.extend(self.cpu.tick(&mut self.bus));
        }
        (events, RunOutcome::Timeout)
    }
}
