//! The micro-sequencer: register file plus the `tick()` state machine that
//! reproduces spec's three-phase reset sub-sequence and seven-phase execute
//! sub-sequence one clock at a time.

use crate::alu;
use crate::bus::Bus;
use crate::event::SimEvent;
use crate::flags::Flags;
use crate::state::CpuState;
use tinycore_isa::{Instruction, Opb, OpbBase, Opcode, OperandForm, Register};

/// The four architectural registers, `inten`, and the transient per-tick
/// state needed to resume a partially executed instruction across `tick()`
/// calls.
pub struct Cpu {
    pc: u16,
    sp: u16,
    r0: u16,
    r1: u16,
    inten: bool,
    in_reset: bool,
    interrupt_pending: bool,
    state: CpuState,

    reset_tmp: u16,

    inst: Instruction,
    inst_word: u16,
    mem_op_addr: u16,
    alu_opa: u16,
    alu_opb: u16,
    is_swap: bool,
    mem_ref: bool,
    mem_result: bool,
    reg_result: bool,
    noskip: bool,
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu {
    /// A freshly reset CPU: all registers zero, `in_reset` true, state
    /// machine at `ResetRead`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pc: 0,
            sp: 0,
            r0: 0,
            r1: 0,
            inten: false,
            in_reset: true,
            interrupt_pending: false,
            state: CpuState::default(),
            reset_tmp: 0,
            inst: Instruction::decode(0),
            inst_word: 0,
            mem_op_addr: 0,
            alu_opa: 0,
            alu_opb: 0,
            is_swap: false,
            mem_ref: false,
            mem_result: false,
            reg_result: false,
            noskip: true,
        }
    }

    /// Program counter.
    #[must_use]
    pub fn pc(&self) -> u16 {
        self.pc
    }

    /// Stack pointer.
    #[must_use]
    pub fn sp(&self) -> u16 {
        self.sp
    }

    /// General-purpose register 0.
    #[must_use]
    pub fn r0(&self) -> u16 {
        self.r0
    }

    /// General-purpose register 1.
    #[must_use]
    pub fn r1(&self) -> u16 {
        self.r1
    }

    /// Interrupt-enable flag.
    #[must_use]
    pub fn inten(&self) -> bool {
        self.inten
    }

    /// The phase the CPU will execute on the next `tick()` call.
    #[must_use]
    pub fn state(&self) -> CpuState {
        self.state
    }

    /// Raise or lower the interrupt line. Asynchronous: takes effect the
    /// next time it's sampled at an instruction's decode boundary.
    pub fn set_interrupt(&mut self, pending: bool) {
        self.interrupt_pending = pending;
    }

    fn register(&self, r: Register) -> u16 {
        match r {
            Register::Pc => self.pc,
            Register::Sp => self.sp,
            Register::R0 => self.r0,
            Register::R1 => self.r1,
        }
    }

    fn set_register(&mut self, r: Register, value: u16, events: &mut Vec<SimEvent>) {
        let old = self.register(r);
        match r {
            Register::Pc => self.pc = value,
            Register::Sp => self.sp = value,
            Register::R0 => self.r0 = value,
            Register::R1 => self.r1 = value,
        }
        events.push(SimEvent::RegUpdate { register: r, old, new: value });
    }

    fn opb_base_value(&self, base: OpbBase) -> u16 {
        match base.register() {
            Some(r) => self.register(r),
            None => 0,
        }
    }

    /// Advance the CPU by exactly one phase, returning the events that
    /// phase produced (often empty, e.g. the `SwapRegWrite` phase on a
    /// non-`SWAP` instruction is never entered at all).
    pub fn tick(&mut self, bus: &mut Bus) -> Vec<SimEvent> {
        let mut events = Vec::new();
        match self.state {
            CpuState::ResetRead => self.tick_reset_read(bus, &mut events),
            CpuState::ResetWriteback => self.tick_reset_writeback(bus, &mut events),
            CpuState::ResetSetPc => self.tick_reset_set_pc(&mut events),
            CpuState::Fetch => self.tick_fetch(bus, &mut events),
            CpuState::Refresh => self.tick_refresh(bus, &mut events),
            CpuState::OperandGather => self.tick_operand_gather(bus, &mut events),
            CpuState::SwapRegWrite => self.tick_swap_reg_write(&mut events),
            CpuState::WriteBack => self.tick_write_back(bus, &mut events),
            CpuState::Execute => self.tick_execute(bus, &mut events),
            CpuState::PcUpdate => self.tick_pc_update(&mut events),
        }
        events
    }

    fn tick_reset_read(&mut self, bus: &mut Bus, events: &mut Vec<SimEvent>) {
        let data = bus.read(0);
        events.push(SimEvent::Read { addr: 0, data });
        self.reset_tmp = data;
        self.state = CpuState::ResetWriteback;
    }

    fn tick_reset_writeback(&mut self, bus: &mut Bus, events: &mut Vec<SimEvent>) {
        bus.write(0, self.reset_tmp);
        events.push(SimEvent::Write { addr: 0, data: self.reset_tmp });
        self.state = CpuState::ResetSetPc;
    }

    fn tick_reset_set_pc(&mut self, events: &mut Vec<SimEvent>) {
        self.set_register(Register::Pc, self.reset_tmp, events);
        self.in_reset = false;
        self.state = CpuState::Fetch;
    }

    fn tick_fetch(&mut self, bus: &mut Bus, events: &mut Vec<SimEvent>) {
        let word = bus.read(self.pc);
        self.inst_word = word;
        events.push(SimEvent::InstFetch {
            addr: self.pc,
            word,
            disasm: tinycore_isa::disassemble(word),
        });
        self.state = CpuState::Refresh;
    }

    /// Write the fetched word back, then — untimed, no tick boundary of its
    /// own — apply the interrupt override and decode the instruction that
    /// `OperandGather` will act on.
    fn tick_refresh(&mut self, bus: &mut Bus, events: &mut Vec<SimEvent>) {
        bus.write(self.pc, self.inst_word);
        events.push(SimEvent::Write { addr: self.pc, data: self.inst_word });

        let inst = if self.interrupt_pending && self.inten {
            Instruction {
                opcode: Opcode::Swap,
                d: false,
                opa: Register::Pc,
                opb: Opb { form: OperandForm::Memory, base: OpbBase::Bare },
                immed: 1,
            }
        } else {
            Instruction::decode(self.inst_word)
        };
        self.is_swap = inst.opcode == Opcode::Swap;
        self.mem_ref = inst.opb.form == OperandForm::Memory;
        let is_predicate = inst.opcode.is_predicate();
        self.mem_result = (inst.d || self.is_swap) && !is_predicate;
        self.reg_result = (!inst.d || self.is_swap) && !is_predicate;
        self.inst = inst;
        self.state = CpuState::OperandGather;
    }

    fn tick_operand_gather(&mut self, bus: &mut Bus, events: &mut Vec<SimEvent>) {
        let base = self.opb_base_value(self.inst.opb.base);
        let addr = base.wrapping_add(self.inst.immed as u16);
        self.mem_op_addr = addr;
        self.alu_opb = if self.mem_ref {
            let data = bus.read(addr);
            events.push(SimEvent::Read { addr, data });
            data
        } else {
            addr
        };
        self.alu_opa = self.register(self.inst.opa);
        self.state = if self.is_swap { CpuState::SwapRegWrite } else { CpuState::WriteBack };
    }

    fn tick_swap_reg_write(&mut self, events: &mut Vec<SimEvent>) {
        self.set_register(self.inst.opa, self.alu_opb, events);
        self.state = CpuState::WriteBack;
    }

    fn tick_write_back(&mut self, bus: &mut Bus, events: &mut Vec<SimEvent>) {
        if self.mem_ref && !self.mem_result {
            bus.write(self.mem_op_addr, self.alu_opb);
            events.push(SimEvent::Write { addr: self.mem_op_addr, data: self.alu_opb });
        }
        self.state = CpuState::Execute;
    }

    fn tick_execute(&mut self, bus: &mut Bus, events: &mut Vec<SimEvent>) {
        let (alu_result, noskip) = self.compute_result();
        self.noskip = noskip;

        if self.mem_result {
            bus.write(self.mem_op_addr, alu_result);
            events.push(SimEvent::Write { addr: self.mem_op_addr, data: alu_result });
        } else if self.reg_result {
            // For SWAP, mem_result always wins this branch (see the formulas
            // in tick_refresh), so the register here is never written
            // twice: its value already changed in tick_swap_reg_write.
            self.set_register(self.inst.opa, alu_result, events);
        }
        self.state = CpuState::PcUpdate;
    }

    /// Apply the opcode to `(alu_opa, alu_opb, d)`, producing the execute
    /// result and, for predicates, `noskip`.
    fn compute_result(&self) -> (u16, bool) {
        let a = self.alu_opa;
        let b = self.alu_opb;
        let d = self.inst.d;
        match self.inst.opcode {
            Opcode::Swap => (a, true),
            Opcode::Or => (a | b, true),
            Opcode::And => (a & b, true),
            Opcode::Xor => (a ^ b, true),
            Opcode::Reserved => (a, true),
            Opcode::Add => (alu::add(a, b).0, true),
            Opcode::Sub => (alu::sub(a, b).0, true),
            Opcode::Isub => (alu::sub(b, a).0, true),
            Opcode::Mov => (if d { a } else { b }, true),
            Opcode::Istat => (if self.inten { 2 } else { 0 }, true),
            Opcode::Ror => (alu::ror(if d { b } else { a }), true),
            Opcode::Rol => (alu::rol(if d { b } else { a }), true),
            Opcode::Eq | Opcode::Ltu | Opcode::Lts | Opcode::Les => {
                let (_, flags) = alu::sub(a, b);
                let base_condition = match self.inst.opcode {
                    Opcode::Eq => flags.contains(Flags::ZERO),
                    Opcode::Ltu => flags.contains(Flags::CARRY),
                    Opcode::Lts => flags.contains(Flags::SIGN) ^ flags.contains(Flags::OVERFLOW),
                    Opcode::Les => {
                        (flags.contains(Flags::SIGN) ^ flags.contains(Flags::OVERFLOW))
                            || flags.contains(Flags::ZERO)
                    }
                    _ => unreachable!(),
                };
                let effective_condition = base_condition ^ d;
                (0, !effective_condition)
            }
        }
    }

    /// Whether this instruction wrote the register it names as its
    /// destination (as opposed to a memory destination, or a predicate
    /// which writes nothing). A register destination of `$pc` makes this
    /// instruction a branch: `$pc` takes the computed value unchanged
    /// instead of advancing by 1 or 2 (spec §8 invariant 4).
    fn destination_is_pc_register(&self) -> bool {
        self.inst.opa == Register::Pc && (self.is_swap || (!self.mem_result && self.reg_result))
    }

    fn tick_pc_update(&mut self, events: &mut Vec<SimEvent>) {
        if !self.destination_is_pc_register() {
            let old = self.pc;
            let new = if self.noskip { old.wrapping_add(1) } else { old.wrapping_add(2) };
            self.pc = new;
            events.push(SimEvent::RegUpdate { register: Register::Pc, old, new });
        }
        if self.is_swap && !self.inst.d {
            self.inten = !self.inten;
        }
        events.push(SimEvent::CpuStatus {
            pc: self.pc,
            sp: self.sp,
            r0: self.r0,
            r1: self.r1,
            inten: self.inten,
        });
        self.state = CpuState::Fetch;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::Memory;

    fn bus_with(words: &[u16]) -> Bus {
        let mut bus = Bus::new();
        let mut mem = Memory::new(16384);
        mem.load(0, words);
        bus.register(0, Box::new(mem));
        bus
    }

    fn run(cpu: &mut Cpu, bus: &mut Bus, ticks: usize) {
        for _ in 0..ticks {
            cpu.tick(bus);
        }
    }

    #[test]
    fn reset_sequence_loads_pc_from_word_zero() {
        let mut bus = bus_with(&[0x1000]);
        let mut cpu = Cpu::new();
        run(&mut cpu, &mut bus, 3);
        assert_eq!(cpu.pc(), 0x1000);
        assert_eq!(cpu.state(), CpuState::Fetch);
    }

    #[test]
    fn mov_immediate_advances_pc_by_one() {
        // MOV $sp, 3 at address 0x1000, followed by a halt loop.
        let mov = tinycore_isa::encode(
            Opcode::Mov,
            false,
            Register::Sp,
            Opb { form: OperandForm::Value, base: OpbBase::Bare },
            tinycore_isa::fields::truncate_immed(3),
        );
        let halt = tinycore_isa::encode(
            Opcode::Mov,
            false,
            Register::Pc,
            Opb { form: OperandForm::Value, base: OpbBase::Pc },
            tinycore_isa::fields::truncate_immed(0),
        );
        let mut mem = Memory::new(16384);
        mem.load(0, &[0x1000]);
        mem.load(0x1000, &[mov, halt]);
        let mut bus = Bus::new();
        bus.register(0, Box::new(mem));

        let mut cpu = Cpu::new();
        run(&mut cpu, &mut bus, 3); // reset
        run(&mut cpu, &mut bus, 7); // one instruction (7 ticks: fetch..pc update)
        assert_eq!(cpu.sp(), 3);
        assert_eq!(cpu.pc(), 0x1001);
    }

    #[test]
    fn predicate_skip_on_true_condition() {
        // MOV $r0, 4; IF_EQ $r0, 4; MOV $r0, 99; MOV $pc, $pc   (spec scenario S4)
        let mov4 = tinycore_isa::encode(
            Opcode::Mov,
            false,
            Register::R0,
            Opb { form: OperandForm::Value, base: OpbBase::Bare },
            tinycore_isa::fields::truncate_immed(4),
        );
        let if_eq = tinycore_isa::encode(
            Opcode::Eq,
            false,
            Register::R0,
            Opb { form: OperandForm::Value, base: OpbBase::Bare },
            tinycore_isa::fields::truncate_immed(4),
        );
        let mov99 = tinycore_isa::encode(
            Opcode::Mov,
            false,
            Register::R0,
            Opb { form: OperandForm::Value, base: OpbBase::Bare },
            tinycore_isa::fields::truncate_immed(31), // stand-in payload, never executed
        );
        let halt = tinycore_isa::encode(
            Opcode::Mov,
            false,
            Register::Pc,
            Opb { form: OperandForm::Value, base: OpbBase::Pc },
            tinycore_isa::fields::truncate_immed(0),
        );
        let mut mem = Memory::new(16384);
        mem.load(0, &[0x1000]);
        mem.load(0x1000, &[mov4, if_eq, mov99, halt]);
        let mut bus = Bus::new();
        bus.register(0, Box::new(mem));

        let mut cpu = Cpu::new();
        run(&mut cpu, &mut bus, 3); // reset
        run(&mut cpu, &mut bus, 7); // MOV $r0, 4
        assert_eq!(cpu.r0(), 4);
        run(&mut cpu, &mut bus, 7); // IF_EQ $r0, 4 -> condition true -> skip
        assert_eq!(cpu.pc(), 0x1003);
        run(&mut cpu, &mut bus, 7); // lands on the halt loop, not MOV $r0, 99
        assert_eq!(cpu.r0(), 4);
    }

    #[test]
    fn signed_vs_unsigned_predicate_scenario_s6() {
        let sp_neg4 = tinycore_isa::encode(
            Opcode::Mov,
            false,
            Register::Sp,
            Opb { form: OperandForm::Value, base: OpbBase::Bare },
            tinycore_isa::fields::truncate_immed(-4),
        );
        let r0_3 = tinycore_isa::encode(
            Opcode::Mov,
            false,
            Register::R0,
            Opb { form: OperandForm::Value, base: OpbBase::Bare },
            tinycore_isa::fields::truncate_immed(3),
        );
        let if_ltu = tinycore_isa::encode(
            Opcode::Ltu,
            false,
            Register::Sp,
            Opb { form: OperandForm::Value, base: OpbBase::R0 },
            tinycore_isa::fields::truncate_immed(0),
        );
        let if_lts = tinycore_isa::encode(
            Opcode::Lts,
            false,
            Register::Sp,
            Opb { form: OperandForm::Value, base: OpbBase::R0 },
            tinycore_isa::fields::truncate_immed(0),
        );
        let mut mem = Memory::new(16384);
        mem.load(0, &[0x1000]);
        mem.load(0x1000, &[sp_neg4, r0_3, if_ltu, if_lts]);
        let mut bus = Bus::new();
        bus.register(0, Box::new(mem));

        let mut cpu = Cpu::new();
        run(&mut cpu, &mut bus, 3);
        run(&mut cpu, &mut bus, 7); // $sp = 0xFFFC
        run(&mut cpu, &mut bus, 7); // $r0 = 3
        assert_eq!(cpu.sp(), 0xFFFC);
        assert_eq!(cpu.r0(), 3);

        let pc_before = cpu.pc();
        run(&mut cpu, &mut bus, 7); // IF_LTU $sp, $r0 -> unsigned 0xFFFC < 3 is false -> no skip
        assert_eq!(cpu.pc(), pc_before + 1);

        let pc_before = cpu.pc();
        run(&mut cpu, &mut bus, 7); // IF_LTS $sp, $r0 -> signed -4 < 3 is true -> skip
        assert_eq!(cpu.pc(), pc_before + 2);
    }

    #[test]
    fn swap_with_memory_scenario_s5() {
        let swap = tinycore_isa::encode(
            Opcode::Swap,
            true,
            Register::Sp,
            Opb { form: OperandForm::Memory, base: OpbBase::Bare },
            tinycore_isa::fields::truncate_immed(5),
        );
        let mut mem = Memory::new(16384);
        mem.load(0, &[0x1000]);
        mem.load(0x1000, &[swap]);
        mem.load(5, &[0x10]);
        let mut bus = Bus::new();
        bus.register(0, Box::new(mem));

        let mut cpu = Cpu::new();
        run(&mut cpu, &mut bus, 3);
        cpu.set_register_for_test(Register::Sp, 7);
        run(&mut cpu, &mut bus, 8); // SWAP visits one extra phase (SwapRegWrite)

        assert_eq!(cpu.sp(), 0x10);
        let dev = bus.device_at_mut(5).unwrap();
        let mem = dev.as_any_mut().downcast_mut::<Memory>().unwrap();
        assert_eq!(mem.read(5), 7);
    }

    impl Cpu {
        fn set_register_for_test(&mut self, r: Register, value: u16) {
            match r {
                Register::Pc => self.pc = value,
                Register::Sp => self.sp = value,
                Register::R0 => self.r0 = value,
                Register::R1 => self.r1 = value,
            }
        }
    }
}
