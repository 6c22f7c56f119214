use crate::constants::memory_range::STACK_PAGE;
use crate::constants::InterruptVector;
use crate::error::CpuError;
use crate::memory::Memory;
use crate::opcodes::{decode, Mode};
use crate::status::{is_flag_set, set_flag, with_irq_push_bits, StatusFlag};
use crate::trace::{NullTrace, Trace};

/// Where an instruction's operand ultimately lives once addressing is
/// resolved. `Immediate` and `Accumulator` never touch the bus;
/// `Address` is a location in `Memory`.
#[derive(Debug, Clone, Copy)]
pub enum Operand {
    Accumulator,
    Immediate(u8),
    Address(u16),
}

/// The three ways execution can be diverted away from the normal
/// fetch-decode-execute sequence, in priority order: a pending Reset always
/// wins, then NMI, then IRQ (and IRQ is the only one of the three the I flag
/// can mask).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptSource {
    Reset,
    Nmi,
    Irq,
}

/// Latches the three interrupt lines. Raising a line more than once before
/// it's serviced is harmless -- these are level-triggered, not a queue.
#[derive(Debug, Default)]
pub struct Interrupts {
    reset: bool,
    nmi: bool,
    irq: bool,
}

impl Interrupts {
    fn raise(&mut self, source: InterruptSource) {
        match source {
            InterruptSource::Reset => self.reset = true,
            InterruptSource::Nmi => self.nmi = true,
            InterruptSource::Irq => self.irq = true,
        }
    }

    fn clear(&mut self, source: InterruptSource) {
        match source {
            InterruptSource::Reset => self.reset = false,
            InterruptSource::Nmi => self.nmi = false,
            InterruptSource::Irq => self.irq = false,
        }
    }

    fn pending(&self, irq_disabled: bool) -> Option<InterruptSource> {
        if self.reset {
            Some(InterruptSource::Reset)
        } else if self.nmi {
            Some(InterruptSource::Nmi)
        } else if self.irq && !irq_disabled {
            Some(InterruptSource::Irq)
        } else {
            None
        }
    }
}

/// Tunables that change how the core behaves without changing the decode
/// table. `disable_decimal` exists for embedders targeting a 6502 variant
/// (e.g. the Ricoh 2A03 used in the NES) that wires the Decimal flag to
/// nothing -- ADC/SBC always run in binary mode even if D is set.
#[derive(Debug, Clone, Copy)]
pub struct CpuOptions {
    pub disable_decimal: bool,
}

impl Default for CpuOptions {
    fn default() -> CpuOptions {
        CpuOptions {
            disable_decimal: false,
        }
    }
}

/// The result of stepping one instruction or servicing one interrupt.
/// `opcode` is the fetched byte (a sentinel `0x00` when this outcome came
/// from servicing an interrupt rather than decoding one -- never ambiguous
/// with a real BRK since `brk` is `false` on that path). `brk` is the
/// distinguished terminal condition `run` watches for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOutcome {
    pub cycles: u32,
    pub opcode: u8,
    pub brk: bool,
}

/// The MOS 6502 register file plus whatever `Memory` implementation the
/// embedder hands it. Borrows its memory for the duration of a step/run
/// call rather than owning it, so the same bus can be shared with a PPU or
/// other bus-mastering device between CPU steps.
pub struct Cpu<'a> {
    pub(crate) a: u8,
    pub(crate) x: u8,
    pub(crate) y: u8,
    pub(crate) sp: u8,
    pub(crate) pc: u16,
    pub(crate) p: u8,
    pub(crate) memory: &'a mut dyn Memory,
    pub(crate) options: CpuOptions,
    interrupts: Interrupts,
    trace: Box<dyn Trace>,
    cycles: u64,
    brk_signal: bool,
}

impl<'a> Cpu<'a> {
    pub fn new(memory: &'a mut dyn Memory) -> Cpu<'a> {
        Cpu::with_options(memory, CpuOptions::default())
    }

    pub fn with_options(memory: &'a mut dyn Memory, options: CpuOptions) -> Cpu<'a> {
        let mut cpu = Cpu {
            a: 0,
            x: 0,
            y: 0,
            sp: 0xFD,
            pc: 0,
            p: crate::status::RESET_STATUS_FLAG,
            memory,
            options,
            interrupts: Interrupts::default(),
            trace: Box::new(NullTrace),
            cycles: 0,
            brk_signal: false,
        };
        cpu.pc = cpu.memory.fetch_u16(InterruptVector::Reset as u16);
        cpu
    }

    pub fn with_trace(mut self, trace: Box<dyn Trace>) -> Cpu<'a> {
        self.trace = trace;
        self
    }

    pub fn a(&self) -> u8 {
        self.a
    }
    pub fn x(&self) -> u8 {
        self.x
    }
    pub fn y(&self) -> u8 {
        self.y
    }
    pub fn sp(&self) -> u8 {
        self.sp
    }
    pub fn pc(&self) -> u16 {
        self.pc
    }
    pub fn p(&self) -> u8 {
        self.p
    }
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn set_pc(&mut self, pc: u16) {
        self.pc = pc;
    }

    /// Register setters, mainly for test harnesses and save-state restore --
    /// normal execution only ever changes these through the opcode table.
    pub fn set_a(&mut self, a: u8) {
        self.a = a;
    }
    pub fn set_x(&mut self, x: u8) {
        self.x = x;
    }
    pub fn set_y(&mut self, y: u8) {
        self.y = y;
    }
    pub fn set_sp(&mut self, sp: u8) {
        self.sp = sp;
    }
    pub fn set_p(&mut self, p: u8) {
        self.p = p;
    }

    /// Re-reads the Reset vector and restores the power-on register state.
    /// Equivalent to holding the RST line and releasing it.
    pub fn reset(&mut self) {
        self.sp = 0xFD;
        self.p = crate::status::RESET_STATUS_FLAG;
        self.pc = self.memory.fetch_u16(InterruptVector::Reset as u16);
        self.interrupts = Interrupts::default();
    }

    /// Latches an interrupt line. It's serviced the next time `step` is
    /// called, ahead of fetching an opcode, subject to priority and (for
    /// IRQ) the Interrupt Disable flag.
    pub fn raise(&mut self, source: InterruptSource) {
        self.interrupts.raise(source);
    }

    /// Drops a latched interrupt line without servicing it, for embedders
    /// that model edge-triggered rather than level-triggered devices.
    pub fn clear(&mut self, source: InterruptSource) {
        self.interrupts.clear(source);
    }

    pub fn is_pending(&self, source: InterruptSource) -> bool {
        match source {
            InterruptSource::Reset => self.interrupts.reset,
            InterruptSource::Nmi => self.interrupts.nmi,
            InterruptSource::Irq => self.interrupts.irq,
        }
    }

    fn irq_disabled(&self) -> bool {
        is_flag_set(self.p, StatusFlag::InterruptDisable)
    }

    /// Called by the `brk` executor to flag that the instruction just run
    /// was a software interrupt, so `step` can surface it in `StepOutcome`.
    pub(crate) fn signal_brk(&mut self) {
        self.brk_signal = true;
    }

    /// Services exactly one pending interrupt, highest priority first
    /// (Reset, then NMI, then IRQ), and returns the cycles it took. Returns
    /// `None` if no interrupt is latched, or IRQ is latched but masked by
    /// the Interrupt Disable flag. Normally folded into `step`; exposed
    /// directly for embedders and tests that want to dispatch one without
    /// also risking a fetch.
    pub fn perform_interrupts(&mut self) -> Option<u32> {
        let source = self.interrupts.pending(self.irq_disabled())?;
        self.interrupts.clear(source);
        let cycles = self.service_interrupt(source);
        self.cycles += cycles as u64;
        Some(cycles)
    }

    /// Runs exactly one instruction, or services one pending interrupt if
    /// one is latched, and returns how many cycles it took along with the
    /// fetched opcode and whether it was a BRK.
    pub fn step(&mut self) -> Result<StepOutcome, CpuError> {
        if let Some(cycles) = self.perform_interrupts() {
            return Ok(StepOutcome {
                cycles,
                opcode: 0x00,
                brk: false,
            });
        }

        let pc_at_fetch = self.pc;
        let opcode = self.fetch_byte();
        let entry = decode(opcode).ok_or(CpuError::UnknownOpcode {
            opcode,
            pc: pc_at_fetch,
        })?;
        self.brk_signal = false;
        let extra = (entry.exec)(self, entry.mode)?;
        let total = entry.cycles + extra;
        self.cycles += total as u64;
        self.trace.on_step(pc_at_fetch, opcode, entry.mnemonic, total);
        Ok(StepOutcome {
            cycles: total,
            opcode,
            brk: self.brk_signal,
        })
    }

    /// Steps repeatedly until a BRK is encountered, returning the
    /// `StepOutcome` that carried it. BRK is a distinguished terminal
    /// status, not an error: `run` returns normally once it's hit.
    pub fn run(&mut self) -> Result<StepOutcome, CpuError> {
        loop {
            let outcome = self.step()?;
            if outcome.brk {
                return Ok(outcome);
            }
        }
    }

    fn service_interrupt(&mut self, source: InterruptSource) -> u32 {
        match source {
            InterruptSource::Reset => {
                self.reset();
                7
            }
            InterruptSource::Nmi => {
                self.push_u16(self.pc);
                let p = with_irq_push_bits(self.p);
                self.push_u8(p);
                self.p = set_flag(self.p, StatusFlag::InterruptDisable, true);
                self.pc = self.memory.fetch_u16(InterruptVector::NonMaskableInterrupt as u16);
                7
            }
            InterruptSource::Irq => {
                self.push_u16(self.pc);
                let p = with_irq_push_bits(self.p);
                self.push_u8(p);
                self.p = set_flag(self.p, StatusFlag::InterruptDisable, true);
                self.pc = self.memory.fetch_u16(InterruptVector::IrqOrBrk as u16);
                7
            }
        }
    }

    pub(crate) fn fetch_byte(&mut self) -> u8 {
        let byte = self.memory.fetch(self.pc);
        self.pc = self.pc.wrapping_add(1);
        byte
    }

    pub(crate) fn fetch_word(&mut self) -> u16 {
        let lo = self.fetch_byte() as u16;
        let hi = self.fetch_byte() as u16;
        lo | (hi << 8)
    }

    pub(crate) fn push_u8(&mut self, value: u8) {
        let addr = (STACK_PAGE as u16) << 8 | self.sp as u16;
        self.memory.store(addr, value);
        self.sp = self.sp.wrapping_sub(1);
    }

    pub(crate) fn pull_u8(&mut self) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        let addr = (STACK_PAGE as u16) << 8 | self.sp as u16;
        self.memory.fetch(addr)
    }

    pub(crate) fn push_u16(&mut self, value: u16) {
        self.push_u8((value >> 8) as u8);
        self.push_u8((value & 0xFF) as u8);
    }

    pub(crate) fn pull_u16(&mut self) -> u16 {
        let lo = self.pull_u8() as u16;
        let hi = self.pull_u8() as u16;
        lo | (hi << 8)
    }

    /// Reads a single flag out of `p`, for embedders and tests that don't
    /// want to hand-decode the packed status byte.
    pub fn flag(&self, flag: StatusFlag) -> bool {
        is_flag_set(self.p, flag)
    }

    pub fn set_flag(&mut self, flag: StatusFlag, value: bool) {
        self.p = set_flag(self.p, flag, value);
    }

    /// Read-only access to the bus this CPU is wired to, for inspecting
    /// side effects (stack contents, memory-mapped output) from outside.
    pub fn memory(&self) -> &dyn Memory {
        self.memory
    }

    pub(crate) fn set_zero_negative(&mut self, value: u8) {
        self.set_flag(StatusFlag::Zero, value == 0);
        self.set_flag(StatusFlag::Negative, value & 0x80 != 0);
    }

    /// Resolves `mode`'s operand, consuming operand bytes from the
    /// instruction stream as it goes. Returns whether resolving the address
    /// crossed a page boundary -- callers for read instructions turn that
    /// into an extra cycle via `page_cross_penalty`; stores and
    /// read-modify-writes ignore it.
    pub(crate) fn resolve_operand(&mut self, mode: Mode) -> (Operand, bool) {
        match mode {
            Mode::Accumulator => (Operand::Accumulator, false),
            Mode::Immediate => {
                let value = self.fetch_byte();
                (Operand::Immediate(value), false)
            }
            Mode::ZeroPage => {
                let addr = self.fetch_byte() as u16;
                (Operand::Address(addr), false)
            }
            Mode::ZeroPageX => {
                let base = self.fetch_byte();
                let addr = base.wrapping_add(self.x) as u16;
                (Operand::Address(addr), false)
            }
            Mode::ZeroPageY => {
                let base = self.fetch_byte();
                let addr = base.wrapping_add(self.y) as u16;
                (Operand::Address(addr), false)
            }
            Mode::Absolute => {
                let addr = self.fetch_word();
                (Operand::Address(addr), false)
            }
            Mode::AbsoluteX => {
                let base = self.fetch_word();
                let addr = base.wrapping_add(self.x as u16);
                let crossed = (base & 0xFF00) != (addr & 0xFF00);
                (Operand::Address(addr), crossed)
            }
            Mode::AbsoluteY => {
                let base = self.fetch_word();
                let addr = base.wrapping_add(self.y as u16);
                let crossed = (base & 0xFF00) != (addr & 0xFF00);
                (Operand::Address(addr), crossed)
            }
            Mode::Indirect => {
                let ptr = self.fetch_word();
                let addr = self.read_u16_with_page_wrap_bug(ptr);
                (Operand::Address(addr), false)
            }
            Mode::IndirectX => {
                let base = self.fetch_byte();
                let zp = base.wrapping_add(self.x);
                let lo = self.memory.fetch(zp as u16) as u16;
                let hi = self.memory.fetch(zp.wrapping_add(1) as u16) as u16;
                (Operand::Address(lo | (hi << 8)), false)
            }
            Mode::IndirectY => {
                let base = self.fetch_byte();
                let lo = self.memory.fetch(base as u16) as u16;
                let hi = self.memory.fetch(base.wrapping_add(1) as u16) as u16;
                let ptr = lo | (hi << 8);
                let addr = ptr.wrapping_add(self.y as u16);
                let crossed = (ptr & 0xFF00) != (addr & 0xFF00);
                (Operand::Address(addr), crossed)
            }
            Mode::Relative | Mode::Implied => (Operand::Accumulator, false),
        }
    }

    /// Reproduces the indirect-JMP hardware bug: if the pointer's low byte
    /// is 0xFF, the high byte is fetched from the start of the same page
    /// instead of rolling over into the next one.
    fn read_u16_with_page_wrap_bug(&self, ptr: u16) -> u16 {
        let lo = self.memory.fetch(ptr) as u16;
        let hi_addr = if ptr & 0x00FF == 0x00FF {
            ptr & 0xFF00
        } else {
            ptr.wrapping_add(1)
        };
        let hi = self.memory.fetch(hi_addr) as u16;
        lo | (hi << 8)
    }

    pub(crate) fn load_operand(&mut self, mode: Mode) -> (u8, bool) {
        match self.resolve_operand(mode) {
            (Operand::Accumulator, crossed) => (self.a, crossed),
            (Operand::Immediate(value), crossed) => (value, crossed),
            (Operand::Address(addr), crossed) => (self.memory.fetch(addr), crossed),
        }
    }

    pub(crate) fn store_result(&mut self, operand: Operand, value: u8) {
        match operand {
            Operand::Accumulator => self.a = value,
            Operand::Address(addr) => self.memory.store(addr, value),
            Operand::Immediate(_) => unreachable!("immediate operand is never a store target"),
        }
    }

    /// The extra cycle a *read* instruction pays when Absolute,X /
    /// Absolute,Y / (zp),Y addressing crosses a page boundary. Store and
    /// read-modify-write instructions already charge the fixed worst case
    /// and never call this.
    pub(crate) fn page_cross_penalty(mode: Mode, crossed: bool) -> u32 {
        match mode {
            Mode::AbsoluteX | Mode::AbsoluteY | Mode::IndirectY if crossed => 1,
            _ => 0,
        }
    }

    /// Shared by all eight branch instructions: consumes the relative
    /// offset byte, and if `condition` holds, adjusts `pc` and reports the
    /// 1-or-2 extra cycles a taken branch costs (2 only when it also
    /// crosses a page boundary).
    pub(crate) fn branch_if(&mut self, condition: bool) -> u32 {
        let offset = self.fetch_byte() as i8;
        if !condition {
            return 0;
        }
        let pc_after_operand = self.pc;
        let target = pc_after_operand.wrapping_add(offset as u16);
        self.pc = target;
        if (pc_after_operand & 0xFF00) != (target & 0xFF00) {
            2
        } else {
            1
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::memory::FlatMemory;

    fn new_cpu(memory: &mut FlatMemory) -> Cpu<'_> {
        Cpu::new(memory)
    }

    #[test]
    fn test_reset_reads_vector() {
        let mut memory = FlatMemory::new();
        memory.store(0xFFFC, 0x00);
        memory.store(0xFFFD, 0x80);
        let cpu = new_cpu(&mut memory);
        assert_eq!(cpu.pc(), 0x8000);
        assert_eq!(cpu.sp(), 0xFD);
    }

    #[test]
    fn test_stack_push_pull_u8_roundtrip() {
        let mut memory = FlatMemory::new();
        let mut cpu = new_cpu(&mut memory);
        cpu.push_u8(0x42);
        assert_eq!(cpu.pull_u8(), 0x42);
    }

    #[test]
    fn test_stack_push_pull_u16_roundtrip() {
        let mut memory = FlatMemory::new();
        let mut cpu = new_cpu(&mut memory);
        cpu.push_u16(0x1234);
        assert_eq!(cpu.pull_u16(), 0x1234);
    }

    #[test]
    fn test_indirect_jmp_page_wrap_bug() {
        let mut memory = FlatMemory::new();
        memory.store(0xFFFC, 0x00);
        memory.store(0xFFFD, 0x80);
        // ($30FF) -- low byte from $30FF, high byte wraps to $3000, not $3100.
        memory.store(0x30FF, 0x00);
        memory.store(0x3000, 0x40);
        memory.store(0x3100, 0xFF);
        let cpu = new_cpu(&mut memory);
        let addr = cpu.read_u16_with_page_wrap_bug(0x30FF);
        assert_eq!(addr, 0x4000);
    }

    #[test]
    fn test_unknown_opcode_is_an_error() {
        let mut memory = FlatMemory::new();
        memory.store(0xFFFC, 0x00);
        memory.store(0xFFFD, 0x80);
        memory.store(0x8000, 0x02); // KIL, undocumented
        let mut cpu = new_cpu(&mut memory);
        let err = cpu.step().unwrap_err();
        assert_eq!(
            err,
            CpuError::UnknownOpcode {
                opcode: 0x02,
                pc: 0x8000
            }
        );
    }
}
