use crate::constants::InterruptVector;
use crate::cpu::{Cpu, Operand};
use crate::error::CpuError;
use crate::opcodes::Mode;
use crate::status::{with_break_push_bits, with_irq_push_bits, StatusFlag};

fn jump_target(cpu: &mut Cpu<'_>, mode: Mode) -> u16 {
    match cpu.resolve_operand(mode) {
        (Operand::Address(addr), _) => addr,
        _ => unreachable!("JMP/JSR always address memory"),
    }
}

pub fn jmp(cpu: &mut Cpu<'_>, mode: Mode) -> Result<u32, CpuError> {
    let target = jump_target(cpu, mode);
    cpu.set_pc(target);
    Ok(0)
}

/// JSR pushes the address of its *last* byte, not the address of the next
/// instruction -- RTS makes up the difference by pulling and incrementing.
pub fn jsr(cpu: &mut Cpu<'_>, mode: Mode) -> Result<u32, CpuError> {
    let target = jump_target(cpu, mode);
    let return_addr = cpu.pc().wrapping_sub(1);
    cpu.push_u16(return_addr);
    cpu.set_pc(target);
    Ok(0)
}

pub fn rts(cpu: &mut Cpu<'_>, _mode: Mode) -> Result<u32, CpuError> {
    let addr = cpu.pull_u16();
    cpu.set_pc(addr.wrapping_add(1));
    Ok(0)
}

/// BRK is a software interrupt: it skips a padding byte, pushes PC and P
/// (with the Break and Unused bits forced on, matching PHP), masks IRQ, and
/// vectors through the same address IRQ does.
pub fn brk(cpu: &mut Cpu<'_>, _mode: Mode) -> Result<u32, CpuError> {
    let pc = cpu.pc().wrapping_add(1);
    cpu.set_pc(pc);
    cpu.push_u16(pc);
    let pushed = with_break_push_bits(cpu.p());
    cpu.push_u8(pushed);
    cpu.set_flag(StatusFlag::InterruptDisable, true);
    let vector = cpu.memory.fetch_u16(InterruptVector::IrqOrBrk as u16);
    cpu.set_pc(vector);
    cpu.signal_brk();
    Ok(0)
}

pub fn rti(cpu: &mut Cpu<'_>, _mode: Mode) -> Result<u32, CpuError> {
    let pulled = cpu.pull_u8();
    cpu.p = with_irq_push_bits(pulled);
    let addr = cpu.pull_u16();
    cpu.set_pc(addr);
    Ok(0)
}

pub fn bcc(cpu: &mut Cpu<'_>, _mode: Mode) -> Result<u32, CpuError> {
    let condition = !cpu.flag(StatusFlag::Carry);
    Ok(cpu.branch_if(condition))
}

pub fn bcs(cpu: &mut Cpu<'_>, _mode: Mode) -> Result<u32, CpuError> {
    let condition = cpu.flag(StatusFlag::Carry);
    Ok(cpu.branch_if(condition))
}

pub fn beq(cpu: &mut Cpu<'_>, _mode: Mode) -> Result<u32, CpuError> {
    let condition = cpu.flag(StatusFlag::Zero);
    Ok(cpu.branch_if(condition))
}

pub fn bne(cpu: &mut Cpu<'_>, _mode: Mode) -> Result<u32, CpuError> {
    let condition = !cpu.flag(StatusFlag::Zero);
    Ok(cpu.branch_if(condition))
}

pub fn bmi(cpu: &mut Cpu<'_>, _mode: Mode) -> Result<u32, CpuError> {
    let condition = cpu.flag(StatusFlag::Negative);
    Ok(cpu.branch_if(condition))
}

pub fn bpl(cpu: &mut Cpu<'_>, _mode: Mode) -> Result<u32, CpuError> {
    let condition = !cpu.flag(StatusFlag::Negative);
    Ok(cpu.branch_if(condition))
}

pub fn bvc(cpu: &mut Cpu<'_>, _mode: Mode) -> Result<u32, CpuError> {
    let condition = !cpu.flag(StatusFlag::Overflow);
    Ok(cpu.branch_if(condition))
}

pub fn bvs(cpu: &mut Cpu<'_>, _mode: Mode) -> Result<u32, CpuError> {
    let condition = cpu.flag(StatusFlag::Overflow);
    Ok(cpu.branch_if(condition))
}

pub fn clc(cpu: &mut Cpu<'_>, _mode: Mode) -> Result<u32, CpuError> {
    cpu.set_flag(StatusFlag::Carry, false);
    Ok(0)
}

pub fn sec(cpu: &mut Cpu<'_>, _mode: Mode) -> Result<u32, CpuError> {
    cpu.set_flag(StatusFlag::Carry, true);
    Ok(0)
}

pub fn cli(cpu: &mut Cpu<'_>, _mode: Mode) -> Result<u32, CpuError> {
    cpu.set_flag(StatusFlag::InterruptDisable, false);
    Ok(0)
}

pub fn sei(cpu: &mut Cpu<'_>, _mode: Mode) -> Result<u32, CpuError> {
    cpu.set_flag(StatusFlag::InterruptDisable, true);
    Ok(0)
}

pub fn cld(cpu: &mut Cpu<'_>, _mode: Mode) -> Result<u32, CpuError> {
    cpu.set_flag(StatusFlag::Decimal, false);
    Ok(0)
}

pub fn sed(cpu: &mut Cpu<'_>, _mode: Mode) -> Result<u32, CpuError> {
    cpu.set_flag(StatusFlag::Decimal, true);
    Ok(0)
}

pub fn clv(cpu: &mut Cpu<'_>, _mode: Mode) -> Result<u32, CpuError> {
    cpu.set_flag(StatusFlag::Overflow, false);
    Ok(0)
}

pub fn nop(_cpu: &mut Cpu<'_>, _mode: Mode) -> Result<u32, CpuError> {
    Ok(0)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::memory::FlatMemory;

    fn cpu_with_program(memory: &mut FlatMemory, program: &[u8]) -> Cpu<'_> {
        memory.store(0xFFFC, 0x00);
        memory.store(0xFFFD, 0x80);
        memory.load_image(program, 0x8000);
        Cpu::new(memory)
    }

    #[test]
    fn test_jsr_then_rts_returns_to_the_instruction_after_jsr() {
        let mut memory = FlatMemory::new();
        // JSR $9000 ; NOP
        let mut cpu = cpu_with_program(&mut memory, &[0x20, 0x00, 0x90]);
        cpu.memory.store(0x9000, 0x60); // RTS
        cpu.step().unwrap(); // JSR
        assert_eq!(cpu.pc(), 0x9000);
        cpu.step().unwrap(); // RTS
        assert_eq!(cpu.pc(), 0x8003);
    }

    #[test]
    fn test_branch_not_taken_costs_base_cycles_only() {
        let mut memory = FlatMemory::new();
        let mut cpu = cpu_with_program(&mut memory, &[0xD0, 0x10]); // BNE +16
        cpu.set_flag(StatusFlag::Zero, true);
        let outcome = cpu.step().unwrap();
        assert_eq!(outcome.cycles, 2);
        assert_eq!(cpu.pc(), 0x8002);
    }

    #[test]
    fn test_branch_taken_crossing_page_costs_two_extra_cycles() {
        let mut memory = FlatMemory::new();
        // BNE at $80FD: the instruction finishes at $80FF, and +2 crosses
        // into page $81.
        memory.store(0xFFFC, 0xFD);
        memory.store(0xFFFD, 0x80);
        memory.store(0x80FD, 0xD0);
        memory.store(0x80FE, 0x02);
        let mut cpu = Cpu::new(&mut memory);
        let outcome = cpu.step().unwrap();
        assert_eq!(outcome.cycles, 4);
        assert_eq!(cpu.pc(), 0x8101);
    }

    #[test]
    fn test_brk_vectors_through_irq_vector_and_sets_break_bit_on_stack() {
        let mut memory = FlatMemory::new();
        memory.store(0xFFFE, 0x00);
        memory.store(0xFFFF, 0x90);
        let mut cpu = cpu_with_program(&mut memory, &[0x00]); // BRK
        let outcome = cpu.step().unwrap();
        assert_eq!(cpu.pc(), 0x9000);
        assert!(cpu.flag(StatusFlag::InterruptDisable));
        assert!(outcome.brk);
        assert_eq!(outcome.opcode, 0x00);
    }
}
