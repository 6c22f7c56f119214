use crate::cpu::{Cpu, Operand};
use crate::error::CpuError;
use crate::opcodes::Mode;
use crate::status::StatusFlag;

fn read(cpu: &Cpu<'_>, operand: Operand) -> u8 {
    match operand {
        Operand::Accumulator => cpu.a(),
        Operand::Address(addr) => cpu.memory.fetch(addr),
        Operand::Immediate(_) => unreachable!("shifts never address an immediate"),
    }
}

fn shift(cpu: &mut Cpu<'_>, mode: Mode, f: impl FnOnce(u8, bool) -> (u8, bool)) -> u32 {
    let (operand, _) = cpu.resolve_operand(mode);
    let value = read(cpu, operand);
    let carry_in = cpu.flag(StatusFlag::Carry);
    let (result, carry_out) = f(value, carry_in);
    cpu.store_result(operand, result);
    cpu.set_zero_negative(result);
    cpu.set_flag(StatusFlag::Carry, carry_out);
    0
}

pub fn asl(cpu: &mut Cpu<'_>, mode: Mode) -> Result<u32, CpuError> {
    Ok(shift(cpu, mode, |value, _carry_in| {
        (value << 1, value & 0x80 != 0)
    }))
}

pub fn lsr(cpu: &mut Cpu<'_>, mode: Mode) -> Result<u32, CpuError> {
    Ok(shift(cpu, mode, |value, _carry_in| {
        (value >> 1, value & 0x01 != 0)
    }))
}

pub fn rol(cpu: &mut Cpu<'_>, mode: Mode) -> Result<u32, CpuError> {
    Ok(shift(cpu, mode, |value, carry_in| {
        let result = (value << 1) | (carry_in as u8);
        (result, value & 0x80 != 0)
    }))
}

pub fn ror(cpu: &mut Cpu<'_>, mode: Mode) -> Result<u32, CpuError> {
    Ok(shift(cpu, mode, |value, carry_in| {
        let result = (value >> 1) | ((carry_in as u8) << 7);
        (result, value & 0x01 != 0)
    }))
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
    fn test_asl_accumulator_shifts_and_sets_carry() {
        let mut memory = FlatMemory::new();
        let mut cpu = cpu_with_program(&mut memory, &[0x0A]);
        cpu.a = 0b1000_0001;
        cpu.step().unwrap();
        assert_eq!(cpu.a(), 0b0000_0010);
        assert!(cpu.flag(StatusFlag::Carry));
    }

    #[test]
    fn test_ror_pulls_carry_into_bit_seven() {
        let mut memory = FlatMemory::new();
        let mut cpu = cpu_with_program(&mut memory, &[0x6A]);
        cpu.a = 0b0000_0001;
        cpu.set_flag(StatusFlag::Carry, true);
        cpu.step().unwrap();
        assert_eq!(cpu.a(), 0b1000_0000);
        assert!(cpu.flag(StatusFlag::Carry));
    }

    #[test]
    fn test_rol_memory_operand() {
        let mut memory = FlatMemory::new();
        let mut cpu = cpu_with_program(&mut memory, &[0x26, 0x10]); // ROL $10
        cpu.memory.store(0x10, 0b0100_0000);
        cpu.step().unwrap();
        assert_eq!(cpu.memory.fetch(0x10), 0b1000_0000);
        assert!(cpu.flag(StatusFlag::Negative));
    }
}
