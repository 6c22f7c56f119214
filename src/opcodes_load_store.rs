use crate::cpu::Cpu;
use crate::error::CpuError;
use crate::opcodes::Mode;

pub fn lda(cpu: &mut Cpu<'_>, mode: Mode) -> Result<u32, CpuError> {
    let (value, crossed) = cpu.load_operand(mode);
    cpu.a = value;
    cpu.set_zero_negative(value);
    Ok(Cpu::page_cross_penalty(mode, crossed))
}

pub fn ldx(cpu: &mut Cpu<'_>, mode: Mode) -> Result<u32, CpuError> {
    let (value, crossed) = cpu.load_operand(mode);
    cpu.x = value;
    cpu.set_zero_negative(value);
    Ok(Cpu::page_cross_penalty(mode, crossed))
}

pub fn ldy(cpu: &mut Cpu<'_>, mode: Mode) -> Result<u32, CpuError> {
    let (value, crossed) = cpu.load_operand(mode);
    cpu.y = value;
    cpu.set_zero_negative(value);
    Ok(Cpu::page_cross_penalty(mode, crossed))
}

pub fn sta(cpu: &mut Cpu<'_>, mode: Mode) -> Result<u32, CpuError> {
    let (operand, _) = cpu.resolve_operand(mode);
    let a = cpu.a;
    cpu.store_result(operand, a);
    Ok(0)
}

pub fn stx(cpu: &mut Cpu<'_>, mode: Mode) -> Result<u32, CpuError> {
    let (operand, _) = cpu.resolve_operand(mode);
    let x = cpu.x;
    cpu.store_result(operand, x);
    Ok(0)
}

pub fn sty(cpu: &mut Cpu<'_>, mode: Mode) -> Result<u32, CpuError> {
    let (operand, _) = cpu.resolve_operand(mode);
    let y = cpu.y;
    cpu.store_result(operand, y);
    Ok(0)
}

pub fn tax(cpu: &mut Cpu<'_>, _mode: Mode) -> Result<u32, CpuError> {
    cpu.x = cpu.a;
    let x = cpu.x;
    cpu.set_zero_negative(x);
    Ok(0)
}

pub fn tay(cpu: &mut Cpu<'_>, _mode: Mode) -> Result<u32, CpuError> {
    cpu.y = cpu.a;
    let y = cpu.y;
    cpu.set_zero_negative(y);
    Ok(0)
}

pub fn txa(cpu: &mut Cpu<'_>, _mode: Mode) -> Result<u32, CpuError> {
    cpu.a = cpu.x;
    let a = cpu.a;
    cpu.set_zero_negative(a);
    Ok(0)
}

pub fn tya(cpu: &mut Cpu<'_>, _mode: Mode) -> Result<u32, CpuError> {
    cpu.a = cpu.y;
    let a = cpu.a;
    cpu.set_zero_negative(a);
    Ok(0)
}

pub fn tsx(cpu: &mut Cpu<'_>, _mode: Mode) -> Result<u32, CpuError> {
    cpu.x = cpu.sp;
    let x = cpu.x;
    cpu.set_zero_negative(x);
    Ok(0)
}

/// Unlike every other transfer, TXS never touches the flags -- SP isn't a
/// value register, it's the stack pointer.
pub fn txs(cpu: &mut Cpu<'_>, _mode: Mode) -> Result<u32, CpuError> {
    cpu.sp = cpu.x;
    Ok(0)
}

pub fn pha(cpu: &mut Cpu<'_>, _mode: Mode) -> Result<u32, CpuError> {
    let a = cpu.a;
    cpu.push_u8(a);
    Ok(0)
}

pub fn pla(cpu: &mut Cpu<'_>, _mode: Mode) -> Result<u32, CpuError> {
    let value = cpu.pull_u8();
    cpu.a = value;
    cpu.set_zero_negative(value);
    Ok(0)
}

pub fn php(cpu: &mut Cpu<'_>, _mode: Mode) -> Result<u32, CpuError> {
    let pushed = crate::status::with_break_push_bits(cpu.p);
    cpu.push_u8(pushed);
    Ok(0)
}

pub fn plp(cpu: &mut Cpu<'_>, _mode: Mode) -> Result<u32, CpuError> {
    let pulled = cpu.pull_u8();
    cpu.p = crate::status::with_irq_push_bits(pulled);
    Ok(0)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::memory::FlatMemory;
    use crate::status::StatusFlag;

    fn cpu_with_program(memory: &mut FlatMemory, program: &[u8]) -> Cpu<'_> {
        memory.store(0xFFFC, 0x00);
        memory.store(0xFFFD, 0x80);
        memory.load_image(program, 0x8000);
        Cpu::new(memory)
    }

    #[test]
    fn test_lda_immediate_sets_zero_flag() {
        let mut memory = FlatMemory::new();
        let mut cpu = cpu_with_program(&mut memory, &[0xA9, 0x00]);
        cpu.step().unwrap();
        assert_eq!(cpu.a(), 0x00);
        assert!(cpu.flag(StatusFlag::Zero));
    }

    #[test]
    fn test_lda_absolute_x_page_cross_costs_extra_cycle() {
        let mut memory = FlatMemory::new();
        let mut cpu = cpu_with_program(&mut memory, &[0xBD, 0xFF, 0x00]);
        cpu.x = 0x01; // $00FF + 1 crosses into page 1
        let outcome = cpu.step().unwrap();
        assert_eq!(outcome.cycles, 5);
    }

    #[test]
    fn test_sta_absolute_stores_accumulator() {
        let mut memory = FlatMemory::new();
        let mut cpu = cpu_with_program(&mut memory, &[0x8D, 0x00, 0x02]);
        cpu.a = 0x77;
        cpu.step().unwrap();
        assert_eq!(cpu.memory.fetch(0x0200), 0x77);
    }

    #[test]
    fn test_pha_pla_roundtrip() {
        let mut memory = FlatMemory::new();
        let mut cpu = cpu_with_program(&mut memory, &[0x48, 0xA9, 0x00, 0x68]);
        cpu.a = 0x55;
        cpu.step().unwrap(); // PHA
        cpu.step().unwrap(); // LDA #0
        cpu.step().unwrap(); // PLA
        assert_eq!(cpu.a(), 0x55);
    }
}
