use colored::*;
use std::fmt;

/// Errors the core can surface from `Cpu::step`/`Cpu::run`.
///
/// Kept as a small hand-rolled enum in the style of the assembler's
/// `ParseError` rather than pulled in from a derive-macro error crate: there
/// are exactly two ways stepping the CPU can fail, and both carry enough
/// state to print a useful message without needing backtraces.
#[derive(Debug, Clone, PartialEq)]
pub enum CpuError {
    /// The fetched byte is not one of the 151 documented opcodes.
    UnknownOpcode { opcode: u8, pc: u16 },
    /// A message propagated unchanged from a fallible `Memory` implementation.
    /// `FlatMemory` never produces this; it exists for embedders whose bus
    /// can fail (an unmapped region, a device that rejects a write) and want
    /// to surface that through the CPU's error channel instead of panicking.
    Memory(String),
}

impl fmt::Display for CpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CpuError::UnknownOpcode { opcode, pc } => write!(
                f,
                "{} {} at {}",
                "unknown opcode".red(),
                format!("{:#04x}", opcode).bright_white(),
                format!("{:#06x}", pc).bright_white(),
            ),
            CpuError::Memory(message) => {
                write!(f, "{} {}", "memory error:".red(), message)
            }
        }
    }
}

impl std::error::Error for CpuError {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_display_unknown_opcode() {
        let err = CpuError::UnknownOpcode {
            opcode: 0x02,
            pc: 0x8000,
        };
        let message = format!("{}", err);
        assert!(message.contains("0x02"));
        assert!(message.contains("0x8000"));
    }
}
