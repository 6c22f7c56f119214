/// Bit positions of the 6502 processor status register "P".
///
/// http://wiki.nesdev.com/w/index.php/Status_flags
///
///   7  bit  0
/// ---- ----
/// NVUB DIZC
/// |||| ||||
/// |||| |||+- Carry
/// |||| ||+-- Zero
/// |||| |+--- Interrupt Disable
/// |||| +---- Decimal
/// |||+------ Break
/// ||+------- Unused, always reads back as 1
/// |+-------- Overflow
/// +--------- Negative
#[rustfmt::skip]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatusFlag {
    Carry            = 0b0000_0001,
    Zero             = 0b0000_0010,
    InterruptDisable = 0b0000_0100,
    Decimal          = 0b0000_1000,
    Break            = 0b0001_0000,
    Unused           = 0b0010_0000,
    Overflow         = 0b0100_0000,
    Negative         = 0b1000_0000,
}

/// The status byte immediately after a reset: I and the always-on Unused bit set.
pub const RESET_STATUS_FLAG: u8 = StatusFlag::InterruptDisable as u8 | StatusFlag::Unused as u8;

/// Sets or clears `flag` within `p`.
pub fn set_flag(p: u8, flag: StatusFlag, value: bool) -> u8 {
    if value {
        p | flag as u8
    } else {
        p & !(flag as u8)
    }
}

/// Reads whether `flag` is set within `p`.
pub fn is_flag_set(p: u8, flag: StatusFlag) -> bool {
    let bit = flag as u8;
    p & bit == bit
}

/// Forces the Unused bit on and clears Break, the shape the status register
/// takes while it's sitting in the CPU's `p` field after an interrupt or RTI.
pub fn with_irq_push_bits(p: u8) -> u8 {
    set_flag(set_flag(p, StatusFlag::Break, false), StatusFlag::Unused, true)
}

/// Forces the Unused bit and Break both on, the shape of the byte actually
/// pushed to the stack by BRK or PHP.
pub fn with_break_push_bits(p: u8) -> u8 {
    set_flag(set_flag(p, StatusFlag::Break, true), StatusFlag::Unused, true)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_set_and_read_flag() {
        let mut p = 0u8;
        p = set_flag(p, StatusFlag::Carry, true);
        assert!(is_flag_set(p, StatusFlag::Carry));
        p = set_flag(p, StatusFlag::Carry, false);
        assert!(!is_flag_set(p, StatusFlag::Carry));
    }

    #[test]
    fn test_break_push_bits() {
        let p = with_break_push_bits(0b0000_0000);
        assert_eq!(p, 0b0011_0000);
    }

    #[test]
    fn test_irq_push_bits() {
        let p = with_irq_push_bits(0b0001_1111);
        assert_eq!(p, 0b0010_1111);
    }
}
