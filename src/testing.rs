//! Register-file fake of the AXP20x for state-machine tests

use crate::registers::{AXP20X_IRQ1_STATE, AXP20X_IRQ_BANKS};
use core::ops::RangeInclusive;
use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, Operation};

/// IRQ status registers are write-1-to-clear
const IRQ_STATUS: RangeInclusive<u8> =
    AXP20X_IRQ1_STATE..=AXP20X_IRQ1_STATE + AXP20X_IRQ_BANKS as u8 - 1;

/// 256 byte register file behind an I2C interface
///
/// Reads and writes auto-increment the register pointer like the real
/// part. A register marked with `fail_on` makes any transaction touching it
/// fail with `ErrorKind::Other`.
pub struct FakeBus {
    regs: [u8; 256],
    failing: Option<u8>,
    writes: usize,
    transactions: usize,
}

impl FakeBus {
    pub fn new() -> Self {
        Self {
            regs: [0; 256],
            failing: None,
            writes: 0,
            transactions: 0,
        }
    }

    pub fn set(&mut self, reg: u8, value: u8) {
        self.regs[reg as usize] = value;
    }

    pub fn get(&self, reg: u8) -> u8 {
        self.regs[reg as usize]
    }

    /// Store a 12-bit ADC value across its high and low registers
    pub fn set_adc(&mut self, reg: u8, raw: u16) {
        self.set(reg, (raw >> 4) as u8);
        self.set(reg + 1, (raw & 0x0F) as u8);
    }

    pub fn fail_on(&mut self, reg: u8) {
        self.failing = Some(reg);
    }

    pub fn heal(&mut self) {
        self.failing = None;
    }

    /// Number of register writes seen so far
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// Number of bus transactions seen so far
    pub fn transactions(&self) -> usize {
        self.transactions
    }
}

impl ErrorType for FakeBus {
    type Error = ErrorKind;
}

impl I2c for FakeBus {
    fn transaction(
        &mut self,
        _address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.transactions += 1;
        let mut pointer = 0u8;
        for operation in operations.iter_mut() {
            match operation {
                Operation::Write(bytes) => {
                    let Some((&reg, data)) = bytes.split_first() else {
                        continue;
                    };
                    pointer = reg;
                    if self.failing == Some(reg) {
                        return Err(ErrorKind::Other);
                    }
                    for &byte in data {
                        let slot = &mut self.regs[pointer as usize];
                        if IRQ_STATUS.contains(&pointer) {
                            *slot &= !byte;
                        } else {
                            *slot = byte;
                        }
                        self.writes += 1;
                        pointer = pointer.wrapping_add(1);
                    }
                }
                Operation::Read(buf) => {
                    for byte in buf.iter_mut() {
                        if self.failing == Some(pointer) {
                            return Err(ErrorKind::Other);
                        }
                        *byte = self.regs[pointer as usize];
                        pointer = pointer.wrapping_add(1);
                    }
                }
            }
        }
        Ok(())
    }
}
