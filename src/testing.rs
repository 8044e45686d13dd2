//! Test helpers: shorthand for mock transactions and a simulated register
//! store for read-back checks.

extern crate alloc;

use alloc::vec;
use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, Operation};
use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTrans};

use crate::{RegAddr, DEVICE_ADDRESS, DS3231, REGISTER_COUNT};

pub(crate) fn mock(expectations: &[I2cTrans]) -> DS3231<I2cMock> {
    DS3231::new(I2cMock::new(expectations))
}

/// Single-register read returning `value`.
pub(crate) fn read(register: RegAddr, value: u8) -> I2cTrans {
    I2cTrans::write_read(DEVICE_ADDRESS, vec![register.offset()], vec![value])
}

/// Single-register write of `value`.
pub(crate) fn write(register: RegAddr, value: u8) -> I2cTrans {
    I2cTrans::write(DEVICE_ADDRESS, vec![register.offset(), value])
}

/// In-memory DS3231 register file.
///
/// A write sets the register pointer from its first byte and stores the rest
/// with auto-increment; a read continues from the pointer. The pointer wraps
/// after the last register, like the chip's.
#[derive(Debug, Default)]
pub(crate) struct FakeDs3231 {
    pub registers: [u8; REGISTER_COUNT],
    pointer: usize,
    /// Number of transfers that stored at least one byte.
    pub writes: usize,
    /// Stores to this register fail with `ErrorKind::Other`.
    pub fail_writes_to: Option<RegAddr>,
}

impl FakeDs3231 {
    pub fn with_registers(values: &[(RegAddr, u8)]) -> Self {
        let mut fake = Self::default();
        for &(register, value) in values {
            fake.registers[usize::from(register.offset())] = value;
        }
        fake
    }

    pub fn get(&self, register: RegAddr) -> u8 {
        self.registers[usize::from(register.offset())]
    }
}

impl ErrorType for FakeDs3231 {
    type Error = ErrorKind;
}

impl I2c for FakeDs3231 {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if address != DEVICE_ADDRESS {
            return Err(ErrorKind::Other);
        }
        for operation in operations.iter_mut() {
            match operation {
                Operation::Write(bytes) => {
                    let Some((&register, data)) = bytes.split_first() else {
                        continue;
                    };
                    self.pointer = usize::from(register) % REGISTER_COUNT;
                    if data.is_empty() {
                        continue;
                    }
                    if self
                        .fail_writes_to
                        .is_some_and(|r| r.offset() == register)
                    {
                        return Err(ErrorKind::Other);
                    }
                    self.writes += 1;
                    for &byte in data.iter() {
                        self.registers[self.pointer] = byte;
                        self.pointer = (self.pointer + 1) % REGISTER_COUNT;
                    }
                }
                Operation::Read(buf) => {
                    for byte in buf.iter_mut() {
                        *byte = self.registers[self.pointer];
                        self.pointer = (self.pointer + 1) % REGISTER_COUNT;
                    }
                }
            }
        }
        Ok(())
    }
}
