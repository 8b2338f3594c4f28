use std::{error, fmt, io};

use crate::memory::Word;

/// Faults that abort a run. None of them are recoverable; the machine is left
/// as it was when the fault happened.
#[derive(Debug)]
pub enum VmError {
    /// Address outside `0..=32775`, or a program counter outside ordinary memory
    AddressRange { address: usize },
    /// Value outside the range the target accepts
    ValueRange { value: usize },
    InvalidOpcode { opcode: Word, pc: Word },
    StackUnderflow,
    DivisionByZero,
    /// Malformed program image
    Load { reason: String },
    /// The input reader reached its end while an `in` was waiting
    InputExhausted,
    Io(io::Error),
}

impl fmt::Display for VmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VmError::AddressRange { address } => {
                write!(f, "address `{}` is outside of the address space", address)
            }
            VmError::ValueRange { value } => {
                write!(f, "value `{}` is not a valid word", value)
            }
            VmError::InvalidOpcode { opcode, pc } => {
                write!(f, "invalid opcode `{}` at `0x{:04x}`", opcode, pc)
            }
            VmError::StackUnderflow => f.write_str("pop from an empty stack"),
            VmError::DivisionByZero => f.write_str("modulo by zero"),
            VmError::Load { reason } => write!(f, "failed to load image: {}", reason),
            VmError::InputExhausted => f.write_str("input ended while waiting for a character"),
            VmError::Io(err) => write!(f, "i/o error: {}", err),
        }
    }
}

impl error::Error for VmError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            VmError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for VmError {
    fn from(err: io::Error) -> Self {
        VmError::Io(err)
    }
}

pub type Result<T, E = VmError> = std::result::Result<T, E>;
