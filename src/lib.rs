//! A virtual machine for a 15 bit word architecture with 8 registers, an
//! unbounded stack and 22 instructions.
//!
//! ```
//! use synvm::memory::{Memory, R0};
//! use synvm::processor::Processor;
//!
//! // add r0 40 99
//! let mem = Memory::from_image(&[0x09, 0x00, 0x00, 0x80, 0x28, 0x00, 0x63, 0x00]).unwrap();
//! let mut cpu = Processor::new(mem, std::io::empty(), std::io::sink());
//! cpu.execute().unwrap();
//! assert_eq!(cpu.memory.get(R0).unwrap(), 139);
//! ```

pub mod error;
pub mod memory;
pub mod processor;
pub mod stack;
pub mod terminal;
pub mod transcript;

pub use error::{Result, VmError};
