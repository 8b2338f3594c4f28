use crate::error::{Result, VmError};

pub mod load;

pub type Byte = u8; // 1 byte
pub type Word = u16; // 15 bits used

/// Arithmetic wraps around at this value
pub const MODULO: u32 = 32768;
/// Largest value a word may hold
pub const MAX_VALUE: Word = 32767;
/// First address of the register alias range
pub const REGISTER_BASE: Word = 32768;
pub const REGISTER_COUNT: usize = 8;
/// Last valid address, the alias of R7
pub const MAX_ADDRESS: Word = REGISTER_BASE + REGISTER_COUNT as Word - 1;

pub const R0: Word = REGISTER_BASE;
pub const R1: Word = REGISTER_BASE + 1;
pub const R2: Word = REGISTER_BASE + 2;
pub const R3: Word = REGISTER_BASE + 3;
pub const R4: Word = REGISTER_BASE + 4;
pub const R5: Word = REGISTER_BASE + 5;
pub const R6: Word = REGISTER_BASE + 6;
pub const R7: Word = REGISTER_BASE + 7;

/// Word addressed memory with the eight registers mapped directly above it.
/// Also owns the program counter, since operands are consumed through it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Memory {
    /// Memory cells followed by the registers
    data: Vec<Word>,
    /// Program counter
    pc: Word,
}

impl Default for Memory {
    /// Initializes zeroed memory with the program counter at 0
    fn default() -> Self {
        Memory {
            data: vec![0; MAX_ADDRESS as usize + 1],
            pc: 0,
        }
    }
}

impl Memory {
    /// Returns true if `address` is one of the register aliases
    pub fn is_register(address: Word) -> bool {
        (REGISTER_BASE..=MAX_ADDRESS).contains(&address)
    }

    /// Reads the word at `address`. Never written cells read as 0.
    pub fn get(&self, address: Word) -> Result<Word> {
        check_address(address)?;
        Ok(self.data[address as usize])
    }

    /// Writes `value` to `address`. Nothing is written if either is out of range.
    pub fn set(&mut self, address: Word, value: Word) -> Result<()> {
        check_address(address)?;
        if value > MAX_VALUE {
            return Err(VmError::ValueRange {
                value: value as usize,
            });
        }

        self.data[address as usize] = value;
        Ok(())
    }

    pub fn get_register(&self, index: usize) -> Result<Word> {
        self.get(register_address(index)?)
    }

    pub fn set_register(&mut self, index: usize, value: Word) -> Result<()> {
        self.set(register_address(index)?, value)
    }

    /// Resolves a register alias to the register's contents. Anything else is
    /// returned unchanged.
    pub fn dereference(&self, value: Word) -> Word {
        if Self::is_register(value) {
            self.data[value as usize]
        } else {
            value
        }
    }

    /// Address of the next word to fetch
    pub fn pc(&self) -> Word {
        self.pc
    }

    /// Moves the program counter to `address`, which has to be ordinary memory
    pub fn jump(&mut self, address: Word) -> Result<()> {
        if address > MAX_VALUE {
            return Err(VmError::AddressRange {
                address: address as usize,
            });
        }

        self.pc = address;
        Ok(())
    }

    /// Fetches the word under the program counter and advances it. Value
    /// operands pass `dereference = true`, destination operands keep the raw
    /// address.
    pub fn pop_argument(&mut self, dereference: bool) -> Result<Word> {
        if self.pc > MAX_VALUE {
            return Err(VmError::AddressRange {
                address: self.pc as usize,
            });
        }

        let word = self.data[self.pc as usize];
        self.pc += 1;

        if dereference {
            Ok(self.dereference(word))
        } else {
            Ok(word)
        }
    }

    /// Writes a block of encoded words starting at `position`.
    ///
    /// Unlike [`Memory::set`] the words may be register references, since
    /// instruction operands are stored that way. The whole block is checked
    /// before anything is written.
    pub fn write_program(&mut self, position: Word, words: &[Word]) -> Result<()> {
        let end = position as usize + words.len();
        if end > REGISTER_BASE as usize {
            return Err(VmError::AddressRange { address: end - 1 });
        }
        if let Some(&word) = words.iter().find(|&&word| word > MAX_ADDRESS) {
            return Err(VmError::ValueRange {
                value: word as usize,
            });
        }

        self.data[position as usize..end].copy_from_slice(words);
        Ok(())
    }
}

fn check_address(address: Word) -> Result<()> {
    if address > MAX_ADDRESS {
        Err(VmError::AddressRange {
            address: address as usize,
        })
    } else {
        Ok(())
    }
}

fn register_address(index: usize) -> Result<Word> {
    if index < REGISTER_COUNT {
        Ok(REGISTER_BASE + index as Word)
    } else {
        Err(VmError::AddressRange {
            address: REGISTER_BASE as usize + index,
        })
    }
}

/// Writes a block of instruction words directly into the memory
#[macro_export]
macro_rules! write_program {
    ( $mem:ident : $pos:expr => $( $word:expr ),+ ) => {
        $mem.write_program($pos, &[
            $(
                $word as $crate::memory::Word,
            )+
        ])
    };
}

#[cfg(test)]
mod tests {
    use crate::processor::Instruction;

    use super::*;
    use color_eyre::eyre::Result;

    #[test]
    fn test_unwritten_reads_zero() -> Result<()> {
        let mem = Memory::default();
        assert_eq!(mem.get(0)?, 0);
        assert_eq!(mem.get(MAX_VALUE)?, 0);
        assert_eq!(mem.get(R7)?, 0);

        Ok(())
    }

    #[test]
    fn test_set_and_get() -> Result<()> {
        let mut mem = Memory::default();
        mem.set(0x44, 12)?;
        assert_eq!(mem.get(0x44)?, 12);

        Ok(())
    }

    #[test]
    fn test_set_out_of_range() -> Result<()> {
        let mut mem = Memory::default();

        assert!(matches!(
            mem.set(MAX_ADDRESS + 1, 1),
            Err(VmError::AddressRange { address: 32776 })
        ));
        assert!(matches!(
            mem.set(0x10, MAX_VALUE + 1),
            Err(VmError::ValueRange { value: 32768 })
        ));
        assert!(matches!(mem.get(u16::MAX), Err(VmError::AddressRange { .. })));
        assert_eq!(mem, Memory::default());

        Ok(())
    }

    #[test]
    fn test_is_register() {
        for address in 32768..32776 {
            assert!(Memory::is_register(address));
        }

        assert!(!Memory::is_register(32768 - 1));
        assert!(!Memory::is_register(32775 + 1));
        assert!(!Memory::is_register(32775 + 2));
        assert!(!Memory::is_register(0));
    }

    #[test]
    fn test_register_aliasing() -> Result<()> {
        let mut mem = Memory::default();

        for (index, address) in (R0..=R7).enumerate() {
            mem.set(address, index as Word * 100)?;
            assert_eq!(mem.get_register(index)?, index as Word * 100);
        }

        mem.set_register(3, 7)?;
        assert_eq!(mem.get(R3)?, 7);
        assert!(mem.get_register(8).is_err());

        Ok(())
    }

    #[test]
    fn test_dereference() -> Result<()> {
        let mut mem = Memory::default();
        mem.set_register(2, 1234)?;
        mem.set(42, 99)?;

        assert_eq!(mem.dereference(R2), 1234);
        // plain addresses are not looked up
        assert_eq!(mem.dereference(42), 42);
        assert_eq!(mem.dereference(MAX_VALUE), MAX_VALUE);

        Ok(())
    }

    #[test]
    fn test_pop_argument() -> Result<()> {
        let mut mem = Memory::default();
        mem.set_register(0, 55)?;
        write_program!(mem : 0 => R0, R0, 7)?;

        assert_eq!(mem.pop_argument(false)?, R0);
        assert_eq!(mem.pop_argument(true)?, 55);
        assert_eq!(mem.pop_argument(true)?, 7);
        assert_eq!(mem.pc(), 3);

        Ok(())
    }

    #[test]
    fn test_pop_argument_past_memory() -> Result<()> {
        let mut mem = Memory::default();
        mem.jump(MAX_VALUE)?;
        mem.pop_argument(false)?;

        assert!(matches!(
            mem.pop_argument(false),
            Err(VmError::AddressRange { address: 32768 })
        ));

        Ok(())
    }

    #[test]
    fn test_jump_into_registers() {
        let mut mem = Memory::default();
        assert!(matches!(mem.jump(R0), Err(VmError::AddressRange { .. })));
        assert_eq!(mem.pc(), 0);
    }

    #[test]
    fn test_write_program() -> Result<()> {
        let mut mem = Memory::default();

        mem.write_program(
            0x1FFF,
            &[
                Instruction::ADD as Word,
                R0,
                40,
                99,
                Instruction::HALT as Word,
            ],
        )?;

        let mut mem2 = Memory::default();
        use crate::processor::Instruction::*;
        write_program!(mem2 : 0x1FFF => ADD, R0, 40, 99, HALT)?;

        assert_eq!(mem, mem2);
        assert_eq!(mem.get(0x2000)?, R0);

        Ok(())
    }

    #[test]
    fn test_write_program_rejects_invalid_words() {
        let mut mem = Memory::default();

        assert!(mem.write_program(0, &[1, 2, MAX_ADDRESS + 1]).is_err());
        assert!(mem.write_program(MAX_VALUE, &[1, 2]).is_err());
        assert_eq!(mem, Memory::default());
    }
}
