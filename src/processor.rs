use std::io::{BufRead, Write};

use crate::error::{Result, VmError};
use crate::memory::{Memory, Word, MAX_VALUE, MODULO};
use crate::stack::Stack;
use crate::terminal::Terminal;
use crate::transcript::Transcript;
use log::*;
use num_enum::IntoPrimitive;
use num_enum::TryFromPrimitive;

/// What `ret` does when there is nothing to return to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyReturn {
    /// Stop the program as if `halt` was executed
    #[default]
    Halt,
    /// Fail with [`VmError::StackUnderflow`], like `pop`
    Fault,
}

/// Emulates the CPU. Owns all state of a single run.
#[derive(Debug)]
pub struct Processor<R, W> {
    pub memory: Memory,
    pub stack: Stack,
    terminal: Terminal<R, W>,
    /// Termination flag. Set once the program halts
    halted: bool,
    empty_return: EmptyReturn,
}

impl<R: BufRead, W: Write> Processor<R, W> {
    /// Initializes a CPU running `memory` from its current program counter
    pub fn new(memory: Memory, input: R, output: W) -> Self {
        Self {
            memory,
            stack: Stack::default(),
            terminal: Terminal::new(input, output),
            halted: false,
            empty_return: EmptyReturn::default(),
        }
    }

    pub fn with_empty_return(mut self, empty_return: EmptyReturn) -> Self {
        self.empty_return = empty_return;
        self
    }

    /// Records all input and output in a [`Transcript`]
    pub fn with_transcript(mut self) -> Self {
        self.terminal.record_transcript();
        self
    }

    /// Feeds `lines` to `in` before anything is read from the input
    pub fn with_replay<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.terminal.queue_lines(lines);
        self
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn output(&self) -> &W {
        self.terminal.output()
    }

    pub fn transcript(&self) -> Option<&Transcript> {
        self.terminal.transcript()
    }

    /// Executes a single, already decoded instruction. `args` holds the
    /// operands in encoding order, dereferenced where the instruction asks for
    /// it; unused slots are 0.
    pub fn execute_instruction(&mut self, instruction: Instruction, args: [Word; 3]) -> Result<()> {
        let [a, b, c] = args;

        match instruction {
            Instruction::HALT => {
                self.halted = true;

                debug!("{}", instruction);
            }
            Instruction::SET => {
                self.memory.set(a, b)?;

                debug!("{} {} {}", instruction, a, b);
            }
            Instruction::PUSH => {
                self.stack.push(a)?;

                debug!("{} {}", instruction, a);
            }
            Instruction::POP => {
                let value = self.stack.pop()?;
                self.memory.set(a, value)?;

                debug!("{} {}: {}", instruction, a, value);
            }
            Instruction::EQ => {
                let result = (b == c) as Word;
                self.memory.set(a, result)?;

                debug!("{} {} {} {}: {}", instruction, a, b, c, result);
            }
            Instruction::GT => {
                let result = (b > c) as Word;
                self.memory.set(a, result)?;

                debug!("{} {} {} {}: {}", instruction, a, b, c, result);
            }
            Instruction::JMP => {
                self.memory.jump(a)?;

                debug!("{} {}", instruction, a);
            }
            Instruction::JT => {
                if a != 0 {
                    self.memory.jump(b)?;
                }

                debug!("{} {} {}", instruction, a, b);
            }
            Instruction::JF => {
                if a == 0 {
                    self.memory.jump(b)?;
                }

                debug!("{} {} {}", instruction, a, b);
            }
            Instruction::ADD => {
                let result = ((b as u32 + c as u32) % MODULO) as Word;
                self.memory.set(a, result)?;

                debug!("{} {} {} {}: {}", instruction, a, b, c, result);
            }
            Instruction::MULT => {
                let result = ((b as u32 * c as u32) % MODULO) as Word;
                self.memory.set(a, result)?;

                debug!("{} {} {} {}: {}", instruction, a, b, c, result);
            }
            Instruction::MOD => {
                if c == 0 {
                    return Err(VmError::DivisionByZero);
                }
                let result = b % c;
                self.memory.set(a, result)?;

                debug!("{} {} {} {}: {}", instruction, a, b, c, result);
            }
            Instruction::AND => {
                let result = b & c;
                self.memory.set(a, result)?;

                debug!("{} {} {} {}: {}", instruction, a, b, c, result);
            }
            Instruction::OR => {
                let result = b | c;
                self.memory.set(a, result)?;

                debug!("{} {} {} {}: {}", instruction, a, b, c, result);
            }
            Instruction::NOT => {
                let result = b ^ MAX_VALUE;
                self.memory.set(a, result)?;

                debug!("{} {} {}: {}", instruction, a, b, result);
            }
            Instruction::RMEM => {
                let value = self.memory.get(b)?;
                self.memory.set(a, value)?;

                debug!("{} {} {}: {}", instruction, a, b, value);
            }
            Instruction::WMEM => {
                // `a` arrives dereferenced, so a register holding an address
                // writes to that address
                self.memory.set(a, b)?;

                debug!("{} {} {}", instruction, a, b);
            }
            Instruction::CALL => {
                self.stack.push(self.memory.pc())?;
                self.memory.jump(a)?;

                debug!("{} {}", instruction, a);
            }
            Instruction::RET => {
                if self.stack.is_empty() && self.empty_return == EmptyReturn::Halt {
                    self.halted = true;

                    debug!("{}: empty stack, halting", instruction);
                } else {
                    let address = self.stack.pop()?;
                    self.memory.jump(address)?;

                    debug!("{} {}", instruction, address);
                }
            }
            Instruction::OUT => {
                self.terminal.write_char(a)?;

                trace!("{} {}", instruction, a);
            }
            Instruction::IN => {
                let code = self.terminal.read_char()?;
                self.memory.set(a, code)?;

                debug!("{} {}: {}", instruction, a, code);
            }
            Instruction::NOOP => {
                trace!("{}", instruction);
            }
        }

        Ok(())
    }

    /// Runs one execution step. Does nothing once the program has halted.
    pub fn execute(&mut self) -> Result<()> {
        if self.halted {
            return Ok(());
        }

        let pc = self.memory.pc();
        // opcodes are never register references
        let opcode = self.memory.pop_argument(false)?;
        let instruction =
            Instruction::try_from(opcode).map_err(|_| VmError::InvalidOpcode { opcode, pc })?;

        let mut args = [0; 3];
        for (arg, operand) in args.iter_mut().zip(instruction.operands()) {
            *arg = self.memory.pop_argument(operand.dereferences())?;
        }

        self.execute_instruction(instruction, args)
    }

    /// Run program until it halts or faults. Output is flushed either way.
    pub fn execute_until_halt(&mut self) -> Result<()> {
        let mut result = Ok(());
        while !self.halted {
            result = self.execute();
            if result.is_err() {
                break;
            }
        }

        let flushed = self.terminal.flush();
        result.and(flushed)?;

        info!("Program halted at 0x{:04X}", self.memory.pc());

        Ok(())
    }
}

/// How an operand word is turned into the value an instruction works with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    /// A literal, or a register whose contents are used
    Value,
    /// A location to write to, used as is
    Destination,
}

impl Operand {
    pub fn dereferences(self) -> bool {
        self == Operand::Value
    }
}

macro_rules! instructions {
    ( $( $( #[doc = $doc:expr] )+ $name:ident = $repr:literal [ $( $operand:ident ),* ] , )+ ) => {
        /// Defines the instructions together with the operands following them
        #[repr(u16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
        #[derive(TryFromPrimitive, IntoPrimitive)]
        pub enum Instruction {
            $(
                $( #[doc = $doc] )+
                $name = $repr,
            )+
        }

        impl Instruction {
            pub const ALL: &'static [Self] = &[
                $( Self::$name , )+
            ];

            /// Operands in the order they are encoded after the opcode
            pub fn operands(&self) -> &'static [Operand] {
                match self {
                    $( Self::$name => &[ $( Operand::$operand ),* ] , )+
                }
            }
        }

        impl ::std::fmt::Display for Instruction {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self {
                    $( Self::$name => f.write_str(stringify!($name)) , )+
                }
            }
        }
    }
}

instructions! {
    /// Stop execution and terminate the program
    HALT = 0 [],
    /// Set <a> to the value of <b>
    SET = 1 [Destination, Value],
    /// Push <a> onto the stack
    PUSH = 2 [Value],
    /// Remove the top of the stack and write it into <a>
    POP = 3 [Destination],
    /// Set <a> to 1 if <b> is equal to <c>, to 0 otherwise
    EQ = 4 [Destination, Value, Value],
    /// Set <a> to 1 if <b> is greater than <c>, to 0 otherwise
    GT = 5 [Destination, Value, Value],
    /// Jump to <a>
    JMP = 6 [Value],
    /// Jump to <b> if <a> is nonzero
    JT = 7 [Value, Value],
    /// Jump to <b> if <a> is zero
    JF = 8 [Value, Value],
    /// Store into <a> the sum of <b> and <c> modulo 32768
    ADD = 9 [Destination, Value, Value],
    /// Store into <a> the product of <b> and <c> modulo 32768
    MULT = 10 [Destination, Value, Value],
    /// Store into <a> the remainder of <b> divided by <c>
    MOD = 11 [Destination, Value, Value],
    /// Store into <a> the bitwise and of <b> and <c>
    AND = 12 [Destination, Value, Value],
    /// Store into <a> the bitwise or of <b> and <c>
    OR = 13 [Destination, Value, Value],
    /// Store into <a> the 15 bit inverse of <b>
    NOT = 14 [Destination, Value],
    /// Read memory at address <b> and write it to <a>
    RMEM = 15 [Destination, Value],
    /// Write <b> into memory at address <a>.
    /// Both operands are dereferenced, unlike every other destination.
    WMEM = 16 [Value, Value],
    /// Push the address of the next instruction and jump to <a>
    CALL = 17 [Value],
    /// Pop an address from the stack and jump to it
    RET = 18 [],
    /// Write the character with code <a> to the output
    OUT = 19 [Value],
    /// Read one input character code into <a>
    IN = 20 [Destination],
    /// No operation
    NOOP = 21 [],
}
