use color_eyre::eyre::Result;

use synvm::memory::{Memory, Word, R0, R1, R2};
use synvm::processor::Processor;
use synvm::write_program;
use log::LevelFilter;
use simple_logger::SimpleLogger;

/// The main entrypoint. First instruction should be placed here.
const ENTRYPOINT: Word = 0x0000;

fn main() -> Result<()> {
    color_eyre::install()?; // rust error handling
    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .init()
        .unwrap(); // logging

    let mut mem = Memory::default();

    use synvm::processor::Instruction::*;
    write_program!(mem : ENTRYPOINT =>
        SET, R0, 10,            // 0
        ADD, R1, R0, '0',       // 3
        EQ, R2, R0, 10,         // 7
        JF, R2, 19,             // 11
        OUT, '1',               // 14
        SET, R1, '0',           // 16
        OUT, R1,                // 19
        OUT, '\n',              // 21
        ADD, R0, R0, 32767,     // 23
        JT, R0, 3,              // 27
        HALT                    // 30
    )?;

    let mut cpu = Processor::new(mem, std::io::empty(), std::io::stdout());
    cpu.execute_until_halt()?;

    Ok(())
}
