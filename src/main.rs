use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{eyre, Result, WrapErr};
use log::*;
use simple_logger::SimpleLogger;

use synvm::memory::{Memory, Word};
use synvm::processor::{EmptyReturn, Processor};
use synvm::transcript::Transcript;

/// Runs a program image on the virtual machine
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Program image made of little endian 16 bit words
    image: PathBuf,

    /// Address the image is loaded at. Execution always starts at 0
    #[arg(long, default_value_t = 0)]
    base: Word,

    /// Replay the lines of this file as input before reading stdin
    #[arg(long, value_name = "PATH")]
    input: Option<PathBuf>,

    /// Write a transcript of the session to this file when the run ends
    #[arg(long, value_name = "PATH")]
    transcript: Option<PathBuf>,

    /// Write the submitted input lines to this file when the run ends, in the
    /// format `--input` replays
    #[arg(long, value_name = "PATH")]
    replay_out: Option<PathBuf>,

    /// Fail on `ret` with an empty stack instead of halting
    #[arg(long, default_value_t = false)]
    strict_ret: bool,

    /// Log level filter. Log lines are written to stdout along with the
    /// program's output
    #[arg(long, default_value = "warn")]
    log_level: LevelFilter,
}

fn main() -> Result<()> {
    color_eyre::install()?; // rust error handling
    let args = Args::parse();

    SimpleLogger::new()
        .with_level(args.log_level)
        .init()
        .map_err(|err| eyre!("failed to install logger: {}", err))?; // logging

    let image = fs::read(&args.image)
        .wrap_err_with(|| format!("Failed to read {}", args.image.display()))?;
    let mut mem = Memory::default();
    mem.load_image(&image, args.base)
        .wrap_err_with(|| format!("Failed to load {}", args.image.display()))?;

    let replay = match &args.input {
        Some(path) => {
            let text = fs::read_to_string(path)
                .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
            Transcript::read_inputs(&text)
        }
        None => Vec::new(),
    };

    let empty_return = if args.strict_ret {
        EmptyReturn::Fault
    } else {
        EmptyReturn::Halt
    };

    let mut cpu = Processor::new(mem, io::stdin().lock(), io::stdout().lock())
        .with_empty_return(empty_return)
        .with_replay(replay);
    if args.transcript.is_some() || args.replay_out.is_some() {
        cpu = cpu.with_transcript();
    }

    let result = cpu.execute_until_halt();
    if let Err(err) = &result {
        error!("Execution stopped at 0x{:04X}: {}", cpu.memory.pc(), err);
    }

    // transcripts are written whether the program halted or not
    if let (Some(path), Some(transcript)) = (&args.transcript, cpu.transcript()) {
        let file = File::create(path)
            .wrap_err_with(|| format!("Failed to create {}", path.display()))?;
        transcript.write_to(BufWriter::new(file))?;
        info!("Transcript written to {}", path.display());
    }
    if let (Some(path), Some(transcript)) = (&args.replay_out, cpu.transcript()) {
        let file = File::create(path)
            .wrap_err_with(|| format!("Failed to create {}", path.display()))?;
        transcript.write_inputs_to(BufWriter::new(file))?;
        info!("Input lines written to {}", path.display());
    }

    result.wrap_err_with(|| format!("Program faulted at 0x{:04X}", cpu.memory.pc()))?;

    Ok(())
}
