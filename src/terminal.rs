use std::collections::VecDeque;
use std::io::{BufRead, Write};

use log::*;

use crate::error::{Result, VmError};
use crate::memory::{Word, MAX_VALUE};
use crate::transcript::Transcript;

/// Character code appended to every input line
const NEWLINE: u32 = '\n' as u32;

/// The machine's view of the outside world: characters go out one at a time,
/// input arrives a whole line at a time and is handed out one code per `in`.
#[derive(Debug)]
pub struct Terminal<R, W> {
    input: R,
    output: W,
    /// Codes of the current line which were not read yet
    pending: VecDeque<u32>,
    /// Whole lines handed out before `input` is read
    replay: VecDeque<String>,
    transcript: Option<Transcript>,
}

impl<R: BufRead, W: Write> Terminal<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            pending: VecDeque::new(),
            replay: VecDeque::new(),
            transcript: None,
        }
    }

    /// Queues `lines` to be read, each as its own line, before any input
    pub fn queue_lines<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.replay.extend(lines.into_iter().map(Into::into));
    }

    /// Starts recording everything going through the terminal
    pub fn record_transcript(&mut self) {
        self.transcript.get_or_insert_with(Transcript::default);
    }

    pub fn transcript(&self) -> Option<&Transcript> {
        self.transcript.as_ref()
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    /// Writes the character with code point `code`
    pub fn write_char(&mut self, code: Word) -> Result<()> {
        let c = char::from_u32(code as u32).unwrap_or_else(|| {
            warn!("Code {} is not a character, writing U+FFFD", code);
            char::REPLACEMENT_CHARACTER
        });

        let mut buf = [0; 4];
        let text = c.encode_utf8(&mut buf);
        self.output.write_all(text.as_bytes())?;

        if let Some(transcript) = &mut self.transcript {
            transcript.log_output(text);
        }

        Ok(())
    }

    /// Returns the next input character code, blocking for a new line once
    /// the current one is used up.
    pub fn read_char(&mut self) -> Result<Word> {
        if self.pending.is_empty() {
            self.refill()?;
        }

        let code = self.pending.pop_front().ok_or(VmError::InputExhausted)?;
        if code > MAX_VALUE as u32 {
            return Err(VmError::ValueRange {
                value: code as usize,
            });
        }

        Ok(code as Word)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.output.flush()?;
        Ok(())
    }

    fn refill(&mut self) -> Result<()> {
        // anything printed so far is probably the prompt
        self.flush()?;

        let mut line = match self.replay.pop_front() {
            Some(line) => line,
            None => {
                let mut line = String::new();
                if self.input.read_line(&mut line)? == 0 {
                    return Err(VmError::InputExhausted);
                }
                line
            }
        };

        if line.ends_with('\n') {
            line.pop();
        }
        if line.ends_with('\r') {
            line.pop();
        }
        debug!("Input line {:?}", line);

        if let Some(transcript) = &mut self.transcript {
            transcript.log_input(&line);
        }

        self.pending.extend(line.chars().map(|c| c as u32));
        self.pending.push_back(NEWLINE);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::transcript::Entry;

    use super::*;
    use color_eyre::eyre::Result;

    fn read_all<R: BufRead, W: Write>(terminal: &mut Terminal<R, W>, count: usize) -> Result<String> {
        let mut text = String::new();
        for _ in 0..count {
            let code = terminal.read_char()?;
            text.push(char::from_u32(code as u32).unwrap());
        }
        Ok(text)
    }

    #[test]
    fn lines_end_with_newline() -> Result<()> {
        let mut terminal = Terminal::new("go\nno\n".as_bytes(), Vec::new());

        assert_eq!(read_all(&mut terminal, 6)?, "go\nno\n");
        assert!(matches!(terminal.read_char(), Err(VmError::InputExhausted)));

        Ok(())
    }

    #[test]
    fn crlf_and_missing_terminator_are_normalised() -> Result<()> {
        let mut terminal = Terminal::new("a\r\nb".as_bytes(), Vec::new());

        assert_eq!(read_all(&mut terminal, 4)?, "a\nb\n");

        Ok(())
    }

    #[test]
    fn empty_line_yields_only_newline() -> Result<()> {
        let mut terminal = Terminal::new("\nx\n".as_bytes(), Vec::new());

        assert_eq!(terminal.read_char()?, 10);
        assert_eq!(terminal.read_char()?, 'x' as Word);

        Ok(())
    }

    #[test]
    fn write_char_emits_code_points() -> Result<()> {
        let mut terminal = Terminal::new("".as_bytes(), Vec::new());
        for &code in &[72, 105, 0xE9] {
            terminal.write_char(code)?;
        }

        assert_eq!(String::from_utf8(terminal.output().clone())?, "Hi\u{e9}");

        Ok(())
    }

    #[test]
    fn surrogates_are_replaced() -> Result<()> {
        let mut terminal = Terminal::new("".as_bytes(), Vec::new());
        terminal.write_char(0xD800)?;

        assert_eq!(String::from_utf8(terminal.output().clone())?, "\u{fffd}");

        Ok(())
    }

    #[test]
    fn transcript_follows_the_conversation() -> Result<()> {
        let mut terminal = Terminal::new("yes\n".as_bytes(), Vec::new());
        terminal.record_transcript();

        terminal.write_char('?' as Word)?;
        read_all(&mut terminal, 4)?;
        terminal.write_char('!' as Word)?;

        assert_eq!(
            terminal.transcript().map(|t| t.entries()),
            Some(vec![
                Entry::Output("?".into()),
                Entry::Input("yes".into()),
                Entry::Output("!".into()),
            ])
        );

        Ok(())
    }

    #[test]
    fn queued_lines_come_before_input() -> Result<()> {
        // a replay file whose last line has no terminator
        let mut terminal = Terminal::new("south\n".as_bytes(), Vec::new());
        terminal.record_transcript();
        terminal.queue_lines("look\nnorth".lines());

        assert_eq!(read_all(&mut terminal, 17)?, "look\nnorth\nsouth\n");
        assert_eq!(
            terminal.transcript().map(|t| t.inputs()),
            Some(vec!["look", "north", "south"])
        );
        assert!(matches!(terminal.read_char(), Err(VmError::InputExhausted)));

        Ok(())
    }
}
