//! Diagnostic record of a session: every input line and every run of output
//! produced between two inputs, in order.

use std::io::{self, Write};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Input(String),
    Output(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    entries: Vec<Entry>,
    /// Output collected since the last input
    pending: String,
}

impl Transcript {
    pub fn log_input(&mut self, line: &str) {
        self.close_output();
        self.entries.push(Entry::Input(line.to_owned()));
    }

    pub fn log_output(&mut self, text: &str) {
        self.pending.push_str(text);
    }

    /// All entries so far, including output not yet followed by an input
    pub fn entries(&self) -> Vec<Entry> {
        let mut entries = self.entries.clone();
        if !self.pending.is_empty() {
            entries.push(Entry::Output(self.pending.clone()));
        }
        entries
    }

    /// The submitted input lines, in the order the program read them
    pub fn inputs(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(|entry| match entry {
                Entry::Input(line) => Some(line.as_str()),
                Entry::Output(_) => None,
            })
            .collect()
    }

    /// Renders the transcript: output verbatim, input lines prefixed with `> `
    pub fn write_to<W: Write>(&self, mut writer: W) -> io::Result<()> {
        for entry in self.entries() {
            match entry {
                Entry::Input(line) => writeln!(writer, "> {}", line)?,
                Entry::Output(text) => writer.write_all(text.as_bytes())?,
            }
        }
        writer.flush()
    }

    /// Writes one submitted line per text line, the format
    /// [`Transcript::read_inputs`] replays
    pub fn write_inputs_to<W: Write>(&self, mut writer: W) -> io::Result<()> {
        for line in self.inputs() {
            writeln!(writer, "{}", line)?;
        }
        writer.flush()
    }

    /// Splits a file written by [`Transcript::write_inputs_to`] back into
    /// lines. A missing terminator on the last line is accepted.
    pub fn read_inputs(text: &str) -> Vec<String> {
        text.lines().map(str::to_owned).collect()
    }

    fn close_output(&mut self) {
        if !self.pending.is_empty() {
            let text = std::mem::take(&mut self.pending);
            self.entries.push(Entry::Output(text));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use color_eyre::eyre::Result;

    #[test]
    fn output_between_inputs_is_grouped() {
        let mut transcript = Transcript::default();
        transcript.log_output("Wel");
        transcript.log_output("come\n");
        transcript.log_input("look");
        transcript.log_output("A room.\n");

        assert_eq!(
            transcript.entries(),
            vec![
                Entry::Output("Welcome\n".into()),
                Entry::Input("look".into()),
                Entry::Output("A room.\n".into()),
            ]
        );
    }

    #[test]
    fn consecutive_inputs_have_no_empty_output() {
        let mut transcript = Transcript::default();
        transcript.log_input("north");
        transcript.log_input("south");

        assert_eq!(transcript.entries().len(), 2);
        assert_eq!(transcript.inputs(), vec!["north", "south"]);
    }

    #[test]
    fn write_to_marks_inputs() -> Result<()> {
        let mut transcript = Transcript::default();
        transcript.log_output("What do you do?\n");
        transcript.log_input("take tablet");
        transcript.log_output("Taken.\n");

        let mut rendered = Vec::new();
        transcript.write_to(&mut rendered)?;

        assert_eq!(
            String::from_utf8(rendered)?,
            "What do you do?\n> take tablet\nTaken.\n"
        );

        Ok(())
    }

    #[test]
    fn inputs_survive_writing_and_reading() -> Result<()> {
        let mut transcript = Transcript::default();
        transcript.log_output("> ");
        transcript.log_input("use tablet");
        transcript.log_input("");
        transcript.log_output("ok\n");
        transcript.log_input("go north");

        let mut written = Vec::new();
        transcript.write_inputs_to(&mut written)?;
        let text = String::from_utf8(written)?;

        assert_eq!(text, "use tablet\n\ngo north\n");
        assert_eq!(
            Transcript::read_inputs(&text),
            vec!["use tablet", "", "go north"]
        );
        assert_eq!(Transcript::read_inputs("a\r\nb"), vec!["a", "b"]);

        Ok(())
    }
}
