use std::io::{BufRead, Write};

use anyhow::{Context, Result};

/// Where a manually entered transcript comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ManualEntry {
    /// Text supplied up front (e.g. `--transcript`).
    Text(String),
    /// Ask on the terminal.
    Prompt,
    /// No manual entry possible (non-interactive use).
    Disabled,
}

impl ManualEntry {
    pub fn read(&self) -> Result<Option<String>> {
        match self {
            Self::Text(text) => Ok(non_empty(text)),
            Self::Prompt => {
                let stdin = std::io::stdin();
                let mut stdout = std::io::stdout();
                prompt_for_transcript(&mut stdin.lock(), &mut stdout)
            }
            Self::Disabled => Ok(None),
        }
    }
}

fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Ask for the spoken text and read a single line.
pub fn prompt_for_transcript(input: &mut impl BufRead, output: &mut impl Write) -> Result<Option<String>> {
    writeln!(
        output,
        "\nAutomatic transcription unavailable. Please type what was said in the video:"
    )?;
    write!(output, "Enter transcript: ")?;
    output.flush()?;

    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("Failed to read transcript from stdin")?;
    Ok(non_empty(&line))
}
