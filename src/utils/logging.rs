use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Appends each question and answer to a user-chosen file.
///
/// Disabled when no path was given; every write opens the file in append
/// mode so several invocations can share one transcript.
pub struct TranscriptLog {
    file_path: Option<PathBuf>,
}

impl TranscriptLog {
    /// Fails early when the file cannot be created or written.
    pub fn new(file_path: Option<PathBuf>) -> io::Result<Self> {
        if let Some(path) = &file_path {
            OpenOptions::new().create(true).append(true).open(path)?;
        }
        Ok(Self { file_path })
    }

    pub fn disabled() -> Self {
        Self { file_path: None }
    }

    pub fn is_active(&self) -> bool {
        self.file_path.is_some()
    }

    pub fn log_exchange(&self, question: &str, answer: &str) -> io::Result<()> {
        let Some(path) = &self.file_path else {
            return Ok(());
        };

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = BufWriter::new(file);

        for line in format!("You: {question}").lines() {
            writeln!(writer, "{line}")?;
        }
        writeln!(writer)?;
        for line in answer.lines() {
            writeln!(writer, "{line}")?;
        }
        writeln!(writer)?;

        writer.flush()
    }

    pub fn log_note(&self, note: &str) -> io::Result<()> {
        let Some(path) = &self.file_path else {
            return Ok(());
        };

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "## {note}")?;
        writeln!(file)
    }

    pub fn status_string(&self) -> String {
        match &self.file_path {
            None => "disabled".to_string(),
            Some(path) => format!("active ({})", file_name(path)),
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned()
}
