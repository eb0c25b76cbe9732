//! Intcode program loader.
//!
//! Programs are stored as text: decimal integers separated by commas,
//! optionally spread over several lines and padded with whitespace.
//!
//! ```
//! use intcode_emu::program::Program;
//!
//! let program: Program = "1,9,10,3,\n2,3,11,0,\n99,30,40,50".parse()?;
//! assert_eq!(program.len(), 12);
//! assert_eq!(program.words()[4], 2);
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{bail, Context, Result};
use std::fmt;
use std::str::FromStr;

/// An immutable Intcode load image.
///
/// Every execution unit copies the words into its own memory, so one
/// `Program` can seed any number of independent interpreters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Program {
    words: Vec<i64>,
}

impl Program {
    /// Build a program from raw words.
    pub fn new(words: Vec<i64>) -> Self {
        Self { words }
    }

    /// Parse the comma separated text format.
    ///
    /// Line breaks separate words the same way commas do. A trailing comma
    /// on a line is accepted. Other empty fields are rejected, as is an
    /// input with no words at all.
    pub fn parse(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            bail!("program text is empty");
        }

        let mut words = Vec::new();
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let body = line.strip_suffix(',').unwrap_or(line);
            for field in body.split(',') {
                let index = words.len();
                let field = field.trim();
                if field.is_empty() {
                    bail!("empty field at word {}", index);
                }
                let word = field
                    .parse::<i64>()
                    .with_context(|| format!("invalid integer {:?} at word {}", field, index))?;
                words.push(word);
            }
        }

        log::debug!("Parsed program with {} words", words.len());
        Ok(Self { words })
    }

    /// The program words.
    pub fn words(&self) -> &[i64] {
        &self.words
    }

    /// Number of words in the program.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// True when the program has no words.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl FromStr for Program {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<Vec<i64>> for Program {
    fn from(words: Vec<i64>) -> Self {
        Self::new(words)
    }
}

impl From<&[i64]> for Program {
    fn from(words: &[i64]) -> Self {
        Self::new(words.to_vec())
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, word) in self.words.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", word)?;
        }
        Ok(())
    }
}
