// SubRip document model
//
// - Timecode: millisecond timestamps and the `start --> end` timing line
// - Parser: text to SubtitleDocument with line-numbered structural errors

pub mod parser;
pub mod timecode;

use std::collections::HashSet;
use std::fmt;

pub use parser::{parse, parse_bytes};
pub use timecode::Timecode;

use crate::error::{Result, SubtransError};

/// One subtitle entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionBlock {
    index: u32,
    start: Timecode,
    end: Timecode,
    lines: Vec<String>,
}

impl CaptionBlock {
    pub fn new(index: u32, start: Timecode, end: Timecode, lines: Vec<String>) -> Result<Self> {
        if index == 0 {
            return Err(SubtransError::malformed(0, "block index must be positive"));
        }
        if start > end {
            return Err(SubtransError::malformed(
                0,
                format!("block {} starts at {} after it ends at {}", index, start, end),
            ));
        }
        if lines.is_empty() {
            return Err(SubtransError::malformed(0, format!("block {} has no text", index)));
        }

        Ok(Self { index, start, end, lines })
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn start(&self) -> Timecode {
        self.start
    }

    pub fn end(&self) -> Timecode {
        self.end
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Caption text with line breaks preserved.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

impl fmt::Display for CaptionBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.index)?;
        writeln!(f, "{} --> {}", self.start, self.end)?;
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// Ordered caption blocks; order is playback order and indices are unique.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubtitleDocument {
    blocks: Vec<CaptionBlock>,
}

impl SubtitleDocument {
    pub fn new(blocks: Vec<CaptionBlock>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(blocks.len());
        for block in &blocks {
            if !seen.insert(block.index) {
                return Err(SubtransError::malformed(
                    0,
                    format!("duplicate block index {}", block.index),
                ));
            }
        }
        Ok(Self { blocks })
    }

    pub fn blocks(&self) -> &[CaptionBlock] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn get(&self, index: u32) -> Option<&CaptionBlock> {
        self.blocks.iter().find(|b| b.index == index)
    }

    /// Canonical SRT text: one blank line between blocks, `\n` endings.
    pub fn to_srt(&self) -> String {
        self.to_string()
    }

    /// Split into windows of at most `size` blocks. `size == 0` keeps the whole document.
    pub fn windows(&self, size: usize) -> Vec<SubtitleDocument> {
        if size == 0 || self.blocks.len() <= size {
            return vec![self.clone()];
        }
        self.blocks
            .chunks(size)
            .map(|chunk| SubtitleDocument { blocks: chunk.to_vec() })
            .collect()
    }

    /// Join documents in order, re-checking index uniqueness across them.
    pub fn concat(parts: Vec<SubtitleDocument>) -> Result<Self> {
        let blocks = parts.into_iter().flat_map(|d| d.blocks).collect();
        Self::new(blocks)
    }
}

impl fmt::Display for SubtitleDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, block) in self.blocks.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", block)?;
        }
        Ok(())
    }
}
