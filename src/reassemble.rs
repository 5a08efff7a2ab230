use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::PreambleStrategy;
use crate::error::{Result, SubtransError};
use crate::subtitle::{SubtitleDocument, parse, timecode::parse_timing_line};

/// Non-fatal findings from comparing a translation against its source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// The service merged, split or dropped blocks.
    BlockCountMismatch { expected: usize, actual: usize },
    /// A block kept its index but its timing changed.
    TimecodeDrift { index: u32 },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BlockCountMismatch { expected, actual } => write!(
                f,
                "translated document has {} blocks, source has {}",
                actual, expected
            ),
            Self::TimecodeDrift { index } => {
                write!(f, "block {} timecodes differ from the source", index)
            }
        }
    }
}

/// A translated document together with its diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reassembly {
    pub document: SubtitleDocument,
    pub diagnostics: Vec<Diagnostic>,
}

impl Reassembly {
    pub fn has_mismatch(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::BlockCountMismatch { .. }))
    }
}

/// Turns raw completion text back into a subtitle document.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reassembler {
    strategy: PreambleStrategy,
    strict_block_count: bool,
}

impl Reassembler {
    pub fn new(strategy: PreambleStrategy, strict_block_count: bool) -> Self {
        Self {
            strategy,
            strict_block_count,
        }
    }

    /// Strip any preamble and parse the remainder.
    ///
    /// When no start of output can be located the raw text is parsed as-is,
    /// so a refusal or apology surfaces as `MalformedDocument`.
    pub fn reassemble(&self, raw: &str) -> Result<SubtitleDocument> {
        reassemble_with(raw, self.strategy)
    }

    /// Reassemble and compare against `source`.
    ///
    /// The legacy first-'1' cut only makes sense when the source starts at
    /// block 1; later chunk windows always use the structural strategy.
    pub fn reassemble_against(&self, raw: &str, source: &SubtitleDocument) -> Result<Reassembly> {
        let starts_at_one = source.blocks().first().is_none_or(|b| b.index() == 1);
        let strategy = match self.strategy {
            PreambleStrategy::FirstOne if !starts_at_one => PreambleStrategy::Structural,
            strategy => strategy,
        };
        let document = reassemble_with(raw, strategy)?;
        let diagnostics = compare(source, &document);

        for diagnostic in &diagnostics {
            warn!("Reassembly: {}", diagnostic);
        }

        if self.strict_block_count && document.len() != source.len() {
            return Err(SubtransError::ReassemblyMismatch {
                expected: source.len(),
                actual: document.len(),
            });
        }

        Ok(Reassembly {
            document,
            diagnostics,
        })
    }
}

fn reassemble_with(raw: &str, strategy: PreambleStrategy) -> Result<SubtitleDocument> {
    let body = strip_preamble(raw, strategy);
    if body.len() != raw.len() {
        debug!("Discarded {} bytes of preamble", raw.len() - body.len());
    }
    parse(body)
}

/// Reassemble with the default structural strategy.
pub fn reassemble(raw: &str) -> Result<SubtitleDocument> {
    Reassembler::default().reassemble(raw)
}

fn compare(source: &SubtitleDocument, translated: &SubtitleDocument) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    if source.len() != translated.len() {
        diagnostics.push(Diagnostic::BlockCountMismatch {
            expected: source.len(),
            actual: translated.len(),
        });
    }

    for block in source.blocks() {
        if let Some(other) = translated.get(block.index()) {
            if other.start() != block.start() || other.end() != block.end() {
                diagnostics.push(Diagnostic::TimecodeDrift {
                    index: block.index(),
                });
            }
        }
    }

    diagnostics
}

/// Return the part of `raw` where subtitle output begins.
pub fn strip_preamble(raw: &str, strategy: PreambleStrategy) -> &str {
    match strategy {
        PreambleStrategy::FirstOne => raw.find('1').map_or(raw, |pos| &raw[pos..]),
        PreambleStrategy::Structural => {
            let body = unfence(raw);
            first_block_start(body).map_or(raw, |pos| &body[pos..])
        }
    }
}

/// Contents of the first Markdown code fence, or the whole text if there is none.
fn unfence(raw: &str) -> &str {
    let mut offset = 0;
    let mut open: Option<usize> = None;

    for line in raw.split_inclusive('\n') {
        if line.trim_start().starts_with("```") {
            match open {
                None => open = Some(offset + line.len()),
                Some(start) => return &raw[start..offset],
            }
        }
        offset += line.len();
    }

    open.map_or(raw, |start| &raw[start..])
}

/// Byte offset of the first line that is an index followed by a timing line.
fn first_block_start(text: &str) -> Option<usize> {
    let mut offset = 0;
    let mut lines = text.split_inclusive('\n').peekable();

    while let Some(line) = lines.next() {
        let is_index = line.trim().parse::<u32>().is_ok_and(|n| n > 0);
        if is_index {
            if let Some(next) = lines.peek() {
                if parse_timing_line(next.trim()).is_some() {
                    return Some(offset);
                }
            }
        }
        offset += line.len();
    }

    None
}
