use std::collections::HashSet;

use tracing::debug;

use super::timecode::parse_timing_line;
use super::{CaptionBlock, SubtitleDocument};
use crate::error::{Result, SubtransError};

/// Parse raw bytes, requiring UTF-8.
pub fn parse_bytes(bytes: &[u8]) -> Result<SubtitleDocument> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| SubtransError::malformed(0, format!("document is not valid UTF-8: {}", e)))?;
    parse(text)
}

/// Parse SubRip text into a document.
///
/// Tolerates a BOM, CRLF endings, surrounding blank lines, runs of blank
/// lines between blocks and a missing final blank line. Every structural
/// violation is reported with its 1-based line number.
pub fn parse(text: &str) -> Result<SubtitleDocument> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = text.lines().enumerate().map(|(i, l)| (i + 1, l)).peekable();

    let mut blocks = Vec::new();
    let mut seen = HashSet::new();

    loop {
        // Skip separators
        while lines.next_if(|(_, l)| l.trim().is_empty()).is_some() {}

        let Some((index_line, raw_index)) = lines.next() else {
            break;
        };

        let index: u32 = raw_index.trim().parse().map_err(|_| {
            SubtransError::malformed(
                index_line,
                format!("expected block index, found '{}'", raw_index.trim()),
            )
        })?;
        if index == 0 {
            return Err(SubtransError::malformed(index_line, "block index must be positive"));
        }
        if !seen.insert(index) {
            return Err(SubtransError::malformed(
                index_line,
                format!("duplicate block index {}", index),
            ));
        }

        let (timing_line, raw_timing) = match lines.next() {
            Some((n, l)) if !l.trim().is_empty() => (n, l),
            _ => {
                return Err(SubtransError::malformed(
                    index_line + 1,
                    format!("block {} is missing its timecode line", index),
                ));
            }
        };
        let (start, end) = parse_timing_line(raw_timing).ok_or_else(|| {
            SubtransError::malformed(
                timing_line,
                format!("invalid timecode line '{}'", raw_timing.trim()),
            )
        })?;
        if start > end {
            return Err(SubtransError::malformed(
                timing_line,
                format!("block {} starts at {} after it ends at {}", index, start, end),
            ));
        }

        let mut text_lines = Vec::new();
        while !starts_block(&lines) {
            let Some((_, line)) = lines.next_if(|(_, l)| !l.trim().is_empty()) else {
                break;
            };
            text_lines.push(line.trim_end().to_string());
        }
        if text_lines.is_empty() {
            return Err(SubtransError::malformed(
                timing_line + 1,
                format!("block {} has no text", index),
            ));
        }

        blocks.push(CaptionBlock::new(index, start, end, text_lines)?);
    }

    if blocks.is_empty() {
        return Err(SubtransError::malformed(0, "document contains no subtitle blocks"));
    }

    debug!("Parsed {} subtitle blocks", blocks.len());
    SubtitleDocument::new(blocks)
}

/// True when the next two lines are an index and a timing line, i.e. a new
/// block begins without a blank separator.
fn starts_block<'a, I>(lines: &I) -> bool
where
    I: Iterator<Item = (usize, &'a str)> + Clone,
{
    let mut ahead = lines.clone();
    let is_index = ahead
        .next()
        .is_some_and(|(_, l)| l.trim().parse::<u32>().is_ok_and(|n| n > 0));
    is_index && ahead.next().is_some_and(|(_, l)| parse_timing_line(l).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subtitle::Timecode;

    const SAMPLE: &str = "1\n00:00:01,000 --> 00:00:03,000\nHello, how are you?\n\n\
                          2\n00:00:04,000 --> 00:00:06,000\nI'm doing great, thank you.\n";

    fn line_of(err: SubtransError) -> usize {
        match err {
            SubtransError::MalformedDocument { line, .. } => line,
            other => panic!("expected MalformedDocument, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_basic_document() {
        let doc = parse(SAMPLE).unwrap();
        assert_eq!(doc.len(), 2);

        let first = &doc.blocks()[0];
        assert_eq!(first.index(), 1);
        assert_eq!(first.start(), Timecode::from_millis(1_000));
        assert_eq!(first.end(), Timecode::from_millis(3_000));
        assert_eq!(first.text(), "Hello, how are you?");
    }

    #[test]
    fn test_parse_is_inverse_of_serialize() {
        let doc = parse(SAMPLE).unwrap();
        assert_eq!(doc.to_srt(), SAMPLE);
        assert_eq!(parse(&doc.to_srt()).unwrap(), doc);
    }

    #[test]
    fn test_parse_tolerates_whitespace_crlf_and_bom() {
        let messy = "\u{feff}\r\n\r\n1\r\n00:00:01,000 --> 00:00:03,000\r\nHello\r\nthere  \r\n\r\n\r\n\r\n\
                     2\r\n00:00:04,000 --> 00:00:06,000\r\nBye";
        let doc = parse(messy).unwrap();
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.blocks()[0].lines(), ["Hello", "there"]);
        assert_eq!(doc.blocks()[1].text(), "Bye");
    }

    #[test]
    fn test_parse_rejects_non_integer_index() {
        let err = parse("one\n00:00:01,000 --> 00:00:02,000\nHi\n").unwrap_err();
        assert_eq!(line_of(err), 1);
    }

    #[test]
    fn test_parse_rejects_missing_timecode_line() {
        let err = parse("1\nHi there\n\n").unwrap_err();
        assert_eq!(line_of(err), 2);

        let err = parse("1\n").unwrap_err();
        assert_eq!(line_of(err), 2);
    }

    #[test]
    fn test_parse_rejects_inverted_timing() {
        let err = parse("1\n00:00:05,000 --> 00:00:02,000\nHi\n").unwrap_err();
        assert_eq!(line_of(err), 2);
    }

    #[test]
    fn test_parse_rejects_duplicate_index() {
        let text = "1\n00:00:01,000 --> 00:00:02,000\nA\n\n1\n00:00:03,000 --> 00:00:04,000\nB\n";
        let err = parse(text).unwrap_err();
        assert_eq!(line_of(err), 5);
    }

    #[test]
    fn test_parse_rejects_block_without_text() {
        let err = parse("1\n00:00:01,000 --> 00:00:02,000\n\n").unwrap_err();
        assert_eq!(line_of(err), 3);
    }

    #[test]
    fn test_parse_splits_blocks_missing_blank_separator() {
        let text = "1\n00:00:01,000 --> 00:00:02,000\nHi\n2\n00:00:03,000 --> 00:00:04,000\nBye\n";
        let doc = parse(text).unwrap();
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.blocks()[0].lines(), ["Hi"]);
        assert_eq!(doc.blocks()[1].index(), 2);
        assert_eq!(doc.blocks()[1].start(), Timecode::from_millis(3_000));
        assert_eq!(doc.blocks()[1].text(), "Bye");
    }

    #[test]
    fn test_parse_keeps_numeric_caption_lines() {
        let text = "1\n00:00:01,000 --> 00:00:02,000\nCount down:\n3\n2\n\n\
                    2\n00:00:03,000 --> 00:00:04,000\nGo\n";
        let doc = parse(text).unwrap();
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.blocks()[0].lines(), ["Count down:", "3", "2"]);
    }

    #[test]
    fn test_parse_rejects_empty_and_prose() {
        assert!(parse("   \n\n").is_err());
        assert!(parse("I cannot help with that.").is_err());
    }

    #[test]
    fn test_parse_bytes_rejects_invalid_utf8() {
        let err = parse_bytes(&[0xff, 0xfe, 0x00]).unwrap_err();
        assert_eq!(line_of(err), 0);
    }
}
