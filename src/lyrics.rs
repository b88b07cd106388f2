//! Lyrics conversion and sidecar files
//!
//! The catalog serves lyrics as TTML. Sidecars are written either as the raw
//! TTML or converted to line-synced LRC (`[mm:ss.xx]text`).

use crate::error::{Error, Result};
use crate::types::LyricsFormat;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// One lyric line with its start time, if the document is timed
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LyricLine {
    /// Start offset in milliseconds
    pub begin_ms: Option<u64>,
    /// Line text with whitespace collapsed
    pub text: String,
}

/// Parse a TTML clock value such as `12.5`, `1:02.345`, `00:01:02.345` or `3.2s`
fn parse_clock(value: &str) -> Option<u64> {
    let value = value.trim().trim_end_matches('s');
    let mut parts = value.rsplit(':');
    let seconds: f64 = parts.next()?.parse().ok()?;
    let minutes: u64 = parts.next().map_or(Some(0), |m| m.parse().ok())?;
    let hours: u64 = parts.next().map_or(Some(0), |h| h.parse().ok())?;
    if parts.next().is_some() || seconds < 0.0 {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let millis = (seconds * 1000.0).round() as u64;
    Some((hours * 3600 + minutes * 60) * 1000 + millis)
}

fn xml_error(e: impl std::fmt::Display) -> Error {
    Error::Other(format!("invalid lyrics TTML: {e}"))
}

/// Extract the `<p>` lines of a TTML document
///
/// # Errors
/// Returns an error if the document is not well-formed XML.
pub fn parse_ttml(ttml: &str) -> Result<Vec<LyricLine>> {
    let mut reader = Reader::from_str(ttml);
    let mut lines = Vec::new();
    let mut current: Option<LyricLine> = None;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) if e.local_name().as_ref() == b"p" => {
                let begin = e
                    .try_get_attribute("begin")
                    .map_err(xml_error)?
                    .map(|a| a.unescape_value().map(|v| v.into_owned()))
                    .transpose()
                    .map_err(xml_error)?;
                current = Some(LyricLine {
                    begin_ms: begin.as_deref().and_then(parse_clock),
                    text: String::new(),
                });
            }
            Event::Text(t) => {
                if let Some(line) = current.as_mut() {
                    line.text.push_str(&t.unescape().map_err(xml_error)?);
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"p" => {
                if let Some(mut line) = current.take() {
                    line.text = line.text.split_whitespace().collect::<Vec<_>>().join(" ");
                    if !line.text.is_empty() {
                        lines.push(line);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(lines)
}

/// Render lines as LRC; untimed lines are written without a timestamp
pub fn to_lrc(lines: &[LyricLine]) -> String {
    let mut out = String::new();
    for line in lines {
        match line.begin_ms {
            Some(ms) => {
                let _ = writeln!(
                    out,
                    "[{:02}:{:02}.{:02}]{}",
                    ms / 60_000,
                    (ms / 1000) % 60,
                    (ms % 1000) / 10,
                    line.text
                );
            }
            None => {
                let _ = writeln!(out, "{}", line.text);
            }
        }
    }
    out
}

/// Convert a TTML document into the configured sidecar format
///
/// # Errors
/// Returns an error if LRC conversion is requested and the TTML is malformed
/// or has no lines.
pub fn render(ttml: &str, format: LyricsFormat) -> Result<String> {
    match format {
        LyricsFormat::Ttml => Ok(ttml.to_string()),
        LyricsFormat::Lrc => {
            let lines = parse_ttml(ttml)?;
            if lines.is_empty() {
                return Err(Error::Other("lyrics document has no lines".to_string()));
            }
            Ok(to_lrc(&lines))
        }
    }
}

/// Write a lyrics sidecar, replacing any existing one
pub async fn write_sidecar(folder: &Path, file_name: &str, contents: &str) -> Result<PathBuf> {
    let path = folder.join(file_name);
    tokio::fs::write(&path, contents).await?;
    Ok(path)
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    const LINE_TTML: &str = r#"<tt xmlns="http://www.w3.org/ns/ttml" xmlns:itunes="http://music.apple.com/lyric-ttml-internal" itunes:timing="Line">
<body><div begin="0.5" end="20.1">
<p begin="0.5" end="4.2">Here comes the sun</p>
<p begin="1:04.25" end="1:08">Little darling &amp; friends</p>
</div></body></tt>"#;

    const WORD_TTML: &str = r#"<tt xmlns="http://www.w3.org/ns/ttml"><body><div>
<p begin="00:00:12.345" end="00:00:14.000"><span begin="12.345" end="12.9">Hel</span><span begin="12.9" end="13.2">lo</span> <span begin="13.2" end="14">world</span></p>
</div></body></tt>"#;

    #[test]
    fn clock_values_parse() {
        assert_eq!(parse_clock("12.5"), Some(12_500));
        assert_eq!(parse_clock("1:02.345"), Some(62_345));
        assert_eq!(parse_clock("01:00:00.000"), Some(3_600_000));
        assert_eq!(parse_clock("3.2s"), Some(3_200));
        assert_eq!(parse_clock("abc"), None);
    }

    #[test]
    fn line_synced_ttml_converts_to_lrc() {
        let lrc = render(LINE_TTML, LyricsFormat::Lrc).unwrap();
        assert_eq!(
            lrc,
            "[00:00.50]Here comes the sun\n[01:04.25]Little darling & friends\n"
        );
    }

    #[test]
    fn word_spans_are_joined_per_line() {
        let lines = parse_ttml(WORD_TTML).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "Hello world");
        assert_eq!(lines[0].begin_ms, Some(12_345));
    }

    #[test]
    fn untimed_lines_have_no_timestamp() {
        let ttml = r#"<tt><body><div><p>First</p><p>Second</p></div></body></tt>"#;
        assert_eq!(render(ttml, LyricsFormat::Lrc).unwrap(), "First\nSecond\n");
    }

    #[test]
    fn ttml_format_is_passed_through() {
        assert_eq!(render(LINE_TTML, LyricsFormat::Ttml).unwrap(), LINE_TTML);
    }

    #[test]
    fn empty_document_is_an_error_for_lrc() {
        assert!(render("<tt><body/></tt>", LyricsFormat::Lrc).is_err());
    }

    #[tokio::test]
    async fn sidecar_is_written_next_to_track() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sidecar(dir.path(), "01. Song.lrc", "[00:00.00]x\n")
            .await
            .unwrap();
        assert_eq!(tokio::fs::read_to_string(path).await.unwrap(), "[00:00.00]x\n");
    }
}
