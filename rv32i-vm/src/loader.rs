//! Program image loading.
//!
//! Two formats are accepted:
//! - hex text: one or more 32-bit words per line, written as up to eight hex
//!   digits with an optional `0x` prefix. `#` and `//` start comments.
//! - raw binary: a little-endian stream of 32-bit words.

use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("failed to read program image: {0}")]
    Io(#[from] std::io::Error),

    #[error("binary image of {len} bytes is not a whole number of 32-bit words")]
    TruncatedWord { len: usize },

    #[error("line {line}: `{token}` is not a 32-bit hex word")]
    InvalidWord { line: usize, token: String },

    #[error("line {line}: {source}")]
    InvalidHex {
        line: usize,
        #[source]
        source: hex::FromHexError,
    },
}

/// Read and parse a program image from disk.
pub fn load_program_file(path: impl AsRef<Path>) -> Result<Vec<u32>, LoaderError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let words = parse_program(&bytes)?;
    log::debug!("Parsed {} words from {}", words.len(), path.display());
    Ok(words)
}

/// Parse an in-memory image, detecting hex text vs raw binary.
pub fn parse_program(bytes: &[u8]) -> Result<Vec<u32>, LoaderError> {
    if looks_like_text(bytes) {
        // ASCII-only input is always valid UTF-8
        parse_text(&String::from_utf8_lossy(bytes))
    } else {
        parse_binary(bytes)
    }
}

fn looks_like_text(bytes: &[u8]) -> bool {
    bytes
        .iter()
        .all(|b| b.is_ascii_graphic() || b.is_ascii_whitespace())
}

pub fn parse_binary(bytes: &[u8]) -> Result<Vec<u32>, LoaderError> {
    if bytes.len() % 4 != 0 {
        return Err(LoaderError::TruncatedWord { len: bytes.len() });
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

pub fn parse_text(text: &str) -> Result<Vec<u32>, LoaderError> {
    let mut words = Vec::new();
    for (idx, raw_line) in text.lines().enumerate() {
        let line = idx + 1;
        let code = strip_comment(raw_line);
        for token in code.split(|c: char| c.is_whitespace() || c == ',') {
            if token.is_empty() {
                continue;
            }
            words.push(parse_word(token, line)?);
        }
    }
    Ok(words)
}

fn strip_comment(line: &str) -> &str {
    let end = [line.find('#'), line.find("//")]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(line.len());
    &line[..end]
}

fn parse_word(token: &str, line: usize) -> Result<u32, LoaderError> {
    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token)
        .replace('_', "");
    if digits.is_empty() || digits.len() > 8 {
        return Err(LoaderError::InvalidWord {
            line,
            token: token.to_string(),
        });
    }

    let padded = format!("{digits:0>8}");
    let mut buf = [0u8; 4];
    hex::decode_to_slice(&padded, &mut buf)
        .map_err(|source| LoaderError::InvalidHex { line, source })?;
    Ok(u32::from_be_bytes(buf))
}
