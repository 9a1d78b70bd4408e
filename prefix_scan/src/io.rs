//! Text format for sequences.
//!
//! Input: an element count followed by that many whitespace-separated floats.
//! Output: the values with three decimals, separated by single spaces, newline-terminated.

use std::io::{Read, Write};

use crate::prelude::*;

pub fn read_sequence<R: Read>(mut reader: R) -> Result<Vec<f32>> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    parse_sequence(&text)
}

pub fn parse_sequence(text: &str) -> Result<Vec<f32>> {
    let mut tokens = text.split_whitespace();

    let count_token = tokens.next().ok_or_else(|| ScanError::Parse {
        index: 0,
        message: "missing element count".to_string(),
    })?;
    let count: usize = count_token.parse().map_err(|e| ScanError::Parse {
        index: 0,
        message: format!("invalid element count '{}': {}", count_token, e),
    })?;

    // Every value takes at least one character and one separator.
    let mut values = Vec::with_capacity(count.min(text.len() / 2 + 1));
    for index in 1..=count {
        let token = tokens.next().ok_or_else(|| ScanError::Parse {
            index,
            message: format!("expected {} values, found {}", count, index - 1),
        })?;
        let value: f32 = token.parse().map_err(|e| ScanError::Parse {
            index,
            message: format!("invalid value '{}': {}", token, e),
        })?;
        values.push(value);
    }

    let extra = tokens.count();
    if extra > 0 {
        tracing::warn!("ignoring {} values past the declared count of {}", extra, count);
    }

    Ok(values)
}

pub fn write_sequence<W: Write>(mut writer: W, values: &[f32]) -> Result<()> {
    writer.write_all(format_sequence(values).as_bytes())?;
    writer.flush()?;
    Ok(())
}

pub fn format_sequence(values: &[f32]) -> String {
    let mut text = values
        .iter()
        .map(|v| format!("{:.3}", v))
        .collect::<Vec<_>>()
        .join(" ");
    text.push('\n');
    text
}
