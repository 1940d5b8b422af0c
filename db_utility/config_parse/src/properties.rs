/*
 * Copyright (c) Huawei Technologies Co., Ltd. 2025. All rights reserved.
 * Global Trust Authority is licensed under the Mulan PSL v2.
 * You can use this software according to the terms and conditions of the Mulan PSL v2.
 * You may obtain a copy of Mulan PSL v2 at:
 *     http://license.coscl.org.cn/MulanPSL2
 * THIS SOFTWARE IS PROVIDED ON AN "AS IS" BASIS, WITHOUT WARRANTIES OF ANY KIND, EITHER EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO NON-INFRINGEMENT, MERCHANTABILITY OR FIT FOR A PARTICULAR
 * PURPOSE.
 * See the Mulan PSL v2 for more details.
 */

//! Line based `key=value` properties parsing

use std::collections::HashMap;
use std::path::Path;
use std::str::Chars;
use log::debug;
use crate::PropertiesError;

const BLANKS: [char; 3] = [' ', '\t', '\x0c'];

/// Read and parse a properties file.
///
/// # Errors
///
/// * `PropertiesError::Io` - If the file cannot be read.
/// * `PropertiesError::NotUtf8` - If the content is not UTF-8.
/// * `PropertiesError::MalformedEscape` - If a `\u` escape is broken.
pub fn load_properties(path: impl AsRef<Path>) -> Result<HashMap<String, String>, PropertiesError> {
    let path = path.as_ref();
    debug!("loading properties from {}", path.display());
    let bytes = std::fs::read(path)?;
    let text = String::from_utf8(bytes).map_err(|_| PropertiesError::NotUtf8 {
        path: path.display().to_string(),
    })?;
    parse_properties(text.strip_prefix('\u{feff}').unwrap_or(&text))
}

/// Parse properties text into a key/value map.
///
/// Later occurrences of a key override earlier ones.
pub fn parse_properties(text: &str) -> Result<HashMap<String, String>, PropertiesError> {
    let mut config_map = HashMap::new();
    for (line_no, line) in logical_lines(text) {
        let (key, value) = split_entry(&line);
        let key = unescape(key, line_no)?;
        let value = unescape(value, line_no)?;
        config_map.insert(key, value);
    }
    Ok(config_map)
}

// Joins continuation lines and drops blanks and comments.
// Each entry carries the 1-based number of its first physical line.
fn logical_lines(text: &str) -> Vec<(usize, String)> {
    let mut lines = Vec::new();
    let mut pending: Option<(usize, String)> = None;

    for (index, raw) in text.lines().enumerate() {
        let piece = raw.trim_start_matches(BLANKS);
        let (line_no, mut current) = match pending.take() {
            Some((line_no, mut acc)) => {
                acc.push_str(piece);
                (line_no, acc)
            }
            None => {
                if piece.is_empty() || piece.starts_with('#') || piece.starts_with('!') {
                    continue;
                }
                (index + 1, piece.to_string())
            }
        };

        let trailing = piece.chars().rev().take_while(|c| *c == '\\').count();
        if trailing % 2 == 1 {
            current.pop();
            pending = Some((line_no, current));
        } else {
            lines.push((line_no, current));
        }
    }

    if let Some(last) = pending {
        lines.push(last);
    }
    lines
}

// Returns the still escaped key and value parts of a logical line.
fn split_entry(line: &str) -> (&str, &str) {
    let mut key_end = line.len();
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' | ' ' | '\t' | '\x0c' => {
                key_end = i;
                break;
            }
            _ => {}
        }
    }

    let mut rest = line[key_end..].trim_start_matches(BLANKS);
    if let Some(stripped) = rest.strip_prefix(['=', ':']) {
        rest = stripped.trim_start_matches(BLANKS);
    }
    (&line[..key_end], rest)
}

fn unescape(raw: &str, line: usize) -> Result<String, PropertiesError> {
    let malformed = || PropertiesError::MalformedEscape { line };
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\x0c'),
            Some('u') => {
                let unit = read_hex4(&mut chars).ok_or_else(malformed)?;
                let code = if (0xD800..0xDC00).contains(&unit) {
                    // high surrogate, the low half must follow as another escape
                    if chars.next() != Some('\\') || chars.next() != Some('u') {
                        return Err(malformed());
                    }
                    let low = read_hex4(&mut chars)
                        .filter(|low| (0xDC00..0xE000).contains(low))
                        .ok_or_else(malformed)?;
                    0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00)
                } else {
                    unit
                };
                out.push(char::from_u32(code).ok_or_else(malformed)?);
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    Ok(out)
}

fn read_hex4(chars: &mut Chars<'_>) -> Option<u32> {
    let mut value = 0;
    for _ in 0..4 {
        value = value * 16 + chars.next()?.to_digit(16)?;
    }
    Some(value)
}
