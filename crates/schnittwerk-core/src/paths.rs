// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Path normalization for crop destinations.
//
// Store values (operational unit, area, item code, file name) arrive with
// stray whitespace, mixed separators and Spanish diacritics. Every component
// is normalized on its own and the joined path is normalized again, so the
// same inputs always produce the same ASCII path string. Normalization is a
// pure string transformation with an explicit separator style, independent of
// the host platform.

use serde::{Deserialize, Serialize};

/// Which separator convention normalized paths use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathStyle {
    /// Backslash separators, drive letters and `\\server\share` UNC roots.
    Windows,
    /// Forward slash separators.
    Posix,
}

impl PathStyle {
    /// The style of the platform this binary runs on.
    pub fn native() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Posix
        }
    }

    pub fn separator(self) -> char {
        match self {
            Self::Windows => '\\',
            Self::Posix => '/',
        }
    }
}

impl Default for PathStyle {
    fn default() -> Self {
        Self::native()
    }
}

impl std::str::FromStr for PathStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "windows" => Ok(Self::Windows),
            "posix" => Ok(Self::Posix),
            other => Err(format!("unknown path style: {other}")),
        }
    }
}

/// Normalize one path (or path component) under `style`.
///
/// Steps, in order: trim, unify separators, collapse to canonical form
/// (empty and `.` segments dropped, `..` resolved where possible, UNC prefix
/// rebuilt), transliterate accented vowels and `ñ`, spaces to underscores.
pub fn normalize(input: &str, style: PathStyle) -> String {
    let sep = style.separator();
    let unified: String = input
        .trim()
        .chars()
        .map(|c| if c == '/' || c == '\\' { sep } else { c })
        .collect();

    let collapsed = collapse(&unified, sep);

    collapsed
        .chars()
        .map(|c| match transliterate(c) {
            Some(ascii) => ascii,
            None if c == ' ' => '_',
            None => c,
        })
        .collect()
}

/// Join already separated parts and normalize the result.
///
/// Each part is normalized on its own first.
pub fn join(parts: &[&str], style: PathStyle) -> String {
    let sep = style.separator().to_string();
    let joined = parts
        .iter()
        .map(|part| normalize(part, style))
        .filter(|part| !part.is_empty() && part != ".")
        .collect::<Vec<_>>()
        .join(&sep);
    normalize(&joined, style)
}

/// Collapse a separator-unified path into canonical form.
fn collapse(path: &str, sep: char) -> String {
    let double = format!("{sep}{sep}");
    let (prefix, rest) = if path.starts_with(&double) {
        (double.clone(), path.trim_start_matches(sep))
    } else if path.starts_with(sep) {
        (sep.to_string(), path.trim_start_matches(sep))
    } else {
        (String::new(), path)
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in rest.split(sep) {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(last) if *last != ".." && !is_drive(last) => {
                    segments.pop();
                }
                Some(last) if is_drive(last) && segments.len() == 1 => {}
                // `..` directly under a root has nowhere to go.
                _ if !prefix.is_empty() && segments.is_empty() => {}
                _ => segments.push(segment),
            },
            other => segments.push(other),
        }
    }

    let body = segments.join(&sep.to_string());
    if prefix.is_empty() && body.is_empty() {
        ".".to_owned()
    } else {
        format!("{prefix}{body}")
    }
}

fn is_drive(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    bytes.len() == 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

fn transliterate(c: char) -> Option<char> {
    let ascii = match c {
        'á' | 'à' | 'ä' | 'â' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'Á' | 'À' | 'Ä' | 'Â' => 'A',
        'É' | 'È' | 'Ë' | 'Ê' => 'E',
        'Í' | 'Ì' | 'Ï' | 'Î' => 'I',
        'Ó' | 'Ò' | 'Ö' | 'Ô' => 'O',
        'Ú' | 'Ù' | 'Ü' | 'Û' => 'U',
        'ñ' => 'n',
        'Ñ' => 'N',
        _ => return None,
    };
    Some(ascii)
}
