//! Full-name path encoding.
//!
//! A node's full encoded name is the `/`-separated list of names from the
//! tree root down to the node. Inside a name, `/`, `^` and `[` are written
//! with a leading `^`, so any name survives the round trip.

const ESCAPE: char = '^';
const SEPARATOR: char = '/';

fn needs_escape(ch: char) -> bool {
    matches!(ch, '/' | '^' | '[')
}

/// Escapes one path segment.
pub fn escape_segment(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.chars() {
        if needs_escape(ch) {
            out.push(ESCAPE);
        }
        out.push(ch);
    }
    out
}

/// Joins raw names into an encoded path.
pub fn encode_path<'a, I>(names: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    names
        .into_iter()
        .map(escape_segment)
        .collect::<Vec<_>>()
        .join("/")
}

/// Splits an encoded path on unescaped separators and unescapes each segment.
///
/// A trailing lone `^` is kept literally. An empty path has no segments.
pub fn decode_path(path: &str) -> Vec<String> {
    if path.is_empty() {
        return Vec::new();
    }

    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars();
    while let Some(ch) = chars.next() {
        match ch {
            ESCAPE => match chars.next() {
                Some(next) => current.push(next),
                None => current.push(ESCAPE),
            },
            SEPARATOR => segments.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    segments.push(current);
    segments
}
