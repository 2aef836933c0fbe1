//! Recursive character splitting with bounded segment size and overlap.

/// Separator preference order: paragraph breaks, line breaks, then spaces.
/// Anything still too long after that is hard-cut on character boundaries.
const SEPARATORS: [&str; 3] = ["\n\n", "\n", " "];

/// Splits `text` into ordered segments of at most `max_size` characters,
/// repeating up to `overlap` characters of trailing context between adjacent
/// segments where the source text is long enough.
///
/// Split points prefer paragraph breaks, then line breaks, then spaces, and
/// fall back to hard character cuts. Cuts always land on `char` boundaries.
/// Text shorter than `max_size` yields a single segment; empty text yields
/// none. Deterministic for identical input and parameters.
pub fn split(text: &str, max_size: usize, overlap: usize) -> Vec<String> {
    if text.is_empty() || max_size == 0 {
        return Vec::new();
    }
    let overlap = overlap.min(max_size - 1);
    if char_len(text) <= max_size {
        return vec![text.to_string()];
    }

    let atoms = split_atoms(text, max_size, &SEPARATORS);

    let mut segments: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;
    for atom in atoms {
        let atom_len = char_len(&atom);
        if current_len > 0 && current_len + atom_len > max_size {
            // Seed the next segment with as much trailing context as still
            // leaves room for the incoming atom.
            let carry_len = overlap.min(max_size - atom_len);
            let carry = char_tail(&current, carry_len).to_string();
            segments.push(std::mem::take(&mut current));
            current = carry;
            current_len = char_len(&current);
        }
        current.push_str(&atom);
        current_len += atom_len;
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

/// Recursively breaks `text` into pieces no longer than `max_size`, keeping
/// every separator attached to the piece it terminates so that concatenating
/// the pieces reproduces the input exactly.
fn split_atoms(text: &str, max_size: usize, separators: &[&str]) -> Vec<String> {
    if char_len(text) <= max_size {
        return vec![text.to_string()];
    }
    match separators.split_first() {
        Some((separator, rest)) => {
            if text.contains(separator) {
                let mut atoms = Vec::new();
                for piece in split_keeping_separator(text, separator) {
                    if char_len(&piece) <= max_size {
                        atoms.push(piece);
                    } else {
                        atoms.extend(split_atoms(&piece, max_size, rest));
                    }
                }
                atoms
            } else {
                split_atoms(text, max_size, rest)
            }
        }
        None => hard_cut(text, max_size),
    }
}

fn split_keeping_separator(text: &str, separator: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut rest = text;
    while let Some(position) = rest.find(separator) {
        let end = position + separator.len();
        pieces.push(rest[..end].to_string());
        rest = &rest[end..];
    }
    if !rest.is_empty() {
        pieces.push(rest.to_string());
    }
    pieces
}

fn hard_cut(text: &str, max_size: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::with_capacity(max_size);
    let mut count = 0usize;
    for ch in text.chars() {
        current.push(ch);
        count += 1;
        if count == max_size {
            pieces.push(std::mem::take(&mut current));
            count = 0;
        }
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Last `n` characters of `text` (the whole string when shorter).
fn char_tail(text: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    let total = char_len(text);
    if total <= n {
        return text;
    }
    let (byte_index, _) = text
        .char_indices()
        .nth(total - n)
        .expect("tail offset within bounds");
    &text[byte_index..]
}
