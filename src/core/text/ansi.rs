//! ANSI escape sequence recognition.

/// The escape sequence starting at byte offset `pos`, as a borrowed slice.
///
/// Recognizes CSI (`ESC [` through a final byte in `0x40..=0x7e`), OSC
/// (`ESC ]` through BEL or ST), and SS3 (`ESC O` plus one byte). Returns
/// `None` for anything else, including unterminated sequences.
pub fn extract_ansi_code(input: &str, pos: usize) -> Option<&str> {
    let bytes = input.as_bytes();
    if bytes.get(pos) != Some(&0x1b) {
        return None;
    }

    let end = match bytes.get(pos + 1)? {
        b'[' => csi_end(bytes, pos + 2)?,
        b']' => osc_end(bytes, pos + 2)?,
        b'O' => {
            bytes.get(pos + 2)?;
            pos + 3
        }
        _ => return None,
    };
    Some(&input[pos..end])
}

fn csi_end(bytes: &[u8], from: usize) -> Option<usize> {
    bytes[from..]
        .iter()
        .position(|b| (0x40..=0x7e).contains(b))
        .map(|offset| from + offset + 1)
}

fn osc_end(bytes: &[u8], from: usize) -> Option<usize> {
    let mut idx = from;
    while idx < bytes.len() {
        match bytes[idx] {
            0x07 => return Some(idx + 1),
            0x1b if bytes.get(idx + 1) == Some(&b'\\') => return Some(idx + 2),
            _ => idx += 1,
        }
    }
    None
}
