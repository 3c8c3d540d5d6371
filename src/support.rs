/// Single-byte chars from `[u8; 4]`.
/// Maps 0-255 to `char`, exceeding ascii.
pub(crate) fn chars_from_bytes(bytes: [u8; 4]) -> [char; 4] {
    [
        bytes[0] as char,
        bytes[1] as char,
        bytes[2] as char,
        bytes[3] as char,
    ]
}

/// ISO8859-1 string from bytes, optionally ignoring null bytes.
pub(crate) fn iso8859_1(bytes: &[u8], ignore_null: bool) -> String {
    match ignore_null {
        true => bytes.iter()
            .filter_map(|b| if b == &0 {None} else {Some(*b as char)})
            .collect(),
        false => bytes.iter()
            .map(|b| *b as char)
            .collect(),
    }
}

/// Counted string if first byte is a plausible count,
/// otherwise the bytes as they are. Null bytes are ignored,
/// whitespace trimmed.
///
/// GoPro handler names are counted and end in `0x20`,
/// whereas e.g. older QuickTime handler names are
/// null terminated.
pub(crate) fn maybe_counted_string(bytes: &[u8]) -> String {
    let string = match bytes.first() {
        Some(count) if (*count as usize) < bytes.len() => {
            iso8859_1(&bytes[1 .. *count as usize + 1], true)
        },
        _ => iso8859_1(bytes, true)
    };
    string.trim().to_owned()
}

/// Rounds `len` up to nearest multiple of 4.
pub(crate) fn align4(len: usize) -> usize {
    (len + 3) & !3
}
