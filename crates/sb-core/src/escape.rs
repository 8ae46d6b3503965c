//! Percent-escape helpers used by the canonicalizer.
//!
//! Everything here works on raw bytes so a decode followed by an encode
//! reproduces multi-byte sequences exactly.

/// Punctuation that stays unescaped, alongside ASCII letters and digits.
pub const SAFE_PUNCTUATION: &[u8] = b"!\"$&'()*+,-./:;<=>?@[\\]^_`{|}~";

#[inline]
fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Check whether a byte is emitted as-is by [`percent_encode`].
#[inline]
pub fn is_safe_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || SAFE_PUNCTUATION.contains(&b)
}

/// Decode one level of `%XX` escapes.
/// A `%` not followed by two hex digits is kept literally.
pub fn percent_decode(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;
    while i < input.len() {
        if input[i] == b'%' && i + 2 < input.len() {
            if let (Some(hi), Some(lo)) = (hex_value(input[i + 1]), hex_value(input[i + 2])) {
                out.push((hi << 4) | lo);
                i += 3;
                continue;
            }
        }
        out.push(input[i]);
        i += 1;
    }
    out
}

/// Decode repeatedly until the bytes stop changing.
///
/// Every productive pass shrinks the input, so this always terminates.
pub fn full_unescape(input: &[u8]) -> Vec<u8> {
    let mut current = input.to_vec();
    loop {
        let next = percent_decode(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Escape every byte outside the safe set as `%XX` (upper-case hex).
pub fn percent_encode(input: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    let mut out = String::with_capacity(input.len());
    for &b in input {
        if is_safe_byte(b) {
            out.push(b as char);
        } else {
            out.push('%');
            out.push(HEX[(b >> 4) as usize] as char);
            out.push(HEX[(b & 0x0f) as usize] as char);
        }
    }
    out
}
