//! Numeric sort keys for case file names.
//!
//! Case files are exported with a running number somewhere in the name
//! (e.g., "case_12.txt", "12-DE-2021.txt", "GDPR 7 final.txt"). Ordering by
//! that number recovers the export order, which lexicographic ordering breaks
//! as soon as the numbers stop sharing a width ("10" < "9").

/// Extract the ordering key from a file name.
///
/// Input: a bare file name like "case_12.txt" or "intro.txt"
/// Output: the first run of ASCII digits parsed as an integer, or 0
///
/// Leading zeros are ignored ("007" → 7). A digit run too long for `u64`
/// saturates to `u64::MAX` so it still sorts after every shorter number.
pub fn filename_sort_key(name: &str) -> u64 {
    let bytes = name.as_bytes();

    let Some(start) = bytes.iter().position(|b| b.is_ascii_digit()) else {
        return 0;
    };
    let end = bytes[start..]
        .iter()
        .position(|b| !b.is_ascii_digit())
        .map(|offset| start + offset)
        .unwrap_or(bytes.len());

    bytes[start..end].iter().fold(0u64, |acc, b| {
        acc.saturating_mul(10).saturating_add(u64::from(b - b'0'))
    })
}
