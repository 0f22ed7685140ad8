//! Utility functions and helpers.

pub mod http;

/// Convert a 0-based column index to its spreadsheet letter name.
///
/// 0 → "A", 25 → "Z", 26 → "AA", 51 → "AZ", 52 → "BA".
pub fn column_letter(index: usize) -> String {
    let mut n = index as i64;
    let mut letters = Vec::new();
    while n >= 0 {
        letters.push(char::from(b'A' + (n % 26) as u8));
        n = n / 26 - 1;
    }
    letters.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_letters() {
        assert_eq!(column_letter(0), "A");
        assert_eq!(column_letter(1), "B");
        assert_eq!(column_letter(25), "Z");
    }

    #[test]
    fn test_double_letters() {
        assert_eq!(column_letter(26), "AA");
        assert_eq!(column_letter(51), "AZ");
        assert_eq!(column_letter(52), "BA");
        assert_eq!(column_letter(701), "ZZ");
    }

    #[test]
    fn test_triple_letters() {
        assert_eq!(column_letter(702), "AAA");
    }
}
