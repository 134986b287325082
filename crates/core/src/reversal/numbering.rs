//! Sequential document numbering.

/// Digits in the numeric suffix.
pub const NUMBER_WIDTH: usize = 6;

/// Next number for `prefix`: highest existing numeric suffix plus one,
/// zero-padded (`CN-000001`, `CN-000002`, ...).
///
/// Numbers that do not follow `{prefix}-{digits}` are ignored.
#[must_use]
pub fn next_document_number<I, S>(prefix: &str, existing: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let max = existing
        .into_iter()
        .filter_map(|n| parse_suffix(prefix, n.as_ref()))
        .max()
        .unwrap_or(0);
    format!("{prefix}-{:0width$}", max + 1, width = NUMBER_WIDTH)
}

fn parse_suffix(prefix: &str, number: &str) -> Option<u64> {
    let digits = number.strip_prefix(prefix)?.strip_prefix('-')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_number() {
        assert_eq!(next_document_number("CN", Vec::<String>::new()), "CN-000001");
    }

    #[test]
    fn test_max_suffix_plus_one() {
        let existing = ["CN-000001", "CN-000007", "CN-000003"];
        assert_eq!(next_document_number("CN", existing), "CN-000008");
    }

    #[test]
    fn test_ignores_foreign_formats() {
        let existing = ["RF-000050", "CN-ABC", "CN-", "CN000009", "CN-000002"];
        assert_eq!(next_document_number("CN", existing), "CN-000003");
    }

    #[test]
    fn test_grows_past_width() {
        assert_eq!(next_document_number("RF", ["RF-999999"]), "RF-1000000");
    }
}
