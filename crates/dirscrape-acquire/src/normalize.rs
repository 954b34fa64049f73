use sha2::{Digest, Sha256};
use unicode_normalization::UnicodeNormalization;

/// Clean text pulled out of an HTML element for use as a field label or value.
///
/// NFC-normalizes, trims every line, collapses runs of blank lines left
/// behind by markup indentation, and trims the result.
pub fn clean_field(input: &str) -> String {
    let nfc: String = input.nfc().collect();
    let trimmed = nfc
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n");
    collapse_blank_lines(&trimmed).trim().to_string()
}

/// Collapse multiple consecutive blank lines into a single blank line.
pub fn collapse_blank_lines(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut prev_blank = false;

    for line in input.lines() {
        let is_blank = line.trim().is_empty();
        if is_blank && prev_blank {
            continue;
        }
        if !result.is_empty() {
            result.push('\n');
        }
        result.push_str(line);
        prev_blank = is_blank;
    }

    result
}

/// Turn an address into something safe to use as a file name.
///
/// The readable part maps every other character to `_`, so distinct addresses
/// can share it; a short SHA-256 digest of the full address keeps them apart.
pub fn file_stem(url: &str) -> String {
    let stripped = url
        .trim_start_matches("https://")
        .trim_start_matches("http://");
    let readable: String = stripped
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();

    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    let digest = format!("{:x}", hasher.finalize());

    format!("{}-{}", readable.trim_matches('_'), &digest[..12])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_field_nfc() {
        // e + combining acute accent -> é (precomposed)
        assert_eq!(clean_field(" Cafe\u{0301} "), "Café");
    }

    #[test]
    fn test_clean_field_multiline_value() {
        let input = "\n      1 Main St\n      Edinburgh\n\n\n      EH1 1AA\n    ";
        assert_eq!(clean_field(input), "1 Main St\nEdinburgh\n\nEH1 1AA");
    }

    #[test]
    fn test_collapse_blank_lines() {
        let input = "line 1\n\n\n\nline 2\n\nline 3";
        assert_eq!(collapse_blank_lines(input), "line 1\n\nline 2\n\nline 3");
    }

    #[test]
    fn test_file_stem() {
        let stem = file_stem("https://www.edinburgh.gov.uk/directory/10199/a-to-z/B");
        let (readable, digest) = stem.rsplit_once('-').unwrap();
        assert_eq!(readable, "www_edinburgh_gov_uk_directory_10199_a-to-z_B");
        assert_eq!(digest.len(), 12);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
        // Stable across calls.
        assert_eq!(stem, file_stem("https://www.edinburgh.gov.uk/directory/10199/a-to-z/B"));
    }

    #[test]
    fn test_file_stem_distinguishes_similar_addresses() {
        assert_ne!(file_stem("https://example.org/a/b"), file_stem("https://example.org/a_b"));
        assert_ne!(
            file_stem("https://example.org/search?q=a"),
            file_stem("https://example.org/search?q_a")
        );
        assert_ne!(file_stem("http://example.org/a"), file_stem("https://example.org/a"));
    }
}
