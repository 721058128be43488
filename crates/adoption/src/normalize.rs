/// Lowercase a string for case-insensitive comparison.
///
/// Whitespace and accents are left alone; only case is folded.
pub fn normalize(text: &str) -> String {
  text.to_lowercase()
}

/// Substring containment after normalizing both sides. An empty needle
/// always matches.
pub fn contains_normalized(haystack: &str, needle: &str) -> bool {
  if needle.is_empty() {
    return true;
  }
  normalize(haystack).contains(&normalize(needle))
}
