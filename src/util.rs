//! Small utility helpers used across modules.

/// Log-safe truncation for large strings (editor content can be long).
/// Cuts on a char boundary at or below `max` bytes.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut end = max;
  while !s.is_char_boundary(end) {
    end -= 1;
  }
  format!("{}… ({} bytes total)", &s[..end], s.len())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn short_strings_are_untouched() {
    assert_eq!(trunc_for_log("<table>", 20), "<table>");
  }

  #[test]
  fn cuts_on_char_boundary() {
    let s = "€€€";
    assert_eq!(trunc_for_log(s, 4), "€… (9 bytes total)");
  }
}
