//! Name and help text normalization.
//!
//! Applied when nodes are constructed, never at the codec boundary, so that
//! decoding a message reproduces exactly what the sender encoded.

/// Normalize a member name: trim, title-case each whitespace-delimited word,
/// then join the words without separators.
///
/// `"  my name  "` becomes `"MyName"`; `None` becomes `""`.
#[must_use]
pub fn name<'a>(raw: impl Into<Option<&'a str>>) -> String {
    let Some(raw) = raw.into() else {
        return String::new();
    };

    raw.split_whitespace().map(capitalize).collect()
}

/// Normalize help text: trim, uppercase the first character and make sure a
/// non-empty text ends with a period.
///
/// `"test test test"` becomes `"Test test test."`; `None` becomes `""`.
#[must_use]
pub fn help<'a>(raw: impl Into<Option<&'a str>>) -> String {
    let Some(raw) = raw.into() else {
        return String::new();
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let mut text = capitalize(trimmed);
    if !text.ends_with('.') {
        text.push('.');
    }
    text
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_title_cases_and_joins_words() {
        assert_eq!(name(" test test "), "TestTest");
        assert_eq!(name("  my name  "), "MyName");
    }

    #[test]
    fn test_name_none_is_empty() {
        assert_eq!(name(None), "");
        assert_eq!(name("   "), "");
    }

    #[test]
    fn test_name_keeps_inner_capitals() {
        assert_eq!(name("set point"), "SetPoint");
        assert_eq!(name("SetPoint"), "SetPoint");
    }

    #[test]
    fn test_help_capitalizes_and_terminates() {
        assert_eq!(help("test test test"), "Test test test.");
        assert_eq!(help("  Already done.  "), "Already done.");
    }

    #[test]
    fn test_help_none_and_blank_are_empty() {
        assert_eq!(help(None), "");
        assert_eq!(help("  "), "");
    }
}
