//! Splitting of companion command lines into tokens.

/// Split `line` on whitespace, honoring double-quoted tokens.
///
/// A token that starts with `"` runs to the next `"` with the quotes removed
/// and inner whitespace kept; without a closing quote it runs to the end of
/// the line. A quote anywhere else is an ordinary character.
#[must_use]
pub fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        let Some(first) = chars.next() else {
            break;
        };

        let mut token = String::new();
        if first == '"' {
            for c in chars.by_ref() {
                if c == '"' {
                    break;
                }
                token.push(c);
            }
        } else {
            token.push(first);
            while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                token.push(c);
            }
        }
        tokens.push(token);
    }
    tokens
}
