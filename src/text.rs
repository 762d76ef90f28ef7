//! Small string helpers shared by the generators and publishers

/// Longest prefix of `text` holding at most `max_chars` characters
pub fn excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Cut `text` to `max_chars` characters and append "..." when anything was cut
pub fn truncate_ellipsis(text: &str, max_chars: usize) -> String {
    let cut = excerpt(text, max_chars);
    if cut.len() < text.len() {
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}

/// Human-facing persona name: separators become spaces, words are title-cased
///
/// `luna_stardust` becomes `Luna Stardust`. A letter is upper-cased when it
/// follows a non-letter and lower-cased otherwise.
pub fn display_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_alpha = false;
    for c in name.chars() {
        let c = if c == '_' { ' ' } else { c };
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}
