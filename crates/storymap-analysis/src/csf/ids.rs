//! Storybook naming helpers: story ids and display names.

/// Lowercase `text` and collapse every run of non-alphanumeric characters
/// into a single `-`, trimming dashes at both ends.
pub fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in text.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }

    out
}

/// Storybook id of a story: `<sanitized title or meta id>--<sanitized export>`.
pub fn story_id(kind: &str, export_name: &str) -> String {
    format!("{}--{}", sanitize(kind), sanitize(export_name))
}

/// Split an identifier into words at case changes, digit boundaries and
/// separators, then capitalize each word: `primaryButton_2` -> `Primary Button 2`.
pub fn start_case(identifier: &str) -> String {
    let chars: Vec<char> = identifier.chars().collect();
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        if let Some(prev) = current.chars().last() {
            let next = chars.get(i + 1).copied();
            let boundary = (prev.is_lowercase() && c.is_uppercase())
                || (prev.is_alphabetic() && c.is_numeric())
                || (prev.is_numeric() && c.is_alphabetic())
                // "HTMLButton": the last capital starts a new word
                || (prev.is_uppercase()
                    && c.is_uppercase()
                    && next.is_some_and(char::is_lowercase));
            if boundary {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_titles() {
        assert_eq!(sanitize("Components/Button"), "components-button");
        assert_eq!(sanitize("  Forms / Text Input!! "), "forms-text-input");
        assert_eq!(sanitize("Primary"), "primary");
    }

    #[test]
    fn builds_story_ids() {
        assert_eq!(story_id("Components/Button", "Primary"), "components-button--primary");
        assert_eq!(story_id("Card", "WithImage_2"), "card--withimage-2");
    }

    #[test]
    fn start_cases_exports() {
        assert_eq!(start_case("Primary"), "Primary");
        assert_eq!(start_case("primaryButton"), "Primary Button");
        assert_eq!(start_case("WithHTMLContent"), "With HTML Content");
        assert_eq!(start_case("Size_2xl"), "Size 2 Xl");
        assert_eq!(start_case("__private"), "Private");
    }
}
