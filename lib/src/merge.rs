// lib/src/merge.rs
// Field merge rules for editable claim detail fields, plus the casing
// normalization applied to every edited text field.

use models::{MergeField, MergeMode};

/// Capitalizes the first letter of every word and lowercases the rest.
/// Words are runs of letters and digits; an apostrophe inside a word does not
/// start a new one (`o'neil` becomes `O'neil`).
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = c.is_alphanumeric() || (c == '\'' && in_word);
        }
    }
    out
}

/// Uppercases the first character and lowercases everything after it.
pub fn sentence_case(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Normalization for an incoming value of a merge field: denial reasons are
/// sentence-cased, everything else title-cased. Surrounding whitespace is dropped.
pub fn normalize(field: MergeField, text: &str) -> String {
    let trimmed = text.trim();
    match field {
        MergeField::DenialReason => sentence_case(trimmed),
        MergeField::CptCodes => title_case(trimmed),
    }
}

/// Combines an edited value with the stored one.
///
/// A blank or absent `incoming` leaves `current` unchanged. Otherwise the
/// normalized incoming value replaces `current` (`Overwrite`), or is joined to
/// it with the field's separator (`Append`); appending to a blank value yields
/// the incoming value alone.
pub fn merge(current: Option<&str>, incoming: Option<&str>, mode: MergeMode, field: MergeField) -> String {
    let current = current.unwrap_or("");
    let incoming = match incoming.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => normalize(field, value),
        None => return current.to_string(),
    };
    match mode {
        MergeMode::Overwrite => incoming,
        MergeMode::Append if current.trim().is_empty() => incoming,
        MergeMode::Append => format!("{}{}{}", current, field.append_separator(), incoming),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_title_case_words() {
        assert_eq!(title_case("jane DOE"), "Jane Doe");
        assert_eq!(title_case("blue cross-blue shield"), "Blue Cross-Blue Shield");
        assert_eq!(title_case("o'neil"), "O'neil");
        assert_eq!(title_case("99213,99214"), "99213,99214");
        assert_eq!(title_case("99213-25, g0008"), "99213-25, G0008");
        assert_eq!(title_case("1st review"), "1st Review");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn should_sentence_case_text() {
        assert_eq!(sentence_case("late filing"), "Late filing");
        assert_eq!(sentence_case("MISSING Auth"), "Missing auth");
        assert_eq!(sentence_case("é"), "É");
        assert_eq!(sentence_case(""), "");
    }

    #[test]
    fn should_keep_current_when_incoming_blank() {
        for incoming in [None, Some(""), Some("   ")] {
            for mode in [MergeMode::Overwrite, MergeMode::Append] {
                assert_eq!(merge(Some("99213"), incoming, mode, MergeField::CptCodes), "99213");
            }
        }
        assert_eq!(merge(None, None, MergeMode::Append, MergeField::DenialReason), "");
    }

    #[test]
    fn should_overwrite_with_normalized_value() {
        assert_eq!(merge(Some("anything"), Some("late filing"), MergeMode::Overwrite, MergeField::DenialReason), "Late filing");
        assert_eq!(merge(None, Some("99214"), MergeMode::Overwrite, MergeField::CptCodes), "99214");
        assert_eq!(merge(Some("A,B"), Some(" j1100 "), MergeMode::Overwrite, MergeField::CptCodes), "J1100");
    }

    #[test]
    fn should_be_idempotent_under_overwrite() {
        let once = merge(Some("x"), Some("coverage lapsed"), MergeMode::Overwrite, MergeField::DenialReason);
        let twice = merge(Some(&once), Some("coverage lapsed"), MergeMode::Overwrite, MergeField::DenialReason);
        assert_eq!(once, twice);
    }

    #[test]
    fn should_append_cpt_codes_with_comma() {
        assert_eq!(merge(Some("A,B"), Some("C"), MergeMode::Append, MergeField::CptCodes), "A,B,C");
        assert_eq!(merge(Some("99213"), Some("99214"), MergeMode::Append, MergeField::CptCodes), "99213,99214");
        assert_eq!(merge(Some(""), Some("99214"), MergeMode::Append, MergeField::CptCodes), "99214");
        assert_eq!(merge(None, Some("99214"), MergeMode::Append, MergeField::CptCodes), "99214");
    }

    #[test]
    fn should_append_denial_reason_as_sentence() {
        assert_eq!(
            merge(Some("Missing auth"), Some("late filing"), MergeMode::Append, MergeField::DenialReason),
            "Missing auth. Late filing"
        );
        assert_eq!(merge(Some("  "), Some("late filing"), MergeMode::Append, MergeField::DenialReason), "Late filing");
    }
}
