// lib/src/mirror/tabular.rs
// Delimited tabular mirrors: a header row naming the columns, then one row per record.

use models::MirrorRow;

use crate::errors::SyncError;

/// Rewrites the first data row whose key column equals `row`'s key. Returns
/// `None` when no row matches or the file is empty. Columns the header does
/// not name are left alone; fields the header lacks are skipped.
pub fn apply_row(content: &str, row: &MirrorRow, delimiter: char, path: &str) -> Result<Option<String>, SyncError> {
    let mut lines = content.split_inclusive('\n');
    let mut out = String::with_capacity(content.len() + 64);

    let header = loop {
        match lines.next() {
            None => return Ok(None),
            Some(raw) => {
                out.push_str(raw);
                let line = strip_line_ending(raw);
                if !line.trim().is_empty() {
                    break line;
                }
            }
        }
    };
    let columns: Vec<&str> = header
        .split(delimiter)
        .map(|c| c.trim().trim_start_matches('\u{feff}'))
        .collect();
    let key_index = columns
        .iter()
        .position(|c| *c == row.key_field())
        .ok_or_else(|| SyncError::MalformedHeader { path: path.to_string(), key: row.key_field().to_string() })?;

    let mut matched = false;
    for raw in lines {
        let line = strip_line_ending(raw);
        let mut cells: Vec<String> = line.split(delimiter).map(str::to_string).collect();
        let is_match = !matched && cells.get(key_index).is_some_and(|cell| cell.trim() == row.key());
        if !is_match {
            out.push_str(raw);
            continue;
        }
        if cells.len() < columns.len() {
            cells.resize(columns.len(), String::new());
        }
        for (index, column) in columns.iter().enumerate() {
            if index == key_index {
                continue;
            }
            if let Some(value) = row.fields().iter().find(|(field, _)| field == column).map(|(_, v)| v) {
                cells[index] = sanitize(value, delimiter);
            }
        }
        out.push_str(&cells.join(&delimiter.to_string()));
        out.push_str(&raw[line.len()..]);
        matched = true;
    }

    Ok(matched.then_some(out))
}

/// Replaces the delimiter and line breaks with spaces so a value stays in its cell.
pub fn sanitize(value: &str, delimiter: char) -> String {
    value
        .chars()
        .map(|c| if c == delimiter || c == '\n' || c == '\r' { ' ' } else { c })
        .collect()
}

fn strip_line_ending(raw: &str) -> &str {
    raw.trim_end_matches(['\n', '\r'])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail_row(codes: &str, reason: &str) -> MirrorRow {
        let mut row = MirrorRow::new("claim_id", "42".to_string());
        row.add_field("denial_reason", reason);
        row.add_field("cpt_codes", codes);
        row
    }

    #[test]
    fn should_rewrite_matching_row_by_header_order() {
        let content = "claim_id|cpt_codes|denial_reason\n41|99211|\n42|99213|Old\n";
        let updated = apply_row(content, &detail_row("99213,99214", ""), '|', "d.psv").unwrap().unwrap();
        assert_eq!(updated, "claim_id|cpt_codes|denial_reason\n41|99211|\n42|99213,99214|\n");
    }

    #[test]
    fn should_pad_short_rows_and_keep_unknown_columns() {
        let content = "extra|claim_id|denial_reason|cpt_codes\r\nx|42\r\n";
        let updated = apply_row(content, &detail_row("A", "Late filing"), '|', "d.psv").unwrap().unwrap();
        assert_eq!(updated, "extra|claim_id|denial_reason|cpt_codes\r\nx|42|Late filing|A\r\n");
    }

    #[test]
    fn should_sanitize_values() {
        assert_eq!(sanitize("a|b\nc\r", '|'), "a b c ");
        assert_eq!(sanitize("a,b", '|'), "a,b");
        let content = "claim_id|denial_reason|cpt_codes\n42||\n";
        let updated = apply_row(content, &detail_row("A", "one|two"), '|', "d.psv").unwrap().unwrap();
        assert_eq!(updated, "claim_id|denial_reason|cpt_codes\n42|one two|A\n");
    }

    #[test]
    fn should_report_missing_rows_and_bad_headers() {
        let row = detail_row("A", "");
        assert!(apply_row("", &row, '|', "d.psv").unwrap().is_none());
        assert!(apply_row("claim_id|cpt_codes\n7|B\n", &row, '|', "d.psv").unwrap().is_none());
        assert!(matches!(
            apply_row("id|cpt_codes\n42|B\n", &row, '|', "d.psv"),
            Err(SyncError::MalformedHeader { .. })
        ));
    }
}
