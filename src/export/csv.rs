use super::Table;

fn csv_quote(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Header line then one line per row, `\n` terminated.
#[must_use]
pub fn write_csv(table: &Table) -> String {
    let mut out = String::new();
    let header: Vec<String> = table.columns.iter().map(|c| csv_quote(c)).collect();
    out.push_str(&header.join(","));
    out.push('\n');
    for row in &table.rows {
        let line: Vec<String> = row.iter().map(|c| csv_quote(c)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_csv_quotes_only_when_needed() {
        let table = Table::new(
            &["MIS Number", "Name"],
            vec![
                vec!["S1".to_string(), "Asha".to_string()],
                vec!["S2".to_string(), "Khan, \"Bilal\"".to_string()],
            ],
        );
        assert_eq!(
            write_csv(&table),
            "MIS Number,Name\nS1,Asha\nS2,\"Khan, \"\"Bilal\"\"\"\n"
        );
    }

    #[test]
    fn test_write_csv_header_only() {
        let table = Table::new(&["Date", "Subject", "Status"], Vec::new());
        assert_eq!(write_csv(&table), "Date,Subject,Status\n");
    }
}
