use csv::{QuoteStyle, Terminator, WriterBuilder};
use shared_types::TransactionRecord;

pub const CSV_HEADERS: [&str; 8] = [
    "id",
    "userId",
    "date",
    "description",
    "amount",
    "type",
    "category",
    "balance",
];

/// Renders records as CSV: a bare header row, then one row per record.
///
/// Quoting follows the field type, not its content: every present text field
/// is quoted with embedded quotes doubled, numbers are bare, and absent
/// values are empty.
pub fn render_csv(records: &[TransactionRecord]) -> Result<String, csv::Error> {
    // Fields are pre-quoted in `row`, so the writer must not quote again
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Never)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADERS)?;
    for record in records {
        writer.write_record(row(record))?;
    }
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn row(record: &TransactionRecord) -> [String; 8] {
    [
        quoted(record.id.as_deref()),
        quoted(record.user_id.as_deref()),
        quoted(record.date.as_deref()),
        quoted(record.description.as_deref()),
        record.amount.to_string(),
        quoted(Some(record.transaction_type.as_str())),
        quoted(record.category.as_deref()),
        record.balance.map(|b| b.to_string()).unwrap_or_default(),
    ]
}

fn quoted(value: Option<&str>) -> String {
    match value {
        Some(text) => format!("\"{}\"", text.replace('"', "\"\"")),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::TransactionType;

    fn record(description: &str, amount: f64, balance: Option<f64>) -> TransactionRecord {
        TransactionRecord {
            id: Some("txn-1".to_string()),
            user_id: Some("user123".to_string()),
            date: Some("2024-01-01".to_string()),
            description: Some(description.to_string()),
            amount,
            transaction_type: TransactionType::Debit,
            category: Some("Food".to_string()),
            balance,
        }
    }

    #[test]
    fn test_header_row() {
        let csv = render_csv(&[]).unwrap();
        assert_eq!(csv, "id,userId,date,description,amount,type,category,balance\n");
    }

    #[test]
    fn test_strings_quoted_numbers_bare() {
        let csv = render_csv(&[record("Coffee", 12.5, Some(987.5))]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[1],
            r#""txn-1","user123","2024-01-01","Coffee",12.5,"Debit","Food",987.5"#
        );
    }

    #[test]
    fn test_embedded_quotes_are_doubled() {
        let csv = render_csv(&[record(r#"Joe's "Diner", Main St"#, 1234.0, Some(5.25))]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert!(lines[1].contains(r#""Joe's ""Diner"", Main St""#));
        assert!(lines[1].contains(",1234,"));
    }

    #[test]
    fn test_numeric_looking_text_stays_quoted() {
        let record = TransactionRecord {
            id: Some("1001".to_string()),
            user_id: None,
            date: Some("2024-01-01".to_string()),
            description: Some("NaN".to_string()),
            amount: 5.0,
            transaction_type: TransactionType::Debit,
            category: Some("inf".to_string()),
            balance: None,
        };
        let csv = render_csv(&[record]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[1], r#""1001",,"2024-01-01","NaN",5,"Debit","inf","#);
    }

    #[test]
    fn test_multiline_description_round_trips() {
        let csv = render_csv(&[record("ATM WDL\nBRANCH 12", 20.0, None)]).unwrap();
        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(&row[3], "ATM WDL\nBRANCH 12");
        assert_eq!(&row[4], "20");
    }

    #[test]
    fn test_rows_follow_record_order() {
        let csv = render_csv(&[record("first", 1.0, None), record("second", 2.0, None)]).unwrap();

        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let descriptions: Vec<String> = reader
            .records()
            .map(|r| r.unwrap()[3].to_string())
            .collect();
        assert_eq!(descriptions, vec!["first", "second"]);

        let balances: Vec<String> = csv::Reader::from_reader(csv.as_bytes())
            .records()
            .map(|r| r.unwrap()[7].to_string())
            .collect();
        assert_eq!(balances, vec!["", ""]);
    }
}
