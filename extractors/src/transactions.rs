use crate::number::normalize_number;
use serde_json::{Map, Value};
use shared_types::{TransactionRecord, TransactionType};

/// Outcome of normalizing one model response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedBatch {
    pub records: Vec<TransactionRecord>,
    /// Entries that were present but failed the amount/type checks
    pub dropped: usize,
}

pub fn normalize_transactions(parsed: &Map<String, Value>) -> Vec<TransactionRecord> {
    normalize_transactions_with_stats(parsed).records
}

/// Maps `parsed.transactions` onto [`TransactionRecord`]s.
///
/// A missing or non-array `transactions` yields an empty batch. Entries whose
/// amount does not normalize to a number, or whose type is not exactly
/// `Credit` or `Debit`, are left out and counted in `dropped`. Order follows
/// the input array.
pub fn normalize_transactions_with_stats(parsed: &Map<String, Value>) -> NormalizedBatch {
    let Some(entries) = parsed.get("transactions").and_then(Value::as_array) else {
        return NormalizedBatch::default();
    };

    let mut batch = NormalizedBatch::default();
    for entry in entries {
        match entry.as_object().and_then(normalize_entry) {
            Some(record) => batch.records.push(record),
            None => batch.dropped += 1,
        }
    }
    batch
}

fn normalize_entry(entry: &Map<String, Value>) -> Option<TransactionRecord> {
    let amount = normalize_number(field(entry, "amount", "Amount"))?;
    let transaction_type = field(entry, "type", "Type")
        .and_then(Value::as_str)
        .and_then(TransactionType::from_literal)?;

    Some(TransactionRecord {
        id: text_field(entry, "id", "Id"),
        user_id: text_field(entry, "userId", "UserId"),
        date: text_field(entry, "date", "Date"),
        description: text_field(entry, "description", "Description"),
        amount,
        transaction_type,
        category: text_field(entry, "category", "Category"),
        balance: normalize_number(field(entry, "balance", "Balance")),
    })
}

// Some prompts asked for capitalized keys, so both spellings are read
fn field<'a>(entry: &'a Map<String, Value>, key: &str, capitalized: &str) -> Option<&'a Value> {
    entry
        .get(key)
        .filter(|v| !v.is_null())
        .or_else(|| entry.get(capitalized))
}

fn text_field(entry: &Map<String, Value>, key: &str, capitalized: &str) -> Option<String> {
    match field(entry, key, capitalized)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
