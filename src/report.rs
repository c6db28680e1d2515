//! Terminal output for finished predictions.

use serde_json::{Value, json};

use crate::batch::BatchEntry;
use crate::consts::group_digits;
use crate::events::Terminal;

/// Format a price with two decimals and comma separators (e.g. 1,234.50).
///
/// Works on the decimal text, so prices beyond `u64` keep every digit.
pub fn format_price(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let nonzero = fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0');
    let sign = if value.is_sign_negative() && nonzero {
        "-"
    } else {
        ""
    };
    format!("{}{}.{}", sign, group_digits(whole), cents)
}

/// One machine-readable line per entry, used by `--json`.
pub fn entry_json(entry: &BatchEntry) -> Value {
    match &entry.result {
        Ok(prediction) => json!({
            "area": entry.request.area(),
            "ok": true,
            "outcome": Terminal::Succeeded,
            "result": prediction.to_value(),
        }),
        Err(e) => json!({
            "area": entry.request.area(),
            "ok": false,
            "outcome": e.terminal(),
            "error": e.to_string(),
        }),
    }
}

/// Print an entry: results to stdout, errors to stderr.
pub fn print_entry(entry: &BatchEntry, as_json: bool) {
    if as_json {
        println!("{}", entry_json(entry));
        return;
    }
    match &entry.result {
        Ok(prediction) => {
            let pretty = serde_json::to_string_pretty(&prediction.to_value())
                .unwrap_or_else(|_| prediction.to_value().to_string());
            println!("Result: {}", pretty);
            println!("Predicted price: ${}", format_price(prediction.prediction));
        }
        Err(e) => eprintln!("Error: {}", e),
    }
}

/// Print a one-line tally. Only worth showing for more than one entry.
pub fn print_summary(entries: &[BatchEntry]) {
    if entries.len() < 2 {
        return;
    }
    let succeeded = entries.iter().filter(|e| e.is_success()).count();
    println!(
        "batch: {} succeeded, {} failed",
        succeeded,
        entries.len() - succeeded
    );
}
