//! CSV utilities for AI insight. Uses the `csv` crate for safe serialization.
//!
//! Converts recorded purchase rates to CSV format suitable for LLM context
//! input.

use crate::domain::PurchaseRate;

/// Convert purchase rates to a CSV string for LLM context.
///
/// Format: `Date;Product;UnitPrice;Supplier` (semicolon-delimited for LLM
/// token efficiency). Rows keep the caller's order — pass history oldest
/// first so the model sees the series in time order.
pub fn rates_to_csv(rates: &[PurchaseRate]) -> Result<String, csv::Error> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b';')
        .has_headers(true)
        .from_writer(Vec::new());

    wtr.write_record(["Date", "Product", "UnitPrice", "Supplier"])?;

    for rate in rates {
        let date_str = rate.date.format("%Y-%m-%d").to_string();
        let price_str = format!("{}", rate.unit_price);
        // Clean free text: the csv crate handles quoting, but newlines hurt
        // LLM readability.
        let product = rate.product.replace('\n', " ").replace('\r', "");
        let supplier = rate
            .supplier
            .as_deref()
            .unwrap_or("unknown")
            .replace('\n', " ")
            .replace('\r', "");

        wtr.write_record([&date_str, &product, &price_str, &supplier])?;
    }

    wtr.flush()?;
    let bytes = wtr
        .into_inner()
        .map_err(|e| csv::Error::from(std::io::Error::other(e.to_string())))?;

    String::from_utf8(bytes).map_err(|e| {
        csv::Error::from(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            e.to_string(),
        ))
    })
}
