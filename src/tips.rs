//! The receipt row carrying the tip, and how totals are printed.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

use crate::error::TipFailure;

/// A receipt line item whose label cell reads `Tip`, followed by two empty
/// cells and the amount.
pub static TIP_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<tr><td.*>Tip</td><td></td><td></td><td>\$(\d+)\.(\d+)</td></tr>")
        .expect("tip row pattern is valid")
});

/// Pull the tip amount out of a receipt's HTML body as an exact decimal.
pub fn extract_tip(html: &str) -> Result<Decimal, TipFailure> {
    let caps = TIP_ROW.captures(html).ok_or(TipFailure::NoTipRow)?;
    let amount = format!("{}.{}", &caps[1], &caps[2]);
    Decimal::from_str(&amount).map_err(|_| TipFailure::InvalidAmount(amount))
}

/// `$1,234.50` style rendering, rounded to cents.
pub fn format_currency(amount: Decimal) -> String {
    let fixed = format!("{:.2}", amount.round_dp(2).abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount.is_sign_negative() && !amount.is_zero() { "-" } else { "" };
    format!("{sign}${grouped}.{cents}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn extracts_tip_from_receipt_row() {
        let html = r#"<table><tr><td class="label">Subtotal</td><td></td><td></td><td>$40.00</td></tr>
<tr><td class="label">Tip</td><td></td><td></td><td>$12.34</td></tr></table>"#;
        assert_eq!(extract_tip(html).unwrap(), dec("12.34"));
    }

    #[test]
    fn tags_match_case_insensitively() {
        let html = "<TR><TD>Tip</TD><TD></TD><TD></TD><TD>$7.05</TD></TR>";
        assert_eq!(extract_tip(html).unwrap(), dec("7.05"));
    }

    #[test]
    fn amount_is_exact() {
        let html = "<tr><td>Tip</td><td></td><td></td><td>$0.10</td></tr>";
        let tip = extract_tip(html).unwrap();
        assert_eq!(tip + tip + tip, dec("0.30"));
    }

    #[test]
    fn row_with_wrong_cell_count_does_not_match() {
        let html = "<tr><td>Tip</td><td></td><td>$12.34</td></tr>";
        assert!(matches!(extract_tip(html), Err(TipFailure::NoTipRow)));
    }

    #[test]
    fn amount_without_dollar_sign_does_not_match() {
        let html = "<tr><td>Tip</td><td></td><td></td><td>12.34</td></tr>";
        assert!(matches!(extract_tip(html), Err(TipFailure::NoTipRow)));
    }

    #[test]
    fn formats_currency() {
        assert_eq!(format_currency(Decimal::ZERO), "$0.00");
        assert_eq!(format_currency(dec("12.3")), "$12.30");
        assert_eq!(format_currency(dec("1234.5")), "$1,234.50");
        assert_eq!(format_currency(dec("1234567.891")), "$1,234,567.89");
        assert_eq!(format_currency(dec("-5")), "-$5.00");
    }
}
