//! Rounding and display rules for quote amounts.

use serde::{Deserialize, Serialize};

use super::entities::CurrencyValue;

/// The local (non-USD) currency a rate table is priced in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalCurrency {
    pub code: String,
    pub symbol: String,
}

impl Default for LocalCurrency {
    fn default() -> Self {
        Self {
            code: "KRW".to_string(),
            symbol: "₩".to_string(),
        }
    }
}

/// Rounds to cents and renders as `$1,234.50`.
///
/// The digits come from the float itself, so `formatted` always matches `raw`
/// however large the amount.
pub fn format_usd(value: f64) -> CurrencyValue {
    let cents = value * 100.0;
    let raw = if cents.is_finite() {
        cents.round() / 100.0
    } else {
        value
    };
    let sign = if raw < 0.0 { "-" } else { "" };
    let digits = format!("{:.2}", raw.abs());
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));
    CurrencyValue {
        raw,
        formatted: format!("{sign}${}.{fraction}", group_thousands(whole)),
    }
}

/// Floors to whole units and renders with the currency symbol, e.g. `₩1,680,000`.
pub fn format_local(value: f64, currency: &LocalCurrency) -> CurrencyValue {
    let raw = value.floor();
    let sign = if raw < 0.0 { "-" } else { "" };
    CurrencyValue {
        raw,
        formatted: format!(
            "{sign}{}{}",
            currency.symbol,
            group_thousands(&format!("{:.0}", raw.abs()))
        ),
    }
}

fn group_thousands(digits: &str) -> String {
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return digits.to_string();
    }
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usd_rounds_to_cents() {
        let value = format_usd(1200.0);
        assert_eq!(value.raw, 1200.0);
        assert_eq!(value.formatted, "$1,200.00");

        let value = format_usd(36.960000000000001);
        assert_eq!(value.raw, 36.96);
        assert_eq!(value.formatted, "$36.96");

        assert_eq!(format_usd(0.0).formatted, "$0.00");
        assert_eq!(format_usd(1234567.891).formatted, "$1,234,567.89");
    }

    #[test]
    fn local_floors_to_whole_units() {
        let krw = LocalCurrency::default();
        let value = format_local(1_680_000.0, &krw);
        assert_eq!(value.raw, 1_680_000.0);
        assert_eq!(value.formatted, "₩1,680,000");

        let value = format_local(749_999.99, &krw);
        assert_eq!(value.raw, 749_999.0);
        assert_eq!(value.formatted, "₩749,999");

        assert_eq!(format_local(999.9, &krw).formatted, "₩999");
    }

    #[test]
    fn custom_symbol_is_used() {
        let yen = LocalCurrency {
            code: "JPY".to_string(),
            symbol: "¥".to_string(),
        };
        assert_eq!(format_local(15000.0, &yen).formatted, "¥15,000");
    }

    #[test]
    fn amounts_past_u64_keep_every_digit() {
        let value = format_usd(18_446_744_073_709_551_616.0);
        assert_eq!(value.raw, 18_446_744_073_709_551_616.0);
        assert_eq!(value.formatted, "$18,446,744,073,709,551,616.00");

        let value = format_usd(8e19);
        assert_eq!(value.formatted, "$80,000,000,000,000,000,000.00");

        let krw = LocalCurrency::default();
        let value = format_local(2e19, &krw);
        assert_eq!(value.raw, 2e19);
        assert_eq!(value.formatted, "₩20,000,000,000,000,000,000");
    }

    #[test]
    fn near_max_amount_stays_finite() {
        let value = format_usd(1e307);
        assert_eq!(value.raw, 1e307);
        assert!(value.formatted.ends_with(".00"));
        let digits: String = value.formatted.chars().filter(|c| *c != '$' && *c != ',').collect();
        assert_eq!(digits.parse::<f64>().unwrap(), value.raw);
    }

    #[test]
    fn negative_amounts_carry_sign() {
        assert_eq!(format_usd(-1234.5).formatted, "-$1,234.50");
        assert_eq!(format_usd(-0.001).formatted, "$0.00");
    }
}
