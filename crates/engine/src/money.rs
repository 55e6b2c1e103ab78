use crate::{Currency, EngineError, ResultEngine};

/// Signed money amount represented as integer **minor units**.
///
/// Use this type for **all** monetary values in the engine (expense amounts,
/// splits, settlements, balances) to avoid floating-point drift.
///
/// The value is signed:
/// - positive = credit (is owed money / paid)
/// - negative = debit
///
/// # Examples
///
/// ```rust
/// use engine::{Currency, Money};
///
/// let amount = Money::new(12_34);
/// assert_eq!(amount.minor(), 1234);
/// assert_eq!(amount.format(Currency::Eur), "12.34 €");
/// ```
///
/// Parsing from user input (accepts `.` or `,` as decimal separator; rejects
/// more decimals than the currency allows):
///
/// ```rust
/// use engine::{Currency, Money};
///
/// assert_eq!(Money::parse_major("10", Currency::Eur).unwrap().minor(), 1000);
/// assert_eq!(Money::parse_major("10,5", Currency::Eur).unwrap().minor(), 1050);
/// assert!(Money::parse_major("12.345", Currency::Eur).is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates a new amount from integer minor units.
    #[must_use]
    pub const fn new(minor: i64) -> Self {
        Self(minor)
    }

    /// Returns the raw value in minor units.
    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Formats the amount in major units followed by the currency symbol,
    /// e.g. `12.50 €`.
    #[must_use]
    pub fn format(self, currency: Currency) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let digits = u32::from(currency.minor_units());
        let scale = 10u64.pow(digits);
        let major = abs / scale;
        if digits == 0 {
            return format!("{sign}{major} {}", currency.symbol());
        }
        let minor = abs % scale;
        format!(
            "{sign}{major}.{minor:0width$} {symbol}",
            width = digits as usize,
            symbol = currency.symbol()
        )
    }

    /// Parses a decimal string in major units.
    ///
    /// Accepts `.` or `,` as decimal separator and an optional leading `+`/`-`.
    ///
    /// Validation rules:
    /// - at most `currency.minor_units()` fractional digits
    /// - rejects empty/invalid strings and overflowing values
    pub fn parse_major(s: &str, currency: Currency) -> ResultEngine<Money> {
        let empty = || EngineError::InvalidAmount("empty amount".to_string());
        let invalid = || EngineError::InvalidAmount("invalid amount".to_string());
        let overflow = || EngineError::InvalidAmount("amount too large".to_string());

        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(empty());
        }

        let (negative, rest) = if let Some(stripped) = trimmed.strip_prefix('-') {
            (true, stripped)
        } else if let Some(stripped) = trimmed.strip_prefix('+') {
            (false, stripped)
        } else {
            (false, trimmed)
        };

        let rest = rest.trim();
        if rest.is_empty() {
            return Err(empty());
        }

        let rest = rest.replace(',', ".");
        let mut parts = rest.split('.');
        let major_str = parts.next().ok_or_else(invalid)?;
        let fraction_str = parts.next();
        if parts.next().is_some() {
            return Err(invalid());
        }

        if major_str.is_empty() || !major_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let major: i64 = major_str.parse().map_err(|_| overflow())?;

        let digits = usize::from(currency.minor_units());
        let scale = 10i64.pow(u32::from(currency.minor_units()));
        let fraction: i64 = match fraction_str {
            None | Some("") => 0,
            Some(frac) => {
                if !frac.chars().all(|c| c.is_ascii_digit()) {
                    return Err(invalid());
                }
                if frac.len() > digits {
                    return Err(EngineError::InvalidAmount("too many decimals".to_string()));
                }
                let padded = format!("{frac:0<digits$}");
                padded.parse().map_err(|_| invalid())?
            }
        };

        let total = major
            .checked_mul(scale)
            .and_then(|v| v.checked_add(fraction))
            .ok_or_else(overflow)?;
        let signed = if negative {
            total.checked_neg().ok_or_else(overflow)?
        } else {
            total
        };

        Ok(Money(signed))
    }

    /// Splits a non-negative amount evenly across `parts` shares.
    ///
    /// Each share is `amount / parts`; the first `amount % parts` shares carry
    /// one extra minor unit so that the shares always sum to the amount.
    pub fn split_even(self, parts: usize) -> ResultEngine<Vec<Money>> {
        if parts == 0 {
            return Err(EngineError::InvalidAmount(
                "cannot split across zero participants".to_string(),
            ));
        }
        if self.0 < 0 {
            return Err(EngineError::InvalidAmount(
                "cannot split a negative amount".to_string(),
            ));
        }
        let n = i64::try_from(parts)
            .map_err(|_| EngineError::InvalidAmount("too many participants".to_string()))?;
        let base = self.0 / n;
        let remainder = self.0 % n;
        Ok((0..n)
            .map(|idx| Money(base + i64::from(idx < remainder)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_eur() {
        assert_eq!(Money::new(0).format(Currency::Eur), "0.00 €");
        assert_eq!(Money::new(1).format(Currency::Eur), "0.01 €");
        assert_eq!(Money::new(10).format(Currency::Eur), "0.10 €");
        assert_eq!(Money::new(1050).format(Currency::Eur), "10.50 €");
        assert_eq!(Money::new(-1050).format(Currency::Usd), "-10.50 $");
    }

    #[test]
    fn parse_accepts_dot_or_comma() {
        let eur = Currency::Eur;
        assert_eq!(Money::parse_major("10", eur).unwrap().minor(), 1000);
        assert_eq!(Money::parse_major("10.5", eur).unwrap().minor(), 1050);
        assert_eq!(Money::parse_major("10,50", eur).unwrap().minor(), 1050);
        assert_eq!(Money::parse_major("-0.01", eur).unwrap().minor(), -1);
        assert_eq!(Money::parse_major("+1.00", eur).unwrap().minor(), 100);
        assert_eq!(Money::parse_major("  2.30 ", eur).unwrap().minor(), 230);
        assert_eq!(Money::parse_major("7.", eur).unwrap().minor(), 700);
    }

    #[test]
    fn parse_rejects_garbage() {
        let eur = Currency::Eur;
        assert!(Money::parse_major("12.345", eur).is_err());
        assert!(Money::parse_major("", eur).is_err());
        assert!(Money::parse_major("-", eur).is_err());
        assert!(Money::parse_major("1.2.3", eur).is_err());
        assert!(Money::parse_major("abc", eur).is_err());
        assert!(Money::parse_major(".50", eur).is_err());
        assert!(Money::parse_major("99999999999999999999", eur).is_err());
    }

    #[test]
    fn even_split_of_thirty_across_three() {
        let shares = Money::new(3000).split_even(3).unwrap();
        assert_eq!(shares, vec![Money::new(1000); 3]);
    }

    #[test]
    fn remainder_goes_to_first_shares() {
        let shares = Money::new(1000).split_even(3).unwrap();
        assert_eq!(shares, vec![Money::new(334), Money::new(333), Money::new(333)]);
        assert_eq!(shares.iter().map(|m| m.minor()).sum::<i64>(), 1000);
    }

    #[test]
    fn split_rejects_zero_participants() {
        assert!(Money::new(100).split_even(0).is_err());
    }
}
