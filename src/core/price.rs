use crate::errors::ValidationError;
use crate::models::{PriceKind, PriceRange, PRICE_UNBOUNDED};
use regex::Regex;
use std::sync::OnceLock;

/// Spread applied on both sides of a single-number budget
const APPROXIMATE_SPREAD: u32 = 100;

struct PricePatterns {
    range: Regex,
    min_only: Regex,
    max_only: Regex,
    single: Regex,
}

fn patterns() -> &'static PricePatterns {
    static PATTERNS: OnceLock<PricePatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| PricePatterns {
        range: Regex::new(r"^(\d+)\s*[-－]\s*(\d+)$").expect("valid range pattern"),
        min_only: Regex::new(r"^(\d+)\s*[~～]$").expect("valid min pattern"),
        max_only: Regex::new(r"^[~～]\s*(\d+)$").expect("valid max pattern"),
        single: Regex::new(r"^(\d+)$").expect("valid single pattern"),
    })
}

/// Parse a free-text budget such as `100-500`, `100~`, `~500` or `300`.
///
/// Anything else (including numbers that overflow `u32`) is rejected with
/// [`ValidationError::InvalidPriceFormat`]. A reversed range such as `500-100`
/// is rejected with [`ValidationError::InvalidPriceRange`] rather than swapped.
/// An open-ended minimum above 9999 keeps `max == min`, so `min <= max` always holds.
pub fn parse_price_range(input: &str) -> Result<PriceRange, ValidationError> {
    let text = input.trim();
    let p = patterns();
    let invalid = || ValidationError::InvalidPriceFormat(input.to_string());

    if let Some(caps) = p.range.captures(text) {
        let min = parse_number(&caps[1]).ok_or_else(invalid)?;
        let max = parse_number(&caps[2]).ok_or_else(invalid)?;
        if min > max {
            return Err(ValidationError::InvalidPriceRange { min, max });
        }
        return Ok(PriceRange { min, max, kind: PriceKind::Range });
    }

    if let Some(caps) = p.min_only.captures(text) {
        let min = parse_number(&caps[1]).ok_or_else(invalid)?;
        return Ok(PriceRange {
            min,
            max: PRICE_UNBOUNDED.max(min),
            kind: PriceKind::MinOnly,
        });
    }

    if let Some(caps) = p.max_only.captures(text) {
        let max = parse_number(&caps[1]).ok_or_else(invalid)?;
        return Ok(PriceRange { min: 0, max, kind: PriceKind::MaxOnly });
    }

    if let Some(caps) = p.single.captures(text) {
        let n = parse_number(&caps[1]).ok_or_else(invalid)?;
        let max = n.checked_add(APPROXIMATE_SPREAD).ok_or_else(invalid)?;
        return Ok(PriceRange {
            min: n.saturating_sub(APPROXIMATE_SPREAD),
            max,
            kind: PriceKind::Approximate,
        });
    }

    Err(invalid())
}

/// Build a range from a preset button; `max == 9999` means "and above"
pub fn preset_price_range(min: u32, max: u32) -> Result<PriceRange, ValidationError> {
    if min > max {
        return Err(ValidationError::InvalidPriceRange { min, max });
    }
    Ok(PriceRange { min, max, kind: PriceKind::Preset })
}

#[inline]
fn parse_number(digits: &str) -> Option<u32> {
    digits.parse::<u32>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(input: &str) -> (u32, u32, PriceKind) {
        let r = parse_price_range(input).unwrap();
        (r.min, r.max, r.kind)
    }

    #[test]
    fn test_four_shapes() {
        assert_eq!(parsed("100-500"), (100, 500, PriceKind::Range));
        assert_eq!(parsed("100~"), (100, 9999, PriceKind::MinOnly));
        assert_eq!(parsed("~500"), (0, 500, PriceKind::MaxOnly));
        assert_eq!(parsed("300"), (200, 400, PriceKind::Approximate));
    }

    #[test]
    fn test_approximate_clamps_at_zero() {
        assert_eq!(parsed("50"), (0, 150, PriceKind::Approximate));
    }

    #[test]
    fn test_full_width_and_whitespace() {
        assert_eq!(parsed(" 100 - 500 "), (100, 500, PriceKind::Range));
        assert_eq!(parsed("100～"), (100, 9999, PriceKind::MinOnly));
        assert_eq!(parsed("～500"), (0, 500, PriceKind::MaxOnly));
    }

    #[test]
    fn test_rejects_other_shapes() {
        for input in ["abc", "100-", "", "-100", "1.5", "100-200-300", "~", "100 元"] {
            assert!(
                matches!(parse_price_range(input), Err(ValidationError::InvalidPriceFormat(_))),
                "expected {:?} to be rejected",
                input
            );
        }
    }

    #[test]
    fn test_rejects_overflow() {
        assert!(parse_price_range("99999999999").is_err());
        assert!(parse_price_range("4294967295").is_err());
        assert!(parse_price_range("1-99999999999").is_err());
    }

    #[test]
    fn test_open_minimum_above_unbounded_sentinel() {
        let range = parse_price_range("20000~").unwrap();
        assert_eq!((range.min, range.max, range.kind), (20000, 20000, PriceKind::MinOnly));

        let range = parse_price_range("9999~").unwrap();
        assert_eq!((range.min, range.max), (9999, PRICE_UNBOUNDED));
    }

    #[test]
    fn test_rejects_reversed_range() {
        assert_eq!(
            parse_price_range("500-100"),
            Err(ValidationError::InvalidPriceRange { min: 500, max: 100 })
        );
    }

    #[test]
    fn test_preset() {
        let r = preset_price_range(500, 9999).unwrap();
        assert_eq!(r.kind, PriceKind::Preset);
        assert!(r.is_unbounded());
        assert!(preset_price_range(10, 5).is_err());
    }
}
