//! Autonomous system number canonicalization.

use super::ValidationError;

/// Parse an ASN given as a bare number or with an "AS"/"as" prefix (e.g.
/// `"AS15169"`, `"as15169"`, `"15169"`) into its numeric form.
///
/// A range of the form `"ASn-ASm"` (or `"n-m"`) is recognized for display
/// purposes, but only accepted as a query when the low and high bounds are
/// equal; a genuine range is rejected since a query names exactly one ASN.
pub fn canonicalize_asn(input: &str) -> Result<u32, ValidationError> {
    let trimmed = input.trim();
    if let Some((low, high)) = trimmed.split_once('-') {
        let low = strip_as_one(low);
        let high = strip_as_one(high);
        let (low, high) = match (low.parse::<u32>(), high.parse::<u32>()) {
            (Ok(l), Ok(h)) => (l, h),
            _ => return Err(ValidationError::InvalidAsn(input.to_string())),
        };
        return if low == high {
            Ok(low)
        } else {
            Err(ValidationError::InvalidAsn(input.to_string()))
        };
    }
    strip_as_one(trimmed)
        .parse::<u32>()
        .map_err(|_| ValidationError::InvalidAsn(input.to_string()))
}

fn strip_as_one(s: &str) -> &str {
    let s = s.trim();
    s.strip_prefix("AS")
        .or_else(|| s.strip_prefix("as"))
        .or_else(|| s.strip_prefix("As"))
        .or_else(|| s.strip_prefix("aS"))
        .unwrap_or(s)
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("AS15169", 15169)]
    #[case("as15169", 15169)]
    #[case("15169", 15169)]
    fn GIVEN_valid_asn_WHEN_canonicalize_THEN_expected_number(
        #[case] input: &str,
        #[case] expected: u32,
    ) {
        assert_eq!(canonicalize_asn(input).unwrap(), expected);
    }

    #[rstest]
    #[case("ASxyz")]
    #[case("")]
    #[case("AS")]
    #[case("AS100-AS200")]
    fn GIVEN_invalid_asn_WHEN_canonicalize_THEN_error(#[case] input: &str) {
        assert!(canonicalize_asn(input).is_err());
    }

    #[rstest]
    #[case("AS15169-AS15169", 15169)]
    #[case("100-100", 100)]
    fn GIVEN_equal_range_WHEN_canonicalize_THEN_single_asn(
        #[case] input: &str,
        #[case] expected: u32,
    ) {
        assert_eq!(canonicalize_asn(input).unwrap(), expected);
    }
}
