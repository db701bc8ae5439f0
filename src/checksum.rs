// 🔢 Check Digits - ISO 7064 mod-97
// Streaming reduction: the expanded digit string never gets materialized,
// so IBANs of any length stay within u32 arithmetic.

use crate::error::ValidationError;

pub const MODULUS: u32 = 97;

/// Remainder of the rearranged, letter-expanded IBAN modulo 97.
///
/// The first four characters move to the end, then each letter A-Z expands
/// to 10-35 and digits pass through.
pub fn mod97(code: &str) -> Result<u32, ValidationError> {
    let (header, rest) = match (code.get(..4), code.get(4..)) {
        (Some(header), Some(rest)) => (header, rest),
        _ => {
            return Err(ValidationError::ChecksumComputationFailed(format!(
                "need at least 4 ASCII characters, got {:?}",
                code
            )))
        }
    };

    rest.chars()
        .chain(header.chars())
        .try_fold(0u32, |acc, c| match c {
            '0'..='9' => Ok((acc * 10 + (c as u32 - '0' as u32)) % MODULUS),
            // Two decimal digits per letter
            'A'..='Z' => Ok((acc * 100 + (c as u32 - 'A' as u32 + 10)) % MODULUS),
            other => Err(ValidationError::ChecksumComputationFailed(format!(
                "character {:?} has no numeric equivalent",
                other
            ))),
        })
}

/// Valid if and only if the mod-97 remainder is 1.
pub fn validate_check_digits(code: &str) -> Result<(), ValidationError> {
    match mod97(code)? {
        1 => Ok(()),
        remainder => Err(ValidationError::ChecksumInvalid { remainder }),
    }
}

/// Check digits that make `country_code + digits + bban` pass [`validate_check_digits`].
///
/// `country_code` must be exactly two ASCII uppercase letters.
pub fn compute_check_digits(country_code: &str, bban: &str) -> Result<String, ValidationError> {
    if country_code.len() != 2 || !country_code.bytes().all(|b| b.is_ascii_uppercase()) {
        return Err(ValidationError::MalformedHeader);
    }

    let placeholder = format!("{}00{}", country_code, bban);
    let remainder = mod97(&placeholder)?;
    Ok(format!("{:02}", 98 - remainder))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_valid_ibans() {
        for iban in [
            "NL91ABNA0417164300",
            "DE89370400440532013000",
            "GB82WEST12345698765432",
            "FR1420041010050500013M02606",
            "MT84MALT011000012345MTLCAST001S",
            "LC55HEMM000100010012001200023015",
        ] {
            assert_eq!(mod97(iban), Ok(1), "{}", iban);
            assert!(validate_check_digits(iban).is_ok());
        }
    }

    #[test]
    fn test_altered_iban_fails() {
        assert_eq!(
            validate_check_digits("NL30ABNA0517552265"),
            Err(ValidationError::ChecksumInvalid { remainder: 18 })
        );
        assert_eq!(
            validate_check_digits("NL30ABNA0517552264"),
            Err(ValidationError::ChecksumInvalid { remainder: 88 })
        );
    }

    #[test]
    fn test_compute_check_digits() {
        assert_eq!(compute_check_digits("NL", "ABNA0417164300").unwrap(), "91");
        assert_eq!(compute_check_digits("DE", "370400440532013000").unwrap(), "89");
        assert_eq!(compute_check_digits("NL", "ABNA0517552264").unwrap(), "40");
        assert!(validate_check_digits("NL40ABNA0517552264").is_ok());
    }

    #[test]
    fn test_compute_check_digits_rejects_bad_country_code() {
        for country in ["NLD", "N", "", "nl", "N1", "NÉ"] {
            assert_eq!(
                compute_check_digits(country, "ABNA0417164300"),
                Err(ValidationError::MalformedHeader),
                "{:?}",
                country
            );
        }
    }

    #[test]
    fn test_computation_guard() {
        assert!(matches!(
            mod97("NL9"),
            Err(ValidationError::ChecksumComputationFailed(_))
        ));
        assert!(matches!(
            mod97("NL91abna0417164300"),
            Err(ValidationError::ChecksumComputationFailed(_))
        ));
        // Multi-byte character straddling the header boundary
        assert!(matches!(
            mod97("NL9é1ABNA"),
            Err(ValidationError::ChecksumComputationFailed(_))
        ));
    }

    #[test]
    fn test_long_input_does_not_overflow() {
        let long = format!("GB00{}", "Z".repeat(500));
        assert!(mod97(&long).unwrap() < MODULUS);
    }
}
