// 🏦 IBAN Parser - Normalize, gate, assemble
// Gates run in a fixed order and stop at the first failure:
// charset → header → country → length → BBAN layout → mod-97

use crate::checksum::validate_check_digits;
use crate::countries::CountryRegistry;
use crate::error::ValidationError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

// ============================================================================
// PARSED IBAN
// ============================================================================

/// A validated IBAN. Only the parser constructs these.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ParsedIban {
    code: String,
    printable: String,
    country_code: String,
    check_digits: String,
    bban: String,
}

impl ParsedIban {
    /// Normalized form: uppercase, no whitespace
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Groups of four separated by single spaces
    pub fn printable(&self) -> &str {
        &self.printable
    }

    pub fn country_code(&self) -> &str {
        &self.country_code
    }

    pub fn check_digits(&self) -> &str {
        &self.check_digits
    }

    pub fn bban(&self) -> &str {
        &self.bban
    }

    pub fn into_code(self) -> String {
        self.code
    }
}

impl fmt::Display for ParsedIban {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.printable)
    }
}

impl AsRef<str> for ParsedIban {
    fn as_ref(&self) -> &str {
        &self.code
    }
}

impl FromStr for ParsedIban {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate(s)
    }
}

// ============================================================================
// NORMALIZATION & PRINTING
// ============================================================================

/// Strip every whitespace character and uppercase ASCII letters. Never fails.
///
/// Non-ASCII letters such as `ı` or `ſ` are kept as-is, so they fail the
/// character-set check instead of being case-mapped into `[A-Z]`.
pub fn normalize(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Insert a space every four characters; the last group holds the remainder.
pub fn printable_form(code: &str) -> String {
    let mut printable = String::with_capacity(code.len() + code.len() / 4);
    for (i, c) in code.chars().enumerate() {
        if i > 0 && i % 4 == 0 {
            printable.push(' ');
        }
        printable.push(c);
    }
    printable
}

// ============================================================================
// PARSER
// ============================================================================

/// Runs the validation pipeline against a country registry
#[derive(Clone, Copy)]
pub struct IbanParser<'a> {
    registry: &'a CountryRegistry,
}

impl<'a> IbanParser<'a> {
    pub fn new(registry: &'a CountryRegistry) -> Self {
        IbanParser { registry }
    }

    pub fn registry(&self) -> &'a CountryRegistry {
        self.registry
    }

    pub fn parse(&self, input: &str) -> Result<ParsedIban, ValidationError> {
        self.run_gates(normalize(input)).inspect_err(|err| {
            debug!(kind = %err.kind(), error = %err, "IBAN rejected");
        })
    }

    fn run_gates(&self, code: String) -> Result<ParsedIban, ValidationError> {
        // 1. Character set
        if !code.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()) {
            return Err(ValidationError::InvalidCharacters);
        }

        // 2. Header: two letters then two digits. ASCII from here on.
        let header = code.as_bytes();
        if header.len() < 4
            || !header[..2].iter().all(u8::is_ascii_uppercase)
            || !header[2..4].iter().all(u8::is_ascii_digit)
        {
            return Err(ValidationError::MalformedHeader);
        }
        let country_code = &code[..2];
        let check_digits = &code[2..4];
        let bban = &code[4..];

        // 3. Country
        let rule = self
            .registry
            .get(country_code)
            .ok_or_else(|| ValidationError::UnsupportedCountry {
                country_code: country_code.to_string(),
            })?;

        // 4. Length
        if code.len() != rule.length {
            return Err(ValidationError::LengthMismatch {
                country_code: country_code.to_string(),
                actual: code.len(),
                expected: rule.length,
            });
        }

        // 5. BBAN layout
        self.registry.validate_bban(rule, bban)?;

        // 6. Check digits
        validate_check_digits(&code)?;

        Ok(ParsedIban {
            printable: printable_form(&code),
            country_code: country_code.to_string(),
            check_digits: check_digits.to_string(),
            bban: bban.to_string(),
            code,
        })
    }
}

impl Default for IbanParser<'static> {
    fn default() -> Self {
        IbanParser::new(CountryRegistry::global())
    }
}

/// Validate against the built-in country table
pub fn validate(input: &str) -> Result<ParsedIban, ValidationError> {
    IbanParser::default().parse(input)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::countries::CountryRule;
    use crate::error::{ErrorKind, RegistryError};

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("nl91 abna\t0417\n164300"), "NL91ABNA0417164300");
        assert_eq!(normalize("  "), "");
        // Non-breaking space counts as whitespace
        assert_eq!(normalize("NL91\u{a0}ABNA"), "NL91ABNA");
        // Only ASCII letters are uppercased
        assert_eq!(normalize("ßé"), "ßé");
        assert_eq!(normalize("nıſ"), "Nıſ");
    }

    #[test]
    fn test_printable_form() {
        assert_eq!(printable_form("NL91ABNA0417164300"), "NL91 ABNA 0417 1643 00");
        assert_eq!(printable_form("BE68539007547034"), "BE68 5390 0754 7034");
        assert_eq!(printable_form("ABC"), "ABC");
        assert_eq!(printable_form(""), "");
    }

    #[test]
    fn test_parse_valid_dutch_iban() {
        let iban = validate("NL91 ABNA0417 164300").unwrap();

        assert_eq!(iban.code(), "NL91ABNA0417164300");
        assert_eq!(iban.printable(), "NL91 ABNA 0417 1643 00");
        assert_eq!(iban.country_code(), "NL");
        assert_eq!(iban.check_digits(), "91");
        assert_eq!(iban.bban(), "ABNA0417164300");
        assert_eq!(iban.to_string(), "NL91 ABNA 0417 1643 00");
    }

    #[test]
    fn test_from_str() {
        let iban: ParsedIban = "de89 3704 0044 0532 0130 00".parse().unwrap();
        assert_eq!(iban.country_code(), "DE");
        assert_eq!(iban.as_ref(), "DE89370400440532013000");

        let err = "NL30ABNA0517552265".parse::<ParsedIban>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ChecksumInvalid);
    }

    #[test]
    fn test_gate_order() {
        let cases = [
            ("NL91-ABNA0417164300", ErrorKind::InvalidCharacters),
            ("NL91ÄBNA0417164300", ErrorKind::InvalidCharacters),
            ("NL91ABNA0417164300ı", ErrorKind::InvalidCharacters),
            ("", ErrorKind::MalformedHeader),
            ("NL9", ErrorKind::MalformedHeader),
            ("1234567890", ErrorKind::MalformedHeader),
            ("N191ABNA0417164300", ErrorKind::MalformedHeader),
            ("NLA1ABNA0417164300", ErrorKind::MalformedHeader),
            // Unknown country wins over bad length and bad BBAN
            ("ZZ30", ErrorKind::UnsupportedCountry),
            ("ZZ30ABNA0517552264", ErrorKind::UnsupportedCountry),
            // Length wins over BBAN layout
            ("NL91AB", ErrorKind::LengthMismatch),
            ("NL91", ErrorKind::LengthMismatch),
            ("NL30ABNA05175522AB", ErrorKind::BbanFormatMismatch),
            ("VG96VPVG00000L2345678901", ErrorKind::BbanFormatMismatch),
            ("NL30ABNA0517552265", ErrorKind::ChecksumInvalid),
            ("NL30ABNA0517552264", ErrorKind::ChecksumInvalid),
        ];

        for (input, expected) in cases {
            let err = validate(input).unwrap_err();
            assert_eq!(err.kind(), expected, "{:?}: {}", input, err);
        }
    }

    #[test]
    fn test_length_mismatch_detail() {
        assert_eq!(
            validate("NL91ABNA041716430").unwrap_err(),
            ValidationError::LengthMismatch {
                country_code: "NL".to_string(),
                actual: 17,
                expected: 18,
            }
        );
    }

    #[test]
    fn test_custom_registry() {
        static RULES: &[CountryRule] = &[
            CountryRule::new("NL", 18, "U04F10"),
            CountryRule::new("XX", 8, "F0A"),
        ];
        let registry = CountryRegistry::from_rules(RULES);
        let parser = IbanParser::new(&registry);

        assert!(parser.parse("NL91ABNA0417164300").is_ok());
        assert!(matches!(
            parser.parse("DE89370400440532013000"),
            Err(ValidationError::UnsupportedCountry { .. })
        ));
        assert!(matches!(
            parser.parse("XX001234"),
            Err(ValidationError::RegistryData {
                source: RegistryError::InvalidRepeatCount { .. },
                ..
            })
        ));
    }

    #[test]
    fn test_serialize() {
        let iban = validate("GB82 WEST 1234 5698 7654 32").unwrap();
        let json = serde_json::to_value(&iban).unwrap();

        assert_eq!(json["code"], "GB82WEST12345698765432");
        assert_eq!(json["printable"], "GB82 WEST 1234 5698 7654 32");
        assert_eq!(json["country_code"], "GB");
        assert_eq!(json["check_digits"], "82");
        assert_eq!(json["bban"], "WEST12345698765432");
    }
}
