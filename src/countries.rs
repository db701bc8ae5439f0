// 🌍 Country Rule Registry - Country behaviour as data
// Each IBAN-issuing country is one immutable row: total length + BBAN layout.
// Layouts compile on first use and the compiled matcher is shared afterwards.

use crate::error::{RegistryError, ValidationError};
use crate::format::BbanMatcher;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use tracing::{debug, warn};

// ============================================================================
// COUNTRY RULE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CountryRule {
    /// ISO 3166-1 alpha-2 code, uppercase
    pub code: &'static str,

    /// Full IBAN length: country code + check digits + BBAN
    pub length: usize,

    /// BBAN layout descriptor, e.g. "U04F10"
    pub layout: &'static str,
}

impl CountryRule {
    pub const fn new(code: &'static str, length: usize, layout: &'static str) -> Self {
        CountryRule { code, length, layout }
    }

    /// Length of the BBAN part
    pub fn bban_length(&self) -> usize {
        self.length.saturating_sub(4)
    }

    /// Compile the layout and check it agrees with the declared length
    pub fn compile(&self) -> Result<BbanMatcher, RegistryError> {
        let matcher = BbanMatcher::compile(self.layout)?;
        let computed = 4 + matcher.expected_len();
        if computed != self.length {
            return Err(RegistryError::LengthInvariant {
                declared: self.length,
                computed,
            });
        }
        Ok(matcher)
    }
}

// ============================================================================
// BUILT-IN TABLE
// ============================================================================

/// Known IBAN countries. A snapshot: new adopters need a row here.
pub static COUNTRY_RULES: &[CountryRule] = &[
    CountryRule::new("AD", 24, "F04F04A12"),
    CountryRule::new("AE", 23, "F03F16"),
    CountryRule::new("AL", 28, "F08A16"),
    CountryRule::new("AT", 20, "F05F11"),
    CountryRule::new("AZ", 28, "U04A20"),
    CountryRule::new("BA", 20, "F03F03F08F02"),
    CountryRule::new("BE", 16, "F03F07F02"),
    CountryRule::new("BG", 22, "U04F04F02A08"),
    CountryRule::new("BH", 22, "U04A14"),
    CountryRule::new("BR", 29, "F08F05F10U01A01"),
    CountryRule::new("CH", 21, "F05A12"),
    CountryRule::new("CR", 21, "F03F14"),
    CountryRule::new("CY", 28, "F03F05A16"),
    CountryRule::new("CZ", 24, "F04F06F10"),
    CountryRule::new("DE", 22, "F08F10"),
    CountryRule::new("DK", 18, "F04F09F01"),
    CountryRule::new("DO", 28, "U04F20"),
    CountryRule::new("EE", 20, "F02F02F11F01"),
    CountryRule::new("ES", 24, "F04F04F01F01F10"),
    CountryRule::new("FI", 18, "F06F07F01"),
    CountryRule::new("FO", 18, "F04F09F01"),
    CountryRule::new("FR", 27, "F05F05A11F02"),
    CountryRule::new("GB", 22, "U04F06F08"),
    CountryRule::new("GE", 22, "U02F16"),
    CountryRule::new("GI", 23, "U04A15"),
    CountryRule::new("GL", 18, "F04F09F01"),
    CountryRule::new("GR", 27, "F03F04A16"),
    CountryRule::new("GT", 28, "A04A20"),
    CountryRule::new("HR", 21, "F07F10"),
    CountryRule::new("HU", 28, "F03F04F01F15F01"),
    CountryRule::new("IE", 22, "U04F06F08"),
    CountryRule::new("IL", 23, "F03F03F13"),
    CountryRule::new("IS", 26, "F04F02F06F10"),
    CountryRule::new("IT", 27, "U01F05F05A12"),
    CountryRule::new("JO", 30, "U04F04A18"),
    CountryRule::new("KW", 30, "U04A22"),
    CountryRule::new("KZ", 20, "F03A13"),
    CountryRule::new("LB", 28, "F04A20"),
    CountryRule::new("LC", 32, "U04A24"),
    CountryRule::new("LI", 21, "F05A12"),
    CountryRule::new("LT", 20, "F05F11"),
    CountryRule::new("LU", 20, "F03A13"),
    CountryRule::new("LV", 21, "U04A13"),
    CountryRule::new("MC", 27, "F05F05A11F02"),
    CountryRule::new("MD", 24, "A20"),
    CountryRule::new("ME", 22, "F03F13F02"),
    CountryRule::new("MK", 19, "F03A10F02"),
    CountryRule::new("MR", 27, "F05F05F11F02"),
    CountryRule::new("MT", 31, "U04F05A18"),
    CountryRule::new("MU", 30, "U04F02F02F12F03U03"),
    CountryRule::new("NL", 18, "U04F10"),
    CountryRule::new("NO", 15, "F04F06F01"),
    CountryRule::new("PK", 24, "U04A16"),
    CountryRule::new("PL", 28, "F08F16"),
    CountryRule::new("PS", 29, "U04A21"),
    CountryRule::new("PT", 25, "F04F04F11F02"),
    CountryRule::new("QA", 29, "U04A21"),
    CountryRule::new("RO", 24, "U04A16"),
    CountryRule::new("RS", 22, "F03F13F02"),
    CountryRule::new("SA", 24, "F02A18"),
    CountryRule::new("SC", 31, "U04F02F02F16U03"),
    CountryRule::new("SE", 24, "F03F16F01"),
    CountryRule::new("SI", 19, "F05F08F02"),
    CountryRule::new("SK", 24, "F04F06F10"),
    CountryRule::new("SM", 27, "U01F05F05A12"),
    CountryRule::new("ST", 25, "F08F11F02"),
    CountryRule::new("TL", 23, "F03F14F02"),
    CountryRule::new("TN", 24, "F02F03F13F02"),
    CountryRule::new("TR", 26, "F05A01A16"),
    CountryRule::new("UA", 29, "F06A19"),
    CountryRule::new("VG", 24, "U04F16"),
    CountryRule::new("XK", 20, "F04F10F02"),
];

// ============================================================================
// COUNTRY REGISTRY
// ============================================================================

/// Lookup from country code to rule, plus the lazily filled matcher cache.
///
/// Concurrent first use of a country may compile its layout more than once;
/// the first stored matcher wins and every compile yields the same value.
pub struct CountryRegistry {
    rules: HashMap<&'static str, &'static CountryRule>,
    compiled: RwLock<HashMap<&'static str, Arc<BbanMatcher>>>,
}

static GLOBAL: OnceLock<CountryRegistry> = OnceLock::new();

impl CountryRegistry {
    /// Create a registry over the built-in table
    pub fn new() -> Self {
        CountryRegistry::from_rules(COUNTRY_RULES)
    }

    /// Create a registry over any static table. Later duplicates replace earlier rows.
    pub fn from_rules(rules: &'static [CountryRule]) -> Self {
        CountryRegistry {
            rules: rules.iter().map(|rule| (rule.code, rule)).collect(),
            compiled: RwLock::new(HashMap::new()),
        }
    }

    /// Process-wide registry, built on first access and never torn down
    pub fn global() -> &'static CountryRegistry {
        GLOBAL.get_or_init(CountryRegistry::new)
    }

    pub fn get(&self, code: &str) -> Option<&'static CountryRule> {
        self.rules.get(code).copied()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.rules.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// All rules, sorted by country code
    pub fn rules(&self) -> Vec<&'static CountryRule> {
        let mut rules: Vec<&'static CountryRule> = self.rules.values().copied().collect();
        rules.sort_by_key(|rule| rule.code);
        rules
    }

    /// Number of countries whose layout has been compiled so far
    pub fn compiled_count(&self) -> usize {
        self.compiled
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Shared compiled matcher for a country, compiling it on first use
    pub fn matcher(&self, code: &str) -> Result<Arc<BbanMatcher>, ValidationError> {
        let rule = self.get(code).ok_or_else(|| ValidationError::UnsupportedCountry {
            country_code: code.to_string(),
        })?;
        self.matcher_for(rule)
    }

    fn matcher_for(&self, rule: &'static CountryRule) -> Result<Arc<BbanMatcher>, ValidationError> {
        if let Some(matcher) = self
            .compiled
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(rule.code)
        {
            return Ok(Arc::clone(matcher));
        }

        // Compile outside the lock; a racing thread may do the same work
        let matcher = rule.compile().map_err(|source| {
            warn!(country = rule.code, layout = rule.layout, error = %source, "malformed country rule");
            ValidationError::RegistryData {
                country_code: rule.code.to_string(),
                source,
            }
        })?;
        debug!(country = rule.code, pattern = %matcher.pattern(), "compiled BBAN matcher");

        let mut compiled = self.compiled.write().unwrap_or_else(PoisonError::into_inner);
        let shared = compiled
            .entry(rule.code)
            .or_insert_with(|| Arc::new(matcher));
        Ok(Arc::clone(shared))
    }

    /// Check a BBAN against the country's compiled layout
    pub fn validate_bban(&self, rule: &'static CountryRule, bban: &str) -> Result<(), ValidationError> {
        let matcher = self.matcher_for(rule)?;
        if matcher.is_match(bban) {
            Ok(())
        } else {
            Err(ValidationError::BbanFormatMismatch {
                country_code: rule.code.to_string(),
                layout: rule.layout,
            })
        }
    }
}

impl Default for CountryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
