// IBAN Check - Core Library
// Normalization, per-country BBAN layouts and mod-97 check digits.
// Exposes all modules for use in CLI, API server, and tests

pub mod error;
pub mod format;     // BBAN layout descriptor compiler
pub mod countries;  // Static country rule table + matcher cache
pub mod checksum;   // ISO 7064 mod-97
pub mod iban;       // Validation pipeline
pub mod batch;      // Fixture files and bulk validation
pub mod config;     // HTTP front end settings

// Re-export commonly used types
pub use error::{ErrorKind, RegistryError, ValidationError};
pub use format::{BbanMatcher, CharClass, Segment};
pub use countries::{CountryRegistry, CountryRule, COUNTRY_RULES};
pub use checksum::{compute_check_digits, mod97, validate_check_digits};
pub use iban::{normalize, printable_form, validate, IbanParser, ParsedIban};
pub use batch::{BatchEntry, BatchReport, BatchSummary, BatchValidator, Outcome};
pub use config::{ConfigError, ServerConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
