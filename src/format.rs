// 🧩 BBAN Layout Compiler - Layouts as Data
// Turns a compact descriptor like "U04F10" into a full-string matcher

use crate::error::RegistryError;
use serde::Serialize;
use std::fmt;

// ============================================================================
// CHARACTER CLASSES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CharClass {
    /// F: 0-9
    Digit,
    /// L: a-z
    Lower,
    /// U: A-Z
    Upper,
    /// A: 0-9, A-Z, a-z
    Alnum,
    /// B: 0-9, A-Z
    UpperAlnum,
    /// C: A-Z, a-z
    Alpha,
    /// W: 0-9, a-z
    LowerAlnum,
}

impl CharClass {
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'F' => Some(CharClass::Digit),
            'L' => Some(CharClass::Lower),
            'U' => Some(CharClass::Upper),
            'A' => Some(CharClass::Alnum),
            'B' => Some(CharClass::UpperAlnum),
            'C' => Some(CharClass::Alpha),
            'W' => Some(CharClass::LowerAlnum),
            _ => None,
        }
    }

    pub fn code(&self) -> char {
        match self {
            CharClass::Digit => 'F',
            CharClass::Lower => 'L',
            CharClass::Upper => 'U',
            CharClass::Alnum => 'A',
            CharClass::UpperAlnum => 'B',
            CharClass::Alpha => 'C',
            CharClass::LowerAlnum => 'W',
        }
    }

    /// Check if the character belongs to this class (ASCII only)
    pub fn accepts(&self, c: char) -> bool {
        match self {
            CharClass::Digit => c.is_ascii_digit(),
            CharClass::Lower => c.is_ascii_lowercase(),
            CharClass::Upper => c.is_ascii_uppercase(),
            CharClass::Alnum => c.is_ascii_alphanumeric(),
            CharClass::UpperAlnum => c.is_ascii_digit() || c.is_ascii_uppercase(),
            CharClass::Alpha => c.is_ascii_alphabetic(),
            CharClass::LowerAlnum => c.is_ascii_digit() || c.is_ascii_lowercase(),
        }
    }

    /// Bracket expression in regular-expression notation
    pub fn pattern(&self) -> &'static str {
        match self {
            CharClass::Digit => "[0-9]",
            CharClass::Lower => "[a-z]",
            CharClass::Upper => "[A-Z]",
            CharClass::Alnum => "[0-9A-Za-z]",
            CharClass::UpperAlnum => "[0-9A-Z]",
            CharClass::Alpha => "[A-Za-z]",
            CharClass::LowerAlnum => "[0-9a-z]",
        }
    }
}

// ============================================================================
// SEGMENTS
// ============================================================================

/// `count` consecutive characters drawn from `class`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub class: CharClass,
    pub count: usize,
}

// ============================================================================
// COMPILED MATCHER
// ============================================================================

/// Compiled BBAN layout. Matching is always anchored at both ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BbanMatcher {
    segments: Vec<Segment>,
    len: usize,
}

impl BbanMatcher {
    /// Compile a layout descriptor: a run of `<class><2 digits>` tokens.
    pub fn compile(descriptor: &str) -> Result<Self, RegistryError> {
        if descriptor.is_empty() {
            return Err(RegistryError::EmptyDescriptor);
        }

        let bytes = descriptor.as_bytes();
        let mut segments = Vec::with_capacity(bytes.len() / 3);

        for (index, token) in bytes.chunks(3).enumerate() {
            let offset = index * 3;
            if token.len() != 3 || !token.is_ascii() {
                return Err(RegistryError::MalformedToken {
                    descriptor: descriptor.to_string(),
                    offset,
                });
            }

            let class_code = token[0] as char;
            let class = CharClass::from_code(class_code).ok_or_else(|| RegistryError::UnknownClass {
                descriptor: descriptor.to_string(),
                class: class_code,
            })?;

            // token is ASCII, so slicing on these byte offsets is safe
            let count_field = &descriptor[offset + 1..offset + 3];
            let count = parse_repeat_count(count_field).ok_or_else(|| {
                RegistryError::InvalidRepeatCount {
                    descriptor: descriptor.to_string(),
                    count: count_field.to_string(),
                }
            })?;

            segments.push(Segment { class, count });
        }

        Ok(BbanMatcher::from_validated(segments))
    }

    /// Build a matcher from already-parsed segments
    pub fn from_segments(segments: Vec<Segment>) -> Result<Self, RegistryError> {
        if segments.is_empty() {
            return Err(RegistryError::EmptyDescriptor);
        }

        if let Some(bad) = segments.iter().find(|s| s.count == 0) {
            return Err(RegistryError::InvalidRepeatCount {
                descriptor: render_descriptor(&segments),
                count: bad.count.to_string(),
            });
        }

        Ok(BbanMatcher::from_validated(segments))
    }

    fn from_validated(segments: Vec<Segment>) -> Self {
        let len = segments.iter().map(|s| s.count).sum();
        BbanMatcher { segments, len }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of characters a matching BBAN has
    pub fn expected_len(&self) -> usize {
        self.len
    }

    /// Full-string match: every segment in order, nothing before or after.
    pub fn is_match(&self, bban: &str) -> bool {
        let mut chars = bban.chars();

        for segment in &self.segments {
            for _ in 0..segment.count {
                match chars.next() {
                    Some(c) if segment.class.accepts(c) => {}
                    _ => return false,
                }
            }
        }

        chars.next().is_none()
    }

    /// Anchored regular-expression rendering, e.g. `^[A-Z]{4}[0-9]{10}$`
    pub fn pattern(&self) -> String {
        let mut pattern = String::from("^");
        for segment in &self.segments {
            pattern.push_str(segment.class.pattern());
            pattern.push_str(&format!("{{{}}}", segment.count));
        }
        pattern.push('$');
        pattern
    }
}

impl fmt::Display for BbanMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_descriptor(&self.segments))
    }
}

fn parse_repeat_count(field: &str) -> Option<usize> {
    if !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse::<usize>().ok().filter(|&count| count > 0)
}

fn render_descriptor(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|s| format!("{}{:02}", s.class.code(), s.count))
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
