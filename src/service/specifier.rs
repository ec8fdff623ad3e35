//! Format specifier compiler.
//!
//! Grammar:
//!
//! ```text
//! numeric  ::= ""                     natural decimal, no padding
//!            | ("D" | "X") width      zero-padded decimal / lowercase hex
//! width    ::= [0-9]+                 1..=64
//! date     ::= (token | char)+        tokens matched greedily, longest first
//! token    ::= "yyyy" | "MM" | "dd" | "HH" | "mm" | "ss"
//! ```
//!
//! Letters and tokens are case-sensitive. `FIXED_TEXT` and `GUID` ignore their
//! specifier entirely.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::domain::ElementType;
use crate::error::EngineError;

/// Largest accepted numeric width.
pub const MAX_WIDTH: usize = 64;

/// Number of compiled rules kept by a [`RuleCache`].
const CACHE_CAPACITY: usize = 4096;

/// Radix of a numeric rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Radix {
    /// Base 10.
    Decimal,
    /// Base 16, lowercase digits.
    Hexadecimal,
}

impl Radix {
    /// Numeric base.
    #[must_use]
    pub const fn base(self) -> u32 {
        match self {
            Self::Decimal => 10,
            Self::Hexadecimal => 16,
        }
    }
}

/// Compiled numeric specifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumericRule {
    /// Output radix.
    pub radix: Radix,
    /// Minimum character width; 0 means natural width.
    pub width: usize,
    /// Left-pad with `0` up to `width`.
    pub zero_pad: bool,
}

impl NumericRule {
    /// Natural-width decimal.
    pub const NATURAL: Self = Self {
        radix: Radix::Decimal,
        width: 0,
        zero_pad: false,
    };
}

/// Date/time token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateToken {
    /// `yyyy`: 4-digit year.
    Year,
    /// `MM`: 2-digit month.
    Month,
    /// `dd`: 2-digit day of month.
    Day,
    /// `HH`: 2-digit hour, 24h clock.
    Hour,
    /// `mm`: 2-digit minute.
    Minute,
    /// `ss`: 2-digit second.
    Second,
}

/// Tokens in match priority order (longest first).
const DATE_TOKENS: [(&str, DateToken); 6] = [
    ("yyyy", DateToken::Year),
    ("MM", DateToken::Month),
    ("dd", DateToken::Day),
    ("HH", DateToken::Hour),
    ("mm", DateToken::Minute),
    ("ss", DateToken::Second),
];

/// One piece of a compiled date template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateSegment {
    /// Text copied through unchanged.
    Literal(String),
    /// Substituted timestamp field.
    Token(DateToken),
}

/// Result of compiling a specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompiledRule {
    /// The specifier is ignored.
    None,
    /// Radix/width formatting of an integer.
    Numeric(NumericRule),
    /// Token substitution over a timestamp.
    Date(Vec<DateSegment>),
}

/// Compile `specifier` for an element of kind `element_type`.
///
/// # Errors
///
/// Returns `InvalidFormatSpecifier` when the specifier does not match the
/// grammar for the kind, including an empty date specifier.
pub fn compile(element_type: ElementType, specifier: &str) -> Result<CompiledRule, EngineError> {
    match element_type {
        ElementType::FixedText | ElementType::Guid => Ok(CompiledRule::None),
        ElementType::DateTime => compile_date(specifier).map(CompiledRule::Date),
        ElementType::Random6Digit
        | ElementType::Random9Digit
        | ElementType::Random20Bit
        | ElementType::Random32Bit
        | ElementType::Sequence => compile_numeric(specifier).map(CompiledRule::Numeric),
    }
}

fn invalid(specifier: &str, reason: impl Into<String>) -> EngineError {
    EngineError::InvalidFormatSpecifier {
        specifier: specifier.to_string(),
        reason: reason.into(),
    }
}

fn compile_numeric(specifier: &str) -> Result<NumericRule, EngineError> {
    let mut chars = specifier.chars();
    let Some(letter) = chars.next() else {
        return Ok(NumericRule::NATURAL);
    };

    let radix = match letter {
        'D' => Radix::Decimal,
        'X' => Radix::Hexadecimal,
        c if c.is_alphabetic() => {
            return Err(invalid(
                specifier,
                format!("unknown radix letter '{c}' (expected D or X)"),
            ));
        }
        _ => return Err(invalid(specifier, "missing radix letter (expected D or X)")),
    };

    let digits = chars.as_str();
    if digits.is_empty() {
        return Err(invalid(specifier, "missing width"));
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(specifier, "width must be a positive integer"));
    }

    let width: usize = digits
        .parse()
        .map_err(|_| invalid(specifier, format!("width cannot exceed {MAX_WIDTH}")))?;
    if width == 0 {
        return Err(invalid(specifier, "width must be positive"));
    }
    if width > MAX_WIDTH {
        return Err(invalid(
            specifier,
            format!("width cannot exceed {MAX_WIDTH}"),
        ));
    }

    Ok(NumericRule {
        radix,
        width,
        zero_pad: true,
    })
}

fn compile_date(specifier: &str) -> Result<Vec<DateSegment>, EngineError> {
    if specifier.is_empty() {
        return Err(invalid(specifier, "date/time element requires a format"));
    }

    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = specifier;

    'scan: while !rest.is_empty() {
        for (text, token) in DATE_TOKENS {
            if let Some(after) = rest.strip_prefix(text) {
                if !literal.is_empty() {
                    segments.push(DateSegment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(DateSegment::Token(token));
                rest = after;
                continue 'scan;
            }
        }

        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            literal.push(c);
        }
        rest = chars.as_str();
    }

    if !literal.is_empty() {
        segments.push(DateSegment::Literal(literal));
    }

    Ok(segments)
}

/// Cache of compiled rules keyed by `(element type, specifier)`.
///
/// Compilation is pure, so entries never go stale. Once the cache is full new
/// rules are compiled on every call instead of being stored.
#[derive(Default)]
pub struct RuleCache {
    rules: RwLock<HashMap<(ElementType, String), Arc<CompiledRule>>>,
}

impl RuleCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached rule or compile and cache it.
    ///
    /// # Errors
    ///
    /// Returns the compilation error; failures are not cached.
    pub fn get_or_compile(
        &self,
        element_type: ElementType,
        specifier: &str,
    ) -> Result<Arc<CompiledRule>, EngineError> {
        // Kinds that ignore their specifier share one entry.
        let specifier = match element_type {
            ElementType::FixedText | ElementType::Guid => "",
            _ => specifier,
        };
        let key = (element_type, specifier.to_string());

        if let Some(rule) = self.rules.read().get(&key) {
            return Ok(Arc::clone(rule));
        }

        let rule = Arc::new(compile(element_type, specifier)?);

        let mut rules = self.rules.write();
        if rules.len() < CACHE_CAPACITY {
            rules.entry(key).or_insert_with(|| Arc::clone(&rule));
        }
        Ok(rule)
    }

    /// Number of cached rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.read().len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.read().is_empty()
    }
}
