//! Value generators.
//!
//! Each element kind maps to one generator producing a [`RawValue`] from a
//! [`GenerationContext`]; [`render_value`] then formats that value through the
//! element's compiled rule. Generators never allocate sequence numbers
//! themselves: the renderer supplies the allocated integer in the context.

use chrono::{DateTime, Datelike, Timelike, Utc};
use rand::Rng;
use uuid::Uuid;

use crate::domain::{ElementSpec, ElementType};
use crate::error::EngineError;
use crate::service::specifier::{CompiledRule, DateSegment, DateToken, NumericRule, Radix};

const RANDOM_6DIGIT_MAX: u64 = 999_999;
const RANDOM_9DIGIT_MAX: u64 = 999_999_999;
const RANDOM_20BIT_MAX: u64 = (1 << 20) - 1;

/// Source of the render timestamp.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Unformatted value produced by a generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    /// Literal text.
    Text(String),
    /// Random or allocated integer.
    Number(u64),
    /// Random 128-bit identifier.
    Guid(Uuid),
    /// Render timestamp.
    Timestamp(DateTime<Utc>),
}

/// Inputs shared by every generator within one render.
pub struct GenerationContext<'a, R: Rng> {
    /// Render timestamp.
    pub now: DateTime<Utc>,
    /// Random source.
    pub rng: &'a mut R,
    /// Sequence integer for this render, if the configuration has one.
    pub sequence: Option<u64>,
}

/// Produce the raw value of one element.
///
/// # Errors
///
/// Returns `AllocationUnavailable` for a `SEQUENCE` element when the context
/// carries no sequence integer.
pub fn generate<R: Rng>(
    element: &ElementSpec,
    ctx: &mut GenerationContext<'_, R>,
) -> Result<RawValue, EngineError> {
    let value = match element.element_type {
        ElementType::FixedText => RawValue::Text(element.value_str().to_string()),
        ElementType::Random6Digit => RawValue::Number(ctx.rng.random_range(0..=RANDOM_6DIGIT_MAX)),
        ElementType::Random9Digit => RawValue::Number(ctx.rng.random_range(0..=RANDOM_9DIGIT_MAX)),
        ElementType::Random20Bit => RawValue::Number(ctx.rng.random_range(0..=RANDOM_20BIT_MAX)),
        ElementType::Random32Bit => RawValue::Number(u64::from(ctx.rng.random::<u32>())),
        ElementType::Guid => {
            let mut bytes = [0u8; 16];
            ctx.rng.fill(&mut bytes);
            RawValue::Guid(uuid::Builder::from_random_bytes(bytes).into_uuid())
        }
        ElementType::DateTime => RawValue::Timestamp(ctx.now),
        ElementType::Sequence => RawValue::Number(ctx.sequence.ok_or_else(|| {
            EngineError::AllocationUnavailable("no sequence value for this render".to_string())
        })?),
    };
    Ok(value)
}

/// Format a raw value through its compiled rule.
#[must_use]
pub fn render_value(value: &RawValue, rule: &CompiledRule) -> String {
    match (value, rule) {
        (RawValue::Text(text), _) => text.clone(),
        (RawValue::Number(n), CompiledRule::Numeric(rule)) => format_number(*n, *rule),
        (RawValue::Number(n), _) => n.to_string(),
        (RawValue::Guid(uuid), _) => uuid.hyphenated().to_string(),
        (RawValue::Timestamp(ts), CompiledRule::Date(segments)) => format_date(*ts, segments),
        (RawValue::Timestamp(ts), _) => ts.to_rfc3339(),
    }
}

/// Left-pad to the rule width; longer values are never truncated.
fn format_number(n: u64, rule: NumericRule) -> String {
    let width = if rule.zero_pad { rule.width } else { 0 };
    match rule.radix {
        Radix::Decimal => format!("{n:0width$}"),
        Radix::Hexadecimal => format!("{n:0width$x}"),
    }
}

fn format_date(ts: DateTime<Utc>, segments: &[DateSegment]) -> String {
    let mut out = String::new();
    for segment in segments {
        match segment {
            DateSegment::Literal(text) => out.push_str(text),
            DateSegment::Token(DateToken::Year) => out.push_str(&format!("{:04}", ts.year())),
            DateSegment::Token(DateToken::Month) => out.push_str(&format!("{:02}", ts.month())),
            DateSegment::Token(DateToken::Day) => out.push_str(&format!("{:02}", ts.day())),
            DateSegment::Token(DateToken::Hour) => out.push_str(&format!("{:02}", ts.hour())),
            DateSegment::Token(DateToken::Minute) => out.push_str(&format!("{:02}", ts.minute())),
            DateSegment::Token(DateToken::Second) => out.push_str(&format!("{:02}", ts.second())),
        }
    }
    out
}
