//! Two-state signal values and bit-string parsing.
//!
//! [`Value`] is the only kind of data the evaluator computes with: a single
//! bit, or an unsigned word of up to [`Value::MAX_WIDTH`] bits. Strings only
//! appear at the edges, through [`Value::parse_literal`] and
//! [`Value::to_bit_string`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// The radix of a based literal such as `4'b1010` or `8'hFF`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Radix {
    /// Base 2 (`'b`).
    Binary,
    /// Base 8 (`'o`).
    Octal,
    /// Base 10 (`'d`).
    Decimal,
    /// Base 16 (`'h`).
    Hex,
}

impl Radix {
    /// Maps a base letter (`b`, `o`, `d`, `h`, either case) to a radix.
    pub fn from_letter(letter: char) -> Option<Radix> {
        match letter.to_ascii_lowercase() {
            'b' => Some(Radix::Binary),
            'o' => Some(Radix::Octal),
            'd' => Some(Radix::Decimal),
            'h' => Some(Radix::Hex),
            _ => None,
        }
    }

    /// Returns the numeric base.
    pub fn base(self) -> u32 {
        match self {
            Radix::Binary => 2,
            Radix::Octal => 8,
            Radix::Decimal => 10,
            Radix::Hex => 16,
        }
    }

    /// Bits encoded by one digit, or `None` for decimal.
    fn bits_per_digit(self) -> Option<u32> {
        match self {
            Radix::Binary => Some(1),
            Radix::Octal => Some(3),
            Radix::Hex => Some(4),
            Radix::Decimal => None,
        }
    }
}

/// Errors produced while parsing a textual value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    /// The text contained no digits.
    #[error("empty value")]
    Empty,

    /// A character is not a digit of the radix in use.
    #[error("invalid digit '{digit}' in '{text}'")]
    InvalidDigit {
        /// The offending character.
        digit: char,
        /// The full text being parsed.
        text: String,
    },

    /// An `x`, `z` or `?` digit; only two-state values are modelled.
    #[error("unknown or high-impedance digit '{digit}' in '{text}' is not supported")]
    FourState {
        /// The offending character.
        digit: char,
        /// The full text being parsed.
        text: String,
    },

    /// The value needs more bits than its declared width.
    #[error("'{text}' does not fit in {width} bit(s)")]
    Overflow {
        /// The full text being parsed.
        text: String,
        /// The width it had to fit in.
        width: u32,
    },

    /// A width prefix of zero or above [`Value::MAX_WIDTH`].
    #[error("invalid width {width} in '{text}' (widths must be 1 to 64)")]
    InvalidWidth {
        /// The declared width.
        width: u64,
        /// The full text being parsed.
        text: String,
    },
}

/// A two-state value: one bit, or an unsigned word of 2 to 64 bits.
///
/// Constructors normalize: a width of 1 always produces [`Value::Bit`], and
/// bits above the width are cleared, so structural equality is value
/// equality.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Value {
    /// A single bit.
    Bit(bool),
    /// A multi-bit unsigned word.
    Word {
        /// The bit pattern, LSB at bit 0. Bits at or above `width` are zero.
        bits: u64,
        /// The width in bits, between 2 and 64.
        width: u32,
    },
}

impl Value {
    /// The widest supported value.
    pub const MAX_WIDTH: u32 = 64;

    /// Creates a value of `width` bits from the low bits of `bits`.
    ///
    /// `width` is clamped to `1..=64`.
    pub fn new(bits: u64, width: u32) -> Self {
        let width = width.clamp(1, Self::MAX_WIDTH);
        if width == 1 {
            Value::Bit(bits & 1 == 1)
        } else {
            Value::Word {
                bits: bits & mask(width),
                width,
            }
        }
    }

    /// Creates a single-bit value.
    pub fn from_bool(bit: bool) -> Self {
        Value::Bit(bit)
    }

    /// Returns the width in bits.
    pub fn width(&self) -> u32 {
        match self {
            Value::Bit(_) => 1,
            Value::Word { width, .. } => *width,
        }
    }

    /// Returns the bit pattern as an unsigned integer.
    pub fn bits(&self) -> u64 {
        match self {
            Value::Bit(b) => u64::from(*b),
            Value::Word { bits, .. } => *bits,
        }
    }

    /// Returns `true` if any bit is set.
    pub fn is_true(&self) -> bool {
        self.bits() != 0
    }

    /// Returns bit `index` (0 is the LSB), or `None` past the width.
    pub fn bit(&self, index: u32) -> Option<bool> {
        (index < self.width()).then(|| (self.bits() >> index) & 1 == 1)
    }

    /// Zero-extends or truncates to `width` bits.
    pub fn resize(&self, width: u32) -> Self {
        Value::new(self.bits(), width)
    }

    /// Returns `true` if the value can be represented in `width` bits
    /// without losing set bits.
    pub fn fits_in(&self, width: u32) -> bool {
        min_width(self.bits()) <= width
    }

    /// Renders the value as a binary string, MSB first, padded to its width.
    pub fn to_bit_string(&self) -> String {
        let bits = self.bits();
        (0..self.width())
            .rev()
            .map(|i| if (bits >> i) & 1 == 1 { '1' } else { '0' })
            .collect()
    }

    /// Parses a plain binary string such as `"1010"`.
    ///
    /// The width is the number of digits, so `"0001"` is a 4-bit value.
    /// Underscores between digits are ignored.
    pub fn parse_bits(text: &str) -> Result<Value, ValueError> {
        let text = text.trim();
        if text.contains('\'') {
            return Err(ValueError::InvalidDigit {
                digit: '\'',
                text: text.to_string(),
            });
        }
        Self::parse_literal(text, Radix::Binary)
    }

    /// Parses a literal with an optional `<width>'<radix>` prefix.
    ///
    /// Accepted forms: `4'b1010`, `8'hff`, `'d12`, `3'o7`, `4'sb0101`, and
    /// unprefixed digits which are read in `default_radix`. Without an
    /// explicit width, binary/octal/hex literals are as wide as their digits
    /// and decimal literals take the fewest bits that hold the value.
    pub fn parse_literal(text: &str, default_radix: Radix) -> Result<Value, ValueError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ValueError::Empty);
        }

        let (declared_width, radix, digits) = match trimmed.split_once('\'') {
            Some((size, based)) => {
                let declared = parse_width(size.trim(), trimmed)?;
                let based = based.trim_start();
                let based = based
                    .strip_prefix('s')
                    .or_else(|| based.strip_prefix('S'))
                    .unwrap_or(based);
                let mut chars = based.chars();
                let letter = chars.next().ok_or(ValueError::Empty)?;
                let radix = Radix::from_letter(letter).ok_or_else(|| ValueError::InvalidDigit {
                    digit: letter,
                    text: trimmed.to_string(),
                })?;
                (declared, radix, chars.as_str().trim())
            }
            None => (None, default_radix, trimmed),
        };

        let (bits, digit_count) = parse_digits(digits, radix, trimmed)?;
        let width = match declared_width {
            Some(width) => {
                if min_width(bits) > width {
                    return Err(ValueError::Overflow {
                        text: trimmed.to_string(),
                        width,
                    });
                }
                width
            }
            None => match radix.bits_per_digit() {
                Some(per_digit) => digit_count
                    .saturating_mul(per_digit)
                    .clamp(min_width(bits), Self::MAX_WIDTH),
                None => min_width(bits),
            },
        };
        Ok(Value::new(bits, width))
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Bit(false)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}'b{}", self.width(), self.to_bit_string())
    }
}

/// Returns the fewest bits (at least one) that represent `bits`.
pub fn min_width(bits: u64) -> u32 {
    (u64::BITS - bits.leading_zeros()).max(1)
}

fn mask(width: u32) -> u64 {
    if width >= u64::BITS {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

fn parse_width(size: &str, text: &str) -> Result<Option<u32>, ValueError> {
    if size.is_empty() {
        return Ok(None);
    }
    let mut width: u64 = 0;
    for c in size.chars().filter(|c| *c != '_') {
        let digit = c.to_digit(10).ok_or_else(|| ValueError::InvalidDigit {
            digit: c,
            text: text.to_string(),
        })?;
        width = width.saturating_mul(10).saturating_add(u64::from(digit));
    }
    if width == 0 || width > u64::from(Value::MAX_WIDTH) {
        return Err(ValueError::InvalidWidth {
            width,
            text: text.to_string(),
        });
    }
    Ok(Some(width as u32))
}

fn parse_digits(digits: &str, radix: Radix, text: &str) -> Result<(u64, u32), ValueError> {
    let mut value: u64 = 0;
    let mut count: u32 = 0;
    for c in digits.chars() {
        if c == '_' {
            continue;
        }
        if matches!(c, 'x' | 'X' | 'z' | 'Z' | '?') {
            return Err(ValueError::FourState {
                digit: c,
                text: text.to_string(),
            });
        }
        let digit = c.to_digit(radix.base()).ok_or_else(|| ValueError::InvalidDigit {
            digit: c,
            text: text.to_string(),
        })?;
        value = value
            .checked_mul(u64::from(radix.base()))
            .and_then(|v| v.checked_add(u64::from(digit)))
            .ok_or_else(|| ValueError::Overflow {
                text: text.to_string(),
                width: Value::MAX_WIDTH,
            })?;
        count += 1;
    }
    if count == 0 {
        return Err(ValueError::Empty);
    }
    Ok((value, count))
}
