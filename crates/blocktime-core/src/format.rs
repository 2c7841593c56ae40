//! Halving-aware block height formatting.
//!
//! A pattern is scanned left to right. Outside of `[...]` regions the
//! longest matching token is substituted:
//!
//! | Token | Value |
//! |---|---|
//! | `h` / `H` / `-h` | current / next / previous halving epoch |
//! | `b` / `bb` | blocks elapsed in the current epoch (plain / grouped) |
//! | `-b` / `-bb` | blocks remaining until the next halving (plain / grouped) |
//! | `B` / `BB` | total height (plain / grouped) |
//! | `%` … `%%%%` | epoch completion at 1, 2, 3 decimals or raw |
//! | `-%` … `-%%%%` | percentage remaining until the next halving |
//!
//! Letter tokens only match as whole words, so `block` stays `block`.
//! Text inside brackets is copied verbatim; bracket characters never reach
//! the output, so `[[h] h]` renders as `h h`. An unclosed `[` escapes the
//! rest of the pattern.
//!
//! Percentages are truncated toward zero at the requested precision, never
//! rounded.

use crate::constants::{BLOCKS_PER_HALVING, DEFAULT_NUMBER_SEPARATOR};

/// Halving epoch a height falls in.
pub fn halving_epoch(height: u64) -> u64 {
    height / BLOCKS_PER_HALVING
}

/// Blocks mined since the start of the current epoch.
pub fn blocks_into_epoch(height: u64) -> u64 {
    height % BLOCKS_PER_HALVING
}

/// Blocks left until the next halving.
pub fn blocks_until_halving(height: u64) -> u64 {
    BLOCKS_PER_HALVING - blocks_into_epoch(height)
}

/// Untruncated epoch completion in percent, `0.0 ≤ p < 100.0`.
pub fn epoch_progress_percent(height: u64) -> f64 {
    blocks_into_epoch(height) as f64 / BLOCKS_PER_HALVING as f64 * 100.0
}

/// Insert `separator` between groups of three digits.
///
/// ```
/// use blocktime_core::format::group_thousands;
/// assert_eq!(group_thousands(1_234_567, ","), "1,234,567");
/// assert_eq!(group_thousands(999, "."), "999");
/// ```
pub fn group_thousands(value: u64, separator: &str) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 * separator.len());
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push_str(separator);
        }
        out.push(ch);
    }
    out
}

/// Decimal precision of a percentage token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Precision {
    Tenths,
    Hundredths,
    Thousandths,
    Raw,
}

impl Precision {
    fn decimals(self) -> Option<u32> {
        match self {
            Self::Tenths => Some(1),
            Self::Hundredths => Some(2),
            Self::Thousandths => Some(3),
            Self::Raw => None,
        }
    }
}

/// `blocks` as a percentage of an epoch, floored to `decimals` places.
///
/// Computed on integers so exact values such as 147 blocks (0.07%) are not
/// lost to binary rounding. Trailing zeros are dropped: `51%`, `0.1%`.
fn truncated_percent(blocks: u64, decimals: u32) -> String {
    let scale = 10u64.pow(decimals);
    let scaled = u128::from(blocks) * 100 * u128::from(scale) / u128::from(BLOCKS_PER_HALVING);
    let whole = scaled / u128::from(scale);
    let fraction = scaled % u128::from(scale);
    if fraction == 0 {
        return whole.to_string();
    }
    let digits = format!("{fraction:0width$}", width = decimals as usize);
    format!("{whole}.{}", digits.trim_end_matches('0'))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Halving,
    NextHalving,
    PreviousHalving,
    EpochBlocks { grouped: bool },
    RemainingBlocks { grouped: bool },
    TotalBlocks { grouped: bool },
    Percent { remaining: bool, precision: Precision },
}

/// Token spellings, longest first so the scan is greedy.
const TOKENS: &[(&str, Token)] = &[
    ("-%%%%", Token::Percent { remaining: true, precision: Precision::Raw }),
    ("-%%%", Token::Percent { remaining: true, precision: Precision::Thousandths }),
    ("%%%%", Token::Percent { remaining: false, precision: Precision::Raw }),
    ("-%%", Token::Percent { remaining: true, precision: Precision::Hundredths }),
    ("-bb", Token::RemainingBlocks { grouped: true }),
    ("%%%", Token::Percent { remaining: false, precision: Precision::Thousandths }),
    ("-%", Token::Percent { remaining: true, precision: Precision::Tenths }),
    ("-b", Token::RemainingBlocks { grouped: false }),
    ("-h", Token::PreviousHalving),
    ("%%", Token::Percent { remaining: false, precision: Precision::Hundredths }),
    ("bb", Token::EpochBlocks { grouped: true }),
    ("BB", Token::TotalBlocks { grouped: true }),
    ("%", Token::Percent { remaining: false, precision: Precision::Tenths }),
    ("b", Token::EpochBlocks { grouped: false }),
    ("B", Token::TotalBlocks { grouped: false }),
    ("h", Token::Halving),
    ("H", Token::NextHalving),
];

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// Stateless renderer of block heights through format patterns.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatEngine;

impl FormatEngine {
    pub fn new() -> Self {
        Self
    }

    /// Render `height` through `pattern`, grouping thousands with `,`.
    pub fn format(&self, height: u64, pattern: &str) -> String {
        self.format_with_separator(height, pattern, DEFAULT_NUMBER_SEPARATOR)
    }

    /// Render `height` through `pattern` with a custom thousands separator.
    pub fn format_with_separator(&self, height: u64, pattern: &str, separator: &str) -> String {
        format(height, pattern, separator)
    }
}

/// Render `height` through `pattern`. See the module docs for the syntax.
///
/// ```
/// use blocktime_core::format::format;
/// assert_eq!(format(732_861, "h [halving, block] b", ","), "3 halving, block 102861");
/// assert_eq!(format(732_861, "H, %%%%", ","), "4, 48.98142857142857%");
/// ```
pub fn format(height: u64, pattern: &str, separator: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 16);
    let mut depth = 0usize;
    let mut rest = pattern;
    let mut prev: Option<char> = None;

    while let Some(ch) = rest.chars().next() {
        if ch == '[' {
            depth += 1;
            rest = &rest[1..];
            prev = Some(ch);
            continue;
        }
        if ch == ']' {
            depth = depth.saturating_sub(1);
            rest = &rest[1..];
            prev = Some(ch);
            continue;
        }
        if depth > 0 {
            out.push(ch);
            rest = &rest[ch.len_utf8()..];
            prev = Some(ch);
            continue;
        }

        match match_token(rest, prev) {
            Some((spelling, token)) => {
                out.push_str(&render(token, height, separator));
                rest = &rest[spelling.len()..];
                prev = spelling.chars().last();
            }
            None => {
                out.push(ch);
                rest = &rest[ch.len_utf8()..];
                prev = Some(ch);
            }
        }
    }
    out
}

fn match_token(rest: &str, prev: Option<char>) -> Option<(&'static str, Token)> {
    TOKENS.iter().copied().find(|&(spelling, _)| {
        if !rest.starts_with(spelling) {
            return false;
        }
        let starts_with_letter = spelling.chars().next().is_some_and(char::is_alphabetic);
        if starts_with_letter && prev.is_some_and(is_word_char) {
            return false;
        }
        let ends_with_letter = spelling.chars().last().is_some_and(char::is_alphabetic);
        let next = rest[spelling.len()..].chars().next();
        !(ends_with_letter && next.is_some_and(is_word_char))
    })
}

fn render(token: Token, height: u64, separator: &str) -> String {
    let epoch = halving_epoch(height);
    let number = |value: u64, grouped: bool| {
        if grouped {
            group_thousands(value, separator)
        } else {
            value.to_string()
        }
    };

    match token {
        Token::Halving => epoch.to_string(),
        Token::NextHalving => (epoch + 1).to_string(),
        Token::PreviousHalving => epoch.saturating_sub(1).to_string(),
        Token::EpochBlocks { grouped } => number(blocks_into_epoch(height), grouped),
        Token::RemainingBlocks { grouped } => number(blocks_until_halving(height), grouped),
        Token::TotalBlocks { grouped } => number(height, grouped),
        Token::Percent { remaining, precision } => match precision.decimals() {
            Some(decimals) => {
                let blocks = if remaining { blocks_until_halving(height) } else { blocks_into_epoch(height) };
                format!("{}%", truncated_percent(blocks, decimals))
            }
            None => {
                let progress = epoch_progress_percent(height);
                let value = if remaining { 100.0 - progress } else { progress };
                format!("{value}%")
            }
        },
    }
}
