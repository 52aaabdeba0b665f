use std::cmp::Ordering;

/// A version token: either a parsed integer run or an alphabetic run.
/// Numeric tokens sort before alphabetic tokens within the same position.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Num(u64),
    Alpha(String),
}

impl Ord for Token {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Token::Num(a), Token::Num(b)) => a.cmp(b),
            (Token::Alpha(a), Token::Alpha(b)) => a.cmp(b),
            (Token::Num(_), Token::Alpha(_)) => Ordering::Less,
            (Token::Alpha(_), Token::Num(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for Token {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Splits a version string on any run of non-alphanumeric characters into
/// an ordered sequence of tokens for piecewise comparison.
fn tokenize(version: &str) -> Vec<Token> {
    version
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            if part.chars().all(|c| c.is_ascii_digit()) {
                Token::Num(part.parse().unwrap_or(u64::MAX))
            } else {
                Token::Alpha(part.to_string())
            }
        })
        .collect()
}

/// Compares two version strings. A shorter tuple is less than a longer
/// tuple that shares its prefix.
pub fn compare(a: &str, b: &str) -> Ordering {
    let ta = tokenize(a);
    let tb = tokenize(b);
    for (x, y) in ta.iter().zip(tb.iter()) {
        let ord = x.cmp(y);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    ta.len().cmp(&tb.len())
}

pub fn lt(a: &str, b: &str) -> bool {
    compare(a, b) == Ordering::Less
}

pub fn gt(a: &str, b: &str) -> bool {
    compare(a, b) == Ordering::Greater
}
