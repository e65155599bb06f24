// ─── Version Ordering ───
// Maven-like total order over free-form version strings.
//
// A version is tokenized on `.`, `-`, `_`, `+` and on every switch between
// digits and letters. Numeric tokens compare numerically (any length),
// qualifiers compare by a fixed rank and then lexicographically. Any
// qualifier sorts below a number in the same position, and below "no more
// tokens", so `1.0-pre < 1.0 < 1.0.1`.

use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    /// Digits with leading zeros removed ("" for zero).
    Number(String),
    Qualifier(String),
}

/// Rank given to the end of a version. Qualifiers below this rank make a
/// version older than its bare numeric prefix.
const RELEASE_RANK: u8 = 6;

fn qualifier_rank(qualifier: &str) -> u8 {
    match qualifier {
        "alpha" | "a" => 0,
        "beta" | "b" => 1,
        "milestone" | "m" => 2,
        "rc" | "cr" => 3,
        "snapshot" => 4,
        "ga" | "final" | "release" => RELEASE_RANK,
        "sp" => RELEASE_RANK + 1,
        // pre, dev, unknown build tags, malformed fragments
        _ => 5,
    }
}

fn tokenize(version: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut current_is_digit = false;

    let flush = |current: &mut String, is_digit: bool, tokens: &mut Vec<Token>| {
        if current.is_empty() {
            return;
        }
        let token = if is_digit {
            Token::Number(current.trim_start_matches('0').to_string())
        } else {
            Token::Qualifier(current.to_lowercase())
        };
        tokens.push(token);
        current.clear();
    };

    for c in version.trim().chars() {
        if matches!(c, '.' | '-' | '_' | '+') {
            flush(&mut current, current_is_digit, &mut tokens);
            continue;
        }
        let is_digit = c.is_ascii_digit();
        if !current.is_empty() && is_digit != current_is_digit {
            flush(&mut current, current_is_digit, &mut tokens);
        }
        current_is_digit = is_digit;
        current.push(c);
    }
    flush(&mut current, current_is_digit, &mut tokens);

    normalize(tokens)
}

/// Drop zeros that precede a qualifier or the end, and release aliases, so
/// `1.0.0`, `1` and `1-final` all reduce to the same token list.
fn normalize(tokens: Vec<Token>) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());
    for token in tokens {
        if let Token::Qualifier(q) = &token {
            if qualifier_rank(q) == RELEASE_RANK {
                continue;
            }
            pop_trailing_zeros(&mut out);
        }
        out.push(token);
    }
    pop_trailing_zeros(&mut out);
    out
}

fn pop_trailing_zeros(tokens: &mut Vec<Token>) {
    while matches!(tokens.last(), Some(Token::Number(digits)) if digits.is_empty()) {
        tokens.pop();
    }
}

fn compare_numbers(left: &str, right: &str) -> Ordering {
    left.len().cmp(&right.len()).then_with(|| left.cmp(right))
}

fn compare_tokens(left: &Token, right: &Token) -> Ordering {
    match (left, right) {
        (Token::Number(l), Token::Number(r)) => compare_numbers(l, r),
        (Token::Number(_), Token::Qualifier(_)) => Ordering::Greater,
        (Token::Qualifier(_), Token::Number(_)) => Ordering::Less,
        (Token::Qualifier(l), Token::Qualifier(r)) => qualifier_rank(l)
            .cmp(&qualifier_rank(r))
            .then_with(|| l.cmp(r)),
    }
}

/// How a token compares against the end of the other version.
fn compare_to_end(token: &Token) -> Ordering {
    match token {
        Token::Number(digits) if digits.is_empty() => Ordering::Equal,
        Token::Number(_) => Ordering::Greater,
        Token::Qualifier(q) => qualifier_rank(q).cmp(&RELEASE_RANK),
    }
}

/// Total order over two version strings. Never panics.
pub fn compare_versions(left: &str, right: &str) -> Ordering {
    let left = tokenize(left);
    let right = tokenize(right);
    let len = left.len().max(right.len());

    for i in 0..len {
        let ordering = match (left.get(i), right.get(i)) {
            (Some(l), Some(r)) => compare_tokens(l, r),
            (Some(l), None) => compare_to_end(l),
            (None, Some(r)) => compare_to_end(r).reverse(),
            (None, None) => Ordering::Equal,
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    Ordering::Equal
}

/// Whether a version string carries a pre-release marker.
pub fn is_prerelease(version: &str) -> bool {
    tokenize(version).iter().any(|token| match token {
        Token::Qualifier(q) => matches!(
            q.as_str(),
            "pre" | "alpha" | "beta" | "rc" | "snapshot" | "dev"
        ),
        Token::Number(_) => false,
    })
}
