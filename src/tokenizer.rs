//! Signature tokenizer.
//!
//! Splits a type or signature string into the set of maximal identifier runs.
//! Everything that is not a letter, digit, or underscore delimits - which
//! covers whitespace, brackets of all shapes, punctuation, operators, and
//! arrow fragments without enumerating them.
//!
//! Tokenization (instead of substring containment) is what keeps "Error" from
//! matching inside "ErrorHandler" during cross-reference resolution.

use std::collections::HashSet;

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Collect the identifier tokens of `signature` into a fresh set.
///
/// Never fails: an empty signature, or one containing no identifier
/// characters, yields the empty set.
pub fn tokenize(signature: &str) -> HashSet<String> {
    let mut tokens = HashSet::new();
    tokenize_into(signature, &mut tokens);
    tokens
}

/// Append the identifier tokens of `signature` into `out`.
///
/// Resolver code accumulates across many signatures through this variant so
/// that a single set allocation serves the whole walk.
pub fn tokenize_into(signature: &str, out: &mut HashSet<String>) {
    let mut start: Option<usize> = None;
    for (idx, c) in signature.char_indices() {
        if is_identifier_char(c) {
            if start.is_none() {
                start = Some(idx);
            }
        } else if let Some(s) = start.take() {
            out.insert(signature[s..idx].to_string());
        }
    }
    if let Some(s) = start {
        out.insert(signature[s..].to_string());
    }
}

/// Convenience for optional signature fields.
pub fn tokenize_opt_into(signature: Option<&str>, out: &mut HashSet<String>) {
    if let Some(sig) = signature {
        tokenize_into(sig, out);
    }
}
