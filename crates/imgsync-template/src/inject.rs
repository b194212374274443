//! Environment injection into credential templates.
//!
//! Values come from a caller-supplied lookup keyed by the lowercased
//! identifier, so `$USERNAME`, `${username}` and `$(UserName)` all resolve
//! through the same entry.

use std::collections::HashMap;

use crate::lexer::Lexer;

/// Builds a lookup table from `(key, value)` pairs with lowercased keys.
///
/// Typically fed with [`std::env::vars`]. When two keys collide after
/// lowercasing, the later one wins.
pub fn lowercase_env<I>(vars: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = (String, String)>,
{
    vars.into_iter()
        .map(|(k, v)| (k.to_lowercase(), v))
        .collect()
}

/// Replaces variable references in `template` with values from `lookup`.
///
/// The template is rewritten in one pass over the references the lexer
/// reports: text around them and references whose name is unknown are
/// copied verbatim, sigil and brackets included. Substituted values are
/// never scanned again. A malformed reference stops scanning; references
/// found before it are still substituted.
pub fn inject<F>(template: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let chars: Vec<char> = template.chars().collect();
    let mut output = String::with_capacity(template.len());
    let mut cursor = 0;

    for item in Lexer::new(template, false) {
        let token = match item {
            Ok(token) => token,
            Err(e) => {
                // the template is a secret, only the position is logged
                tracing::warn!(error = %e, "stopped scanning credential template");
                break;
            }
        };
        let Some(value) = lookup(&token.name.to_lowercase()) else {
            tracing::debug!(name = %token.name, "no value for template variable");
            continue;
        };
        output.extend(&chars[cursor..token.start]);
        output.push_str(&value);
        cursor = token.end + 1;
    }

    output.extend(&chars[cursor..]);
    output
}
