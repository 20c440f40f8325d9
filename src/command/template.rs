use std::collections::HashMap;

use regex::Regex;

use super::Parameter;

/// Placeholder grammar: `{{` optional space/tab, `.`, identifier, optional
/// space/tab, `}}`. Anything else is literal text.
const PLACEHOLDER_PATTERN: &str = r"\{\{[ \t]?\.([A-Za-z_][A-Za-z0-9_]*)[ \t]?\}\}";

fn placeholder_regex() -> Regex {
    Regex::new(PLACEHOLDER_PATTERN).unwrap()
}

/// Extracts the placeholders of a template in source order.
///
/// Every match produces one parameter with a freshly minted id, including
/// repeated names. Deduplication happens in `Command::build`.
pub fn parse_parameters(template: &str) -> Vec<Parameter> {
    placeholder_regex()
        .captures_iter(template)
        .map(|cap| Parameter::new(&cap[1]))
        .collect()
}

/// Substitutes every placeholder with the value keyed by its name.
///
/// Names missing from the map render as the empty string; the command layer
/// rules that out with its arity check before calling here. All bytes outside
/// placeholders pass through untouched.
pub fn render(template: &str, values: &HashMap<String, String>) -> String {
    placeholder_regex()
        .replace_all(template, |caps: &regex::Captures| {
            values.get(&caps[1]).cloned().unwrap_or_default()
        })
        .into_owned()
}
