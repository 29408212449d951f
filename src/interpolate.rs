//! Placeholder interpolation (`{amount}` and `{{amount}}`).

use std::fmt::Display;

/// Named values substituted into translated text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, String)>);

impl Params {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Adds a parameter; a later value for the same name wins.
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Display) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Display) {
        let value = value.to_string();
        match self.0.iter_mut().find(|(existing, _)| existing == name) {
            Some((_, slot)) => *slot = value,
            None => self.0.push((name.to_string(), value)),
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.iter().find(|(existing, _)| existing == name).map(|(_, value)| value.as_str())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<N: AsRef<str>, V: Display> FromIterator<(N, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (name, value) in iter {
            params.insert(name.as_ref(), value);
        }
        params
    }
}

/// Replaces `{name}` and `{{name}}` placeholders with values from `params`.
///
/// Placeholders without a matching parameter are kept verbatim, as is any
/// brace that does not open a well-formed placeholder.
#[must_use]
pub fn interpolate(template: &str, params: &Params) -> String {
    if params.is_empty() || !template.contains('{') {
        return template.to_string();
    }

    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        let (before, tail) = rest.split_at(start);
        out.push_str(before);

        if let Some(inner) = tail.strip_prefix("{{")
            && let Some((name, after)) = inner.split_once("}}")
            && is_placeholder_name(name.trim())
        {
            match params.get(name.trim()) {
                Some(value) => out.push_str(value),
                None => {
                    tracing::debug!(placeholder = name.trim(), "No value for placeholder");
                    out.push_str("{{");
                    out.push_str(name);
                    out.push_str("}}");
                }
            }
            rest = after;
            continue;
        }

        if let Some(inner) = tail.strip_prefix('{')
            && let Some((name, after)) = inner.split_once('}')
            && is_placeholder_name(name.trim())
        {
            match params.get(name.trim()) {
                Some(value) => out.push_str(value),
                None => {
                    tracing::debug!(placeholder = name.trim(), "No value for placeholder");
                    out.push('{');
                    out.push_str(name);
                    out.push('}');
                }
            }
            rest = after;
            continue;
        }

        out.push('{');
        rest = tail.get(1..).unwrap_or_default();
    }

    out.push_str(rest);
    out
}

/// Placeholder names are non-empty runs of alphanumerics, `_`, `-` and `.`.
fn is_placeholder_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;

    fn params() -> Params {
        Params::new().with("amount", 250).with("token", "BSN").with("user.name", "Ada")
    }

    #[rstest]
    #[case::single_brace("Reserve {amount} {token}", "Reserve 250 BSN")]
    #[case::double_brace("Reserve {{amount}} {{ token }}", "Reserve 250 BSN")]
    #[case::dotted_name("Hi {user.name}!", "Hi Ada!")]
    #[case::unknown_kept("Left: {remaining}", "Left: {remaining}")]
    #[case::unknown_double_kept("Left: {{remaining}}", "Left: {{remaining}}")]
    #[case::unclosed("Open {amount", "Open {amount")]
    #[case::not_a_name("Set {a b} {}", "Set {a b} {}")]
    #[case::adjacent("{amount}{token}", "250BSN")]
    #[case::no_placeholders("Plain text", "Plain text")]
    #[case::unicode("{token} を {amount} 個予約", "BSN を 250 個予約")]
    fn interpolate_cases(#[case] template: &str, #[case] expected: &str) {
        assert_that!(interpolate(template, &params()), eq(expected));
    }

    #[googletest::test]
    fn empty_params_return_template() {
        expect_that!(interpolate("Reserve {amount}", &Params::new()), eq("Reserve {amount}"));
    }

    #[googletest::test]
    fn later_value_wins() {
        let params = Params::new().with("amount", 1).with("amount", 2);

        expect_that!(params.get("amount"), some(eq("2")));
    }

    #[googletest::test]
    fn collect_from_pairs() {
        let params: Params = [("amount", 5), ("count", 7)].into_iter().collect();

        expect_that!(params.get("count"), some(eq("7")));
        expect_that!(params.get("missing"), none());
    }
}
