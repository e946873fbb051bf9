//! Fragment rendering: `{{name}}` substitution into static templates.

use std::collections::HashMap;

use crate::domain::error::DomainError;

/// Render `template`, replacing every `{{name}}` with `params[name]`.
///
/// Whitespace inside the braces is ignored (`{{ name }}`). Unused params are
/// fine; a placeholder without a param is [`DomainError::MissingParameter`].
/// An unterminated `{{` is copied through verbatim.
pub fn render(template: &str, params: &HashMap<String, String>) -> Result<String, DomainError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        let after_open = &rest[open + 2..];
        let Some(close) = after_open.find("}}") else {
            break;
        };

        out.push_str(&rest[..open]);
        let name = after_open[..close].trim();
        let value = params
            .get(name)
            .ok_or_else(|| DomainError::MissingParameter {
                name: name.to_string(),
            })?;
        out.push_str(value);
        rest = &after_open[close + 2..];
    }

    out.push_str(rest);
    Ok(out)
}

/// Build a parameter map from `(key, value)` pairs.
pub fn params<const N: usize>(pairs: [(&str, &str); N]) -> HashMap<String, String> {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_version_into_migration_header() {
        let out = render(
            "class EnablePgcrypto < ActiveRecord::Migration[{{framework_version}}]\n",
            &params([("framework_version", "7.1")]),
        )
        .unwrap();
        assert_eq!(out, "class EnablePgcrypto < ActiveRecord::Migration[7.1]\n");
    }

    #[test]
    fn tolerates_inner_whitespace() {
        let out = render("{{ app }}_jobs", &params([("app", "blog")])).unwrap();
        assert_eq!(out, "blog_jobs");
    }

    #[test]
    fn missing_parameter_is_error() {
        let err = render("Migration[{{framework_version}}]", &HashMap::new()).unwrap_err();
        assert_eq!(
            err,
            DomainError::MissingParameter {
                name: "framework_version".into()
            }
        );
    }

    #[test]
    fn ruby_interpolation_is_left_alone() {
        let out = render(
            "\"{{app}}_#{Rails.env}\"",
            &params([("app", "blog")]),
        )
        .unwrap();
        assert_eq!(out, "\"blog_#{Rails.env}\"");
    }

    #[test]
    fn unterminated_placeholder_is_verbatim() {
        let out = render("a {{b", &HashMap::new()).unwrap();
        assert_eq!(out, "a {{b");
    }

    #[test]
    fn repeated_placeholders_all_replaced() {
        let out = render("{{x}}-{{x}}", &params([("x", "1")])).unwrap();
        assert_eq!(out, "1-1");
    }
}
