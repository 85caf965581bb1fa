use std::{collections::HashMap, fs, path::Path, sync::OnceLock};

use anyhow::Context;
use regex::{Captures, Regex};

/// An HTML body template with `$name` / `${name}` placeholders.
///
/// Substitution is "safe": a placeholder with no matching variable stays in
/// the output verbatim, so rendering never fails even against a malformed or
/// out-of-date template. `$$` produces a literal `$`.
#[derive(Debug, Clone)]
pub struct Template {
    raw: String,
}

impl Template {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read template from {path:?}"))?;
        Ok(Self { raw })
    }

    pub fn render(&self, vars: &HashMap<&str, String>) -> String {
        static CELL: OnceLock<Regex> = OnceLock::new();
        let re = CELL.get_or_init(|| {
            Regex::new(r"\$(?:(\$)|\{([A-Za-z_][A-Za-z0-9_]*)\}|([A-Za-z_][A-Za-z0-9_]*))")
                .expect("failed to compile placeholder regex")
        });

        re.replace_all(&self.raw, |caps: &Captures| {
            if caps.get(1).is_some() {
                return "$".to_string();
            }
            let name = caps
                .get(2)
                .or_else(|| caps.get(3))
                .expect("one of the placeholder groups always matches")
                .as_str();
            match vars.get(name) {
                Some(value) => value.clone(),
                None => caps.get(0).unwrap().as_str().to_string(), // Group 0 is the whole match
            }
        })
        .into_owned()
    }
}

impl From<&str> for Template {
    fn from(value: &str) -> Self {
        value.to_string().into()
    }
}

impl From<String> for Template {
    fn from(raw: String) -> Self {
        Self { raw }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn vars() -> HashMap<&'static str, String> {
        HashMap::from([
            ("name", "Anna".to_string()),
            ("ist", "12.5".to_string()),
            ("soll", "20".to_string()),
        ])
    }

    #[rstest]
    #[case("Hallo $name!", "Hallo Anna!")]
    #[case("Hallo ${name}!", "Hallo Anna!")]
    #[case("Stand: $ist von $soll Stunden", "Stand: 12.5 von 20 Stunden")]
    #[case("Preis: $$5", "Preis: $5")]
    #[case("kein Platzhalter", "kein Platzhalter")]
    fn substitutes_known_placeholders(#[case] raw: &str, #[case] expected: &str) {
        let template = Template::from(raw);
        assert_eq!(template.render(&vars()), expected);
    }

    #[rstest]
    #[case("Hallo $unknown!", "Hallo $unknown!")]
    #[case("Hallo ${unknown}!", "Hallo ${unknown}!")]
    #[case("kostet 5 $ pro Stunde", "kostet 5 $ pro Stunde")]
    #[case("${unclosed", "${unclosed")]
    fn leaves_unknown_placeholders_verbatim(#[case] raw: &str, #[case] expected: &str) {
        let template = Template::from(raw);
        assert_eq!(template.render(&vars()), expected);
    }

    #[test]
    fn rendering_is_total_with_empty_vars() {
        let template = Template::from("Hallo $name, Stand ${ist}/$soll");

        let rendered = template.render(&HashMap::new());

        assert_eq!(rendered, "Hallo $name, Stand ${ist}/$soll");
    }

    #[test]
    fn load_missing_file_fails() {
        assert!(Template::load(Path::new("no_such_template.html")).is_err());
    }
}
