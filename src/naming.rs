/// A pure function from a declared field name to its JSON member name
/// (§4.9). Built-in strategies cover the common cases; [`NamingStrategy::Custom`]
/// wraps a user-supplied hook. The translated name is always the primary
/// member name, used both when writing and as the first name tried when
/// reading. [`crate::reflect::FieldView::alternates`] is a separate,
/// narrower mechanism: extra member names a field also accepts on read,
/// tried in declaration order when the primary name is absent. Alternates
/// never affect what gets written, and never shadow the primary name when
/// it is present.
#[derive(Clone)]
pub enum NamingStrategy {
    /// Field name used verbatim.
    Identity,
    /// `fieldName` -> `FieldName`.
    UpperCamel,
    /// `fieldName` -> `Field Name`.
    UpperCamelWithSpaces,
    /// `fieldName` -> `field_name` / `field-name` / `field.name`, depending
    /// on separator and case.
    Separated { separator: char, upper: bool },
    /// User-supplied hook, for naming schemes none of the built-ins cover.
    Custom(std::sync::Arc<dyn Fn(&str) -> String + Send + Sync>),
}

impl NamingStrategy {
    pub fn translate(&self, field: &str) -> String {
        match self {
            NamingStrategy::Identity => field.to_owned(),
            NamingStrategy::UpperCamel => upper_camel(field),
            NamingStrategy::UpperCamelWithSpaces => {
                let camel = upper_camel(field);
                space_before_upper(&camel)
            }
            NamingStrategy::Separated { separator, upper } => {
                separated(field, *separator, *upper)
            }
            NamingStrategy::Custom(f) => f(field),
        }
    }
}

impl Default for NamingStrategy {
    fn default() -> NamingStrategy {
        NamingStrategy::Identity
    }
}

fn upper_camel(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut chars = field.chars();
    if let Some(first) = chars.next() {
        out.extend(first.to_uppercase());
    }
    out.extend(chars);
    out
}

fn space_before_upper(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && c.is_uppercase() {
            out.push(' ');
        }
        out.push(c);
    }
    out
}

/// Splits `camelCase` into words and rejoins them with `separator`,
/// lower-casing or upper-casing every word as requested. Non-alphanumeric
/// boundaries already present in `field` (e.g. an existing underscore) are
/// treated as word boundaries too.
fn separated(field: &str, separator: char, upper: bool) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for c in field.chars() {
        if c == '_' || c == '-' || c == '.' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
        prev_lower = c.is_lowercase();
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .into_iter()
        .map(|w| {
            if upper {
                w.to_uppercase()
            } else {
                w.to_lowercase()
            }
        })
        .collect::<Vec<_>>()
        .join(&separator.to_string())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_upper_camel() {
        assert_eq!(NamingStrategy::UpperCamel.translate("fieldName"), "FieldName");
    }

    #[test]
    fn test_upper_camel_with_spaces() {
        assert_eq!(
            NamingStrategy::UpperCamelWithSpaces.translate("fieldName"),
            "Field Name"
        );
    }

    #[test]
    fn test_lower_snake_case() {
        let s = NamingStrategy::Separated {
            separator: '_',
            upper: false,
        };
        assert_eq!(s.translate("fieldName"), "field_name");
    }

    #[test]
    fn test_upper_kebab_case() {
        let s = NamingStrategy::Separated {
            separator: '-',
            upper: true,
        };
        assert_eq!(s.translate("fieldName"), "FIELD-NAME");
    }

    #[test]
    fn test_custom_hook() {
        let s = NamingStrategy::Custom(std::sync::Arc::new(|f: &str| format!("x_{}", f)));
        assert_eq!(s.translate("a"), "x_a");
    }
}
