use crate::naming::NamingStrategy;
use serde::Deserialize;

/// How `i64`/`u64`-shaped "long" values are serialized — §6's "Long
/// serialization policy", fixed once at engine construction.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LongPolicy {
    Number,
    String,
}

impl Default for LongPolicy {
    fn default() -> LongPolicy {
        LongPolicy::Number
    }
}

/// How an unrecognized JSON member is handled during deserialization (§4.5).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownMemberPolicy {
    Ignore,
    Throw,
}

impl Default for UnknownMemberPolicy {
    fn default() -> UnknownMemberPolicy {
        UnknownMemberPolicy::Ignore
    }
}

/// Newline and indent strings for pretty-printed output. The newline must
/// contain only `\r`/`\n`; the indent only space/tab — both are validated by
/// [`Config::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PrettyPrint {
    pub newline: String,
    pub indent: String,
}

impl Default for PrettyPrint {
    fn default() -> PrettyPrint {
        PrettyPrint {
            newline: "\n".to_owned(),
            indent: "  ".to_owned(),
        }
    }
}

/// A plain, directly constructible configuration struct (§1's "not itself
/// part of the binding core"). Deliberately not a fluent builder — the
/// fluent façade is explicitly out of scope; `Config::default()` plus field
/// assignment, or loading a config file via `serde::Deserialize`, covers
/// every option in §6's configuration table.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub serialize_nulls: bool,
    pub pretty_print: Option<PrettyPrint>,
    pub html_safe: bool,
    pub lenient: bool,
    pub non_executable_prefix: bool,
    pub permit_special_floats: bool,
    pub long_policy: LongPolicy,
    pub date_pattern: Option<String>,
    pub naming: NamingStrategyConfig,
    pub explicit_expose_only: bool,
    pub version: Option<u32>,
    pub complex_map_keys: bool,
    pub disable_inner_classes: bool,
    pub unknown_field_policy: UnknownMemberPolicy,
}

/// `serde::Deserialize`-able stand-in for [`NamingStrategy`], since the
/// custom-hook variant can't be deserialized from a config file. Config
/// files select one of the built-in strategies by name; a custom hook can
/// only be installed in code via [`Config::with_naming`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingStrategyConfig {
    Identity,
    UpperCamel,
    UpperCamelWithSpaces,
    LowerCaseWithUnderscores,
    LowerCaseWithDashes,
    LowerCaseWithDots,
    UpperCaseWithUnderscores,
}

impl Default for NamingStrategyConfig {
    fn default() -> NamingStrategyConfig {
        NamingStrategyConfig::Identity
    }
}

impl From<NamingStrategyConfig> for NamingStrategy {
    fn from(c: NamingStrategyConfig) -> NamingStrategy {
        match c {
            NamingStrategyConfig::Identity => NamingStrategy::Identity,
            NamingStrategyConfig::UpperCamel => NamingStrategy::UpperCamel,
            NamingStrategyConfig::UpperCamelWithSpaces => NamingStrategy::UpperCamelWithSpaces,
            NamingStrategyConfig::LowerCaseWithUnderscores => NamingStrategy::Separated {
                separator: '_',
                upper: false,
            },
            NamingStrategyConfig::LowerCaseWithDashes => NamingStrategy::Separated {
                separator: '-',
                upper: false,
            },
            NamingStrategyConfig::LowerCaseWithDots => NamingStrategy::Separated {
                separator: '.',
                upper: false,
            },
            NamingStrategyConfig::UpperCaseWithUnderscores => NamingStrategy::Separated {
                separator: '_',
                upper: true,
            },
        }
    }
}

impl Default for Config {
    fn default() -> Config {
        Config {
            serialize_nulls: false,
            pretty_print: None,
            html_safe: true,
            lenient: false,
            non_executable_prefix: false,
            permit_special_floats: false,
            long_policy: LongPolicy::default(),
            date_pattern: None,
            naming: NamingStrategyConfig::default(),
            explicit_expose_only: false,
            version: None,
            complex_map_keys: false,
            disable_inner_classes: false,
            unknown_field_policy: UnknownMemberPolicy::default(),
        }
    }
}

impl Config {
    /// Validates the pretty-print newline/indent constraints from §4.6,
    /// failing with `ConfigurationError` rather than at first use.
    pub fn validate(&self) -> Result<(), crate::error::Error> {
        if let Some(pp) = &self.pretty_print {
            if !pp.newline.chars().all(|c| c == '\r' || c == '\n') {
                return Err(crate::error::Error::ConfigurationError(
                    "pretty-print newline must contain only \\r/\\n".into(),
                ));
            }
            if !pp.indent.chars().all(|c| c == ' ' || c == '\t') {
                return Err(crate::error::Error::ConfigurationError(
                    "pretty-print indent must contain only space/tab".into(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_newline() {
        let mut cfg = Config::default();
        cfg.pretty_print = Some(PrettyPrint {
            newline: "xx".into(),
            indent: "  ".into(),
        });
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_indent() {
        let mut cfg = Config::default();
        cfg.pretty_print = Some(PrettyPrint {
            newline: "\n".into(),
            indent: "xx".into(),
        });
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_deserialize_from_json() {
        let json = r#"{"serialize_nulls": true, "naming": "lower_case_with_underscores"}"#;
        let cfg: Config = serde_json::from_str(json).unwrap();
        assert!(cfg.serialize_nulls);
        assert_eq!(cfg.naming, NamingStrategyConfig::LowerCaseWithUnderscores);
    }
}
