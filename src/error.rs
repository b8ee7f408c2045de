use crate::location::Location;

/// The complete error taxonomy surfaced by this crate. Every public
/// operation returns `Result<T, Error>`; malformed input never panics.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Malformed JSON text, or a JSON value whose shape does not match the
    /// declared Rust type (wrong JSON type for a field, bad number/date
    /// format).
    #[error("syntax error at {path}: {message}")]
    SyntaxError { path: String, message: String },

    /// The underlying `serde_json` reader or writer failed.
    #[error("I/O error: {0}")]
    IOError(#[from] std::io::Error),

    /// No codec could be resolved for a descriptor.
    #[error("no codec is registered for type {type_name}")]
    UnsupportedType { type_name: &'static str },

    /// The value graph contains a cycle on the reflective path.
    #[error("cyclic reference detected at {path}")]
    CyclicReference { path: String },

    /// A proxy codec was used before its delegate was set. Indicates a bug
    /// in a custom codec factory (recursing into its own type before
    /// `create` returns), not malformed input.
    #[error("codec resolution for {type_name} was used before it completed")]
    CyclicResolutionNotReady { type_name: &'static str },

    /// A registry mutation after `freeze()`, an invalid format string, or an
    /// invalid pretty-print newline/indent.
    #[error("configuration error: {0}")]
    ConfigurationError(String),

    /// A non-finite float was serialized without `permit_special_floats`.
    #[error("non-finite number {0} is not permitted without permit_special_floats")]
    InvalidNumber(f64),

    /// An unrecognized JSON member was encountered under the strict
    /// unknown-member policy.
    #[error("unknown member {member:?} at {path}")]
    UnknownMember { path: String, member: String },
}

impl Error {
    pub fn syntax(loc: &Location<'_>, message: impl Into<String>) -> Error {
        Error::SyntaxError {
            path: loc.pointer_str().to_string(),
            message: message.into(),
        }
    }

    pub fn cyclic_reference(loc: &Location<'_>) -> Error {
        Error::CyclicReference {
            path: loc.pointer_str().to_string(),
        }
    }

    pub fn unknown_member(loc: &Location<'_>, member: impl Into<String>) -> Error {
        Error::UnknownMember {
            path: loc.pointer_str().to_string(),
            member: member.into(),
        }
    }
}

// Kept for diagnostics that want a plain string without constructing a
// Location (e.g. configuration-time checks that happen before any walk).
impl From<&str> for Error {
    fn from(s: &str) -> Error {
        Error::ConfigurationError(s.to_owned())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Error {
        Error::ConfigurationError(s)
    }
}

// serde_json's own error type is reported via this crate's `bridge` module;
// the bridge translates it into a `SyntaxError`/`IOError` rather than
// exposing it directly, so callers never need to match on a foreign error
// type. This impl exists only to make `?` ergonomic in `bridge.rs`.
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Error {
        if e.is_io() {
            Error::IOError(std::io::Error::new(std::io::ErrorKind::Other, e))
        } else {
            Error::SyntaxError {
                path: String::new(),
                message: e.to_string(),
            }
        }
    }
}
