use crate::Number;
use indexmap::IndexMap;
use itertools::{EitherOrBoth, Itertools};
use std::cmp::Ordering;
use std::fmt;

/// `Tree` is the in-memory representation of a parsed or about-to-be-written
/// JSON document: a tagged value isomorphic to RFC-8259 JSON.
///
/// Object members preserve insertion order (`Object` is an `IndexMap`, not a
/// `HashMap`); `null` member values are stored as `Tree::Null`, never as
/// absence of the member. `Tree` is immutable by convention: every
/// transformation in this crate produces a new `Tree` rather than mutating
/// one in place, though nothing below the type system enforces that.
#[derive(Debug, Clone)]
pub enum Tree {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Tree>),
    Object(Object),
}

/// `Object` is the ordered member map backing `Tree::Object`.
pub type Object = IndexMap<String, Tree>;

impl Tree {
    pub fn object() -> Tree {
        Tree::Object(Object::new())
    }

    pub fn array() -> Tree {
        Tree::Array(Vec::new())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Tree::Null)
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Tree::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut Object> {
        match self {
            Tree::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Tree]> {
        match self {
            Tree::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Tree::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Number> {
        match self {
            Tree::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Tree::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// A short, lower-case name of this node's kind, used in diagnostics
    /// (e.g. `SyntaxError` messages reporting "expected string, found object").
    pub fn kind_name(&self) -> &'static str {
        match self {
            Tree::Null => "null",
            Tree::Bool(_) => "boolean",
            Tree::Number(_) => "number",
            Tree::String(_) => "string",
            Tree::Array(_) => "array",
            Tree::Object(_) => "object",
        }
    }
}

impl From<bool> for Tree {
    fn from(b: bool) -> Tree {
        Tree::Bool(b)
    }
}

impl From<String> for Tree {
    fn from(s: String) -> Tree {
        Tree::String(s)
    }
}

impl From<&str> for Tree {
    fn from(s: &str) -> Tree {
        Tree::String(s.to_owned())
    }
}

impl<N: Into<Number>> From<N> for Tree
where
    Number: From<N>,
{
    fn from(n: N) -> Tree {
        Tree::Number(Number::from(n))
    }
}

/// Structural equality: two trees are equal iff they have the same shape and,
/// recursively, equal children. Object equality is order-insensitive (it
/// compares member sets, not member sequences), matching JSON's definition
/// of object equality while `compare` below still imposes an order over
/// distinct-but-equal-under-JSON-semantics documents for stable sorting.
impl PartialEq for Tree {
    fn eq(&self, other: &Tree) -> bool {
        match (self, other) {
            (Tree::Null, Tree::Null) => true,
            (Tree::Bool(l), Tree::Bool(r)) => l == r,
            (Tree::Number(l), Tree::Number(r)) => l == r,
            (Tree::String(l), Tree::String(r)) => l == r,
            (Tree::Array(l), Tree::Array(r)) => l == r,
            (Tree::Object(l), Tree::Object(r)) => {
                l.len() == r.len() && l.iter().all(|(k, v)| r.get(k) == Some(v))
            }
            _ => false,
        }
    }
}
impl Eq for Tree {}

/// `compare` establishes a total, arbitrary ordering over `Tree` values,
/// used by container codecs that need a deterministic member order (e.g.
/// the complex-map-keys codec sorting entries for reproducible output).
/// Arrays and objects are compared lexicographically; object members are
/// compared in iteration (insertion) order.
pub fn compare(lhs: &Tree, rhs: &Tree) -> Ordering {
    match (lhs, rhs) {
        (Tree::Null, Tree::Null) => Ordering::Equal,
        (Tree::Bool(l), Tree::Bool(r)) => l.cmp(r),
        (Tree::Number(l), Tree::Number(r)) => l.cmp(r),
        (Tree::String(l), Tree::String(r)) => l.cmp(r),
        (Tree::Array(l), Tree::Array(r)) => l
            .iter()
            .zip_longest(r.iter())
            .map(|eob| match eob {
                EitherOrBoth::Both(l, r) => compare(l, r),
                EitherOrBoth::Right(_) => Ordering::Less,
                EitherOrBoth::Left(_) => Ordering::Greater,
            })
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal),
        (Tree::Object(l), Tree::Object(r)) => l
            .iter()
            .zip_longest(r.iter())
            .map(|eob| match eob {
                EitherOrBoth::Both((lk, lv), (rk, rv)) => match lk.cmp(rk) {
                    Ordering::Equal => compare(lv, rv),
                    ord => ord,
                },
                EitherOrBoth::Right(_) => Ordering::Less,
                EitherOrBoth::Left(_) => Ordering::Greater,
            })
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal),

        // Types are not equal; define an arbitrary total ordering.
        (Tree::Null, _) => Ordering::Less,
        (_, Tree::Null) => Ordering::Greater,
        (Tree::Bool(_), _) => Ordering::Less,
        (_, Tree::Bool(_)) => Ordering::Greater,
        (Tree::Number(_), _) => Ordering::Less,
        (_, Tree::Number(_)) => Ordering::Greater,
        (Tree::String(_), _) => Ordering::Less,
        (_, Tree::String(_)) => Ordering::Greater,
        (Tree::Array(_), _) => Ordering::Less,
        (_, Tree::Array(_)) => Ordering::Greater,
    }
}

impl fmt::Display for Tree {
    /// `Display` always emits in lenient mode so that non-finite numbers never
    /// fault on `to_string()`, matching the distilled spec's
    /// "`toString` on Tree always emits in lenient mode" rule. Use
    /// `crate::bridge` for a policy-checked, canonical serialization.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tree::Null => write!(f, "null"),
            Tree::Bool(b) => write!(f, "{}", b),
            Tree::Number(n) => write!(f, "{}", n),
            Tree::String(s) => write!(f, "{:?}", s),
            Tree::Array(a) => {
                write!(f, "[")?;
                for (i, v) in a.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
            Tree::Object(o) => {
                write!(f, "{{")?;
                for (i, (k, v)) in o.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{:?}:{}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}
