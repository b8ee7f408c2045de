use crate::config::Config;
use crate::error::Error;
use crate::number::Number;
use crate::tree::Tree;

/// The Streaming Bridge (§4.6): converts between [`Tree`] and JSON text.
/// Reading goes through `serde_json::Value` (robust, well-tested grammar,
/// and its `Number` conversion is already what [`crate::number::Number`]
/// is built on), optionally preceded by [`delenient`] when `Config::lenient`
/// is set. Writing does not go through `Value`: it cannot represent a
/// non-finite float at all (`serde_json::Number::from_f64` returns `None`),
/// so honoring `permit_special_floats` requires a writer that walks `Tree`
/// directly rather than detouring through `Value`.
const NON_EXECUTABLE_PREFIX: &str = ")]}'\n";

pub fn to_string(tree: &Tree, config: &Config) -> Result<String, Error> {
    config.validate()?;
    let mut out = String::new();
    if config.non_executable_prefix {
        out.push_str(NON_EXECUTABLE_PREFIX);
    }
    let mut writer = Writer { config, out: &mut out };
    writer.write_tree(tree, 0)?;
    Ok(out)
}

pub fn to_writer<W: std::io::Write>(tree: &Tree, config: &Config, out: &mut W) -> Result<(), Error> {
    let text = to_string(tree, config)?;
    out.write_all(text.as_bytes())?;
    Ok(())
}

pub fn from_str(text: &str, config: &Config) -> Result<Tree, Error> {
    let stripped = text.strip_prefix(NON_EXECUTABLE_PREFIX).unwrap_or(text);
    let value: serde_json::Value = if config.lenient {
        serde_json::from_str(&delenient(stripped))?
    } else {
        serde_json::from_str(stripped)?
    };
    Ok(value_to_tree(&value))
}

pub fn from_reader<R: std::io::Read>(mut reader: R, config: &Config) -> Result<Tree, Error> {
    if config.lenient {
        // The rewrite pass needs the whole document in hand; `serde_json`'s
        // streaming reader has no lenient mode to delegate to here (see
        // `delenient`'s own doc comment).
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        return from_str(&text, config);
    }
    let value: serde_json::Value = serde_json::from_reader(reader)?;
    Ok(value_to_tree(&value))
}

/// Rewrites lenient-mode JSON extensions (unquoted object keys,
/// single-quoted strings, trailing commas, `//` and `/* */` comments) into
/// the strict JSON `serde_json::Deserializer` actually accepts (§6's
/// `lenient` flag). `serde_json` has no lenient-reader mode of its own, so
/// the same way `Writer` above hand-writes what `serde_json::Value` can't
/// represent, this is a small hand-rolled single-pass rewrite rather than a
/// second JSON grammar.
fn delenient(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(chars.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '"' => {
                out.push('"');
                i += 1;
                while i < chars.len() {
                    let c = chars[i];
                    out.push(c);
                    i += 1;
                    if c == '\\' && i < chars.len() {
                        out.push(chars[i]);
                        i += 1;
                        continue;
                    }
                    if c == '"' {
                        break;
                    }
                }
            }
            '\'' => {
                out.push('"');
                i += 1;
                while i < chars.len() {
                    let c = chars[i];
                    if c == '\\' && i + 1 < chars.len() {
                        let next = chars[i + 1];
                        if next == '\'' {
                            out.push('\'');
                        } else {
                            out.push('\\');
                            out.push(next);
                        }
                        i += 2;
                        continue;
                    }
                    if c == '\'' {
                        i += 1;
                        break;
                    }
                    if c == '"' {
                        out.push_str("\\\"");
                    } else {
                        out.push(c);
                    }
                    i += 1;
                }
                out.push('"');
            }
            '/' if matches!(chars.get(i + 1), Some('/')) => {
                i += 2;
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '/' if matches!(chars.get(i + 1), Some('*')) => {
                i += 2;
                while i + 1 < chars.len() && !(chars[i] == '*' && chars[i + 1] == '/') {
                    i += 1;
                }
                i = (i + 2).min(chars.len());
            }
            ',' => {
                if skips_to_closer(&chars, i + 1) {
                    // trailing comma before `]`/`}`: drop it
                } else {
                    out.push(',');
                }
                i += 1;
            }
            c if c.is_alphabetic() || c == '_' || c == '$' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '$') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                if matches!(word.as_str(), "true" | "false" | "null") {
                    out.push_str(&word);
                } else {
                    let mut j = i;
                    while j < chars.len() && chars[j].is_whitespace() {
                        j += 1;
                    }
                    if matches!(chars.get(j), Some(':')) {
                        out.push('"');
                        out.push_str(&word);
                        out.push('"');
                    } else {
                        out.push_str(&word);
                    }
                }
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }

    out
}

/// From position `from` (just past a comma), skips whitespace and comments
/// and reports whether the next significant character is `]`/`}` — i.e.
/// whether the comma just consumed was a trailing one.
fn skips_to_closer(chars: &[char], from: usize) -> bool {
    let mut j = from;
    loop {
        while j < chars.len() && chars[j].is_whitespace() {
            j += 1;
        }
        if matches!(chars.get(j), Some('/')) && matches!(chars.get(j + 1), Some('/')) {
            j += 2;
            while j < chars.len() && chars[j] != '\n' {
                j += 1;
            }
            continue;
        }
        if matches!(chars.get(j), Some('/')) && matches!(chars.get(j + 1), Some('*')) {
            j += 2;
            while j + 1 < chars.len() && !(chars[j] == '*' && chars[j + 1] == '/') {
                j += 1;
            }
            j = (j + 2).min(chars.len());
            continue;
        }
        break;
    }
    matches!(chars.get(j), Some(']') | Some('}'))
}

fn value_to_tree(value: &serde_json::Value) -> Tree {
    match value {
        serde_json::Value::Null => Tree::Null,
        serde_json::Value::Bool(b) => Tree::Bool(*b),
        serde_json::Value::Number(n) => Tree::Number(Number::from(n)),
        serde_json::Value::String(s) => Tree::String(s.clone()),
        serde_json::Value::Array(a) => Tree::Array(a.iter().map(value_to_tree).collect()),
        serde_json::Value::Object(o) => {
            let mut obj = crate::tree::Object::new();
            for (k, v) in o {
                obj.insert(k.clone(), value_to_tree(v));
            }
            Tree::Object(obj)
        }
    }
}

struct Writer<'a> {
    config: &'a Config,
    out: &'a mut String,
}

impl<'a> Writer<'a> {
    fn write_tree(&mut self, tree: &Tree, depth: usize) -> Result<(), Error> {
        match tree {
            Tree::Null => self.out.push_str("null"),
            Tree::Bool(b) => self.out.push_str(if *b { "true" } else { "false" }),
            Tree::Number(n) => self.out.push_str(&self.format_number(*n)?),
            Tree::String(s) => write_escaped_string(self.out, s, self.config.html_safe),
            Tree::Array(items) => self.write_array(items, depth)?,
            Tree::Object(obj) => self.write_object(obj, depth)?,
        }
        Ok(())
    }

    fn format_number(&self, n: Number) -> Result<String, Error> {
        if n.is_non_finite() {
            if !self.config.permit_special_floats {
                return Err(Error::InvalidNumber(n.into()));
            }
            let f: f64 = n.into();
            return Ok(if f.is_nan() {
                "NaN".to_owned()
            } else if f > 0.0 {
                "Infinity".to_owned()
            } else {
                "-Infinity".to_owned()
            });
        }
        Ok(n.to_string())
    }

    fn write_array(&mut self, items: &[Tree], depth: usize) -> Result<(), Error> {
        if items.is_empty() {
            self.out.push_str("[]");
            return Ok(());
        }
        self.out.push('[');
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.out.push(',');
            }
            self.newline_indent(depth + 1);
            self.write_tree(item, depth + 1)?;
        }
        self.newline_indent(depth);
        self.out.push(']');
        Ok(())
    }

    fn write_object(&mut self, obj: &crate::tree::Object, depth: usize) -> Result<(), Error> {
        if obj.is_empty() {
            self.out.push_str("{}");
            return Ok(());
        }
        self.out.push('{');
        for (i, (k, v)) in obj.iter().enumerate() {
            if i > 0 {
                self.out.push(',');
            }
            self.newline_indent(depth + 1);
            write_escaped_string(self.out, k, self.config.html_safe);
            self.out.push(':');
            if self.config.pretty_print.is_some() {
                self.out.push(' ');
            }
            self.write_tree(v, depth + 1)?;
        }
        self.newline_indent(depth);
        self.out.push('}');
        Ok(())
    }

    fn newline_indent(&mut self, depth: usize) {
        if let Some(pp) = &self.config.pretty_print {
            self.out.push_str(&pp.newline);
            for _ in 0..depth {
                self.out.push_str(&pp.indent);
            }
        }
    }
}

/// Escapes `s` as a JSON string literal. ` `/` ` (line/paragraph
/// separator) are always escaped since they're valid in JSON strings but
/// illegal unescaped in JavaScript string literals, matching the distilled
/// spec's always-safe-for-embedding default; `html_safe` additionally
/// escapes `<`, `>`, `&`, `=`, `'` so the output can be embedded in an HTML
/// `<script>` block without closing it early.
fn write_escaped_string(out: &mut String, s: &str, html_safe: bool) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c if html_safe && matches!(c, '<' | '>' | '&' | '=' | '\'') => {
                out.push_str(&format!("\\u{:04x}", c as u32))
            }
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}
