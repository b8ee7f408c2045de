use crate::codec::{AnyCodec, Codec, CodecFactory, FnFactory, TypedCodecAdapter};
use crate::ctx::Ctx;
use crate::descriptor::{Descriptor, Kind};
use crate::error::Error;
use crate::location::Location;
use crate::tree::Tree;
use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use time::format_description::well_known::{Iso8601, Rfc2822};
use time::OffsetDateTime;
use url::Url;
use uuid::Uuid;

/// Guards every `time` format/parse call made through [`DateTimeCodec`].
/// `time::format_description::parse` and the `Iso8601`/custom-format
/// `format`/`parse` entry points are not documented as reentrant, and this
/// codec can be invoked from arbitrary worker threads concurrently; routing
/// every call through one process-wide lock trades a small amount of
/// contention for not having to audit `time`'s internals on every upgrade.
static DATE_FORMAT_LOCK: Mutex<()> = Mutex::new(());

struct UuidCodec;
impl Codec<Uuid> for UuidCodec {
    fn kind(&self) -> crate::codec::CodecKind {
        crate::codec::CodecKind::Combined
    }
    fn write(&self, value: &Uuid, _desc: &Descriptor, _ctx: &Ctx<'_>) -> Result<Tree, Error> {
        Ok(Tree::String(
            value.hyphenated().to_string().to_ascii_lowercase(),
        ))
    }
    fn read(&self, tree: &Tree, _desc: &Descriptor, _ctx: &Ctx<'_>) -> Result<Uuid, Error> {
        let s = tree
            .as_str()
            .ok_or_else(|| Error::syntax(&Location::Root, format!("expected string, found {}", tree.kind_name())))?;
        Uuid::parse_str(s).map_err(|e| Error::syntax(&Location::Root, format!("invalid uuid {:?}: {}", s, e)))
    }
    fn create_empty(&self, _desc: &Descriptor, _ctx: &Ctx<'_>) -> Result<Uuid, Error> {
        Ok(Uuid::nil())
    }
}

struct UrlCodec;
impl Codec<Url> for UrlCodec {
    fn kind(&self) -> crate::codec::CodecKind {
        crate::codec::CodecKind::Combined
    }
    fn write(&self, value: &Url, _desc: &Descriptor, _ctx: &Ctx<'_>) -> Result<Tree, Error> {
        Ok(Tree::String(value.as_str().to_owned()))
    }
    fn read(&self, tree: &Tree, _desc: &Descriptor, _ctx: &Ctx<'_>) -> Result<Url, Error> {
        let s = tree
            .as_str()
            .ok_or_else(|| Error::syntax(&Location::Root, format!("expected string, found {}", tree.kind_name())))?;
        Url::parse(s).map_err(|e| Error::syntax(&Location::Root, format!("invalid url {:?}: {}", s, e)))
    }
    fn create_empty(&self, _desc: &Descriptor, _ctx: &Ctx<'_>) -> Result<Url, Error> {
        Url::parse("about:blank").map_err(|e| Error::syntax(&Location::Root, e.to_string()))
    }
}

/// `OffsetDateTime` codec (§4.5): on write, formats with the configured
/// `date_pattern` if present, else ISO-8601. On read, tries three
/// candidates in order — the configured pattern, then RFC 2822, then
/// ISO-8601 — and the first to parse wins; a `SyntaxError` is raised only
/// once all three have failed. RFC 2822 stands in for the "locale-default
/// form" middle tier: Rust's ecosystem has no OS-locale-aware date
/// formatter in this crate's dependency stack, so a second fixed,
/// widely-recognized human-readable format is the closest available
/// approximation (see DESIGN.md).
struct DateTimeCodec;
impl Codec<OffsetDateTime> for DateTimeCodec {
    fn kind(&self) -> crate::codec::CodecKind {
        crate::codec::CodecKind::Combined
    }

    fn write(&self, value: &OffsetDateTime, _desc: &Descriptor, ctx: &Ctx<'_>) -> Result<Tree, Error> {
        let _guard = DATE_FORMAT_LOCK.lock().unwrap();
        let formatted = match &ctx.config.date_pattern {
            Some(pattern) => {
                let fmt = time::format_description::parse(pattern).map_err(|e| {
                    Error::ConfigurationError(format!("invalid date_pattern {:?}: {}", pattern, e))
                })?;
                value
                    .format(&fmt)
                    .map_err(|e| Error::syntax(&Location::Root, e.to_string()))?
            }
            None => value
                .format(&Iso8601::DEFAULT)
                .map_err(|e| Error::syntax(&Location::Root, e.to_string()))?,
        };
        Ok(Tree::String(formatted))
    }

    fn read(&self, tree: &Tree, _desc: &Descriptor, ctx: &Ctx<'_>) -> Result<OffsetDateTime, Error> {
        let s = tree
            .as_str()
            .ok_or_else(|| Error::syntax(&Location::Root, format!("expected string, found {}", tree.kind_name())))?;

        let _guard = DATE_FORMAT_LOCK.lock().unwrap();
        if let Some(pattern) = &ctx.config.date_pattern {
            if let Ok(fmt) = time::format_description::parse(pattern) {
                if let Ok(dt) = OffsetDateTime::parse(s, &fmt) {
                    return Ok(dt);
                }
            }
        }

        if let Ok(dt) = OffsetDateTime::parse(s, &Rfc2822) {
            return Ok(dt);
        }

        OffsetDateTime::parse(s, &Iso8601::DEFAULT)
            .map_err(|_| Error::syntax(&Location::Root, format!("{:?} matches no configured or default date format", s)))
    }

    fn create_empty(&self, _desc: &Descriptor, _ctx: &Ctx<'_>) -> Result<OffsetDateTime, Error> {
        Ok(OffsetDateTime::UNIX_EPOCH)
    }
}

/// `BigInt` codec. Emitted as a `Tree::String` carrying the canonical base-10
/// digits rather than `Tree::Number`: `Number` can only hold `u64`/`i64`/`f64`,
/// which would silently truncate values outside that range. This is a
/// deliberate departure from the literal "JSON numbers" phrasing in favor of
/// actually being lossless, since `serde_json`'s own `arbitrary_precision`
/// feature makes the same trade by encoding big numbers as a transparent
/// string-backed `Number` under the hood.
struct BigIntCodec;
impl Codec<BigInt> for BigIntCodec {
    fn kind(&self) -> crate::codec::CodecKind {
        crate::codec::CodecKind::Combined
    }
    fn write(&self, value: &BigInt, _desc: &Descriptor, _ctx: &Ctx<'_>) -> Result<Tree, Error> {
        Ok(Tree::String(value.to_string()))
    }
    fn read(&self, tree: &Tree, _desc: &Descriptor, _ctx: &Ctx<'_>) -> Result<BigInt, Error> {
        let s = match tree {
            Tree::String(s) => s.clone(),
            Tree::Number(n) => n.to_string(),
            other => {
                return Err(Error::syntax(
                    &Location::Root,
                    format!("expected string or number, found {}", other.kind_name()),
                ))
            }
        };
        BigInt::from_str(&s).map_err(|e| Error::syntax(&Location::Root, format!("invalid integer {:?}: {}", s, e)))
    }
    fn create_empty(&self, _desc: &Descriptor, _ctx: &Ctx<'_>) -> Result<BigInt, Error> {
        Ok(BigInt::from(0))
    }
}

/// `BigDecimal` codec; see [`BigIntCodec`] for why this emits `Tree::String`
/// rather than `Tree::Number`.
struct BigDecimalCodec;
impl Codec<BigDecimal> for BigDecimalCodec {
    fn kind(&self) -> crate::codec::CodecKind {
        crate::codec::CodecKind::Combined
    }
    fn write(&self, value: &BigDecimal, _desc: &Descriptor, _ctx: &Ctx<'_>) -> Result<Tree, Error> {
        Ok(Tree::String(value.to_string()))
    }
    fn read(&self, tree: &Tree, _desc: &Descriptor, _ctx: &Ctx<'_>) -> Result<BigDecimal, Error> {
        let s = match tree {
            Tree::String(s) => s.clone(),
            Tree::Number(n) => n.to_string(),
            other => {
                return Err(Error::syntax(
                    &Location::Root,
                    format!("expected string or number, found {}", other.kind_name()),
                ))
            }
        };
        BigDecimal::from_str(&s)
            .map_err(|e| Error::syntax(&Location::Root, format!("invalid decimal {:?}: {}", s, e)))
    }
    fn create_empty(&self, _desc: &Descriptor, _ctx: &Ctx<'_>) -> Result<BigDecimal, Error> {
        Ok(BigDecimal::from(0))
    }
}

/// Builds the ordered list of built-in "leaf reference type" factories
/// (§4.8): `Uuid`, `Url`, `OffsetDateTime`, `BigInt`, `BigDecimal`, each an
/// exact-tier match on `TypeId`.
pub fn factory() -> Box<dyn CodecFactory> {
    let uuid_desc = Descriptor::of::<Uuid>("Uuid", Kind::Primitive);
    let url_desc = Descriptor::of::<Url>("Url", Kind::Primitive);
    let datetime_desc = Descriptor::of::<OffsetDateTime>("OffsetDateTime", Kind::Primitive);
    let bigint_desc = Descriptor::of::<BigInt>("BigInt", Kind::Primitive);
    let bigdecimal_desc = Descriptor::of::<BigDecimal>("BigDecimal", Kind::Primitive);

    let uuid_codec: Arc<dyn AnyCodec> = Arc::new(TypedCodecAdapter::<Uuid, _>::new(UuidCodec));
    let url_codec: Arc<dyn AnyCodec> = Arc::new(TypedCodecAdapter::<Url, _>::new(UrlCodec));
    let datetime_codec: Arc<dyn AnyCodec> =
        Arc::new(TypedCodecAdapter::<OffsetDateTime, _>::new(DateTimeCodec));
    let bigint_codec: Arc<dyn AnyCodec> = Arc::new(TypedCodecAdapter::<BigInt, _>::new(BigIntCodec));
    let bigdecimal_codec: Arc<dyn AnyCodec> =
        Arc::new(TypedCodecAdapter::<BigDecimal, _>::new(BigDecimalCodec));

    Box::new(FnFactory(move |desc: &Descriptor| {
        if *desc == uuid_desc {
            Some(uuid_codec.clone())
        } else if *desc == url_desc {
            Some(url_codec.clone())
        } else if *desc == datetime_desc {
            Some(datetime_codec.clone())
        } else if *desc == bigint_desc {
            Some(bigint_codec.clone())
        } else if *desc == bigdecimal_desc {
            Some(bigdecimal_codec.clone())
        } else {
            None
        }
    }))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cache::AdapterCache;
    use crate::config::Config;
    use crate::exclusion::ExclusionRules;
    use crate::naming::NamingStrategy;
    use crate::registry::Registry;

    fn test_ctx<'a>(
        registry: &'a Registry,
        cache: &'a AdapterCache,
        config: &'a Config,
        naming: &'a NamingStrategy,
        excl: &'a ExclusionRules,
    ) -> Ctx<'a> {
        Ctx {
            registry,
            cache,
            config,
            naming,
            ser_exclusion: excl,
            de_exclusion: excl,
        }
    }

    #[test]
    fn test_uuid_roundtrip_is_lowercase_hyphenated() {
        let registry = Registry::new();
        let cache = AdapterCache::new(vec![]);
        let config = Config::default();
        let naming = NamingStrategy::default();
        let excl = ExclusionRules::default();
        let ctx = test_ctx(&registry, &cache, &config, &naming, &excl);

        let codec = UuidCodec;
        let desc = Descriptor::of::<Uuid>("Uuid", Kind::Primitive);
        let id = Uuid::parse_str("550E8400-E29B-41D4-A716-446655440000").unwrap();
        let tree = codec.write(&id, &desc, &ctx).unwrap();
        assert_eq!(tree, Tree::String("550e8400-e29b-41d4-a716-446655440000".into()));
        assert_eq!(codec.read(&tree, &desc, &ctx).unwrap(), id);
    }

    #[test]
    fn test_bigint_exceeds_i64_range() {
        let registry = Registry::new();
        let cache = AdapterCache::new(vec![]);
        let config = Config::default();
        let naming = NamingStrategy::default();
        let excl = ExclusionRules::default();
        let ctx = test_ctx(&registry, &cache, &config, &naming, &excl);

        let codec = BigIntCodec;
        let desc = Descriptor::of::<BigInt>("BigInt", Kind::Primitive);
        let huge = BigInt::from_str("123456789012345678901234567890").unwrap();
        let tree = codec.write(&huge, &desc, &ctx).unwrap();
        assert_eq!(
            tree,
            Tree::String("123456789012345678901234567890".into())
        );
        assert_eq!(codec.read(&tree, &desc, &ctx).unwrap(), huge);
    }

    #[test]
    fn test_datetime_defaults_to_iso8601() {
        let registry = Registry::new();
        let cache = AdapterCache::new(vec![]);
        let config = Config::default();
        let naming = NamingStrategy::default();
        let excl = ExclusionRules::default();
        let ctx = test_ctx(&registry, &cache, &config, &naming, &excl);

        let codec = DateTimeCodec;
        let desc = Descriptor::of::<OffsetDateTime>("OffsetDateTime", Kind::Primitive);
        let dt = OffsetDateTime::UNIX_EPOCH;
        let tree = codec.write(&dt, &desc, &ctx).unwrap();
        let back = codec.read(&tree, &desc, &ctx).unwrap();
        assert_eq!(back, dt);
    }

    #[test]
    fn test_datetime_read_falls_back_to_rfc2822_then_iso8601() {
        let registry = Registry::new();
        let cache = AdapterCache::new(vec![]);
        let config = Config::default();
        let naming = NamingStrategy::default();
        let excl = ExclusionRules::default();
        let ctx = test_ctx(&registry, &cache, &config, &naming, &excl);

        let codec = DateTimeCodec;
        let desc = Descriptor::of::<OffsetDateTime>("OffsetDateTime", Kind::Primitive);

        let rfc2822 = Tree::String("Thu, 01 Jan 1970 00:00:00 +0000".into());
        assert_eq!(codec.read(&rfc2822, &desc, &ctx).unwrap(), OffsetDateTime::UNIX_EPOCH);

        let iso = Tree::String("1970-01-01T00:00:00.000000000Z".into());
        assert_eq!(codec.read(&iso, &desc, &ctx).unwrap(), OffsetDateTime::UNIX_EPOCH);

        let garbage = Tree::String("not a date".into());
        assert!(matches!(codec.read(&garbage, &desc, &ctx), Err(Error::SyntaxError { .. })));
    }
}
