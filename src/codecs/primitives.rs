use crate::codec::{AnyCodec, Codec, CodecFactory, FnFactory, TypedCodecAdapter};
use crate::ctx::Ctx;
use crate::descriptor::{Descriptor, Kind};
use crate::error::Error;
use crate::location::Location;
use crate::number::Number;
use crate::tree::Tree;
use std::sync::Arc;

struct BoolCodec;
impl Codec<bool> for BoolCodec {
    fn kind(&self) -> crate::codec::CodecKind {
        crate::codec::CodecKind::Combined
    }
    fn write(&self, value: &bool, _desc: &Descriptor, _ctx: &Ctx<'_>) -> Result<Tree, Error> {
        Ok(Tree::Bool(*value))
    }
    fn read(&self, tree: &Tree, _desc: &Descriptor, _ctx: &Ctx<'_>) -> Result<bool, Error> {
        match tree {
            Tree::Bool(b) => Ok(*b),
            Tree::String(s) => s
                .parse()
                .map_err(|_| Error::syntax(&Location::Root, format!("invalid boolean {:?}", s))),
            other => Err(Error::syntax(
                &Location::Root,
                format!("expected boolean, found {}", other.kind_name()),
            )),
        }
    }
    fn create_empty(&self, _desc: &Descriptor, _ctx: &Ctx<'_>) -> Result<bool, Error> {
        Ok(false)
    }
}

struct U64Codec;
impl Codec<u64> for U64Codec {
    fn kind(&self) -> crate::codec::CodecKind {
        crate::codec::CodecKind::Combined
    }
    fn write(&self, value: &u64, _desc: &Descriptor, ctx: &Ctx<'_>) -> Result<Tree, Error> {
        match ctx.config.long_policy {
            crate::config::LongPolicy::Number => Ok(Tree::Number(Number::Unsigned(*value))),
            crate::config::LongPolicy::String => Ok(Tree::String(value.to_string())),
        }
    }
    fn read(&self, tree: &Tree, _desc: &Descriptor, _ctx: &Ctx<'_>) -> Result<u64, Error> {
        match tree {
            Tree::Number(Number::Unsigned(n)) => Ok(*n),
            Tree::Number(Number::Signed(n)) if *n >= 0 => Ok(*n as u64),
            Tree::Number(Number::Float(n)) if *n >= 0.0 => Ok(*n as u64),
            Tree::String(s) => s
                .parse()
                .map_err(|_| Error::syntax(&Location::Root, format!("invalid u64 {:?}", s))),
            other => Err(Error::syntax(
                &Location::Root,
                format!("expected unsigned integer, found {}", other.kind_name()),
            )),
        }
    }
    fn create_empty(&self, _desc: &Descriptor, _ctx: &Ctx<'_>) -> Result<u64, Error> {
        Ok(0)
    }
}

struct I64Codec;
impl Codec<i64> for I64Codec {
    fn kind(&self) -> crate::codec::CodecKind {
        crate::codec::CodecKind::Combined
    }
    fn write(&self, value: &i64, _desc: &Descriptor, ctx: &Ctx<'_>) -> Result<Tree, Error> {
        match ctx.config.long_policy {
            crate::config::LongPolicy::Number => Ok(Tree::Number(Number::Signed(*value))),
            crate::config::LongPolicy::String => Ok(Tree::String(value.to_string())),
        }
    }
    fn read(&self, tree: &Tree, _desc: &Descriptor, _ctx: &Ctx<'_>) -> Result<i64, Error> {
        match tree {
            Tree::Number(Number::Signed(n)) => Ok(*n),
            Tree::Number(Number::Unsigned(n)) => Ok(*n as i64),
            Tree::Number(Number::Float(n)) => Ok(*n as i64),
            Tree::String(s) => s
                .parse()
                .map_err(|_| Error::syntax(&Location::Root, format!("invalid i64 {:?}", s))),
            other => Err(Error::syntax(
                &Location::Root,
                format!("expected integer, found {}", other.kind_name()),
            )),
        }
    }
    fn create_empty(&self, _desc: &Descriptor, _ctx: &Ctx<'_>) -> Result<i64, Error> {
        Ok(0)
    }
}

struct F64Codec;
impl Codec<f64> for F64Codec {
    fn kind(&self) -> crate::codec::CodecKind {
        crate::codec::CodecKind::Combined
    }
    fn write(&self, value: &f64, _desc: &Descriptor, ctx: &Ctx<'_>) -> Result<Tree, Error> {
        if !value.is_finite() && !ctx.config.permit_special_floats {
            return Err(Error::InvalidNumber(*value));
        }
        Ok(Tree::Number(Number::Float(*value)))
    }
    fn read(&self, tree: &Tree, _desc: &Descriptor, _ctx: &Ctx<'_>) -> Result<f64, Error> {
        match tree {
            Tree::Number(n) => Ok((*n).into()),
            Tree::String(s) => s
                .parse()
                .map_err(|_| Error::syntax(&Location::Root, format!("invalid float {:?}", s))),
            other => Err(Error::syntax(
                &Location::Root,
                format!("expected number, found {}", other.kind_name()),
            )),
        }
    }
    fn create_empty(&self, _desc: &Descriptor, _ctx: &Ctx<'_>) -> Result<f64, Error> {
        Ok(0.0)
    }
}

struct StringCodec;
impl Codec<String> for StringCodec {
    fn kind(&self) -> crate::codec::CodecKind {
        crate::codec::CodecKind::Combined
    }
    fn write(&self, value: &String, _desc: &Descriptor, _ctx: &Ctx<'_>) -> Result<Tree, Error> {
        Ok(Tree::String(value.clone()))
    }
    fn read(&self, tree: &Tree, _desc: &Descriptor, _ctx: &Ctx<'_>) -> Result<String, Error> {
        match tree {
            Tree::String(s) => Ok(s.clone()),
            Tree::Number(n) => Ok(n.to_string()),
            Tree::Bool(b) => Ok(b.to_string()),
            other => Err(Error::syntax(
                &Location::Root,
                format!("expected string, found {}", other.kind_name()),
            )),
        }
    }
    fn create_empty(&self, _desc: &Descriptor, _ctx: &Ctx<'_>) -> Result<String, Error> {
        Ok(String::new())
    }
}

/// Builds the ordered list of built-in primitive factories (§4.8: "string,
/// bool, byte, short, int, long, float, double ..."), each an exact-tier
/// match on `TypeId`.
pub fn factory() -> Box<dyn CodecFactory> {
    let bool_desc = Descriptor::of::<bool>("bool", Kind::Primitive);
    let u64_desc = Descriptor::of::<u64>("u64", Kind::Primitive);
    let i64_desc = Descriptor::of::<i64>("i64", Kind::Primitive);
    let f64_desc = Descriptor::of::<f64>("f64", Kind::Primitive);
    let string_desc = Descriptor::of::<String>("String", Kind::Primitive);

    let bool_codec: Arc<dyn AnyCodec> = Arc::new(TypedCodecAdapter::<bool, _>::new(BoolCodec));
    let u64_codec: Arc<dyn AnyCodec> = Arc::new(TypedCodecAdapter::<u64, _>::new(U64Codec));
    let i64_codec: Arc<dyn AnyCodec> = Arc::new(TypedCodecAdapter::<i64, _>::new(I64Codec));
    let f64_codec: Arc<dyn AnyCodec> = Arc::new(TypedCodecAdapter::<f64, _>::new(F64Codec));
    let string_codec: Arc<dyn AnyCodec> = Arc::new(TypedCodecAdapter::<String, _>::new(StringCodec));

    Box::new(FnFactory(move |desc: &Descriptor| {
        if *desc == bool_desc {
            Some(bool_codec.clone())
        } else if *desc == u64_desc {
            Some(u64_codec.clone())
        } else if *desc == i64_desc {
            Some(i64_codec.clone())
        } else if *desc == f64_desc {
            Some(f64_codec.clone())
        } else if *desc == string_desc {
            Some(string_codec.clone())
        } else {
            None
        }
    }))
}
