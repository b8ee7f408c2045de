use crate::codec::{AnyCodec, Codec, CodecFactory, CodecKind};
use crate::ctx::Ctx;
use crate::descriptor::{Descriptor, DescriptorParams, Kind};
use crate::error::Error;
use crate::location::Location;
use crate::tree::{self, Object, Tree};
use indexmap::IndexMap;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// Codec for `Option<T>`: `None` writes as `Tree::Null`; `Some(v)` delegates
/// to the element codec. Reading `Tree::Null` yields `None` unconditionally
/// (§4.5's "null for a field -> assign null for reference types").
pub struct OptionCodec<T> {
    pub element: Descriptor,
    _marker: std::marker::PhantomData<T>,
}

impl<T> OptionCodec<T> {
    pub fn new(element: Descriptor) -> OptionCodec<T> {
        OptionCodec {
            element,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<T: 'static + Send + Sync> Codec<Option<T>> for OptionCodec<T> {
    fn kind(&self) -> CodecKind {
        CodecKind::Combined
    }

    fn write(&self, value: &Option<T>, _desc: &Descriptor, ctx: &Ctx<'_>) -> Result<Tree, Error> {
        match value {
            None => Ok(Tree::Null),
            Some(v) => {
                let codec = ctx.cache.resolve(&self.element)?;
                codec.write(v as &dyn Any, &self.element, ctx)
            }
        }
    }

    fn read(&self, tree: &Tree, _desc: &Descriptor, ctx: &Ctx<'_>) -> Result<Option<T>, Error> {
        match tree {
            Tree::Null => Ok(None),
            other => {
                let codec = ctx.cache.resolve(&self.element)?;
                let boxed = codec.read(other, &self.element, ctx)?;
                let value = *boxed
                    .downcast::<T>()
                    .map_err(|_| Error::syntax(&Location::Root, "element codec returned the wrong type"))?;
                Ok(Some(value))
            }
        }
    }

    fn create_empty(&self, _desc: &Descriptor, _ctx: &Ctx<'_>) -> Result<Option<T>, Error> {
        Ok(None)
    }
}

/// Codec for `Vec<T>`. If the declared element type in `desc` is `Dynamic`,
/// the codec's own configured `element` descriptor is used as a fallback —
/// in practice the descriptor passed down by a struct field always carries
/// the concrete element type, per §3's "defaults its argument slots to
/// Dynamic" rule only applying to genuinely unparameterized containers.
/// Nulls become `Tree::Null` elements (§4.4's sequence codec rule).
pub struct SequenceCodec<T> {
    pub element: Descriptor,
    _marker: std::marker::PhantomData<T>,
}

impl<T> SequenceCodec<T> {
    pub fn new(element: Descriptor) -> SequenceCodec<T> {
        SequenceCodec {
            element,
            _marker: std::marker::PhantomData,
        }
    }

    fn element_desc<'d>(&'d self, desc: &'d Descriptor) -> &'d Descriptor {
        match desc.element() {
            Some(e) if e.kind != Kind::Dynamic => e,
            _ => &self.element,
        }
    }
}

impl<T: 'static + Send + Sync> Codec<Vec<T>> for SequenceCodec<T> {
    fn kind(&self) -> CodecKind {
        CodecKind::Combined
    }

    fn write(&self, value: &Vec<T>, desc: &Descriptor, ctx: &Ctx<'_>) -> Result<Tree, Error> {
        let elem_desc = self.element_desc(desc).clone();
        let codec = ctx.cache.resolve(&elem_desc)?;
        let items = value
            .iter()
            .map(|v| codec.write(v as &dyn Any, &elem_desc, ctx))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Tree::Array(items))
    }

    fn read(&self, tree: &Tree, desc: &Descriptor, ctx: &Ctx<'_>) -> Result<Vec<T>, Error> {
        let elem_desc = self.element_desc(desc).clone();
        let items = tree
            .as_array()
            .ok_or_else(|| Error::syntax(&Location::Root, format!("expected array, found {}", tree.kind_name())))?;
        let codec = ctx.cache.resolve(&elem_desc)?;
        items
            .iter()
            .map(|t| {
                let boxed = codec.read(t, &elem_desc, ctx)?;
                boxed
                    .downcast::<T>()
                    .map(|b| *b)
                    .map_err(|_| Error::syntax(&Location::Root, "element codec returned the wrong type"))
            })
            .collect()
    }

    fn create_empty(&self, _desc: &Descriptor, _ctx: &Ctx<'_>) -> Result<Vec<T>, Error> {
        Ok(Vec::new())
    }
}

/// Codec for `HashMap<String, V>`. String-keyed maps always emit as a JSON
/// object (§4.4's "string keys" policy); see [`ComplexKeyMapCodec`] for the
/// array-of-pairs policy used when keys are not strings.
pub struct StringKeyMapCodec<V> {
    pub value: Descriptor,
    _marker: std::marker::PhantomData<V>,
}

impl<V> StringKeyMapCodec<V> {
    pub fn new(value: Descriptor) -> StringKeyMapCodec<V> {
        StringKeyMapCodec {
            value,
            _marker: std::marker::PhantomData,
        }
    }

    fn value_desc<'d>(&'d self, desc: &'d Descriptor) -> &'d Descriptor {
        match desc.key_value() {
            Some((_, v)) if v.kind != Kind::Dynamic => v,
            _ => &self.value,
        }
    }
}

impl<V: 'static + Send + Sync> Codec<HashMap<String, V>> for StringKeyMapCodec<V> {
    fn kind(&self) -> CodecKind {
        CodecKind::Combined
    }

    fn write(&self, value: &HashMap<String, V>, desc: &Descriptor, ctx: &Ctx<'_>) -> Result<Tree, Error> {
        let value_desc = self.value_desc(desc).clone();
        let codec = ctx.cache.resolve(&value_desc)?;
        let mut obj = Object::new();
        for (k, v) in value {
            let tree = codec.write(v as &dyn Any, &value_desc, ctx)?;
            if tree.is_null() && !ctx.config.serialize_nulls {
                continue;
            }
            obj.insert(k.clone(), tree);
        }
        Ok(Tree::Object(obj))
    }

    fn read(&self, tree: &Tree, desc: &Descriptor, ctx: &Ctx<'_>) -> Result<HashMap<String, V>, Error> {
        let value_desc = self.value_desc(desc).clone();
        let obj = tree
            .as_object()
            .ok_or_else(|| Error::syntax(&Location::Root, format!("expected object, found {}", tree.kind_name())))?;
        let codec = ctx.cache.resolve(&value_desc)?;
        let mut out = HashMap::with_capacity(obj.len());
        for (k, v) in obj.iter() {
            let boxed = codec.read(v, &value_desc, ctx)?;
            let value = *boxed
                .downcast::<V>()
                .map_err(|_| Error::syntax(&Location::Root, "value codec returned the wrong type"))?;
            out.insert(k.clone(), value);
        }
        Ok(out)
    }

    fn create_empty(&self, _desc: &Descriptor, _ctx: &Ctx<'_>) -> Result<HashMap<String, V>, Error> {
        Ok(HashMap::new())
    }
}

/// Codec for `IndexMap<K, V>` with non-string, "complex" keys (§4.4): each
/// entry becomes a 2-element array `[key_tree, value_tree]`; the whole map
/// is emitted as a JSON array if *any* key's tree is non-scalar, otherwise
/// as an object with stringified keys. Requires `ctx.config.complex_map_keys`.
pub struct ComplexKeyMapCodec<K, V> {
    pub key: Descriptor,
    pub value: Descriptor,
    _marker: std::marker::PhantomData<(K, V)>,
}

impl<K, V> ComplexKeyMapCodec<K, V> {
    pub fn new(key: Descriptor, value: Descriptor) -> ComplexKeyMapCodec<K, V> {
        ComplexKeyMapCodec {
            key,
            value,
            _marker: std::marker::PhantomData,
        }
    }
}

fn is_scalar(tree: &Tree) -> bool {
    !matches!(tree, Tree::Array(_) | Tree::Object(_))
}

impl<K: 'static + Send + Sync + std::hash::Hash + Eq, V: 'static + Send + Sync> Codec<IndexMap<K, V>> for ComplexKeyMapCodec<K, V> {
    fn kind(&self) -> CodecKind {
        CodecKind::Combined
    }

    fn write(&self, value: &IndexMap<K, V>, _desc: &Descriptor, ctx: &Ctx<'_>) -> Result<Tree, Error> {
        if !ctx.config.complex_map_keys {
            return Err(Error::ConfigurationError(
                "complex map keys require complex_map_keys = true".into(),
            ));
        }
        let key_codec = ctx.cache.resolve(&self.key)?;
        let value_codec = ctx.cache.resolve(&self.value)?;

        let mut pairs = Vec::with_capacity(value.len());
        for (k, v) in value {
            let key_tree = key_codec.write(k as &dyn Any, &self.key, ctx)?;
            let value_tree = value_codec.write(v as &dyn Any, &self.value, ctx)?;
            pairs.push((key_tree, value_tree));
        }

        if pairs.iter().any(|(k, _)| !is_scalar(k)) {
            Ok(Tree::Array(
                pairs
                    .into_iter()
                    .map(|(k, v)| Tree::Array(vec![k, v]))
                    .collect(),
            ))
        } else {
            let mut obj = Object::new();
            for (k, v) in pairs {
                obj.insert(k.to_string(), v);
            }
            Ok(Tree::Object(obj))
        }
    }

    fn read(&self, tree: &Tree, _desc: &Descriptor, ctx: &Ctx<'_>) -> Result<IndexMap<K, V>, Error> {
        let key_codec = ctx.cache.resolve(&self.key)?;
        let value_codec = ctx.cache.resolve(&self.value)?;
        let mut out = IndexMap::new();

        match tree {
            Tree::Array(items) => {
                for item in items {
                    let pair = item.as_array().ok_or_else(|| {
                        Error::syntax(&Location::Root, "expected a [key, value] pair")
                    })?;
                    let (k, v) = match pair {
                        [k, v] => (k, v),
                        _ => {
                            return Err(Error::syntax(&Location::Root, "expected a 2-element pair"))
                        }
                    };
                    let key = *key_codec
                        .read(k, &self.key, ctx)?
                        .downcast::<K>()
                        .map_err(|_| Error::syntax(&Location::Root, "key codec returned the wrong type"))?;
                    let value = *value_codec
                        .read(v, &self.value, ctx)?
                        .downcast::<V>()
                        .map_err(|_| Error::syntax(&Location::Root, "value codec returned the wrong type"))?;
                    out.insert(key, value);
                }
            }
            Tree::Object(obj) => {
                for (k, v) in obj.iter() {
                    let key = *key_codec
                        .read(&Tree::String(k.clone()), &self.key, ctx)?
                        .downcast::<K>()
                        .map_err(|_| Error::syntax(&Location::Root, "key codec returned the wrong type"))?;
                    let value = *value_codec
                        .read(v, &self.value, ctx)?
                        .downcast::<V>()
                        .map_err(|_| Error::syntax(&Location::Root, "value codec returned the wrong type"))?;
                    out.insert(key, value);
                }
            }
            other => {
                return Err(Error::syntax(
                    &Location::Root,
                    format!("expected array or object, found {}", other.kind_name()),
                ))
            }
        }
        Ok(out)
    }

    fn create_empty(&self, _desc: &Descriptor, _ctx: &Ctx<'_>) -> Result<IndexMap<K, V>, Error> {
        Ok(IndexMap::new())
    }
}

/// A pass-through codec for `Tree` itself: fields declared as `Tree`
/// round-trip untouched, the Rust analogue of the distilled spec's
/// any-object factory (§4.8's "tree-element factory").
pub struct TreeCodec;
impl Codec<Tree> for TreeCodec {
    fn kind(&self) -> CodecKind {
        CodecKind::Combined
    }
    fn write(&self, value: &Tree, _desc: &Descriptor, _ctx: &Ctx<'_>) -> Result<Tree, Error> {
        Ok(value.clone())
    }
    fn read(&self, tree: &Tree, _desc: &Descriptor, _ctx: &Ctx<'_>) -> Result<Tree, Error> {
        Ok(tree.clone())
    }
    fn create_empty(&self, _desc: &Descriptor, _ctx: &Ctx<'_>) -> Result<Tree, Error> {
        Ok(Tree::Null)
    }
}

/// The tree-element factory: recognizes the `Tree` descriptor itself and
/// returns the pass-through codec, tried first per §4.8's standard order.
pub fn tree_factory() -> Box<dyn CodecFactory> {
    use crate::codec::{FnFactory, TypedCodecAdapter};
    let tree_codec: Arc<dyn AnyCodec> = Arc::new(TypedCodecAdapter::<Tree, _>::new(TreeCodec));
    Box::new(FnFactory(move |desc: &Descriptor| {
        if desc.kind == Kind::Any || desc.raw == std::any::TypeId::of::<Tree>() {
            Some(tree_codec.clone())
        } else {
            None
        }
    }))
}

/// The built-in container factory (§4.8): a finite list of concrete
/// `Vec<T>`/`Option<T>`/`HashMap<String, V>` instantiations over the
/// primitive element types, matched by exact `TypeId` the same way
/// `codecs::leaf::factory` matches its reference types. Rust has no way to
/// construct a `SequenceCodec<T>` for a `T` only known at runtime, so unlike
/// a reflection-based binder's single generic array adapter, this list is
/// necessarily finite; an element type outside it (a custom leaf type inside
/// a `Vec`, for instance) needs an explicit `EngineBuilder::register_factory`
/// call, same as any other codec gap.
pub fn factory() -> Box<dyn CodecFactory> {
    use crate::codec::{FnFactory, TypedCodecAdapter};

    macro_rules! seq_entry {
        ($ty:ty, $name:literal, $elem_kind:expr) => {{
            let elem = Descriptor::of::<$ty>($name, $elem_kind);
            let desc = Descriptor::sequence::<Vec<$ty>>(concat!("Vec<", $name, ">"), elem.clone());
            let codec: Arc<dyn AnyCodec> = Arc::new(TypedCodecAdapter::<Vec<$ty>, _>::new(
                SequenceCodec::<$ty>::new(elem),
            ));
            (desc, codec)
        }};
    }
    macro_rules! opt_entry {
        ($ty:ty, $name:literal, $elem_kind:expr) => {{
            let elem = Descriptor::of::<$ty>($name, $elem_kind);
            let desc = Descriptor::of::<Option<$ty>>(concat!("Option<", $name, ">"), Kind::Dynamic);
            let codec: Arc<dyn AnyCodec> = Arc::new(TypedCodecAdapter::<Option<$ty>, _>::new(
                OptionCodec::<$ty>::new(elem),
            ));
            (desc, codec)
        }};
    }
    macro_rules! map_entry {
        ($ty:ty, $name:literal, $val_kind:expr) => {{
            let key = Descriptor::of::<String>("String", Kind::Primitive);
            let value = Descriptor::of::<$ty>($name, $val_kind);
            let desc = Descriptor::map::<HashMap<String, $ty>>(
                concat!("HashMap<String, ", $name, ">"),
                key,
                value.clone(),
            );
            let codec: Arc<dyn AnyCodec> = Arc::new(TypedCodecAdapter::<HashMap<String, $ty>, _>::new(
                StringKeyMapCodec::<$ty>::new(value),
            ));
            (desc, codec)
        }};
    }

    let entries: Vec<(Descriptor, Arc<dyn AnyCodec>)> = vec![
        seq_entry!(bool, "bool", Kind::Primitive),
        seq_entry!(u64, "u64", Kind::Primitive),
        seq_entry!(i64, "i64", Kind::Primitive),
        seq_entry!(f64, "f64", Kind::Primitive),
        seq_entry!(String, "String", Kind::Primitive),
        opt_entry!(bool, "bool", Kind::Primitive),
        opt_entry!(u64, "u64", Kind::Primitive),
        opt_entry!(i64, "i64", Kind::Primitive),
        opt_entry!(f64, "f64", Kind::Primitive),
        opt_entry!(String, "String", Kind::Primitive),
        map_entry!(bool, "bool", Kind::Primitive),
        map_entry!(u64, "u64", Kind::Primitive),
        map_entry!(i64, "i64", Kind::Primitive),
        map_entry!(f64, "f64", Kind::Primitive),
        map_entry!(String, "String", Kind::Primitive),
    ];

    Box::new(FnFactory(move |desc: &Descriptor| {
        entries
            .iter()
            .find(|(d, _)| d == desc)
            .map(|(_, codec)| codec.clone())
    }))
}

#[allow(dead_code)]
fn params_kind_check(p: &DescriptorParams) -> bool {
    matches!(p, DescriptorParams::None)
}

#[allow(dead_code)]
fn compare_trees(a: &Tree, b: &Tree) -> std::cmp::Ordering {
    tree::compare(a, b)
}
