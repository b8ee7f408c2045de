use crate::codec::CodecKind;
use crate::config::UnknownMemberPolicy;
use crate::ctx::Ctx;
use crate::descriptor::Descriptor;
use crate::error::Error;
use crate::exclusion::FieldMeta;
use crate::location::Location;
use crate::reflect::ReflectBuild;
use crate::tree::Tree;
use std::any::Any;
use std::collections::HashSet;

/// The Tree Deserializer (§4.5): builds a reflective value field-by-field
/// from a [`Tree`], the read-direction counterpart of [`crate::ser::TreeBuilder`].
/// A `Tree` can never be cyclic (it's a plain recursive enum with no shared
/// back-references), so there is no cycle stack here — only
/// `ser::TreeBuilder`'s write direction needs one, since host values can
/// alias or self-reference.
pub struct TreeReader<'a> {
    pub ctx: &'a Ctx<'a>,
}

impl<'a> TreeReader<'a> {
    pub fn new(ctx: &'a Ctx<'a>) -> TreeReader<'a> {
        TreeReader { ctx }
    }

    pub fn from_tree<T: ReflectBuild + 'static>(&self, tree: &Tree) -> Result<T, Error> {
        self.deserialize_struct::<T>(tree, &T::descriptor(), &Location::Root)
    }

    /// Builds `T` from an object tree: a fresh `T::new_empty()`, overwritten
    /// field-by-field with whatever the tree supplies, left at its default
    /// for every member absent from the tree (§4.5's "missing member ->
    /// leave the field at its constructor default" rule).
    fn deserialize_struct<T: ReflectBuild + 'static>(
        &self,
        tree: &Tree,
        desc: &Descriptor,
        loc: &Location<'_>,
    ) -> Result<T, Error> {
        if let Some(codec) = self.ctx.registry.lookup(desc) {
            if matches!(codec.kind(), CodecKind::Deserializer | CodecKind::Combined) {
                let boxed = codec.read(tree, desc, self.ctx)?;
                let boxed = boxed.downcast::<T>().map_err(|_| {
                    Error::syntax(loc, "registered codec produced the wrong type")
                })?;
                return Ok(*boxed);
            }
        }

        self.deserialize_unregistered(tree, desc, loc)
    }

    /// Builds `T` directly from an object tree without repeating the
    /// `Registry` lookup `deserialize_struct` already performed — the
    /// re-entry point for [`crate::engine::ReflectCodec::read`], which
    /// already *is* that lookup's result and must not repeat it (mirrors
    /// [`crate::ser::TreeBuilder::serialize_unregistered`] on the write
    /// side).
    pub(crate) fn deserialize_unregistered<T: ReflectBuild + 'static>(
        &self,
        tree: &Tree,
        desc: &Descriptor,
        loc: &Location<'_>,
    ) -> Result<T, Error> {
        let obj = tree
            .as_object()
            .ok_or_else(|| Error::syntax(loc, format!("expected object, found {}", tree.kind_name())))?;

        let mut instance = T::new_empty();
        if self.ctx.de_exclusion.skip_class(desc) {
            return Ok(instance);
        }

        #[allow(clippy::type_complexity)]
        let field_list: Vec<(&'static str, Descriptor, FieldMeta<'static>, &'static [&'static str])> = instance
            .fields()
            .iter()
            .map(|f| (f.name, f.declared_type.clone(), f.meta, f.alternates))
            .collect();

        let mut known_members: HashSet<String> = HashSet::with_capacity(field_list.len());
        for (name, declared_type, meta, alternates) in &field_list {
            let member_name = self.ctx.naming.translate(name);
            known_members.insert(member_name.clone());
            known_members.extend(alternates.iter().map(|a| a.to_string()));

            if self.ctx.de_exclusion.skip_field(meta) {
                continue;
            }

            // Primary translated name wins; alternates (§4.9) are tried in
            // declaration order only when it's absent.
            let found = obj.get(&member_name).or_else(|| {
                alternates.iter().find_map(|alt| obj.get(*alt))
            });

            if let Some(member_tree) = found {
                let field_loc = loc.push_prop(name);
                let value = self.read_any(member_tree, declared_type, &field_loc)?;
                instance.set_field(name, value)?;
            }
        }

        if self.ctx.config.unknown_field_policy == UnknownMemberPolicy::Throw {
            for key in obj.keys() {
                if !known_members.contains(key) {
                    return Err(Error::unknown_member(loc, key.clone()));
                }
            }
        }

        Ok(instance)
    }

    /// Resolves and invokes the codec for a leaf or nested-struct member:
    /// a registered custom codec takes precedence, falling back to the
    /// adapter cache's default resolution.
    fn read_any(&self, tree: &Tree, desc: &Descriptor, loc: &Location<'_>) -> Result<Box<dyn Any>, Error> {
        if let Some(codec) = self.ctx.registry.lookup(desc) {
            if matches!(codec.kind(), CodecKind::Deserializer | CodecKind::Combined) {
                return codec.read(tree, desc, self.ctx);
            }
        }
        let codec = self
            .ctx
            .cache
            .resolve(desc)
            .map_err(|e| match e {
                Error::UnsupportedType { type_name } => Error::syntax(
                    loc,
                    format!("no codec is registered for type {}", type_name),
                ),
                other => other,
            })?;
        codec.read(tree, desc, self.ctx)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cache::AdapterCache;
    use crate::codec::{AnyCodec, FnFactory};
    use crate::codecs;
    use crate::config::Config;
    use crate::descriptor::Kind;
    use crate::exclusion::ExclusionRules;
    use crate::naming::NamingStrategy;
    use crate::reflect::{FieldValue, FieldView, Reflect};
    use crate::registry::Registry;

    #[derive(Debug)]
    struct Pair {
        x: u64,
        y: Option<u64>,
    }

    impl Reflect for Pair {
        fn descriptor() -> Descriptor {
            Descriptor::of::<Pair>("Pair", Kind::Struct)
        }

        fn fields(&self) -> Vec<FieldView<'_>> {
            vec![
                FieldView::new(
                    "x",
                    Descriptor::of::<u64>("u64", Kind::Primitive),
                    FieldValue::Leaf(&self.x),
                ),
                FieldView::new(
                    "y",
                    Descriptor::of::<Option<u64>>("Option<u64>", Kind::Dynamic),
                    FieldValue::Leaf(&self.y),
                ),
            ]
        }
    }

    impl ReflectBuild for Pair {
        fn new_empty() -> Pair {
            Pair { x: 0, y: None }
        }

        fn set_field(&mut self, name: &str, value: Box<dyn Any>) -> Result<(), Error> {
            match name {
                "x" => self.x = *value.downcast::<u64>().map_err(|_| Error::from("bad field type"))?,
                "y" => self.y = *value.downcast::<Option<u64>>().map_err(|_| Error::from("bad field type"))?,
                other => return Err(Error::from(format!("unknown field {}", other))),
            }
            Ok(())
        }
    }

    fn build_cache() -> AdapterCache {
        let option_u64 = Descriptor::of::<Option<u64>>("Option<u64>", Kind::Dynamic);
        AdapterCache::new(vec![
            codecs::primitives::factory(),
            Box::new(FnFactory(move |d: &Descriptor| {
                if *d == option_u64 {
                    Some(std::sync::Arc::new(crate::codec::TypedCodecAdapter::<
                        Option<u64>,
                        _,
                    >::new(
                        codecs::containers::OptionCodec::<u64>::new(
                            Descriptor::of::<u64>("u64", Kind::Primitive),
                        ),
                    )) as std::sync::Arc<dyn AnyCodec>)
                } else {
                    None
                }
            })),
        ])
    }

    #[test]
    fn test_missing_member_keeps_default() {
        let registry = Registry::new();
        let cache = build_cache();
        let config = Config::default();
        let naming = NamingStrategy::default();
        let excl = ExclusionRules::default();
        let ctx = Ctx {
            registry: &registry,
            cache: &cache,
            config: &config,
            naming: &naming,
            ser_exclusion: &excl,
            de_exclusion: &excl,
        };
        let reader = TreeReader::new(&ctx);

        let mut obj = crate::tree::Object::new();
        obj.insert("x".into(), Tree::from(9u64));
        let pair: Pair = reader.from_tree(&Tree::Object(obj)).unwrap();
        assert_eq!(pair.x, 9);
        assert_eq!(pair.y, None);
    }

    #[test]
    fn test_unknown_member_throws_when_configured() {
        let registry = Registry::new();
        let cache = build_cache();
        let mut config = Config::default();
        config.unknown_field_policy = UnknownMemberPolicy::Throw;
        let naming = NamingStrategy::default();
        let excl = ExclusionRules::default();
        let ctx = Ctx {
            registry: &registry,
            cache: &cache,
            config: &config,
            naming: &naming,
            ser_exclusion: &excl,
            de_exclusion: &excl,
        };
        let reader = TreeReader::new(&ctx);

        let mut obj = crate::tree::Object::new();
        obj.insert("x".into(), Tree::from(9u64));
        obj.insert("bogus".into(), Tree::Bool(true));
        let err = reader.from_tree::<Pair>(&Tree::Object(obj)).unwrap_err();
        assert!(matches!(err, Error::UnknownMember { .. }));
    }
}
