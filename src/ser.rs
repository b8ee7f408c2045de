use crate::codec::CodecKind;
use crate::ctx::Ctx;
use crate::descriptor::{Descriptor, Kind};
use crate::error::Error;
use crate::location::Location;
use crate::reflect::{FieldValue, ReflectDyn};
use crate::tree::{Object, Tree};
use std::any::Any;
use std::cell::RefCell;

thread_local! {
    /// Identities of struct values currently being walked on this thread,
    /// innermost-last. A plain function-parameter `Vec` can't be shared
    /// across a `ReflectCodec::write` call boundary (`Codec::write`'s
    /// signature carries no cycle-stack slot, and every registered struct
    /// type is resolved through exactly that boundary — see
    /// `serialize`/`serialize_unregistered` below), so the stack lives here
    /// instead, following the same thread-local-scratch idiom
    /// `cache.rs`'s `RESOLVING`/`DEPTH` use for the same reason.
    static CYCLE_STACK: RefCell<Vec<usize>> = RefCell::new(Vec::new());
}

/// Recursively turns a reflective value into a [`Tree`] (§4.4/§4.6's Tree
/// Serializer). Driven by its own `Ctx`-threaded recursion rather than
/// [`crate::walker::walk`]: the walker's `Visitor` trait hands a value to
/// the caller one node at a time and expects a `bool`/`()` back, which has
/// no way to carry "here is the `Tree` my child produced" up to the parent
/// frame that's assembling an object's members. Building that channel would
/// mean either interior mutability around every visitor callback or an
/// accumulator parameter threaded through the trait — both more machinery
/// than a plain recursive function doing the same nine steps inline.
/// `walker::walk` remains the independently specified and tested version of
/// the same contract; this module reimplements its shape for the concrete
/// case of producing a `Tree`.
pub struct TreeBuilder<'a> {
    pub ctx: &'a Ctx<'a>,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(ctx: &'a Ctx<'a>) -> TreeBuilder<'a> {
        TreeBuilder { ctx }
    }

    /// Serializes a reflective root value.
    pub fn to_tree(&self, value: &dyn ReflectDyn, desc: &Descriptor) -> Result<Tree, Error> {
        self.serialize(value, desc, &Location::Root)
    }

    /// Step 1: custom codec gets first refusal, exactly as in
    /// `walker::walk`. A registered `Reflect` type's own codec is found
    /// here too (`EngineBuilder::register_reflect` puts a `ReflectCodec<T>`
    /// in the exact tier) — `codec.write` re-enters this module through
    /// [`serialize_unregistered`], not `serialize`, so that re-entry does
    /// not immediately repeat this same lookup and recurse forever.
    pub fn serialize(&self, value: &dyn ReflectDyn, desc: &Descriptor, loc: &Location<'_>) -> Result<Tree, Error> {
        if let Some(codec) = self.ctx.registry.lookup(desc) {
            if matches!(codec.kind(), CodecKind::Serializer | CodecKind::Combined) {
                return codec.write(value.as_any_dyn(), desc, self.ctx);
            }
        }
        self.serialize_unregistered(value, desc, loc)
    }

    /// Step 3: class-level exclusion. Steps 4/5: cycle push/check/pop via
    /// the thread-local [`CYCLE_STACK`], scoped to `Kind::Struct` since only
    /// reflective struct recursion can cycle back to an ancestor — a
    /// primitive, sequence, or map descriptor is handled entirely by its
    /// resolved codec, which operates through `&dyn Any` and never calls
    /// back into this module. Also the re-entry point for
    /// [`crate::engine::ReflectCodec::write`], which already *is* the
    /// lookup's result and must not repeat it.
    pub(crate) fn serialize_unregistered(
        &self,
        value: &dyn ReflectDyn,
        desc: &Descriptor,
        loc: &Location<'_>,
    ) -> Result<Tree, Error> {
        if self.ctx.ser_exclusion.skip_class(desc) {
            return Ok(Tree::Null);
        }

        if desc.kind != Kind::Struct {
            return self.write_any(value.as_any_dyn(), desc);
        }

        let identity = value.identity_dyn();
        if let Some(id) = identity {
            let cyclic = CYCLE_STACK.with(|stack| stack.borrow().contains(&id));
            if cyclic {
                return Err(Error::cyclic_reference(loc));
            }
            CYCLE_STACK.with(|stack| stack.borrow_mut().push(id));
        }

        let result = self.serialize_struct(value, desc, loc);

        if identity.is_some() {
            CYCLE_STACK.with(|stack| {
                stack.borrow_mut().pop();
            });
        }
        result
    }

    /// Resolves and invokes the codec for a type-erased leaf value — used
    /// for primitive/sequence/map/any/dynamic descriptors, and for any
    /// `FieldValue::Leaf` field regardless of its declared kind.
    fn write_any(&self, value: &dyn Any, desc: &Descriptor) -> Result<Tree, Error> {
        let codec = self.ctx.cache.resolve(desc)?;
        codec.write(value, desc, self.ctx)
    }

    fn serialize_struct(&self, value: &dyn ReflectDyn, _desc: &Descriptor, loc: &Location<'_>) -> Result<Tree, Error> {
        let mut obj = Object::new();

        for field in value.fields_dyn() {
            if self.ctx.ser_exclusion.skip_field(&field.meta) {
                continue;
            }

            let field_loc = loc.push_prop(field.name);
            let tree = match &field.value {
                FieldValue::Reflect(child) => self.serialize(*child, &field.declared_type, &field_loc)?,
                FieldValue::Leaf(any) => self.write_any(*any, &field.declared_type)?,
                FieldValue::Tree(t) => (*t).clone(),
                FieldValue::Null => Tree::Null,
            };

            if tree.is_null() && !self.ctx.config.serialize_nulls {
                continue;
            }

            let member_name = self.ctx.naming.translate(field.name);
            obj.insert(member_name, tree);
        }

        Ok(Tree::Object(obj))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cache::AdapterCache;
    use crate::codec::{AnyCodec, FnFactory};
    use crate::codecs;
    use crate::config::Config;
    use crate::descriptor::Descriptor;
    use crate::exclusion::ExclusionRules;
    use crate::naming::NamingStrategy;
    use crate::reflect::{FieldView, Reflect};
    use crate::registry::Registry;

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
    fn test_serialize_struct_omits_null_by_default() {
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
        let builder = TreeBuilder::new(&ctx);

        let pair = Pair { x: 5, y: None };
        let tree = builder.to_tree(&pair, &Pair::descriptor()).unwrap();
        let obj = tree.as_object().unwrap();
        assert_eq!(obj.len(), 1);
        assert!(obj.get("x").is_some());
        assert!(obj.get("y").is_none());
    }

    #[test]
    fn test_serialize_struct_keeps_null_when_configured() {
        let registry = Registry::new();
        let cache = build_cache();
        let mut config = Config::default();
        config.serialize_nulls = true;
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
        let builder = TreeBuilder::new(&ctx);

        let pair = Pair { x: 5, y: None };
        let tree = builder.to_tree(&pair, &Pair::descriptor()).unwrap();
        let obj = tree.as_object().unwrap();
        assert_eq!(obj.get("y"), Some(&Tree::Null));
    }

    /// Regression test for a codec registered under its own descriptor (as
    /// `EngineBuilder::register_reflect` always does): `serialize` must find
    /// that codec, hand off to `serialize_unregistered`, and still detect a
    /// self-cycle via the thread-local stack rather than looping forever.
    #[test]
    fn test_registered_self_referential_type_is_rejected_not_looped() {
        struct SelfLoop;
        impl Reflect for SelfLoop {
            fn descriptor() -> Descriptor {
                Descriptor::of::<SelfLoop>("SelfLoop", Kind::Struct)
            }
            fn fields(&self) -> Vec<FieldView<'_>> {
                vec![FieldView::new(
                    "next",
                    SelfLoop::descriptor(),
                    FieldValue::Reflect(self),
                )]
            }
            fn identity(&self) -> Option<usize> {
                Some(self as *const Self as usize)
            }
        }

        struct LoopCodec;
        impl crate::codec::Codec<SelfLoop> for LoopCodec {
            fn kind(&self) -> CodecKind {
                CodecKind::Combined
            }
            fn write(&self, value: &SelfLoop, desc: &Descriptor, ctx: &Ctx<'_>) -> Result<Tree, Error> {
                TreeBuilder::new(ctx).serialize_unregistered(value as &dyn ReflectDyn, desc, &Location::Root)
            }
            fn read(&self, _tree: &Tree, _desc: &Descriptor, _ctx: &Ctx<'_>) -> Result<SelfLoop, Error> {
                Ok(SelfLoop)
            }
            fn create_empty(&self, _desc: &Descriptor, _ctx: &Ctx<'_>) -> Result<SelfLoop, Error> {
                Ok(SelfLoop)
            }
        }

        let mut registry = Registry::new();
        let codec: std::sync::Arc<dyn AnyCodec> =
            std::sync::Arc::new(crate::codec::TypedCodecAdapter::<SelfLoop, _>::new(LoopCodec));
        registry.register_exact(SelfLoop::descriptor(), codec).unwrap();
        registry.freeze();

        let cache = AdapterCache::new(vec![]);
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
        let builder = TreeBuilder::new(&ctx);

        let err = builder.to_tree(&SelfLoop, &SelfLoop::descriptor()).unwrap_err();
        assert!(matches!(err, Error::CyclicReference { .. }));
    }
}
