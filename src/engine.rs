use crate::cache::AdapterCache;
use crate::codec::{AnyCodec, Codec, CodecFactory, CodecKind, TypedCodecAdapter};
use crate::codecs;
use crate::config::Config;
use crate::ctx::Ctx;
use crate::de::TreeReader;
use crate::descriptor::Descriptor;
use crate::error::Error;
use crate::exclusion::ExclusionRules;
use crate::location::Location;
use crate::naming::NamingStrategy;
use crate::reflect::{Reflect, ReflectBuild, ReflectDyn};
use crate::registry::Registry;
use crate::ser::TreeBuilder;
use crate::tree::Tree;
use std::sync::Arc;

/// Bridges a host `Reflect`/`ReflectBuild` type into the codec system:
/// `write` drives `ser::TreeBuilder`, `read` drives `de::TreeReader`. Every
/// type registered via `EngineBuilder::register_reflect` is resolved
/// through exactly this codec, including recursively from within its own
/// fields — `write` re-enters `TreeBuilder` at `serialize_unregistered`
/// rather than `serialize` so that re-entry doesn't repeat the `Registry`
/// lookup that found this codec in the first place and loop forever; cycle
/// tracking itself lives in `ser.rs`'s thread-local stack, which is exactly
/// what lets it survive being re-entered through this codec boundary.
struct ReflectCodec<T>(std::marker::PhantomData<fn() -> T>);

impl<T: Reflect + ReflectBuild + 'static> Codec<T> for ReflectCodec<T> {
    fn kind(&self) -> CodecKind {
        CodecKind::Combined
    }

    fn write(&self, value: &T, desc: &Descriptor, ctx: &Ctx<'_>) -> Result<Tree, Error> {
        // Calls `serialize_unregistered`, not `serialize`: this codec IS what a
        // `Registry` lookup for `desc` already resolved to, so going through
        // `serialize` again would immediately find it and recurse forever.
        TreeBuilder::new(ctx).serialize_unregistered(value as &dyn ReflectDyn, desc, &Location::Root)
    }

    fn read(&self, tree: &Tree, desc: &Descriptor, ctx: &Ctx<'_>) -> Result<T, Error> {
        TreeReader::new(ctx).deserialize_unregistered(tree, desc, &Location::Root)
    }

    fn create_empty(&self, _desc: &Descriptor, _ctx: &Ctx<'_>) -> Result<T, Error> {
        Ok(T::new_empty())
    }
}

/// The assembled binding engine (§1/§5): owns the `Registry`, the
/// `AdapterCache`, and the `Config`, and exposes the public round-trip API.
/// Constructed once via [`Engine::builder`], then shared (typically behind
/// an `Arc`, as the teacher's own `SchemaIndexBuilder` pattern does for its
/// equivalent frozen, process-wide index) across every call site.
pub struct Engine {
    registry: Registry,
    cache: AdapterCache,
    config: Config,
    naming: NamingStrategy,
    ser_exclusion: ExclusionRules,
    de_exclusion: ExclusionRules,
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    fn ctx(&self) -> Ctx<'_> {
        Ctx {
            registry: &self.registry,
            cache: &self.cache,
            config: &self.config,
            naming: &self.naming,
            ser_exclusion: &self.ser_exclusion,
            de_exclusion: &self.de_exclusion,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resolves the codec registered or derivable for `desc`, exposed so
    /// callers can probe "is this type supported" without performing a
    /// round-trip (mirrors the distilled spec's `get_codec`).
    pub fn get_codec(&self, desc: &Descriptor) -> Result<Arc<dyn AnyCodec>, Error> {
        if let Some(codec) = self.registry.lookup(desc) {
            return Ok(codec);
        }
        self.cache.resolve(desc)
    }

    pub fn to_tree<T: Reflect + 'static>(&self, value: &T) -> Result<Tree, Error> {
        TreeBuilder::new(&self.ctx()).to_tree(value as &dyn ReflectDyn, &T::descriptor())
    }

    pub fn from_tree<T: ReflectBuild + 'static>(&self, tree: &Tree) -> Result<T, Error> {
        TreeReader::new(&self.ctx()).from_tree(tree)
    }

    pub fn to_json<T: Reflect + 'static>(&self, value: &T) -> Result<String, Error> {
        let tree = self.to_tree(value)?;
        crate::bridge::to_string(&tree, &self.config)
    }

    pub fn to_json_into<T: Reflect + 'static, W: std::io::Write>(
        &self,
        value: &T,
        writer: &mut W,
    ) -> Result<(), Error> {
        let tree = self.to_tree(value)?;
        crate::bridge::to_writer(&tree, &self.config, writer)
    }

    pub fn from_json<T: ReflectBuild + 'static>(&self, text: &str) -> Result<T, Error> {
        let tree = crate::bridge::from_str(text, &self.config)?;
        self.from_tree(&tree)
    }

    pub fn from_reader<T: ReflectBuild + 'static, R: std::io::Read>(&self, reader: R) -> Result<T, Error> {
        let tree = crate::bridge::from_reader(reader, &self.config)?;
        self.from_tree(&tree)
    }
}

/// Builds an [`Engine`]: register custom codecs and `Reflect` types, then
/// [`EngineBuilder::build`] freezes the registry and wires the default
/// built-in factory list (§4.8) behind whatever custom registrations were
/// made, preserving user-override-first precedence.
pub struct EngineBuilder {
    registry: Registry,
    config: Config,
    naming: NamingStrategy,
    ser_exclusion: ExclusionRules,
    de_exclusion: ExclusionRules,
    extra_factories: Vec<Box<dyn CodecFactory>>,
}

impl EngineBuilder {
    pub fn new() -> EngineBuilder {
        EngineBuilder {
            registry: Registry::new(),
            config: Config::default(),
            naming: NamingStrategy::default(),
            ser_exclusion: ExclusionRules::default(),
            de_exclusion: ExclusionRules::default(),
            extra_factories: Vec::new(),
        }
    }

    pub fn config(mut self, config: Config) -> EngineBuilder {
        self.naming = config.naming.into();
        self.ser_exclusion = ExclusionRules {
            modifier_mask: self.ser_exclusion.modifier_mask,
            version: config.version,
            explicit_expose_only: config.explicit_expose_only,
            disable_inner_classes: config.disable_inner_classes,
        };
        self.de_exclusion = self.ser_exclusion.clone();
        self.config = config;
        self
    }

    pub fn naming(mut self, naming: NamingStrategy) -> EngineBuilder {
        self.naming = naming;
        self
    }

    /// Registers a host type's combined serializer/deserializer, derived
    /// automatically from its `Reflect`/`ReflectBuild` impls (§4.1's
    /// "register a type adapter").
    pub fn register_reflect<T: Reflect + ReflectBuild + 'static>(mut self) -> Result<EngineBuilder, Error> {
        let codec: Arc<dyn AnyCodec> = Arc::new(TypedCodecAdapter::<T, _>::new(ReflectCodec::<T>(
            std::marker::PhantomData,
        )));
        self.registry.register_exact(T::descriptor(), codec)?;
        Ok(self)
    }

    /// Registers a fully custom exact-tier codec for `desc`, taking
    /// precedence over any built-in or derived codec for the same type.
    pub fn register_codec(mut self, desc: Descriptor, codec: Arc<dyn AnyCodec>) -> Result<EngineBuilder, Error> {
        self.registry.register_exact(desc, codec)?;
        Ok(self)
    }

    /// Registers a hierarchy-tier codec behind an "is-a" matcher (§4.1).
    pub fn register_hierarchy_codec(
        mut self,
        matches: fn(&Descriptor) -> bool,
        codec: Arc<dyn AnyCodec>,
    ) -> Result<EngineBuilder, Error> {
        self.registry.register_hierarchy(matches, codec)?;
        Ok(self)
    }

    /// Registers a custom element/key-value container factory (e.g. a
    /// `Vec<T>`/`HashMap<K, V>` for an element type not among the built-in
    /// registrations in `codecs::containers`).
    pub fn register_factory(mut self, factory: Box<dyn CodecFactory>) -> EngineBuilder {
        self.extra_factories.push(factory);
        self
    }

    pub fn build(self) -> Result<Engine, Error> {
        self.config.validate()?;
        self.registry.freeze();

        let mut factories = self.extra_factories;
        factories.extend(codecs::builtin_factories());
        let cache = AdapterCache::new(factories);

        Ok(Engine {
            registry: self.registry,
            cache,
            config: self.config,
            naming: self.naming,
            ser_exclusion: self.ser_exclusion,
            de_exclusion: self.de_exclusion,
        })
    }
}

impl Default for EngineBuilder {
    fn default() -> EngineBuilder {
        EngineBuilder::new()
    }
}
