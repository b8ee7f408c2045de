use crate::cache::AdapterCache;
use crate::config::Config;
use crate::exclusion::ExclusionRules;
use crate::naming::NamingStrategy;
use crate::registry::Registry;

/// The shared, read-only handle threaded through every codec and container
/// call. Codecs are stateless (`AnyCodec::write`/`read` take `&self`), so
/// anything a codec needs beyond its own node — resolving a nested element's
/// codec, consulting the naming strategy, checking `serialize_nulls` — comes
/// through `Ctx` rather than being captured at registration time. This plays
/// the role `serde`'s `Serializer`/`Deserializer` traits play in the
/// teacher's stack: a context object passed on every call instead of stored
/// state.
pub struct Ctx<'a> {
    pub registry: &'a Registry,
    pub cache: &'a AdapterCache,
    pub config: &'a Config,
    pub naming: &'a NamingStrategy,
    pub ser_exclusion: &'a ExclusionRules,
    pub de_exclusion: &'a ExclusionRules,
}
