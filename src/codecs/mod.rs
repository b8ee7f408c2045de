//! Built-in codecs, one module per family, assembled into the default
//! [`crate::cache::AdapterCache`] factory list by [`crate::engine`]. Order
//! matters only within `containers`, where the tree pass-through is tried
//! before concrete element-typed registrations (§4.8).

pub mod containers;
pub mod leaf;
pub mod primitives;

/// The ordered built-in factory list (§4.8's "string, bool, ... then
/// reference types, then containers" order): primitives first since they're
/// the cheapest and most common match, then the leaf reference types
/// (`Uuid`/`Url`/`OffsetDateTime`/`BigInt`/`BigDecimal`), then the
/// tree-pass-through factory for `Tree`-typed fields.
pub fn builtin_factories() -> Vec<Box<dyn crate::codec::CodecFactory>> {
    vec![
        primitives::factory(),
        leaf::factory(),
        containers::factory(),
        containers::tree_factory(),
    ]
}
