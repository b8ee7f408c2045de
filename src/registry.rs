use crate::codec::AnyCodec;
use crate::descriptor::Descriptor;
use crate::error::Error;
use indexmap::IndexMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A registration in the hierarchy tier: an "is-a" predicate plus the codec
/// to use when it matches. Since Rust has no runtime class hierarchy to
/// walk, "base class is an ancestor of desc.raw_class" (distilled spec
/// §4.1) is approximated by a caller-supplied matcher function, per
/// `DESIGN.md`'s Open Question decision. The matcher is a plain function
/// pointer rather than a closure so hierarchy entries stay `Clone`, which
/// `merge()` relies on.
#[derive(Clone)]
struct HierarchyEntry {
    matches: fn(&Descriptor) -> bool,
    codec: Arc<dyn AnyCodec>,
}

/// Two-tier codec lookup table: an exact tier keyed by descriptor equality,
/// and a hierarchy tier scanned in reverse registration order. `freeze()` is
/// a one-way latch; registrations after it fail with `ConfigurationError`.
pub struct Registry {
    exact: IndexMap<Descriptor, Arc<dyn AnyCodec>>,
    hierarchy: Vec<HierarchyEntry>,
    frozen: AtomicBool,
}

impl Registry {
    pub fn new() -> Registry {
        Registry {
            exact: IndexMap::new(),
            hierarchy: Vec::new(),
            frozen: AtomicBool::new(false),
        }
    }

    fn check_mutable(&self) -> Result<(), Error> {
        if self.frozen.load(Ordering::Acquire) {
            Err(Error::ConfigurationError(
                "registry is frozen; no further registrations are permitted".into(),
            ))
        } else {
            Ok(())
        }
    }

    /// Registers an exact-tier codec, overwriting any prior entry for the
    /// same descriptor.
    pub fn register_exact(&mut self, desc: Descriptor, codec: Arc<dyn AnyCodec>) -> Result<(), Error> {
        self.check_mutable()?;
        self.exact.insert(desc, codec);
        Ok(())
    }

    /// Registers an exact-tier codec only if no entry already exists for
    /// this descriptor.
    pub fn register_exact_if_absent(
        &mut self,
        desc: Descriptor,
        codec: Arc<dyn AnyCodec>,
    ) -> Result<(), Error> {
        self.check_mutable()?;
        self.exact.entry(desc).or_insert(codec);
        Ok(())
    }

    /// Registers a hierarchy-tier codec behind an "is-a" matcher. Within the
    /// hierarchy tier, most-recently-registered wins (LIFO) — the only place
    /// registration order is observable (§4.1).
    pub fn register_hierarchy(
        &mut self,
        matches: fn(&Descriptor) -> bool,
        codec: Arc<dyn AnyCodec>,
    ) -> Result<(), Error> {
        self.check_mutable()?;
        self.hierarchy.push(HierarchyEntry { matches, codec });
        Ok(())
    }

    /// Shallow-merges another registry's entries into this one (distilled
    /// spec's `merge(other_registry)`): later entries from `other` overwrite
    /// this registry's exact-tier entries for the same descriptor, and
    /// `other`'s hierarchy entries are appended after this registry's own
    /// (preserving `other`'s own LIFO ordering within the appended run).
    pub fn merge(&mut self, other: &Registry) -> Result<(), Error> {
        self.check_mutable()?;
        for (desc, codec) in other.exact.iter() {
            self.exact.insert(desc.clone(), codec.clone());
        }
        self.hierarchy.extend(other.hierarchy.iter().cloned());
        Ok(())
    }

    /// One-way latch. After `freeze()`, all `register_*` calls fail.
    pub fn freeze(&self) {
        self.frozen.store(true, Ordering::Release);
        tracing::debug!(
            exact = self.exact.len(),
            hierarchy = self.hierarchy.len(),
            "registry frozen"
        );
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }

    /// Looks up a codec for `desc`: (1) exact match on `desc`; (2) exact
    /// match on `desc.raw_class_only()`; (3) hierarchy tier, scanned in
    /// reverse registration order, first match wins. Never fails — absence
    /// is `None`, not an error.
    pub fn lookup(&self, desc: &Descriptor) -> Option<Arc<dyn AnyCodec>> {
        if let Some(codec) = self.exact.get(desc) {
            return Some(codec.clone());
        }
        let raw_only = desc.raw_class_only();
        if raw_only != *desc {
            if let Some(codec) = self.exact.get(&raw_only) {
                return Some(codec.clone());
            }
        }
        self.hierarchy
            .iter()
            .rev()
            .find(|entry| (entry.matches)(desc))
            .map(|entry| entry.codec.clone())
    }
}

impl Default for Registry {
    fn default() -> Registry {
        Registry::new()
    }
}
