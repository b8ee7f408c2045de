use crate::codec::{AnyCodec, CodecFactory, CodecKind};
use crate::descriptor::Descriptor;
use crate::error::Error;
use crate::tree::Tree;
use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

/// A placeholder codec installed during recursive resolution (§4.2). Holds
/// an optional delegate in a write-once cell: `set()` succeeds exactly once,
/// and `get()` is lock-free after the first successful set. Any `write`/
/// `read` before the delegate is set fails with `CyclicResolutionNotReady`,
/// which indicates a custom factory recursed into its own type before
/// `create` returned — a programmer error, not malformed input.
pub struct ProxyCodec {
    delegate: OnceLock<Arc<dyn AnyCodec>>,
    type_name: &'static str,
}

impl ProxyCodec {
    fn new(type_name: &'static str) -> ProxyCodec {
        ProxyCodec {
            delegate: OnceLock::new(),
            type_name,
        }
    }

    /// Wires up the delegate. Returns `Err` (silently ignored by the
    /// resolver, which only ever calls this once per proxy) if already set.
    fn set(&self, codec: Arc<dyn AnyCodec>) {
        let _ = self.delegate.set(codec);
    }

    fn get(&self) -> Result<&Arc<dyn AnyCodec>, Error> {
        self.delegate.get().ok_or(Error::CyclicResolutionNotReady {
            type_name: self.type_name,
        })
    }
}

impl AnyCodec for ProxyCodec {
    fn kind(&self) -> CodecKind {
        CodecKind::Combined
    }

    fn write(&self, value: &dyn Any, desc: &Descriptor, ctx: &crate::ctx::Ctx<'_>) -> Result<Tree, Error> {
        self.get()?.write(value, desc, ctx)
    }

    fn read(&self, tree: &Tree, desc: &Descriptor, ctx: &crate::ctx::Ctx<'_>) -> Result<Box<dyn Any>, Error> {
        self.get()?.read(tree, desc, ctx)
    }

    fn create_empty(&self, desc: &Descriptor, ctx: &crate::ctx::Ctx<'_>) -> Result<Box<dyn Any>, Error> {
        self.get()?.create_empty(desc, ctx)
    }
}

thread_local! {
    /// Per-thread scratch used only while a resolution is in flight. Not
    /// published to the shared cache until the outermost resolver call on
    /// this thread completes (§5's "recursive resolver uses a thread-local
    /// in-flight map to avoid lock contention").
    static RESOLVING: RefCell<HashMap<Descriptor, Arc<ProxyCodec>>> = RefCell::new(HashMap::new());
    /// Tracks whether the current thread is already inside a resolution, so
    /// only the outermost call publishes to the shared cache.
    static DEPTH: std::cell::Cell<usize> = std::cell::Cell::new(0);
}

/// A process-wide, thread-safe map from descriptor to resolved codec,
/// populated lazily via a recursion-safe resolver. Entry lifetime is the
/// process's; the cache only ever grows.
pub struct AdapterCache {
    cache: RwLock<HashMap<Descriptor, Arc<dyn AnyCodec>>>,
    factories: Vec<Box<dyn CodecFactory>>,
}

impl AdapterCache {
    pub fn new(factories: Vec<Box<dyn CodecFactory>>) -> AdapterCache {
        AdapterCache {
            cache: RwLock::new(HashMap::new()),
            factories,
        }
    }

    /// Produces a codec for `desc`, handling cyclic type graphs per §4.2's
    /// algorithm.
    pub fn resolve(&self, desc: &Descriptor) -> Result<Arc<dyn AnyCodec>, Error> {
        if let Some(codec) = self.cache.read().unwrap().get(desc) {
            return Ok(codec.clone());
        }

        let is_initial = DEPTH.with(|d| {
            let depth = d.get();
            d.set(depth + 1);
            depth == 0
        });

        let result = self.resolve_inner(desc);

        DEPTH.with(|d| d.set(d.get() - 1));

        if is_initial {
            // Publish the whole thread-local batch atomically, success or
            // not, then clear it: on failure nothing was wired up, so
            // publishing unresolved proxies would be unsound; the batch is
            // simply dropped instead.
            if result.is_ok() {
                let batch = RESOLVING.with(|r| r.borrow_mut().drain().collect::<Vec<_>>());
                let mut cache = self.cache.write().unwrap();
                for (d, proxy) in batch {
                    // Only publish if the proxy's delegate actually got set;
                    // an un-delegated proxy must never become globally
                    // visible.
                    if let Some(delegate) = proxy.delegate.get() {
                        cache.entry(d).or_insert_with(|| delegate.clone());
                    }
                }
            } else {
                RESOLVING.with(|r| r.borrow_mut().clear());
            }
        }

        result
    }

    fn resolve_inner(&self, desc: &Descriptor) -> Result<Arc<dyn AnyCodec>, Error> {
        if let Some(codec) = self.cache.read().unwrap().get(desc) {
            return Ok(codec.clone());
        }

        if let Some(proxy) = RESOLVING.with(|r| r.borrow().get(desc).cloned()) {
            return Ok(proxy as Arc<dyn AnyCodec>);
        }

        let proxy = Arc::new(ProxyCodec::new(desc.name));
        RESOLVING.with(|r| r.borrow_mut().insert(desc.clone(), proxy.clone()));

        for factory in &self.factories {
            if let Some(codec) = factory.create(desc) {
                proxy.set(codec.clone());
                tracing::trace!(ty = desc.name, "resolved codec via factory");
                return Ok(codec);
            }
        }

        Err(Error::UnsupportedType {
            type_name: desc.name,
        })
    }

    pub fn len(&self) -> usize {
        self.cache.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::codec::FnFactory;
    use crate::descriptor::Kind;

    struct UnitCodec;
    impl AnyCodec for UnitCodec {
        fn kind(&self) -> CodecKind {
            CodecKind::Combined
        }
        fn write(&self, _value: &dyn Any, _desc: &Descriptor, _ctx: &crate::ctx::Ctx<'_>) -> Result<Tree, Error> {
            Ok(Tree::Null)
        }
    }

    #[test]
    fn test_resolve_caches_result() {
        let cache = AdapterCache::new(vec![Box::new(FnFactory(|_d: &Descriptor| {
            Some(Arc::new(UnitCodec) as Arc<dyn AnyCodec>)
        }))]);
        let desc = Descriptor::of::<u64>("u64", Kind::Primitive);

        assert!(cache.is_empty());
        let a = cache.resolve(&desc).unwrap();
        assert_eq!(cache.len(), 1);
        let b = cache.resolve(&desc).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_unresolvable_type_is_unsupported() {
        let cache = AdapterCache::new(vec![]);
        let desc = Descriptor::of::<u64>("u64", Kind::Primitive);
        assert!(matches!(
            cache.resolve(&desc),
            Err(Error::UnsupportedType { .. })
        ));
    }

    #[test]
    fn test_concurrent_resolution_converges_to_one_entry() {
        use std::sync::Arc as StdArc;
        use std::thread;

        let cache = StdArc::new(AdapterCache::new(vec![Box::new(FnFactory(
            |_d: &Descriptor| Some(Arc::new(UnitCodec) as Arc<dyn AnyCodec>),
        ))]));
        let desc = Descriptor::of::<u64>("u64", Kind::Primitive);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                let desc = desc.clone();
                thread::spawn(move || cache.resolve(&desc).unwrap())
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(cache.len(), 1);
    }
}
