use crate::ctx::Ctx;
use crate::descriptor::Descriptor;
use crate::error::Error;
use crate::tree::Tree;
use std::any::Any;

/// Which operations a codec implements. Reified as an enum (rather than
/// relying on trait-object downcasting) so the registry and resolver can
/// make operation-shaped decisions — e.g. "does this factory's codec supply
/// a creator?" — without probing via `Any`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CodecKind {
    Serializer,
    Deserializer,
    Creator,
    Combined,
}

/// The uniform, type-erased codec contract consulted by the registry, the
/// adapter cache, and the walker. A codec is stateless after construction —
/// `write`/`read`/`create_empty` all take `&self`, never `&mut self` — so
/// `AnyCodec: Send + Sync` can be required unconditionally and the same
/// `Arc<dyn AnyCodec>` instance safely shared across threads (§4.2's
/// concurrency note: two threads may race to resolve the same descriptor
/// and each produce a functionally equivalent codec). Every operation takes
/// a [`Ctx`] so container and reflective codecs can recurse into nested
/// descriptors via the shared adapter cache.
///
/// Implementors only need to override the operations implied by their
/// `kind()`; the default bodies return `UnsupportedType` for operations a
/// given codec does not support, matching the distilled spec's per-kind
/// operation table.
pub trait AnyCodec: Send + Sync {
    fn kind(&self) -> CodecKind;

    /// Serialize a value, given as a type-erased reference, into a `Tree`.
    fn write(&self, _value: &dyn Any, desc: &Descriptor, _ctx: &Ctx<'_>) -> Result<Tree, Error> {
        Err(Error::UnsupportedType {
            type_name: desc.name,
        })
    }

    /// Deserialize a `Tree` into a boxed, type-erased value.
    fn read(&self, _tree: &Tree, desc: &Descriptor, _ctx: &Ctx<'_>) -> Result<Box<dyn Any>, Error> {
        Err(Error::UnsupportedType {
            type_name: desc.name,
        })
    }

    /// Produce an empty/default instance of the described type, used by the
    /// Tree Deserializer (§4.5) to bootstrap field-by-field assignment.
    fn create_empty(&self, desc: &Descriptor, _ctx: &Ctx<'_>) -> Result<Box<dyn Any>, Error> {
        Err(Error::UnsupportedType {
            type_name: desc.name,
        })
    }
}

/// A typed, ergonomic codec for a single Rust type `T`. Implementors write
/// `T`-shaped code; [`TypedCodecAdapter`] erases it into `Arc<dyn AnyCodec>`
/// for storage in the registry and cache.
pub trait Codec<T: 'static>: Send + Sync {
    fn kind(&self) -> CodecKind;

    fn write(&self, _value: &T, _desc: &Descriptor, _ctx: &Ctx<'_>) -> Result<Tree, Error> {
        Err(Error::UnsupportedType {
            type_name: std::any::type_name::<T>(),
        })
    }

    fn read(&self, _tree: &Tree, _desc: &Descriptor, _ctx: &Ctx<'_>) -> Result<T, Error> {
        Err(Error::UnsupportedType {
            type_name: std::any::type_name::<T>(),
        })
    }

    fn create_empty(&self, _desc: &Descriptor, _ctx: &Ctx<'_>) -> Result<T, Error> {
        Err(Error::UnsupportedType {
            type_name: std::any::type_name::<T>(),
        })
    }
}

/// Adapts a typed [`Codec<T>`] into the object-safe [`AnyCodec`] the
/// registry and cache actually store.
pub struct TypedCodecAdapter<T, C> {
    inner: C,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T, C> TypedCodecAdapter<T, C> {
    pub fn new(inner: C) -> Self {
        TypedCodecAdapter {
            inner,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<T, C> AnyCodec for TypedCodecAdapter<T, C>
where
    T: 'static,
    C: Codec<T>,
{
    fn kind(&self) -> CodecKind {
        self.inner.kind()
    }

    fn write(&self, value: &dyn Any, desc: &Descriptor, ctx: &Ctx<'_>) -> Result<Tree, Error> {
        let value = value.downcast_ref::<T>().ok_or(Error::UnsupportedType {
            type_name: desc.name,
        })?;
        self.inner.write(value, desc, ctx)
    }

    fn read(&self, tree: &Tree, desc: &Descriptor, ctx: &Ctx<'_>) -> Result<Box<dyn Any>, Error> {
        let value = self.inner.read(tree, desc, ctx)?;
        Ok(Box::new(value))
    }

    fn create_empty(&self, desc: &Descriptor, ctx: &Ctx<'_>) -> Result<Box<dyn Any>, Error> {
        let value = self.inner.create_empty(desc, ctx)?;
        Ok(Box::new(value))
    }
}

/// A closure-backed combined codec, convenient for the built-in primitive
/// codecs in [`crate::codecs`] where a full `impl Codec<T>` block would be
/// boilerplate.
pub struct FnCodec<T> {
    pub write: Option<Box<dyn Fn(&T, &Descriptor, &Ctx<'_>) -> Result<Tree, Error> + Send + Sync>>,
    pub read: Option<Box<dyn Fn(&Tree, &Descriptor, &Ctx<'_>) -> Result<T, Error> + Send + Sync>>,
}

impl<T: 'static> Codec<T> for FnCodec<T> {
    fn kind(&self) -> CodecKind {
        match (&self.write, &self.read) {
            (Some(_), Some(_)) => CodecKind::Combined,
            (Some(_), None) => CodecKind::Serializer,
            (None, Some(_)) => CodecKind::Deserializer,
            (None, None) => CodecKind::Combined,
        }
    }

    fn write(&self, value: &T, desc: &Descriptor, ctx: &Ctx<'_>) -> Result<Tree, Error> {
        match &self.write {
            Some(f) => f(value, desc, ctx),
            None => Err(Error::UnsupportedType {
                type_name: desc.name,
            }),
        }
    }

    fn read(&self, tree: &Tree, desc: &Descriptor, ctx: &Ctx<'_>) -> Result<T, Error> {
        match &self.read {
            Some(f) => f(tree, desc, ctx),
            None => Err(Error::UnsupportedType {
                type_name: desc.name,
            }),
        }
    }
}

/// A factory consulted by the recursive resolver (§4.2, §4.8): given a
/// descriptor, either produce a codec or decline by returning `None`.
/// Factories are tried in order; the first match wins. Factory construction
/// itself needs no `Ctx` — only the codec's `write`/`read` calls do — so a
/// factory may freely close over an `Arc<Registry>` captured once at engine
/// build time.
pub trait CodecFactory: Send + Sync {
    fn create(&self, desc: &Descriptor) -> Option<std::sync::Arc<dyn AnyCodec>>;
}

/// Wraps a plain closure as a [`CodecFactory`], matching the shape of the
/// built-in primitive/reference factories described in §4.8.
pub struct FnFactory<F>(pub F);

impl<F> CodecFactory for FnFactory<F>
where
    F: Fn(&Descriptor) -> Option<std::sync::Arc<dyn AnyCodec>> + Send + Sync,
{
    fn create(&self, desc: &Descriptor) -> Option<std::sync::Arc<dyn AnyCodec>> {
        (self.0)(desc)
    }
}
