use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// The runtime "kind" of a descriptor, used by the [`crate::walker`] to
/// decide which Visitor callback to dispatch without downcasting.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Kind {
    Primitive,
    Sequence,
    Map,
    Struct,
    /// The opaque "any JSON" descriptor: `Tree` itself, or a field typed
    /// `Tree`, passes through the walker untouched.
    Any,
    /// Slot left for a container's element/key/value type when the caller
    /// did not supply one (e.g. a non-generic `Vec` field). The walker uses
    /// the runtime type of each element instead.
    Dynamic,
}

/// A reified, runtime handle for a Rust type: a raw type id plus a
/// human-readable name and, for container types, nested descriptors for
/// element/key/value slots.
///
/// Two descriptors are equal iff their raw type ids and generic parameters
/// are pairwise equal.
#[derive(Clone)]
pub struct Descriptor {
    pub raw: TypeId,
    pub name: &'static str,
    pub kind: Kind,
    pub params: DescriptorParams,
}

/// Generic parameter slots. Most descriptors have none; sequences carry an
/// element type, maps carry key and value types.
#[derive(Clone)]
pub enum DescriptorParams {
    None,
    Element(Arc<Descriptor>),
    KeyValue(Arc<Descriptor>, Arc<Descriptor>),
}

impl Descriptor {
    /// The descriptor for a concrete, non-generic Rust type.
    pub fn of<T: 'static>(name: &'static str, kind: Kind) -> Descriptor {
        Descriptor {
            raw: TypeId::of::<T>(),
            name,
            kind,
            params: DescriptorParams::None,
        }
    }

    /// The descriptor for a sequence type (`Vec<T>`, slices, sets) with a
    /// known element descriptor.
    pub fn sequence<T: 'static>(name: &'static str, element: Descriptor) -> Descriptor {
        Descriptor {
            raw: TypeId::of::<T>(),
            name,
            kind: Kind::Sequence,
            params: DescriptorParams::Element(Arc::new(element)),
        }
    }

    /// The descriptor for a mapping type (`HashMap<K, V>`, `IndexMap<K, V>`)
    /// with known key/value descriptors.
    pub fn map<T: 'static>(name: &'static str, key: Descriptor, value: Descriptor) -> Descriptor {
        Descriptor {
            raw: TypeId::of::<T>(),
            name,
            kind: Kind::Map,
            params: DescriptorParams::KeyValue(Arc::new(key), Arc::new(value)),
        }
    }

    /// The opaque "any JSON" descriptor used for `Tree`-typed fields and for
    /// dynamic container slots resolved per-element at walk time.
    pub fn any() -> Descriptor {
        Descriptor {
            raw: TypeId::of::<crate::tree::Tree>(),
            name: "Tree",
            kind: Kind::Any,
            params: DescriptorParams::None,
        }
    }

    /// A parameter-less descriptor standing in for "unknown element type";
    /// the walker resolves the real descriptor of each element at runtime.
    pub fn dynamic() -> Descriptor {
        Descriptor {
            raw: TypeId::of::<()>(),
            name: "dynamic",
            kind: Kind::Dynamic,
            params: DescriptorParams::None,
        }
    }

    pub fn element(&self) -> Option<&Descriptor> {
        match &self.params {
            DescriptorParams::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn key_value(&self) -> Option<(&Descriptor, &Descriptor)> {
        match &self.params {
            DescriptorParams::KeyValue(k, v) => Some((k, v)),
            _ => None,
        }
    }

    /// The descriptor stripped of its generic parameters, used by the
    /// registry's second exact-tier lookup attempt (§4.1 step 2).
    pub fn raw_class_only(&self) -> Descriptor {
        Descriptor {
            raw: self.raw,
            name: self.name,
            kind: self.kind,
            params: DescriptorParams::None,
        }
    }
}

impl PartialEq for Descriptor {
    fn eq(&self, other: &Descriptor) -> bool {
        if self.raw != other.raw {
            return false;
        }
        match (&self.params, &other.params) {
            (DescriptorParams::None, DescriptorParams::None) => true,
            (DescriptorParams::Element(l), DescriptorParams::Element(r)) => l == r,
            (DescriptorParams::KeyValue(lk, lv), DescriptorParams::KeyValue(rk, rv)) => {
                lk == rk && lv == rv
            }
            _ => false,
        }
    }
}
impl Eq for Descriptor {}

impl Hash for Descriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
        match &self.params {
            DescriptorParams::None => {}
            DescriptorParams::Element(e) => e.hash(state),
            DescriptorParams::KeyValue(k, v) => {
                k.hash(state);
                v.hash(state);
            }
        }
    }
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Descriptor({})", self.name)
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_equality_ignores_name_but_not_params() {
        let a = Descriptor::sequence::<Vec<u64>>("Vec<u64>", Descriptor::of::<u64>("u64", Kind::Primitive));
        let b = Descriptor::sequence::<Vec<u64>>("different name", Descriptor::of::<u64>("u64", Kind::Primitive));
        assert_eq!(a, b);

        let c = Descriptor::sequence::<Vec<u64>>("Vec<u64>", Descriptor::of::<i64>("i64", Kind::Primitive));
        assert_ne!(a, c);
    }

    #[test]
    fn test_raw_class_only_drops_params() {
        let a = Descriptor::sequence::<Vec<u64>>("Vec<u64>", Descriptor::of::<u64>("u64", Kind::Primitive));
        let stripped = a.raw_class_only();
        assert!(stripped.element().is_none());
        assert_eq!(stripped.raw, a.raw);
    }
}
