use crate::descriptor::Descriptor;
use crate::exclusion::FieldMeta;
use crate::tree::Tree;

/// `Reflect` is the capability a host type implements (by hand, per
/// `DESIGN.md`'s Open Question decision) to expose its declared fields,
/// kind, and identity to the [`crate::walker`]. It stands in for the
/// distilled spec's language-level runtime reflection.
///
/// Implementors describe their own shape; they never interpret another
/// type's `Reflect` impl. The walker is the only caller.
pub trait Reflect {
    /// This type's own descriptor.
    fn descriptor() -> Descriptor
    where
        Self: Sized;

    /// Fields declared directly on this type, most-derived first, in
    /// declaration order. Embedded/flattened composition (the Rust analogue
    /// of superclass fields, since Rust has no inheritance) is expressed by
    /// an implementor including its embedded type's fields inline here,
    /// already translated to this type's own field list.
    fn fields(&self) -> Vec<FieldView<'_>>;

    /// A stable identity for cycle detection, typically a pointer cast to
    /// `usize` for heap-allocated containers. Value-like types (anything
    /// cheaply `Copy` or otherwise incapable of forming a cycle) return
    /// `None`, which the walker treats as "never cyclic" per §4.3.
    fn identity(&self) -> Option<usize> {
        None
    }
}

/// A single declared field, as seen by the walker during a single visit.
/// `value` is a type-erased accessor so the walker can recurse without
/// knowing the field's concrete Rust type; concrete codecs downcast via
/// [`FieldValue`].
///
/// `meta` carries the exclusion machinery's per-field metadata and
/// `alternates` the §4.9 alternate-name list — both real per-field data a
/// `Reflect` implementor supplies, not something `ser`/`de`/`walker`
/// invent on the fly. [`FieldView::new`] fills in the common case (exposed,
/// no modifiers, no alternates); override `meta`/`alternates` directly when
/// a field needs anything else.
pub struct FieldView<'a> {
    pub name: &'static str,
    pub declared_type: Descriptor,
    pub value: FieldValue<'a>,
    /// Names tried, in order, against the incoming JSON object during
    /// deserialization, before the naming-strategy-translated primary name.
    /// Empty for the common case.
    pub alternates: &'static [&'static str],
    pub meta: FieldMeta<'static>,
}

impl<'a> FieldView<'a> {
    /// A field with no alternates and default (exposed, unfiltered)
    /// exclusion metadata — the shape most `Reflect` implementors need.
    pub fn new(name: &'static str, declared_type: Descriptor, value: FieldValue<'a>) -> FieldView<'a> {
        FieldView {
            name,
            declared_type,
            value,
            alternates: &[],
            meta: FieldMeta::exposed(name),
        }
    }

    /// Returns this view with `alternates` set: extra member names this
    /// field also accepts on read, tried in order after the primary
    /// translated name (§4.9).
    pub fn with_alternates(mut self, alternates: &'static [&'static str]) -> FieldView<'a> {
        self.alternates = alternates;
        self
    }
}

/// A field's value as exposed to the walker: either a nested reflectable
/// value, a tree-shaped leaf the bridge can consume directly, or a raw
/// `Tree` pass-through (fields declared as `Tree`, per §4.4's any-object
/// factory).
pub enum FieldValue<'a> {
    Reflect(&'a dyn ReflectDyn),
    Leaf(&'a dyn std::any::Any),
    Tree(&'a Tree),
    Null,
}

/// Object-safe counterpart of `Reflect`, used wherever the walker needs a
/// trait object (`&dyn ReflectDyn`) rather than a concrete, sized type.
/// Every `T: Reflect` gets this for free via the blanket impl below.
pub trait ReflectDyn {
    fn fields_dyn(&self) -> Vec<FieldView<'_>>;
    fn identity_dyn(&self) -> Option<usize>;
    fn descriptor_dyn(&self) -> Descriptor;
    /// Erases back to `&dyn Any` so a resolved [`crate::codec::AnyCodec`]
    /// can downcast to its concrete type, letting leaf codecs (numbers,
    /// strings, uuid/url/time) participate in the same walk as reflective
    /// struct types without the walker knowing their concrete type.
    fn as_any_dyn(&self) -> &dyn std::any::Any;
}

impl<T: Reflect + 'static> ReflectDyn for T {
    fn fields_dyn(&self) -> Vec<FieldView<'_>> {
        self.fields()
    }

    fn identity_dyn(&self) -> Option<usize> {
        self.identity()
    }

    fn descriptor_dyn(&self) -> Descriptor {
        T::descriptor()
    }

    fn as_any_dyn(&self) -> &dyn std::any::Any {
        self
    }
}

/// The construction-side counterpart of `Reflect`, implemented by types the
/// [`crate::de`] deserializer can build field-by-field. Kept as a separate
/// trait rather than folded into `Reflect` because reading a value's shape
/// and mutating a fresh one during construction are different capabilities
/// — plenty of `Reflect` implementors (anything only ever serialized) have
/// no need to support the reverse direction.
pub trait ReflectBuild: Reflect + Sized {
    /// A fresh, default-valued instance to assign fields onto.
    fn new_empty() -> Self;

    /// Assigns a previously-read value to the named field. `value`'s
    /// concrete type matches the field's `declared_type` as reported by
    /// `fields()`; implementors downcast via `Box<dyn Any>::downcast`.
    fn set_field(&mut self, name: &str, value: Box<dyn std::any::Any>) -> Result<(), crate::error::Error>;
}
