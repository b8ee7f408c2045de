use crate::descriptor::Descriptor;

/// A single field as seen by the exclusion machinery — deliberately a
/// smaller, flatter view than [`crate::reflect::FieldView`] since exclusion
/// rules only ever need the field's static metadata, never its value.
#[derive(Clone, Copy)]
pub struct FieldMeta<'a> {
    pub name: &'a str,
    /// Bit-set of modifiers this field carries, using the same bit
    /// positions as [`Modifier`]. Host `Reflect` impls that don't model
    /// Rust's (much weaker) notion of `transient`/`static` leave this `0`.
    pub modifiers: u32,
    pub since: Option<u32>,
    pub until: Option<u32>,
    pub exposed: bool,
    pub is_inner_class: bool,
    pub is_anonymous_or_local: bool,
}

impl<'a> FieldMeta<'a> {
    /// A field with no modifiers, no version bounds, exposed, not an inner
    /// or anonymous/local class — the default shape for a field a host type
    /// doesn't otherwise annotate.
    pub fn exposed(name: &'a str) -> FieldMeta<'a> {
        FieldMeta {
            name,
            modifiers: 0,
            since: None,
            until: None,
            exposed: true,
            is_inner_class: false,
            is_anonymous_or_local: false,
        }
    }
}

#[derive(Copy, Clone)]
pub enum Modifier {
    Transient = 0b01,
    Static = 0b10,
}

/// A predicate composable from the standard filters in §4.7. `skip_field`
/// and `skip_class` are disjunctions over whichever standard filters are
/// configured: any `true` means skip. Serialization and deserialization may
/// each hold a differently-configured `ExclusionRules` instance.
#[derive(Clone)]
pub struct ExclusionRules {
    pub modifier_mask: u32,
    pub version: Option<u32>,
    pub explicit_expose_only: bool,
    pub disable_inner_classes: bool,
}

impl Default for ExclusionRules {
    fn default() -> ExclusionRules {
        ExclusionRules {
            modifier_mask: Modifier::Transient as u32 | Modifier::Static as u32,
            version: None,
            explicit_expose_only: false,
            disable_inner_classes: false,
        }
    }
}

impl ExclusionRules {
    pub fn skip_field(&self, field: &FieldMeta<'_>) -> bool {
        if field.modifiers & self.modifier_mask != 0 {
            return true;
        }
        if let Some(version) = self.version {
            if let Some(since) = field.since {
                if since > version {
                    return true;
                }
            }
            if let Some(until) = field.until {
                if until <= version {
                    return true;
                }
            }
        }
        if self.explicit_expose_only && !field.exposed {
            return true;
        }
        if self.disable_inner_classes && field.is_inner_class {
            return true;
        }
        if field.is_anonymous_or_local {
            return true;
        }
        false
    }

    /// Class-level exclusion (distilled spec's `skip_class`). Rust has no
    /// anonymous classes; the only standard class-level filter that applies
    /// is the "any other registered predicate" case, which user code can
    /// layer on by composing `ExclusionRules` with its own descriptor
    /// predicate before handing it to the engine. The default never skips a
    /// whole type.
    pub fn skip_class(&self, _desc: &Descriptor) -> bool {
        false
    }
}
