//! A reflective JSON binding library: a type descriptor and codec system
//! connecting Rust values to an in-memory JSON tree, with a cycle-safe
//! resolver, a pluggable registry for custom and hierarchy-matched codecs,
//! and a streaming bridge to JSON text.
//!
//! The usual entry point is [`engine::Engine`], built via
//! [`engine::EngineBuilder`]:
//!
//! ```
//! use jsonbind::{Engine, Reflect, ReflectBuild, Descriptor, Kind, FieldView, FieldValue};
//! use std::any::Any;
//!
//! struct Point { x: u64, y: u64 }
//!
//! impl Reflect for Point {
//!     fn descriptor() -> Descriptor { Descriptor::of::<Point>("Point", Kind::Struct) }
//!     fn fields(&self) -> Vec<FieldView<'_>> {
//!         vec![
//!             FieldView::new("x", Descriptor::of::<u64>("u64", Kind::Primitive), FieldValue::Leaf(&self.x)),
//!             FieldView::new("y", Descriptor::of::<u64>("u64", Kind::Primitive), FieldValue::Leaf(&self.y)),
//!         ]
//!     }
//! }
//!
//! impl ReflectBuild for Point {
//!     fn new_empty() -> Point { Point { x: 0, y: 0 } }
//!     fn set_field(&mut self, name: &str, value: Box<dyn Any>) -> Result<(), jsonbind::Error> {
//!         match name {
//!             "x" => self.x = *value.downcast::<u64>().unwrap(),
//!             "y" => self.y = *value.downcast::<u64>().unwrap(),
//!             _ => {}
//!         }
//!         Ok(())
//!     }
//! }
//!
//! let engine = Engine::builder().register_reflect::<Point>().unwrap().build().unwrap();
//! let json = engine.to_json(&Point { x: 1, y: 2 }).unwrap();
//! let back: Point = engine.from_json(&json).unwrap();
//! assert_eq!(back.x, 1);
//! ```

pub mod bridge;
pub mod cache;
pub mod codec;
pub mod codecs;
pub mod config;
pub mod ctx;
pub mod de;
pub mod descriptor;
pub mod engine;
pub mod error;
pub mod exclusion;
pub mod location;
mod number;
pub mod naming;
pub mod reflect;
pub mod registry;
pub mod ser;
pub mod tree;
pub mod walker;

pub use cache::AdapterCache;
pub use codec::{AnyCodec, Codec, CodecFactory, CodecKind, FnCodec, FnFactory, TypedCodecAdapter};
pub use config::{Config, LongPolicy, PrettyPrint, UnknownMemberPolicy};
pub use ctx::Ctx;
pub use de::TreeReader;
pub use descriptor::{Descriptor, DescriptorParams, Kind};
pub use engine::{Engine, EngineBuilder};
pub use error::Error;
pub use exclusion::{ExclusionRules, FieldMeta, Modifier};
pub use location::{LocatedItem, LocatedProperty, Location};
pub use naming::NamingStrategy;
pub use number::Number;
pub use reflect::{FieldValue, FieldView, Reflect, ReflectBuild, ReflectDyn};
pub use registry::Registry;
pub use ser::TreeBuilder;
pub use tree::{Object, Tree};
pub use walker::{Visitor, WalkContext};
