use jsonbind::{
    Config, Descriptor, Engine, Error, FieldValue, FieldView, Kind, Modifier, NamingStrategy,
    Reflect, ReflectBuild,
};
use std::any::Any;
use time::OffsetDateTime;

#[derive(Debug)]
struct Pair {
    x: u64,
    y: Option<u64>,
}

impl Reflect for Pair {
    fn descriptor() -> Descriptor {
        Descriptor::of::<Pair>("Pair", Kind::Struct)
    }
    fn fields(&self) -> Vec<FieldView<'_>> {
        vec![
            FieldView::new(
                "x",
                Descriptor::of::<u64>("u64", Kind::Primitive),
                FieldValue::Leaf(&self.x),
            ),
            FieldView::new(
                "y",
                Descriptor::of::<Option<u64>>("Option<u64>", Kind::Dynamic),
                FieldValue::Leaf(&self.y),
            ),
        ]
    }
}

impl ReflectBuild for Pair {
    fn new_empty() -> Pair {
        Pair { x: 0, y: None }
    }
    fn set_field(&mut self, name: &str, value: Box<dyn Any>) -> Result<(), Error> {
        match name {
            "x" => self.x = *value.downcast::<u64>().map_err(|_| Error::from("bad field"))?,
            "y" => {
                self.y = *value
                    .downcast::<Option<u64>>()
                    .map_err(|_| Error::from("bad field"))?
            }
            other => return Err(Error::from(format!("unknown field {}", other))),
        }
        Ok(())
    }
}

#[test]
fn test_pair_roundtrip() {
    let engine = Engine::builder().register_reflect::<Pair>().unwrap().build().unwrap();
    let p = Pair { x: 7, y: Some(9) };
    let json = engine.to_json(&p).unwrap();
    let back: Pair = engine.from_json(&json).unwrap();
    assert_eq!(back.x, 7);
    assert_eq!(back.y, Some(9));
}

#[test]
fn test_null_field_omitted_unless_configured() {
    let engine = Engine::builder().register_reflect::<Pair>().unwrap().build().unwrap();
    let p = Pair { x: 1, y: None };
    let json = engine.to_json(&p).unwrap();
    assert!(!json.contains("\"y\""));

    let mut config = Config::default();
    config.serialize_nulls = true;
    let engine = Engine::builder()
        .config(config)
        .register_reflect::<Pair>()
        .unwrap()
        .build()
        .unwrap();
    let json = engine.to_json(&p).unwrap();
    assert!(json.contains("\"y\":null"));
}

struct Numbers {
    values: Vec<u64>,
}

impl Reflect for Numbers {
    fn descriptor() -> Descriptor {
        Descriptor::of::<Numbers>("Numbers", Kind::Struct)
    }
    fn fields(&self) -> Vec<FieldView<'_>> {
        vec![FieldView::new(
            "values",
            Descriptor::sequence::<Vec<u64>>("Vec<u64>", Descriptor::of::<u64>("u64", Kind::Primitive)),
            FieldValue::Leaf(&self.values),
        )]
    }
}

impl ReflectBuild for Numbers {
    fn new_empty() -> Numbers {
        Numbers { values: Vec::new() }
    }
    fn set_field(&mut self, name: &str, value: Box<dyn Any>) -> Result<(), Error> {
        match name {
            "values" => {
                self.values = *value
                    .downcast::<Vec<u64>>()
                    .map_err(|_| Error::from("bad field"))?
            }
            other => return Err(Error::from(format!("unknown field {}", other))),
        }
        Ok(())
    }
}

#[test]
fn test_sequence_field_roundtrips() {
    let engine = Engine::builder()
        .register_reflect::<Numbers>()
        .unwrap()
        .build()
        .unwrap();
    let n = Numbers {
        values: vec![1, 2, 3],
    };
    let json = engine.to_json(&n).unwrap();
    let back: Numbers = engine.from_json(&json).unwrap();
    assert_eq!(back.values, vec![1, 2, 3]);
}

struct Event {
    happened_at: OffsetDateTime,
}

impl Reflect for Event {
    fn descriptor() -> Descriptor {
        Descriptor::of::<Event>("Event", Kind::Struct)
    }
    fn fields(&self) -> Vec<FieldView<'_>> {
        vec![FieldView::new(
            "happenedAt",
            Descriptor::of::<OffsetDateTime>("OffsetDateTime", Kind::Primitive),
            FieldValue::Leaf(&self.happened_at),
        )]
    }
}

impl ReflectBuild for Event {
    fn new_empty() -> Event {
        Event {
            happened_at: OffsetDateTime::UNIX_EPOCH,
        }
    }
    fn set_field(&mut self, name: &str, value: Box<dyn Any>) -> Result<(), Error> {
        match name {
            "happenedAt" => {
                self.happened_at = *value
                    .downcast::<OffsetDateTime>()
                    .map_err(|_| Error::from("bad field"))?
            }
            other => return Err(Error::from(format!("unknown field {}", other))),
        }
        Ok(())
    }
}

#[test]
fn test_datetime_field_roundtrips_through_json() {
    let engine = Engine::builder().register_reflect::<Event>().unwrap().build().unwrap();
    let e = Event {
        happened_at: OffsetDateTime::UNIX_EPOCH,
    };
    let json = engine.to_json(&e).unwrap();
    let back: Event = engine.from_json(&json).unwrap();
    assert_eq!(back.happened_at, e.happened_at);
}

#[test]
fn test_naming_strategy_changes_member_names() {
    let mut config = Config::default();
    config.naming = jsonbind::config::NamingStrategyConfig::LowerCaseWithUnderscores;
    let engine = Engine::builder()
        .config(config)
        .register_reflect::<Pair>()
        .unwrap()
        .build()
        .unwrap();
    let p = Pair { x: 1, y: None };
    let json = engine.to_json(&p).unwrap();
    assert!(json.contains("\"x\""));

    let naming = NamingStrategy::Separated {
        separator: '_',
        upper: false,
    };
    assert_eq!(naming.translate("happenedAt"), "happened_at");
}

struct Person {
    name: String,
}

impl Reflect for Person {
    fn descriptor() -> Descriptor {
        Descriptor::of::<Person>("Person", Kind::Struct)
    }
    fn fields(&self) -> Vec<FieldView<'_>> {
        vec![FieldView::new(
            "name",
            Descriptor::of::<String>("String", Kind::Primitive),
            FieldValue::Leaf(&self.name),
        )
        .with_alternates(&["full_name", "fullName"])]
    }
}

impl ReflectBuild for Person {
    fn new_empty() -> Person {
        Person { name: String::new() }
    }
    fn set_field(&mut self, name: &str, value: Box<dyn Any>) -> Result<(), Error> {
        match name {
            "name" => self.name = *value.downcast::<String>().map_err(|_| Error::from("bad field"))?,
            other => return Err(Error::from(format!("unknown field {}", other))),
        }
        Ok(())
    }
}

#[test]
fn test_alternate_name_is_tried_when_primary_member_absent() {
    let engine = Engine::builder().register_reflect::<Person>().unwrap().build().unwrap();

    let direct: Person = engine.from_json(r#"{"name": "Ada"}"#).unwrap();
    assert_eq!(direct.name, "Ada");

    let via_alternate: Person = engine.from_json(r#"{"full_name": "Grace"}"#).unwrap();
    assert_eq!(via_alternate.name, "Grace");

    // Second alternate still matches when the first is also absent.
    let via_second_alternate: Person = engine.from_json(r#"{"fullName": "Katherine"}"#).unwrap();
    assert_eq!(via_second_alternate.name, "Katherine");
}

#[test]
fn test_alternate_names_do_not_count_as_unknown_members() {
    let mut config = Config::default();
    config.unknown_field_policy = jsonbind::UnknownMemberPolicy::Throw;
    let engine = Engine::builder()
        .config(config)
        .register_reflect::<Person>()
        .unwrap()
        .build()
        .unwrap();

    let person: Person = engine.from_json(r#"{"full_name": "Ada"}"#).unwrap();
    assert_eq!(person.name, "Ada");
}

struct Credentials {
    username: String,
    token: String,
}

impl Reflect for Credentials {
    fn descriptor() -> Descriptor {
        Descriptor::of::<Credentials>("Credentials", Kind::Struct)
    }
    fn fields(&self) -> Vec<FieldView<'_>> {
        let mut token_field = FieldView::new(
            "token",
            Descriptor::of::<String>("String", Kind::Primitive),
            FieldValue::Leaf(&self.token),
        );
        token_field.meta.modifiers = Modifier::Transient as u32;
        vec![
            FieldView::new(
                "username",
                Descriptor::of::<String>("String", Kind::Primitive),
                FieldValue::Leaf(&self.username),
            ),
            token_field,
        ]
    }
}

impl ReflectBuild for Credentials {
    fn new_empty() -> Credentials {
        Credentials {
            username: String::new(),
            token: "default".to_owned(),
        }
    }
    fn set_field(&mut self, name: &str, value: Box<dyn Any>) -> Result<(), Error> {
        match name {
            "username" => self.username = *value.downcast::<String>().map_err(|_| Error::from("bad field"))?,
            "token" => self.token = *value.downcast::<String>().map_err(|_| Error::from("bad field"))?,
            other => return Err(Error::from(format!("unknown field {}", other))),
        }
        Ok(())
    }
}

#[test]
fn test_transient_field_excluded_from_serialized_output() {
    let engine = Engine::builder().register_reflect::<Credentials>().unwrap().build().unwrap();
    let creds = Credentials {
        username: "ada".to_owned(),
        token: "secret".to_owned(),
    };
    let json = engine.to_json(&creds).unwrap();
    assert!(json.contains("\"username\""));
    assert!(!json.contains("\"token\""));
    assert!(!json.contains("secret"));
}

#[test]
fn test_transient_field_ignored_on_deserialize_even_when_present() {
    let engine = Engine::builder().register_reflect::<Credentials>().unwrap().build().unwrap();
    let creds: Credentials = engine
        .from_json(r#"{"username": "ada", "token": "smuggled"}"#)
        .unwrap();
    assert_eq!(creds.username, "ada");
    assert_eq!(creds.token, "default");
}

/// A struct that always points at itself: models the spec's "self-reference
/// rejected with CyclicReference" scenario without needing a heap-allocated
/// cycle.
struct SelfLoop;

impl Reflect for SelfLoop {
    fn descriptor() -> Descriptor {
        Descriptor::of::<SelfLoop>("SelfLoop", Kind::Struct)
    }
    fn fields(&self) -> Vec<FieldView<'_>> {
        vec![FieldView::new(
            "next",
            SelfLoop::descriptor(),
            FieldValue::Reflect(self),
        )]
    }
    fn identity(&self) -> Option<usize> {
        Some(self as *const Self as usize)
    }
}

impl ReflectBuild for SelfLoop {
    fn new_empty() -> SelfLoop {
        SelfLoop
    }
    fn set_field(&mut self, _name: &str, _value: Box<dyn Any>) -> Result<(), Error> {
        Ok(())
    }
}

#[test]
fn test_cyclic_reference_is_rejected() {
    let engine = Engine::builder()
        .register_reflect::<SelfLoop>()
        .unwrap()
        .build()
        .unwrap();
    let err = engine.to_json(&SelfLoop).unwrap_err();
    assert!(matches!(err, Error::CyclicReference { .. }));
}

#[test]
fn test_unknown_member_policy_throws_when_configured() {
    let mut config = Config::default();
    config.unknown_field_policy = jsonbind::UnknownMemberPolicy::Throw;
    let engine = Engine::builder()
        .config(config)
        .register_reflect::<Pair>()
        .unwrap()
        .build()
        .unwrap();

    let err = engine.from_json::<Pair>(r#"{"x": 1, "bogus": true}"#).unwrap_err();
    assert!(matches!(err, Error::UnknownMember { .. }));
}
