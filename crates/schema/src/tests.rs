use std::collections::BTreeMap;

use pretty_assertions::assert_eq;
use serde_json::json;

use super::*;

#[derive(Debug, Clone, PartialEq)]
enum Shape {
	Point,
	Circle { radius: i64 },
	Label(String),
}

fn shape() -> impl Schema<Output = Shape> {
	tagged("Shape", &["Point", "Circle", "Label"], |v| match v.tag() {
		"Point" => v.unit().map(|()| Shape::Point),
		"Circle" => v.fields(|f| {
			Ok(Shape::Circle {
				radius: f.required("radius", &integer())?,
			})
		}),
		"Label" => v.content(&string()).map(Shape::Label),
		_ => Err(v.unknown()),
	})
}

#[derive(Debug, Clone, PartialEq)]
struct Entry {
	name: String,
	tags: Vec<String>,
	note: Option<String>,
}

fn entry() -> impl Schema<Output = Entry> {
	record("Entry", |f| {
		Ok(Entry {
			name: f.required("name", &string())?,
			tags: f.or_default("tags", &list(string()))?,
			note: f.optional("note", &string())?,
		})
	})
}

#[test]
fn test_primitives_accept_matching_kinds() {
	assert_eq!(string().parse(&json!("ipa")).unwrap(), "ipa");
	assert!(boolean().parse(&json!(true)).unwrap());
	assert_eq!(integer().parse(&json!(-4)).unwrap(), -4);
	assert_eq!(unsigned().parse(&json!(4)).unwrap(), 4);
	assert_eq!(number().parse(&json!(1.5)).unwrap(), 1.5);
	unit().parse(&json!(null)).unwrap();
	assert_eq!(any().parse(&json!({"x": [1]})).unwrap(), json!({"x": [1]}));
}

#[test]
fn test_primitives_never_coerce() {
	let err = integer().parse(&json!("1")).unwrap_err();
	assert_eq!(err.found, "string");
	assert_eq!(err.expected, "integer");

	assert_eq!(integer().parse(&json!(1.0)).unwrap_err().found, "number");
	assert_eq!(string().parse(&json!(null)).unwrap_err().found, "null");
	assert_eq!(boolean().parse(&json!(0)).unwrap_err().found, "integer");
	assert_eq!(unit().parse(&json!("")).unwrap_err().found, "string");
	assert_eq!(unsigned().parse(&json!(-1)).unwrap_err().found, "negative integer");
}

#[test]
fn test_list_reports_element_index() {
	let schema = list(string());
	assert_eq!(schema.parse(&json!(["alpha", "beta"])).unwrap(), vec!["alpha".to_string(), "beta".to_string()]);

	let err = schema.parse(&json!(["alpha", 2])).unwrap_err();
	assert_eq!(err.path.to_string(), "$[1]");
	assert_eq!(err.to_string(), "at $[1]: expected string, found integer");

	assert_eq!(schema.parse(&json!({"0": "alpha"})).unwrap_err().expected, "list<string>");
}

#[test]
fn test_dict_reports_member_key() {
	let schema = dict(integer());
	let parsed = schema.parse(&json!({"a": 1, "b c": 2})).unwrap();
	assert_eq!(parsed, BTreeMap::from([("a".to_string(), 1), ("b c".to_string(), 2)]));

	let err = schema.parse(&json!({"b c": "two"})).unwrap_err();
	assert_eq!(err.path.to_string(), r#"$["b c"]"#);
}

#[test]
fn test_optional_and_pair() {
	assert_eq!(optional(string()).parse(&json!(null)).unwrap(), None);
	assert_eq!(optional(string()).parse(&json!("x")).unwrap(), Some("x".to_string()));

	let schema = pair(string(), boolean());
	assert_eq!(schema.parse(&json!(["id", false])).unwrap(), ("id".to_string(), false));
	assert_eq!(schema.parse(&json!(["id"])).unwrap_err().found, "array of length 1");
	assert_eq!(schema.parse(&json!(["id", "no"])).unwrap_err().path.to_string(), "$[1]");
}

#[test]
fn test_record_required_optional_and_defaults() {
	let parsed = entry().parse(&json!({"name": "foo", "extra": 1})).unwrap();
	assert_eq!(
		parsed,
		Entry {
			name: "foo".into(),
			tags: vec![],
			note: None,
		}
	);

	let err = entry().parse(&json!({"tags": []})).unwrap_err();
	assert_eq!(err.path.to_string(), "$.name");
	assert_eq!(err.found, "missing");

	let err = entry().parse(&json!({"name": "foo", "tags": ["a", null]})).unwrap_err();
	assert_eq!(err.path.to_string(), "$.tags[1]");

	let err = entry().parse(&json!(["foo"])).unwrap_err();
	assert_eq!(err.expected, "Entry (object)");
	assert_eq!(err.found, "array");
}

#[test]
fn test_tagged_union_variants() {
	assert_eq!(shape().parse(&json!("Point")).unwrap(), Shape::Point);
	assert_eq!(shape().parse(&json!({"Point": null})).unwrap(), Shape::Point);
	assert_eq!(shape().parse(&json!({"Circle": {"radius": 3}})).unwrap(), Shape::Circle { radius: 3 });
	assert_eq!(shape().parse(&json!({"Label": "x"})).unwrap(), Shape::Label("x".into()));
}

#[test]
fn test_tagged_union_rejects_bad_tags_and_payloads() {
	let err = shape().parse(&json!("Square")).unwrap_err();
	assert_eq!(err.found, r#"tag "Square""#);
	assert_eq!(err.expected, "Shape (Point | Circle | Label)");

	let err = shape().parse(&json!({"Circle": {"radius": "3"}})).unwrap_err();
	assert_eq!(err.path.to_string(), "$.Circle.radius");

	let err = shape().parse(&json!({"Circle": {}, "Point": null})).unwrap_err();
	assert_eq!(err.found, "object with 2 members");

	let err = shape().parse(&json!("Circle")).unwrap_err();
	assert_eq!(err.found, "missing");

	assert!(shape().parse(&json!({"Point": 1})).is_err());
}

#[test]
fn test_one_of_and_map() {
	let mode = one_of("Mode", &[("light", false), ("dark", true)]);
	assert!(mode.parse(&json!("dark")).unwrap());
	let err = mode.parse(&json!("dim")).unwrap_err();
	assert_eq!(err.to_string(), r#"at $: expected Mode (light | dark), found string "dim""#);

	let even = map(integer(), |n: i64| if n % 2 == 0 { Ok(n) } else { Err(format!("odd integer {n}")) });
	assert_eq!(even.parse(&json!(4)).unwrap(), 4);
	assert_eq!(even.parse(&json!(3)).unwrap_err().found, "odd integer 3");
}

#[test]
fn test_shared_schema_is_object_safe() {
	let erased: SharedSchema<Vec<Shape>> = shared(list(shape()));
	let parsed = erased.parse(&json!(["Point", {"Label": "a"}])).unwrap();
	assert_eq!(parsed, vec![Shape::Point, Shape::Label("a".into())]);
}

#[test]
fn test_value_path_display() {
	let path = ValuePath::root().field("phonemes").field("a b").index(2).field("_x1");
	assert_eq!(path.to_string(), r#"$.phonemes["a b"][2]._x1"#);
	assert!(ValuePath::root().is_root());
	assert_eq!(path.segments().len(), 4);
}
