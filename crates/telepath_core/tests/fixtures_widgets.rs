#![allow(missing_docs)]

use telepath::pack::{Object, TelepathError, Unpacker, Value};
use telepath_testkit::fixture_path;

#[derive(Debug)]
struct TextInput {
	name: String,
	options: Value,
}

#[derive(Debug)]
struct Checkbox {
	name: String,
	label: Value,
}

#[derive(Debug)]
struct Form {
	id: String,
	fields: Value,
	meta: Value,
}

fn string_arg(type_name: &str, args: &[Value], index: usize) -> telepath::pack::Result<String> {
	args.get(index)
		.and_then(Value::as_str)
		.map(str::to_owned)
		.ok_or_else(|| TelepathError::factory(type_name, format!("argument {index} must be a string")))
}

fn form_unpacker() -> Unpacker {
	let mut unpacker = Unpacker::new();
	unpacker.register("TextInput", |args| {
		let name = string_arg("TextInput", &args, 0)?;
		let options = args.get(1).cloned().unwrap_or(Value::Null);
		Ok(Value::Object(Object::new("TextInput", TextInput { name, options })))
	});
	unpacker.register("Checkbox", |args| {
		let name = string_arg("Checkbox", &args, 0)?;
		let label = args.get(1).cloned().unwrap_or(Value::Null);
		Ok(Value::Object(Object::new("Checkbox", Checkbox { name, label })))
	});
	unpacker.register("Form", |mut args| {
		if args.len() != 3 {
			return Err(TelepathError::factory("Form", format!("expected 3 arguments, got {}", args.len())));
		}
		let meta = args.pop().unwrap_or(Value::Null);
		let fields = args.pop().unwrap_or(Value::Null);
		let id = string_arg("Form", &args, 0)?;
		Ok(Value::Object(Object::new("Form", Form { id, fields, meta })))
	});
	unpacker
}

#[test]
fn form_fixture_materializes_typed_objects_with_shared_identity() {
	let unpacker = form_unpacker();
	let value = unpacker.unpack_file(fixture_path("widgets.json")).expect("fixture unpacks");

	let form = value.as_object().and_then(|object| object.downcast_ref::<Form>()).expect("form object");
	assert_eq!(form.id, "signup");

	let fields = form.fields.as_list().expect("fields list");
	assert_eq!(fields.len(), 3);

	let email = fields.get(0).expect("email field");
	let email_input = email.as_object().and_then(|object| object.downcast_ref::<TextInput>()).expect("text input");
	assert_eq!(email_input.name, "email");

	let name = fields.get(1).expect("name field");
	let name_input = name.as_object().and_then(|object| object.downcast_ref::<TextInput>()).expect("text input");
	assert!(
		email_input.options.same_instance(&name_input.options),
		"forward reference and its definition share one dict"
	);
	let options = name_input.options.as_dict().expect("options dict");
	assert_eq!(options.get("_type").as_ref().and_then(Value::as_str), Some("text"));
	assert_eq!(options.get("maxLength").as_ref().and_then(Value::as_i64), Some(80));

	let terms = fields.get(2).expect("terms field");
	let checkbox = terms.as_object().and_then(|object| object.downcast_ref::<Checkbox>()).expect("checkbox");
	assert_eq!(checkbox.name, "terms");

	let meta = form.meta.as_dict().expect("meta dict");
	assert!(meta.get("focus").expect("focus").same_instance(&email));
	assert!(meta.get("fields").expect("fields").same_instance(&form.fields));
	assert_eq!(
		meta.get("footer").as_ref().and_then(Value::as_str),
		checkbox.label.as_str(),
		"verbatim strings resolve to the same text"
	);
	assert_eq!(meta.get("theme").and_then(|theme| theme.as_dict().and_then(|dict| dict.get("dense"))).and_then(|dense| dense.as_bool()), Some(false));
}

#[test]
fn unknown_constructor_in_fixture_fails() {
	let mut unpacker = form_unpacker();
	unpacker.registry_mut().register("Form", |_| Ok(Value::Null));
	let partial = Unpacker::new();

	assert!(matches!(
		partial.unpack_file(fixture_path("widgets.json")),
		Err(TelepathError::UnknownType { name }) if name == "Form"
	));
	assert!(unpacker.unpack_file(fixture_path("widgets.json")).expect("unpacks").is_null());
}

#[test]
fn duplicate_and_dangling_fixtures_fail() {
	let unpacker = Unpacker::new();
	assert!(matches!(
		unpacker.unpack_file(fixture_path("duplicate.json")),
		Err(TelepathError::DuplicateIdentity { id }) if id.0 == 7
	));
	assert!(matches!(
		unpacker.unpack_file(fixture_path("dangling.json")),
		Err(TelepathError::DanglingReference { id }) if id.0 == 12
	));
}
