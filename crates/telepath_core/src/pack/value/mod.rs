use std::any::Any;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::{Map, Number, Value as Json};

use crate::pack::{Result, TelepathError};

/// Materialized runtime value.
///
/// Containers and objects are shared handles: cloning a [`Value`] clones the
/// handle, never the contents, so identity survives any number of references.
#[derive(Clone)]
pub enum Value {
	/// JSON `null`.
	Null,
	/// Boolean.
	Bool(bool),
	/// Number, kept in its JSON representation.
	Number(Number),
	/// Immutable string.
	String(Rc<str>),
	/// Shared mutable sequence.
	List(List),
	/// Shared mutable string-keyed mapping.
	Dict(Dict),
	/// Shared constructor-produced instance.
	Object(Object),
}

type ListCell = RefCell<Vec<Slot>>;
type DictCell = RefCell<BTreeMap<Box<str>, Slot>>;

/// Shared handle to a mutable sequence.
#[derive(Clone, Default)]
pub struct List(Rc<ListCell>);

/// Shared handle to a mutable mapping.
#[derive(Clone, Default)]
pub struct Dict(Rc<DictCell>);

/// Storage for one container element.
///
/// Edges that point back at a container still under construction are held
/// weakly, so the strong handles of an unpacked graph never form a cycle and
/// dropping the root frees every instance.
#[derive(Clone)]
enum Slot {
	Owned(Value),
	Back(BackEdge),
}

#[derive(Clone)]
enum BackEdge {
	List(Weak<ListCell>),
	Dict(Weak<DictCell>),
}

impl Slot {
	fn back_edge(target: &Value) -> Self {
		match target {
			Value::List(list) => Self::Back(BackEdge::List(Rc::downgrade(&list.0))),
			Value::Dict(dict) => Self::Back(BackEdge::Dict(Rc::downgrade(&dict.0))),
			other => Self::Owned(other.clone()),
		}
	}

	/// Resolve to a value; a back edge whose target was dropped reads as `null`.
	fn load(&self) -> Value {
		match self {
			Self::Owned(value) => value.clone(),
			Self::Back(BackEdge::List(weak)) => weak.upgrade().map(|cell| Value::List(List(cell))).unwrap_or(Value::Null),
			Self::Back(BackEdge::Dict(weak)) => weak.upgrade().map(|cell| Value::Dict(Dict(cell))).unwrap_or(Value::Null),
		}
	}

	fn is_back_edge(&self) -> bool {
		matches!(self, Self::Back(_))
	}
}

/// Shared handle to a type-erased instance tagged with its registry name.
#[derive(Clone)]
pub struct Object {
	type_name: Rc<str>,
	data: Rc<dyn Any>,
}

/// Generic object payload keeping the constructor name and its arguments.
#[derive(Clone)]
pub struct Record {
	/// Registry name the record was built for.
	pub type_name: Rc<str>,
	/// Materialized constructor arguments.
	pub args: Vec<Value>,
}

impl List {
	/// Create an empty sequence.
	pub fn new() -> Self {
		Self::default()
	}

	/// Create an empty sequence with room for `capacity` elements.
	pub fn with_capacity(capacity: usize) -> Self {
		Self(Rc::new(RefCell::new(Vec::with_capacity(capacity))))
	}

	/// Append one element.
	pub fn push(&self, value: Value) {
		self.0.borrow_mut().push(Slot::Owned(value));
	}

	/// Append a non-owning edge to `target`.
	pub(crate) fn push_back_edge(&self, target: &Value) {
		self.0.borrow_mut().push(Slot::back_edge(target));
	}

	/// Return a handle to the element at `index`.
	///
	/// A back edge whose target no longer exists reads as `null`.
	pub fn get(&self, index: usize) -> Option<Value> {
		self.0.borrow().get(index).map(Slot::load)
	}

	/// Return handles to all elements in order.
	pub fn items(&self) -> Vec<Value> {
		self.0.borrow().iter().map(Slot::load).collect()
	}

	/// Return whether the element at `index` is a non-owning back edge.
	pub fn is_back_edge(&self, index: usize) -> bool {
		self.0.borrow().get(index).is_some_and(Slot::is_back_edge)
	}

	/// Return number of elements.
	pub fn len(&self) -> usize {
		self.0.borrow().len()
	}

	/// Return whether the sequence is empty.
	pub fn is_empty(&self) -> bool {
		self.0.borrow().is_empty()
	}

	/// Drop all elements.
	pub fn clear(&self) {
		self.0.borrow_mut().clear();
	}

	/// Return whether both handles point at the same sequence.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}

	fn addr(&self) -> usize {
		Rc::as_ptr(&self.0) as *const () as usize
	}
}

impl Dict {
	/// Create an empty mapping.
	pub fn new() -> Self {
		Self::default()
	}

	/// Insert or replace one entry, returning the previous value.
	pub fn insert(&self, key: impl Into<Box<str>>, value: Value) -> Option<Value> {
		self.0.borrow_mut().insert(key.into(), Slot::Owned(value)).map(|slot| slot.load())
	}

	/// Insert a non-owning edge to `target` under `key`.
	pub(crate) fn insert_back_edge(&self, key: impl Into<Box<str>>, target: &Value) {
		self.0.borrow_mut().insert(key.into(), Slot::back_edge(target));
	}

	/// Return a handle to the value stored under `key`.
	///
	/// A back edge whose target no longer exists reads as `null`.
	pub fn get(&self, key: &str) -> Option<Value> {
		self.0.borrow().get(key).map(Slot::load)
	}

	/// Return handles to all entries in key order.
	pub fn entries(&self) -> Vec<(Box<str>, Value)> {
		self.0.borrow().iter().map(|(key, slot)| (key.clone(), slot.load())).collect()
	}

	/// Return whether the entry under `key` is a non-owning back edge.
	pub fn is_back_edge(&self, key: &str) -> bool {
		self.0.borrow().get(key).is_some_and(Slot::is_back_edge)
	}

	/// Return number of entries.
	pub fn len(&self) -> usize {
		self.0.borrow().len()
	}

	/// Return whether the mapping is empty.
	pub fn is_empty(&self) -> bool {
		self.0.borrow().is_empty()
	}

	/// Drop all entries.
	pub fn clear(&self) {
		self.0.borrow_mut().clear();
	}

	/// Return whether both handles point at the same mapping.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}

	fn addr(&self) -> usize {
		Rc::as_ptr(&self.0) as *const () as usize
	}
}

impl Object {
	/// Wrap `data` as an instance of `type_name`.
	pub fn new<T: Any>(type_name: impl Into<Rc<str>>, data: T) -> Self {
		Self {
			type_name: type_name.into(),
			data: Rc::new(data),
		}
	}

	/// Return the registry name this instance was built for.
	pub fn type_name(&self) -> &str {
		&self.type_name
	}

	/// Borrow the payload as `T` when it has that concrete type.
	pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
		self.data.downcast_ref::<T>()
	}

	/// Borrow the payload as a [`Record`], if it is one.
	pub fn as_record(&self) -> Option<&Record> {
		self.downcast_ref::<Record>()
	}

	/// Return whether both handles point at the same instance.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.data, &other.data)
	}

	fn addr(&self) -> usize {
		Rc::as_ptr(&self.data) as *const () as usize
	}
}

impl Record {
	/// Wrap a record as an [`Object`] value.
	pub fn into_value(self) -> Value {
		let type_name = self.type_name.clone();
		Value::Object(Object::new(type_name, self))
	}
}

impl Value {
	/// Convert plain JSON into fresh, unshared live data.
	pub fn from_json(raw: &Json) -> Self {
		match raw {
			Json::Null => Self::Null,
			Json::Bool(value) => Self::Bool(*value),
			Json::Number(value) => Self::Number(value.clone()),
			Json::String(value) => Self::String(value.as_str().into()),
			Json::Array(items) => {
				let list = List::with_capacity(items.len());
				for item in items {
					list.push(Self::from_json(item));
				}
				Self::List(list)
			}
			Json::Object(map) => {
				let dict = Dict::new();
				for (key, value) in map {
					dict.insert(key.as_str(), Self::from_json(value));
				}
				Self::Dict(dict)
			}
		}
	}

	/// Render this value as plain JSON.
	///
	/// [`Record`] objects render as `{"_type": .., "_args": [..]}`; any other
	/// object and any cycle make the conversion fail.
	pub fn to_json(&self) -> Result<Json> {
		to_json_impl(self, &mut Vec::new())
	}

	/// Return a stable label for the value kind.
	pub fn kind(&self) -> &'static str {
		match self {
			Self::Null => "null",
			Self::Bool(_) => "bool",
			Self::Number(_) => "number",
			Self::String(_) => "string",
			Self::List(_) => "list",
			Self::Dict(_) => "dict",
			Self::Object(_) => "object",
		}
	}

	/// Return whether both values are handles to one shared container or object.
	///
	/// Primitives have no identity and never compare as the same instance.
	pub fn same_instance(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::List(a), Self::List(b)) => a.ptr_eq(b),
			(Self::Dict(a), Self::Dict(b)) => a.ptr_eq(b),
			(Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
			_ => false,
		}
	}

	/// Return an address identifying the shared instance behind this handle.
	pub fn instance_addr(&self) -> Option<usize> {
		match self {
			Self::List(item) => Some(item.addr()),
			Self::Dict(item) => Some(item.addr()),
			Self::Object(item) => Some(item.addr()),
			_ => None,
		}
	}

	/// Return whether this is `null`.
	pub fn is_null(&self) -> bool {
		matches!(self, Self::Null)
	}

	/// Return the boolean payload.
	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Self::Bool(value) => Some(*value),
			_ => None,
		}
	}

	/// Return the number as `i64` when representable.
	pub fn as_i64(&self) -> Option<i64> {
		match self {
			Self::Number(value) => value.as_i64(),
			_ => None,
		}
	}

	/// Return the number as `f64`.
	pub fn as_f64(&self) -> Option<f64> {
		match self {
			Self::Number(value) => value.as_f64(),
			_ => None,
		}
	}

	/// Return the string payload.
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::String(value) => Some(value),
			_ => None,
		}
	}

	/// Return the sequence handle.
	pub fn as_list(&self) -> Option<&List> {
		match self {
			Self::List(item) => Some(item),
			_ => None,
		}
	}

	/// Return the mapping handle.
	pub fn as_dict(&self) -> Option<&Dict> {
		match self {
			Self::Dict(item) => Some(item),
			_ => None,
		}
	}

	/// Return the object handle.
	pub fn as_object(&self) -> Option<&Object> {
		match self {
			Self::Object(item) => Some(item),
			_ => None,
		}
	}
}

fn to_json_impl(value: &Value, active: &mut Vec<usize>) -> Result<Json> {
	if let Some(addr) = value.instance_addr() {
		if active.contains(&addr) {
			return Err(TelepathError::CyclicValue);
		}
		active.push(addr);
	}

	let out = match value {
		Value::Null => Json::Null,
		Value::Bool(value) => Json::Bool(*value),
		Value::Number(value) => Json::Number(value.clone()),
		Value::String(value) => Json::String(value.to_string()),
		Value::List(list) => {
			let items = list.items();
			let mut out = Vec::with_capacity(items.len());
			for item in items.iter() {
				out.push(to_json_impl(item, active)?);
			}
			Json::Array(out)
		}
		Value::Dict(dict) => {
			let mut out = Map::new();
			for (key, item) in dict.entries() {
				out.insert(key.into_string(), to_json_impl(&item, active)?);
			}
			Json::Object(out)
		}
		Value::Object(object) => {
			let Some(record) = object.as_record() else {
				return Err(TelepathError::UnsupportedObject {
					type_name: object.type_name().to_owned(),
				});
			};
			let mut args = Vec::with_capacity(record.args.len());
			for arg in &record.args {
				args.push(to_json_impl(arg, active)?);
			}
			let mut out = Map::new();
			out.insert("_type".to_owned(), Json::String(record.type_name.to_string()));
			out.insert("_args".to_owned(), Json::Array(args));
			Json::Object(out)
		}
	};

	if value.instance_addr().is_some() {
		active.pop();
	}
	Ok(out)
}

/// Cycle-safe debug view sharing one stack of instances being printed.
struct Guarded<'a> {
	value: &'a Value,
	active: &'a RefCell<Vec<usize>>,
}

impl fmt::Debug for Guarded<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if let Some(addr) = self.value.instance_addr() {
			if self.active.borrow().contains(&addr) {
				return f.write_str("<cycle>");
			}
			self.active.borrow_mut().push(addr);
		}

		let active = self.active;
		let result = match self.value {
			Value::Null => f.write_str("null"),
			Value::Bool(value) => write!(f, "{value}"),
			Value::Number(value) => write!(f, "{value}"),
			Value::String(value) => write!(f, "{value:?}"),
			Value::List(list) => {
				let items = list.items();
				f.debug_list().entries(items.iter().map(|value| Guarded { value, active })).finish()
			}
			Value::Dict(dict) => {
				let entries = dict.entries();
				f.debug_map()
					.entries(entries.iter().map(|(key, value)| (key, Guarded { value, active })))
					.finish()
			}
			Value::Object(object) => match object.as_record() {
				Some(record) => {
					let mut tuple = f.debug_tuple(&record.type_name);
					for value in &record.args {
						tuple.field(&Guarded { value, active });
					}
					tuple.finish()
				}
				None => write!(f, "{} {{ .. }}", object.type_name()),
			},
		};

		if self.value.instance_addr().is_some() {
			self.active.borrow_mut().pop();
		}
		result
	}
}

impl fmt::Debug for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let active = RefCell::new(Vec::new());
		fmt::Debug::fmt(&Guarded { value: self, active: &active }, f)
	}
}

impl fmt::Debug for List {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Debug::fmt(&Value::List(self.clone()), f)
	}
}

impl fmt::Debug for Dict {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Debug::fmt(&Value::Dict(self.clone()), f)
	}
}

impl fmt::Debug for Object {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Debug::fmt(&Value::Object(self.clone()), f)
	}
}

impl fmt::Debug for Record {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let active = RefCell::new(Vec::new());
		let mut tuple = f.debug_tuple(&self.type_name);
		for value in &self.args {
			tuple.field(&Guarded { value, active: &active });
		}
		tuple.finish()
	}
}

impl From<bool> for Value {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}

impl From<i64> for Value {
	fn from(value: i64) -> Self {
		Self::Number(value.into())
	}
}

impl From<f64> for Value {
	fn from(value: f64) -> Self {
		Number::from_f64(value).map(Self::Number).unwrap_or(Self::Null)
	}
}

impl From<&str> for Value {
	fn from(value: &str) -> Self {
		Self::String(value.into())
	}
}

impl From<String> for Value {
	fn from(value: String) -> Self {
		Self::String(value.into())
	}
}

impl From<List> for Value {
	fn from(value: List) -> Self {
		Self::List(value)
	}
}

impl From<Dict> for Value {
	fn from(value: Dict) -> Self {
		Self::Dict(value)
	}
}

impl From<Object> for Value {
	fn from(value: Object) -> Self {
		Self::Object(value)
	}
}
