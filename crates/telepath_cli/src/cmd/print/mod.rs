use telepath::pack::Value;

use crate::cmd::util::{SeenInstances, Visit};

/// Output truncation limits for rendered value trees.
#[derive(Debug, Clone, Copy)]
pub struct PrintOptions {
	/// Maximum number of Unicode scalar values printed for strings.
	pub max_string_len: usize,
	/// Maximum number of items or entries printed per container.
	pub max_items: usize,
	/// Maximum nesting depth before containers are summarized.
	pub max_print_depth: u32,
}

impl Default for PrintOptions {
	fn default() -> Self {
		Self {
			max_string_len: 200,
			max_items: 64,
			max_print_depth: 32,
		}
	}
}

/// Render a live value as an indented tree.
///
/// Shared instances are labeled `#n` on first appearance. Later appearances
/// print `<cycle #n>` when reached from inside the instance itself and
/// `<same as #n>` otherwise.
pub fn render_value(value: &Value, indent: usize, options: PrintOptions) -> String {
	let mut printer = Printer {
		out: String::new(),
		options,
		seen: SeenInstances::default(),
	};
	printer.value(value, indent, "", 0);
	printer.out
}

struct Printer {
	out: String,
	options: PrintOptions,
	seen: SeenInstances,
}

impl Printer {
	fn line(&mut self, indent: usize, text: &str) {
		self.out.push_str(&" ".repeat(indent));
		self.out.push_str(text);
		self.out.push('\n');
	}

	fn value(&mut self, value: &Value, indent: usize, prefix: &str, depth: u32) {
		let Some(addr) = value.instance_addr() else {
			let text = self.primitive(value);
			self.line(indent, &format!("{prefix}{text}"));
			return;
		};

		let label = match self.seen.enter(addr) {
			Visit::Cycle(label) => {
				self.line(indent, &format!("{prefix}<cycle #{label}>"));
				return;
			}
			Visit::Repeat(label) => {
				self.line(indent, &format!("{prefix}<same as #{label}>"));
				return;
			}
			Visit::First(label) => label,
		};

		let truncated = depth >= self.options.max_print_depth;
		match value {
			Value::List(list) => {
				let items = list.items();
				if items.is_empty() {
					self.line(indent, &format!("{prefix}list #{label} []"));
				} else if truncated {
					self.line(indent, &format!("{prefix}list #{label} [... {} items]", items.len()));
				} else {
					self.line(indent, &format!("{prefix}list #{label} ["));
					for item in items.iter().take(self.options.max_items) {
						self.value(item, indent + 2, "", depth + 1);
					}
					self.more(indent, items.len());
					self.line(indent, "]");
				}
			}
			Value::Dict(dict) => {
				let entries = dict.entries();
				if entries.is_empty() {
					self.line(indent, &format!("{prefix}dict #{label} {{}}"));
				} else if truncated {
					self.line(indent, &format!("{prefix}dict #{label} {{ ... {} entries }}", entries.len()));
				} else {
					self.line(indent, &format!("{prefix}dict #{label} {{"));
					for (key, item) in entries.iter().take(self.options.max_items) {
						self.value(item, indent + 2, &format!("{key} = "), depth + 1);
					}
					self.more(indent, entries.len());
					self.line(indent, "}");
				}
			}
			Value::Object(object) => match object.as_record() {
				None => self.line(indent, &format!("{prefix}{} #{label} <opaque>", object.type_name())),
				Some(record) if record.args.is_empty() => self.line(indent, &format!("{prefix}{} #{label} ()", object.type_name())),
				Some(_) if truncated => self.line(indent, &format!("{prefix}{} #{label} ( ... )", object.type_name())),
				Some(record) => {
					self.line(indent, &format!("{prefix}{} #{label} (", object.type_name()));
					for item in record.args.iter().take(self.options.max_items) {
						self.value(item, indent + 2, "", depth + 1);
					}
					self.more(indent, record.args.len());
					self.line(indent, ")");
				}
			},
			_ => {}
		}

		self.seen.leave(addr);
	}

	fn more(&mut self, indent: usize, total: usize) {
		if total > self.options.max_items {
			self.line(indent + 2, &format!("... {} more", total - self.options.max_items));
		}
	}

	fn primitive(&self, value: &Value) -> String {
		match value {
			Value::Bool(v) => v.to_string(),
			Value::Number(v) => v.to_string(),
			Value::String(v) => format!("{:?}", truncate(v, self.options.max_string_len)),
			_ => "null".to_owned(),
		}
	}
}

fn truncate(value: &str, max_len: usize) -> String {
	if value.chars().count() <= max_len {
		return value.to_owned();
	}
	let mut out: String = value.chars().take(max_len).collect();
	out.push_str("...");
	out
}
