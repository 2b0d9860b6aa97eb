use std::path::PathBuf;

use telepath::pack::{PackedFile, Result, UnpackOptions};

use crate::cmd::util::emit_json;

/// Scan a packed document and print its identity table.
pub fn run(path: PathBuf, json: bool) -> Result<()> {
	let file = PackedFile::open(&path)?;
	let table = file.scan(&UnpackOptions::default())?;

	let rows: Vec<IdRowJson> = table
		.entries()
		.into_iter()
		.map(|(id, node)| IdRowJson {
			id: id.0,
			kind: node.kind(),
			type_name: node.type_name().map(str::to_owned),
		})
		.collect();

	if json {
		let payload = IdsJson {
			path: path.display().to_string(),
			compression: file.compression.as_str(),
			visited: table.visited(),
			ids: rows,
		};
		return emit_json(&payload);
	}

	println!("path: {}", path.display());
	println!("ids: {}", rows.len());
	println!("visited: {}", table.visited());
	println!("id\tkind\ttype");
	for row in rows {
		println!("{}\t{}\t{}", row.id, row.kind, row.type_name.as_deref().unwrap_or("-"));
	}

	Ok(())
}

#[derive(serde::Serialize)]
struct IdsJson {
	path: String,
	compression: &'static str,
	visited: usize,
	ids: Vec<IdRowJson>,
}

#[derive(serde::Serialize)]
struct IdRowJson {
	id: u32,
	kind: &'static str,
	type_name: Option<String>,
}
