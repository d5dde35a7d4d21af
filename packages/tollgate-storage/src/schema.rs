pub fn render_schema(vector_dim: u32) -> String {
	let init = include_str!("../../../sql/init.sql");
	let expanded = expand_includes(init);

	expanded.replace("<VECTOR_DIM>", &vector_dim.to_string())
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"tables/001_catalog_entities.sql" =>
					out.push_str(include_str!("../../../sql/tables/001_catalog_entities.sql")),
				"tables/002_catalog_fields.sql" =>
					out.push_str(include_str!("../../../sql/tables/002_catalog_fields.sql")),
				"tables/003_catalog_operations.sql" =>
					out.push_str(include_str!("../../../sql/tables/003_catalog_operations.sql")),
				"tables/004_knowledge_documents.sql" =>
					out.push_str(include_str!("../../../sql/tables/004_knowledge_documents.sql")),
				"tables/005_embedding_records.sql" =>
					out.push_str(include_str!("../../../sql/tables/005_embedding_records.sql")),
				"tables/006_execution_audit.sql" =>
					out.push_str(include_str!("../../../sql/tables/006_execution_audit.sql")),
				"tables/007_chat_sessions.sql" =>
					out.push_str(include_str!("../../../sql/tables/007_chat_sessions.sql")),
				_ => out.push_str(line),
			}
		} else {
			out.push_str(line);
		}

		out.push('\n');
	}

	out
}
