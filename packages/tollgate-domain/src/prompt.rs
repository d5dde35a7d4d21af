use crate::retrieval::Namespace;

pub const SYSTEM_INSTRUCTION: &str = "You are an assistant operating on a live business object store. \
Ground every answer in the schema, operation, and knowledge context provided below and do not \
invent entities or operations that are not listed there. \
When the user asks for an action, reply with only a JSON object of the form \
{\"tool\": \"orm_call\", \"args\": {\"model\": <entity>, \"method\": <operation>, \
\"domain\": [[<field>, <operator>, <value>], ...], \"values\": {<field>: <value>}}}. \
Otherwise reply in plain text.";

/// One retrieved chunk, already in rank order.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundingChunk {
	pub namespace: Namespace,
	pub text: String,
	pub score: f32,
}

/// The previous exchange of a chained session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorTurn {
	pub question: String,
	pub answer: Option<String>,
}

pub fn compose_prompt(
	question: &str,
	chunks: &[GroundingChunk],
	prior: Option<&PriorTurn>,
) -> String {
	let mut out = String::new();

	out.push_str("System Instructions:\n");
	out.push_str(SYSTEM_INSTRUCTION);
	out.push_str("\n\n");

	for namespace in Namespace::ALL {
		let group = chunks
			.iter()
			.filter(|chunk| chunk.namespace == namespace)
			.map(|chunk| chunk.text.as_str())
			.collect::<Vec<_>>();

		out.push_str(section_title(namespace));
		out.push_str(":\n");
		out.push_str(&group.join("\n\n"));
		out.push_str("\n\n");
	}

	out.push_str("Conversation Context:\n");

	match prior {
		Some(turn) => {
			out.push_str("Last Query: ");
			out.push_str(&turn.question);
			out.push_str("\nLast Response: ");
			out.push_str(turn.answer.as_deref().unwrap_or_default());
		},
		None => out.push_str("(none)"),
	}

	out.push_str("\n\nUser Query:\n");
	out.push_str(question);
	out.push('\n');

	out
}

fn section_title(namespace: Namespace) -> &'static str {
	match namespace {
		Namespace::Schema => "Retrieved Schema",
		Namespace::Operation => "Available Operations",
		Namespace::Knowledge => "Business Context",
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn chunk(namespace: Namespace, text: &str) -> GroundingChunk {
		GroundingChunk { namespace, text: text.to_string(), score: 0.5 }
	}

	#[test]
	fn groups_in_canonical_order_and_keeps_rank_within_group() {
		let chunks = vec![
			chunk(Namespace::Knowledge, "k1"),
			chunk(Namespace::Operation, "o1"),
			chunk(Namespace::Schema, "s1"),
			chunk(Namespace::Knowledge, "k2"),
			chunk(Namespace::Schema, "s2"),
		];
		let prompt = compose_prompt("Confirm INV-1", &chunks, None);
		let schema = prompt.find("Retrieved Schema:\ns1\n\ns2").expect("Schema group.");
		let operations = prompt.find("Available Operations:\no1").expect("Operation group.");
		let knowledge = prompt.find("Business Context:\nk1\n\nk2").expect("Knowledge group.");

		assert!(prompt.starts_with("System Instructions:\n"));
		assert!(schema < operations && operations < knowledge);
		assert!(prompt.ends_with("User Query:\nConfirm INV-1\n"));
	}

	#[test]
	fn includes_prior_turn() {
		let prior = PriorTurn {
			question: "List invoices".to_string(),
			answer: Some("There are two.".to_string()),
		};
		let prompt = compose_prompt("Confirm the first", &[], Some(&prior));

		assert!(prompt.contains("Last Query: List invoices\nLast Response: There are two."));
		assert!(
			prompt.find("Conversation Context").expect("Context.")
				< prompt.find("User Query").expect("Query.")
		);
	}
}
