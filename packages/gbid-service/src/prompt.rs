use std::fmt::Write as _;

use gbid_domain::line_item::LineItem;

use crate::convert::Suggestion;

const CONVERT_RULES: &str = "\
Rules:
- Footage = qty (200' = 200).
- Cuts or rolls x length = total qty (3 cuts x 100' = 300).
- Boxes, cases and cartons x the per-container count in Properties.
- Check alternate names and special notes before giving up.
- When the code is TEMPLATE or a template is given, fill it with the requested sizes and \
values and end it with *.
- Output format: one line per requested item, CODE<TAB>QTY, in request order.
- If not found: {no_bid}<TAB>1.
- After the list you may add short notes; never put notes between list lines.";

pub fn build_decompose_prompt(request: &str) -> String {
	format!(
		"Split this material request into separate line items. Keep each item's quantity, \
size and description together, and do not add or drop items.\n\
Reply with a JSON array of strings only.\n\nRequest:\n{request}"
	)
}

/// Final prompt: the request, its line items, the projected candidate table and the
/// deterministic suggestions the reasoning step should confirm or correct.
pub fn build_convert_prompt(
	request: &str,
	items: &[LineItem],
	table: &str,
	suggestions: &[Suggestion],
	no_bid_code: &str,
) -> String {
	let mut out = String::with_capacity(table.len() + request.len() + 1_024);

	out.push_str("Convert this material request into catalog codes and quantities.\n\n");
	out.push_str("Request:\n");
	out.push_str(request.trim());
	out.push_str("\n\nLine items:\n");

	for item in items {
		let _ = writeln!(out, "{}. {}", item.index + 1, item.text);
	}

	out.push_str("\nCandidate catalog records (CSV):\n");
	out.push_str(table);
	out.push_str("\n\nPre-resolved suggestions (item => CODE<TAB>QTY):\n");

	for suggestion in suggestions {
		let _ = writeln!(out, "{} => {}", suggestion.item, suggestion.line.render());
	}

	out.push('\n');
	out.push_str(&CONVERT_RULES.replace("{no_bid}", no_bid_code));
	out.push_str("\n\nReply with the final list only, followed by any notes.");

	out
}
