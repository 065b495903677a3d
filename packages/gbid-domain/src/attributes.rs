use std::sync::LazyLock;

use regex::Regex;

use crate::{line_item, quantity};

static SIZE_TOKENS: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?i)(\d+(?:\s*[x×]\s*\d+)+)|(\d+-\d+/\d+)|(\d+/\d+)|(\d+(?:\.\d+)?)")
		.expect("size pattern must compile")
});
static DIMENSION_SEPARATOR: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)\s*[x×]\s*").expect("separator pattern must compile"));

const COLORS: [&str; 14] = [
	"BLACK", "WHITE", "RED", "GREEN", "BLUE", "YELLOW", "ORANGE", "BROWN", "GRAY", "GREY",
	"PURPLE", "PINK", "VIOLET", "TAN",
];

/// Values a line item asks for, used to fill code templates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestedAttributes {
	/// Size and dimension tokens in order of appearance (`3/4`, `8`, `1-1/2`).
	pub sizes: Vec<String>,
	/// Upper-cased descriptive words in order of appearance.
	pub words: Vec<String>,
}
impl RequestedAttributes {
	/// Reads attributes from item text after removing the quantity phrase.
	pub fn from_text(text: &str) -> Self {
		let described = quantity::strip_quantity(text);
		let mut sizes = Vec::new();

		for caps in SIZE_TOKENS.captures_iter(&described) {
			if let Some(dimensions) = caps.get(1) {
				sizes.extend(
					DIMENSION_SEPARATOR
						.split(dimensions.as_str())
						.filter(|part| !part.is_empty())
						.map(str::to_string),
				);
			} else if let Some(token) = caps.get(0) {
				sizes.push(token.as_str().to_string());
			}
		}

		let words = line_item::descriptive_words(&described)
			.into_iter()
			.map(|word| word.to_uppercase())
			.collect();

		Self { sizes, words }
	}

	pub fn color(&self) -> Option<&str> {
		self.words.iter().map(String::as_str).find(|word| COLORS.contains(word))
	}

	/// Value for a named, non-size placeholder such as `COLOR`.
	pub fn named(&self, placeholder: &str) -> Option<&str> {
		match placeholder {
			"COLOR" | "COLOUR" => self.color(),
			_ => None,
		}
	}
}
