use gbid_config::DecomposeMode;
use gbid_domain::line_item::{self, LineItem};

use crate::{GbidService, Result, prompt};

impl GbidService {
	/// Splits a request into line items according to `pipeline.decompose`.
	pub async fn decompose(&self, request: &str) -> Result<Vec<LineItem>> {
		let max_items = self.cfg.pipeline.max_line_items as usize;
		let request = request.trim();

		if self.cfg.pipeline.decompose == DecomposeMode::Off {
			return Ok(vec![LineItem { index: 0, text: request.to_string() }]);
		}
		if is_single_line(request) || self.cfg.pipeline.decompose == DecomposeMode::Local {
			return Ok(line_item::split_line_items(request, max_items));
		}

		let reasoning = &self.cfg.providers.reasoning;
		let prompt = prompt::build_decompose_prompt(request);
		let reply = match self
			.providers
			.reasoning
			.reason(reasoning, &prompt, reasoning.decompose_max_output_tokens)
			.await
		{
			Ok(reply) => reply,
			Err(err) => {
				tracing::warn!(error = %err, "Decomposition request failed. Splitting locally.");

				return Ok(line_item::split_line_items(request, max_items));
			},
		};
		let items = line_item::parse_item_list(&reply, max_items);

		if items.is_empty() {
			tracing::warn!("Decomposition reply had no items. Splitting locally.");

			return Ok(line_item::split_line_items(request, max_items));
		}

		Ok(items)
	}
}

fn is_single_line(request: &str) -> bool {
	!request.contains(['\n', ';'])
}
