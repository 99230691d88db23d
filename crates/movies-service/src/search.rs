use movies_core::{MovieSearchResult, map_search_row};
use movies_store::{QueryGateway, named_params, queries};

use crate::{MovieError, MovieService};

/// Drops at most one leading and one trailing `*`; the full-text match
/// already wildcards every term.
pub fn strip_wildcards(raw: &str) -> &str {
    let trimmed = raw.strip_prefix('*').unwrap_or(raw);
    trimmed.strip_suffix('*').unwrap_or(trimmed)
}

impl<G: QueryGateway> MovieService<G> {
    pub fn search_by_title(&self, raw_query: &str) -> Result<Vec<MovieSearchResult>, MovieError> {
        let Some(expression) = queries::full_text_expression(strip_wildcards(raw_query)) else {
            return Ok(Vec::new());
        };

        let rows = self.gateway().run_query(
            queries::SEARCH_MOVIES,
            named_params! { ":query": expression },
        )?;
        let results = rows
            .iter()
            .map(map_search_row)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(query = raw_query, hits = results.len(), "movie search");
        Ok(results)
    }
}
