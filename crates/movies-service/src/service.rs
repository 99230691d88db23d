use movies_core::{
    DEFAULT_SORT_FIELD, GraphProjection, GraphProjector, Movie, MovieDetails, MovieKey, MoviePage,
    SortField, map_graph_row, map_movie_details_row, map_movie_row, map_search_row,
};
use movies_store::{QueryGateway, key_param, named_params, queries};
use serde::{Deserialize, Serialize};

use crate::MovieError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub title: String,
    pub sort: Option<String>,
    pub page_size: u32,
    pub current_page: u32,
}

/// Movie operations over a [`QueryGateway`]. Holds no state between calls.
#[derive(Debug, Clone)]
pub struct MovieService<G> {
    gateway: G,
}

impl<G: QueryGateway> MovieService<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn fetch_details_by_title(&self, title: &str) -> Result<MovieDetails, MovieError> {
        let rows = self
            .gateway
            .run_query(queries::MOVIE_DETAILS, named_params! { ":title": title })?;
        let row = rows
            .first()
            .ok_or_else(|| MovieError::NotFound(format!("movie with title '{title}'")))?;

        Ok(map_movie_details_row(row)?)
    }

    /// Adds one vote server-side. Returns the number of properties set, which
    /// is 0 when no movie has this title.
    pub fn vote_in_movie_by_title(&self, title: &str) -> Result<u64, MovieError> {
        let summary = self
            .gateway
            .run_write(queries::VOTE_BY_TITLE, named_params! { ":title": title })?;

        let applied = summary.rows_affected as u64;
        if applied == 0 {
            tracing::debug!(title, "vote matched no movie");
        } else {
            tracing::info!(title, applied, "vote recorded");
        }
        Ok(applied)
    }

    /// Loads the movie, sets `released`, and writes it back. Not atomic with
    /// the lookup: concurrent updates race and the last writer wins.
    pub fn update_released(&self, key: &MovieKey, released: Option<i64>) -> Result<(), MovieError> {
        let released = released
            .ok_or_else(|| MovieError::Validation("released year is required".to_owned()))?;

        let mut movie = self.load_movie(key)?;
        movie.released = Some(released);

        let summary = self.gateway.run_write(
            queries::UPDATE_RELEASED,
            named_params! { ":released": movie.released, ":id": movie.id },
        )?;
        if summary.rows_affected == 0 {
            tracing::warn!(%key, "movie disappeared before released year was written");
        } else {
            tracing::info!(%key, released, "released year updated");
        }

        Ok(())
    }

    /// Checks existence, then deletes the movie with its relationships.
    pub fn delete_by_key(&self, key: &MovieKey) -> Result<(), MovieError> {
        if !self.exists(key)? {
            return Err(MovieError::NotFound(format!("movie with {key}")));
        }

        let summary = self.gateway.run_write(
            queries::delete_movie(key),
            named_params! { ":key": key_param(key) },
        )?;
        tracing::info!(%key, deleted = summary.rows_affected, "movie deleted");

        Ok(())
    }

    pub fn query_page(&self, request: &PageRequest) -> Result<MoviePage, MovieError> {
        let sort = parse_sort(request.sort.as_deref())?;
        if request.page_size == 0 {
            return Err(MovieError::Validation(
                "page size must be at least 1".to_owned(),
            ));
        }

        let limit = i64::from(request.page_size);
        let skip = i64::from(request.current_page)
            .checked_mul(limit)
            .ok_or_else(|| MovieError::Validation("page offset out of range".to_owned()))?;
        let title = request.title.as_str();

        let rows = self.gateway.run_query(
            &queries::movie_page(sort),
            named_params! { ":title": title, ":limit": limit, ":skip": skip },
        )?;
        let content = rows
            .iter()
            .map(map_search_row)
            .collect::<Result<Vec<_>, _>>()?;

        let counted = self
            .gateway
            .run_query(&queries::movie_count(), named_params! { ":title": title })?;
        let total = match counted.first() {
            Some(row) => row.i64("total")?,
            None => 0,
        };

        Ok(MoviePage::new(
            content,
            request.page_size,
            request.current_page,
            total.max(0) as u64,
            sort,
        ))
    }

    pub fn fetch_graph(&self) -> Result<GraphProjection, MovieError> {
        let rows = self
            .gateway
            .run_query(queries::ACTED_IN_GRAPH, named_params! {})?;

        let mut projector = GraphProjector::new();
        for row in &rows {
            projector.push(map_graph_row(row)?);
        }
        let graph = projector.finish();

        tracing::debug!(
            nodes = graph.nodes.len(),
            links = graph.links.len(),
            "graph projected"
        );
        Ok(graph)
    }

    fn load_movie(&self, key: &MovieKey) -> Result<Movie, MovieError> {
        let rows = self.gateway.run_query(
            queries::movie_by_key(key),
            named_params! { ":key": key_param(key) },
        )?;
        let row = rows
            .first()
            .ok_or_else(|| MovieError::NotFound(format!("movie with {key}")))?;

        Ok(map_movie_row(row)?)
    }

    fn exists(&self, key: &MovieKey) -> Result<bool, MovieError> {
        let rows = self.gateway.run_query(
            queries::movie_exists(key),
            named_params! { ":key": key_param(key) },
        )?;

        Ok(match rows.first() {
            Some(row) => row.i64("present")? != 0,
            None => false,
        })
    }
}

fn parse_sort(raw: Option<&str>) -> Result<SortField, MovieError> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => value.parse().map_err(MovieError::Validation),
        None => Ok(DEFAULT_SORT_FIELD),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use movies_core::Row;
    use movies_store::{QueryParams, StoreError, WriteSummary};

    use super::*;

    /// Answers every read with `rows` and records each statement it runs.
    #[derive(Default)]
    struct RecordingGateway {
        rows: Vec<Row>,
        reads: Mutex<Vec<String>>,
        writes: Mutex<Vec<String>>,
    }

    impl RecordingGateway {
        fn returning(rows: Vec<Row>) -> Self {
            Self {
                rows,
                ..Self::default()
            }
        }

        fn write_count(&self) -> usize {
            self.writes.lock().expect("writes lock").len()
        }
    }

    impl QueryGateway for RecordingGateway {
        fn run_query(&self, query: &str, _: &QueryParams<'_>) -> Result<Vec<Row>, StoreError> {
            self.reads.lock().expect("reads lock").push(query.to_owned());
            Ok(self.rows.clone())
        }

        fn run_write(
            &self,
            query: &str,
            _: &QueryParams<'_>,
        ) -> Result<WriteSummary, StoreError> {
            self.writes.lock().expect("writes lock").push(query.to_owned());
            Ok(WriteSummary { rows_affected: 1 })
        }
    }

    #[test]
    fn missing_released_year_fails_before_any_query() {
        let service = MovieService::new(RecordingGateway::default());

        let err = service
            .update_released(&MovieKey::Title("Top Gun".to_owned()), None)
            .expect_err("validation error");

        assert!(matches!(err, MovieError::Validation(_)));
        assert_eq!(service.gateway().write_count(), 0);
        assert!(service.gateway().reads.lock().expect("reads").is_empty());
    }

    #[test]
    fn update_of_unknown_key_is_not_found_without_write() {
        let service = MovieService::new(RecordingGateway::default());

        let err = service
            .update_released(&MovieKey::Id(404), Some(2001))
            .expect_err("not found");

        assert!(matches!(err, MovieError::NotFound(message) if message.contains("404")));
        assert_eq!(service.gateway().write_count(), 0);
    }

    #[test]
    fn delete_of_unknown_key_is_not_found_without_write() {
        let gateway = RecordingGateway::returning(vec![Row::new().with("present", 0)]);
        let service = MovieService::new(gateway);

        let err = service
            .delete_by_key(&MovieKey::Title("Nothing".to_owned()))
            .expect_err("not found");

        assert!(matches!(err, MovieError::NotFound(_)));
        assert_eq!(service.gateway().write_count(), 0);
    }

    #[test]
    fn details_lookup_without_rows_is_not_found() {
        let service = MovieService::new(RecordingGateway::default());
        let err = service
            .fetch_details_by_title("Unknown")
            .expect_err("not found");
        assert_eq!(err.kind(), "not_found");
    }

    #[test]
    fn page_request_rejects_unknown_sort_and_empty_pages() {
        let service = MovieService::new(RecordingGateway::default());
        let mut request = PageRequest {
            title: "a".to_owned(),
            sort: Some("title DESC; --".to_owned()),
            page_size: 2,
            current_page: 0,
        };

        assert!(matches!(
            service.query_page(&request),
            Err(MovieError::Validation(_))
        ));

        request.sort = None;
        request.page_size = 0;
        assert!(matches!(
            service.query_page(&request),
            Err(MovieError::Validation(_))
        ));
        assert!(service.gateway().reads.lock().expect("reads").is_empty());
    }

    #[test]
    fn page_offset_beyond_i64_is_rejected_without_query() {
        let service = MovieService::new(RecordingGateway::default());
        let request = PageRequest {
            title: "The".to_owned(),
            sort: None,
            page_size: u32::MAX,
            current_page: u32::MAX,
        };

        let err = service.query_page(&request).expect_err("offset overflow");

        assert!(matches!(err, MovieError::Validation(message) if message.contains("offset")));
        assert!(service.gateway().reads.lock().expect("reads").is_empty());
    }

    #[test]
    fn blank_sort_defaults_to_released() {
        assert_eq!(parse_sort(None).expect("default"), SortField::Released);
        assert_eq!(parse_sort(Some("  ")).expect("blank"), SortField::Released);
        assert_eq!(
            parse_sort(Some("movie.votes")).expect("prefixed"),
            SortField::Votes
        );
    }
}
