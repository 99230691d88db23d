//! Query texts run through a [`crate::QueryGateway`].
//!
//! Caller input is always bound as a named parameter. The one interpolated
//! fragment is the sort column, which comes from the [`SortField`] allow-list.

use movies_core::{MovieKey, SortField};

pub const MOVIE_DETAILS: &str = r#"
    SELECT
        m.title AS title,
        (
            SELECT json_group_array(
                json_object('name', p.name, 'type', r.type, 'roles', json(r.roles))
                ORDER BY r.type, p.name
            )
            FROM relationships r
            JOIN people p ON p.id = r.person_id
            WHERE r.movie_id = m.id
        ) AS "cast"
    FROM movies m
    WHERE m.title = :title
"#;

pub const VOTE_BY_TITLE: &str = r#"
    UPDATE movies
    SET votes = COALESCE(votes, 0) + 1
    WHERE title = :title
"#;

const MOVIE_BY_ID: &str = r#"
    SELECT m.id AS id, m.title AS title, m.tagline AS tagline, m.released AS released, m.votes AS votes
    FROM movies m
    WHERE m.id = :key
"#;

const MOVIE_BY_TITLE: &str = r#"
    SELECT m.id AS id, m.title AS title, m.tagline AS tagline, m.released AS released, m.votes AS votes
    FROM movies m
    WHERE m.title = :key
"#;

pub const UPDATE_RELEASED: &str = r#"
    UPDATE movies
    SET released = :released
    WHERE id = :id
"#;

const MOVIE_EXISTS_BY_ID: &str = "SELECT EXISTS(SELECT 1 FROM movies WHERE id = :key) AS present";

const MOVIE_EXISTS_BY_TITLE: &str =
    "SELECT EXISTS(SELECT 1 FROM movies WHERE title = :key) AS present";

// Relationships go with the node through ON DELETE CASCADE.
const DELETE_MOVIE_BY_ID: &str = "DELETE FROM movies WHERE id = :key";

const DELETE_MOVIE_BY_TITLE: &str = "DELETE FROM movies WHERE title = :key";

/// Case-sensitive containment shared by the page and count queries.
const TITLE_CONTAINS: &str = "instr(m.title, :title) > 0";

pub const SEARCH_MOVIES: &str = r#"
    SELECT m.id AS id, m.title AS title, m.tagline AS tagline, m.released AS released, m.votes AS votes
    FROM (
        SELECT rowid AS movie_id, rank AS score
        FROM movie_search
        WHERE movie_search MATCH :query
    ) hits
    JOIN movies m ON m.id = hits.movie_id
    ORDER BY hits.score, m.title
"#;

pub const ACTED_IN_GRAPH: &str = r#"
    SELECT m.title AS movie, json_group_array(p.name ORDER BY p.name) AS actors
    FROM relationships r
    JOIN movies m ON m.id = r.movie_id
    JOIN people p ON p.id = r.person_id
    WHERE r.type = 'ACTED_IN'
    GROUP BY m.id
    ORDER BY m.title, m.id
"#;

pub fn movie_by_key(key: &MovieKey) -> &'static str {
    match key {
        MovieKey::Id(_) => MOVIE_BY_ID,
        MovieKey::Title(_) => MOVIE_BY_TITLE,
    }
}

pub fn movie_exists(key: &MovieKey) -> &'static str {
    match key {
        MovieKey::Id(_) => MOVIE_EXISTS_BY_ID,
        MovieKey::Title(_) => MOVIE_EXISTS_BY_TITLE,
    }
}

pub fn delete_movie(key: &MovieKey) -> &'static str {
    match key {
        MovieKey::Id(_) => DELETE_MOVIE_BY_ID,
        MovieKey::Title(_) => DELETE_MOVIE_BY_TITLE,
    }
}

pub fn sort_column(field: SortField) -> &'static str {
    match field {
        SortField::Title => "m.title",
        SortField::Released => "m.released",
        SortField::Votes => "m.votes",
        SortField::Tagline => "m.tagline",
    }
}

/// Ascending page over titles containing `:title`, absent values last.
/// Binds `:title`, `:limit` and `:skip`.
pub fn movie_page(sort: SortField) -> String {
    let column = sort_column(sort);
    format!(
        r#"
    SELECT m.id AS id, m.title AS title, m.tagline AS tagline, m.released AS released, m.votes AS votes
    FROM movies m
    WHERE {TITLE_CONTAINS}
    ORDER BY {column} IS NULL, {column} ASC, m.id ASC
    LIMIT :limit OFFSET :skip
"#
    )
}

/// Binds `:title`; matches exactly the rows [`movie_page`] pages over.
pub fn movie_count() -> String {
    format!("SELECT count(*) AS total FROM movies m WHERE {TITLE_CONTAINS}")
}

/// Full-text match expression with implicit prefix wildcarding: every
/// whitespace-separated term is quoted and suffixed with `*`.
/// Returns `None` when nothing searchable remains.
pub fn full_text_expression(text: &str) -> Option<String> {
    let terms: Vec<String> = text
        .split_whitespace()
        .filter(|term| term.chars().any(char::is_alphanumeric))
        .map(|term| format!("\"{}\"*", term.replace('"', "\"\"")))
        .collect();

    (!terms.is_empty()).then(|| terms.join(" "))
}
