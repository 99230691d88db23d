use serde::{Deserialize, Serialize};

mod graph;
mod mapper;
mod row;

pub use graph::{
    GraphLink, GraphNode, GraphProjection, GraphProjector, MovieCast, NodeLabel, project_graph,
};
pub use mapper::{
    job_from_relationship_type, map_graph_row, map_movie_details_row, map_movie_row,
    map_search_row,
};
pub use row::{MapError, Row};

pub type MovieId = i64;

pub const DEFAULT_SORT_FIELD: SortField = SortField::Released;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub released: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub votes: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastMember {
    pub name: String,
    pub job: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieDetails {
    pub title: String,
    pub cast: Vec<CastMember>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieSearchResult {
    pub movie: Movie,
}

impl From<Movie> for MovieSearchResult {
    fn from(movie: Movie) -> Self {
        Self { movie }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoviePage {
    pub content: Vec<MovieSearchResult>,
    pub size: u32,
    pub number: u32,
    pub total_elements: u64,
    pub total_pages: u64,
    pub sort: SortField,
}

impl MoviePage {
    pub fn new(
        content: Vec<MovieSearchResult>,
        size: u32,
        number: u32,
        total_elements: u64,
        sort: SortField,
    ) -> Self {
        let total_pages = if size == 0 {
            0
        } else {
            total_elements.div_ceil(u64::from(size))
        };

        Self {
            content,
            size,
            number,
            total_elements,
            total_pages,
            sort,
        }
    }
}

/// Selects a movie for keyed mutations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovieKey {
    Id(MovieId),
    Title(String),
}

impl std::fmt::Display for MovieKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id {id}"),
            Self::Title(title) => write!(f, "title '{title}'"),
        }
    }
}

/// Fields a page query may be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Title,
    #[default]
    Released,
    Votes,
    Tagline,
}

impl SortField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Released => "released",
            Self::Votes => "votes",
            Self::Tagline => "tagline",
        }
    }
}

impl std::str::FromStr for SortField {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        // Accept the property-path form `movie.released` as well as the bare name.
        let value = value.trim();
        let value = value.strip_prefix("movie.").unwrap_or(value);
        match value {
            "title" => Ok(Self::Title),
            "released" => Ok(Self::Released),
            "votes" => Ok(Self::Votes),
            "tagline" => Ok(Self::Tagline),
            other => Err(format!(
                "invalid sort field '{other}', expected one of: title, released, votes, tagline"
            )),
        }
    }
}
