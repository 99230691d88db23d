use serde_json::Value;

use crate::graph::MovieCast;
use crate::row::invalid;
use crate::{CastMember, MapError, Movie, MovieDetails, MovieSearchResult, Row};

/// `ACTED_IN` becomes `acted`, `DIRECTED` becomes `directed`.
pub fn job_from_relationship_type(relationship_type: &str) -> String {
    relationship_type.to_lowercase().replacen("_in", "", 1)
}

/// Expects a `title` column and a `cast` column holding a list of
/// `{name, type, roles}` entries.
pub fn map_movie_details_row(row: &Row) -> Result<MovieDetails, MapError> {
    let title = row.str("title")?.to_owned();
    let cast = match row.json("cast")? {
        Value::Array(entries) => entries
            .iter()
            .map(cast_member)
            .collect::<Result<Vec<_>, _>>()?,
        Value::Null => Vec::new(),
        _ => return Err(invalid("cast", "list")),
    };

    Ok(MovieDetails { title, cast })
}

fn cast_member(entry: &Value) -> Result<CastMember, MapError> {
    let name = entry
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("cast.name", "string"))?;
    let relationship_type = entry
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("cast.type", "string"))?;

    let role = match entry.get("roles") {
        None | Some(Value::Null) => None,
        Some(Value::Array(roles)) => match roles.first() {
            None => None,
            Some(Value::String(role)) => Some(role.clone()),
            Some(_) => return Err(invalid("cast.roles", "list of strings")),
        },
        Some(_) => return Err(invalid("cast.roles", "list of strings")),
    };

    Ok(CastMember {
        name: name.to_owned(),
        job: job_from_relationship_type(relationship_type),
        role,
    })
}

pub fn map_movie_row(row: &Row) -> Result<Movie, MapError> {
    Ok(Movie {
        id: row.i64("id")?,
        title: row.str("title")?.to_owned(),
        tagline: row.opt_str("tagline")?.map(str::to_owned),
        released: row.opt_i64("released")?,
        votes: row.opt_i64("votes")?,
    })
}

pub fn map_search_row(row: &Row) -> Result<MovieSearchResult, MapError> {
    map_movie_row(row).map(MovieSearchResult::from)
}

/// Expects a `movie` title column and an `actors` list of names.
pub fn map_graph_row(row: &Row) -> Result<MovieCast, MapError> {
    let movie = row.str("movie")?.to_owned();
    let actors = match row.json("actors")? {
        Value::Array(names) => names
            .into_iter()
            .map(|name| match name {
                Value::String(name) => Ok(name),
                _ => Err(invalid("actors", "list of strings")),
            })
            .collect::<Result<Vec<_>, _>>()?,
        Value::Null => Vec::new(),
        _ => return Err(invalid("actors", "list of strings")),
    };

    Ok(MovieCast { movie, actors })
}
