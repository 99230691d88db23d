use std::collections::HashSet;

use rusqlite::{TransactionBehavior, named_params};
use serde::{Deserialize, Serialize};

use crate::{SqliteGraphStore, StoreError};

const CLASSIC_DATASET: &str = include_str!("../data/movies.json");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedMovie {
    pub title: String,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub released: Option<i64>,
    #[serde(default)]
    pub votes: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedPerson {
    pub name: String,
    #[serde(default)]
    pub born: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedRelationship {
    pub person: String,
    pub movie: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub roles: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SeedDataset {
    pub movies: Vec<SeedMovie>,
    pub people: Vec<SeedPerson>,
    #[serde(default)]
    pub relationships: Vec<SeedRelationship>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SeedSummary {
    pub movies_added: usize,
    pub people_added: usize,
    pub relationships_added: usize,
}

impl SeedDataset {
    /// The bundled sample graph of movies, actors and crews.
    pub fn classic() -> Result<Self, StoreError> {
        Self::from_json(CLASSIC_DATASET)
    }

    pub fn from_json(raw: &str) -> Result<Self, StoreError> {
        let dataset: Self = serde_json::from_str(raw)?;
        dataset.validate()?;
        Ok(dataset)
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        let titles: HashSet<&str> = self.movies.iter().map(|m| m.title.as_str()).collect();
        let names: HashSet<&str> = self.people.iter().map(|p| p.name.as_str()).collect();

        if let Some(movie) = self.movies.iter().find(|m| m.title.trim().is_empty()) {
            return Err(StoreError::InvalidSeed(format!(
                "movie with blank title (released {:?})",
                movie.released
            )));
        }
        if self.movies.iter().any(|m| m.votes.is_some_and(|v| v < 0)) {
            return Err(StoreError::InvalidSeed("negative vote count".to_owned()));
        }

        for rel in &self.relationships {
            if !names.contains(rel.person.as_str()) {
                return Err(StoreError::InvalidSeed(format!(
                    "relationship references unknown person '{}'",
                    rel.person
                )));
            }
            if !titles.contains(rel.movie.as_str()) {
                return Err(StoreError::InvalidSeed(format!(
                    "relationship references unknown movie '{}'",
                    rel.movie
                )));
            }
            let well_formed = !rel.kind.is_empty()
                && rel
                    .kind
                    .chars()
                    .all(|ch| ch.is_ascii_uppercase() || ch == '_');
            if !well_formed {
                return Err(StoreError::InvalidSeed(format!(
                    "invalid relationship type '{}'",
                    rel.kind
                )));
            }
        }

        Ok(())
    }
}

impl SqliteGraphStore {
    /// Loads `dataset` into the selected database in one transaction.
    /// Existing titles, names and relationships are left untouched.
    pub fn seed(&self, dataset: &SeedDataset) -> Result<SeedSummary, StoreError> {
        dataset.validate()?;

        let mut conn = self.session()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut summary = SeedSummary::default();
        {
            let mut insert_movie = tx.prepare(
                r#"
                INSERT OR IGNORE INTO movies (title, tagline, released, votes)
                VALUES (:title, :tagline, :released, :votes)
                "#,
            )?;
            for movie in &dataset.movies {
                summary.movies_added += insert_movie.execute(named_params! {
                    ":title": movie.title,
                    ":tagline": movie.tagline,
                    ":released": movie.released,
                    ":votes": movie.votes,
                })?;
            }

            let mut insert_person = tx.prepare(
                "INSERT OR IGNORE INTO people (name, born) VALUES (:name, :born)",
            )?;
            for person in &dataset.people {
                summary.people_added += insert_person.execute(named_params! {
                    ":name": person.name,
                    ":born": person.born,
                })?;
            }

            let mut insert_relationship = tx.prepare(
                r#"
                INSERT OR IGNORE INTO relationships (person_id, movie_id, type, roles)
                SELECT p.id, m.id, :type, :roles
                FROM people p
                JOIN movies m ON m.title = :movie
                WHERE p.name = :person
                "#,
            )?;
            for rel in &dataset.relationships {
                let roles = rel.roles.as_ref().map(serde_json::to_string).transpose()?;
                summary.relationships_added += insert_relationship.execute(named_params! {
                    ":type": rel.kind,
                    ":roles": roles,
                    ":movie": rel.movie,
                    ":person": rel.person,
                })?;
            }
        }
        tx.commit()?;

        tracing::info!(
            movies = summary.movies_added,
            people = summary.people_added,
            relationships = summary.relationships_added,
            "seeded graph"
        );
        Ok(summary)
    }
}
