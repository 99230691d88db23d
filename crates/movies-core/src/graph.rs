use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One traversal row: a movie title and its actors, in query order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieCast {
    pub movie: String,
    pub actors: Vec<String>,
}

impl MovieCast {
    pub fn new<I, S>(movie: impl Into<String>, actors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            movie: movie.into(),
            actors: actors.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeLabel {
    Movie,
    Actor,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphNode {
    pub label: NodeLabel,
    pub title: String,
}

/// `source` and `target` index into [`GraphProjection::nodes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphLink {
    pub source: usize,
    pub target: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GraphProjection {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
}

/// Builds the node/link lists consumed by force-directed front-ends.
///
/// Movie nodes are appended once per row. Actor nodes are shared: an actor
/// seen under several movies keeps the index of its first appearance.
#[derive(Debug, Default)]
pub struct GraphProjector {
    projection: GraphProjection,
    index: HashMap<(NodeLabel, String), usize>,
}

impl GraphProjector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, cast: MovieCast) {
        let target = self.append(NodeLabel::Movie, cast.movie);
        for actor in cast.actors {
            let source = self.actor_index(actor);
            self.projection.links.push(GraphLink { source, target });
        }
    }

    pub fn finish(self) -> GraphProjection {
        self.projection
    }

    fn actor_index(&mut self, name: String) -> usize {
        if let Some(&existing) = self.index.get(&(NodeLabel::Actor, name.clone())) {
            return existing;
        }
        self.append(NodeLabel::Actor, name)
    }

    fn append(&mut self, label: NodeLabel, title: String) -> usize {
        let position = self.projection.nodes.len();
        self.index.entry((label, title.clone())).or_insert(position);
        self.projection.nodes.push(GraphNode { label, title });
        position
    }
}

pub fn project_graph<I>(rows: I) -> GraphProjection
where
    I: IntoIterator<Item = MovieCast>,
{
    let mut projector = GraphProjector::new();
    for row in rows {
        projector.push(row);
    }
    projector.finish()
}
