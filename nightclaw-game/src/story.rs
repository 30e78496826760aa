//! Story graph: authored nodes, their choices, and lookup.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::sync::OnceLock;
use thiserror::Error;

use crate::constants::{DEFEAT_NODE_ID, ENTRY_NODE_ID, NodeId, RESUME_SENTINEL, is_ending};
use crate::stats::StatDelta;

const BUNDLED_STORY: &str = include_str!("../assets/story.json");

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("story node {id} does not exist")]
    NodeNotFound { id: NodeId },
    #[error("story node {id} is declared twice")]
    DuplicateNode { id: NodeId },
    #[error("choice {label:?} on node {from} leads to missing node {target}")]
    DanglingChoice {
        from: NodeId,
        label: String,
        target: NodeId,
    },
    #[error("required story node {id} is missing")]
    MissingAnchor { id: NodeId },
    #[error("story content is malformed: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A labelled edge to another node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub label: String,
    pub target: NodeId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryNode {
    pub id: NodeId,
    pub text: String,
    #[serde(rename = "image")]
    pub main_image: String,
    /// Extra frames shown in order after arrival (boss and event scenes).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub slideshow: Vec<String>,
    #[serde(default)]
    pub choices: SmallVec<[Choice; 2]>,
    #[serde(default)]
    pub delta: StatDelta,
    /// Item the scene is written around. Stored only; never gates travel.
    #[serde(default, rename = "requires", skip_serializing_if = "Option::is_none")]
    pub required_item: Option<String>,
    /// Items granted on arrival, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rewards: Vec<String>,
}

impl StoryNode {
    #[must_use]
    pub fn new(id: NodeId, text: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            main_image: image.into(),
            slideshow: Vec::new(),
            choices: SmallVec::new(),
            delta: StatDelta::default(),
            required_item: None,
            rewards: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_delta(mut self, delta: StatDelta) -> Self {
        self.delta = delta;
        self
    }

    #[must_use]
    pub fn requiring(mut self, item: impl Into<String>) -> Self {
        self.required_item = Some(item.into());
        self
    }

    #[must_use]
    pub fn rewarding<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rewards.extend(items.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn choice(&self, index: usize) -> Option<&Choice> {
        self.choices.get(index)
    }

    pub fn choice_labels(&self) -> impl Iterator<Item = &str> {
        self.choices.iter().map(|choice| choice.label.as_str())
    }

    /// First reward tag, if any.
    #[must_use]
    pub fn reward_item(&self) -> Option<&str> {
        self.rewards.first().map(String::as_str)
    }

    #[must_use]
    pub const fn is_ending(&self) -> bool {
        is_ending(self.id)
    }
}

#[derive(Debug, Deserialize)]
struct StoryDocument {
    #[serde(default)]
    intro: Vec<String>,
    nodes: Vec<StoryNode>,
}

/// Directed graph of story nodes, read-only once built.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StoryGraph {
    nodes: BTreeMap<NodeId, StoryNode>,
    intro: Vec<String>,
}

impl StoryGraph {
    #[must_use]
    pub fn builder() -> StoryGraphBuilder {
        StoryGraphBuilder::default()
    }

    /// Parse a `{ "intro": [...], "nodes": [...] }` document.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or declares a node id twice.
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        let document: StoryDocument = serde_json::from_str(json)?;
        let mut builder = Self::builder();
        for line in document.intro {
            builder.intro_line(line);
        }
        for node in document.nodes {
            builder.add_node(node);
        }
        builder.build()
    }

    /// The story shipped with the crate.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded asset fails to parse.
    pub fn bundled() -> Result<Self, GraphError> {
        Self::from_json(BUNDLED_STORY)
    }

    /// Shared, lazily parsed copy of the bundled story.
    ///
    /// Returns `None` if the embedded asset is malformed.
    #[must_use]
    pub fn bundled_shared() -> Option<&'static Self> {
        static BUNDLED: OnceLock<Option<StoryGraph>> = OnceLock::new();
        BUNDLED
            .get_or_init(|| {
                Self::bundled()
                    .inspect_err(|err| log::error!("bundled story rejected: {err}"))
                    .ok()
            })
            .as_ref()
    }

    /// # Errors
    ///
    /// Returns [`GraphError::NodeNotFound`] if `id` is absent.
    pub fn lookup(&self, id: NodeId) -> Result<&StoryNode, GraphError> {
        self.nodes.get(&id).ok_or(GraphError::NodeNotFound { id })
    }

    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&StoryNode> {
        self.nodes.get(&id)
    }

    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &StoryNode> {
        self.nodes.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Backstory lines shown before the first node.
    #[must_use]
    pub fn intro(&self) -> &[String] {
        &self.intro
    }

    /// Collect every broken edge and missing anchor.
    #[must_use]
    pub fn validate(&self) -> Vec<GraphError> {
        let mut problems = Vec::new();
        for anchor in [ENTRY_NODE_ID, DEFEAT_NODE_ID] {
            if !self.contains(anchor) {
                problems.push(GraphError::MissingAnchor { id: anchor });
            }
        }
        for node in self.nodes.values() {
            for choice in &node.choices {
                if choice.target != RESUME_SENTINEL && !self.contains(choice.target) {
                    problems.push(GraphError::DanglingChoice {
                        from: node.id,
                        label: choice.label.clone(),
                        target: choice.target,
                    });
                }
            }
        }
        problems
    }
}

/// Incremental construction in authoring order: nodes, then edges and frames.
#[derive(Debug, Default)]
pub struct StoryGraphBuilder {
    nodes: BTreeMap<NodeId, StoryNode>,
    intro: Vec<String>,
    errors: Vec<GraphError>,
}

impl StoryGraphBuilder {
    pub fn add_node(&mut self, node: StoryNode) -> &mut Self {
        if self.nodes.contains_key(&node.id) {
            self.errors.push(GraphError::DuplicateNode { id: node.id });
        } else {
            self.nodes.insert(node.id, node);
        }
        self
    }

    /// Append a choice to `parent`.
    pub fn connect(&mut self, parent: NodeId, label: impl Into<String>, child: NodeId) -> &mut Self {
        match self.nodes.get_mut(&parent) {
            Some(node) => node.choices.push(Choice {
                label: label.into(),
                target: child,
            }),
            None => self.errors.push(GraphError::NodeNotFound { id: parent }),
        }
        self
    }

    pub fn add_slide(&mut self, id: NodeId, image: impl Into<String>) -> &mut Self {
        match self.nodes.get_mut(&id) {
            Some(node) => node.slideshow.push(image.into()),
            None => self.errors.push(GraphError::NodeNotFound { id }),
        }
        self
    }

    pub fn intro_line(&mut self, line: impl Into<String>) -> &mut Self {
        self.intro.push(line.into());
        self
    }

    /// # Errors
    ///
    /// Returns the first construction error (duplicate id, or an edge or
    /// frame attached to a node that was never added).
    pub fn build(&mut self) -> Result<StoryGraph, GraphError> {
        if !self.errors.is_empty() {
            return Err(self.errors.remove(0));
        }
        Ok(StoryGraph {
            nodes: std::mem::take(&mut self.nodes),
            intro: std::mem::take(&mut self.intro),
        })
    }
}
