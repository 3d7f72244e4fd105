//! Entity grouping for the type summary view.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::entity::{Entity, EntityId};

/// Label of the group that always sorts first.
pub const PROJECT_LABEL: &str = "Project";

/// Label used for pinned entities regardless of their type.
pub const LISTENING_PROJECTS_LABEL: &str = "Listening Projects";

/// Entities sharing a display label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityGroup {
    pub label: String,
    pub entities: Vec<Entity>,
}

impl EntityGroup {
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Group entities by type label.
///
/// Pinned ids go under [`LISTENING_PROJECTS_LABEL`]. The [`PROJECT_LABEL`]
/// group comes first, the rest by descending size. Groups of equal size keep
/// the order in which their label first appeared.
pub fn group_entities(entities: &[Entity], pinned: &[EntityId]) -> Vec<EntityGroup> {
    let pinned: HashSet<EntityId> = pinned.iter().copied().collect();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<EntityGroup> = Vec::new();

    for entity in entities {
        let label = if pinned.contains(&entity.id) {
            LISTENING_PROJECTS_LABEL
        } else {
            entity.type_label()
        };
        let slot = *index.entry(label.to_string()).or_insert_with(|| {
            groups.push(EntityGroup {
                label: label.to_string(),
                entities: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].entities.push(entity.clone());
    }

    groups.sort_by(|a, b| {
        let a_first = a.label == PROJECT_LABEL;
        let b_first = b.label == PROJECT_LABEL;
        b_first
            .cmp(&a_first)
            .then_with(|| b.entities.len().cmp(&a.entities.len()))
    });
    groups
}
