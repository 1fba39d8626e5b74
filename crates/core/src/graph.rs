//! Skill dependency graph and the onboarding unlock policy.
//!
//! Skills live in an arena in catalog order; edges point from a skill to its
//! prerequisites by id. A graph that constructs successfully is acyclic, every
//! prerequisite resolves, and ids are unique.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt::Write as _;

use thiserror::Error;

use crate::model::{ProgressRecord, Skill, SkillId, SkillStatus, UserId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GraphError {
    #[error("prerequisite cycle detected: {}", render_path(.path))]
    Cycle { path: Vec<SkillId> },

    #[error("skill {0} not found in catalog")]
    UnknownSkill(SkillId),

    #[error("skill {skill} requires unknown prerequisite {prerequisite}")]
    UnknownPrerequisite {
        skill: SkillId,
        prerequisite: SkillId,
    },

    #[error("skill id {0} appears more than once in the catalog")]
    DuplicateSkill(SkillId),
}

fn render_path(path: &[SkillId]) -> String {
    let mut out = String::new();
    for (i, id) in path.iter().enumerate() {
        if i > 0 {
            out.push_str(" -> ");
        }
        let _ = write!(out, "{id}");
    }
    out
}

//
// ─── GRAPH ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillGraph {
    skills: Vec<Skill>,
    index: HashMap<SkillId, usize>,
    // prerequisite indices per skill, aligned with `skills`
    edges: Vec<Vec<usize>>,
}

impl SkillGraph {
    /// Builds and validates the graph.
    ///
    /// # Errors
    ///
    /// - `GraphError::DuplicateSkill` if two skills share an id.
    /// - `GraphError::UnknownPrerequisite` if a prerequisite is not in the catalog.
    /// - `GraphError::Cycle` if the prerequisite relation is not a DAG.
    pub fn new(skills: Vec<Skill>) -> Result<Self, GraphError> {
        let mut index = HashMap::with_capacity(skills.len());
        for (pos, skill) in skills.iter().enumerate() {
            if index.insert(skill.id(), pos).is_some() {
                return Err(GraphError::DuplicateSkill(skill.id()));
            }
        }

        let mut edges = Vec::with_capacity(skills.len());
        for skill in &skills {
            let mut prereqs = Vec::with_capacity(skill.prerequisites().len());
            for prerequisite in skill.prerequisites() {
                let &pos = index
                    .get(prerequisite)
                    .ok_or(GraphError::UnknownPrerequisite {
                        skill: skill.id(),
                        prerequisite: *prerequisite,
                    })?;
                prereqs.push(pos);
            }
            edges.push(prereqs);
        }

        let graph = Self {
            skills,
            index,
            edges,
        };
        if let Some(path) = graph.find_cycle() {
            return Err(GraphError::Cycle { path });
        }
        Ok(graph)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.skills.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: SkillId) -> bool {
        self.index.contains_key(&id)
    }

    #[must_use]
    pub fn get(&self, id: SkillId) -> Option<&Skill> {
        self.index.get(&id).map(|&pos| &self.skills[pos])
    }

    /// # Errors
    ///
    /// Returns `GraphError::UnknownSkill` if `id` is not in the catalog.
    pub fn skill(&self, id: SkillId) -> Result<&Skill, GraphError> {
        self.get(id).ok_or(GraphError::UnknownSkill(id))
    }

    /// Skills in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &Skill> {
        self.skills.iter()
    }

    /// # Errors
    ///
    /// Returns `GraphError::UnknownSkill` if `id` is not in the catalog.
    pub fn prerequisites(&self, id: SkillId) -> Result<&BTreeSet<SkillId>, GraphError> {
        self.skill(id).map(Skill::prerequisites)
    }

    /// Skills that list `id` as a direct prerequisite, in catalog order.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::UnknownSkill` if `id` is not in the catalog.
    pub fn dependents(&self, id: SkillId) -> Result<Vec<SkillId>, GraphError> {
        let target = *self.index.get(&id).ok_or(GraphError::UnknownSkill(id))?;
        Ok(self
            .edges
            .iter()
            .enumerate()
            .filter(|(_, prereqs)| prereqs.contains(&target))
            .map(|(pos, _)| self.skills[pos].id())
            .collect())
    }

    /// Whether every prerequisite of `id` is in `completed`.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::UnknownSkill` if `id` is not in the catalog.
    pub fn is_unlockable(
        &self,
        id: SkillId,
        completed: &HashSet<SkillId>,
    ) -> Result<bool, GraphError> {
        Ok(self
            .prerequisites(id)?
            .iter()
            .all(|prerequisite| completed.contains(prerequisite)))
    }

    /// Prerequisites before dependents; catalog order breaks ties.
    #[must_use]
    pub fn topological_order(&self) -> Vec<SkillId> {
        let mut pending: Vec<usize> = self.edges.iter().map(Vec::len).collect();
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); self.skills.len()];
        for (pos, prereqs) in self.edges.iter().enumerate() {
            for &prereq in prereqs {
                dependents[prereq].push(pos);
            }
        }

        let mut ready: BTreeSet<usize> = pending
            .iter()
            .enumerate()
            .filter(|(_, count)| **count == 0)
            .map(|(pos, _)| pos)
            .collect();
        let mut order = Vec::with_capacity(self.skills.len());

        while let Some(pos) = ready.pop_first() {
            order.push(self.skills[pos].id());
            for &next in &dependents[pos] {
                pending[next] -= 1;
                if pending[next] == 0 {
                    ready.insert(next);
                }
            }
        }
        order
    }

    /// Onboarding records for `user_id`, one per skill in catalog order.
    ///
    /// Root skills start `InProgress`, everything else `Locked`, all at zero mastery.
    #[must_use]
    pub fn initialize_progress(&self, user_id: UserId) -> Vec<ProgressRecord> {
        self.skills
            .iter()
            .map(|skill| {
                let status = if skill.is_root() {
                    SkillStatus::InProgress
                } else {
                    SkillStatus::Locked
                };
                ProgressRecord::new(user_id, skill.id(), status)
            })
            .collect()
    }

    /// Iterative depth-first search with white/gray/black marking.
    fn find_cycle(&self) -> Option<Vec<SkillId>> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Mark {
            White,
            Gray,
            Black,
        }

        let mut marks = vec![Mark::White; self.skills.len()];

        for root in 0..self.skills.len() {
            if marks[root] != Mark::White {
                continue;
            }
            marks[root] = Mark::Gray;
            // (node, index of the next prerequisite edge to explore)
            let mut stack: Vec<(usize, usize)> = vec![(root, 0)];

            while let Some(frame) = stack.last_mut() {
                let node = frame.0;
                let Some(&next) = self.edges[node].get(frame.1) else {
                    marks[node] = Mark::Black;
                    stack.pop();
                    continue;
                };
                frame.1 += 1;

                match marks[next] {
                    Mark::White => {
                        marks[next] = Mark::Gray;
                        stack.push((next, 0));
                    }
                    Mark::Gray => {
                        let start = stack.iter().position(|&(n, _)| n == next).unwrap_or(0);
                        let mut path: Vec<SkillId> = stack[start..]
                            .iter()
                            .map(|&(n, _)| self.skills[n].id())
                            .collect();
                        path.push(self.skills[next].id());
                        return Some(path);
                    }
                    Mark::Black => {}
                }
            }
        }
        None
    }
}

/// Validates `skills` as a graph and returns the onboarding records for `user_id`.
///
/// # Errors
///
/// Propagates any `GraphError` from graph construction; a cycle is fatal.
pub fn initialize_progress(
    user_id: UserId,
    skills: &[Skill],
) -> Result<Vec<ProgressRecord>, GraphError> {
    let graph = SkillGraph::new(skills.to_vec())?;
    Ok(graph.initialize_progress(user_id))
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Difficulty;

    fn skill(id: u64, prereqs: &[u64]) -> Skill {
        Skill::new(
            SkillId::new(id),
            format!("S{id}"),
            None,
            Difficulty::new(3).unwrap(),
            prereqs.iter().copied().map(SkillId::new),
        )
        .unwrap()
    }

    fn ids(raw: &[u64]) -> Vec<SkillId> {
        raw.iter().copied().map(SkillId::new).collect()
    }

    #[test]
    fn initialize_marks_roots_in_progress() {
        let skills = vec![skill(1, &[]), skill(2, &[1]), skill(3, &[2])];
        let records = initialize_progress(UserId::new(9), &skills).unwrap();

        let statuses: Vec<_> = records.iter().map(ProgressRecord::status).collect();
        assert_eq!(
            statuses,
            vec![
                SkillStatus::InProgress,
                SkillStatus::Locked,
                SkillStatus::Locked
            ]
        );
        assert!(records.iter().all(|r| r.mastery().value() == 0.0));
        assert!(records.iter().all(|r| r.user_id() == UserId::new(9)));
    }

    #[test]
    fn initialize_preserves_catalog_order() {
        let skills = vec![skill(5, &[]), skill(2, &[5]), skill(9, &[])];
        let records = initialize_progress(UserId::new(1), &skills).unwrap();
        let order: Vec<_> = records.iter().map(ProgressRecord::skill_id).collect();
        assert_eq!(order, ids(&[5, 2, 9]));
    }

    #[test]
    fn detects_two_node_cycle() {
        let skills = vec![skill(1, &[2]), skill(2, &[1])];
        let err = SkillGraph::new(skills).unwrap_err();
        let GraphError::Cycle { path } = err else {
            panic!("expected cycle, got {err:?}");
        };
        assert_eq!(path.first(), path.last());
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn detects_self_loop() {
        let err = SkillGraph::new(vec![skill(4, &[4])]).unwrap_err();
        assert_eq!(err, GraphError::Cycle { path: ids(&[4, 4]) });
        assert_eq!(err.to_string(), "prerequisite cycle detected: 4 -> 4");
    }

    #[test]
    fn detects_cycle_behind_acyclic_prefix() {
        let skills = vec![
            skill(1, &[]),
            skill(2, &[1, 4]),
            skill(3, &[2]),
            skill(4, &[3]),
        ];
        assert!(matches!(
            initialize_progress(UserId::new(1), &skills),
            Err(GraphError::Cycle { .. })
        ));
    }

    #[test]
    fn diamond_is_not_a_cycle() {
        let skills = vec![
            skill(1, &[]),
            skill(2, &[1]),
            skill(3, &[1]),
            skill(4, &[2, 3]),
        ];
        let graph = SkillGraph::new(skills).unwrap();
        assert_eq!(graph.len(), 4);
        assert_eq!(graph.dependents(SkillId::new(1)).unwrap(), ids(&[2, 3]));
    }

    #[test]
    fn unknown_prerequisite_is_not_found() {
        let err = SkillGraph::new(vec![skill(1, &[7])]).unwrap_err();
        assert_eq!(
            err,
            GraphError::UnknownPrerequisite {
                skill: SkillId::new(1),
                prerequisite: SkillId::new(7),
            }
        );
    }

    #[test]
    fn duplicate_ids_rejected() {
        let err = SkillGraph::new(vec![skill(1, &[]), skill(1, &[])]).unwrap_err();
        assert_eq!(err, GraphError::DuplicateSkill(SkillId::new(1)));
    }

    #[test]
    fn topological_order_respects_prerequisites_and_catalog_ties() {
        let skills = vec![
            skill(4, &[2, 3]),
            skill(3, &[1]),
            skill(2, &[1]),
            skill(1, &[]),
        ];
        let graph = SkillGraph::new(skills).unwrap();
        assert_eq!(graph.topological_order(), ids(&[1, 3, 2, 4]));
    }

    #[test]
    fn unlockable_requires_every_prerequisite() {
        let graph = SkillGraph::new(vec![skill(1, &[]), skill(2, &[]), skill(3, &[1, 2])]).unwrap();
        let mut completed = HashSet::new();
        completed.insert(SkillId::new(1));
        assert!(!graph.is_unlockable(SkillId::new(3), &completed).unwrap());
        completed.insert(SkillId::new(2));
        assert!(graph.is_unlockable(SkillId::new(3), &completed).unwrap());
        assert_eq!(
            graph.is_unlockable(SkillId::new(8), &completed).unwrap_err(),
            GraphError::UnknownSkill(SkillId::new(8))
        );
    }

    #[test]
    fn empty_catalog_yields_no_records() {
        assert!(initialize_progress(UserId::new(1), &[]).unwrap().is_empty());
    }
}
