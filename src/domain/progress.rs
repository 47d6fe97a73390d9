//! Completion folding over a program tree.
//!
//! A [`ProgramTree`] is the ordered module/topic skeleton of one program and a
//! [`CompletionSet`] holds the completion markers of one learner. Both are
//! loaded up front; everything here is pure.

use std::collections::HashSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a completion marker points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProgressKind {
    Program,
    Module,
    Resource,
    Topic,
}

impl ProgressKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Program => "program",
            Self::Module => "module",
            Self::Resource => "resource",
            Self::Topic => "topic",
        }
    }

    /// Picks the marker kind from the ids supplied with a progress call.
    /// Precedence is program, module, resource, topic.
    pub fn infer(
        program_id: Option<Uuid>,
        module_id: Option<Uuid>,
        resource_id: Option<Uuid>,
        topic_id: Option<Uuid>,
    ) -> Option<Self> {
        if program_id.is_some() {
            Some(Self::Program)
        } else if module_id.is_some() {
            Some(Self::Module)
        } else if resource_id.is_some() {
            Some(Self::Resource)
        } else if topic_id.is_some() {
            Some(Self::Topic)
        } else {
            None
        }
    }
}

impl std::fmt::Display for ProgressKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProgressKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "program" => Ok(Self::Program),
            "module" => Ok(Self::Module),
            "resource" => Ok(Self::Resource),
            "topic" => Ok(Self::Topic),
            other => Err(format!("unknown progress type `{other}`")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct ModuleNode {
    pub module_id: Uuid,
    pub topic_ids: Vec<Uuid>,
}

#[derive(Debug, Clone)]
pub struct ProgramTree {
    pub program_id: Uuid,
    pub modules: Vec<ModuleNode>,
}

impl ProgramTree {
    /// Builds the tree from `(module_id, topic_id)` rows already sorted by
    /// module position, then topic position. A module without topics shows up
    /// as a row with `None`.
    pub fn from_rows<I>(program_id: Uuid, rows: I) -> Self
    where
        I: IntoIterator<Item = (Uuid, Option<Uuid>)>,
    {
        let mut modules: Vec<ModuleNode> = Vec::new();

        for (module_id, topic_id) in rows {
            match modules.last_mut() {
                Some(last) if last.module_id == module_id => {
                    if let Some(topic_id) = topic_id {
                        last.topic_ids.push(topic_id);
                    }
                }
                _ => modules.push(ModuleNode {
                    module_id,
                    topic_ids: topic_id.into_iter().collect(),
                }),
            }
        }

        Self {
            program_id,
            modules,
        }
    }

    pub fn total_topics(&self) -> usize {
        self.modules.iter().map(|m| m.topic_ids.len()).sum()
    }
}

/// Completion markers of a single learner.
#[derive(Debug, Clone, Default)]
pub struct CompletionSet {
    programs: HashSet<Uuid>,
    modules: HashSet<Uuid>,
    topics: HashSet<Uuid>,
    resources: HashSet<Uuid>,
}

impl CompletionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records every id carried by a marker row, whatever its inferred kind.
    pub fn record(
        &mut self,
        program_id: Option<Uuid>,
        module_id: Option<Uuid>,
        resource_id: Option<Uuid>,
        topic_id: Option<Uuid>,
    ) {
        if let Some(id) = program_id {
            self.programs.insert(id);
        }
        if let Some(id) = module_id {
            self.modules.insert(id);
        }
        if let Some(id) = resource_id {
            self.resources.insert(id);
        }
        if let Some(id) = topic_id {
            self.topics.insert(id);
        }
    }

    pub fn mark(&mut self, kind: ProgressKind, id: Uuid) {
        match kind {
            ProgressKind::Program => self.programs.insert(id),
            ProgressKind::Module => self.modules.insert(id),
            ProgressKind::Resource => self.resources.insert(id),
            ProgressKind::Topic => self.topics.insert(id),
        };
    }

    pub fn contains(&self, kind: ProgressKind, id: Uuid) -> bool {
        match kind {
            ProgressKind::Program => self.programs.contains(&id),
            ProgressKind::Module => self.modules.contains(&id),
            ProgressKind::Resource => self.resources.contains(&id),
            ProgressKind::Topic => self.topics.contains(&id),
        }
    }

    pub fn programs(&self) -> impl Iterator<Item = &Uuid> {
        self.programs.iter()
    }

    pub fn modules(&self) -> impl Iterator<Item = &Uuid> {
        self.modules.iter()
    }

    pub fn topics(&self) -> impl Iterator<Item = &Uuid> {
        self.topics.iter()
    }

    pub fn resources(&self) -> impl Iterator<Item = &Uuid> {
        self.resources.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ModuleProgress {
    pub module_id: Uuid,
    pub total_topics: usize,
    pub completed_topics: usize,
    /// An explicit module completion marker exists.
    pub completed: bool,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ProgramProgress {
    pub program_id: Uuid,
    pub total_topics: usize,
    pub completed_topics: usize,
    pub total_modules: usize,
    pub completed_modules: usize,
    pub percent: f64,
    pub percent_rounded: u32,
    pub completed: bool,
    pub modules: Vec<ModuleProgress>,
}

/// `completed / total * 100`, or 0 for an empty total.
pub fn percent(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    completed as f64 / total as f64 * 100.0
}

pub fn module_progress(module: &ModuleNode, done: &CompletionSet) -> ModuleProgress {
    let total_topics = module.topic_ids.len();
    let completed_topics = module
        .topic_ids
        .iter()
        .filter(|id| done.contains(ProgressKind::Topic, **id))
        .count();

    ModuleProgress {
        module_id: module.module_id,
        total_topics,
        completed_topics,
        completed: done.contains(ProgressKind::Module, module.module_id),
        percent: percent(completed_topics, total_topics),
    }
}

pub fn program_progress(tree: &ProgramTree, done: &CompletionSet) -> ProgramProgress {
    let modules: Vec<ModuleProgress> = tree
        .modules
        .iter()
        .map(|m| module_progress(m, done))
        .collect();

    let total_topics = modules.iter().map(|m| m.total_topics).sum();
    let completed_topics = modules.iter().map(|m| m.completed_topics).sum();
    let completed_modules = modules.iter().filter(|m| m.completed).count();
    let overall = percent(completed_topics, total_topics);

    ProgramProgress {
        program_id: tree.program_id,
        total_topics,
        completed_topics,
        total_modules: modules.len(),
        completed_modules,
        percent: overall,
        percent_rounded: overall.round() as u32,
        completed: done.contains(ProgressKind::Program, tree.program_id),
        modules,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    fn tree(topics_per_module: &[usize]) -> ProgramTree {
        ProgramTree {
            program_id: Uuid::new_v4(),
            modules: topics_per_module
                .iter()
                .map(|n| ModuleNode {
                    module_id: Uuid::new_v4(),
                    topic_ids: ids(*n),
                })
                .collect(),
        }
    }

    #[test]
    fn percent_spans_all_nested_modules() {
        let tree = tree(&[2, 3]);
        let mut done = CompletionSet::new();
        done.mark(ProgressKind::Topic, tree.modules[0].topic_ids[0]);
        done.mark(ProgressKind::Topic, tree.modules[1].topic_ids[2]);

        let progress = program_progress(&tree, &done);
        assert_eq!(progress.total_topics, 5);
        assert_eq!(progress.completed_topics, 2);
        assert!((progress.percent - 40.0).abs() < f64::EPSILON);
        assert_eq!(progress.percent_rounded, 40);
        assert_eq!(progress.modules[0].completed_topics, 1);
        assert!((progress.modules[0].percent - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_program_is_zero_percent() {
        let tree = tree(&[]);
        let progress = program_progress(&tree, &CompletionSet::new());
        assert_eq!(progress.total_topics, 0);
        assert_eq!(progress.percent, 0.0);
        assert_eq!(progress.total_modules, 0);
    }

    #[test]
    fn module_without_topics_is_zero_percent() {
        let tree = tree(&[0, 1]);
        let mut done = CompletionSet::new();
        done.mark(ProgressKind::Topic, tree.modules[1].topic_ids[0]);

        let progress = program_progress(&tree, &done);
        assert_eq!(progress.modules[0].percent, 0.0);
        assert_eq!(progress.percent, 100.0);
    }

    #[test]
    fn duplicate_markers_count_once() {
        let tree = tree(&[2]);
        let topic = tree.modules[0].topic_ids[0];
        let mut done = CompletionSet::new();
        done.record(None, None, None, Some(topic));
        done.record(None, None, None, Some(topic));

        let progress = program_progress(&tree, &done);
        assert_eq!(progress.completed_topics, 1);
        assert_eq!(progress.percent_rounded, 50);
    }

    #[test]
    fn foreign_topics_are_ignored() {
        let tree = tree(&[1]);
        let mut done = CompletionSet::new();
        done.mark(ProgressKind::Topic, Uuid::new_v4());

        assert_eq!(program_progress(&tree, &done).completed_topics, 0);
    }

    #[test]
    fn module_and_program_markers_are_reported() {
        let tree = tree(&[1, 1]);
        let mut done = CompletionSet::new();
        done.mark(ProgressKind::Module, tree.modules[1].module_id);
        done.mark(ProgressKind::Program, tree.program_id);

        let progress = program_progress(&tree, &done);
        assert_eq!(progress.completed_modules, 1);
        assert!(progress.modules[1].completed);
        assert!(!progress.modules[0].completed);
        assert!(progress.completed);
    }

    #[test]
    fn rounding_matches_display() {
        let tree = tree(&[3]);
        let mut done = CompletionSet::new();
        done.mark(ProgressKind::Topic, tree.modules[0].topic_ids[0]);
        done.mark(ProgressKind::Topic, tree.modules[0].topic_ids[1]);

        let progress = program_progress(&tree, &done);
        assert_eq!(progress.percent_rounded, 67);
    }

    #[test]
    fn tree_from_sorted_rows() {
        let program = Uuid::new_v4();
        let (m1, m2) = (Uuid::new_v4(), Uuid::new_v4());
        let (t1, t2) = (Uuid::new_v4(), Uuid::new_v4());

        let tree = ProgramTree::from_rows(
            program,
            vec![(m1, Some(t1)), (m1, Some(t2)), (m2, None)],
        );

        assert_eq!(tree.modules.len(), 2);
        assert_eq!(tree.modules[0].topic_ids, vec![t1, t2]);
        assert!(tree.modules[1].topic_ids.is_empty());
        assert_eq!(tree.total_topics(), 2);
    }

    #[test]
    fn kind_precedence() {
        let id = Some(Uuid::new_v4());
        assert_eq!(ProgressKind::infer(id, id, id, id), Some(ProgressKind::Program));
        assert_eq!(ProgressKind::infer(None, id, id, id), Some(ProgressKind::Module));
        assert_eq!(ProgressKind::infer(None, None, id, id), Some(ProgressKind::Resource));
        assert_eq!(ProgressKind::infer(None, None, None, id), Some(ProgressKind::Topic));
        assert_eq!(ProgressKind::infer(None, None, None, None), None);
    }

    #[test]
    fn kind_parses_from_column_value() {
        assert_eq!("topic".parse::<ProgressKind>(), Ok(ProgressKind::Topic));
        assert!("lesson".parse::<ProgressKind>().is_err());
    }
}
