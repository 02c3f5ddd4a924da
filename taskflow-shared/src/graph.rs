/// Task dependency cycle detection
///
/// The dependency graph has an edge `task → dep` for every id in a task's
/// `depends_on`. The graph must stay acyclic, directly and transitively.
///
/// Validation overlays the candidate task's proposed `depends_on` on top of
/// the stored graph (the candidate's stored edges, if any, are ignored) and
/// runs an iterative three-colour depth-first search from the candidate. Every
/// other node is followed through its *stored* edges. Ids with no stored task
/// are treated as leaves.
///
/// Cost is O(V + E) over the nodes reachable from the candidate, with a fresh
/// visited set per call.
///
/// # Example
///
/// ```
/// use std::collections::HashMap;
/// use taskflow_shared::graph::find_cycle;
/// use uuid::Uuid;
///
/// let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
///
/// // b depends on a
/// let mut edges: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
/// edges.insert(a, vec![]);
/// edges.insert(b, vec![a]);
///
/// // a depending on b closes the loop a → b → a
/// let cycle = find_cycle(&edges, a, &[b]).unwrap();
/// assert_eq!(cycle, vec![a, b, a]);
///
/// // a depending on nothing is fine
/// assert!(find_cycle(&edges, a, &[]).is_none());
/// ```

use std::collections::HashMap;

use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::models::Task;

/// Read access to stored dependency edges
pub trait DependencyLookup {
    /// Stored `depends_on` of `task_id`, empty when unknown
    fn depends_on(&self, task_id: Uuid) -> &[Uuid];
}

impl DependencyLookup for HashMap<Uuid, Task> {
    fn depends_on(&self, task_id: Uuid) -> &[Uuid] {
        self.get(&task_id)
            .map(|task| task.depends_on.as_slice())
            .unwrap_or(&[])
    }
}

impl DependencyLookup for HashMap<Uuid, Vec<Uuid>> {
    fn depends_on(&self, task_id: Uuid) -> &[Uuid] {
        self.get(&task_id).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Stored graph with the candidate's edges swapped out
struct Overlay<'a, L: ?Sized> {
    lookup: &'a L,
    candidate: Uuid,
    depends_on: &'a [Uuid],
}

impl<'a, L: DependencyLookup + ?Sized> Overlay<'a, L> {
    fn edges(&self, id: Uuid) -> &'a [Uuid] {
        if id == self.candidate {
            self.depends_on
        } else {
            let lookup: &'a L = self.lookup;
            lookup.depends_on(id)
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    OnPath,
    Done,
}

/// Looks for a cycle reachable from `candidate` once its edges are replaced
///
/// Returns the cycle as a path that starts and ends at the same task, or
/// `None` when the proposed edges keep the graph acyclic.
pub fn find_cycle<L>(lookup: &L, candidate: Uuid, depends_on: &[Uuid]) -> Option<Vec<Uuid>>
where
    L: DependencyLookup + ?Sized,
{
    let overlay = Overlay {
        lookup,
        candidate,
        depends_on,
    };

    let mut marks: HashMap<Uuid, Mark> = HashMap::new();
    let mut stack: Vec<(Uuid, usize)> = vec![(candidate, 0)];
    marks.insert(candidate, Mark::OnPath);

    while let Some(&(node, next_edge)) = stack.last() {
        let Some(&next) = overlay.edges(node).get(next_edge) else {
            marks.insert(node, Mark::Done);
            stack.pop();
            continue;
        };

        if let Some(frame) = stack.last_mut() {
            frame.1 += 1;
        }

        match marks.get(&next) {
            Some(Mark::OnPath) => {
                let start = stack
                    .iter()
                    .position(|(id, _)| *id == next)
                    .unwrap_or(0);
                let mut cycle: Vec<Uuid> = stack[start..].iter().map(|(id, _)| *id).collect();
                cycle.push(next);
                return Some(cycle);
            }
            Some(Mark::Done) => {}
            None => {
                marks.insert(next, Mark::OnPath);
                stack.push((next, 0));
            }
        }
    }

    None
}

/// Rejects `depends_on` for `task_id` if it would introduce a cycle
///
/// # Errors
///
/// Returns `StoreError::CircularDependency` carrying the offending path.
pub fn validate_dependencies<L>(lookup: &L, task_id: Uuid, depends_on: &[Uuid]) -> StoreResult<()>
where
    L: DependencyLookup + ?Sized,
{
    match find_cycle(lookup, task_id, depends_on) {
        Some(path) => {
            tracing::debug!(task_id = %task_id, cycle_len = path.len(), "Rejected circular dependency");
            Err(StoreError::CircularDependency { task_id, path })
        }
        None => Ok(()),
    }
}
