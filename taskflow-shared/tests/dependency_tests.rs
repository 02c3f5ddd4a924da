/// Integration tests for task dependency validation
///
/// Verifies that no sequence of creates and updates can leave a cycle in the
/// `depends_on` graph, and that a rejected change is not persisted.

mod common;

use std::collections::{HashMap, HashSet};

use common::TestContext;
use taskflow_shared::models::{Task, TaskFilter, UpdateTask};
use taskflow_shared::StoreError;
use uuid::Uuid;

/// Follows stored `depends_on` edges from every task and fails on a revisit
fn assert_acyclic(tasks: &[&Task]) {
    let edges: HashMap<Uuid, &Vec<Uuid>> = tasks.iter().map(|t| (t.id, &t.depends_on)).collect();

    for start in tasks {
        let mut stack: Vec<Uuid> = start.depends_on.clone();
        let mut seen = HashSet::new();
        while let Some(id) = stack.pop() {
            assert_ne!(id, start.id, "task {} reaches itself", start.title);
            if seen.insert(id) {
                if let Some(next) = edges.get(&id) {
                    stack.extend(next.iter().copied());
                }
            }
        }
    }
}

#[test]
fn test_reverse_edge_rejected() {
    let mut ctx = TestContext::new().unwrap();
    let t1 = ctx.task("T1", vec![]).unwrap();
    let t2 = ctx.task("T2", vec![t1.id]).unwrap();

    let err = ctx
        .db
        .update_task(t1.id, UpdateTask { depends_on: Some(vec![t2.id]), ..Default::default() }, ctx.owner.id)
        .unwrap_err();

    match err {
        StoreError::CircularDependency { task_id, path } => {
            assert_eq!(task_id, t1.id);
            assert_eq!(path, vec![t1.id, t2.id, t1.id]);
        }
        other => panic!("expected circular dependency, got {other:?}"),
    }
    assert!(ctx.db.get_task(t1.id).unwrap().depends_on.is_empty());
}

#[test]
fn test_closing_a_long_chain_rejected_at_every_link() {
    let mut ctx = TestContext::new().unwrap();
    let mut chain: Vec<Uuid> = Vec::new();
    for i in 0..8 {
        let deps = chain.last().map(|id| vec![*id]).unwrap_or_default();
        chain.push(ctx.task(&format!("link {}", i), deps).unwrap().id);
    }

    let tail = *chain.last().unwrap();
    for (i, id) in chain.iter().enumerate() {
        let mut depends_on = ctx.db.get_task(*id).unwrap().depends_on.clone();
        depends_on.push(tail);
        let result = ctx
            .db
            .update_task(*id, UpdateTask { depends_on: Some(depends_on), ..Default::default() }, ctx.owner.id);
        assert!(
            matches!(result, Err(StoreError::CircularDependency { .. })),
            "link {} accepted a cycle",
            i
        );
    }

    assert_acyclic(&ctx.db.get_tasks_by_project(ctx.project_id, &TaskFilter::default()));
}

#[test]
fn test_diamond_and_rewiring_accepted() {
    let mut ctx = TestContext::new().unwrap();
    let base = ctx.task("base", vec![]).unwrap();
    let left = ctx.task("left", vec![base.id]).unwrap();
    let right = ctx.task("right", vec![base.id]).unwrap();
    let top = ctx.task("top", vec![left.id, right.id]).unwrap();

    // right now depends on left as well; still a DAG
    ctx.db
        .update_task(
            right.id,
            UpdateTask { depends_on: Some(vec![base.id, left.id]), ..Default::default() },
            ctx.owner.id,
        )
        .unwrap();

    // left depending on right would now close left → right → left
    let err = ctx
        .db
        .update_task(left.id, UpdateTask { depends_on: Some(vec![right.id]), ..Default::default() }, ctx.owner.id)
        .unwrap_err();
    assert!(matches!(err, StoreError::CircularDependency { .. }));

    // dropping all edges from top and pointing base at it is fine
    ctx.db
        .update_task(top.id, UpdateTask { depends_on: Some(vec![]), ..Default::default() }, ctx.owner.id)
        .unwrap();
    ctx.db
        .update_task(base.id, UpdateTask { depends_on: Some(vec![top.id]), ..Default::default() }, ctx.owner.id)
        .unwrap();

    assert_acyclic(&ctx.db.get_tasks_by_project(ctx.project_id, &TaskFilter::default()));
}

#[test]
fn test_repeated_dependency_ids_are_collapsed() {
    let mut ctx = TestContext::new().unwrap();
    let a = ctx.task("a", vec![]).unwrap();
    let b = ctx.task("b", vec![a.id, a.id]).unwrap();
    assert_eq!(b.depends_on, vec![a.id]);
}
