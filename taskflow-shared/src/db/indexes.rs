/// Secondary indexes over the entity maps
///
/// Every index update is paired with the entity mutation that causes it. An
/// index never references a deleted entity and every live entity is reachable
/// from each index that applies to it.
///
/// Set-valued buckets are removed once empty, except the per-project task set
/// which lives exactly as long as its project. The activity and notification
/// lists keep the newest id at the front so bounded reads need no sort.

use std::collections::{HashMap, HashSet, VecDeque};
use std::hash::Hash;

use uuid::Uuid;

use super::Database;

#[derive(Debug, Default)]
pub(crate) struct Indexes {
    /// Lowercased email → user
    pub users_by_email: HashMap<String, Uuid>,
    pub users_by_username: HashMap<String, Uuid>,
    pub projects_by_owner: HashMap<Uuid, HashSet<Uuid>>,
    pub projects_by_member: HashMap<Uuid, HashSet<Uuid>>,
    pub tasks_by_project: HashMap<Uuid, HashSet<Uuid>>,
    pub tasks_by_assignee: HashMap<Uuid, HashSet<Uuid>>,
    /// Newest first
    pub activities_by_project: HashMap<Uuid, VecDeque<Uuid>>,
    /// Newest first
    pub notifications_by_user: HashMap<Uuid, VecDeque<Uuid>>,
}

/// Adds `id` to the bucket for `key`
pub(crate) fn attach<K: Eq + Hash>(index: &mut HashMap<K, HashSet<Uuid>>, key: K, id: Uuid) {
    index.entry(key).or_default().insert(id);
}

/// Removes `id` from the bucket for `key`, dropping the bucket when empty
pub(crate) fn detach<K: Eq + Hash>(index: &mut HashMap<K, HashSet<Uuid>>, key: &K, id: Uuid) {
    if let Some(bucket) = index.get_mut(key) {
        bucket.remove(&id);
        if bucket.is_empty() {
            index.remove(key);
        }
    }
}

impl Indexes {
    pub(crate) fn verify(&self, db: &Database) -> Vec<String> {
        let mut problems = Vec::new();

        for (email, id) in &self.users_by_email {
            match db.users.get(id) {
                Some(user) if user.email == *email => {}
                _ => problems.push(format!("email index entry {} -> {} is stale", email, id)),
            }
        }
        for (username, id) in &self.users_by_username {
            match db.users.get(id) {
                Some(user) if user.username == *username => {}
                _ => problems.push(format!("username index entry {} -> {} is stale", username, id)),
            }
        }
        for user in db.users.values() {
            if self.users_by_email.get(&user.email) != Some(&user.id) {
                problems.push(format!("user {} missing from email index", user.id));
            }
            if self.users_by_username.get(&user.username) != Some(&user.id) {
                problems.push(format!("user {} missing from username index", user.id));
            }
        }

        for (owner_id, ids) in &self.projects_by_owner {
            for id in ids {
                if !db.projects.get(id).is_some_and(|p| p.owner_id == *owner_id) {
                    problems.push(format!("owner index entry {} -> {} is stale", owner_id, id));
                }
            }
        }
        for (member_id, ids) in &self.projects_by_member {
            for id in ids {
                if !db.projects.get(id).is_some_and(|p| p.is_member(*member_id)) {
                    problems.push(format!("member index entry {} -> {} is stale", member_id, id));
                }
            }
        }
        for project in db.projects.values() {
            if !bucket_contains(&self.projects_by_owner, &project.owner_id, project.id) {
                problems.push(format!("project {} missing from owner index", project.id));
            }
            for member_id in &project.member_ids {
                if !bucket_contains(&self.projects_by_member, member_id, project.id) {
                    problems.push(format!("project {} missing from member index of {}", project.id, member_id));
                }
            }
            if !self.tasks_by_project.contains_key(&project.id) {
                problems.push(format!("project {} has no task set", project.id));
            }
        }

        for (project_id, ids) in &self.tasks_by_project {
            if !db.projects.contains_key(project_id) {
                problems.push(format!("task set for deleted project {}", project_id));
            }
            for id in ids {
                if !db.tasks.get(id).is_some_and(|t| t.project_id == *project_id) {
                    problems.push(format!("project task entry {} -> {} is stale", project_id, id));
                }
            }
        }
        for (assignee_id, ids) in &self.tasks_by_assignee {
            for id in ids {
                if !db.tasks.get(id).is_some_and(|t| t.assignee_id == Some(*assignee_id)) {
                    problems.push(format!("assignee index entry {} -> {} is stale", assignee_id, id));
                }
            }
        }
        for task in db.tasks.values() {
            if !bucket_contains(&self.tasks_by_project, &task.project_id, task.id) {
                problems.push(format!("task {} missing from project index", task.id));
            }
            if let Some(assignee_id) = task.assignee_id {
                if !bucket_contains(&self.tasks_by_assignee, &assignee_id, task.id) {
                    problems.push(format!("task {} missing from assignee index", task.id));
                }
            }
            for dep in task.depends_on.iter().chain(&task.blocked_by) {
                if !db.tasks.contains_key(dep) {
                    problems.push(format!("task {} references deleted task {}", task.id, dep));
                }
            }
        }

        for (project_id, ids) in &self.activities_by_project {
            for id in ids {
                if !db.activities.get(id).is_some_and(|a| a.project_id == Some(*project_id)) {
                    problems.push(format!("activity feed entry {} -> {} is stale", project_id, id));
                }
            }
        }
        for activity in db.activities.values() {
            if let Some(project_id) = activity.project_id {
                let listed = self
                    .activities_by_project
                    .get(&project_id)
                    .is_some_and(|ids| ids.contains(&activity.id));
                if !listed {
                    problems.push(format!("activity {} missing from project feed", activity.id));
                }
            }
        }

        for (user_id, ids) in &self.notifications_by_user {
            for id in ids {
                if !db.notifications.get(id).is_some_and(|n| n.user_id == *user_id) {
                    problems.push(format!("notification index entry {} -> {} is stale", user_id, id));
                }
            }
        }
        for notification in db.notifications.values() {
            let listed = self
                .notifications_by_user
                .get(&notification.user_id)
                .is_some_and(|ids| ids.contains(&notification.id));
            if !listed {
                problems.push(format!("notification {} missing from user index", notification.id));
            }
        }

        problems
    }
}

fn bucket_contains<K: Eq + Hash>(index: &HashMap<K, HashSet<Uuid>>, key: &K, id: Uuid) -> bool {
    index.get(key).is_some_and(|bucket| bucket.contains(&id))
}
