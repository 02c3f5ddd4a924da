/// Task operations
///
/// A task belongs to one project for its whole life. Its `depends_on` edges
/// must stay acyclic and, like `blocked_by`, may only name tasks of the same
/// project. Deleting a task strips its id from every other task.

use std::collections::HashSet;

use chrono::Utc;
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;
use validator::Validate;

use super::indexes::{attach, detach};
use super::{dedup_ids, trim_in_place, Database};
use crate::error::{EntityKind, StoreError, StoreResult};
use crate::events::{Channel, EventKind};
use crate::graph;
use crate::models::activity::NewActivity;
use crate::models::{
    task_action_url, ActivityType, CreateNotification, CreateTask, NotificationType, Project, Task,
    TaskFilter, UpdateTask,
};

impl Database {
    /// Creates a task
    ///
    /// An unset `position` places the task after every existing task of the
    /// project. Assigning someone other than the creator notifies them.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` for a bad title, negative hours, an assignee
    ///   outside the project or a dependency in another project
    /// - `NotFound` for an unknown project, creator, assignee or dependency
    /// - `CircularDependency` if `depends_on` would close a cycle
    pub fn create_task(&mut self, mut data: CreateTask) -> StoreResult<Task> {
        trim_in_place(&mut data.title);
        trim_in_place(&mut data.description);
        data.validate()?;
        check_hours("estimated_hours", data.estimated_hours)?;
        check_hours("actual_hours", data.actual_hours)?;

        let project = self
            .projects
            .get(&data.project_id)
            .ok_or_else(|| StoreError::not_found(EntityKind::Project, data.project_id))?;
        if !self.users.contains_key(&data.creator_id) {
            return Err(StoreError::not_found(EntityKind::User, data.creator_id));
        }
        if let Some(assignee_id) = data.assignee_id {
            self.check_assignee(project, assignee_id)?;
        }

        dedup_ids(&mut data.depends_on);
        dedup_ids(&mut data.blocked_by);
        self.check_task_refs(data.project_id, "depends_on", &data.depends_on)?;
        self.check_task_refs(data.project_id, "blocked_by", &data.blocked_by)?;

        let id = Uuid::new_v4();
        graph::validate_dependencies(&self.tasks, id, &data.depends_on)?;

        let now = Utc::now();
        let position = match data.position {
            Some(position) => position,
            None => self.next_position(data.project_id)?,
        };
        let task = Task {
            id,
            title: data.title,
            description: data.description,
            project_id: data.project_id,
            assignee_id: data.assignee_id,
            creator_id: data.creator_id,
            status: data.status,
            priority: data.priority,
            tags: clean_tags(data.tags),
            depends_on: data.depends_on,
            blocked_by: data.blocked_by,
            estimated_hours: data.estimated_hours,
            actual_hours: data.actual_hours,
            due_date: data.due_date,
            completed_at: data.status.is_completed().then_some(now),
            created_at: now,
            updated_at: now,
            position,
            comments: Vec::new(),
            attachments: Vec::new(),
        };

        attach(&mut self.indexes.tasks_by_project, task.project_id, id);
        if let Some(assignee_id) = task.assignee_id {
            attach(&mut self.indexes.tasks_by_assignee, assignee_id, id);
        }
        self.tasks.insert(id, task.clone());

        self.log_activity(
            NewActivity::new(
                task.creator_id,
                ActivityType::TaskCreated,
                format!("Created task \"{}\"", task.title),
            )
            .project(task.project_id)
            .task(id)
            .meta("status", task.status.as_str()),
        );
        if task.assignee_id.is_some_and(|assignee| assignee != task.creator_id) {
            self.record_assignment(&task, task.creator_id);
        }

        tracing::debug!(
            task_id = %id,
            project_id = %task.project_id,
            position = task.position,
            "Task created"
        );
        self.broadcaster
            .publish(Channel::project(task.project_id, EventKind::TaskCreated), &task);
        Ok(task)
    }

    pub fn get_task(&self, id: Uuid) -> Option<&Task> {
        self.tasks.get(&id)
    }

    /// Applies an update on behalf of `actor_id`
    ///
    /// Moving into `completed` stamps `completed_at`, moving out clears it.
    /// Every call records one `task_updated` activity whose `changes` metadata
    /// holds the fields supplied. A real transition into `completed` also
    /// records `task_completed`, and a new assignee other than the actor is
    /// notified.
    ///
    /// # Errors
    ///
    /// Same as [`Database::create_task`], plus `NotFound` for an unknown task
    /// and `ValidationFailed` when a task lists itself in `blocked_by`.
    pub fn update_task(&mut self, id: Uuid, mut changes: UpdateTask, actor_id: Uuid) -> StoreResult<Task> {
        let current = self
            .tasks
            .get(&id)
            .ok_or_else(|| StoreError::not_found(EntityKind::Task, id))?;
        let project_id = current.project_id;
        let previous_status = current.status;
        let previous_assignee = current.assignee_id;

        if let Some(title) = changes.title.as_mut() {
            trim_in_place(title);
        }
        if let Some(description) = changes.description.as_mut() {
            trim_in_place(description);
        }
        changes.validate()?;
        check_hours("estimated_hours", changes.estimated_hours.flatten())?;
        check_hours("actual_hours", changes.actual_hours.flatten())?;

        if let Some(Some(assignee_id)) = changes.assignee_id {
            let project = self
                .projects
                .get(&project_id)
                .ok_or_else(|| StoreError::not_found(EntityKind::Project, project_id))?;
            self.check_assignee(project, assignee_id)?;
        }
        if let Some(depends_on) = changes.depends_on.as_mut() {
            dedup_ids(depends_on);
            self.check_task_refs(project_id, "depends_on", depends_on.as_slice())?;
            graph::validate_dependencies(&self.tasks, id, depends_on.as_slice())?;
        }
        if let Some(blocked_by) = changes.blocked_by.as_mut() {
            dedup_ids(blocked_by);
            if blocked_by.contains(&id) {
                return Err(StoreError::invalid("blocked_by", "A task cannot block itself"));
            }
            self.check_task_refs(project_id, "blocked_by", blocked_by.as_slice())?;
        }
        if let Some(tags) = changes.tags.take() {
            changes.tags = Some(clean_tags(tags));
        }

        let change_log = serde_json::to_value(&changes).unwrap_or(JsonValue::Null);
        let now = Utc::now();

        let task = self
            .tasks
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found(EntityKind::Task, id))?;

        if let Some(title) = changes.title {
            task.title = title;
        }
        if let Some(description) = changes.description {
            task.description = description;
        }
        if let Some(status) = changes.status {
            if status.is_completed() && !previous_status.is_completed() {
                task.completed_at = Some(now);
            } else if !status.is_completed() && previous_status.is_completed() {
                task.completed_at = None;
            }
            task.status = status;
        }
        if let Some(priority) = changes.priority {
            task.priority = priority;
        }
        if let Some(assignee_id) = changes.assignee_id {
            task.assignee_id = assignee_id;
        }
        if let Some(tags) = changes.tags {
            task.tags = tags;
        }
        if let Some(depends_on) = changes.depends_on {
            task.depends_on = depends_on;
        }
        if let Some(blocked_by) = changes.blocked_by {
            task.blocked_by = blocked_by;
        }
        if let Some(estimated_hours) = changes.estimated_hours {
            task.estimated_hours = estimated_hours;
        }
        if let Some(actual_hours) = changes.actual_hours {
            task.actual_hours = actual_hours;
        }
        if let Some(due_date) = changes.due_date {
            task.due_date = due_date;
        }
        if let Some(position) = changes.position {
            task.position = position;
        }
        task.updated_at = now;
        let task = task.clone();

        if task.assignee_id != previous_assignee {
            if let Some(old) = previous_assignee {
                detach(&mut self.indexes.tasks_by_assignee, &old, id);
            }
            if let Some(new) = task.assignee_id {
                attach(&mut self.indexes.tasks_by_assignee, new, id);
            }
        }

        self.log_activity(
            NewActivity::new(actor_id, ActivityType::TaskUpdated, format!("Updated task \"{}\"", task.title))
                .project(project_id)
                .task(id)
                .meta("changes", change_log),
        );
        if task.status.is_completed() && !previous_status.is_completed() {
            self.record_completion(&task, actor_id);
        }
        if let Some(assignee_id) = task.assignee_id {
            if Some(assignee_id) != previous_assignee && assignee_id != actor_id {
                self.record_assignment(&task, actor_id);
            }
        }

        tracing::debug!(task_id = %id, actor_id = %actor_id, status = task.status.as_str(), "Task updated");
        self.broadcaster
            .publish(Channel::project(project_id, EventKind::TaskUpdated), &task);
        Ok(task)
    }

    /// Deletes a task and strips its id from every other task
    ///
    /// Returns `false` if the task does not exist.
    pub fn delete_task(&mut self, id: Uuid) -> bool {
        let Some(task) = self.remove_task_record(id) else {
            return false;
        };

        tracing::debug!(task_id = %id, project_id = %task.project_id, "Task deleted");
        self.broadcaster.publish(
            Channel::project(task.project_id, EventKind::TaskDeleted),
            &json!({ "id": id, "project_id": task.project_id }),
        );
        true
    }

    /// Tasks of a project matching every filter, ordered by position
    pub fn get_tasks_by_project(&self, project_id: Uuid, filter: &TaskFilter) -> Vec<&Task> {
        let Some(ids) = self.indexes.tasks_by_project.get(&project_id) else {
            return Vec::new();
        };

        let mut tasks: Vec<&Task> = ids
            .iter()
            .filter_map(|id| self.tasks.get(id))
            .filter(|task| filter.matches(task))
            .collect();
        tasks.sort_by_key(|task| (task.position, task.created_at));
        tasks
    }

    /// Tasks assigned to a user, soonest due first
    pub fn get_tasks_by_assignee(&self, user_id: Uuid) -> Vec<&Task> {
        let Some(ids) = self.indexes.tasks_by_assignee.get(&user_id) else {
            return Vec::new();
        };

        let mut tasks: Vec<&Task> = ids.iter().filter_map(|id| self.tasks.get(id)).collect();
        tasks.sort_by_key(|task| (task.due_date.is_none(), task.due_date, task.created_at));
        tasks
    }

    /// Removes a task from the entity map and every index
    pub(crate) fn remove_task_record(&mut self, id: Uuid) -> Option<Task> {
        let task = self.tasks.remove(&id)?;

        if let Some(bucket) = self.indexes.tasks_by_project.get_mut(&task.project_id) {
            bucket.remove(&id);
        }
        if let Some(assignee_id) = task.assignee_id {
            detach(&mut self.indexes.tasks_by_assignee, &assignee_id, id);
        }

        for other in self.tasks.values_mut().filter(|other| other.references(id)) {
            other.depends_on.retain(|dep| *dep != id);
            other.blocked_by.retain(|blocker| *blocker != id);
        }
        Some(task)
    }

    fn check_assignee(&self, project: &Project, assignee_id: Uuid) -> StoreResult<()> {
        if !self.users.contains_key(&assignee_id) {
            return Err(StoreError::not_found(EntityKind::User, assignee_id));
        }
        if !project.has_access(assignee_id) {
            return Err(StoreError::invalid("assignee_id", "Assignee must be a project member"));
        }
        Ok(())
    }

    fn check_task_refs(&self, project_id: Uuid, field: &'static str, ids: &[Uuid]) -> StoreResult<()> {
        for id in ids {
            let task = self
                .tasks
                .get(id)
                .ok_or_else(|| StoreError::not_found(EntityKind::Task, *id))?;
            if task.project_id != project_id {
                return Err(StoreError::invalid(field, "Referenced task belongs to another project"));
            }
        }
        Ok(())
    }

    /// One past the highest position in the project, or 1 for an empty project
    fn next_position(&self, project_id: Uuid) -> StoreResult<i64> {
        let max = self
            .indexes
            .tasks_by_project
            .get(&project_id)
            .and_then(|ids| ids.iter().filter_map(|id| self.tasks.get(id)).map(|t| t.position).max())
            .unwrap_or(0);
        max.max(0)
            .checked_add(1)
            .ok_or_else(|| StoreError::invalid("position", "No position left after the last task in the project"))
    }

    fn record_assignment(&mut self, task: &Task, actor_id: Uuid) {
        let Some(assignee_id) = task.assignee_id else {
            return;
        };
        let actor = self.display_name(actor_id);
        let assignee = self.display_name(assignee_id);

        self.log_activity(
            NewActivity::new(
                actor_id,
                ActivityType::UserAssigned,
                format!("Assigned \"{}\" to {}", task.title, assignee),
            )
            .project(task.project_id)
            .task(task.id)
            .meta("assignee_id", assignee_id.to_string()),
        );
        self.push_notification(CreateNotification {
            user_id: assignee_id,
            notification_type: NotificationType::Assignment,
            title: "New task assigned".to_string(),
            message: format!("{} assigned you to \"{}\"", actor, task.title),
            action_url: Some(task_action_url(task.project_id, task.id)),
        });
        self.broadcaster.publish(
            Channel::user(assignee_id, EventKind::UserAssigned),
            &json!({ "task": task, "assigned_by": actor_id }),
        );
    }

    fn record_completion(&mut self, task: &Task, actor_id: Uuid) {
        self.log_activity(
            NewActivity::new(
                actor_id,
                ActivityType::TaskCompleted,
                format!("Completed task \"{}\"", task.title),
            )
            .project(task.project_id)
            .task(task.id),
        );

        if task.creator_id != actor_id && self.users.contains_key(&task.creator_id) {
            let actor = self.display_name(actor_id);
            self.push_notification(CreateNotification {
                user_id: task.creator_id,
                notification_type: NotificationType::TaskCompleted,
                title: "Task completed".to_string(),
                message: format!("{} completed \"{}\"", actor, task.title),
                action_url: Some(task_action_url(task.project_id, task.id)),
            });
        }
    }
}

/// Trims tags and drops blanks and repeats
fn clean_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty() && seen.insert(tag.clone()))
        .collect()
}

fn check_hours(field: &'static str, hours: Option<f64>) -> StoreResult<()> {
    match hours {
        Some(h) if !h.is_finite() || h < 0.0 => Err(StoreError::invalid(field, "Hours must be a non-negative number")),
        _ => Ok(()),
    }
}
