/// Project operations
///
/// The owner is fixed at creation and is never listed in `member_ids`.
/// Deleting a project cascades to its tasks and its activity feed.

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use super::indexes::{attach, detach};
use super::{dedup_ids, trim_in_place, Database};
use crate::error::{EntityKind, StoreError, StoreResult};
use crate::events::{Channel, EventKind};
use crate::models::activity::NewActivity;
use crate::models::{
    project_action_url, ActivityType, CreateNotification, CreateProject, NotificationType, Project,
    TaskCounts, TaskStatus, UpdateProject,
};

impl Database {
    /// Creates a project
    ///
    /// Unknown member ids, repeats and the owner are dropped from
    /// `member_ids`. Each remaining member receives a `project_invite`
    /// notification.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` for a bad name or an end date before the start
    /// - `NotFound` if the owner does not exist
    pub fn create_project(&mut self, mut data: CreateProject) -> StoreResult<Project> {
        trim_in_place(&mut data.name);
        trim_in_place(&mut data.description);
        data.validate()?;

        if !self.users.contains_key(&data.owner_id) {
            return Err(StoreError::not_found(EntityKind::User, data.owner_id));
        }

        let now = Utc::now();
        let start_date = data.start_date.unwrap_or(now);
        if data.end_date.is_some_and(|end| end < start_date) {
            return Err(StoreError::invalid("end_date", "End date must not precede start date"));
        }

        let member_ids = self.clean_member_ids(data.owner_id, data.member_ids);
        let project = Project {
            id: Uuid::new_v4(),
            name: data.name,
            description: data.description,
            owner_id: data.owner_id,
            member_ids,
            status: data.status,
            priority: data.priority,
            start_date,
            end_date: data.end_date,
            created_at: now,
            updated_at: now,
            settings: data.settings,
        };

        attach(&mut self.indexes.projects_by_owner, project.owner_id, project.id);
        for member_id in &project.member_ids {
            attach(&mut self.indexes.projects_by_member, *member_id, project.id);
        }
        self.indexes.tasks_by_project.insert(project.id, Default::default());
        self.projects.insert(project.id, project.clone());

        self.log_activity(
            NewActivity::new(
                project.owner_id,
                ActivityType::ProjectCreated,
                format!("Created project \"{}\"", project.name),
            )
            .project(project.id),
        );
        self.invite_members(&project, &project.member_ids);

        tracing::debug!(
            project_id = %project.id,
            owner_id = %project.owner_id,
            members = project.member_ids.len(),
            "Project created"
        );
        Ok(project)
    }

    pub fn get_project(&self, id: Uuid) -> Option<&Project> {
        self.projects.get(&id)
    }

    /// Applies an update and publishes `project:updated`
    ///
    /// A new `member_ids` list is cleaned like on creation. Members not in the
    /// previous list are invited.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the project does not exist
    /// - `ValidationFailed` for a bad name or inverted dates
    pub fn update_project(&mut self, id: Uuid, mut changes: UpdateProject) -> StoreResult<Project> {
        let Some(current) = self.projects.get(&id) else {
            return Err(StoreError::not_found(EntityKind::Project, id));
        };

        if let Some(name) = changes.name.as_mut() {
            trim_in_place(name);
        }
        if let Some(description) = changes.description.as_mut() {
            trim_in_place(description);
        }
        changes.validate()?;

        let start_date = changes.start_date.unwrap_or(current.start_date);
        let end_date = changes.end_date.unwrap_or(current.end_date);
        if end_date.is_some_and(|end| end < start_date) {
            return Err(StoreError::invalid("end_date", "End date must not precede start date"));
        }

        let owner_id = current.owner_id;
        let previous_members = current.member_ids.clone();
        let new_members = changes
            .member_ids
            .take()
            .map(|ids| self.clean_member_ids(owner_id, ids));

        let Some(project) = self.projects.get_mut(&id) else {
            return Err(StoreError::not_found(EntityKind::Project, id));
        };

        if let Some(name) = changes.name {
            project.name = name;
        }
        if let Some(description) = changes.description {
            project.description = description;
        }
        if let Some(status) = changes.status {
            project.status = status;
        }
        if let Some(priority) = changes.priority {
            project.priority = priority;
        }
        if let Some(settings) = changes.settings {
            project.settings = settings;
        }
        project.start_date = start_date;
        project.end_date = end_date;

        let mut invited = Vec::new();
        if let Some(members) = new_members {
            for removed in previous_members.iter().filter(|m| !members.contains(m)) {
                detach(&mut self.indexes.projects_by_member, removed, id);
            }
            for added in members.iter().filter(|m| !previous_members.contains(m)) {
                attach(&mut self.indexes.projects_by_member, *added, id);
                invited.push(*added);
            }
            project.member_ids = members;
        }
        project.updated_at = Utc::now();

        let project = project.clone();
        self.invite_members(&project, &invited);

        tracing::debug!(project_id = %id, invited = invited.len(), "Project updated");
        self.broadcaster
            .publish(Channel::project(id, EventKind::ProjectUpdated), &project);
        Ok(project)
    }

    /// Deletes a project with all of its tasks and activity
    ///
    /// Returns `false` if the project does not exist.
    pub fn delete_project(&mut self, id: Uuid) -> bool {
        let Some(project) = self.projects.remove(&id) else {
            return false;
        };

        let task_ids = self.indexes.tasks_by_project.remove(&id).unwrap_or_default();
        for task_id in &task_ids {
            self.remove_task_record(*task_id);
        }

        detach(&mut self.indexes.projects_by_owner, &project.owner_id, id);
        for member_id in &project.member_ids {
            detach(&mut self.indexes.projects_by_member, member_id, id);
        }
        let activities = self.purge_project_activity(id);

        tracing::debug!(
            project_id = %id,
            tasks = task_ids.len(),
            activities,
            "Project deleted"
        );
        true
    }

    /// Projects a user owns or belongs to, most recently updated first
    pub fn get_projects_by_user(&self, user_id: Uuid) -> Vec<&Project> {
        let owned = self.indexes.projects_by_owner.get(&user_id).into_iter().flatten();
        let joined = self.indexes.projects_by_member.get(&user_id).into_iter().flatten();

        let mut ids: Vec<Uuid> = owned.chain(joined).copied().collect();
        dedup_ids(&mut ids);

        let mut projects: Vec<&Project> = ids.iter().filter_map(|id| self.projects.get(id)).collect();
        projects.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.name.cmp(&b.name)));
        projects
    }

    /// Number of tasks per status
    pub fn project_task_counts(&self, project_id: Uuid) -> StoreResult<TaskCounts> {
        let ids = self
            .indexes
            .tasks_by_project
            .get(&project_id)
            .ok_or_else(|| StoreError::not_found(EntityKind::Project, project_id))?;

        let mut counts = TaskCounts::default();
        for task in ids.iter().filter_map(|id| self.tasks.get(id)) {
            counts.total += 1;
            match task.status {
                TaskStatus::Todo => counts.todo += 1,
                TaskStatus::InProgress => counts.in_progress += 1,
                TaskStatus::Review => counts.review += 1,
                TaskStatus::Completed => counts.completed += 1,
            }
        }
        Ok(counts)
    }

    fn clean_member_ids(&self, owner_id: Uuid, mut ids: Vec<Uuid>) -> Vec<Uuid> {
        ids.retain(|id| *id != owner_id && self.users.contains_key(id));
        dedup_ids(&mut ids);
        ids
    }

    fn invite_members(&mut self, project: &Project, member_ids: &[Uuid]) {
        if member_ids.is_empty() {
            return;
        }
        let inviter = self.display_name(project.owner_id);
        for member_id in member_ids {
            self.push_notification(CreateNotification {
                user_id: *member_id,
                notification_type: NotificationType::ProjectInvite,
                title: "Added to project".to_string(),
                message: format!("{} added you to \"{}\"", inviter, project.name),
                action_url: Some(project_action_url(project.id)),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateUser, NotificationQuery, ProjectStatus};
    use chrono::Duration;

    fn user(db: &mut Database, username: &str) -> Uuid {
        db.create_user(CreateUser {
            email: format!("{}@example.com", username),
            username: username.to_string(),
            first_name: username.to_string(),
            last_name: String::new(),
            avatar: None,
            role: Default::default(),
            preferences: Default::default(),
        })
        .unwrap()
        .id
    }

    fn new_project(owner_id: Uuid, member_ids: Vec<Uuid>) -> CreateProject {
        CreateProject {
            name: "Apollo".to_string(),
            description: String::new(),
            owner_id,
            member_ids,
            status: ProjectStatus::Active,
            priority: Default::default(),
            start_date: None,
            end_date: None,
            settings: Default::default(),
        }
    }

    #[test]
    fn test_create_project_cleans_members_and_invites() {
        let mut db = Database::new();
        let owner = user(&mut db, "owner");
        let member = user(&mut db, "member");

        let project = db
            .create_project(new_project(owner, vec![member, owner, Uuid::new_v4(), member]))
            .unwrap();

        assert_eq!(project.member_ids, vec![member]);
        assert_eq!(project.start_date, project.created_at);

        let invites = db.get_notifications_by_user(member, NotificationQuery::default());
        assert_eq!(invites.len(), 1);
        assert_eq!(invites[0].notification_type, NotificationType::ProjectInvite);
        assert!(db.get_notifications_by_user(owner, NotificationQuery::default()).is_empty());

        let feed = db.get_activities_by_project(project.id, None);
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].activity_type, ActivityType::ProjectCreated);
        assert!(db.verify_integrity().is_empty());
    }

    #[test]
    fn test_create_project_errors() {
        let mut db = Database::new();
        let err = db.create_project(new_project(Uuid::new_v4(), vec![])).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: EntityKind::User, .. }));

        let owner = user(&mut db, "owner");
        let mut data = new_project(owner, vec![]);
        data.name = "   ".to_string();
        assert!(matches!(
            db.create_project(data).unwrap_err(),
            StoreError::ValidationFailed(_)
        ));

        let mut data = new_project(owner, vec![]);
        data.name = "x".repeat(101);
        assert!(db.create_project(data).is_err());

        let mut data = new_project(owner, vec![]);
        let start = Utc::now();
        data.start_date = Some(start);
        data.end_date = Some(start - Duration::days(1));
        assert!(db.create_project(data).is_err());

        assert!(db.get_projects_by_user(owner).is_empty());
    }

    #[test]
    fn test_update_project_members_reindexed() {
        let mut db = Database::new();
        let owner = user(&mut db, "owner");
        let a = user(&mut db, "a");
        let b = user(&mut db, "b");
        let project = db.create_project(new_project(owner, vec![a])).unwrap();

        let updated = db
            .update_project(
                project.id,
                UpdateProject {
                    member_ids: Some(vec![b]),
                    end_date: Some(Some(Utc::now() + Duration::days(30))),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.member_ids, vec![b]);
        assert!(updated.updated_at >= project.updated_at);
        assert!(db.get_projects_by_user(a).is_empty());
        assert_eq!(db.get_projects_by_user(b).len(), 1);
        assert_eq!(db.get_notifications_by_user(b, NotificationQuery::default()).len(), 1);
        assert!(db.verify_integrity().is_empty());

        let cleared = db
            .update_project(project.id, UpdateProject { end_date: Some(None), ..Default::default() })
            .unwrap();
        assert_eq!(cleared.end_date, None);
    }

    #[test]
    fn test_update_unknown_project() {
        let mut db = Database::new();
        let err = db.update_project(Uuid::new_v4(), UpdateProject::default()).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: EntityKind::Project, .. }));
    }

    #[test]
    fn test_projects_by_user_owned_and_joined() {
        let mut db = Database::new();
        let alice = user(&mut db, "alice");
        let bob = user(&mut db, "bob");

        let first = db.create_project(new_project(alice, vec![bob])).unwrap();
        let mut data = new_project(bob, vec![alice]);
        data.name = "Beacon".to_string();
        let second = db.create_project(data).unwrap();
        db.update_project(first.id, UpdateProject { description: Some("bump".into()), ..Default::default() })
            .unwrap();

        let ids: Vec<Uuid> = db.get_projects_by_user(alice).iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[test]
    fn test_delete_project() {
        let mut db = Database::new();
        let owner = user(&mut db, "owner");
        let project = db.create_project(new_project(owner, vec![])).unwrap();

        assert!(db.delete_project(project.id));
        assert!(!db.delete_project(project.id));
        assert!(db.get_project(project.id).is_none());
        assert!(db.get_activities_by_project(project.id, None).is_empty());
        assert!(db.project_task_counts(project.id).is_err());
        assert!(db.verify_integrity().is_empty());
    }
}
