/// Activity recorder
///
/// Activity entries are append-only. Entries with a project are pushed to the
/// front of that project's feed; they are removed only when the project is
/// deleted.

use chrono::Utc;
use uuid::Uuid;

use super::Database;
use crate::models::activity::NewActivity;
use crate::models::Activity;

impl Database {
    pub(crate) fn log_activity(&mut self, entry: NewActivity) -> Uuid {
        let activity = Activity {
            id: Uuid::new_v4(),
            user_id: entry.user_id,
            project_id: entry.project_id,
            task_id: entry.task_id,
            activity_type: entry.activity_type,
            description: entry.description,
            metadata: entry.metadata,
            created_at: Utc::now(),
        };
        let id = activity.id;

        if let Some(project_id) = activity.project_id {
            self.indexes
                .activities_by_project
                .entry(project_id)
                .or_default()
                .push_front(id);
        }

        tracing::debug!(
            activity_id = %id,
            activity_type = activity.activity_type.as_str(),
            user_id = %activity.user_id,
            "Activity recorded"
        );
        self.activities.insert(id, activity);
        id
    }

    /// Most recent activity of a project, newest first
    ///
    /// `limit` defaults to `StoreConfig::default_activity_limit`.
    pub fn get_activities_by_project(&self, project_id: Uuid, limit: Option<usize>) -> Vec<&Activity> {
        let limit = limit.unwrap_or(self.config.default_activity_limit);
        self.indexes
            .activities_by_project
            .get(&project_id)
            .map(|ids| {
                ids.iter()
                    .take(limit)
                    .filter_map(|id| self.activities.get(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn get_activity(&self, id: Uuid) -> Option<&Activity> {
        self.activities.get(&id)
    }

    /// Drops a project's feed together with its entries
    pub(crate) fn purge_project_activity(&mut self, project_id: Uuid) -> usize {
        let Some(ids) = self.indexes.activities_by_project.remove(&project_id) else {
            return 0;
        };
        for id in &ids {
            self.activities.remove(id);
        }
        ids.len()
    }
}
