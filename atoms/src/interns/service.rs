use serde_json::Value;

use super::error::InternError;
use super::model::{
    CreateInternPayload, Intern, InternPage, UpdateInternPayload, BATCH, CURRENT_PROJECTS,
    INTERN_NAME, ROLES,
};
use crate::store::{DocumentStore, Fields, Query};
use crate::tasks::codec::encode_all;
use crate::tasks::summary::TASKS_FIELD;
use crate::tasks::ValidationError;

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

fn strings(values: Vec<String>) -> Value {
    Value::Array(values.into_iter().map(Value::String).collect())
}

fn encoded_tasks(tasks: &[Value]) -> Result<Value, ValidationError> {
    Ok(strings(encode_all(tasks)?))
}

/// List interns matching the queries. `total` ignores limit/offset.
pub async fn list_interns(
    store: &dyn DocumentStore,
    queries: &[Query],
) -> Result<InternPage, InternError> {
    let list = store.list_documents(queries).await.inspect_err(|e| {
        tracing::error!("Failed to list interns: {}", e);
    })?;

    Ok(InternPage {
        interns: list.documents.into_iter().map(Intern::from).collect(),
        total: list.total,
    })
}

pub async fn get_intern(store: &dyn DocumentStore, id: &str) -> Result<Intern, InternError> {
    let document = store.get_document(id).await.inspect_err(|e| {
        tracing::error!("Failed to get intern {}: {}", id, e);
    })?;
    Ok(document.into())
}

/// Create an intern. The id comes from the payload's `documentId`, then
/// `explicit_id`, and is generated when neither is given.
pub async fn create_intern(
    store: &dyn DocumentStore,
    payload: CreateInternPayload,
    explicit_id: Option<&str>,
) -> Result<Intern, InternError> {
    let intern_name =
        non_empty(payload.intern_name).ok_or(ValidationError::MissingField("Intern name"))?;
    let batch = non_empty(payload.batch).ok_or(ValidationError::MissingField("Batch"))?;
    let tasks = encoded_tasks(payload.tasks_assigned.as_deref().unwrap_or_default())?;

    let id = non_empty(payload.document_id)
        .or_else(|| explicit_id.filter(|s| !s.is_empty()).map(str::to_string))
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let mut fields = Fields::new();
    fields.insert(INTERN_NAME.to_string(), Value::String(intern_name));
    fields.insert(BATCH.to_string(), Value::String(batch));
    fields.insert(ROLES.to_string(), strings(payload.roles.unwrap_or_default()));
    fields.insert(
        CURRENT_PROJECTS.to_string(),
        strings(payload.current_projects.unwrap_or_default()),
    );
    fields.insert(TASKS_FIELD.to_string(), tasks);

    let document = store.create_document(&id, fields).await.inspect_err(|e| {
        tracing::error!("Failed to create intern {}: {}", id, e);
    })?;

    tracing::info!("Created intern {}", document.id);
    Ok(document.into())
}

/// Overwrite only the fields present in the patch
pub async fn update_intern(
    store: &dyn DocumentStore,
    id: &str,
    patch: UpdateInternPayload,
) -> Result<Intern, InternError> {
    let mut fields = Fields::new();

    if let Some(name) = non_empty(patch.intern_name) {
        fields.insert(INTERN_NAME.to_string(), Value::String(name));
    }
    if let Some(batch) = non_empty(patch.batch) {
        fields.insert(BATCH.to_string(), Value::String(batch));
    }
    if let Some(roles) = patch.roles {
        fields.insert(ROLES.to_string(), strings(roles));
    }
    if let Some(projects) = patch.current_projects {
        fields.insert(CURRENT_PROJECTS.to_string(), strings(projects));
    }
    if let Some(tasks) = patch.tasks_assigned {
        fields.insert(TASKS_FIELD.to_string(), encoded_tasks(&tasks)?);
    }

    let document = store.update_document(id, fields).await.inspect_err(|e| {
        tracing::error!("Failed to update intern {}: {}", id, e);
    })?;
    Ok(document.into())
}

pub async fn delete_intern(store: &dyn DocumentStore, id: &str) -> Result<(), InternError> {
    store.delete_document(id).await.inspect_err(|e| {
        tracing::error!("Failed to delete intern {}: {}", id, e);
    })?;
    tracing::info!("Deleted intern {}", id);
    Ok(())
}

/// Number of interns, read from the total of a one-item page
pub async fn count_interns(store: &dyn DocumentStore) -> Result<u64, InternError> {
    let list = store
        .list_documents(&[Query::Limit(1)])
        .await
        .inspect_err(|e| {
            tracing::error!("Failed to count interns: {}", e);
        })?;
    Ok(list.total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Document, MemoryDocumentStore, StoreError};
    use crate::tasks::{TaskEntry, TaskStatus};
    use serde_json::json;

    fn payload(value: Value) -> CreateInternPayload {
        serde_json::from_value(value).unwrap()
    }

    fn patch(value: Value) -> UpdateInternPayload {
        serde_json::from_value(value).unwrap()
    }

    async fn seeded(store: &MemoryDocumentStore) -> Intern {
        create_intern(
            store,
            payload(json!({
                "documentId": "asha",
                "internName": "Asha",
                "batch": "2025-Summer",
                "roles": ["Backend"],
                "currentProjects": ["Tracker"],
                "tasksAssigned": [
                    {"title": "Setup", "status": "open"},
                    {"title": "Docs", "description": "API docs", "status": "todo"}
                ]
            })),
            None,
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn create_stores_tasks_as_encoded_strings() {
        let store = MemoryDocumentStore::new();
        let intern = seeded(&store).await;

        assert_eq!(intern.id, "asha");
        assert_eq!(intern.tasks_assigned.len(), 2);
        let first = intern.tasks_assigned[0].as_task().unwrap();
        assert_eq!(first.title, "Setup");
        assert_eq!(first.status, TaskStatus::Open);
        assert!(!first.id.is_empty());

        let stored = store.get_document("asha").await.unwrap();
        let raw = stored.fields[TASKS_FIELD].as_array().unwrap();
        assert!(raw.iter().all(Value::is_string));
    }

    #[tokio::test]
    async fn create_id_precedence() {
        let store = MemoryDocumentStore::new();
        let minimal = json!({"internName": "A", "batch": "B"});

        let from_body = create_intern(
            &store,
            payload(json!({"documentId": "body", "internName": "A", "batch": "B"})),
            Some("explicit"),
        )
        .await
        .unwrap();
        assert_eq!(from_body.id, "body");

        let explicit = create_intern(&store, payload(minimal.clone()), Some("explicit"))
            .await
            .unwrap();
        assert_eq!(explicit.id, "explicit");

        let generated = create_intern(&store, payload(minimal), None).await.unwrap();
        assert!(uuid::Uuid::parse_str(&generated.id).is_ok());
        assert!(generated.roles.is_empty());
        assert!(generated.current_projects.is_empty());
        assert!(generated.tasks_assigned.is_empty());
    }

    #[tokio::test]
    async fn create_validates_before_touching_the_store() {
        let store = MemoryDocumentStore::new();

        let err = create_intern(&store, payload(json!({"batch": "B"})), None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Intern name is required");

        let err = create_intern(&store, payload(json!({"internName": "A", "batch": ""})), None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Batch is required");

        let err = create_intern(
            &store,
            payload(json!({
                "internName": "A",
                "batch": "B",
                "tasksAssigned": [
                    {"title": "ok", "status": "open"},
                    {"title": "bad", "status": "done"}
                ]
            })),
            None,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, InternError::Validation(ValidationError::InvalidStatus(_))));

        assert_eq!(store.call_count(), 0);
    }

    #[tokio::test]
    async fn duplicate_id_is_a_conflict() {
        let store = MemoryDocumentStore::new();
        seeded(&store).await;

        let err = create_intern(
            &store,
            payload(json!({"documentId": "asha", "internName": "A", "batch": "B"})),
            None,
        )
        .await
        .unwrap_err();
        assert_eq!(err, InternError::Store(StoreError::Conflict { id: "asha".into() }));
    }

    #[tokio::test]
    async fn partial_update_leaves_other_fields_alone() {
        let store = MemoryDocumentStore::new();
        let before = seeded(&store).await;

        let after = update_intern(&store, "asha", patch(json!({"roles": ["A"], "batch": ""})))
            .await
            .unwrap();

        assert_eq!(after.roles, vec!["A".to_string()]);
        assert_eq!(after.batch, before.batch);
        assert_eq!(after.intern_name, before.intern_name);
        assert_eq!(after.current_projects, before.current_projects);
        assert_eq!(after.tasks_assigned, before.tasks_assigned);
    }

    #[tokio::test]
    async fn update_replaces_tasks_wholesale() {
        let store = MemoryDocumentStore::new();
        let before = seeded(&store).await;
        let kept = before.tasks_assigned[1].as_task().unwrap().clone();

        let after = update_intern(
            &store,
            "asha",
            patch(json!({
                "tasksAssigned": [{
                    "id": kept.id,
                    "title": kept.title,
                    "status": "completed",
                    "assignedAt": kept.assigned_at
                }]
            })),
        )
        .await
        .unwrap();

        assert_eq!(after.tasks_assigned.len(), 1);
        let task = after.tasks_assigned[0].as_task().unwrap();
        assert_eq!(task.id, kept.id);
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.assigned_at, kept.assigned_at);
    }

    #[tokio::test]
    async fn missing_interns_are_not_found() {
        let store = MemoryDocumentStore::new();
        let not_found = InternError::NotFound { id: "ghost".into() };

        assert_eq!(get_intern(&store, "ghost").await.unwrap_err(), not_found);
        assert_eq!(
            update_intern(&store, "ghost", patch(json!({"roles": []})))
                .await
                .unwrap_err(),
            not_found
        );
        assert_eq!(delete_intern(&store, "ghost").await.unwrap_err(), not_found);
        assert_eq!(
            not_found.to_string(),
            "Document with the requested ID could not be found."
        );
    }

    #[tokio::test]
    async fn count_follows_creates_and_deletes() {
        let store = MemoryDocumentStore::new();
        for id in ["a", "b", "c"] {
            create_intern(&store, payload(json!({"internName": id, "batch": "B"})), Some(id))
                .await
                .unwrap();
        }
        delete_intern(&store, "b").await.unwrap();

        assert_eq!(count_interns(&store).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn list_reports_total_before_paging() {
        let store = MemoryDocumentStore::new();
        for (id, batch) in [("a", "S"), ("b", "W"), ("c", "S"), ("d", "S")] {
            create_intern(&store, payload(json!({"internName": id, "batch": batch})), Some(id))
                .await
                .unwrap();
        }

        let page = list_interns(
            &store,
            &[Query::equal(BATCH, "S"), Query::Limit(2), Query::Offset(1)],
        )
        .await
        .unwrap();

        assert_eq!(page.total, 3);
        let ids: Vec<_> = page.interns.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "d"]);
    }

    #[tokio::test]
    async fn legacy_task_strings_are_returned_raw() {
        let store = MemoryDocumentStore::new();
        let mut fields = Fields::new();
        fields.insert(INTERN_NAME.to_string(), json!("Old"));
        fields.insert(BATCH.to_string(), json!("2023"));
        fields.insert(
            TASKS_FIELD.to_string(),
            json!(["{broken", r#"{"title":"x","status":"done"}"#]),
        );
        store
            .insert_raw(Document {
                id: "old".into(),
                created_at: String::new(),
                updated_at: String::new(),
                fields,
            })
            .await;

        let intern = get_intern(&store, "old").await.unwrap();
        assert_eq!(intern.tasks_assigned.len(), 2);
        assert_eq!(intern.tasks_assigned[0], TaskEntry::Raw(json!("{broken")));
        assert_eq!(
            intern.tasks_assigned[1],
            TaskEntry::Raw(json!({"title": "x", "status": "done"}))
        );
        assert!(intern.roles.is_empty());
    }
}
