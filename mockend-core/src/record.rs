//! Record types and their normalized/resolved forms.
//!
//! Two kinds of records live in the store:
//!
//! - [`Label`] - a flat record, stored and returned as-is (returned as a copy)
//! - [`Todo`] - stored as a [`NormalizedTodo`] whose labels are bare ids, and
//!   returned in resolved form where every id is swapped for a copy of the label
//!
//! Writes come in two shapes. `*Input` types describe a full record for creation,
//! `*Patch` types describe a shallow merge over an existing record where absent
//! fields are preserved.

use bson::{Bson, de::deserialize_from_bson, ser::serialize_to_bson};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, from_value, to_value};

use crate::{
    error::StoreResult,
    timestamp::{deserialize_some, iso_millis, nullable_iso_millis},
};

/// Core trait implemented by every record kind the store exposes.
pub trait Record: Serialize + DeserializeOwned + Send + Sync + Clone + 'static {
    /// Returns this record's identifier.
    fn id(&self) -> &str;

    /// Returns the name of the collection this record belongs to.
    fn collection_name() -> &'static str;
}

/// Extension trait providing BSON/JSON conversion for records.
///
/// Automatically implemented for all types that implement [`Record`].
pub trait RecordExt: Record {
    /// Converts this record to a BSON value, the shape the filter evaluator walks.
    fn to_bson(&self) -> StoreResult<Bson>;

    /// Creates a record from a BSON value.
    fn from_bson(bson: Bson) -> StoreResult<Self>;

    /// Converts this record to a JSON value.
    fn to_json(&self) -> StoreResult<Value>;

    /// Creates a record from a JSON value.
    fn from_json(value: Value) -> StoreResult<Self>;
}

impl<R: Record> RecordExt for R {
    fn to_bson(&self) -> StoreResult<Bson> {
        Ok(serialize_to_bson(self)?)
    }

    fn from_bson(bson: Bson) -> StoreResult<Self> {
        Ok(deserialize_from_bson(bson)?)
    }

    fn to_json(&self) -> StoreResult<Value> {
        Ok(to_value(self)?)
    }

    fn from_json(value: Value) -> StoreResult<Self> {
        Ok(from_value(value)?)
    }
}

/// A label that todos can reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub color: Option<String>,
}

impl Record for Label {
    fn id(&self) -> &str {
        &self.id
    }

    fn collection_name() -> &'static str {
        "labels"
    }
}

impl Label {
    /// Builds a stored label from an input, using `id` when the input carries none.
    pub fn from_input(input: LabelInput, id: String) -> Self {
        Label {
            id: input.id.unwrap_or(id),
            title: input.title,
            color: input.color.filter(|color| !color.is_empty()),
        }
    }

    /// Shallow-merges `patch` over this label.
    pub fn merge(&self, patch: LabelPatch) -> Self {
        Label {
            id: self.id.clone(),
            title: patch.title.unwrap_or_else(|| self.title.clone()),
            color: match patch.color {
                Some(color) => color.filter(|color| !color.is_empty()),
                None => self.color.clone(),
            },
        }
    }
}

/// Payload for creating a label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl LabelInput {
    /// Creates an input with the given title and no color.
    pub fn new(title: impl Into<String>) -> Self {
        LabelInput { id: None, title: title.into(), color: None }
    }

    /// Sets the label color.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// Payload for updating a label. Absent fields are preserved, `color: null` clears the color.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelPatch {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub color: Option<Option<String>>,
}

impl From<LabelInput> for LabelPatch {
    fn from(input: LabelInput) -> Self {
        LabelPatch {
            id: input.id,
            title: Some(input.title),
            color: input.color.map(Some),
        }
    }
}

/// A reference to a label inside a todo payload.
///
/// Accepts either a bare id or a label object, so a resolved todo can be sent back as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LabelRef {
    Id(String),
    Record { id: String },
}

impl LabelRef {
    /// Returns the referenced label id.
    pub fn id(&self) -> &str {
        match self {
            LabelRef::Id(id) => id,
            LabelRef::Record { id } => id,
        }
    }

    /// Consumes the reference and returns the label id.
    pub fn into_id(self) -> String {
        match self {
            LabelRef::Id(id) => id,
            LabelRef::Record { id } => id,
        }
    }
}

impl From<&str> for LabelRef {
    fn from(id: &str) -> Self {
        LabelRef::Id(id.to_string())
    }
}

impl From<String> for LabelRef {
    fn from(id: String) -> Self {
        LabelRef::Id(id)
    }
}

impl From<&Label> for LabelRef {
    fn from(label: &Label) -> Self {
        LabelRef::Record { id: label.id.clone() }
    }
}

/// A todo in resolved form, as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: String,
    pub title: String,
    pub completed: bool,
    pub labels: Vec<Label>,
    #[serde(default, with = "iso_millis")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, with = "iso_millis")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Record for Todo {
    fn id(&self) -> &str {
        &self.id
    }

    fn collection_name() -> &'static str {
        "todos"
    }
}

impl Todo {
    /// Reduces this todo to its stored form, keeping only the label ids.
    pub fn normalize(&self) -> NormalizedTodo {
        NormalizedTodo {
            id: self.id.clone(),
            title: self.title.clone(),
            completed: self.completed,
            labels: self.labels.iter().map(|label| label.id.clone()).collect(),
            due_date: self.due_date,
            completed_at: self.completed_at,
        }
    }
}

/// Payload for creating a todo.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub labels: Vec<LabelRef>,
    #[serde(default, with = "iso_millis")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, with = "iso_millis", skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl TodoInput {
    /// Creates an open todo with the given title, no labels and no dates.
    pub fn new(title: impl Into<String>) -> Self {
        TodoInput { title: title.into(), ..Default::default() }
    }

    /// Sets the completion flag.
    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    /// Adds a label reference.
    pub fn label(mut self, label: impl Into<LabelRef>) -> Self {
        self.labels.push(label.into());
        self
    }

    /// Sets the due date.
    pub fn due(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }
}

/// Payload for updating a todo.
///
/// Absent fields are preserved. `dueDate: null` clears the due date; `completedAt: null`
/// counts as not supplied, so it is derived from `completed` like an absent value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoPatch {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
    #[serde(default)]
    pub labels: Option<Vec<LabelRef>>,
    #[serde(default, deserialize_with = "nullable_iso_millis::deserialize")]
    pub due_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, with = "iso_millis")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl TodoPatch {
    /// Sets the completion flag, which re-derives `completed_at` on merge.
    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    /// Replaces the title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

impl From<TodoInput> for TodoPatch {
    fn from(input: TodoInput) -> Self {
        TodoPatch {
            id: input.id,
            title: Some(input.title),
            completed: Some(input.completed),
            labels: Some(input.labels),
            due_date: input.due_date.map(Some),
            completed_at: input.completed_at,
        }
    }
}

/// A todo as it is kept in the store: labels are bare ids.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTodo {
    pub id: String,
    pub title: String,
    pub completed: bool,
    pub labels: Vec<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl NormalizedTodo {
    /// Builds a stored todo from an input, using `id` when the input carries none.
    pub fn from_input(input: TodoInput, id: String, now: DateTime<Utc>) -> Self {
        NormalizedTodo {
            id: input.id.unwrap_or(id),
            title: input.title,
            completed: input.completed,
            labels: input.labels.into_iter().map(LabelRef::into_id).collect(),
            due_date: input.due_date,
            completed_at: derive_completed_at(input.completed, input.completed_at, now),
        }
    }

    /// Shallow-merges `patch` over this todo and re-derives `completed_at`.
    pub fn merge(&self, patch: TodoPatch, now: DateTime<Utc>) -> Self {
        let completed = patch.completed.unwrap_or(self.completed);

        NormalizedTodo {
            id: self.id.clone(),
            title: patch.title.unwrap_or_else(|| self.title.clone()),
            completed,
            labels: match patch.labels {
                Some(labels) => labels.into_iter().map(LabelRef::into_id).collect(),
                None => self.labels.clone(),
            },
            due_date: patch.due_date.unwrap_or(self.due_date),
            completed_at: derive_completed_at(completed, patch.completed_at, now),
        }
    }

    /// Swaps every label id for a copy of the label `lookup` returns.
    ///
    /// References `lookup` cannot find are omitted.
    pub fn resolve<F>(&self, lookup: F) -> Todo
    where
        F: Fn(&str) -> Option<Label>,
    {
        Todo {
            id: self.id.clone(),
            title: self.title.clone(),
            completed: self.completed,
            labels: self.labels.iter().filter_map(|id| lookup(id)).collect(),
            due_date: self.due_date,
            completed_at: self.completed_at,
        }
    }
}

/// An explicit `completed_at` wins; otherwise it is `now` for completed todos and absent otherwise.
pub fn derive_completed_at(
    completed: bool,
    explicit: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    explicit.or_else(|| completed.then_some(now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn label(id: &str, title: &str) -> Label {
        Label { id: id.to_string(), title: title.to_string(), color: None }
    }

    #[test]
    fn completed_at_follows_completed_unless_supplied() {
        let now = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let earlier = Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap();

        assert_eq!(derive_completed_at(true, None, now), Some(now));
        assert_eq!(derive_completed_at(false, None, now), None);
        assert_eq!(derive_completed_at(true, Some(earlier), now), Some(earlier));
        assert_eq!(derive_completed_at(false, Some(earlier), now), Some(earlier));
    }

    #[test]
    fn merge_preserves_absent_fields() {
        let now = Utc::now();
        let due = Utc.with_ymd_and_hms(2030, 5, 1, 9, 0, 0).unwrap();
        let stored = NormalizedTodo {
            id: "t1".into(),
            title: "Wax Ventricals".into(),
            completed: false,
            labels: vec!["l1".into()],
            due_date: Some(due),
            completed_at: None,
        };

        let merged = stored.merge(TodoPatch::default().completed(true), now);

        assert_eq!(merged.title, "Wax Ventricals");
        assert_eq!(merged.labels, vec!["l1".to_string()]);
        assert_eq!(merged.due_date, Some(due));
        assert_eq!(merged.completed_at, Some(now));
    }

    #[test]
    fn explicit_null_clears_nullable_fields() {
        let patch: TodoPatch = serde_json::from_value(json!({ "dueDate": null })).unwrap();
        assert_eq!(patch.due_date, Some(None));

        let patch: TodoPatch = serde_json::from_value(json!({ "title": "x" })).unwrap();
        assert_eq!(patch.due_date, None);

        let patch: LabelPatch = serde_json::from_value(json!({ "color": null })).unwrap();
        assert_eq!(patch.color, Some(None));
        assert_eq!(label("l1", "Bug").merge(patch).color, None);
    }

    #[test]
    fn label_refs_accept_ids_and_objects() {
        let input: TodoInput = serde_json::from_value(json!({
            "title": "Add Whatitz analytics",
            "labels": ["l1", { "id": "l2", "title": "Upstream", "color": null }],
        }))
        .unwrap();

        let ids: Vec<&str> = input.labels.iter().map(LabelRef::id).collect();
        assert_eq!(ids, vec!["l1", "l2"]);
        assert!(!input.completed);
    }

    #[test]
    fn resolve_after_normalize_round_trips() {
        let labels = vec![label("l1", "Bug"), label("l2", "Feature")];
        let todo = Todo {
            id: "t1".into(),
            title: "Harness Core".into(),
            completed: true,
            labels: labels.clone(),
            due_date: None,
            completed_at: Some(Utc.with_ymd_and_hms(2019, 2, 5, 10, 50, 0).unwrap()),
        };

        let resolved = todo
            .normalize()
            .resolve(|id| labels.iter().find(|label| label.id == id).cloned());

        assert_eq!(resolved, todo);
    }

    #[test]
    fn resolve_omits_dangling_references() {
        let stored = NormalizedTodo {
            id: "t1".into(),
            title: "Bowline Gimbels".into(),
            completed: false,
            labels: vec!["gone".into(), "l1".into()],
            due_date: None,
            completed_at: None,
        };

        let resolved = stored.resolve(|id| (id == "l1").then(|| label("l1", "Blocked")));
        assert_eq!(resolved.labels, vec![label("l1", "Blocked")]);
    }

    #[test]
    fn resolved_todo_serializes_iso_timestamps() {
        let todo = Todo {
            id: "t1".into(),
            title: "Prevent explosions".into(),
            completed: true,
            labels: vec![],
            due_date: None,
            completed_at: Some(Utc.with_ymd_and_hms(2019, 2, 5, 12, 50, 0).unwrap()),
        };

        assert_eq!(
            todo.to_json().unwrap(),
            json!({
                "id": "t1",
                "title": "Prevent explosions",
                "completed": true,
                "labels": [],
                "dueDate": null,
                "completedAt": "2019-02-05T12:50:00.000Z",
            })
        );
    }

    #[test]
    fn resolved_todo_reads_back_without_optional_dates() {
        let todo = Todo::from_json(json!({
            "id": "t1",
            "title": "Get pistons detailed",
            "completed": false,
            "labels": [{ "id": "l1", "title": "Blocked" }],
        }))
        .unwrap();

        assert_eq!(todo.due_date, None);
        assert_eq!(todo.completed_at, None);
        assert_eq!(todo.labels, vec![label("l1", "Blocked")]);
    }

    #[test]
    fn resolved_todo_survives_bson_conversion() {
        let todo = Todo {
            id: "t1".into(),
            title: "Recalibrate Floozel".into(),
            completed: true,
            labels: vec![label("l2", "Tech Debt")],
            due_date: Some(Utc.with_ymd_and_hms(2019, 3, 1, 0, 0, 0).unwrap()),
            completed_at: Some(Utc.with_ymd_and_hms(2019, 2, 5, 12, 50, 0).unwrap()),
        };

        assert_eq!(Todo::from_bson(todo.to_bson().unwrap()).unwrap(), todo);
    }
}
