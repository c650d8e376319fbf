#![allow(dead_code)]

use std::any::Any;
use std::sync::Arc;

use datakit::domain::entity::column;
use datakit::domain::{codec, expect_delta};
use datakit::{Base, BaseDomain, DomainError, DomainFactory, DomainName, Status, db};
use sea_orm::{ConnectionTrait, DatabaseConnection, QueryResult, Statement, Value};
use serde::{Deserialize, Serialize};

pub const NOTES: &str = "notes";
pub const LABELS: &str = "labels";

/// Sample entity. Merge precedence: a non-empty `title`, a `Some` body, a
/// non-empty `tags` list and a non-zero `priority` in the delta win.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub base: BaseDomain,
    pub title: String,
    pub body: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub priority: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NoteDto {
    #[serde(default)]
    pub external_id: String,
    #[serde(default)]
    pub status: Status,
    pub title: String,
    pub body: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub priority: i32,
}

impl Note {
    pub fn new(title: &str, body: Option<&str>) -> Self {
        Self {
            title: title.to_string(),
            body: body.map(str::to_string),
            ..Default::default()
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }
}

impl Base for Note {
    fn base(&self) -> &BaseDomain {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseDomain {
        &mut self.base
    }

    fn table(&self) -> DomainName {
        DomainName::from(NOTES)
    }

    fn to_dto(&self) -> Result<serde_json::Value, DomainError> {
        codec::to_dto_value(&NoteDto {
            external_id: self.base.external_id.clone(),
            status: self.base.status,
            title: self.title.clone(),
            body: self.body.clone(),
            tags: self.tags.clone(),
            priority: self.priority,
        })
    }

    fn from_dto(&self, dto: serde_json::Value) -> Result<Box<dyn Base>, DomainError> {
        let dto: NoteDto = codec::from_dto_value(dto)?;
        Ok(Box::new(Note {
            base: BaseDomain {
                external_id: dto.external_id,
                status: dto.status,
                ..Default::default()
            },
            title: dto.title,
            body: dto.body,
            tags: dto.tags,
            priority: dto.priority,
        }))
    }

    fn merge(&mut self, delta: &dyn Base) -> Result<(), DomainError> {
        let delta = expect_delta(self, delta)?;
        self.base.merge_from(&delta.base);
        if !delta.title.is_empty() {
            self.title = delta.title.clone();
        }
        if delta.body.is_some() {
            self.body = delta.body.clone();
        }
        if !delta.tags.is_empty() {
            self.tags = delta.tags.clone();
        }
        if delta.priority != 0 {
            self.priority = delta.priority;
        }
        Ok(())
    }

    fn from_sql_row(&self, row: &QueryResult) -> Result<Box<dyn Base>, DomainError> {
        let tags: String = column(row, "tags")?;
        Ok(Box::new(Note {
            base: BaseDomain::from_row(row)?,
            title: column(row, "title")?,
            body: column(row, "body")?,
            tags: serde_json::from_str(&tags)?,
            priority: column(row, "priority")?,
        }))
    }

    fn sql_values(&self) -> Vec<(&'static str, Value)> {
        let tags = serde_json::to_string(&self.tags).unwrap_or_else(|_| "[]".to_string());
        vec![
            ("title", self.title.clone().into()),
            ("body", self.body.clone().into()),
            ("tags", tags.into()),
            ("priority", self.priority.into()),
        ]
    }

    fn marshal_binary(&self) -> Result<Vec<u8>, DomainError> {
        codec::encode_binary(self)
    }

    fn unmarshal_binary(&mut self, bytes: &[u8]) -> Result<(), DomainError> {
        *self = codec::decode_binary(bytes)?;
        Ok(())
    }

    fn to_json(&self) -> Result<String, DomainError> {
        codec::to_json_string(self)
    }

    fn clone_box(&self) -> Box<dyn Base> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Second entity type, used where a different concrete type is needed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub base: BaseDomain,
    pub name: String,
}

impl Base for Label {
    fn base(&self) -> &BaseDomain {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseDomain {
        &mut self.base
    }

    fn table(&self) -> DomainName {
        DomainName::from(LABELS)
    }

    fn to_dto(&self) -> Result<serde_json::Value, DomainError> {
        codec::to_dto_value(self)
    }

    fn from_dto(&self, dto: serde_json::Value) -> Result<Box<dyn Base>, DomainError> {
        Ok(Box::new(codec::from_dto_value::<Label>(dto)?))
    }

    fn merge(&mut self, delta: &dyn Base) -> Result<(), DomainError> {
        let delta = expect_delta(self, delta)?;
        self.base.merge_from(&delta.base);
        if !delta.name.is_empty() {
            self.name = delta.name.clone();
        }
        Ok(())
    }

    fn from_sql_row(&self, row: &QueryResult) -> Result<Box<dyn Base>, DomainError> {
        Ok(Box::new(Label {
            base: BaseDomain::from_row(row)?,
            name: column(row, "name")?,
        }))
    }

    fn sql_values(&self) -> Vec<(&'static str, Value)> {
        vec![("name", self.name.clone().into())]
    }

    fn marshal_binary(&self) -> Result<Vec<u8>, DomainError> {
        codec::encode_binary(self)
    }

    fn unmarshal_binary(&mut self, bytes: &[u8]) -> Result<(), DomainError> {
        *self = codec::decode_binary(bytes)?;
        Ok(())
    }

    fn to_json(&self) -> Result<String, DomainError> {
        codec::to_json_string(self)
    }

    fn clone_box(&self) -> Box<dyn Base> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub fn test_factory() -> Arc<DomainFactory> {
    let mut factory = DomainFactory::new();
    factory.register_mapping(NOTES, || Box::new(Note::default()) as Box<dyn Base>);
    factory.register_mapping(LABELS, || Box::new(Label::default()) as Box<dyn Base>);
    Arc::new(factory)
}

// Helper to create a test database with the sample tables
pub async fn setup_test_db() -> DatabaseConnection {
    let db = db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB");

    for sql in [
        r#"
        CREATE TABLE notes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            external_id TEXT NOT NULL UNIQUE,
            status SMALLINT NOT NULL DEFAULT 0,
            title TEXT NOT NULL,
            body TEXT,
            tags TEXT NOT NULL DEFAULT '[]',
            priority INTEGER NOT NULL DEFAULT 0,
            created_at TEXT,
            updated_at TEXT,
            deleted_at TEXT
        )
        "#,
        r#"
        CREATE TABLE labels (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            external_id TEXT NOT NULL UNIQUE,
            status SMALLINT NOT NULL DEFAULT 0,
            name TEXT NOT NULL,
            created_at TEXT,
            updated_at TEXT,
            deleted_at TEXT
        )
        "#,
    ] {
        db.execute(Statement::from_string(
            db.get_database_backend(),
            sql.to_owned(),
        ))
        .await
        .expect("Failed to create table");
    }

    db
}

pub fn as_note(entity: &dyn Base) -> &Note {
    entity.downcast_ref::<Note>().expect("expected a Note")
}

/// Stored state of a note, ignoring the update timestamp.
pub fn note_state(entity: &dyn Base) -> (String, Option<String>, Vec<String>, i32, Status) {
    let note = as_note(entity);
    (
        note.title.clone(),
        note.body.clone(),
        note.tags.clone(),
        note.priority,
        note.base.status,
    )
}
