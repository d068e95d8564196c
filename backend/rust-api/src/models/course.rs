use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::errors::ApiError;
use crate::utils::time::bson_to_iso;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Video,
    Document,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Video => "video",
            ResourceKind::Document => "document",
        }
    }
}

impl std::str::FromStr for ResourceKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "video" => Ok(ResourceKind::Video),
            "document" => Ok(ResourceKind::Document),
            _ => Err(format!("Invalid resource kind: {}", value)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub id: String,
    pub title: String,
    pub kind: ResourceKind,
    #[serde(default)]
    pub url: String,
}

/// A course section: an ordered list of resources plus an optional
/// assignment reference. Must hold at least one of the two.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub resources: Vec<ResourceRecord>,
    #[serde(default)]
    pub assignment_id: Option<ObjectId>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CourseDocument {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub coach_id: String,
    #[serde(default)]
    pub modules: Vec<ModuleRecord>,
    #[serde(rename = "createdAt", alias = "created_at")]
    pub created_at: mongodb::bson::DateTime,
    #[serde(rename = "updatedAt", alias = "updated_at")]
    pub updated_at: mongodb::bson::DateTime,
}

impl CourseDocument {
    /// Denominator for progress percentages: resources across all modules.
    pub fn total_resources(&self) -> usize {
        self.modules
            .iter()
            .map(|module| module.resources.len())
            .sum()
    }

    pub fn find_resource(&self, resource_id: &str) -> Option<&ResourceRecord> {
        self.modules
            .iter()
            .flat_map(|module| module.resources.iter())
            .find(|resource| resource.id == resource_id)
    }
}

#[derive(Debug, Serialize)]
pub struct CourseSummary {
    pub id: String,
    pub title: String,
    pub description: String,
    pub coach_id: String,
    pub module_count: usize,
    pub resource_count: usize,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
}

impl CourseSummary {
    pub fn from_doc(doc: &CourseDocument) -> Self {
        Self {
            id: doc.id.to_hex(),
            title: doc.title.clone(),
            description: doc.description.clone(),
            coach_id: doc.coach_id.clone(),
            module_count: doc.modules.len(),
            resource_count: doc.total_resources(),
            updated_at: bson_to_iso(&doc.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ModuleView {
    pub id: String,
    pub title: String,
    pub resources: Vec<ResourceRecord>,
    pub assignment_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CourseDetail {
    pub id: String,
    pub title: String,
    pub description: String,
    pub coach_id: String,
    pub modules: Vec<ModuleView>,
    pub created_at: String,
    pub updated_at: String,
}

impl CourseDetail {
    pub fn from_doc(doc: &CourseDocument) -> Self {
        Self {
            id: doc.id.to_hex(),
            title: doc.title.clone(),
            description: doc.description.clone(),
            coach_id: doc.coach_id.clone(),
            modules: doc
                .modules
                .iter()
                .map(|module| ModuleView {
                    id: module.id.clone(),
                    title: module.title.clone(),
                    resources: module.resources.clone(),
                    assignment_id: module.assignment_id.map(|id| id.to_hex()),
                })
                .collect(),
            created_at: bson_to_iso(&doc.created_at),
            updated_at: bson_to_iso(&doc.updated_at),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResourceInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub kind: ResourceKind,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ModuleInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default)]
    #[validate(nested)]
    pub resources: Vec<ResourceInput>,
    #[serde(default)]
    pub assignment_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CourseCreateRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub description: String,
    #[serde(default)]
    #[validate(nested)]
    pub modules: Vec<ModuleInput>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CourseUpdateRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub modules: Option<Vec<ModuleInput>>,
}

/// A module with neither resources nor an assignment has nothing to learn
/// from; reject it before it reaches the store.
pub fn ensure_modules_valid(modules: &[ModuleInput]) -> Result<(), ApiError> {
    for module in modules {
        if module.resources.is_empty() && module.assignment_id.is_none() {
            return Err(ApiError::validation(format!(
                "Module '{}' must contain at least one resource or an assignment",
                module.title
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{doc, DateTime as BsonDateTime};

    #[test]
    fn course_document_accepts_snake_case_timestamps() {
        let course_id = ObjectId::new();
        let now = BsonDateTime::now();
        let doc = doc! {
            "_id": course_id,
            "title": "Rust basics",
            "coach_id": "coach-1",
            "modules": [],
            "created_at": now,
            "updated_at": now,
        };

        let parsed: CourseDocument =
            mongodb::bson::from_document(doc).expect("course should deserialize");
        assert_eq!(parsed.id, course_id);
        assert_eq!(parsed.title, "Rust basics");
        assert_eq!(parsed.created_at, now);
        assert_eq!(parsed.total_resources(), 0);
    }

    #[test]
    fn total_resources_sums_across_modules() {
        let mk = |n: usize| ModuleRecord {
            id: uuid::Uuid::new_v4().to_string(),
            title: "m".to_string(),
            resources: (0..n)
                .map(|i| ResourceRecord {
                    id: format!("r{}", i),
                    title: format!("r{}", i),
                    kind: ResourceKind::Video,
                    url: String::new(),
                })
                .collect(),
            assignment_id: None,
        };
        let course = CourseDocument {
            id: ObjectId::new(),
            title: "c".to_string(),
            description: String::new(),
            coach_id: "coach".to_string(),
            modules: vec![mk(3), mk(2)],
            created_at: BsonDateTime::now(),
            updated_at: BsonDateTime::now(),
        };
        assert_eq!(course.total_resources(), 5);
    }

    #[test]
    fn empty_module_is_rejected() {
        let module = ModuleInput {
            title: "empty".to_string(),
            resources: Vec::new(),
            assignment_id: None,
        };
        assert!(ensure_modules_valid(std::slice::from_ref(&module)).is_err());

        let with_assignment = ModuleInput {
            assignment_id: Some(ObjectId::new().to_hex()),
            ..module
        };
        assert!(ensure_modules_valid(&[with_assignment]).is_ok());
    }

    #[test]
    fn resource_kind_parses_case_insensitively() {
        use std::str::FromStr;
        assert_eq!(ResourceKind::from_str("Video").unwrap(), ResourceKind::Video);
        assert_eq!(
            ResourceKind::from_str("document").unwrap(),
            ResourceKind::Document
        );
        assert!(ResourceKind::from_str("podcast").is_err());
    }
}
