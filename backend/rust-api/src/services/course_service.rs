use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, to_bson, DateTime as BsonDateTime};
use mongodb::{options::FindOptions, Collection, Database};
use uuid::Uuid;

use crate::errors::ApiError;
use crate::middlewares::auth::AuthUser;
use crate::models::course::{
    ensure_modules_valid, CourseCreateRequest, CourseDetail, CourseDocument, CourseSummary,
    CourseUpdateRequest, ModuleInput, ModuleRecord, ResourceRecord,
};
use crate::models::AssignmentDocument;
use crate::utils::parse_object_id;

const MAX_LIST_LIMIT: i64 = 200;

pub struct CourseService {
    mongo: Database,
}

impl CourseService {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    fn collection(&self) -> Collection<CourseDocument> {
        self.mongo.collection("courses")
    }

    pub async fn list(&self) -> Result<Vec<CourseSummary>, ApiError> {
        let options = FindOptions::builder()
            .sort(doc! { "updatedAt": -1 })
            .limit(MAX_LIST_LIMIT)
            .build();

        let mut cursor = self.collection().find(doc! {}).with_options(options).await?;

        let mut courses = Vec::new();
        while let Some(course) = cursor.try_next().await? {
            courses.push(CourseSummary::from_doc(&course));
        }
        Ok(courses)
    }

    pub async fn get(&self, course_id: &str) -> Result<CourseDetail, ApiError> {
        let course = self.find_course(course_id).await?;
        Ok(CourseDetail::from_doc(&course))
    }

    pub async fn create(
        &self,
        coach: &AuthUser,
        req: CourseCreateRequest,
    ) -> Result<CourseDetail, ApiError> {
        ensure_modules_valid(&req.modules)?;
        let modules = build_modules(req.modules)?;

        let now = BsonDateTime::now();
        let course = CourseDocument {
            id: ObjectId::new(),
            title: req.title,
            description: req.description,
            coach_id: coach.id.clone(),
            modules,
            created_at: now,
            updated_at: now,
        };

        self.collection().insert_one(&course).await?;
        tracing::info!("Course {} created by coach {}", course.id.to_hex(), coach.id);

        Ok(CourseDetail::from_doc(&course))
    }

    pub async fn update(
        &self,
        coach: &AuthUser,
        course_id: &str,
        req: CourseUpdateRequest,
    ) -> Result<CourseDetail, ApiError> {
        let course = self.find_course(course_id).await?;
        ensure_owner(&course, coach)?;

        let mut set = doc! { "updatedAt": BsonDateTime::now() };
        if let Some(title) = req.title {
            set.insert("title", title);
        }
        if let Some(description) = req.description {
            set.insert("description", description);
        }
        if let Some(inputs) = req.modules {
            ensure_modules_valid(&inputs)?;
            let modules = build_modules(inputs)?;
            let modules_bson = to_bson(&modules)
                .map_err(|e| ApiError::internal(format!("Failed to encode modules: {}", e)))?;
            set.insert("modules", modules_bson);
        }

        self.collection()
            .update_one(doc! { "_id": course.id }, doc! { "$set": set })
            .await?;

        self.get(course_id).await
    }

    pub async fn delete(&self, coach: &AuthUser, course_id: &str) -> Result<(), ApiError> {
        let course = self.find_course(course_id).await?;
        ensure_owner(&course, coach)?;

        self.collection().delete_one(doc! { "_id": course.id }).await?;

        // Orphaned answer keys must not outlive the course.
        let assignments: Collection<AssignmentDocument> = self.mongo.collection("assignments");
        assignments
            .delete_many(doc! { "course_id": course.id })
            .await?;

        tracing::info!("Course {} deleted by coach {}", course.id.to_hex(), coach.id);
        Ok(())
    }

    pub async fn find_course(&self, course_id: &str) -> Result<CourseDocument, ApiError> {
        let oid = parse_object_id(course_id, "course")?;
        self.collection()
            .find_one(doc! { "_id": oid })
            .await?
            .ok_or_else(|| ApiError::not_found("Course not found"))
    }
}

fn ensure_owner(course: &CourseDocument, coach: &AuthUser) -> Result<(), ApiError> {
    if course.coach_id != coach.id {
        return Err(ApiError::forbidden("You do not own this course"));
    }
    Ok(())
}

fn build_modules(inputs: Vec<ModuleInput>) -> Result<Vec<ModuleRecord>, ApiError> {
    inputs
        .into_iter()
        .map(|input| {
            let assignment_id = input
                .assignment_id
                .as_deref()
                .map(|id| parse_object_id(id, "assignment"))
                .transpose()?;

            Ok(ModuleRecord {
                id: Uuid::new_v4().to_string(),
                title: input.title,
                resources: input
                    .resources
                    .into_iter()
                    .map(|resource| ResourceRecord {
                        id: Uuid::new_v4().to_string(),
                        title: resource.title,
                        kind: resource.kind,
                        url: resource.url,
                    })
                    .collect(),
                assignment_id,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::course::{ResourceInput, ResourceKind};

    #[test]
    fn build_modules_assigns_fresh_ids() {
        let inputs = vec![ModuleInput {
            title: "Intro".to_string(),
            resources: vec![ResourceInput {
                title: "Welcome".to_string(),
                kind: ResourceKind::Video,
                url: "https://example.com/welcome".to_string(),
            }],
            assignment_id: None,
        }];

        let modules = build_modules(inputs).unwrap();
        assert_eq!(modules.len(), 1);
        assert!(!modules[0].id.is_empty());
        assert_eq!(modules[0].resources.len(), 1);
        assert_ne!(modules[0].id, modules[0].resources[0].id);
    }

    #[test]
    fn build_modules_rejects_malformed_assignment_id() {
        let inputs = vec![ModuleInput {
            title: "Quiz block".to_string(),
            resources: Vec::new(),
            assignment_id: Some("nonsense".to_string()),
        }];
        assert!(build_modules(inputs).is_err());
    }
}
