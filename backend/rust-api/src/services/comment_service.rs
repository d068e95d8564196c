use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime};
use mongodb::{options::FindOptions, Collection, Database};

use crate::errors::ApiError;
use crate::middlewares::auth::AuthUser;
use crate::models::comment::{
    CommentCreateRequest, CommentDocument, CommentUpdateRequest, CommentView,
};
use crate::models::CourseDocument;
use crate::utils::parse_object_id;

const MAX_LIST_LIMIT: i64 = 200;

pub struct CommentService {
    mongo: Database,
}

impl CommentService {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    fn collection(&self) -> Collection<CommentDocument> {
        self.mongo.collection("comments")
    }

    fn courses(&self) -> Collection<CourseDocument> {
        self.mongo.collection("courses")
    }

    pub async fn list(&self, course_id: &str) -> Result<Vec<CommentView>, ApiError> {
        let course = self.find_course(course_id).await?;

        let options = FindOptions::builder()
            .sort(doc! { "createdAt": -1 })
            .limit(MAX_LIST_LIMIT)
            .build();

        let mut cursor = self
            .collection()
            .find(doc! { "course_id": course.id })
            .with_options(options)
            .await?;

        let mut comments = Vec::new();
        while let Some(comment) = cursor.try_next().await? {
            comments.push(CommentView::from_doc(&comment));
        }
        Ok(comments)
    }

    pub async fn create(
        &self,
        user: &AuthUser,
        course_id: &str,
        req: CommentCreateRequest,
    ) -> Result<CommentView, ApiError> {
        let course = self.find_course(course_id).await?;

        let now = BsonDateTime::now();
        let comment = CommentDocument {
            id: ObjectId::new(),
            course_id: course.id,
            author_id: user.id.clone(),
            author_role: user.role.as_str().to_string(),
            body: req.body,
            created_at: now,
            updated_at: now,
        };

        self.collection().insert_one(&comment).await?;
        Ok(CommentView::from_doc(&comment))
    }

    pub async fn update(
        &self,
        user: &AuthUser,
        comment_id: &str,
        req: CommentUpdateRequest,
    ) -> Result<CommentView, ApiError> {
        let comment = self.find_comment(comment_id).await?;
        if comment.author_id != user.id {
            return Err(ApiError::forbidden("You may only edit your own comments"));
        }

        self.collection()
            .update_one(
                doc! { "_id": comment.id },
                doc! { "$set": { "body": &req.body, "updatedAt": BsonDateTime::now() } },
            )
            .await?;

        let updated = self.find_comment(comment_id).await?;
        Ok(CommentView::from_doc(&updated))
    }

    /// The author may delete their own comment; the coach owning the
    /// course may moderate any comment on it.
    pub async fn delete(&self, user: &AuthUser, comment_id: &str) -> Result<(), ApiError> {
        let comment = self.find_comment(comment_id).await?;

        if comment.author_id != user.id {
            let course = self
                .courses()
                .find_one(doc! { "_id": comment.course_id })
                .await?;
            let owns_course = course
                .map(|course| course.coach_id == user.id)
                .unwrap_or(false);
            if !owns_course {
                return Err(ApiError::forbidden(
                    "Only the author or the course owner may delete this comment",
                ));
            }
        }

        self.collection().delete_one(doc! { "_id": comment.id }).await?;
        Ok(())
    }

    async fn find_comment(&self, comment_id: &str) -> Result<CommentDocument, ApiError> {
        let oid = parse_object_id(comment_id, "comment")?;
        self.collection()
            .find_one(doc! { "_id": oid })
            .await?
            .ok_or_else(|| ApiError::not_found("Comment not found"))
    }

    async fn find_course(&self, course_id: &str) -> Result<CourseDocument, ApiError> {
        let oid = parse_object_id(course_id, "course")?;
        self.courses()
            .find_one(doc! { "_id": oid })
            .await?
            .ok_or_else(|| ApiError::not_found("Course not found"))
    }
}
