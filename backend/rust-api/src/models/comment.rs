use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::utils::time::bson_to_iso;

#[derive(Debug, Serialize, Deserialize)]
pub struct CommentDocument {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub course_id: ObjectId,
    pub author_id: String,
    pub author_role: String,
    pub body: String,
    #[serde(rename = "createdAt", alias = "created_at")]
    pub created_at: mongodb::bson::DateTime,
    #[serde(rename = "updatedAt", alias = "updated_at")]
    pub updated_at: mongodb::bson::DateTime,
}

#[derive(Debug, Serialize)]
pub struct CommentView {
    pub id: String,
    pub course_id: String,
    pub author_id: String,
    pub author_role: String,
    pub body: String,
    pub created_at: String,
    pub updated_at: String,
}

impl CommentView {
    pub fn from_doc(doc: &CommentDocument) -> Self {
        Self {
            id: doc.id.to_hex(),
            course_id: doc.course_id.to_hex(),
            author_id: doc.author_id.clone(),
            author_role: doc.author_role.clone(),
            body: doc.body.clone(),
            created_at: bson_to_iso(&doc.created_at),
            updated_at: bson_to_iso(&doc.updated_at),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CommentCreateRequest {
    #[validate(length(min = 1, max = 2000))]
    pub body: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CommentUpdateRequest {
    #[validate(length(min = 1, max = 2000))]
    pub body: String,
}
