use crate::config::Config;
use crate::middlewares::auth::JwksCache;
use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use mongodb::{Client as MongoClient, Database, IndexModel};

pub struct AppState {
    pub config: Config,
    pub mongo: Database,
    pub jwks: JwksCache,
}

impl AppState {
    pub async fn new(config: Config, mongo_client: MongoClient) -> anyhow::Result<Self> {
        let mongo = mongo_client.database(&config.mongo_database);
        let jwks = JwksCache::new(config.oidc_jwks_url.clone());

        Ok(Self {
            config,
            mongo,
            jwks,
        })
    }
}

/// Unique compound indexes backing the one-record-per-pair invariants.
/// Duplicate inserts fail with error code 11000, surfaced as `Conflict`.
pub async fn ensure_indexes(mongo: &Database) -> anyhow::Result<()> {
    let progress_index = IndexModel::builder()
        .keys(doc! { "learner_id": 1, "course_id": 1 })
        .options(IndexOptions::builder().unique(true).build())
        .build();
    mongo
        .collection::<crate::models::ProgressDocument>("progress")
        .create_index(progress_index)
        .await?;

    let path_enrollment_index = IndexModel::builder()
        .keys(doc! { "learner_id": 1, "path_id": 1 })
        .options(IndexOptions::builder().unique(true).build())
        .build();
    mongo
        .collection::<crate::models::PathEnrollmentDocument>("path_enrollments")
        .create_index(path_enrollment_index)
        .await?;

    tracing::info!("Unique indexes ensured on progress and path_enrollments");
    Ok(())
}

pub mod assignment_service;
pub mod comment_service;
pub mod course_service;
pub mod grader;
pub mod path_service;
pub mod progress_service;
