pub mod time;

use crate::errors::ApiError;
use mongodb::bson::oid::ObjectId;

pub fn parse_object_id(value: &str, what: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(value).map_err(|_| ApiError::bad_request(format!("Invalid {} id", what)))
}
