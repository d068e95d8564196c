pub mod assignment;
pub mod comment;
pub mod course;
pub mod path;
pub mod progress;

pub use assignment::{AssignmentDocument, AssignmentKind};
pub use course::{CourseDocument, ResourceKind};
pub use path::{PathDocument, PathEnrollmentDocument};
pub use progress::{ProgressDocument, SubmissionRecord};
