pub mod grade;
pub mod similarity_record;
pub mod submission;

pub use grade::Entity as Grade;
pub use similarity_record::Entity as SimilarityRecord;
pub use submission::Entity as Submission;
