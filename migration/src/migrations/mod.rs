pub mod m202610160001_create_submissions;
pub mod m202610160002_create_grades;
pub mod m202610160003_create_similarity_records;
