pub mod answer;
pub mod placement_result;
pub mod question;
pub mod student;
pub mod test;
