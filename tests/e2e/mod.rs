pub mod editing;
pub mod file_change;
pub mod todo;
