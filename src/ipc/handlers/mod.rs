pub mod admin;
pub mod bulletins;
pub mod classes;
pub mod core;
pub mod grades;
pub mod students;
pub mod subjects;
