pub mod account;
pub mod assistant;
pub mod enrollments;
pub mod modules;
pub mod payments;
pub mod programs;
pub mod progress;
pub mod quiz;
pub mod resources;
