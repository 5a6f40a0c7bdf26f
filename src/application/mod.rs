// Application layer - seams and use cases
pub mod dashboard_service;
pub mod dashboard_view;
pub mod data_source;
pub mod errors;
pub mod seeder;
pub mod store;
pub mod streaming_service;
