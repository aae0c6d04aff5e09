pub mod cache;
pub mod extractor;
pub mod file_validator;
pub mod guard;
pub mod handlers;
pub mod parser;
pub mod pipeline;
pub mod prompts;
pub mod schema;
pub mod yaml;
