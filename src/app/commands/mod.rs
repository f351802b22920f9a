pub mod assistant;
pub mod fetch;
pub mod manifest;
pub mod status;
pub mod submit;
pub mod wait;
