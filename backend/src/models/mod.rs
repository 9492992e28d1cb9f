// Core models
pub mod match_model;
pub mod match_proposal;
pub mod match_record;
pub mod team;
pub mod user;

// Re-export commonly used types
pub use match_model::*;
pub use match_proposal::*;
pub use match_record::*;
pub use team::*;
pub use user::*;
