// Core data models for the lead pipeline
// These structs represent the domain entities

pub mod stage;
pub mod lead;
pub mod task;
pub mod history;
pub mod credential;
pub mod user;

pub use stage::*;
pub use lead::*;
pub use task::*;
pub use history::*;
pub use credential::*;
pub use user::*;
