pub mod lead;
pub mod task;
pub mod history;
pub mod remark;
pub mod credential;
pub mod user;
pub mod session;

pub use lead::*;
pub use task::*;
pub use history::*;
pub use remark::*;
pub use credential::*;
pub use user::*;
pub use session::*;
