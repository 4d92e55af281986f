//! The lead pipeline: task composition, transition rules and the mutations
//! that apply them.

pub mod form;
pub mod resolver;
pub mod workflow;
pub mod workspace;

pub use form::{build_task, TaskForm};
pub use resolver::resolve_next_stage;
pub use workflow::{
    add_remark, admin_override, bulk_assign, load_lead, manual_advance, record_task,
    AssignOutcome, TaskOutcome, Transition,
};
pub use workspace::LeadWorkspace;
