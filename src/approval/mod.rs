//! Request approval workflow: the status state machine, who may act at
//! which level, and which requests a caller has to look at.

pub mod authority;
pub mod projection;
pub mod transition;
