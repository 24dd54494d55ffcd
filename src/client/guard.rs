use super::session::Session;
use crate::model::profile::Profile;

/// Outcome of checking a screen's profile requirement against the session.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Access {
    Allow,
    RedirectToLogin,
    AccessDenied,
}

/// An empty `required` set means any logged-in user.
pub fn check(profile: Option<Profile>, required: &[Profile]) -> Access {
    match profile {
        None => Access::RedirectToLogin,
        Some(_) if required.is_empty() => Access::Allow,
        Some(p) if p.is_any_of(required) => Access::Allow,
        Some(_) => Access::AccessDenied,
    }
}

pub fn guard(session: &Session, required: &[Profile]) -> Access {
    check(session.profile(), required)
}

/// Profile sets of the protected screens.
pub mod screens {
    use crate::model::profile::Profile;

    pub const DASHBOARD: &[Profile] = &[];
    pub const REQUESTS: &[Profile] = &[];
    pub const VALIDATION: &[Profile] = &[
        Profile::Administrator,
        Profile::Supervisor,
        Profile::Coordinator,
    ];
    pub const SERVICES: &[Profile] = &[Profile::Administrator, Profile::Supervisor];
    pub const EMPLOYEES: &[Profile] = &[Profile::Administrator, Profile::Supervisor];
    pub const DELEGATIONS: &[Profile] = &[Profile::Administrator, Profile::Supervisor];
    pub const ACCOUNTS: &[Profile] = &[Profile::Administrator];
    pub const REPORTS: &[Profile] = &[
        Profile::Administrator,
        Profile::Supervisor,
        Profile::Coordinator,
    ];
}
