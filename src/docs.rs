use crate::api::accounts::{CreateAccount, UpdateAccount};
use crate::api::delegations::CreateDelegation;
use crate::api::employees::{CreateEmployee, UpdateEmployee};
use crate::api::health::Health;
use crate::api::requests::{CommentBody, CreateRequest, UpdateRequest};
use crate::api::services::{CreateService, UpdateService};
use crate::api::workflows::CreateWorkflow;
use crate::model::account::Account;
use crate::model::delegation::Delegation;
use crate::model::employee::{ContractType, Employee};
use crate::model::profile::Profile;
use crate::model::request::OvertimeRequest;
use crate::model::service::Service;
use crate::model::status::{ApprovalLevel, RequestStatus};
use crate::model::workflow::{Decision, Workflow};
use crate::models::{LoginForm, LoginResponse, SessionUser, TokenPair};
use crate::report::aggregator::{Dashboard, EmployeeStats, Report, ServiceStats, StatusCount, Summary};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "GHS API",
        version = "1.0.0",
        description = r#"
## Overtime Hours Management (GHS)

Employees record overtime requests; supervisors (level 1) and HR coordinators
(level 2) validate them, directly or through a delegation.

### Key Features
- **Organisation**: services (a tree), employees and user accounts
- **Requests**: create, edit while pending, submit, cancel
- **Approval**: two-level validation, follow-up, rejection, history
- **Reports**: counts, hours, approval rate, estimated cost, CSV export

### Security
Every endpoint except login, refresh, logout and health expects a
**JWT Bearer** access token. Profiles: Administrator, Supervisor,
Coordinator, Validator.

### Errors
`{"error": "<kind>", "detail": "<message>"}` with 400, 401, 403, 404, 409,
429 or 500.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::me,

        crate::api::health::health,
        crate::api::dashboard::dashboard,

        crate::api::services::list_services,
        crate::api::services::get_service,
        crate::api::services::create_service,
        crate::api::services::update_service,
        crate::api::services::delete_service,

        crate::api::employees::list_employees,
        crate::api::employees::get_employee,
        crate::api::employees::create_employee,
        crate::api::employees::update_employee,
        crate::api::employees::delete_employee,

        crate::api::accounts::list_accounts,
        crate::api::accounts::get_account,
        crate::api::accounts::create_account,
        crate::api::accounts::update_account,

        crate::api::requests::list_requests,
        crate::api::requests::my_requests,
        crate::api::requests::pending_requests,
        crate::api::requests::get_request,
        crate::api::requests::create_request,
        crate::api::requests::update_request,
        crate::api::requests::delete_request,
        crate::api::requests::submit_request,
        crate::api::requests::approve_request,
        crate::api::requests::follow_up_request,
        crate::api::requests::reject_request,
        crate::api::requests::cancel_request,
        crate::api::requests::request_workflows,

        crate::api::delegations::list_delegations,
        crate::api::delegations::create_delegation,
        crate::api::delegations::delete_delegation,

        crate::api::workflows::list_workflows,
        crate::api::workflows::create_workflow,

        crate::api::reports::summary,
        crate::api::reports::export
    ),
    components(
        schemas(
            LoginForm,
            LoginResponse,
            SessionUser,
            TokenPair,
            Profile,
            Account,
            CreateAccount,
            UpdateAccount,
            Service,
            CreateService,
            UpdateService,
            ContractType,
            Employee,
            CreateEmployee,
            UpdateEmployee,
            RequestStatus,
            ApprovalLevel,
            OvertimeRequest,
            CreateRequest,
            UpdateRequest,
            CommentBody,
            Delegation,
            CreateDelegation,
            Decision,
            Workflow,
            CreateWorkflow,
            Summary,
            ServiceStats,
            EmployeeStats,
            Report,
            StatusCount,
            Dashboard,
            Health
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Login and current account"),
        (name = "Services", description = "Departments, organised as a tree"),
        (name = "Employees", description = "Employee records"),
        (name = "Accounts", description = "User accounts and profiles"),
        (name = "Requests", description = "Overtime requests"),
        (name = "Approval", description = "Two-level validation workflow"),
        (name = "Delegations", description = "Temporary transfer of validation authority"),
        (name = "Workflows", description = "Validation history"),
        (name = "Reports", description = "Summaries, export and dashboard"),
        (name = "Health", description = "Liveness"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_secured_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/requests/{id}/approve/{level}"));
        assert!(doc.paths.paths.contains_key("/reports/summary"));
        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
