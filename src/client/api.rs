use super::cache::{QueryCache, QueryKey};
use super::error::{ClientError, ClientResult};
use super::session::Session;
use crate::api::{
    accounts::{CreateAccount, UpdateAccount},
    delegations::CreateDelegation,
    employees::{CreateEmployee, UpdateEmployee},
    reports::ReportQuery,
    requests::{CommentBody, CreateRequest, RequestQuery, UpdateRequest},
    services::{CreateService, UpdateService},
};
use crate::model::{
    account::Account, delegation::Delegation, employee::Employee, request::OvertimeRequest,
    service::Service, status::ApprovalLevel, workflow::Workflow,
};
use crate::models::{LoginForm, LoginResponse, SessionUser, TokenPair};
use crate::report::aggregator::{Dashboard, Report};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;
use std::time::Duration;

/// Typed client for the REST API.
///
/// Every call carries the session's bearer token. A 401 anywhere clears the
/// session and the query cache and surfaces as [`ClientError::SessionExpired`].
/// List reads go through the [`QueryCache`]; mutations invalidate the
/// families they touch.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<Session>,
    cache: QueryCache,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self::with_http(base_url, http))
    }

    pub fn with_http(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session: Arc::new(Session::new()),
            cache: QueryCache::new(),
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.session.access_token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn check(&self, resp: Response) -> ClientResult<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        let err = ClientError::from_response(status, &body);
        if err.requires_login() {
            log::warn!("Session rejected by the server, clearing it");
            self.session.clear();
            self.cache.clear();
        }
        Err(err)
    }

    async fn send(&self, builder: RequestBuilder) -> ClientResult<Response> {
        let resp = self.authed(builder).send().await?;
        self.check(resp).await
    }

    async fn parse<T: DeserializeOwned>(resp: Response) -> ClientResult<T> {
        resp.json::<T>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// Cached GET; the full URL (query string included) is the entry key.
    async fn fetch<T>(&self, key: QueryKey, builder: RequestBuilder) -> ClientResult<T>
    where
        T: DeserializeOwned + Serialize,
    {
        let request = self.authed(builder).build()?;
        let entry = request.url().as_str().to_string();
        if let Some(hit) = self.cache.get(key, &entry).await {
            return Ok(hit);
        }

        let resp = self.http.execute(request).await?;
        let value: T = Self::parse(self.check(resp).await?).await?;
        self.cache.insert(key, &entry, &value).await;
        Ok(value)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        Self::parse(self.send(self.http.get(self.url(path))).await?).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> ClientResult<T> {
        Self::parse(self.send(self.http.post(self.url(path)).json(body)).await?).await
    }

    async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> ClientResult<T> {
        Self::parse(self.send(self.http.put(self.url(path)).json(body)).await?).await
    }

    async fn delete(&self, path: &str) -> ClientResult<()> {
        self.send(self.http.delete(self.url(path))).await?;
        Ok(())
    }

    // ---- authentication ----

    /// Form login. A 401 here means bad credentials, not an expired session.
    pub async fn login(&self, username: &str, password: &str) -> ClientResult<SessionUser> {
        let form = LoginForm {
            username: username.to_string(),
            password: password.to_string(),
        };
        let resp = self.http.post(self.url("/auth/login")).form(&form).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(match ClientError::from_response(status, &body) {
                ClientError::SessionExpired => ClientError::Api {
                    status: StatusCode::UNAUTHORIZED.as_u16(),
                    detail: "Invalid username or password".to_string(),
                },
                other => other,
            });
        }

        let login: LoginResponse = Self::parse(resp).await?;
        let user = login.user.clone();
        self.cache.clear();
        self.session.store(login);
        log::info!("Logged in as {}", user.username);
        Ok(user)
    }

    /// Exchanges the refresh token for a new pair.
    pub async fn refresh(&self) -> ClientResult<()> {
        let token = self
            .session
            .refresh_token()
            .ok_or(ClientError::SessionExpired)?;
        let resp = self
            .http
            .post(self.url("/auth/refresh"))
            .bearer_auth(token)
            .send()
            .await?;

        let pair: TokenPair = Self::parse(self.check(resp).await?).await?;
        self.session.rotate(pair.access_token, pair.refresh_token);
        Ok(())
    }

    /// Always ends with an empty session, even if the server is unreachable.
    pub async fn logout(&self) {
        if let Some(token) = self.session.refresh_token() {
            let sent = self
                .http
                .post(self.url("/auth/logout"))
                .bearer_auth(token)
                .send()
                .await;
            if let Err(e) = sent {
                log::warn!("Logout call failed: {e}");
            }
        }
        self.session.clear();
        self.cache.clear();
    }

    pub async fn me(&self) -> ClientResult<Account> {
        self.get("/auth/me").await
    }

    // ---- services ----

    pub async fn services(&self) -> ClientResult<Vec<Service>> {
        self.fetch(QueryKey::Services, self.http.get(self.url("/services")))
            .await
    }

    pub async fn service(&self, id: u64) -> ClientResult<Service> {
        self.get(&format!("/services/{id}")).await
    }

    pub async fn create_service(&self, body: &CreateService) -> ClientResult<Service> {
        let created = self.post("/services", body).await?;
        self.cache.invalidate(QueryKey::Services);
        Ok(created)
    }

    pub async fn update_service(&self, id: u64, body: &UpdateService) -> ClientResult<Service> {
        let updated = self.put(&format!("/services/{id}"), body).await?;
        self.cache.invalidate(QueryKey::Services);
        Ok(updated)
    }

    pub async fn delete_service(&self, id: u64) -> ClientResult<()> {
        self.delete(&format!("/services/{id}")).await?;
        self.cache.invalidate(QueryKey::Services);
        Ok(())
    }

    // ---- employees ----

    pub async fn employees(&self) -> ClientResult<Vec<Employee>> {
        self.fetch(QueryKey::Employees, self.http.get(self.url("/employees")))
            .await
    }

    pub async fn employee(&self, id: u64) -> ClientResult<Employee> {
        self.get(&format!("/employees/{id}")).await
    }

    pub async fn create_employee(&self, body: &CreateEmployee) -> ClientResult<Employee> {
        let created = self.post("/employees", body).await?;
        self.cache.invalidate(QueryKey::Employees);
        Ok(created)
    }

    pub async fn update_employee(&self, id: u64, body: &UpdateEmployee) -> ClientResult<Employee> {
        let updated = self.put(&format!("/employees/{id}"), body).await?;
        self.cache.invalidate(QueryKey::Employees);
        Ok(updated)
    }

    pub async fn delete_employee(&self, id: u64) -> ClientResult<()> {
        self.delete(&format!("/employees/{id}")).await?;
        self.cache.invalidate(QueryKey::Employees);
        Ok(())
    }

    // ---- accounts ----

    pub async fn accounts(&self) -> ClientResult<Vec<Account>> {
        self.fetch(QueryKey::Accounts, self.http.get(self.url("/accounts")))
            .await
    }

    pub async fn create_account(&self, body: &CreateAccount) -> ClientResult<Account> {
        let created = self.post("/accounts", body).await?;
        self.cache.invalidate(QueryKey::Accounts);
        Ok(created)
    }

    pub async fn update_account(&self, id: u64, body: &UpdateAccount) -> ClientResult<Account> {
        let updated = self.put(&format!("/accounts/{id}"), body).await?;
        self.cache.invalidate(QueryKey::Accounts);
        Ok(updated)
    }

    // ---- requests ----

    pub async fn requests(&self, query: &RequestQuery) -> ClientResult<Vec<OvertimeRequest>> {
        self.fetch(
            QueryKey::Requests,
            self.http.get(self.url("/requests")).query(query),
        )
        .await
    }

    pub async fn my_requests(&self) -> ClientResult<Vec<OvertimeRequest>> {
        self.fetch(
            QueryKey::MyRequests,
            self.http.get(self.url("/requests/my-requests")),
        )
        .await
    }

    /// Requests waiting for the caller's decision.
    pub async fn pending_requests(&self) -> ClientResult<Vec<OvertimeRequest>> {
        self.fetch(
            QueryKey::PendingRequests,
            self.http.get(self.url("/requests/pending")),
        )
        .await
    }

    pub async fn request(&self, id: u64) -> ClientResult<OvertimeRequest> {
        self.get(&format!("/requests/{id}")).await
    }

    pub async fn create_request(&self, body: &CreateRequest) -> ClientResult<OvertimeRequest> {
        let created = self.post("/requests", body).await?;
        self.cache.invalidate_many(&QueryKey::REQUEST_FAMILIES);
        Ok(created)
    }

    pub async fn update_request(&self, id: u64, body: &UpdateRequest) -> ClientResult<OvertimeRequest> {
        let updated = self.put(&format!("/requests/{id}"), body).await?;
        self.cache.invalidate_many(&QueryKey::REQUEST_FAMILIES);
        Ok(updated)
    }

    pub async fn delete_request(&self, id: u64) -> ClientResult<()> {
        self.delete(&format!("/requests/{id}")).await?;
        self.cache.invalidate_many(&QueryKey::REQUEST_FAMILIES);
        Ok(())
    }

    pub async fn request_workflows(&self, id: u64) -> ClientResult<Vec<Workflow>> {
        self.fetch(
            QueryKey::Workflows,
            self.http.get(self.url(&format!("/requests/{id}/workflows"))),
        )
        .await
    }

    // ---- approval ----

    pub async fn submit(&self, id: u64, comment: Option<String>) -> ClientResult<OvertimeRequest> {
        self.transition(&format!("/requests/{id}/submit"), comment).await
    }

    pub async fn approve(
        &self,
        id: u64,
        level: ApprovalLevel,
        comment: Option<String>,
    ) -> ClientResult<OvertimeRequest> {
        self.transition(&format!("/requests/{id}/approve/{}", level.number()), comment)
            .await
    }

    pub async fn follow_up(&self, id: u64, comment: Option<String>) -> ClientResult<OvertimeRequest> {
        self.transition(&format!("/requests/{id}/follow-up"), comment).await
    }

    pub async fn reject(&self, id: u64, comment: Option<String>) -> ClientResult<OvertimeRequest> {
        self.transition(&format!("/requests/{id}/reject"), comment).await
    }

    pub async fn cancel(&self, id: u64, comment: Option<String>) -> ClientResult<OvertimeRequest> {
        self.transition(&format!("/requests/{id}/cancel"), comment).await
    }

    /// Applies a decision, drops every request family and refetches the
    /// caller's pending list so the next read is fresh.
    async fn transition(&self, path: &str, comment: Option<String>) -> ClientResult<OvertimeRequest> {
        let updated: OvertimeRequest = self.post(path, &CommentBody { comment }).await?;
        self.cache.invalidate_many(&QueryKey::REQUEST_FAMILIES);

        if let Err(e) = self.pending_requests().await {
            log::warn!("Refetching pending requests failed: {e}");
        }
        Ok(updated)
    }

    // ---- delegations & workflows ----

    pub async fn delegations(&self, active: Option<bool>) -> ClientResult<Vec<Delegation>> {
        let mut builder = self.http.get(self.url("/delegations"));
        if let Some(active) = active {
            builder = builder.query(&[("active", active)]);
        }
        self.fetch(QueryKey::Delegations, builder).await
    }

    pub async fn create_delegation(&self, body: &CreateDelegation) -> ClientResult<Delegation> {
        let created = self.post("/delegations", body).await?;
        // delegated authority changes what is actionable
        self.cache.invalidate_many(&[
            QueryKey::Delegations,
            QueryKey::PendingRequests,
            QueryKey::Dashboard,
        ]);
        Ok(created)
    }

    pub async fn delete_delegation(&self, id: u64) -> ClientResult<()> {
        self.delete(&format!("/delegations/{id}")).await?;
        self.cache.invalidate_many(&[
            QueryKey::Delegations,
            QueryKey::PendingRequests,
            QueryKey::Dashboard,
        ]);
        Ok(())
    }

    pub async fn workflows(&self, request_id: Option<u64>) -> ClientResult<Vec<Workflow>> {
        let mut builder = self.http.get(self.url("/workflows"));
        if let Some(id) = request_id {
            builder = builder.query(&[("request_id", id)]);
        }
        self.fetch(QueryKey::Workflows, builder).await
    }

    // ---- reports ----

    pub async fn dashboard(&self) -> ClientResult<Dashboard> {
        self.fetch(QueryKey::Dashboard, self.http.get(self.url("/dashboard")))
            .await
    }

    pub async fn report(&self, query: &ReportQuery) -> ClientResult<Report> {
        let resp = self
            .send(self.http.get(self.url("/reports/summary")).query(query))
            .await?;
        Self::parse(resp).await
    }

    /// Raw CSV body of `/reports/export`.
    pub async fn export_csv(&self, query: &ReportQuery) -> ClientResult<String> {
        let resp = self
            .send(self.http.get(self.url("/reports/export")).query(query))
            .await?;
        resp.text()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::profile::Profile;
    use actix_web::{App, HttpResponse, HttpServer, web};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Hits {
        services: AtomicUsize,
    }

    fn service_json(id: u64) -> serde_json::Value {
        json!({
            "id": id,
            "service_code": "IT001",
            "service_name": "Service Informatique",
            "parent_service_id": null,
            "description": null,
            "manager": null,
            "created_at": "2026-01-01T08:00:00",
            "updated_at": "2026-01-01T08:00:00"
        })
    }

    async fn login(form: web::Form<LoginForm>) -> HttpResponse {
        if form.password != "secret" {
            return HttpResponse::Unauthorized()
                .json(json!({"error": "unauthorized", "detail": "Incorrect username or password"}));
        }
        HttpResponse::Ok().json(json!({
            "access_token": "access-1",
            "token_type": "bearer",
            "expires_in": 1800,
            "refresh_token": "refresh-1",
            "user": {"id": 1, "username": form.username, "profile": "Administrator", "employee_id": 1}
        }))
    }

    async fn list_services(hits: web::Data<Hits>) -> HttpResponse {
        hits.services.fetch_add(1, Ordering::SeqCst);
        HttpResponse::Ok().json(vec![service_json(1)])
    }

    async fn create_service() -> HttpResponse {
        HttpResponse::Created().json(service_json(2))
    }

    async fn expired() -> HttpResponse {
        HttpResponse::Unauthorized()
            .insert_header(("WWW-Authenticate", "Bearer"))
            .json(json!({"error": "unauthorized", "detail": "Invalid or expired token"}))
    }

    async fn conflict() -> HttpResponse {
        HttpResponse::Conflict().json(json!({"error": "conflict", "detail": "Request was modified concurrently"}))
    }

    /// Serves a tiny fake backend on an ephemeral port.
    fn start_backend(hits: web::Data<Hits>) -> ApiClient {
        let server = HttpServer::new(move || {
            App::new()
                .app_data(hits.clone())
                .route("/auth/login", web::post().to(login))
                .route("/services", web::get().to(list_services))
                .route("/services", web::post().to(create_service))
                .route("/accounts", web::get().to(expired))
                .route("/requests/{id}/reject", web::post().to(conflict))
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();
        let addr = server.addrs()[0];
        actix_web::rt::spawn(server.run());

        let http = reqwest::Client::builder().no_proxy().build().unwrap();
        ApiClient::with_http(format!("http://{addr}"), http)
    }

    #[actix_web::test]
    async fn login_stores_the_session() {
        let client = start_backend(web::Data::new(Hits::default()));

        let user = client.login("admin", "secret").await.unwrap();
        assert_eq!(user.profile, Profile::Administrator);
        assert!(client.session().is_authenticated());
        assert_eq!(client.session().access_token().as_deref(), Some("access-1"));
    }

    #[actix_web::test]
    async fn bad_credentials_are_not_a_session_expiry() {
        let client = start_backend(web::Data::new(Hits::default()));

        let err = client.login("admin", "wrong").await.unwrap_err();
        assert!(!err.requires_login());
        assert_eq!(err.status(), Some(401));
        assert!(!client.session().is_authenticated());
    }

    #[actix_web::test]
    async fn lists_are_cached_until_a_mutation() {
        let hits = web::Data::new(Hits::default());
        let client = start_backend(hits.clone());
        client.login("admin", "secret").await.unwrap();

        assert_eq!(client.services().await.unwrap().len(), 1);
        assert_eq!(client.services().await.unwrap().len(), 1);
        assert_eq!(hits.services.load(Ordering::SeqCst), 1);

        let body = CreateService {
            service_code: "IT002".to_string(),
            service_name: "Support".to_string(),
            parent_service_id: None,
            description: None,
            manager: None,
        };
        assert_eq!(client.create_service(&body).await.unwrap().id, 2);

        client.services().await.unwrap();
        assert_eq!(hits.services.load(Ordering::SeqCst), 2);
    }

    #[actix_web::test]
    async fn unauthorized_clears_the_session() {
        let client = start_backend(web::Data::new(Hits::default()));
        client.login("admin", "secret").await.unwrap();

        let err = client.accounts().await.unwrap_err();
        assert!(err.requires_login());
        assert!(!client.session().is_authenticated());
    }

    #[actix_web::test]
    async fn concurrent_decision_surfaces_as_conflict() {
        let client = start_backend(web::Data::new(Hits::default()));
        client.login("admin", "secret").await.unwrap();

        match client.reject(12, None).await.unwrap_err() {
            ClientError::Api { status, detail } => {
                assert_eq!(status, 409);
                assert!(detail.contains("concurrently"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(client.session().is_authenticated());
    }

    #[actix_web::test]
    async fn unreachable_server_is_a_transport_error() {
        let http = reqwest::Client::builder().no_proxy().build().unwrap();
        let client = ApiClient::with_http("http://127.0.0.1:9", http);
        let err = client.login("admin", "secret").await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
        assert_eq!(err.status(), None);
    }
}
