use crate::model::profile::Profile;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// `application/x-www-form-urlencoded` login body (OAuth2 password form).
#[derive(Serialize, Deserialize, ToSchema)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub account_id: u64,
    pub sub: String,
    pub profile: Profile,
    pub exp: usize,
    pub jti: String,

    pub token_type: TokenType,
    pub employee_id: u64,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SessionUser {
    pub id: u64,
    pub username: String,
    pub profile: Profile,
    pub employee_id: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    /// Seconds until the access token expires
    pub expires_in: usize,
    pub refresh_token: String,
    pub user: SessionUser,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}
