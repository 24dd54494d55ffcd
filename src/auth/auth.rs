use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::error::ApiError;
use crate::model::profile::Profile;
use crate::models::TokenType;
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};

/// The authenticated caller, decoded from the bearer access token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub account_id: u64,
    pub username: String,
    pub profile: Profile,
    pub employee_id: u64,
}

impl AuthUser {
    /// Decodes `Authorization: Bearer <token>`; refresh tokens are refused.
    pub fn from_header(req: &HttpRequest, secret: &str) -> Result<Self, ApiError> {
        let header = req
            .headers()
            .get("Authorization")
            .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?
            .to_str()
            .map_err(|_| ApiError::unauthorized("Invalid Authorization header encoding"))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::unauthorized("Authorization header must start with Bearer"))?;

        let claims = verify_token(token, secret)
            .map_err(|e| ApiError::unauthorized(format!("Invalid or expired token: {e}")))?;

        if claims.token_type != TokenType::Access {
            return Err(ApiError::unauthorized("Access token required"));
        }

        Ok(AuthUser {
            account_id: claims.account_id,
            username: claims.sub,
            profile: claims.profile,
            employee_id: claims.employee_id,
        })
    }

    /// 403 unless the caller's profile is one of `allowed`.
    pub fn require_any(&self, allowed: &[Profile]) -> Result<(), ApiError> {
        if self.profile.is_any_of(allowed) {
            Ok(())
        } else {
            Err(ApiError::forbidden(format!(
                "Required profile: {}",
                Profile::describe(allowed)
            )))
        }
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        self.require_any(&[Profile::Administrator])
    }

    /// Administrators and supervisors manage the organisation data.
    pub fn require_manager(&self) -> Result<(), ApiError> {
        self.require_any(&[Profile::Administrator, Profile::Supervisor])
    }

    pub fn is_manager(&self) -> bool {
        self.profile.is_any_of(&[Profile::Administrator, Profile::Supervisor])
    }
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // set by the auth middleware on protected scopes
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => {
                tracing::error!("Config missing from app data");
                return ready(Err(ApiError::Internal.into()));
            }
        };

        ready(AuthUser::from_header(req, &config.jwt_secret).map_err(Into::into))
    }
}
