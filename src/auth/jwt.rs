use std::time::{SystemTime, UNIX_EPOCH};

use crate::model::profile::Profile;
use crate::models::{Claims, TokenType};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::Error};
use uuid::Uuid;

fn now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as usize)
        .unwrap_or_default()
}

/// Identity carried by both token kinds.
#[derive(Debug, Clone)]
pub struct TokenSubject {
    pub account_id: u64,
    pub username: String,
    pub profile: Profile,
    pub employee_id: u64,
}

fn issue(subject: &TokenSubject, token_type: TokenType, secret: &str, ttl: usize) -> Result<(String, Claims), Error> {
    let claims = Claims {
        account_id: subject.account_id,
        sub: subject.username.clone(),
        profile: subject.profile,
        exp: now() + ttl,
        jti: Uuid::new_v4().to_string(),
        token_type,
        employee_id: subject.employee_id,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok((token, claims))
}

pub fn generate_access_token(subject: &TokenSubject, secret: &str, ttl: usize) -> Result<String, Error> {
    issue(subject, TokenType::Access, secret, ttl).map(|(token, _)| token)
}

pub fn generate_refresh_token(
    subject: &TokenSubject,
    secret: &str,
    ttl: usize,
) -> Result<(String, Claims), Error> {
    issue(subject, TokenType::Refresh, secret, ttl)
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

impl From<&Claims> for TokenSubject {
    fn from(claims: &Claims) -> Self {
        Self {
            account_id: claims.account_id,
            username: claims.sub.clone(),
            profile: claims.profile,
            employee_id: claims.employee_id,
        }
    }
}

#[cfg(test)]
pub(crate) fn test_token(profile: Profile, employee_id: u64, secret: &str) -> String {
    let subject = TokenSubject {
        account_id: employee_id,
        username: format!("user{employee_id}"),
        profile,
        employee_id,
    };
    generate_access_token(&subject, secret, 600).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret";

    fn subject() -> TokenSubject {
        TokenSubject {
            account_id: 4,
            username: "mmartin".into(),
            profile: Profile::Coordinator,
            employee_id: 2,
        }
    }

    #[test]
    fn access_token_round_trips() {
        let token = generate_access_token(&subject(), SECRET, 60).unwrap();
        let claims = verify_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, "mmartin");
        assert_eq!(claims.profile, Profile::Coordinator);
        assert_eq!(claims.employee_id, 2);
        assert_eq!(claims.token_type, TokenType::Access);
    }

    #[test]
    fn refresh_token_has_unique_jti() {
        let (_, a) = generate_refresh_token(&subject(), SECRET, 60).unwrap();
        let (_, b) = generate_refresh_token(&subject(), SECRET, 60).unwrap();
        assert_eq!(a.token_type, TokenType::Refresh);
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = generate_access_token(&subject(), SECRET, 60).unwrap();
        assert!(verify_token(&token, "other").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let claims = Claims {
            account_id: 1,
            sub: "old".into(),
            profile: Profile::Validator,
            exp: 1_000,
            jti: "x".into(),
            token_type: TokenType::Access,
            employee_id: 1,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert!(verify_token(&token, SECRET).is_err());
    }
}
