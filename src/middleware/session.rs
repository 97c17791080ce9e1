use axum::{extract::FromRequestParts, http::request::Parts};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use crate::error::ApiError;
use crate::models::session::{Claims, ManagementSession, Session, StudentSession};

/// Extension type to carry the JWT secret through request extensions.
#[derive(Clone)]
pub struct JwtSecret(pub String);

pub fn decode_session_token(token: &str, secret: &str) -> Result<Session, anyhow::Error> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    let data = decode::<Claims>(token, &key, &validation)?;
    Ok(Session::from_claims(data.claims))
}

// Rejections are ApiError so auth failures carry the same JSON body as
// every other error response.
fn session_from_parts(parts: &mut Parts) -> Result<Session, ApiError> {
    let auth_header = parts
        .headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Authentication("Missing Authorization header".into()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Authentication("Invalid Authorization header format".into()))?;

    let secret = parts
        .extensions
        .get::<JwtSecret>()
        .ok_or_else(|| ApiError::Internal("JWT secret not configured".into()))?;

    decode_session_token(token, &secret.0)
        .map_err(|_| ApiError::Authentication("Invalid or expired token".into()))
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        session_from_parts(parts)
    }
}

impl<S> FromRequestParts<S> for StudentSession
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match session_from_parts(parts)? {
            Session::Student(student) => Ok(student),
            Session::Management(_) => {
                Err(ApiError::Authorization("Student session required".into()))
            }
        }
    }
}

impl<S> FromRequestParts<S> for ManagementSession
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match session_from_parts(parts)? {
            Session::Management(manager) => Ok(manager),
            Session::Student(_) => {
                Err(ApiError::Authorization("Management session required".into()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{encode, EncodingKey, Header};

    use super::*;
    use crate::models::session::SessionRole;

    fn make_token(sub: &str, role: SessionRole, secret: &str) -> String {
        let now = chrono::Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: sub.to_string(),
            role,
            exp: now + 900,
            iat: now,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn decode_maps_roles_to_variants() {
        let token = make_token("23BCS042", SessionRole::Student, "s3cret");
        match decode_session_token(&token, "s3cret").unwrap() {
            Session::Student(s) => assert_eq!(s.student_id, "23BCS042"),
            Session::Management(_) => panic!("student token decoded as management"),
        }

        let token = make_token("warden-01", SessionRole::Management, "s3cret");
        assert!(decode_session_token(&token, "s3cret").unwrap().is_management());
    }

    #[test]
    fn decode_rejects_wrong_secret_and_unknown_role() {
        let token = make_token("23BCS042", SessionRole::Student, "s3cret");
        assert!(decode_session_token(&token, "other").is_err());

        // Role strings outside the closed set fail at decode, not later.
        let now = chrono::Utc::now().timestamp() as usize;
        let rogue = serde_json::json!({
            "sub": "x", "role": "superuser", "exp": now + 900, "iat": now
        });
        let token = encode(
            &Header::default(),
            &rogue,
            &EncodingKey::from_secret(b"s3cret"),
        )
        .unwrap();
        assert!(decode_session_token(&token, "s3cret").is_err());
    }

    fn request_parts(auth: Option<&str>) -> Parts {
        let mut builder = axum::http::Request::builder().uri("/votes");
        if let Some(value) = auth {
            builder = builder.header("Authorization", value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        parts.extensions.insert(JwtSecret("s3cret".to_string()));
        parts
    }

    #[tokio::test]
    async fn role_extractors_reject_the_other_role() {
        let student = make_token("23BCS042", SessionRole::Student, "s3cret");
        let mut parts = request_parts(Some(&format!("Bearer {student}")));
        let session = StudentSession::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(session.student_id, "23BCS042");

        let mut parts = request_parts(Some(&format!("Bearer {student}")));
        let err = ManagementSession::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Authorization(_)));

        let manager = make_token("warden-01", SessionRole::Management, "s3cret");
        let mut parts = request_parts(Some(&format!("Bearer {manager}")));
        let err = StudentSession::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Authorization(_)));
    }

    #[tokio::test]
    async fn missing_or_invalid_tokens_are_authentication_errors() {
        let mut parts = request_parts(None);
        let err = Session::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Authentication(_)));

        let mut parts = request_parts(Some("Token abc"));
        let err = Session::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Authentication(_)));

        let forged = make_token("23BCS042", SessionRole::Student, "other-secret");
        let mut parts = request_parts(Some(&format!("Bearer {forged}")));
        let err = Session::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Authentication(_)));
    }
}
