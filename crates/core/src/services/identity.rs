//! Identity resolution.
//!
//! The caller asserts an identity by sending `Authorization: <scheme> <user id>`.
//! Nothing is signed: only the format and the existence of the user are
//! checked, so any caller can act as any user whose id it knows.

use photoshare_common::{AppError, AppResult};
use photoshare_db::{entities::user, repositories::UserRepository};

/// Resolves the acting user of a request.
#[derive(Clone)]
pub struct IdentityService {
    user_repo: UserRepository,
}

impl IdentityService {
    /// Create a new identity service.
    #[must_use]
    pub const fn new(user_repo: UserRepository) -> Self {
        Self { user_repo }
    }

    /// Resolve an `Authorization` header value to an existing user.
    pub async fn resolve(&self, authorization: Option<&str>) -> AppResult<user::Model> {
        let value = authorization
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;
        let user_id = parse_authorization(value)?;

        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized(format!("Unknown user {user_id}")))
    }
}

/// Extract the numeric user id from `"<scheme> <id>"`.
///
/// The scheme itself is not checked.
pub fn parse_authorization(value: &str) -> AppResult<i32> {
    let mut parts = value.split_whitespace();
    let (Some(_scheme), Some(token), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(AppError::Unauthorized(
            "Malformed Authorization header".to_string(),
        ));
    };

    token
        .parse::<u32>()
        .ok()
        .and_then(|id| i32::try_from(id).ok())
        .ok_or_else(|| AppError::Unauthorized("Malformed user id".to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    #[test]
    fn test_parse_authorization() {
        assert_eq!(parse_authorization("Bearer 42").unwrap(), 42);
        assert_eq!(parse_authorization("token 7").unwrap(), 7);
        assert_eq!(parse_authorization("  Bearer   1 ").unwrap(), 1);
    }

    #[test]
    fn test_parse_authorization_rejects_malformed() {
        for value in ["", "Bearer", "42", "Bearer abc", "Bearer -1", "Bearer 1 2", "Bearer 99999999999"] {
            let err = parse_authorization(value).unwrap_err();
            assert!(matches!(err, AppError::Unauthorized(_)), "{value:?}");
        }
    }

    #[tokio::test]
    async fn test_resolve_missing_header() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = IdentityService::new(UserRepository::new(db));

        let err = service.resolve(None).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_resolve_unknown_user() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );
        let service = IdentityService::new(UserRepository::new(db));

        let err = service.resolve(Some("Bearer 5")).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_resolve_existing_user() {
        let alice = user::Model {
            id: 1,
            username: "alice".to_string(),
            created_at: Utc::now().into(),
        };
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[alice]])
                .into_connection(),
        );
        let service = IdentityService::new(UserRepository::new(db));

        let user = service.resolve(Some("Bearer 1")).await.unwrap();
        assert_eq!(user.username, "alice");
    }
}
