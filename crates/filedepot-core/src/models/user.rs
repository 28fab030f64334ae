use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Registered user. Identity is immutable once created; only an external
/// administrative action could remove it (not modeled here).
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    /// bcrypt hash; never serialized.
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Public representation of a user.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            email: user.email,
        }
    }
}

/// Request DTO for POST /users. Fields are optional so missing ones can be
/// reported individually ("Missing email" / "Missing password"); an empty
/// string counts as missing. No format constraint beyond that.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, message = "Missing email"))]
    pub email: Option<String>,
    #[validate(length(min = 1, message = "Missing password"))]
    pub password: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_response_hides_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            email: "a@b.com".to_string(),
            password_hash: "$2b$12$secret".to_string(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(UserResponse::from(user)).unwrap();
        assert_eq!(json["email"], "a@b.com");
        assert!(json.get("password_hash").is_none());
    }

    #[test]
    fn test_create_user_request_missing_fields_deserialize() {
        let req: CreateUserRequest = serde_json::from_str("{}").unwrap();
        assert!(req.email.is_none());
        assert!(req.password.is_none());
    }

    #[test]
    fn test_create_user_request_accepts_any_nonempty_email() {
        let req = CreateUserRequest {
            email: Some("bob".to_string()),
            password: Some("pw".to_string()),
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_create_user_request_treats_empty_strings_as_missing() {
        let req = CreateUserRequest {
            email: Some(String::new()),
            password: Some("pw".to_string()),
        };
        assert!(req.validate().is_err());

        let req = CreateUserRequest {
            email: Some("bob@example.com".to_string()),
            password: Some(String::new()),
        };
        assert!(req.validate().is_err());
    }
}
