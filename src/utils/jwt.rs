//! HS256 access tokens identifying the calling user.

use jiff::Timestamp;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// JWT claims carried by access tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiration time (unix seconds)
    pub exp: i64,
}

impl Claims {
    /// Claims for `user_id` valid for `expiration_hours` from now.
    pub fn new(user_id: i32, expiration_hours: i64) -> Self {
        let now = Timestamp::now();
        let exp = now.as_second() + expiration_hours * 3600;

        Self {
            sub: user_id.to_string(),
            iat: now.as_second(),
            exp,
        }
    }

    /// The numeric user id in `sub`.
    pub fn user_id(&self) -> AppResult<i32> {
        self.sub.parse().map_err(|_| AppError::Unauthorized {
            message: "Token subject is not a user id".to_string(),
        })
    }
}

/// Signs an access token for `user_id`.
pub fn generate_access_token(user_id: i32, secret: &str, expiration_hours: i64) -> AppResult<String> {
    let claims = Claims::new(user_id, expiration_hours);

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal {
        source: anyhow::anyhow!("Failed to generate JWT token: {}", e),
    })
}

/// Verifies signature and expiry and returns the claims.
pub fn validate_access_token(token: &str, secret: &str) -> AppResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::Unauthorized {
            message: "Token has expired".to_string(),
        },
        jsonwebtoken::errors::ErrorKind::InvalidToken => AppError::Unauthorized {
            message: "Invalid token".to_string(),
        },
        jsonwebtoken::errors::ErrorKind::InvalidSignature => AppError::Unauthorized {
            message: "Invalid token signature".to_string(),
        },
        _ => AppError::Unauthorized {
            message: format!("Token validation failed: {}", e),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "test_secret_key_for_jwt_testing_000";

    #[test]
    fn test_generate_and_validate() {
        let token = generate_access_token(42, TEST_SECRET, 1).unwrap();
        assert_eq!(token.matches('.').count(), 2);

        let claims = validate_access_token(&token, TEST_SECRET).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.user_id().unwrap(), 42);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = generate_access_token(1, TEST_SECRET, 1).unwrap();
        match validate_access_token(&token, "another_secret_key_for_jwt_testing") {
            Err(AppError::Unauthorized { message }) => assert!(message.contains("signature")),
            other => panic!("Expected Unauthorized error, got {:?}", other),
        }
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        assert!(matches!(
            validate_access_token("invalid.token.format", TEST_SECRET),
            Err(AppError::Unauthorized { .. })
        ));
    }

    #[test]
    fn test_expired_token() {
        // Well past the default 60s leeway.
        let token = generate_access_token(1, TEST_SECRET, -1).unwrap();
        match validate_access_token(&token, TEST_SECRET) {
            Err(AppError::Unauthorized { message }) => assert!(message.contains("expired")),
            other => panic!("Expected Unauthorized error, got {:?}", other),
        }
    }

    #[test]
    fn test_non_numeric_subject() {
        let claims = Claims {
            sub: "alice".to_string(),
            iat: 0,
            exp: 0,
        };
        assert!(matches!(claims.user_id(), Err(AppError::Unauthorized { .. })));
    }
}
