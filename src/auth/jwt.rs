//! JWT token generation and validation
//! Stateless HS256 bearer tokens; validity is signature + expiry only

use crate::{config::AppConfig, error::AppError, models::user::User};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID rendered as string)
    pub sub: String,

    /// Username
    pub username: String,

    /// Role
    pub role: String,

    /// Issued at
    pub iat: i64,

    /// Expiration
    pub exp: i64,
}

/// JWT service
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    token_exp_secs: u64,
}

impl JwtService {
    /// Create JWT service from config
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let secret = config.security.jwt_secret.expose_secret();

        // Ensure secret is at least 32 bytes for HS256
        if secret.len() < 32 {
            return Err(AppError::Config("JWT secret too short (min 32 chars)".to_string()));
        }

        let encoding_key = EncodingKey::from_secret(secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(secret.as_bytes());

        // Zero leeway: the expiry instant is exact
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Ok(Self {
            encoding_key,
            decoding_key,
            validation,
            token_exp_secs: config.security.token_exp_secs,
        })
    }

    /// Seconds a freshly issued token stays valid
    pub fn token_exp_secs(&self) -> u64 {
        self.token_exp_secs
    }

    /// Generate a token for a user
    pub fn generate_token(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let expiration = now + Duration::seconds(self.token_exp_secs as i64);

        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            role: user.role.clone(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to encode token: {:?}", e);
            AppError::Internal(format!("Failed to encode token: {}", e))
        })
    }

    /// Validate and decode a token
    ///
    /// An elapsed validity window is distinguishable from every other
    /// failure (tampering, malformed structure, wrong key).
    pub fn validate_token(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("Token validation failed: {:?}", e);
                match e.kind() {
                    ErrorKind::ExpiredSignature => AppError::TokenExpired,
                    _ => AppError::TokenInvalid,
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DatabaseConfig, LoggingConfig, SecurityConfig, ServerConfig};
    use secrecy::Secret;

    fn test_config_with_secret(secret: &str) -> AppConfig {
        AppConfig {
            server: ServerConfig {
                addr: "127.0.0.1:3000".to_string(),
                request_timeout_secs: 15,
                max_body_bytes: 10 * 1024 * 1024,
                graceful_shutdown_timeout_secs: 30,
            },
            database: DatabaseConfig {
                url: Secret::new("postgresql://localhost/test".to_string()),
                max_connections: 10,
                min_connections: 1,
                acquire_timeout_secs: 30,
                idle_timeout_secs: 600,
                max_lifetime_secs: 1800,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "json".to_string(),
            },
            security: SecurityConfig {
                jwt_secret: Secret::new(secret.to_string()),
                token_exp_secs: 3600,
                argon2_m_cost_kib: 65536,
                argon2_t_cost: 3,
                argon2_p_cost: 4,
            },
        }
    }

    fn test_config() -> AppConfig {
        test_config_with_secret("test_secret_key_32_characters_long!")
    }

    fn test_user() -> User {
        User {
            id: 42,
            username: "testuser".to_string(),
            password_hash: "unused".to_string(),
            role: "admin".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_generate_and_validate_token() {
        let service = JwtService::from_config(&test_config()).unwrap();

        let token = service.generate_token(&test_user()).unwrap();

        let claims = service.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.username, "testuser");
        assert_eq!(claims.role, "admin");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_invalid_token_fails() {
        let service = JwtService::from_config(&test_config()).unwrap();

        let err = service.validate_token("invalid_token").unwrap_err();
        assert!(matches!(err, AppError::TokenInvalid));
    }

    #[test]
    fn test_wrong_key_fails_as_invalid() {
        let issuer = JwtService::from_config(&test_config()).unwrap();
        let verifier = JwtService::from_config(&test_config_with_secret(
            "another_secret_key_32_characters!!!!",
        ))
        .unwrap();

        let token = issuer.generate_token(&test_user()).unwrap();

        let err = verifier.validate_token(&token).unwrap_err();
        assert!(matches!(err, AppError::TokenInvalid));
    }

    #[test]
    fn test_expired_token_fails_as_expired() {
        let config = test_config();
        let service = JwtService::from_config(&config).unwrap();

        // Back-dated claims, signed with the same secret
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "42".to_string(),
            username: "testuser".to_string(),
            role: "admin".to_string(),
            iat: now - 200,
            exp: now - 100,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(
                config.security.jwt_secret.expose_secret().as_bytes(),
            ),
        )
        .unwrap();

        let err = service.validate_token(&token).unwrap_err();
        assert!(matches!(err, AppError::TokenExpired));
    }

    #[test]
    fn test_short_secret_rejected() {
        let config = test_config_with_secret("too_short");
        assert!(JwtService::from_config(&config).is_err());
    }
}
