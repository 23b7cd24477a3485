//! JWT 服务单元测试
//!
//! 测试令牌生成、验证与过期/无效的区分

use auth_system::auth::jwt::{Claims, JwtService};
use auth_system::config::{AppConfig, DatabaseConfig, LoggingConfig, SecurityConfig, ServerConfig};
use auth_system::error::AppError;
use auth_system::models::user::User;
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use secrecy::{ExposeSecret, Secret};

/// 创建测试配置
fn create_test_config() -> AppConfig {
    create_test_config_with_secret("test_secret_key_32_characters_long!")
}

fn create_test_config_with_secret(secret: &str) -> AppConfig {
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
            token_exp_secs: 300,
            argon2_m_cost_kib: 1024,
            argon2_t_cost: 1,
            argon2_p_cost: 1,
        },
    }
}

fn test_user(username: &str, role: &str) -> User {
    User {
        id: 42,
        username: username.to_string(),
        password_hash: "unused".to_string(),
        role: role.to_string(),
        created_at: Utc::now(),
    }
}

#[test]
fn test_jwt_service_creation() {
    let config = create_test_config();
    assert!(JwtService::from_config(&config).is_ok());
}

#[test]
fn test_jwt_service_secret_too_short() {
    let config = create_test_config_with_secret("short");
    let result = JwtService::from_config(&config);
    assert!(matches!(result, Err(AppError::Config(_))));
}

#[test]
fn test_generate_and_validate_token() {
    let config = create_test_config();
    let service = JwtService::from_config(&config).unwrap();

    let token = service
        .generate_token(&test_user("testuser", "admin"))
        .expect("Token generation should succeed");

    let claims = service
        .validate_token(&token)
        .expect("Token validation should succeed");

    assert_eq!(claims.sub, "42");
    assert_eq!(claims.username, "testuser");
    assert_eq!(claims.role, "admin");
}

#[test]
fn test_token_claims_structure() {
    let config = create_test_config();
    let service = JwtService::from_config(&config).unwrap();

    let token = service
        .generate_token(&test_user("testuser", "user"))
        .expect("Token generation should succeed");

    let claims = service.validate_token(&token).unwrap();

    // 验证 Claims 结构
    assert!(!claims.sub.is_empty());
    assert!(!claims.username.is_empty());
    assert!(!claims.role.is_empty());
    assert!(claims.iat > 0);
    assert!(claims.exp > claims.iat);
}

#[test]
fn test_token_expiration_time() {
    let config = create_test_config();
    let service = JwtService::from_config(&config).unwrap();

    let token = service
        .generate_token(&test_user("testuser", "user"))
        .expect("Token generation should succeed");

    let claims = service.validate_token(&token).unwrap();

    // 有效期取配置值（测试配置为 300 秒）
    assert_eq!(claims.exp - claims.iat, 300);
    assert_eq!(service.token_exp_secs(), 300);
}

#[test]
fn test_invalid_token_fails() {
    let config = create_test_config();
    let service = JwtService::from_config(&config).unwrap();

    for garbage in ["invalid_token", "a.b.c", ""] {
        let result = service.validate_token(garbage);
        assert!(
            matches!(result, Err(AppError::TokenInvalid)),
            "Garbage token {:?} should be invalid",
            garbage
        );
    }
}

#[test]
fn test_wrong_key_rejected() {
    let issuer =
        JwtService::from_config(&create_test_config()).unwrap();
    let verifier = JwtService::from_config(&create_test_config_with_secret(
        "another_secret_key_32_characters!!!!",
    ))
    .unwrap();

    let token = issuer.generate_token(&test_user("testuser", "user")).unwrap();

    // 他人密钥签发的令牌是无效令牌，不是过期令牌
    let result = verifier.validate_token(&token);
    assert!(matches!(result, Err(AppError::TokenInvalid)));
}

#[test]
fn test_expired_token_rejected() {
    let config = create_test_config();
    let service = JwtService::from_config(&config).unwrap();

    // 用同一密钥直接签发已过期的声明
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: "42".to_string(),
        username: "testuser".to_string(),
        role: "user".to_string(),
        iat: now - 600,
        exp: now - 300,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.security.jwt_secret.expose_secret().as_bytes()),
    )
    .unwrap();

    let result = service.validate_token(&token);
    assert!(matches!(result, Err(AppError::TokenExpired)));
}

#[test]
fn test_token_tampering_detection() {
    let config = create_test_config();
    let service = JwtService::from_config(&config).unwrap();

    let mut token = service.generate_token(&test_user("testuser", "user")).unwrap();

    // 篡改 token (修改最后一个字符)
    let last_char = token.chars().last().unwrap();
    let new_char = if last_char == 'a' { 'b' } else { 'a' };
    token.pop();
    token.push(new_char);

    // 篡改后的 token 应该无效
    assert!(
        matches!(service.validate_token(&token), Err(AppError::TokenInvalid)),
        "Tampered token should be invalid"
    );
}

#[test]
fn test_token_with_unicode_username() {
    let config = create_test_config();
    let service = JwtService::from_config(&config).unwrap();

    let username = "用户名🔒";
    let token = service
        .generate_token(&test_user(username, "user"))
        .expect("Token generation should succeed");

    let claims = service.validate_token(&token).unwrap();
    assert_eq!(claims.username, username);
}
