//! 认证服务：注册、登录、令牌校验、资料查询

use crate::{
    auth::jwt::{Claims, JwtService},
    auth::password::PasswordHasher,
    error::AppError,
    models::auth::{LoginRequest, LoginResponse},
    models::user::{ProfileResponse, RegisterRequest, User, UserResponse},
    repository::user_repo::UserRepository,
};
use rand::{distributions::Alphanumeric, Rng};
use sqlx::PgPool;
use std::sync::Arc;
use validator::Validate;

pub struct AuthService {
    db: PgPool,
    jwt_service: Arc<JwtService>,
    hasher: Arc<PasswordHasher>,
    /// 随机口令的哈希，用于未知用户登录路径的时间对齐
    dummy_hash: String,
}

impl AuthService {
    pub fn new(
        db: PgPool,
        jwt_service: Arc<JwtService>,
        hasher: Arc<PasswordHasher>,
    ) -> Result<Self, AppError> {
        let dummy_password: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();
        let dummy_hash = hasher.hash(&dummy_password)?;

        Ok(Self {
            db,
            jwt_service,
            hasher,
            dummy_hash,
        })
    }

    /// 用户注册
    pub async fn register(&self, req: RegisterRequest) -> Result<UserResponse, AppError> {
        // 校验必填字段
        req.validate()?;

        let user_repo = UserRepository::new(self.db.clone());

        // 预检用户名是否占用；并发竞争仍由 UNIQUE 约束兜底
        if user_repo.find_by_username(&req.username).await?.is_some() {
            return Err(AppError::Conflict);
        }

        // 哈希密码（阻塞线程池）
        let password_hash = self.hash_password(req.password).await?;

        // 插入用户
        let user = user_repo.insert(&req.username, &password_hash, &req.role).await?;

        metrics::counter!("auth.register.success").increment(1);
        tracing::info!(user_id = user.id, username = %user.username, "User registered");

        Ok(UserResponse::from(user))
    }

    /// 用户登录
    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse, AppError> {
        let user_repo = UserRepository::new(self.db.clone());

        // 获取用户
        let user: User = match user_repo.find_by_username(&req.username).await? {
            Some(user) => user,
            None => {
                // 未知用户也执行一次验证，使响应时间与密码错误路径一致
                let _ = self.verify_password(req.password, self.dummy_hash.clone()).await;
                metrics::counter!("auth.login.failure").increment(1);
                return Err(AppError::NotFound);
            }
        };

        // 验证密码（阻塞线程池）
        if let Err(e) = self.verify_password(req.password, user.password_hash.clone()).await {
            metrics::counter!("auth.login.failure").increment(1);
            return Err(e);
        }

        // 生成令牌
        let token = self.jwt_service.generate_token(&user)?;

        metrics::counter!("auth.login.success").increment(1);
        tracing::info!(user_id = user.id, username = %user.username, "User logged in");

        Ok(LoginResponse {
            token,
            expires_in: self.jwt_service.token_exp_secs(),
            user: UserResponse::from(user),
        })
    }

    /// 校验令牌，返回其声明
    pub fn verify_token(&self, token: &str) -> Result<Claims, AppError> {
        self.jwt_service.validate_token(token)
    }

    /// 查询当前用户资料
    pub async fn get_profile(&self, user_id: i64) -> Result<ProfileResponse, AppError> {
        let user_repo = UserRepository::new(self.db.clone());

        user_repo
            .find_by_id(user_id)
            .await?
            .map(ProfileResponse::from)
            .ok_or(AppError::NotFound)
    }

    /// 在阻塞线程池上执行密码哈希
    async fn hash_password(&self, password: String) -> Result<String, AppError> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AppError::Internal(format!("Hash task failed: {}", e)))?
    }

    /// 在阻塞线程池上执行密码验证
    async fn verify_password(&self, password: String, hash: String) -> Result<(), AppError> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| AppError::Internal(format!("Verify task failed: {}", e)))?
    }
}
