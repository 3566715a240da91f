use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::auth::JwtService;
use crate::core::Config;
use crate::db::DbService;
use crate::db::repository::UserRepository;
use crate::realtime::{ChatRelay, ConnectionRegistry};
use crate::utils::AppError;

/// 服务器状态 - 持有所有服务的共享引用
///
/// 使用 Arc 实现浅拷贝，每个请求处理器克隆一份。
///
/// | 字段 | 说明 |
/// |------|------|
/// | config | 配置项 (不可变) |
/// | db | 嵌入式数据库 (SurrealDB) |
/// | jwt_service | JWT 认证服务 |
/// | registry | 实时连接注册表 |
/// | relay | 聊天中继服务 |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub db: Surreal<Db>,
    pub jwt_service: Arc<JwtService>,
    pub registry: Arc<ConnectionRegistry>,
    pub relay: Arc<ChatRelay>,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 1. 确保工作目录存在
    /// 2. 打开数据库 (work_dir/database)
    /// 3. 构建 JWT / 注册表 / 中继服务
    /// 4. 补种默认管理员账户
    pub async fn initialize(config: &Config) -> Result<Self, AppError> {
        let work_dir = PathBuf::from(&config.work_dir);
        std::fs::create_dir_all(work_dir.join("database"))
            .map_err(|e| AppError::internal(format!("Failed to create work dir: {}", e)))?;

        let db_path = work_dir.join("database");
        let db_service = DbService::new(&db_path.to_string_lossy()).await?;

        Self::with_db(config, db_service.db).await
    }

    /// 在内存引擎上初始化 (测试专用)
    pub async fn initialize_in_memory(config: &Config) -> Result<Self, AppError> {
        let db_service = DbService::memory().await?;
        Self::with_db(config, db_service.db).await
    }

    async fn with_db(config: &Config, db: Surreal<Db>) -> Result<Self, AppError> {
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        let registry = Arc::new(ConnectionRegistry::new());
        let relay = Arc::new(ChatRelay::new(
            db.clone(),
            registry.clone(),
            Duration::from_millis(config.store_timeout_ms),
        ));

        let state = Self {
            config: config.clone(),
            db,
            jwt_service,
            registry,
            relay,
        };

        state.seed_admin().await?;

        Ok(state)
    }

    /// 获取数据库实例
    pub fn get_db(&self) -> Surreal<Db> {
        self.db.clone()
    }

    /// 获取 JWT 服务
    pub fn get_jwt_service(&self) -> Arc<JwtService> {
        self.jwt_service.clone()
    }

    /// 补种默认管理员
    ///
    /// 如果 ADMIN_USERNAME 指定的账户不存在则创建，已存在则跳过。
    async fn seed_admin(&self) -> Result<(), AppError> {
        let username = std::env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".into());
        let password = std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".into());

        let repo = UserRepository::new(self.db.clone());
        let existing = repo
            .find_by_username(&username)
            .await
            .map_err(|e| AppError::database(e.to_string()))?;

        if existing.is_none() {
            repo.create_admin(&username, &password, "Admin User")
                .await
                .map_err(|e| AppError::database(e.to_string()))?;
            tracing::info!(username = %username, "Admin user created");
        }

        Ok(())
    }
}
