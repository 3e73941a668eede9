use crate::api::jwt::get_jwt_service;
use crate::services::{
    AnalyticsService, ArchiveTask, AuthService, BulkUploadService, DealService, MediaStore,
    ProfileService, SocialService,
};
use crate::storage::{SeaOrmStorage, StorageFactory};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

/// 服务器运行所需的共享组件
pub struct StartupContext {
    pub storage: Arc<SeaOrmStorage>,
    pub auth_service: Arc<AuthService>,
    pub profile_service: Arc<ProfileService>,
    pub deal_service: Arc<DealService>,
    pub analytics_service: Arc<AnalyticsService>,
    pub social_service: Arc<SocialService>,
    pub bulk_upload_service: Arc<BulkUploadService>,
    pub media_store: Arc<MediaStore>,
    pub archive_task: Arc<ArchiveTask>,
}

/// 安装 rustls 的 ring provider；重复安装不是错误
pub fn install_crypto_provider() {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }
}

/// 连接存储（含迁移）
pub async fn prepare_storage() -> Result<Arc<SeaOrmStorage>> {
    install_crypto_provider();

    let storage = StorageFactory::create()
        .await
        .context("Failed to create storage backend")?;
    info!("Using storage backend: {}", storage.backend_name());
    Ok(storage)
}

/// 在已有存储上组装所有 service
pub fn build_services(storage: Arc<SeaOrmStorage>) -> StartupContext {
    let analytics_service = Arc::new(AnalyticsService::new(storage.clone()));

    StartupContext {
        auth_service: Arc::new(AuthService::new(storage.clone())),
        profile_service: Arc::new(ProfileService::new(storage.clone())),
        deal_service: Arc::new(DealService::new(storage.clone())),
        social_service: Arc::new(SocialService::new(
            storage.clone(),
            analytics_service.clone(),
        )),
        bulk_upload_service: Arc::new(BulkUploadService::new(storage.clone())),
        media_store: Arc::new(MediaStore::from_config()),
        archive_task: Arc::new(ArchiveTask::new(storage.clone())),
        analytics_service,
        storage,
    }
}

/// 准备服务器启动的上下文
pub async fn prepare_server_startup() -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let storage = prepare_storage().await?;

    // 提前初始化 JWT 服务，未配置密钥时在启动日志里给出警告
    get_jwt_service();

    let media_dir = &crate::config::get_config().media.dir;
    tokio::fs::create_dir_all(media_dir)
        .await
        .with_context(|| format!("Failed to create media directory '{}'", media_dir))?;

    let context = build_services(storage);

    info!(
        "Pre-startup processing completed in {} ms",
        start_time.elapsed().as_millis()
    );
    Ok(context)
}
