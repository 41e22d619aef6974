use crate::core::Config;
use crate::db::DbService;
use crate::services::{
    CategoryService, CategorySubscriptions, ServiceSettings, SubscriptionService,
    TagSubscriptions, TagService,
};
use shared::AppResult;

/// 核心状态 - 持有所有服务
///
/// 所有服务共享同一个连接池，克隆成本极低。
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | db | DbService | SQLite 连接池 |
/// | categories | CategoryService | 分类树 |
/// | tags | TagService | 标签 |
/// | subscriptions | SubscriptionService | 订阅档案 |
/// | category_subscriptions | CategorySubscriptions | 分类订阅 |
/// | tag_subscriptions | TagSubscriptions | 标签订阅 |
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub db: DbService,
    pub categories: CategoryService,
    pub tags: TagService,
    pub subscriptions: SubscriptionService,
    pub category_subscriptions: CategorySubscriptions,
    pub tag_subscriptions: TagSubscriptions,
}

impl AppState {
    /// 打开配置指定的数据库并构建所有服务
    pub async fn initialize(config: Config) -> AppResult<Self> {
        let db = DbService::new(&config).await?;
        Ok(Self::with_db(config, db))
    }

    /// 基于已打开的数据库构建 (测试中配合 [`DbService::in_memory`])
    pub fn with_db(config: Config, db: DbService) -> Self {
        let settings = ServiceSettings::from(&config);
        Self {
            categories: CategoryService::new(&db, settings),
            tags: TagService::new(&db, settings),
            subscriptions: SubscriptionService::new(&db),
            category_subscriptions: CategorySubscriptions::new(&db, settings),
            tag_subscriptions: TagSubscriptions::new(&db, settings),
            config,
            db,
        }
    }
}
