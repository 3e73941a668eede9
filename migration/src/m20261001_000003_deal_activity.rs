//! 优惠互动相关表
//!
//! 创建：
//! - deal_interactions: 有用/没用投票 + 已使用标记，(deal_id, user_id) 唯一
//! - deal_comments: 评论
//! - deal_shares: 分享记录
//! - deal_saves: 收藏，(deal_id, user_id) 唯一
//! - deal_analytics: view / click / share / save 事件日志

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // deal_interactions
        manager
            .create_table(
                Table::create()
                    .table(DealInteractions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DealInteractions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DealInteractions::DealId).big_integer().not_null())
                    .col(ColumnDef::new(DealInteractions::UserId).string_len(36).not_null())
                    .col(ColumnDef::new(DealInteractions::IsHelpful).boolean().null())
                    .col(
                        ColumnDef::new(DealInteractions::IsUsed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(DealInteractions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DealInteractions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_deal_interactions_deal_user")
                    .table(DealInteractions::Table)
                    .col(DealInteractions::DealId)
                    .col(DealInteractions::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // deal_comments
        manager
            .create_table(
                Table::create()
                    .table(DealComments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DealComments::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DealComments::DealId).big_integer().not_null())
                    .col(ColumnDef::new(DealComments::UserId).string_len(36).not_null())
                    .col(ColumnDef::new(DealComments::Content).text().not_null())
                    .col(
                        ColumnDef::new(DealComments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_deal_comments_deal_time")
                    .table(DealComments::Table)
                    .col(DealComments::DealId)
                    .col(DealComments::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // deal_shares
        manager
            .create_table(
                Table::create()
                    .table(DealShares::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DealShares::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DealShares::DealId).big_integer().not_null())
                    .col(ColumnDef::new(DealShares::UserId).string_len(36).null())
                    .col(ColumnDef::new(DealShares::Platform).string_len(32).not_null())
                    .col(
                        ColumnDef::new(DealShares::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_deal_shares_deal")
                    .table(DealShares::Table)
                    .col(DealShares::DealId)
                    .to_owned(),
            )
            .await?;

        // deal_saves
        manager
            .create_table(
                Table::create()
                    .table(DealSaves::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DealSaves::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DealSaves::DealId).big_integer().not_null())
                    .col(ColumnDef::new(DealSaves::UserId).string_len(36).not_null())
                    .col(
                        ColumnDef::new(DealSaves::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_deal_saves_deal_user")
                    .table(DealSaves::Table)
                    .col(DealSaves::DealId)
                    .col(DealSaves::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // deal_analytics
        manager
            .create_table(
                Table::create()
                    .table(DealAnalytics::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DealAnalytics::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DealAnalytics::DealId).big_integer().not_null())
                    .col(ColumnDef::new(DealAnalytics::EventType).string_len(16).not_null())
                    .col(ColumnDef::new(DealAnalytics::UserId).string_len(36).null())
                    .col(ColumnDef::new(DealAnalytics::SessionId).string_len(64).null())
                    .col(ColumnDef::new(DealAnalytics::UserAgent).text().null())
                    .col(
                        ColumnDef::new(DealAnalytics::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 复合索引（用于单 deal 按事件类型 + 时间范围统计）
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_deal_analytics_deal_event_time")
                    .table(DealAnalytics::Table)
                    .col(DealAnalytics::DealId)
                    .col(DealAnalytics::EventType)
                    .col(DealAnalytics::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_deal_analytics_deal_event_time")
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(DealAnalytics::Table).to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("uq_deal_saves_deal_user").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DealSaves::Table).to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_deal_shares_deal").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DealShares::Table).to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_deal_comments_deal_time").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DealComments::Table).to_owned())
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("uq_deal_interactions_deal_user")
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(DealInteractions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum DealInteractions {
    #[sea_orm(iden = "deal_interactions")]
    Table,
    Id,
    DealId,
    UserId,
    IsHelpful,
    IsUsed,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum DealComments {
    #[sea_orm(iden = "deal_comments")]
    Table,
    Id,
    DealId,
    UserId,
    Content,
    CreatedAt,
}

#[derive(DeriveIden)]
enum DealShares {
    #[sea_orm(iden = "deal_shares")]
    Table,
    Id,
    DealId,
    UserId,
    Platform,
    CreatedAt,
}

#[derive(DeriveIden)]
enum DealSaves {
    #[sea_orm(iden = "deal_saves")]
    Table,
    Id,
    DealId,
    UserId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum DealAnalytics {
    #[sea_orm(iden = "deal_analytics")]
    Table,
    Id,
    DealId,
    EventType,
    UserId,
    SessionId,
    UserAgent,
    CreatedAt,
}
