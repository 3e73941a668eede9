//! 用户资料与关注关系表
//!
//! - user_profiles: 账号身份 + 偏好设置（email / username 唯一）
//! - follows: promoter ↔ shopper 关注关系（(promoter_id, follower_id) 唯一）

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserProfiles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserProfiles::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UserProfiles::Email).string().not_null())
                    .col(ColumnDef::new(UserProfiles::Username).string_len(30).not_null())
                    .col(ColumnDef::new(UserProfiles::PasswordHash).string().not_null())
                    .col(
                        ColumnDef::new(UserProfiles::UserType)
                            .string_len(16)
                            .not_null()
                            .default("shopper"),
                    )
                    .col(ColumnDef::new(UserProfiles::DisplayName).string().null())
                    .col(ColumnDef::new(UserProfiles::Bio).text().null())
                    .col(ColumnDef::new(UserProfiles::AvatarUrl).text().null())
                    .col(
                        ColumnDef::new(UserProfiles::PreferredCategories)
                            .text()
                            .not_null()
                            .default("[]"),
                    )
                    .col(
                        ColumnDef::new(UserProfiles::PriceSensitivity)
                            .string_len(16)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(UserProfiles::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserProfiles::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 唯一性由数据库保证，不依赖应用层先查后写
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_user_profiles_email")
                    .table(UserProfiles::Table)
                    .col(UserProfiles::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_user_profiles_username")
                    .table(UserProfiles::Table)
                    .col(UserProfiles::Username)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Follows::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Follows::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Follows::PromoterId).string_len(36).not_null())
                    .col(ColumnDef::new(Follows::FollowerId).string_len(36).not_null())
                    .col(
                        ColumnDef::new(Follows::CreatedAt)
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
                    .name("uq_follows_promoter_follower")
                    .table(Follows::Table)
                    .col(Follows::PromoterId)
                    .col(Follows::FollowerId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 按关注者查询（我关注了谁）
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_follows_follower")
                    .table(Follows::Table)
                    .col(Follows::FollowerId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_follows_follower").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("uq_follows_promoter_follower").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Follows::Table).to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("uq_user_profiles_username").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("uq_user_profiles_email").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserProfiles::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum UserProfiles {
    #[sea_orm(iden = "user_profiles")]
    Table,
    Id,
    Email,
    Username,
    PasswordHash,
    UserType,
    DisplayName,
    Bio,
    AvatarUrl,
    PreferredCategories,
    PriceSensitivity,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Follows {
    #[sea_orm(iden = "follows")]
    Table,
    Id,
    PromoterId,
    FollowerId,
    CreatedAt,
}
