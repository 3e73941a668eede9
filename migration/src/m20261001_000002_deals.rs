//! 优惠（deals）表
//!
//! 过期判定基于 expiry_date，不做物理删除；归档任务只写 archived_at。

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Deals::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Deals::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Deals::PromoterId).string_len(36).not_null())
                    .col(ColumnDef::new(Deals::Title).string_len(200).not_null())
                    .col(ColumnDef::new(Deals::Description).text().null())
                    .col(ColumnDef::new(Deals::Category).string_len(64).not_null())
                    .col(ColumnDef::new(Deals::CurrentPrice).double().not_null())
                    .col(ColumnDef::new(Deals::RetailPrice).double().not_null())
                    .col(
                        ColumnDef::new(Deals::DiscountPercentage)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Deals::ExpiryDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Deals::AffiliateLink).text().not_null())
                    .col(ColumnDef::new(Deals::ImageUrl).text().null())
                    .col(
                        ColumnDef::new(Deals::ArchivedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Deals::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Deals::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 列表页：按过期时间拆分 + 按创建时间排序
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_deals_expiry_created")
                    .table(Deals::Table)
                    .col(Deals::ExpiryDate)
                    .col(Deals::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_deals_category")
                    .table(Deals::Table)
                    .col(Deals::Category)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_deals_promoter")
                    .table(Deals::Table)
                    .col(Deals::PromoterId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_deals_promoter").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_deals_category").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_deals_expiry_created").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Deals::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Deals {
    #[sea_orm(iden = "deals")]
    Table,
    Id,
    PromoterId,
    Title,
    Description,
    Category,
    CurrentPrice,
    RetailPrice,
    DiscountPercentage,
    ExpiryDate,
    AffiliateLink,
    ImageUrl,
    ArchivedAt,
    CreatedAt,
    UpdatedAt,
}
