//! 浏览去重锚点表
//!
//! 每个 (deal_id, viewer_key) 仅一行，记录最近一次被计入统计的浏览时间。
//! 去重窗口判断通过 ON CONFLICT ... DO UPDATE ... WHERE 原子完成，
//! 避免"先查再插"的竞态。

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DealViewMarks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DealViewMarks::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DealViewMarks::DealId).big_integer().not_null())
                    .col(ColumnDef::new(DealViewMarks::ViewerKey).string_len(80).not_null())
                    .col(
                        ColumnDef::new(DealViewMarks::LastViewedAt)
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
                    .name("uq_deal_view_marks_deal_viewer")
                    .table(DealViewMarks::Table)
                    .col(DealViewMarks::DealId)
                    .col(DealViewMarks::ViewerKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("uq_deal_view_marks_deal_viewer")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(DealViewMarks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum DealViewMarks {
    #[sea_orm(iden = "deal_view_marks")]
    Table,
    Id,
    DealId,
    ViewerKey,
    LastViewedAt,
}
