//! Deal entity: a promoter-authored discount listing

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "deals")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub promoter_id: String,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub category: String,
    pub current_price: f64,
    pub retail_price: f64,
    pub discount_percentage: i32,
    pub expiry_date: DateTimeUtc,
    #[sea_orm(column_type = "Text")]
    pub affiliate_link: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub image_url: Option<String>,
    /// Set by the archive job once the deal is past its expiry date
    pub archived_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
