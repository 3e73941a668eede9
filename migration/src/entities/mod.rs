pub mod deal;
pub mod deal_analytics;
pub mod deal_comment;
pub mod deal_interaction;
pub mod deal_save;
pub mod deal_share;
pub mod deal_view_mark;
pub mod follow;
pub mod user_profile;

pub use deal::Entity as DealEntity;
pub use deal_analytics::Entity as DealAnalyticsEntity;
pub use deal_comment::Entity as DealCommentEntity;
pub use deal_interaction::Entity as DealInteractionEntity;
pub use deal_save::Entity as DealSaveEntity;
pub use deal_share::Entity as DealShareEntity;
pub use deal_view_mark::Entity as DealViewMarkEntity;
pub use follow::Entity as FollowEntity;
pub use user_profile::Entity as UserProfileEntity;
