use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

/// The single promo code currently applied to a user's checkout.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "promo_sessions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: Uuid,
    pub code: String,
    #[sea_orm(column_type = "Decimal(Some((5, 4)))")]
    pub discount: Decimal,
    pub applied_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
