use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct WishlistRequest {
    /// Product id.
    pub item_id: Uuid,
}
