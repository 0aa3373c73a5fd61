//! Account entity linking a user to an OAuth provider identity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "account")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub user_id: String,

    /// Provider name, e.g. "google"
    pub provider: String,

    /// Subject identifier issued by the provider
    pub provider_account_id: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub access_token: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub refresh_token: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub id_token: Option<String>,

    #[sea_orm(nullable)]
    pub token_type: Option<String>,

    #[sea_orm(nullable)]
    pub scope: Option<String>,

    /// Access token expiry
    #[sea_orm(nullable)]
    pub expires_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
