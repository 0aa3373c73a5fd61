//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Display name reported by the identity provider
    #[sea_orm(nullable)]
    pub name: Option<String>,

    #[sea_orm(unique, nullable)]
    pub email: Option<String>,

    /// Set when the provider reports the email as verified
    #[sea_orm(nullable)]
    pub email_verified: Option<DateTimeWithTimeZone>,

    /// Avatar URL
    #[sea_orm(nullable)]
    pub image: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::poll::Entity")]
    Polls,

    #[sea_orm(has_many = "super::account::Entity")]
    Accounts,

    #[sea_orm(has_many = "super::session::Entity")]
    Sessions,
}

impl Related<super::poll::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Polls.def()
    }
}

impl Related<super::account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl Related<super::session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sessions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
