use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, QueryOrder, Set};
use tracing::debug;
use uuid::Uuid;

use crate::entities::{prelude::Rsvp as RsvpEntity, rsvp};

pub mod export;
pub mod summary;

/// One guest group's submitted attendance response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rsvp {
    pub id: Uuid,
    pub guest_name: String,
    pub mobile_number: String,
    pub email_id: Option<String>,
    /// Adults and children aged 7 or older.
    pub count_adults: u32,
    /// Children under 7.
    pub count_kids: u32,
    pub submitted_at: DateTime<Utc>,
}

impl Rsvp {
    pub fn total_guests(&self) -> u64 {
        u64::from(self.count_adults) + u64::from(self.count_kids)
    }
}

/// A validated submission that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRsvp {
    pub guest_name: String,
    pub mobile_number: String,
    pub email_id: Option<String>,
    pub count_adults: u32,
    pub count_kids: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum RsvpError {
    #[error(transparent)]
    Db(#[from] DbErr),

    #[error("rsvp {id} has a negative {field} ({value})")]
    NegativeCount {
        id: Uuid,
        field: &'static str,
        value: i32,
    },

    #[error("{field} does not fit in the store ({value})")]
    CountOverflow { field: &'static str, value: u32 },
}

impl TryFrom<rsvp::Model> for Rsvp {
    type Error = RsvpError;

    fn try_from(model: rsvp::Model) -> Result<Self, Self::Error> {
        let id = model.id;
        let non_negative = |field: &'static str, value: i32| {
            u32::try_from(value).map_err(|_| RsvpError::NegativeCount { id, field, value })
        };

        Ok(Rsvp {
            id,
            count_adults: non_negative("count_adults", model.count_adults)?,
            count_kids: non_negative("count_kids", model.count_kids)?,
            guest_name: model.guest_name,
            mobile_number: model.mobile_number,
            email_id: model.email_id,
            submitted_at: model.submitted_at.with_timezone(&Utc),
        })
    }
}

/// Fetch every RSVP, newest submission first.
pub async fn get_rsvps(db: &DatabaseConnection) -> Result<Vec<Rsvp>, RsvpError> {
    let rows = RsvpEntity::find()
        .order_by_desc(rsvp::Column::SubmittedAt)
        .all(db)
        .await?;
    debug!("Loaded {} rsvps", rows.len());

    rows.into_iter().map(Rsvp::try_from).collect()
}

pub async fn create_rsvp(db: &DatabaseConnection, new: NewRsvp) -> Result<Rsvp, RsvpError> {
    let to_column = |field: &'static str, value: u32| {
        i32::try_from(value).map_err(|_| RsvpError::CountOverflow { field, value })
    };

    let model = rsvp::ActiveModel {
        id: Set(Uuid::new_v4()),
        count_adults: Set(to_column("count_adults", new.count_adults)?),
        count_kids: Set(to_column("count_kids", new.count_kids)?),
        guest_name: Set(new.guest_name),
        mobile_number: Set(new.mobile_number),
        email_id: Set(new.email_id),
        submitted_at: Set(Utc::now().into()),
    };
    debug!("Creating new rsvp: {:?}", model);
    let stored = model.insert(db).await?;

    Rsvp::try_from(stored)
}
