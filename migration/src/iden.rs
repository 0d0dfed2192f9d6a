use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
pub enum Rsvps {
    Table,
    Id,
    GuestName,
    MobileNumber,
    EmailId,
    CountAdults,
    CountKids,
    SubmittedAt,
}
