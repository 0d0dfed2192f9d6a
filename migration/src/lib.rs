pub use sea_orm_migration::prelude::*;

mod iden;
mod m20250901_000001_create_rsvps_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20250901_000001_create_rsvps_table::Migration)]
    }
}
