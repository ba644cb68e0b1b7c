//! Database maintenance: migrations and seeding

use anyhow::Result;

use crate::database::seed_settings;
use crate::settings::SettingRepository;
use crate::Portfolio;

/// Create the database file if needed and apply migrations
pub fn migrate(site: &Portfolio) -> Result<()> {
    site.open_database()?;
    println!("Migrated: {:?}", site.database_path);
    Ok(())
}

/// Insert any missing default settings, returning how many were created
pub fn seed(site: &Portfolio) -> Result<usize> {
    let repo = SettingRepository::new(site.open_database()?);
    let created = seed_settings(&repo)?;
    println!("Seeded {} setting(s).", created);
    Ok(created)
}
