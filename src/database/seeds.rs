use anyhow::Result;

use crate::settings::SettingRepository;

/// Settings present on every fresh install
pub const DEFAULT_SETTINGS: &[(&str, bool)] = &[
    ("show_contact_section", false),
    ("show_register_screen", false),
];

/// Insert missing default settings; returns how many rows were created
pub fn seed_settings(repo: &SettingRepository) -> Result<usize> {
    let mut created = 0;
    for (key, value) in DEFAULT_SETTINGS {
        let (_, was_created) = repo.first_or_create(key, (*value).into())?;
        if was_created {
            tracing::info!("Seeded setting {} = {}", key, value);
            created += 1;
        }
    }
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use crate::repository::Repository;

    #[test]
    fn test_seed_is_idempotent() {
        let repo = SettingRepository::new(Database::open_in_memory().unwrap());
        assert_eq!(seed_settings(&repo).unwrap(), 2);
        assert_eq!(seed_settings(&repo).unwrap(), 0);

        let all = repo.all().unwrap();
        let keys: Vec<_> = all.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["show_contact_section", "show_register_screen"]);
        assert!(all.iter().all(|s| !s.value.as_bool()));
    }
}
