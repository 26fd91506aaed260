use anyhow::Context;
use tracing::info;

use crate::{
    db::Database,
    models::{User, UserParams},
};

const SAMPLE_USERS: &[(&str, &str, &str)] = &[
    ("Admin", "admin@example.com", "password"),
    ("Demo User", "demo@example.com", "password"),
];

/// Inserts the sample users that are not present yet. Returns how many were added.
pub async fn seed(db: &Database) -> anyhow::Result<usize> {
    let mut inserted = 0;
    for &(name, email, password) in SAMPLE_USERS {
        if db.find_by::<User>("email", email).await?.is_some() {
            continue;
        }
        let user = User::from_params(UserParams {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        })?;
        db.create(&user)
            .await
            .with_context(|| format!("seed user {email}"))?;
        inserted += 1;
    }
    info!(inserted, "database seeded");
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use std::path::Path;

    #[tokio::test]
    async fn seeding_twice_is_idempotent() {
        let cfg = DatabaseConfig {
            database: ":memory:".into(),
            ..DatabaseConfig::default()
        };
        let db = Database::connect(&cfg, Path::new(".")).await.unwrap();
        db.migrate().await.unwrap();

        assert_eq!(seed(&db).await.unwrap(), SAMPLE_USERS.len());
        assert_eq!(seed(&db).await.unwrap(), 0);

        let admin: User = db.find_by("email", "admin@example.com").await.unwrap().unwrap();
        assert!(admin.check_password("password"));
    }
}
