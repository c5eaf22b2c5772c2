use {
    axum_login::AuthUser,
    derivative::Derivative,
    serde::{Deserialize, Serialize},
    sqlx::{FromRow, SqlitePool},
    strum::Display,
    time::OffsetDateTime,
};

use super::Identifiable;

#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, sqlx::Type,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// A user known to the service, keyed by the email the provider reported.
#[derive(Clone, Serialize, Deserialize, FromRow, Derivative)]
#[derivative(Debug)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub email: String,
    pub name: String,
    pub role: Role,
    #[serde(skip)]
    #[derivative(Debug = "ignore")]
    pub access_token: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl User {
    /// Registers a first-time user or refreshes a returning one. The stored
    /// role is reset to `role` on every login, so changes to the admin list
    /// take effect at the next sign-in. Creation time never changes.
    pub async fn upsert(
        db: &SqlitePool,
        email: &str,
        name: &str,
        role: Role,
        access_token: &str,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as(
            r#"
            insert into users (email, name, role, access_token, created_at)
            values (?, ?, ?, ?, ?)
            on conflict(email) do update
            set name = excluded.name,
                role = excluded.role,
                access_token = excluded.access_token
            returning *
            "#,
        )
        .bind(email)
        .bind(name)
        .bind(role)
        .bind(access_token)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(db)
        .await
    }

    pub async fn find_by_email(db: &SqlitePool, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as("select * from users where email = ?")
            .bind(email)
            .fetch_optional(db)
            .await
    }
}

impl AuthUser for User {
    type Id = String;

    fn id(&self) -> Self::Id {
        Identifiable::id(self)
    }

    // Logging in again with a new token invalidates older sessions.
    fn session_auth_hash(&self) -> &[u8] {
        self.access_token.as_bytes()
    }
}

impl Identifiable<String> for User {
    fn id(&self) -> String {
        self.email.clone()
    }
}

#[cfg(test)]
mod tests {
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;

    async fn db() -> SqlitePool {
        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!().run(&db).await.unwrap();
        db
    }

    #[tokio::test]
    async fn new_user_gets_requested_role() {
        let db = db().await;
        let user = User::upsert(&db, "ada@example.com", "Ada", Role::User, "token-1")
            .await
            .unwrap();

        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.role, Role::User);
        assert_eq!(AuthUser::id(&user), "ada@example.com");
    }

    #[tokio::test]
    async fn returning_user_is_promoted_and_refreshed() {
        let db = db().await;
        let first = User::upsert(&db, "ada@example.com", "Ada", Role::User, "token-1")
            .await
            .unwrap();

        let second = User::upsert(&db, "ada@example.com", "Ada Lovelace", Role::Admin, "token-2")
            .await
            .unwrap();

        assert_eq!(second.role, Role::Admin);
        assert_eq!(second.name, "Ada Lovelace");
        assert_eq!(second.access_token, "token-2");
        assert_eq!(second.created_at, first.created_at);
        assert_ne!(first.session_auth_hash(), second.session_auth_hash());
    }

    #[tokio::test]
    async fn returning_admin_is_demoted() {
        let db = db().await;
        User::upsert(&db, "ada@example.com", "Ada", Role::Admin, "token-1")
            .await
            .unwrap();

        User::upsert(&db, "ada@example.com", "Ada", Role::User, "token-2")
            .await
            .unwrap();

        let stored = User::find_by_email(&db, "ada@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.role, Role::User);
    }

    #[tokio::test]
    async fn find_by_email_misses_unknown_user() {
        let db = db().await;
        assert!(User::find_by_email(&db, "nobody@example.com")
            .await
            .unwrap()
            .is_none());
    }

    #[test]
    fn json_hides_access_token() {
        let user = User {
            email: "ada@example.com".into(),
            name: "Ada".into(),
            role: Role::Admin,
            access_token: "secret-token".into(),
            created_at: OffsetDateTime::UNIX_EPOCH,
        };

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["role"], "ADMIN");
        assert_eq!(json["createdAt"], "1970-01-01T00:00:00Z");
        assert!(json.get("accessToken").is_none());
        assert!(!format!("{:?}", user).contains("secret-token"));
    }
}
