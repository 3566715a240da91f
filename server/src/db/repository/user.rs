//! User Repository

use super::{BaseRepository, RepoError, RepoResult, parse_id};
use crate::auth::password::hash_password;
use crate::db::models::{User, UserCreate};
use shared::models::Role;
use shared::util::now_millis;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

#[derive(Clone)]
pub struct UserRepository {
    base: BaseRepository,
}

impl UserRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find user by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<User>> {
        let thing = parse_id(id)?;
        let user: Option<User> = self.base.db().select(thing).await?;
        Ok(user)
    }

    /// Find user by username
    pub async fn find_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let username_owned = username.to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM user WHERE username = $username LIMIT 1")
            .bind(("username", username_owned))
            .await?;
        let users: Vec<User> = result.take(0)?;
        Ok(users.into_iter().next())
    }

    /// Create a new user
    pub async fn create(&self, data: UserCreate) -> RepoResult<User> {
        // Check duplicate username
        if self.find_by_username(&data.username).await?.is_some() {
            return Err(RepoError::Duplicate(format!(
                "Username '{}' already exists",
                data.username
            )));
        }

        let hash_pass = hash_password(&data.password)
            .map_err(|e| RepoError::Database(format!("Failed to hash password: {}", e)))?;

        let user = User {
            id: None,
            username: data.username,
            hash_pass,
            full_name: data.full_name,
            role: data.role,
            is_active: true,
            created_at: now_millis(),
        };

        let created: Option<User> = self.base.db().create("user").content(user).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create user".to_string()))
    }

    /// Create an admin account (used by startup seeding)
    pub async fn create_admin(
        &self,
        username: &str,
        password: &str,
        full_name: &str,
    ) -> RepoResult<User> {
        self.create(UserCreate {
            username: username.to_string(),
            password: password.to_string(),
            full_name: full_name.to_string(),
            role: Role::Admin,
        })
        .await
    }
}
