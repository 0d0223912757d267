pub mod test_helpers {
    use crate::config::{AuthConfig, HashingConfig, RefreshCookieConfig};
    use crate::repositories::{SqliteActivationRepository, SqliteUserRepository};
    use crate::services::email_service::{EmailError, EmailSender};
    use crate::services::{AuthService, HashingService};
    use crate::AppState;
    use async_trait::async_trait;
    use once_cell::sync::Lazy;
    use regex::Regex;
    use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
    use std::sync::{Arc, Mutex};
    use tempfile::NamedTempFile;

    pub const TEST_JWT_SECRET: &str = "test-signing-secret-with-enough-bytes-0123456789";

    static CODE_IN_BODY: Lazy<Regex> = Lazy::new(|| Regex::new(r">([A-Z2-9]{8})</span>").unwrap());

    /// Create a new in-memory SQLite database for testing
    pub async fn create_test_db() -> Result<SqlitePool, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await?;

        // Run migrations
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(pool)
    }

    /// Create a temporary file-based SQLite database for testing
    /// Useful when state must survive a second pool against the same file
    pub async fn create_test_db_file() -> Result<(SqlitePool, NamedTempFile), sqlx::Error> {
        let temp_file = NamedTempFile::new().map_err(sqlx::Error::Io)?;
        let pool = connect_test_db_file(&temp_file).await?;

        // Run migrations
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok((pool, temp_file))
    }

    pub async fn connect_test_db_file(temp_file: &NamedTempFile) -> Result<SqlitePool, sqlx::Error> {
        let db_path = temp_file
            .path()
            .to_str()
            .ok_or_else(|| sqlx::Error::Configuration("Invalid database path".into()))?;
        let database_url = format!("sqlite://{}", db_path);

        SqlitePoolOptions::new()
            .max_connections(1)
            .connect(&database_url)
            .await
    }

    /// Cheap Argon2 parameters so tests stay fast; production uses the defaults.
    pub fn test_auth_config() -> AuthConfig {
        let mut config = AuthConfig::new(TEST_JWT_SECRET);
        config.hashing = HashingConfig {
            memory_kib: 256,
            iterations: 1,
            parallelism: 1,
        };
        config
    }

    /// Insert a test user with hashed password
    pub async fn insert_test_user(
        pool: &SqlitePool,
        email: &str,
        fullname: &str,
        password: &str,
    ) -> Result<String, sqlx::Error> {
        let hasher = HashingService::new(&test_auth_config().hashing).map_err(|e| {
            sqlx::Error::Configuration(format!("Hasher setup failed: {}", e).into())
        })?;
        let password_hash = hasher.hash(password).map_err(|e| {
            sqlx::Error::Configuration(format!("Password hashing failed: {}", e).into())
        })?;

        let id = uuid::Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO users (id, email, fullname, password_hash) VALUES (?, ?, ?, ?)")
            .bind(&id)
            .bind(email)
            .bind(fullname)
            .bind(password_hash)
            .execute(pool)
            .await?;

        Ok(id)
    }

    #[derive(Debug, Clone)]
    pub struct SentEmail {
        pub html_body: String,
        pub subject: String,
        pub recipients: Vec<String>,
    }

    /// Email sender that keeps every message in memory instead of delivering it.
    #[derive(Default)]
    pub struct RecordingEmailSender {
        sent: Mutex<Vec<SentEmail>>,
    }

    impl RecordingEmailSender {
        pub fn sent(&self) -> Vec<SentEmail> {
            self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
        }

        /// Activation code from the most recent email sent to `recipient`.
        pub fn last_code_for(&self, recipient: &str) -> Option<String> {
            self.sent()
                .iter()
                .rev()
                .find(|email| email.recipients.iter().any(|r| r == recipient))
                .and_then(|email| extract_activation_code(&email.html_body))
        }
    }

    #[async_trait]
    impl EmailSender for RecordingEmailSender {
        async fn send(
            &self,
            html_body: &str,
            subject: &str,
            recipients: &[String],
        ) -> Result<(), EmailError> {
            let mut sent = self
                .sent
                .lock()
                .map_err(|e| EmailError::SendFailed(e.to_string()))?;
            sent.push(SentEmail {
                html_body: html_body.to_string(),
                subject: subject.to_string(),
                recipients: recipients.to_vec(),
            });
            Ok(())
        }
    }

    pub fn extract_activation_code(html_body: &str) -> Option<String> {
        CODE_IN_BODY
            .captures(html_body)
            .map(|captures| captures[1].to_string())
    }

    /// Wires the real SQLite repositories and the given config into an `AppState`.
    pub fn build_test_state(
        pool: SqlitePool,
        config: &AuthConfig,
        email_sender: Arc<dyn EmailSender>,
    ) -> AppState {
        let auth_service = AuthService::new(
            config,
            Arc::new(SqliteUserRepository::new(pool.clone())),
            Arc::new(SqliteActivationRepository::new(pool)),
            email_sender,
        )
        .unwrap_or_else(|e| panic!("Failed to build auth service: {}", e));

        AppState {
            auth_service: Arc::new(auth_service),
            refresh_cookie: RefreshCookieConfig::from_env(),
        }
    }
}
