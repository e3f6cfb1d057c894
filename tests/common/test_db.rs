//! PostgreSQL server fixture for sandbox integration tests.
//!
//! Each `SandboxServer` starts a fresh PostgreSQL container and seeds a
//! primary database with a `users` table holding two rows and an empty
//! `products` table. The container is removed when the fixture is dropped.

use dbsandbox::SandboxConfig;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::{Connection, Executor};
use testcontainers::runners::AsyncRunner;
use testcontainers::ContainerAsync;
use testcontainers_modules::postgres::Postgres;

pub const PRIMARY_DB: &str = "app";
pub const TEMPLATE_DB: &str = "template_database";
const ADMIN_USER: &str = "postgres";
const ADMIN_PASSWORD: &str = "postgres";
const MAINTENANCE_DB: &str = "postgres";

const SEED_SQL: &str = "
    CREATE TABLE users (
        id SERIAL PRIMARY KEY,
        name VARCHAR(100),
        email VARCHAR(100) UNIQUE
    );
    INSERT INTO users (name, email) VALUES
        ('Alice', 'alice@example.com'),
        ('Bob', 'bob@example.com');
    CREATE TABLE products (
        id SERIAL PRIMARY KEY,
        name VARCHAR(100),
        price DECIMAL(10, 2)
    );
";

/// A seeded PostgreSQL server running in a container.
pub struct SandboxServer {
    pub host: String,
    pub port: u16,
    _container: ContainerAsync<Postgres>,
}

impl SandboxServer {
    /// Start a container and seed the primary database.
    pub async fn start() -> Self {
        let container = Postgres::default()
            .start()
            .await
            .unwrap_or_else(|e| panic!("Failed to start PostgreSQL container: {}", e));

        let host = container
            .get_host()
            .await
            .unwrap_or_else(|e| panic!("Failed to get container host: {}", e))
            .to_string();

        let port = container
            .get_host_port_ipv4(5432)
            .await
            .unwrap_or_else(|e| panic!("Failed to get container port: {}", e));

        let server = Self { host, port, _container: container };
        server.seed_primary().await;
        server
    }

    /// Coordinates for a provider sandboxing the seeded primary database.
    pub fn config(&self) -> SandboxConfig {
        SandboxConfig::new(
            self.host.clone(),
            u32::from(self.port),
            MAINTENANCE_DB,
            ADMIN_USER,
            ADMIN_PASSWORD,
            PRIMARY_DB,
            TEMPLATE_DB,
        )
        .expect("valid sandbox config")
    }

    pub fn database_url(&self, database: &str) -> String {
        format!(
            "postgresql://{}:{}@{}:{}/{}",
            ADMIN_USER, ADMIN_PASSWORD, self.host, self.port, database
        )
    }

    /// Open a connection to `database` as the admin role.
    pub async fn connect(&self, database: &str) -> PgConnection {
        let options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(ADMIN_USER)
            .password(ADMIN_PASSWORD)
            .database(database);
        PgConnection::connect_with(&options)
            .await
            .unwrap_or_else(|e| panic!("Failed to connect to '{}': {}", database, e))
    }

    async fn seed_primary(&self) {
        let mut admin = self.connect(MAINTENANCE_DB).await;
        admin
            .execute(format!("CREATE DATABASE {}", PRIMARY_DB).as_str())
            .await
            .expect("create primary database");
        admin.close().await.ok();

        let mut app = self.connect(PRIMARY_DB).await;
        app.execute(SEED_SQL).await.expect("seed primary database");
        app.close().await.ok();
    }

    /// Create an empty, ordinary database next to the seeded one.
    pub async fn create_database(&self, name: &str) {
        let mut admin = self.connect(MAINTENANCE_DB).await;
        admin
            .execute(format!("CREATE DATABASE {}", name).as_str())
            .await
            .unwrap_or_else(|e| panic!("Failed to create database '{}': {}", name, e));
        admin.close().await.ok();
    }

    pub async fn template_exists(&self, name: &str) -> bool {
        self.catalog_flag(
            "SELECT 1 FROM pg_database WHERE datname = $1 AND datistemplate",
            name,
        )
        .await
    }

    pub async fn database_exists(&self, name: &str) -> bool {
        self.catalog_flag("SELECT 1 FROM pg_database WHERE datname = $1", name).await
    }

    async fn catalog_flag(&self, sql: &str, name: &str) -> bool {
        let mut admin = self.connect(MAINTENANCE_DB).await;
        let found: Option<i32> = sqlx::query_scalar(sql)
            .bind(name)
            .fetch_optional(&mut admin)
            .await
            .expect("catalog query");
        admin.close().await.ok();
        found.is_some()
    }

    pub async fn row_count(&self, database: &str, table: &str) -> i64 {
        let mut conn = self.connect(database).await;
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&mut conn)
            .await
            .unwrap_or_else(|e| panic!("Failed to count rows in {}.{}: {}", database, table, e));
        conn.close().await.ok();
        count
    }

    pub async fn user_emails(&self) -> Vec<String> {
        let mut conn = self.connect(PRIMARY_DB).await;
        let emails = sqlx::query_scalar("SELECT email FROM users ORDER BY email")
            .fetch_all(&mut conn)
            .await
            .expect("select user emails");
        conn.close().await.ok();
        emails
    }

    /// Add a row and drop a table in the primary database.
    pub async fn modify_primary(&self) {
        let mut conn = self.connect(PRIMARY_DB).await;
        conn.execute(
            "INSERT INTO users (name, email) VALUES ('Charlie', 'charlie@example.com');
             DROP TABLE IF EXISTS products;",
        )
        .await
        .expect("modify primary database");
        conn.close().await.ok();
    }

    /// Add two rows to `users` in the primary database.
    pub async fn insert_test_data(&self) {
        let mut conn = self.connect(PRIMARY_DB).await;
        conn.execute(
            "INSERT INTO users (name, email) VALUES ('Test1', 'test1@example.com');
             INSERT INTO users (name, email) VALUES ('Test2', 'test2@example.com');",
        )
        .await
        .expect("insert test data");
        conn.close().await.ok();
    }
}
