use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct PostgresSourceConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub db: String,
    pub password: String,
}

impl PostgresSourceConfig {
    pub fn new(host: String, port: u16, user: String, db: String, password: String) -> Self {
        PostgresSourceConfig {
            host,
            port,
            user,
            db,
            password,
        }
    }

    pub fn endpoint(&self) -> String {
        format!(
            "host={} port={} user={} dbname={} password={}",
            self.host, self.port, self.user, self.db, self.password
        )
    }
}
