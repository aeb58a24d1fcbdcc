use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct PostgresSinkConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub db: String,
    pub password: String,
}

impl PostgresSinkConfig {
    pub fn new(host: String, port: u16, user: String, db: String, password: String) -> Self {
        PostgresSinkConfig {
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
