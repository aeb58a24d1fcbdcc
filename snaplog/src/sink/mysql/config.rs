use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct MySqlSinkConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub db: String,
}

impl MySqlSinkConfig {
    pub fn new(host: String, port: u16, user: String, password: String, db: String) -> Self {
        MySqlSinkConfig {
            host,
            port,
            user,
            password,
            db,
        }
    }

    pub fn url(&self) -> String {
        format!(
            "mysql://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.db
        )
    }
}
