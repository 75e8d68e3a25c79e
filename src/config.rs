use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub auto_migrate: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let auto_migrate = env::var("APP_AUTO_MIGRATE")
            .ok()
            .map(|v| enabled(&v))
            .unwrap_or(true);
        Ok(Self {
            port,
            database_url,
            host,
            auto_migrate,
        })
    }
}

fn enabled(value: &str) -> bool {
    !matches!(
        value.trim().to_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}

#[cfg(test)]
mod tests {
    use super::enabled;

    #[test]
    fn switch_values() {
        assert!(enabled("true"));
        assert!(enabled("1"));
        assert!(enabled(""));
        assert!(!enabled("OFF"));
        assert!(!enabled(" false "));
        assert!(!enabled("0"));
    }
}
