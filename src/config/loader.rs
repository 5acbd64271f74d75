use config::{Config, ConfigError, Environment as ConfigEnvironment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;

/// 環境類型枚舉
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// 從環境變數取得當前環境設定
    pub fn from_env() -> Self {
        match env::var("ANALYZER_ENV")
            .unwrap_or_else(|_| "development".into())
            .to_lowercase()
            .as_str()
        {
            "production" => Environment::Production,
            _ => Environment::Development,
        }
    }

    /// 轉換為配置文件名
    pub fn as_filename(&self) -> &'static str {
        match self {
            Environment::Development => "development.toml",
            Environment::Production => "production.toml",
        }
    }
}

/// 配置加載器，負責根據環境加載適當的配置
pub struct ConfigLoader;

impl ConfigLoader {
    /// 載入指定環境的配置
    pub fn load(env: Environment) -> Result<Config, ConfigError> {
        let config_dir = env::var("CONFIG_DIR").unwrap_or_else(|_| "config".into());
        Self::load_from_dir(&config_dir, env)
    }

    /// 從指定目錄載入配置
    pub fn load_from_dir(config_dir: impl AsRef<Path>, env: Environment) -> Result<Config, ConfigError> {
        let config_path = config_dir.as_ref().join(env.as_filename());

        Config::builder()
            // 加載環境特定配置
            .add_source(File::from(config_path))
            // 從環境變數加載配置（優先級高於文件配置）
            .add_source(
                ConfigEnvironment::with_prefix("ANALYZER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
    }

    /// 載入當前環境的配置
    pub fn load_current() -> Result<Config, ConfigError> {
        Self::load(Environment::from_env())
    }
}

/// 配置獲取輔助特性
pub trait ConfigExt {
    /// 從配置中獲取並反序列化指定部分
    fn get_section<'a, T: Deserialize<'a>>(&'a self, section: &str) -> Result<T, ConfigError>;
}

impl ConfigExt for Config {
    fn get_section<'a, T: Deserialize<'a>>(&'a self, section: &str) -> Result<T, ConfigError> {
        self.get(section)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_environment_from_env() {
        env::remove_var("ANALYZER_ENV");
        assert_eq!(Environment::from_env(), Environment::Development);

        env::set_var("ANALYZER_ENV", "PRODUCTION");
        assert_eq!(Environment::from_env(), Environment::Production);

        env::set_var("ANALYZER_ENV", "staging");
        assert_eq!(Environment::from_env(), Environment::Development);

        env::remove_var("ANALYZER_ENV");
    }

    #[test]
    fn test_environment_as_filename() {
        assert_eq!(Environment::Development.as_filename(), "development.toml");
        assert_eq!(Environment::Production.as_filename(), "production.toml");
    }

    #[test]
    #[serial]
    fn test_load_from_dir_with_env_override() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("development.toml"),
            "[engine]\nrisk_free_rate = 0.04\nperiods_per_year = 12\n",
        )
        .unwrap();

        env::set_var("ANALYZER__ENGINE__PERIODS_PER_YEAR", "4");
        let config = ConfigLoader::load_from_dir(dir.path(), Environment::Development).unwrap();
        env::remove_var("ANALYZER__ENGINE__PERIODS_PER_YEAR");

        let rate: f64 = config.get_section("engine.risk_free_rate").unwrap();
        let periods: u32 = config.get_section("engine.periods_per_year").unwrap();
        assert_eq!(rate, 0.04);
        assert_eq!(periods, 4);
    }
}
