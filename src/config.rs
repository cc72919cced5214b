use serde::Deserialize;
use std::path::Path;

use crate::error::{AppError, AppResult, ConfigError, FileError};
use crate::services::polling_service::{DEFAULT_INTERVAL_MS, DEFAULT_MAX_ATTEMPTS};

/// 程序配置
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// API 根地址（不带末尾 `/`）
    pub api_base_url: String,
    /// 每个轮询会话最多查询几次
    pub max_attempts: u32,
    /// 两次查询之间的最小间隔（毫秒）
    pub poll_interval_ms: u64,
    /// 单个 HTTP 请求的超时（秒）
    pub request_timeout_secs: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 结果记录文件，不设置则不记录
    pub output_log_file: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            poll_interval_ms: DEFAULT_INTERVAL_MS,
            request_timeout_secs: 30,
            verbose_logging: false,
            output_log_file: None,
        }
    }
}

/// TOML 配置文件的形状，所有字段均可省略
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    api_base_url: Option<String>,
    max_attempts: Option<u32>,
    poll_interval_ms: Option<u64>,
    request_timeout_secs: Option<u64>,
    verbose_logging: Option<bool>,
    output_log_file: Option<String>,
}

impl Config {
    /// 分层加载：默认值 → TOML 文件 → 环境变量
    ///
    /// `path` 为空时读取 `DOCQA_CONFIG` 环境变量指定的文件（如果有）。
    /// 不做校验，由调用方在合并完所有层之后调用 `validate`。
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let env_path = std::env::var("DOCQA_CONFIG").ok();
        let path = path.or(env_path.as_deref().map(Path::new));

        let config = match path {
            Some(p) => Self::default().merge_file(p)?,
            None => Self::default(),
        };
        config.merge_env()
    }

    /// 用 TOML 文件中出现的字段覆盖当前值
    pub fn merge_file(self, path: &Path) -> AppResult<Self> {
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::file_read_failed(display.clone(), e))?;
        self.merge_toml(&content).map_err(|source| {
            AppError::File(FileError::TomlParseFailed {
                path: display,
                source,
            })
        })
    }

    fn merge_toml(self, content: &str) -> Result<Self, toml::de::Error> {
        let file: ConfigFile = toml::from_str(content)?;
        Ok(Self {
            api_base_url: file.api_base_url.unwrap_or(self.api_base_url),
            max_attempts: file.max_attempts.unwrap_or(self.max_attempts),
            poll_interval_ms: file.poll_interval_ms.unwrap_or(self.poll_interval_ms),
            request_timeout_secs: file.request_timeout_secs.unwrap_or(self.request_timeout_secs),
            verbose_logging: file.verbose_logging.unwrap_or(self.verbose_logging),
            output_log_file: file.output_log_file.or(self.output_log_file),
        })
    }

    /// 用环境变量覆盖当前值，无法解析时报错
    fn merge_env(self) -> AppResult<Self> {
        Ok(Self {
            api_base_url: std::env::var("DOCQA_API_BASE_URL").unwrap_or(self.api_base_url),
            max_attempts: env_parse("DOCQA_MAX_ATTEMPTS", "u32")?.unwrap_or(self.max_attempts),
            poll_interval_ms: env_parse("DOCQA_POLL_INTERVAL_MS", "u64")?
                .unwrap_or(self.poll_interval_ms),
            request_timeout_secs: env_parse("DOCQA_REQUEST_TIMEOUT_SECS", "u64")?
                .unwrap_or(self.request_timeout_secs),
            verbose_logging: env_parse("VERBOSE_LOGGING", "bool")?.unwrap_or(self.verbose_logging),
            output_log_file: std::env::var("DOCQA_OUTPUT_LOG_FILE")
                .ok()
                .or(self.output_log_file),
        })
    }

    /// 校验并规范化配置
    pub fn validate(&mut self) -> AppResult<()> {
        if self.max_attempts == 0 {
            return Err(AppError::invalid_config("max_attempts", "必须大于 0"));
        }
        if self.poll_interval_ms == 0 {
            return Err(AppError::invalid_config("poll_interval_ms", "必须大于 0"));
        }
        if self.request_timeout_secs == 0 {
            return Err(AppError::invalid_config("request_timeout_secs", "必须大于 0"));
        }

        let trimmed = self.api_base_url.trim().trim_end_matches('/').to_string();
        reqwest::Url::parse(&trimmed).map_err(|e| ConfigError::InvalidUrl {
            url: self.api_base_url.clone(),
            reason: e.to_string(),
        })?;
        self.api_base_url = trimmed;

        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(var_name: &str, expected_type: &str) -> AppResult<Option<T>> {
    match std::env::var(var_name) {
        Ok(value) => value.trim().parse().map(Some).map_err(|_| {
            AppError::Config(ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            })
        }),
        Err(_) => Ok(None),
    }
}
