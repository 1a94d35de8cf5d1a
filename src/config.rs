use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{AppError, AppResult, ConfigError};

/// 默认关注的 arXiv 分类
pub const DEFAULT_CATEGORIES: [&str; 4] = ["cs.CL", "cs.AI", "cs.IR", "cs.MA"];

/// 凭据环境变量（按优先级）
const API_KEY_VARS: [&str; 2] = ["LLM_API_KEY", "AI_ENDPOINTS_ACCESS_TOKEN"];

/// 程序配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- 帖子生成 ---
    /// 帖子输出语言
    pub post_language: String,
    /// 帖子生成温度
    pub post_temperature: f32,
    /// 分析与打分时的生成温度
    pub analysis_temperature: f32,
    /// 进入帖子的论文数量
    pub top_n: usize,
    /// 帖子结尾引用的开源仓库地址
    pub repo_url: String,
    // --- 搜索 ---
    /// 主分类白名单
    pub categories: Vec<String>,
    /// 时间窗口（小时）
    pub recency_window_hours: u64,
    /// 单次搜索最多返回的条目数
    pub search_max_results: usize,
    // --- 全文与摘录 ---
    /// PDF 下载超时（秒）
    pub download_timeout_secs: u64,
    /// 分析提示词中正文摘录的最大字符数
    pub content_excerpt_chars: usize,
    /// 帖子简报中每篇分析摘录的最大字符数
    pub brief_excerpt_chars: usize,
    // --- 目录 ---
    pub cache_dir: PathBuf,
    pub prompts_dir: PathBuf,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    pub llm_max_tokens: u32,
    pub llm_max_retries: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            post_language: "fr".to_string(),
            post_temperature: 0.4,
            analysis_temperature: 0.2,
            top_n: 5,
            repo_url: "https://github.com/eric-houzelle/arxiv-agent".to_string(),
            categories: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            recency_window_hours: 72,
            search_max_results: 1000,
            download_timeout_secs: 30,
            content_excerpt_chars: 100_000,
            brief_excerpt_chars: 1200,
            cache_dir: PathBuf::from("cache"),
            prompts_dir: PathBuf::from("prompts"),
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
            llm_max_tokens: 4096,
            llm_max_retries: 3,
        }
    }
}

impl Config {
    /// 加载配置：默认值 → TOML 文件（可选）→ 环境变量 → 校验
    ///
    /// # 参数
    /// - `path`: 配置文件路径，文件不存在时跳过
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let mut config = match path {
            Some(p) if p.exists() => {
                info!("📄 读取配置文件: {}", p.display());
                let text = std::fs::read_to_string(p).map_err(|source| {
                    ConfigError::FileReadFailed {
                        path: p.display().to_string(),
                        source,
                    }
                })?;
                Self::from_toml_str(&text, &p.display().to_string())?
            }
            Some(p) => {
                debug!("配置文件 {} 不存在，使用默认配置", p.display());
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// 从 TOML 文本解析配置，未给出的字段使用默认值
    pub fn from_toml_str(text: &str, origin: &str) -> AppResult<Self> {
        toml::from_str(text).map_err(|source| {
            AppError::Config(ConfigError::TomlParseFailed {
                path: origin.to_string(),
                source,
            })
        })
    }

    /// 用外部变量覆盖配置
    ///
    /// `lookup` 通常是环境变量查询，测试中可替换为任意映射
    pub fn apply_overrides<F>(&mut self, lookup: F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("POST_LANGUAGE") {
            self.post_language = v;
        }
        if let Some(v) = parse_var(&lookup, "POST_TEMPERATURE", "f32")? {
            self.post_temperature = v;
        }
        if let Some(v) = parse_var(&lookup, "ANALYSIS_TEMPERATURE", "f32")? {
            self.analysis_temperature = v;
        }
        if let Some(v) = parse_var(&lookup, "TOP_N", "usize")? {
            self.top_n = v;
        }
        if let Some(v) = lookup("CATEGORIES") {
            self.categories = v
                .split(',')
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect();
        }
        if let Some(v) = parse_var(&lookup, "RECENCY_WINDOW_HOURS", "u64")? {
            self.recency_window_hours = v;
        }
        if let Some(v) = parse_var(&lookup, "SEARCH_MAX_RESULTS", "usize")? {
            self.search_max_results = v;
        }
        if let Some(v) = parse_var(&lookup, "DOWNLOAD_TIMEOUT_SECS", "u64")? {
            self.download_timeout_secs = v;
        }
        if let Some(v) = lookup("CACHE_DIR") {
            self.cache_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("PROMPTS_DIR") {
            self.prompts_dir = PathBuf::from(v);
        }
        if let Some(v) = API_KEY_VARS.iter().find_map(|name| lookup(*name)) {
            self.llm_api_key = v;
        }
        if let Some(v) = lookup("LLM_API_BASE_URL").or_else(|| lookup("BASE_URL")) {
            self.llm_api_base_url = v;
        }
        if let Some(v) = lookup("LLM_MODEL_NAME").or_else(|| lookup("MODEL")) {
            self.llm_model_name = v;
        }
        if let Some(v) = parse_var(&lookup, "LLM_MAX_RETRIES", "u32")? {
            self.llm_max_retries = v;
        }
        Ok(())
    }

    /// 校验必需项
    pub fn validate(&self) -> AppResult<()> {
        if self.llm_api_key.trim().is_empty() {
            return Err(AppError::missing_credential(API_KEY_VARS[0]));
        }
        Ok(())
    }

    /// 时间窗口
    pub fn recency_window(&self) -> chrono::Duration {
        chrono::Duration::hours(self.recency_window_hours as i64)
    }
}

fn parse_var<T, F>(lookup: &F, var_name: &str, expected_type: &str) -> AppResult<Option<T>>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var_name) {
        Some(value) => value.trim().parse().map(Some).map_err(|_| {
            AppError::Config(ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            })
        }),
        None => Ok(None),
    }
}
