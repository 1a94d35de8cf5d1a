use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 网络传输错误（搜索、下载）
    #[error("传输错误: {0}")]
    Transport(#[from] TransportError),
    /// 解析错误（JSON、Atom、PDF）
    #[error("解析错误: {0}")]
    Parse(#[from] ParseError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// LLM 补全错误
    #[error("LLM错误: {0}")]
    Completion(#[from] CompletionError),
    /// 缓存读写错误
    #[error("缓存错误: {0}")]
    Cache(#[from] CacheError),
    /// 流程编排错误
    #[error("流程错误: {0}")]
    Pipeline(#[from] PipelineError),
}

/// 网络传输错误
#[derive(Debug, Error)]
pub enum TransportError {
    /// 网络请求失败（连接失败、超时等）
    #[error("请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: BoxError,
    },
    /// 服务端返回非 2xx 状态码
    #[error("请求返回状态码 {status} ({endpoint})")]
    BadStatus { endpoint: String, status: u16 },
}

/// 解析错误
#[derive(Debug, Error)]
pub enum ParseError {
    /// Atom 源格式不正确
    #[error("Atom解析失败: {reason}")]
    Feed { reason: String },
    /// PDF 无法读取
    #[error("PDF解析失败: {source}")]
    Pdf {
        #[source]
        source: BoxError,
    },
    /// 时间戳格式不正确
    #[error("无法解析时间戳 '{value}': {source}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 必需的凭据缺失
    #[error("缺少必需的凭据: 请设置环境变量 {var_name}")]
    MissingCredential { var_name: String },
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 配置文件读取失败
    #[error("读取配置文件失败 ({path}): {source}")]
    FileReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// LLM 补全错误
#[derive(Debug, Error)]
pub enum CompletionError {
    /// API 调用失败
    #[error("LLM API调用失败 (模型: {model}, 已尝试 {attempts} 次): {source}")]
    ApiCallFailed {
        model: String,
        attempts: u32,
        #[source]
        source: BoxError,
    },
    /// 返回内容为空
    #[error("LLM返回内容为空 (模型: {model})")]
    EmptyContent { model: String },
    /// 请求构建失败
    #[error("构建LLM请求失败: {source}")]
    InvalidRequest {
        #[source]
        source: BoxError,
    },
}

/// 缓存错误
#[derive(Debug, Error)]
pub enum CacheError {
    /// 缓存目录创建失败
    #[error("无法创建缓存目录 ({path}): {source}")]
    DirectoryCreateFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 缓存条目序列化失败
    #[error("缓存条目序列化失败 ({paper_id}): {source}")]
    SerializeFailed {
        paper_id: String,
        #[source]
        source: serde_json::Error,
    },
    /// 缓存写入失败
    #[error("写入缓存失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// 流程编排错误
#[derive(Debug, Error)]
pub enum PipelineError {
    /// 阶段顺序不正确
    #[error("阶段 {stage} 需要批次状态 {expected}，当前为 {found}")]
    StageOutOfOrder {
        stage: String,
        expected: String,
        found: String,
    },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建网络请求失败错误
    pub fn request_failed(
        endpoint: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Transport(TransportError::RequestFailed {
            endpoint: endpoint.into(),
            source: Box::new(source),
        })
    }

    /// 创建非 2xx 状态码错误
    pub fn bad_status(endpoint: impl Into<String>, status: u16) -> Self {
        AppError::Transport(TransportError::BadStatus {
            endpoint: endpoint.into(),
            status,
        })
    }

    /// 创建 PDF 解析错误
    pub fn pdf_parse_failed(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        AppError::Parse(ParseError::Pdf {
            source: Box::new(source),
        })
    }

    /// 创建凭据缺失错误
    pub fn missing_credential(var_name: impl Into<String>) -> Self {
        AppError::Config(ConfigError::MissingCredential {
            var_name: var_name.into(),
        })
    }

    /// 创建 LLM API 调用错误
    pub fn llm_api_failed(
        model: impl Into<String>,
        attempts: u32,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Completion(CompletionError::ApiCallFailed {
            model: model.into(),
            attempts,
            source: Box::new(source),
        })
    }

    /// 是否为传输层错误
    pub fn is_transport(&self) -> bool {
        matches!(self, AppError::Transport(_))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credential_message_names_variable() {
        let err = AppError::missing_credential("LLM_API_KEY");
        assert!(err.to_string().contains("LLM_API_KEY"));
        assert!(matches!(
            err,
            AppError::Config(ConfigError::MissingCredential { .. })
        ));
    }

    #[test]
    fn test_bad_status_is_transport() {
        let err = AppError::bad_status("https://arxiv.org/pdf/2401.0001", 404);
        assert!(err.is_transport());
        assert!(err.to_string().contains("404"));
    }
}
