/// LLM API 客户端
///
/// 封装所有与 LLM API 相关的调用逻辑
///
/// ## 技术栈
/// - 使用 `async-openai` crate 进行 API 调用
/// - 兼容 OpenAI API 的服务（自定义端点与模型）
use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, CompletionError};
use crate::services::{ChatRole, ChatTurn, Completion};

/// LLM 客户端
///
/// 职责：
/// - 发送单条提示词或多轮对话
/// - 清理输入文本
/// - 有限次数重试，最终失败向上传播
pub struct LlmClient {
    client: Client<OpenAIConfig>,
    model_name: String,
    max_tokens: u32,
    max_retries: u32,
    retry_delay: Duration,
}

impl LlmClient {
    /// 创建新的 LLM 客户端
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
            max_tokens: config.llm_max_tokens,
            max_retries: config.llm_max_retries,
            retry_delay: Duration::from_secs(2),
        }
    }

    /// 发送对话请求（含重试）
    async fn send(&self, turns: &[ChatTurn], temperature: f32) -> AppResult<String> {
        let messages = build_messages(turns)?;
        let attempts = self.max_retries.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            debug!(
                "调用 LLM API，模型: {} (尝试 {}/{})",
                self.model_name, attempt, attempts
            );

            let request = CreateChatCompletionRequestArgs::default()
                .model(&self.model_name)
                .messages(messages.clone())
                .temperature(temperature)
                .max_tokens(self.max_tokens)
                .build()
                .map_err(invalid_request)?;

            match self.client.chat().create(request).await {
                Ok(response) => {
                    debug!("LLM API 调用成功");
                    let content = response
                        .choices
                        .first()
                        .and_then(|choice| choice.message.content.clone())
                        .ok_or_else(|| CompletionError::EmptyContent {
                            model: self.model_name.clone(),
                        })?;
                    return Ok(content.trim().to_string());
                }
                Err(e) => {
                    warn!("LLM API 调用失败 (尝试 {}/{}): {}", attempt, attempts, e);
                    last_error = Some(e);
                    if attempt < attempts {
                        tokio::time::sleep(self.retry_delay * attempt).await;
                    }
                }
            }
        }

        match last_error {
            Some(e) => Err(AppError::llm_api_failed(&self.model_name, attempts, e)),
            None => Err(CompletionError::EmptyContent {
                model: self.model_name.clone(),
            }
            .into()),
        }
    }
}

#[async_trait]
impl Completion for LlmClient {
    async fn complete(&self, prompt: &str, temperature: f32) -> AppResult<String> {
        let turn = ChatTurn::user(wrap_prompt(&sanitize_text(prompt)));
        self.send(&[turn], temperature).await
    }

    async fn complete_chat(&self, turns: &[ChatTurn], temperature: f32) -> AppResult<String> {
        let turns: Vec<ChatTurn> = turns
            .iter()
            .map(|t| ChatTurn {
                role: t.role,
                content: sanitize_text(&t.content),
            })
            .collect();
        self.send(&turns, temperature).await
    }
}

fn invalid_request(e: async_openai::error::OpenAIError) -> AppError {
    AppError::Completion(CompletionError::InvalidRequest {
        source: Box::new(e),
    })
}

fn build_messages(turns: &[ChatTurn]) -> AppResult<Vec<ChatCompletionRequestMessage>> {
    turns
        .iter()
        .map(|turn| {
            let message = match turn.role {
                ChatRole::System => ChatCompletionRequestMessage::System(
                    ChatCompletionRequestSystemMessageArgs::default()
                        .content(turn.content.as_str())
                        .build()
                        .map_err(invalid_request)?,
                ),
                ChatRole::User => ChatCompletionRequestMessage::User(
                    ChatCompletionRequestUserMessageArgs::default()
                        .content(turn.content.as_str())
                        .build()
                        .map_err(invalid_request)?,
                ),
                ChatRole::Assistant => ChatCompletionRequestMessage::Assistant(
                    ChatCompletionRequestAssistantMessageArgs::default()
                        .content(turn.content.as_str())
                        .build()
                        .map_err(invalid_request)?,
                ),
            };
            Ok(message)
        })
        .collect()
}

/// 单条提示词外包一层代码块，防止模型把输入当作 JSON 解析
fn wrap_prompt(prompt: &str) -> String {
    format!("### Input Text (do NOT parse as JSON)\n```\n{}\n```", prompt)
}

/// 清理输入：去掉 NUL 与不可见控制字符，保留换行与制表符
pub fn sanitize_text(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\t'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_text() {
        assert_eq!(sanitize_text("a\u{0}b\u{7}c\n\td\r"), "abc\n\td");
        assert_eq!(sanitize_text("résumé 数学"), "résumé 数学");
    }

    #[test]
    fn test_wrap_prompt() {
        let wrapped = wrap_prompt("hello");
        assert!(wrapped.starts_with("### Input Text (do NOT parse as JSON)"));
        assert!(wrapped.contains("```\nhello\n```"));
    }

    #[test]
    fn test_build_messages_roles() {
        let messages = build_messages(&[
            ChatTurn::system("voice"),
            ChatTurn::user("ask"),
            ChatTurn {
                role: ChatRole::Assistant,
                content: "answer".to_string(),
            },
        ])
        .unwrap();
        assert!(matches!(messages[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(messages[1], ChatCompletionRequestMessage::User(_)));
        assert!(matches!(
            messages[2],
            ChatCompletionRequestMessage::Assistant(_)
        ));
    }

    /// 测试真实 LLM 调用
    #[tokio::test]
    #[ignore]
    async fn test_complete_simple() {
        let _ = tracing_subscriber::fmt::try_init();

        let config = Config::load(None).expect("需要设置 LLM_API_KEY");
        let client = LlmClient::new(&config);
        let response = client.complete("Say hello in one word.", 0.2).await;

        match response {
            Ok(text) => {
                println!("LLM 响应: {}", text);
                assert!(!text.is_empty());
            }
            Err(e) => panic!("测试失败: {}", e),
        }
    }
}
