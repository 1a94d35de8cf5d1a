//! 提示词服务 - 业务能力层
//!
//! 启动时从提示词目录加载评审指南与帖子语气，提供各阶段的提示词构建

use std::path::Path;

use tokio::fs;
use tracing::{debug, warn};

use crate::models::{Paper, ScoreKey};
use crate::services::ranking::format_brief;

/// 帖子系统提示词文件
const POST_SYSTEM_FILE: &str = "post_system.md";

const DEFAULT_POST_SYSTEM_PROMPT: &str = "You are a LinkedIn thought leader who helps AI \
enthusiasts understand cutting-edge research with enthusiasm and clarity.";

/// 一条评审指南
#[derive(Debug, Clone)]
pub struct Guideline {
    pub criterion: ScoreKey,
    pub text: String,
}

/// 提示词库
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    guidelines: Vec<Guideline>,
    post_system: String,
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self {
            guidelines: ScoreKey::CRITERIA
                .iter()
                .map(|&criterion| Guideline {
                    criterion,
                    text: String::new(),
                })
                .collect(),
            post_system: DEFAULT_POST_SYSTEM_PROMPT.to_string(),
        }
    }
}

impl PromptLibrary {
    /// 从目录加载提示词，缺失的文件视为空文本
    pub async fn load(dir: &Path) -> Self {
        let mut guidelines = Vec::with_capacity(ScoreKey::CRITERIA.len());
        for criterion in ScoreKey::CRITERIA {
            let text = match criterion.guideline_file() {
                Some(file) => load_text_file(&dir.join(file)).await,
                None => String::new(),
            };
            guidelines.push(Guideline { criterion, text });
        }

        let post_system = load_text_file(&dir.join(POST_SYSTEM_FILE)).await;
        let post_system = if post_system.is_empty() {
            DEFAULT_POST_SYSTEM_PROMPT.to_string()
        } else {
            post_system
        };

        Self {
            guidelines,
            post_system,
        }
    }

    pub fn guidelines(&self) -> &[Guideline] {
        &self.guidelines
    }

    /// 帖子的系统提示词
    pub fn post_system(&self) -> &str {
        &self.post_system
    }

    /// 拼接非空的评审指南
    pub fn format_guidelines(&self) -> String {
        self.guidelines
            .iter()
            .filter(|g| !g.text.is_empty())
            .map(|g| format!("{} ({})\n{}", g.criterion.title(), g.criterion.key(), g.text))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// 构建分析提示词
    ///
    /// # 参数
    /// - `paper`: 论文
    /// - `max_content_chars`: 正文摘录的最大字符数
    pub fn analysis_prompt(&self, paper: &Paper, max_content_chars: usize) -> String {
        let content_excerpt = match paper.content.as_deref() {
            Some(content) if !content.is_empty() => {
                let truncated: String = content.chars().take(max_content_chars).collect();
                format!("\nContent excerpt:\n{}\n", truncated)
            }
            _ => String::new(),
        };

        format!(
            r#"
Analyze the following paper and produce the requested insights:
Title: {}
Abstract: {}
START Content:
{}
END Content
Return:
- The main contributions
- The technical innovations
- Potential applications
- How hard it is to reproduce
- A five-line summary
"#,
            paper.title, paper.abstract_text, content_excerpt
        )
    }

    /// 构建打分提示词
    pub fn score_prompt(&self, analysis: &str) -> String {
        let keys: Vec<String> = ScoreKey::ALL
            .iter()
            .map(|k| format!("  \"{}\": x", k.key()))
            .collect();

        format!(
            r#"
Given the following analysis:
{}

Use these guidelines for each criterion:
{}

Provide a score between 0 and 10 for:
- originality
- technical impact
- reproducibility
- short-term potential

Also output a final global score between 0 and 10.
Return JSON with this structure:
{{
{}
}}
"#,
            analysis,
            self.format_guidelines(),
            keys.join(",\n")
        )
    }

    /// 构建帖子的用户提示词
    ///
    /// # 参数
    /// - `papers`: 排名靠前的论文（按名次）
    /// - `language`: 输出语言
    /// - `window_hours`: 时间窗口
    /// - `repo_url`: 结尾引用的开源仓库
    /// - `excerpt_chars`: 简报中每篇摘录的最大字符数
    pub fn post_prompt(
        &self,
        papers: &[Paper],
        language: &str,
        window_hours: u64,
        repo_url: &str,
        excerpt_chars: usize,
    ) -> String {
        let brief = format_brief(papers, excerpt_chars);
        let count = papers.len();
        format!(
            "Write a LinkedIn post in {language} that curates the top {count} AI papers from the last {window_hours} hours.\n\
             - Begin with a sentence explaining that here are {count} new papers from arXiv on artificial intelligence that are worth a look.\n\
             - Dedicate one short paragraph per paper starting with the ranking number (1. / 2. / 3. / etc.) followed with the exact paper title enclosed in double quotes (e.g., \"Attention Is All You Need\"), followed by the key idea, why it matters, and a concise practical takeaway.\n\
             - Under each paragraph, add the link sentence formatted as Lien: <url>.\n\
             - After the {count} paragraphs, append a one-sentence disclaimer that the content was generated by an agentic workflow and link to the open-source code at {repo_url}.\n\
             Constraints: stay factual, avoid marketing buzzwords and filler, do not use emojis, do not use any Markdown (no bullets, numbered lists, bold, headings, or code), and write plain text sentences separated only by blank lines (with the link sentence on its own line).\n\
             Keep the tone approachable for a broad audience: emphasize what each paper enables in practice, how it impacts teams or products, and the concrete benefits readers could expect. Use plain-language analogies, focus on use cases, and avoid dense jargon or architecture deep dives.\n\
             Use the following research brief as context (do not list raw metadata, turn it into prose):\n\
             {brief}"
        )
    }
}

/// 读取文本文件，不存在或不可读时返回空串
async fn load_text_file(path: &Path) -> String {
    match fs::read_to_string(path).await {
        Ok(text) => text.trim().to_string(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("提示词文件不存在: {}", path.display());
            String::new()
        }
        Err(e) => {
            warn!("⚠️ 读取提示词文件失败 ({}): {}", path.display(), e);
            String::new()
        }
    }
}
