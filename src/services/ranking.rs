//! 排序与简报 - 业务能力层
//!
//! 解析打分、按综合分排序、渲染供帖子生成使用的简报

use serde_json::Value as JsonValue;

use crate::models::{parse_score, Paper, ScoreKey};
use crate::utils::logging::truncate_text;

/// 为每篇论文解析打分并按综合分降序排列
///
/// 稳定排序：综合分相同的论文保持原有相对顺序
pub fn collect_scored_papers(papers: &[Paper]) -> Vec<Paper> {
    let mut scored: Vec<Paper> = papers
        .iter()
        .cloned()
        .map(|mut paper| {
            let parsed = parse_score(paper.score.as_deref().unwrap_or("{}"));
            paper.score_json = parsed.fields;
            paper.score_value = parsed.value;
            paper
        })
        .collect();

    scored.sort_by(|a, b| b.score_value.total_cmp(&a.score_value));
    scored
}

/// 取排名前 `n` 的论文
pub fn top_papers(papers: &[Paper], n: usize) -> Vec<Paper> {
    collect_scored_papers(papers).into_iter().take(n).collect()
}

/// 渲染单篇论文的打分，如 `Orig:7, Tech:8`
pub fn format_scores(paper: &Paper) -> String {
    ScoreKey::ALL
        .iter()
        .filter_map(|key| {
            key.lookup(&paper.score_json).map(|value| match value {
                JsonValue::String(text) => format!("{}:{}", key.label(), text),
                other => format!("{}:{}", key.label(), other),
            })
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// 渲染简报
///
/// 每篇论文一个段落（标题、作者、链接、打分、分析摘录），段落间空一行
///
/// # 参数
/// - `papers`: 已排序的论文
/// - `excerpt_chars`: 分析摘录的最大字符数，超出时追加 "..."
pub fn format_brief(papers: &[Paper], excerpt_chars: usize) -> String {
    papers
        .iter()
        .enumerate()
        .map(|(idx, paper)| {
            let mut lines = vec![
                format!("Paper #{}: {}", idx + 1, paper.title),
                format!("Authors: {}", paper.authors_display()),
                format!("URL: {}", paper.url),
            ];

            let scores = format_scores(paper);
            if !scores.is_empty() {
                lines.push(format!("Scores: {}", scores));
            }

            let summary_source = paper
                .analysis
                .as_deref()
                .filter(|a| !a.trim().is_empty())
                .unwrap_or(&paper.abstract_text);
            let summary = truncate_text(summary_source.trim(), excerpt_chars);
            if !summary.is_empty() {
                lines.push(format!("Analysis: {}", summary));
            }

            lines.join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
