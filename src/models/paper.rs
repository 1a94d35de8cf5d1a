use chrono::{DateTime, Utc};
use serde_json::{Map, Value as JsonValue};

use crate::services::SearchHit;

/// 从论文 URL 中提取稳定的标识（最后一段路径）
///
/// `http://arxiv.org/abs/2401.00001v1` → `2401.00001v1`
pub fn paper_id_from_url(url: &str) -> String {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// 论文记录
///
/// 贯穿所有阶段的可变记录，字段只增不减
#[derive(Debug, Clone)]
pub struct Paper {
    pub id: String,
    pub title: String,
    pub category: String,
    pub abstract_text: String,
    pub url: String,
    pub pdf_url: Option<String>,
    pub published: DateTime<Utc>,
    pub authors: Vec<String>,

    /// 全文文本（下载或缓存）
    pub content: Option<String>,
    /// LLM 分析文本
    pub analysis: Option<String>,
    /// LLM 打分原始文本（期望为 JSON）
    pub score: Option<String>,
    /// 解析后的打分
    pub score_json: Map<String, JsonValue>,
    /// 综合分，缺失或无法解析时为 0
    pub score_value: f64,
}

impl Paper {
    /// 由搜索结果创建论文记录
    pub fn from_hit(hit: SearchHit) -> Self {
        Self {
            id: paper_id_from_url(&hit.entry_url),
            title: hit.title,
            category: hit.primary_category,
            abstract_text: hit.abstract_text,
            url: hit.entry_url,
            pdf_url: hit.pdf_url.filter(|u| !u.trim().is_empty()),
            published: hit.published_at,
            authors: hit.authors,
            content: None,
            analysis: None,
            score: None,
            score_json: Map::new(),
            score_value: 0.0,
        }
    }

    /// 作者列表，空时返回 "Unknown"
    pub fn authors_display(&self) -> String {
        if self.authors.is_empty() {
            "Unknown".to_string()
        } else {
            self.authors.join(", ")
        }
    }
}
