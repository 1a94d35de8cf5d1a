/// arXiv API 客户端
///
/// 封装 arXiv Atom 接口的请求与解析
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::{debug, warn};

use crate::error::{AppError, AppResult, ParseError};
use crate::services::{PaperSearch, SearchHit, SearchQuery};

const ARXIV_API_BASE: &str = "https://export.arxiv.org/api/query";
const USER_AGENT: &str = "arxiv-curator/0.1";

/// arXiv 客户端
pub struct ArxivClient {
    client: reqwest::Client,
    api_base: String,
}

impl ArxivClient {
    /// 创建新的 arXiv 客户端
    pub fn new(timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::request_failed(ARXIV_API_BASE, e))?;
        Ok(Self {
            client,
            api_base: ARXIV_API_BASE.to_string(),
        })
    }

    /// 使用自定义 API 地址
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }
}

#[async_trait]
impl PaperSearch for ArxivClient {
    async fn search(&self, query: &SearchQuery) -> AppResult<Vec<SearchHit>> {
        let max_results = query.max_results.to_string();
        debug!("arXiv 查询: {} (最多 {} 条)", query.query, max_results);

        let response = self
            .client
            .get(&self.api_base)
            .query(&[
                ("search_query", query.query.as_str()),
                ("start", "0"),
                ("max_results", max_results.as_str()),
                ("sortBy", query.sort.as_param()),
                ("sortOrder", "descending"),
            ])
            .send()
            .await
            .map_err(|e| AppError::request_failed(&self.api_base, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::bad_status(&self.api_base, status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::request_failed(&self.api_base, e))?;

        parse_atom_feed(&body)
    }
}

// ========== Atom 解析 ==========

/// 单个 `<entry>` 中收集到的原始字段
#[derive(Debug, Default)]
struct RawEntry {
    id: Option<String>,
    title: Option<String>,
    summary: Option<String>,
    published: Option<String>,
    authors: Vec<String>,
    primary_category: Option<String>,
    first_category: Option<String>,
    pdf_url: Option<String>,
}

impl RawEntry {
    /// 记录开始标签或自闭合标签上的属性
    fn absorb_attributes(&mut self, tag: &BytesStart<'_>) {
        match tag.local_name().as_ref() {
            b"primary_category" => {
                if self.primary_category.is_none() {
                    self.primary_category = attribute(tag, b"term");
                }
            }
            b"category" => {
                if self.first_category.is_none() {
                    self.first_category = attribute(tag, b"term");
                }
            }
            b"link" => {
                let is_pdf = attribute(tag, b"title").as_deref() == Some("pdf")
                    || attribute(tag, b"type").as_deref() == Some("application/pdf");
                if is_pdf && self.pdf_url.is_none() {
                    self.pdf_url = attribute(tag, b"href");
                }
            }
            _ => {}
        }
    }

    /// 记录结束标签前累积的文本
    ///
    /// # 参数
    /// - `name`: 结束的标签名（不含命名空间前缀）
    /// - `parent`: 父标签名，`None` 表示 `<entry>` 的直接子元素
    fn absorb_text(&mut self, name: &[u8], parent: Option<&[u8]>, text: &str) {
        let slot = match (parent, name) {
            (None, b"id") => &mut self.id,
            (None, b"title") => &mut self.title,
            (None, b"summary") => &mut self.summary,
            (None, b"published") => &mut self.published,
            (Some(b"author"), b"name") => {
                self.authors.push(normalize_whitespace(text));
                return;
            }
            _ => return,
        };
        *slot = Some(text.to_string());
    }

    fn into_hit(self) -> AppResult<SearchHit> {
        let missing = |field: &str| {
            AppError::Parse(ParseError::Feed {
                reason: format!("条目缺少 <{}>", field),
            })
        };

        let entry_url = self.id.map(|id| id.trim().to_string()).ok_or_else(|| missing("id"))?;
        let title = self
            .title
            .map(|t| normalize_whitespace(&t))
            .ok_or_else(|| missing("title"))?;
        let abstract_text = normalize_whitespace(self.summary.as_deref().unwrap_or_default());

        let published_raw = self.published.ok_or_else(|| missing("published"))?;
        let published_at = DateTime::parse_from_rfc3339(published_raw.trim())
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|source| {
                AppError::Parse(ParseError::Timestamp {
                    value: published_raw.clone(),
                    source,
                })
            })?;

        Ok(SearchHit {
            title,
            primary_category: self
                .primary_category
                .or(self.first_category)
                .unwrap_or_default(),
            abstract_text,
            entry_url,
            pdf_url: self.pdf_url,
            published_at,
            authors: self.authors,
        })
    }
}

/// 解析 arXiv 返回的 Atom 源
///
/// 文本中的实体、数字字符引用与 CDATA 都会被解码；
/// 无法解析的条目会被跳过并记录日志
pub fn parse_atom_feed(xml: &str) -> AppResult<Vec<SearchHit>> {
    let feed_error = |reason: String| AppError::Parse(ParseError::Feed { reason });

    let mut reader = Reader::from_str(xml);
    let mut saw_feed = false;
    let mut entry: Option<RawEntry> = None;
    // <entry> 内部的标签路径
    let mut path: Vec<Vec<u8>> = Vec::new();
    let mut text = String::new();
    let mut hits = Vec::new();

    loop {
        let event = reader.read_event().map_err(|e| {
            feed_error(format!("XML 解析失败 (位置 {}): {}", reader.buffer_position(), e))
        })?;

        match event {
            Event::Start(tag) => {
                let name = tag.local_name().as_ref().to_vec();
                match entry.as_mut() {
                    Some(current) => {
                        current.absorb_attributes(&tag);
                        path.push(name);
                        text.clear();
                    }
                    None if name == b"entry" => {
                        entry = Some(RawEntry::default());
                        path.clear();
                        text.clear();
                    }
                    None => saw_feed |= name == b"feed",
                }
            }
            Event::Empty(tag) => match entry.as_mut() {
                Some(current) => current.absorb_attributes(&tag),
                None => saw_feed |= tag.local_name().as_ref() == b"feed",
            },
            Event::Text(raw) => {
                if entry.is_some() {
                    let decoded = raw
                        .unescape()
                        .map_err(|e| feed_error(format!("无法解码文本: {}", e)))?;
                    text.push_str(&decoded);
                }
            }
            Event::CData(raw) => {
                if entry.is_some() {
                    text.push_str(&String::from_utf8_lossy(&raw));
                }
            }
            Event::End(tag) => {
                let Some(current) = entry.as_mut() else {
                    continue;
                };
                match path.pop() {
                    Some(name) => {
                        current.absorb_text(&name, path.last().map(Vec::as_slice), &text);
                        text.clear();
                    }
                    None if tag.local_name().as_ref() == b"entry" => {
                        if let Some(finished) = entry.take() {
                            match finished.into_hit() {
                                Ok(hit) => hits.push(hit),
                                Err(e) => warn!("⚠️ 跳过无法解析的条目: {}", e),
                            }
                        }
                    }
                    None => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_feed {
        return Err(feed_error("缺少 <feed> 根元素".to_string()));
    }
    Ok(hits)
}

/// 读取属性值（按本地名匹配，忽略命名空间前缀）
fn attribute(tag: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    tag.attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == name)
        .and_then(|attr| attr.unescape_value().ok())
        .map(|value| value.into_owned())
}

/// 合并连续空白
fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
