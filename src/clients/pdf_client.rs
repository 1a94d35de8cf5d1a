/// PDF 客户端
///
/// 负责下载论文 PDF 并逐页提取文本
use std::time::Duration;

use async_trait::async_trait;
use lopdf::Document;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::services::ContentSource;

/// PDF 客户端
pub struct PdfClient {
    client: reqwest::Client,
}

impl PdfClient {
    /// 创建新的 PDF 客户端
    ///
    /// # 参数
    /// - `timeout`: 单次下载的超时时间
    pub fn new(timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::request_failed("pdf client", e))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ContentSource for PdfClient {
    async fn download(&self, url: &str) -> AppResult<Vec<u8>> {
        debug!("下载 PDF: {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::request_failed(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::bad_status(url, status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::request_failed(url, e))?;
        debug!("PDF 下载完成: {} 字节", bytes.len());
        Ok(bytes.to_vec())
    }

    fn extract_text(&self, bytes: &[u8]) -> AppResult<String> {
        extract_pdf_text(bytes)
    }
}

/// 逐页提取 PDF 文本，跳过没有文本的页，页间以换行分隔
///
/// 每页文本去掉首尾空白
pub fn extract_pdf_text(bytes: &[u8]) -> AppResult<String> {
    let document = Document::load_mem(bytes).map_err(AppError::pdf_parse_failed)?;

    let mut pages_text = Vec::new();
    for page_number in document.get_pages().keys() {
        match document.extract_text(&[*page_number]) {
            Ok(text) if !text.trim().is_empty() => pages_text.push(text.trim().to_string()),
            Ok(_) => {}
            Err(e) => debug!("第 {} 页无法提取文本: {}", page_number, e),
        }
    }

    Ok(pages_text.join("\n"))
}
