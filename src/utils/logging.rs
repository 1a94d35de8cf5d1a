/// 日志工具模块
///
/// 提供日志格式化和输出的辅助函数
use tracing::info;

use crate::config::Config;
use crate::models::{FetchStats, GenerationStats, Paper, ScoreKey};

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!(
        "🚀 程序启动 - arXiv 论文筛选 ({})",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("📚 分类: {}", config.categories.join(", "));
    info!("⏱️ 时间窗口: {} 小时", config.recency_window_hours);
    info!("🤖 模型: {}", config.llm_model_name);
    info!("{}", "=".repeat(60));
}

/// 记录阶段开始
pub fn log_stage_start(stage: &str) {
    info!("\n{}", "─".repeat(60));
    info!("▶ 阶段: {}", stage);
}

/// 记录全文获取统计
pub fn log_fetch_stats(stats: &FetchStats) {
    info!(
        "📄 PDF 统计 - 总数: {}, 缓存命中: {}, 下载: {}, 无PDF: {}, 失败: {}",
        stats.total, stats.cache_hits, stats.downloaded, stats.missing_pdf, stats.failures
    );
}

/// 记录 LLM 生成统计
///
/// # 参数
/// - `kind`: 生成类型（分析 / 打分）
/// - `stats`: 统计数据
pub fn log_generation_stats(kind: &str, stats: &GenerationStats) {
    info!(
        "📊 {}统计 - 总数: {}, 缓存命中: {}, 新生成: {}",
        kind, stats.total, stats.cache_hits, stats.generated
    );
}

/// 打印排序后的论文列表
pub fn print_ranked_papers(papers: &[Paper]) {
    info!("\n{}", "=".repeat(60));
    info!("🏆 论文排名 (共 {} 篇)", papers.len());
    info!("{}", "=".repeat(60));

    for paper in papers.iter().filter(|p| !p.score_json.is_empty()) {
        let score_of = |key: ScoreKey| {
            key.lookup(&paper.score_json)
                .map(|v| v.to_string())
                .unwrap_or_else(|| "0".to_string())
        };
        info!(
            "{:.1} - {} (Tech:{}/Repro:{}/Short:{}/Orig:{})\n     {}\n     {}\n     {}\n",
            paper.score_value,
            paper.title,
            score_of(ScoreKey::Impact),
            score_of(ScoreKey::Reproducibility),
            score_of(ScoreKey::Potential),
            score_of(ScoreKey::Originality),
            paper.category,
            paper.url,
            truncate_text(&paper.abstract_text, 300)
        );
    }
}

/// 打印生成的帖子
pub fn print_post(post: &str) {
    if post.is_empty() {
        info!("没有生成帖子");
        return;
    }
    info!("\n{}", "=".repeat(60));
    info!("✍️ 建议发布的帖子:\n{}", post);
    info!("{}", "=".repeat(60));
}

/// 截断长文本
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大字符数
///
/// # 返回
/// 超出时返回前 `max_len` 个字符加 "..."
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
