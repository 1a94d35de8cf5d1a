use std::path::PathBuf;

use anyhow::Result;
use arxiv_curator::{logger, App, Config};

/// 默认配置文件
const DEFAULT_CONFIG_FILE: &str = "curator.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // 读取 .env（可选）
    dotenvy::dotenv().ok();

    // 初始化日志
    logger::init();

    // 加载配置
    let config_path = std::env::var("CURATOR_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
    let config = Config::load(Some(config_path.as_path()))?;

    // 查询为空时按配置的分类搜索
    let query = std::env::args().nth(1).unwrap_or_default();

    // 初始化并运行应用
    let _state = App::initialize(config).await?.run(&query).await?;

    Ok(())
}
