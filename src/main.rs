use anyhow::{Context, Result};
use newt_blog_query::app::{build_navigation, collect_static_paths};
use newt_blog_query::domain::article::ArticleRepository;
use newt_blog_query::domain::AggregateRepository;
use newt_blog_query::infra::api::{ContentStoreClient, ReqwestContentStoreClient};
use newt_blog_query::infra::SiteConfig;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 環境変数を読み込み（.envファイルがあれば使用）
    let _ = dotenvy::dotenv();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = SiteConfig::from_env().context("設定の読み込みに失敗")?;
    let client: Arc<dyn ContentStoreClient> = Arc::new(
        ReqwestContentStoreClient::new(config.store.clone())
            .context("コンテンツストアクライアントの初期化に失敗")?,
    );
    let articles = ArticleRepository::new(client.clone(), &config);
    let aggregates = AggregateRepository::new(client, &config);

    match std::env::args().nth(1).as_deref() {
        None | Some("paths") => {
            let paths = collect_static_paths(&articles, &aggregates, &config).await?;
            for path in paths.paths() {
                println!("{}", path);
            }
        }
        Some("navigation") => {
            let navigation = build_navigation(&aggregates, config.classification).await?;
            let json = serde_json::to_string_pretty(&navigation)
                .context("ナビゲーション情報のシリアライズに失敗")?;
            println!("{}", json);
        }
        Some(other) => {
            anyhow::bail!("不明なコマンドです: {} (paths | navigation)", other);
        }
    }

    Ok(())
}
