use std::sync::Arc;

use past_papers::ArchiveUrl;
use papers_search::{config, domain::search::SearchResult, factory};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::{fmt::time::LocalTime, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::from_filename(".env.local").ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "papers_search=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_timer(LocalTime::rfc_3339()))
        .init();

    let settings = config::read_config()?;
    let archive = settings.archive.archive_url()?;
    let pipeline = Arc::new(factory::build_pipeline(&settings));

    info!(
        store = %settings.store.path.display(),
        model = %settings.extractor.model,
        "Question search ready, one query per line"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let query = line.trim().to_string();
        if query.is_empty() {
            continue;
        }

        // Searches block on the model and the database, keep them off the input loop.
        let worker = Arc::clone(&pipeline);
        let result = match tokio::spawn(async move { worker.search(&query).await }).await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "Search task failed");
                continue;
            }
        };

        print_result(&result, &archive);
    }

    Ok(())
}

fn print_result(result: &SearchResult, archive: &ArchiveUrl) {
    println!("{}", result.status);
    if !result.categories.is_empty() {
        println!("Categories: {}", result.categories.join(", "));
    }

    for hit in &result.items {
        let record = &hit.record;
        let link = record
            .source_url(archive)
            .map(|url| url.to_string())
            .unwrap_or_default();
        println!(
            "  {} {} {} | {} | {} | {} | {}",
            record.year,
            record.paper,
            record.question_number,
            record.topics_column(),
            record.module,
            record.difficulty,
            link
        );
    }
}
