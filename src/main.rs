use anyhow::{Context, Result, anyhow};
use chipmunk_search::search::request::Activatable;
use chipmunk_search::search::{SearchHolder, SearchResults};
use chipmunk_search::storage::FileStorage;
use chipmunk_search::{CliOptions, Config, Session};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing(&config.log.rust_log);

    tracing::info!("Starting chipmunk-search");

    let options = CliOptions::from_args()?;
    let storage_path = options
        .storage
        .or(config.storage.file.clone())
        .ok_or_else(|| anyhow!("No filters file given and CHIPMUNK_STORAGE_FILE is not set"))?;
    let storage = FileStorage::new(&storage_path);

    // Not bound to the file: a read-only run must not rewrite it on close
    let session = Session::new(&config, None);
    session
        .search()
        .load(&storage)
        .await
        .with_context(|| format!("Failed to load filters from {}", storage_path.display()))?;

    let mut filters = session.search().filters().get().await;
    if options.include_disabled {
        let disabled = session.search().disabled().get().await;
        filters.extend(disabled.iter().filter_map(|d| d.as_filter().cloned()));
        for filter in filters.iter_mut() {
            filter.set_active(true);
        }
    }

    let content = tokio::fs::read_to_string(&options.log_file)
        .await
        .with_context(|| format!("Failed to read {}", options.log_file.display()))?;

    let mut holder = SearchHolder::new();
    holder.set_filters(filters.iter())?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling search");
            on_interrupt.cancel();
        }
    });

    let results = tokio::task::spawn_blocking(move || holder.execute(content.lines(), &cancel))
        .await?
        .context("Search was cancelled")?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print!("{}", format_text_output(&results));
    }

    session.close().await?;
    Ok(())
}

fn format_text_output(results: &SearchResults) -> String {
    let mut output = String::new();
    if results.stats.stats.is_empty() {
        output.push_str("No active filters.\n");
        return output;
    }
    for (i, stat) in results.stats.stats.iter().enumerate() {
        output.push_str(&format!("[#{}] {} | {} hits\n", i + 1, stat.filter, stat.hits));
    }
    output.push_str("-".repeat(60).as_str());
    output.push('\n');
    output.push_str(&format!(
        "Found {} of {} lines\n",
        results.found(),
        results.processed
    ));
    output
}

fn init_tracing(rust_log: &str) {
    let env_filter = EnvFilter::try_new(rust_log).unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
