use std::io::{BufRead, Write};
use std::sync::Arc;

use qhelper::{
    ConversationStore, CorpusIndex, DEFAULT_PROFILE_ID, GenerationBackend, ModelCatalog,
    OllamaClient, QHelperConfig, build_answerer, load_corpus,
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::from_default_env().add_directive("qhelper=info".parse()?),
        )
        .init();

    let config = QHelperConfig::from_env();

    let pairs = load_corpus(&config.corpus_path)?;
    let index = Arc::new(match &config.vector_cache_path {
        Some(cache) => CorpusIndex::build_cached(pairs, cache, config.force_regenerate_vectors)?,
        None => CorpusIndex::build(pairs),
    });

    let backend: Arc<dyn GenerationBackend> = Arc::new(OllamaClient::new(
        config.ollama_url.clone(),
        config.timeout,
        config.stream,
    ));
    let mut catalog = ModelCatalog::new(
        config.preferred_models.clone(),
        config.default_model.clone(),
    );
    catalog.discover(&backend).await;

    let store = Arc::new(ConversationStore::new(config.history_capacity));
    let answerer = build_answerer(&config, index, store, backend, &catalog);

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let query = line.trim();
        if query.is_empty() || query == "exit" || query == "quit" {
            break;
        }

        let result = answerer.answer(query, None, DEFAULT_PROFILE_ID).await;
        writeln!(
            stdout,
            "[{} | confidence {:.3}] {}",
            result.method, result.confidence, result.answer
        )?;
        if !result.similar_questions.is_empty() {
            writeln!(stdout, "    related: {}", result.similar_questions.join(" | "))?;
        }
    }

    Ok(())
}
