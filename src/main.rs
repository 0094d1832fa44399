use std::env;
use std::sync::Arc;

use anyhow::Context;

use ragquery::{
    logging, ContextFormatter, FormatterConfig, HttpVectorStore, OpenAiEmbedder, RetrievalConfig,
    Retriever, RetrieverConfig, SimilaritySearch,
};

/// Run one retrieval query from the command line:
/// `ragquery "How does MongoDB Atlas handle security?" [keep_top]`
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let mut args = env::args().skip(1);
    let question = args
        .next()
        .context("usage: ragquery <question> [keep_top]")?;
    let keep_top = args.next().map(|raw| raw.parse::<usize>()).transpose()?;

    let config = RetrievalConfig::from_env().context("failed to load retrieval configuration")?;

    let embedder = Arc::new(OpenAiEmbedder::new(&config)?);
    let store = Arc::new(HttpVectorStore::new(&config)?);
    let search = SimilaritySearch::new(embedder, store);

    let mut retriever_config = RetrieverConfig::from(&config);
    if let Some(keep_top) = keep_top {
        retriever_config.keep_top = keep_top;
    }
    let retriever = Retriever::new(search, retriever_config)?;

    tracing::info!(
        collection = %config.collection,
        index = %config.index_name,
        "running retrieval query"
    );

    let hits = retriever.retrieve(&question).await?;
    if hits.is_empty() {
        println!("no matching documents");
        return Ok(());
    }

    for hit in &hits {
        println!("{:.4}  {}", hit.score, hit.document.id);
    }

    let formatter = ContextFormatter::new(FormatterConfig {
        include_citations: true,
    });
    println!("\n{}", formatter.format(&hits));

    Ok(())
}
