use std::env;
use std::fs;

use localrag_chunk::{counter_from_settings, DocumentProcessor, PageManifest};
use localrag_cli::{build_embedder, load_settings, CliArgs};
use localrag_graph::GraphSnapshot;
use localrag_vector::{embed_with_progress, LanceVectorStore};

const EMBED_BATCH: usize = 64;

fn main() -> anyhow::Result<()> {
    let settings = load_settings()?;
    let args = CliArgs::parse(env::args().skip(1), &["--skip-vectors"])?;
    let markdown_dir = args.dir_or(settings.data.markdown_dir());
    let skip_vectors = args.has("--skip-vectors");
    if !skip_vectors {
        settings.validate()?;
    }

    println!("localrag indexer\n================");
    println!("Markdown directory: {}", markdown_dir.display());

    let counter = counter_from_settings(&settings.chunking)?;
    let manifest = PageManifest::load(&settings.data.pages_manifest())?;
    let processor = DocumentProcessor::new(counter.as_ref()).with_min_informative_tokens(settings.chunking.min_informative_tokens);
    let corpus = processor.process_directory(&markdown_dir, &manifest)?;
    println!("Pages: {}  Chunks: {}", corpus.pages.len(), corpus.chunks.len());

    let snapshot = GraphSnapshot::new(corpus.pages, corpus.chunks);
    snapshot.save(&settings.data.graph_path())?;

    if skip_vectors {
        println!("Skipping vector indexing (--skip-vectors)");
        return Ok(());
    }
    if snapshot.pages.is_empty() {
        tracing::warn!("nothing to embed");
        return Ok(());
    }

    let embedder = build_embedder(&settings)?;
    let summaries: Vec<String> = snapshot.pages.iter().map(|p| p.summary.clone()).collect();
    let contents: Vec<String> = snapshot.chunks.iter().map(|c| c.content.clone()).collect();
    let summary_vectors = embed_with_progress(embedder.as_ref(), &summaries, EMBED_BATCH, "summaries")?;
    let chunk_vectors = embed_with_progress(embedder.as_ref(), &contents, EMBED_BATCH, "chunks")?;

    let lancedb_dir = settings.data.lancedb_dir();
    fs::create_dir_all(&lancedb_dir)?;
    let store = LanceVectorStore::open(&lancedb_dir)?;
    let retrieval = &settings.retrieval;
    store.write_summaries(&retrieval.summaries_collection, &snapshot.pages, &summary_vectors)?;
    store.write_chunks(&retrieval.chunks_collection, &snapshot.chunks, &chunk_vectors)?;

    println!("\nIndexing completed: {} summaries, {} chunks", summary_vectors.len(), chunk_vectors.len());
    Ok(())
}
