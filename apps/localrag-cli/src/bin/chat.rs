use std::env;
use std::io::{self, Write};
use std::sync::Arc;

use localrag_cli::{build_embedder, load_settings, CliArgs};
use localrag_core::types::Message;
use localrag_graph::FileGraphStore;
use localrag_llm::OpenAiClient;
use localrag_retrieve::{ChatOptions, ChatService, Retriever};
use localrag_vector::LanceVectorStore;

fn main() -> anyhow::Result<()> {
    let settings = load_settings()?;
    let args = CliArgs::parse(env::args().skip(1), &["--context-only"])?;
    let Some(question) = args.positional.first() else {
        eprintln!("Usage: localrag-chat \"<question>\" [--context-only]");
        std::process::exit(1);
    };
    settings.validate()?;

    let llm = Arc::new(OpenAiClient::new(&settings.llm, &settings.embedding)?);
    let retriever = Retriever::new(
        build_embedder(&settings)?,
        Arc::new(LanceVectorStore::open(&settings.data.lancedb_dir())?),
        Arc::new(FileGraphStore::open(&settings.data.graph_path())?),
        settings.retrieval.clone(),
    );
    let service = ChatService::new(retriever, llm.clone(), llm, ChatOptions::from_settings(&settings));
    let conversation = [Message::user(question.as_str())];

    if args.has("--context-only") {
        let prepared = service.prepare(&conversation)?;
        println!("Rewritten queries: {:?}\n", prepared.queries);
        match prepared.context {
            Some(context) => println!("{}", context.render()),
            None => println!("(retrieval not needed)"),
        }
        return Ok(());
    }

    let mut stdout = io::stdout().lock();
    for delta in service.respond(&conversation)? {
        write!(stdout, "{}", delta?)?;
        stdout.flush()?;
    }
    writeln!(stdout)?;
    Ok(())
}
