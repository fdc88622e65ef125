use std::env;

use localrag_chunk::{counter_from_settings, DocumentProcessor};
use localrag_cli::{load_settings, CliArgs};

fn main() -> anyhow::Result<()> {
    let settings = load_settings()?;
    let args = CliArgs::parse(env::args().skip(1), &[])?;
    let markdown_dir = args.dir_or(settings.data.markdown_dir());

    let counter = counter_from_settings(&settings.chunking)?;
    let processor = DocumentProcessor::new(counter.as_ref()).with_min_informative_tokens(settings.chunking.min_informative_tokens);
    let stats = processor.collect_stats(&markdown_dir)?;
    print!("{stats}");
    Ok(())
}
