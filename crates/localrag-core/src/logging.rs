//! Tracing initialisation shared by the binaries.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Install the global subscriber once.
///
/// Filter directives come from `APP_LOG` (e.g. `APP_LOG=localrag_retrieve=debug`),
/// falling back to `info` for the workspace crates.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env("APP_LOG").unwrap_or_else(|_| {
            EnvFilter::new(
                "localrag_core=info,localrag_chunk=info,localrag_embed=info,localrag_vector=info,\
                 localrag_graph=info,localrag_llm=info,localrag_retrieve=info,localrag_cli=info",
            )
        });
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .with(filter)
            .init();
    });
}
