use localrag_core::types::PageContext;

/// Pages selected for a request, in rerank order, each with at least one chunk.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievedContext {
    pub pages: Vec<PageContext>,
}

impl RetrievedContext {
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn chunk_count(&self) -> usize {
        self.pages.iter().map(|p| p.chunks.len()).sum()
    }

    /// Prompt text: per page the summary, then its chunks in ordinal order.
    pub fn render(&self) -> String {
        let pages: Vec<String> = self.pages.iter().map(render_page).collect();
        pages.join("\n\n").trim().to_string()
    }
}

fn render_page(page: &PageContext) -> String {
    let content: String = page.chunks.iter().map(|c| c.content.as_str()).collect();
    format!(
        "# Page summary (URL: {}):\n{}\n\n# Relevant content from the page:\n\n{}",
        page.url, page.summary, content
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use localrag_core::types::ChunkContent;

    fn page(id: &str, chunks: &[&str]) -> PageContext {
        PageContext {
            page_id: id.into(),
            url: format!("https://example.org/{id}"),
            summary: format!("About {id}."),
            chunks: chunks
                .iter()
                .zip(1u32..)
                .map(|(c, ordinal)| ChunkContent { chunk_id: format!("{id}-{ordinal}"), content: c.to_string(), ordinal })
                .collect(),
        }
    }

    #[test]
    fn renders_pages_in_order() {
        let ctx = RetrievedContext { pages: vec![page("a", &["one\n", "two\n"]), page("b", &["three\n\n"])] };
        assert_eq!(
            ctx.render(),
            "# Page summary (URL: https://example.org/a):\nAbout a.\n\n# Relevant content from the page:\n\none\ntwo\n\n\n\
             # Page summary (URL: https://example.org/b):\nAbout b.\n\n# Relevant content from the page:\n\nthree"
        );
        assert_eq!(ctx.chunk_count(), 3);
    }

    #[test]
    fn empty_context_renders_empty() {
        assert_eq!(RetrievedContext::default().render(), "");
    }
}
