use localrag_core::config::{Config, EmbeddingProvider, DEFAULT_OVERFLOW_GROUP};
use localrag_core::error::Error;

#[test]
fn defaults_match_retrieval_pipeline_constants() {
    let settings = Config::from_toml_str("").settings().expect("settings");
    let r = &settings.retrieval;
    assert_eq!((r.summary_top_n, r.page_top_k, r.select_amount), (36, 12, 8));
    assert_eq!((r.chunk_top_n, r.chunk_top_k), (128, 40));
    assert_eq!(r.rewrite_count, 3);
    assert_eq!(r.history_limit, 12);
    assert_eq!(r.overflow_group, Some(DEFAULT_OVERFLOW_GROUP));
    assert_eq!(settings.chunking.min_informative_tokens, 10);
}

#[test]
fn toml_overrides_nested_sections() {
    let config = Config::from_toml_str(
        r#"
        [retrieval]
        select_amount = 4
        overflow_group = 3

        [embedding]
        provider = "fake"
        dimension = 64

        [llm]
        api_key = "sk-test"
        "#,
    );
    let settings = config.settings().expect("settings");
    assert_eq!(settings.retrieval.select_amount, 4);
    assert_eq!(settings.retrieval.page_top_k, 12, "untouched keys keep defaults");
    assert_eq!(settings.retrieval.overflow_group, Some(3));
    assert_eq!(settings.embedding.provider, EmbeddingProvider::Fake);
    assert_eq!(settings.llm.require_api_key().expect("key"), "sk-test");
    settings.validate().expect("valid");

    let select: usize = config.get("retrieval.select_amount").expect("get");
    assert_eq!(select, 4);
}

#[test]
fn missing_api_key_is_a_configuration_error() {
    let settings = Config::from_toml_str("").settings().expect("settings");
    assert!(matches!(settings.validate(), Err(Error::InvalidConfig(_))));

    let blank = Config::from_toml_str("[llm]\napi_key = \"  \"").settings().expect("settings");
    assert!(blank.llm.require_api_key().is_err());
}

#[test]
fn selection_larger_than_fused_pages_is_rejected() {
    let settings = Config::from_toml_str(
        "[retrieval]\nselect_amount = 20\n[embedding]\nprovider = \"fake\"",
    )
    .settings()
    .expect("settings");
    let err = settings.validate().expect_err("invalid");
    assert!(err.to_string().contains("select_amount"));
}

#[test]
fn zero_sized_parameters_are_rejected() {
    let settings = Config::from_toml_str("[retrieval]\nchunk_top_k = 0\n[embedding]\nprovider = \"local\"")
        .settings()
        .expect("settings");
    assert!(matches!(settings.validate(), Err(Error::InvalidConfig(m)) if m.contains("chunk_top_k")));
}
