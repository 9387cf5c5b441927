use super::*;
use serial_test::serial;

#[test]
fn roles_serialize_lowercase() {
    let messages = vec![
        ChatMessage::system("rules"),
        ChatMessage::user("question"),
        ChatMessage::assistant("answer"),
    ];

    let json = serde_json::to_string(&messages).expect("messages should serialize");
    assert_eq!(
        json,
        r#"[{"role":"system","content":"rules"},{"role":"user","content":"question"},{"role":"assistant","content":"answer"}]"#
    );
    assert_eq!(Role::Assistant.to_string(), "assistant");
}

#[test]
fn build_model_selects_ollama() {
    let mut config = Config::default();
    config.llm.provider = LlmProvider::Ollama;
    config.llm.model = "llama3:8b".to_string();

    let model = build_model(&config).expect("ollama model should build");
    assert_eq!(model.model_name(), "llama3:8b");
}

#[test]
#[serial]
fn build_model_requires_api_key_for_groq() {
    let mut config = Config::default();
    config.llm.api_key_env = "RAG_CHAT_TEST_KEY_THAT_IS_NEVER_SET".to_string();

    let error = build_model(&config).err().expect("missing key should fail");
    assert!(matches!(error, crate::RagError::Config(ref msg) if msg.contains("RAG_CHAT_TEST_KEY_THAT_IS_NEVER_SET")));
}

#[test]
#[serial]
fn build_model_reads_api_key_from_environment() {
    let var = "RAG_CHAT_TEST_GROQ_KEY";
    // SAFETY: serialized with the other environment tests
    unsafe { std::env::set_var(var, "secret") };

    let mut config = Config::default();
    config.llm.api_key_env = var.to_string();
    let result = build_model(&config);

    // SAFETY: serialized with the other environment tests
    unsafe { std::env::remove_var(var) };

    let model = result.expect("groq model should build");
    assert_eq!(model.model_name(), "llama3-70b-8192");
}
