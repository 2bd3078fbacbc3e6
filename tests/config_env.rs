//! Configuration loading from file + environment. Kept to a single test since it mutates process env.

use maturity_advisor::config::Config;

#[test]
fn file_then_env_overrides_then_validation() {
    let dir = std::env::temp_dir().join(format!("maturity-advisor-cfg-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("maturity_advisor.toml");
    std::fs::write(
        &path,
        r#"
[provider]
base_url = "http://localhost:8080/v1"
model = "from-file"

[generation]
roadmap_temperature = 0.2
"#,
    )
    .unwrap();

    // SAFETY: this test binary has a single test, so nothing else reads the environment concurrently.
    unsafe {
        std::env::set_var("MATURITY_ENV_FILE", dir.join("missing.env"));
        std::env::set_var("MATURITY_ADVISOR_CONFIG", &path);
        std::env::set_var("MATURITY_MODEL", "from-env");
        std::env::set_var("MATURITY_CARD_MAX_TOKENS", "999999");
        std::env::set_var("OPENAI_API_KEY", "sk-test");
        std::env::set_var("RUST_LOG", "maturity_advisor=debug");
        std::env::remove_var("MATURITY_BASE_URL");
    }

    let cfg = Config::load().unwrap();
    assert_eq!(cfg.provider.base_url, "http://localhost:8080/v1");
    assert_eq!(cfg.provider.model, "from-env");
    assert_eq!(cfg.generation.card_max_tokens, 16_000);
    assert_eq!(cfg.generation.roadmap_temperature, 0.2);
    assert_eq!(cfg.runtime.openai_api_key.as_deref(), Some("sk-test"));
    assert_eq!(cfg.runtime.log_level, "maturity_advisor=debug");

    let _ = std::fs::remove_dir_all(&dir);
}
