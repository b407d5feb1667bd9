use access_audit::config::Config;

#[test]
fn parse_example_config() {
    let raw = include_str!("../access-audit.example.toml");
    let cfg: Config = toml::from_str(raw).expect("parse TOML");
    assert!(!cfg.paths.out_dir.is_empty());
    assert_eq!(cfg.timing.scan_wait_seconds, 40);
    assert_eq!(cfg.timing.inter_url_delay_seconds, 2);
    assert!(!cfg.programs.is_empty());
    assert!(cfg.programs.iter().all(|p| !p.pages.is_empty()));
}

#[test]
fn missing_sections_fall_back_to_defaults() {
    let cfg: Config = toml::from_str("[timing]\nscan_wait_seconds = 5\ninter_url_delay_seconds = 0\n")
        .expect("parse TOML");
    assert_eq!(cfg.timing.scan_wait_seconds, 5);
    assert_eq!(cfg.backend.base_url, "https://acsbace.com");
    assert_eq!(cfg.schema.status_key, "scanStatus");
    assert_eq!(cfg.security.allowed_schemes, vec!["http", "https"]);
    assert!(cfg.programs.is_empty());
}
