use super::*;

#[test]
fn defaults_follow_loader_settings() {
    let cfg = PipelineConfig::default();
    assert_eq!(cfg.sizes, vec![320, 640, 960, 1200, 1800, 2400]);
    assert_eq!(cfg.formats, vec![OutputFormat::WebP]);
    assert_eq!(cfg.quality, 80);
    assert!(cfg.placeholder.enabled);
    assert_eq!(cfg.placeholder.width, 20);
    assert_eq!(cfg.naming, NamingMode::Hashed);
    assert_eq!(cfg.upscale, UpscalePolicy::Reject);
    assert_eq!(cfg.on_failure, FailurePolicy::Abort);
    cfg.validate().unwrap();
}

#[test]
fn partial_json_fills_in_defaults() {
    let cfg = PipelineConfig::from_json_str(
        r#"{ "sizes": [640, 320], "formats": ["webp", "jpg"], "placeholder": { "width": 16 },
             "upscale": "clamp", "on_failure": "skip-variant", "naming": "plain" }"#,
    )
    .unwrap();
    assert_eq!(cfg.size_spec().unwrap().widths(), &[320, 640]);
    assert_eq!(cfg.formats, vec![OutputFormat::WebP, OutputFormat::Jpeg]);
    assert_eq!(cfg.quality, 80);
    assert_eq!(cfg.placeholder.width, 16);
    assert_eq!(cfg.placeholder.quality, 20);
    assert_eq!(cfg.upscale, UpscalePolicy::Clamp);
    assert_eq!(cfg.on_failure, FailurePolicy::SkipVariant);
    assert_eq!(cfg.naming, NamingMode::Plain);
}

#[test]
fn unknown_fields_are_rejected() {
    let err = PipelineConfig::from_json_str(r#"{ "sizez": [1] }"#).unwrap_err();
    assert!(matches!(err, RespimgError::Serde(_)));
}

#[test]
fn validation_catches_bad_values() {
    let bad = [
        r#"{ "sizes": [] }"#,
        r#"{ "sizes": [0, 320] }"#,
        r#"{ "formats": [] }"#,
        r#"{ "formats": ["webp", "webp"] }"#,
        r#"{ "quality": 101 }"#,
        r#"{ "placeholder": { "quality": 200 } }"#,
        r#"{ "placeholder": { "width": 0 } }"#,
        r#"{ "threads": 0 }"#,
        r#"{ "formats": ["webp", "jpeg"], "quality": 0 }"#,
        r#"{ "formats": ["jpeg"], "placeholder": { "quality": 0 } }"#,
    ];
    for json in bad {
        let err = PipelineConfig::from_json_str(json).unwrap_err();
        assert!(
            matches!(err, RespimgError::Validation(_)),
            "{json} -> {err}"
        );
    }
}

#[test]
fn public_url_joins_with_single_slash() {
    let mut cfg = PipelineConfig::default();
    assert_eq!(cfg.public_url("a-320.webp"), "/a-320.webp");
    cfg.public_path = "/img".to_string();
    assert_eq!(cfg.public_url("a-320.webp"), "/img/a-320.webp");
    cfg.public_path = "https://cdn.example.com/img/".to_string();
    assert_eq!(
        cfg.public_url("a-320.webp"),
        "https://cdn.example.com/img/a-320.webp"
    );
    cfg.public_path = String::new();
    assert_eq!(cfg.public_url("a-320.webp"), "a-320.webp");
}

#[test]
fn from_path_reports_missing_file() {
    let err = PipelineConfig::from_path("target/does-not-exist/respimg.json").unwrap_err();
    assert!(err.to_string().contains("open pipeline config"));
}

#[test]
fn zero_quality_is_fine_without_jpeg() {
    let cfg = PipelineConfig::from_json_str(
        r#"{ "formats": ["webp", "png"], "quality": 0, "placeholder": { "quality": 0 } }"#,
    )
    .unwrap();
    assert_eq!(cfg.quality, 0);

    let cfg = PipelineConfig::from_json_str(
        r#"{ "formats": ["webp", "jpeg"], "placeholder": { "quality": 0 } }"#,
    )
    .unwrap();
    assert_eq!(cfg.placeholder.quality, 0);

    let cfg = PipelineConfig::from_json_str(
        r#"{ "formats": ["jpeg"], "placeholder": { "enabled": false, "quality": 0 } }"#,
    )
    .unwrap();
    assert!(!cfg.placeholder.enabled);
}
