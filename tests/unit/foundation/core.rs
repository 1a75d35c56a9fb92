use super::*;

#[test]
fn size_spec_sorts_and_dedups() {
    let spec = SizeSpec::new([1200, 320, 640, 320, 2400]).unwrap();
    assert_eq!(spec.widths(), &[320, 640, 1200, 2400]);
}

#[test]
fn size_spec_rejects_empty_and_zero() {
    assert!(matches!(
        SizeSpec::new(Vec::<u32>::new()),
        Err(RespimgError::Validation(_))
    ));
    assert!(matches!(
        SizeSpec::new([320, 0]),
        Err(RespimgError::Validation(_))
    ));
}

#[test]
fn resolve_reject_reports_first_oversized_width() {
    let spec = SizeSpec::new([320, 640, 5000]).unwrap();
    let err = spec.resolve(2400, UpscalePolicy::Reject).unwrap_err();
    assert!(matches!(
        err,
        RespimgError::InvalidTargetWidth {
            width: 5000,
            source_width: 2400
        }
    ));

    let ok = spec.resolve(5000, UpscalePolicy::Reject).unwrap();
    assert_eq!(ok, spec);
}

#[test]
fn resolve_clamp_collapses_to_source_width() {
    let spec = SizeSpec::new([320, 2400, 3000, 5000]).unwrap();
    let clamped = spec.resolve(2400, UpscalePolicy::Clamp).unwrap();
    assert_eq!(clamped.widths(), &[320, 2400]);
}

#[test]
fn aspect_ratio_is_reduced() {
    let r = AspectRatio::from_dimensions(2400, 1600).unwrap();
    assert_eq!((r.num, r.den), (3, 2));
    assert!((r.as_f64() - 1.5).abs() < 1e-12);

    let r = AspectRatio::from_dimensions(7, 5).unwrap();
    assert_eq!((r.num, r.den), (7, 5));

    assert!(AspectRatio::from_dimensions(0, 5).is_err());
}

#[test]
fn output_format_parsing_and_naming() {
    assert_eq!("webp".parse::<OutputFormat>().unwrap(), OutputFormat::WebP);
    assert_eq!("JPG".parse::<OutputFormat>().unwrap(), OutputFormat::Jpeg);
    assert_eq!(
        "lossless".parse::<OutputFormat>().unwrap(),
        OutputFormat::Png
    );
    assert!("avif".parse::<OutputFormat>().is_err());

    assert_eq!(OutputFormat::Jpeg.extension(), "jpg");
    assert_eq!(OutputFormat::Jpeg.to_string(), "jpeg");
    assert_eq!(OutputFormat::WebP.mime(), "image/webp");
}

#[test]
fn output_format_serde_is_lowercase() {
    let json = serde_json::to_string(&OutputFormat::WebP).unwrap();
    assert_eq!(json, "\"webp\"");
    let back: OutputFormat = serde_json::from_str("\"jpg\"").unwrap();
    assert_eq!(back, OutputFormat::Jpeg);
}
