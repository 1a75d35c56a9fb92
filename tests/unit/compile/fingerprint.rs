use super::*;

#[test]
fn source_digest_is_stable_and_content_sensitive() {
    assert_eq!(source_digest(b"abc"), source_digest(b"abc"));
    assert_ne!(source_digest(b"abc"), source_digest(b"abd"));
    assert_ne!(source_digest(b""), source_digest(b"\0"));
}

#[test]
fn output_id_depends_on_every_input() {
    let src = source_digest(b"source");
    let base = output_id(src, 320, OutputFormat::WebP, false, b"bytes");
    assert_eq!(base, output_id(src, 320, OutputFormat::WebP, false, b"bytes"));

    let others = [
        output_id(source_digest(b"other"), 320, OutputFormat::WebP, false, b"bytes"),
        output_id(src, 640, OutputFormat::WebP, false, b"bytes"),
        output_id(src, 320, OutputFormat::Jpeg, false, b"bytes"),
        output_id(src, 320, OutputFormat::WebP, true, b"bytes"),
        output_id(src, 320, OutputFormat::WebP, false, b"bytez"),
    ];
    for o in others {
        assert_ne!(o, base);
    }
}

#[test]
fn hex_forms_have_fixed_width() {
    let id = output_id(source_digest(b"x"), 1, OutputFormat::Png, false, b"y");
    let hex = id.to_hex();
    assert_eq!(hex.len(), 32);
    assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    assert_eq!(id.short(), hex[..8]);
    assert_eq!(id.to_string(), hex);
}

#[test]
fn namer_builds_hashed_and_plain_file_names() {
    let hashed = OutputNamer::new("photo", b"src", NamingMode::Hashed).unwrap();
    let v = hashed.finish(320, 213, OutputFormat::WebP, false, vec![1, 2, 3]);
    assert_eq!(v.file_name, format!("photo-320-{}.webp", v.id.short()));
    assert!(!v.placeholder);

    let p = hashed.finish(20, 13, OutputFormat::WebP, true, vec![1, 2, 3]);
    assert_eq!(p.file_name, format!("photo-placeholder-20-{}.webp", p.id.short()));
    assert_ne!(p.id, v.id);

    let plain = OutputNamer::new("photo", b"src", NamingMode::Plain).unwrap();
    let v = plain.finish(640, 427, OutputFormat::Jpeg, false, vec![9]);
    assert_eq!(v.file_name, "photo-640.jpg");
}

#[test]
fn namer_rejects_unsafe_base_names() {
    for bad in ["", ".", "..", "a/b", "a\\b", "two words", "x\"y", "<img>"] {
        assert!(
            OutputNamer::new(bad, b"src", NamingMode::Hashed).is_err(),
            "{bad:?}"
        );
    }
    OutputNamer::new("hero_image.v2", b"src", NamingMode::Hashed).unwrap();
}
