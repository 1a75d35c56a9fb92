use std::cell::Cell;
use std::rc::Rc;

use super::*;
use crate::compile::manifest::Manifest;

#[derive(Clone, Default)]
struct MockHost {
    native: Option<bool>,
    fetch_fails: bool,
    probes: Rc<Cell<usize>>,
    fetches: Rc<Cell<usize>>,
}

impl MockHost {
    fn native() -> Self {
        Self {
            native: Some(true),
            ..Self::default()
        }
    }

    fn legacy() -> Self {
        Self {
            native: Some(false),
            ..Self::default()
        }
    }
}

impl LazyLoadHost for MockHost {
    fn probe_native_lazy_loading(&self) -> Result<bool, String> {
        self.probes.set(self.probes.get() + 1);
        self.native.ok_or_else(|| "no HTMLImageElement".to_string())
    }

    fn fetch_polyfill(&self) -> PolyfillFetch {
        self.fetches.set(self.fetches.get() + 1);
        let fails = self.fetch_fails;
        Box::pin(async move {
            if fails {
                Err("404 lazysizes".to_string())
            } else {
                Ok(())
            }
        })
    }
}

#[test]
fn native_support_resolves_without_fetching() {
    let host = MockHost::native();
    let mut loader = CapabilityLoader::new(host.clone());
    assert_eq!(loader.state(), CapabilityState::Unknown);

    let res = loader.resolve().unwrap();
    assert!(matches!(res, Resolution::Ready(Capability::NativeSupported)));
    assert_eq!(loader.state(), CapabilityState::NativeSupported);
    assert_eq!(host.fetches.get(), 0);
}

#[test]
fn missing_support_issues_exactly_one_fetch() {
    let host = MockHost::legacy();
    let mut loader = CapabilityLoader::new(host.clone());

    let Resolution::Pending(task) = loader.resolve().unwrap() else {
        panic!("expected a pending polyfill fetch");
    };
    assert_eq!(host.fetches.get(), 1);
    let cap = pollster::block_on(task.wait()).unwrap();
    assert_eq!(cap, Capability::PolyfillReady);
    assert_eq!(loader.state(), CapabilityState::PolyfillReady);

    assert!(matches!(
        loader.resolve().unwrap(),
        Resolution::Ready(Capability::PolyfillReady)
    ));
    assert_eq!(host.fetches.get(), 1);
    assert_eq!(host.probes.get(), 1);
}

#[test]
fn resolved_capability_is_cached() {
    let host = MockHost::native();
    let mut loader = CapabilityLoader::new(host.clone());
    for _ in 0..3 {
        assert_eq!(
            pollster::block_on(loader.ready()).unwrap(),
            Capability::NativeSupported
        );
    }
    assert_eq!(host.probes.get(), 1);
}

#[test]
fn probe_error_is_surfaced() {
    let mut loader = CapabilityLoader::new(MockHost::default());
    let err = loader.resolve().unwrap_err();
    assert!(matches!(err, RespimgError::CapabilityProbeFailure(ref m) if m.contains("HTMLImageElement")));
    assert_eq!(loader.state(), CapabilityState::Unknown);
}

#[test]
fn polyfill_failure_is_fatal_and_not_retried() {
    let host = MockHost {
        fetch_fails: true,
        ..MockHost::legacy()
    };
    let mut loader = CapabilityLoader::new(host.clone());

    let err = pollster::block_on(loader.ready()).unwrap_err();
    assert!(matches!(err, RespimgError::PolyfillLoadFailure(ref m) if m.contains("404")));
    assert_eq!(loader.state(), CapabilityState::PolyfillLoading);

    assert!(matches!(
        loader.resolve(),
        Err(RespimgError::PolyfillLoadFailure(_))
    ));
    assert_eq!(host.fetches.get(), 1);
}

#[test]
fn state_maps_to_capability() {
    assert_eq!(CapabilityState::Unknown.capability(), None);
    assert_eq!(CapabilityState::PolyfillLoading.capability(), None);
    assert_eq!(
        CapabilityState::NativeSupported.capability(),
        Some(Capability::NativeSupported)
    );
    assert_eq!(
        CapabilityState::PolyfillReady.capability(),
        Some(Capability::PolyfillReady)
    );
}

#[test]
fn bootstrap_renders_after_polyfill() {
    let host = MockHost::legacy();
    let fetches = host.fetches.clone();
    let html = bootstrap(host, |r| {
        assert_eq!(fetches.get(), 1);
        assert_eq!(r.capability(), Capability::PolyfillReady);
        r.render(&ImageSource::Url("/hero.jpg"), "Hero", None)
    })
    .unwrap()
    .unwrap();
    assert_eq!(html, r#"<img src="/hero.jpg" alt="Hero">"#);
}

#[test]
fn bootstrap_does_not_render_on_failure() {
    let host = MockHost {
        fetch_fails: true,
        ..MockHost::legacy()
    };
    let mut rendered = false;
    let res = bootstrap(host, |_| rendered = true);
    assert!(res.is_err());
    assert!(!rendered);
}

#[test]
fn renderer_uses_manifest_markup() {
    let json = r#"{
        "name": "p",
        "source": {"width": 100, "height": 50, "format": "png"},
        "aspect_ratio": {"num": 2, "den": 1},
        "formats": ["webp"],
        "variants": [
            {"width": 50, "height": 25, "format": "webp", "url": "/p-50.webp", "id": "00", "bytes": 1},
            {"width": 100, "height": 50, "format": "webp", "url": "/p-100.webp", "id": "01", "bytes": 2}
        ]
    }"#;
    let m = Manifest::from_json_str(json).unwrap();
    let r = Renderer::new(Capability::NativeSupported);
    let html = r
        .render(&ImageSource::Manifest(&m), "p", Some("50vw"))
        .unwrap();
    assert_eq!(
        html,
        markup::render(&ImageSource::Manifest(&m), "p", Some("50vw")).unwrap()
    );
    assert!(html.contains(r#"srcset="/p-50.webp 50w, /p-100.webp 100w""#));
}
