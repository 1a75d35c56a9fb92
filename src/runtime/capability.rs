use std::future::Future;
use std::pin::Pin;

use crate::foundation::error::{RespimgError, RespimgResult};
use crate::runtime::markup::{self, ImageSource};

/// In-flight polyfill fetch returned by [`LazyLoadHost::fetch_polyfill`].
pub type PolyfillFetch = Pin<Box<dyn Future<Output = Result<(), String>>>>;

/// Environment the runtime is bootstrapped in.
pub trait LazyLoadHost {
    /// Whether the host lazy-loads images natively. Must not suspend.
    fn probe_native_lazy_loading(&self) -> Result<bool, String>;

    /// Start fetching the lazy-loading polyfill.
    fn fetch_polyfill(&self) -> PolyfillFetch;
}

/// Outcome of capability resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capability {
    /// Native lazy-loading is available; no polyfill was fetched.
    NativeSupported,
    /// The polyfill was fetched and is ready.
    PolyfillReady,
}

/// Where a [`CapabilityLoader`] is in its lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CapabilityState {
    /// Not probed yet.
    #[default]
    Unknown,
    /// Probe reported native support.
    NativeSupported,
    /// Polyfill fetch issued but not completed.
    PolyfillLoading,
    /// Polyfill fetch completed.
    PolyfillReady,
}

impl CapabilityState {
    /// Resolved capability, if any.
    pub fn capability(self) -> Option<Capability> {
        match self {
            Self::NativeSupported => Some(Capability::NativeSupported),
            Self::PolyfillReady => Some(Capability::PolyfillReady),
            Self::Unknown | Self::PolyfillLoading => None,
        }
    }
}

/// Result of [`CapabilityLoader::resolve`].
#[derive(Debug)]
pub enum Resolution<'a> {
    /// Resolved without suspending.
    Ready(Capability),
    /// Polyfill fetch in flight; await [`PolyfillTask::wait`] before rendering.
    Pending(PolyfillTask<'a>),
}

/// The single polyfill fetch issued by a loader.
pub struct PolyfillTask<'a> {
    fetch: PolyfillFetch,
    state: &'a mut CapabilityState,
}

impl std::fmt::Debug for PolyfillTask<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolyfillTask")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl PolyfillTask<'_> {
    /// Wait for the fetch to finish.
    ///
    /// A failed fetch is returned as [`RespimgError::PolyfillLoadFailure`] and is not retried;
    /// the loader stays in [`CapabilityState::PolyfillLoading`].
    pub async fn wait(self) -> RespimgResult<Capability> {
        match self.fetch.await {
            Ok(()) => {
                *self.state = CapabilityState::PolyfillReady;
                tracing::debug!("polyfill ready");
                Ok(Capability::PolyfillReady)
            }
            Err(e) => Err(RespimgError::polyfill_load(e)),
        }
    }
}

/// Probes a [`LazyLoadHost`] once and fetches the polyfill at most once.
#[derive(Debug)]
pub struct CapabilityLoader<H> {
    host: H,
    state: CapabilityState,
}

impl<H: LazyLoadHost> CapabilityLoader<H> {
    /// Loader in [`CapabilityState::Unknown`].
    pub fn new(host: H) -> Self {
        Self {
            host,
            state: CapabilityState::Unknown,
        }
    }

    /// Current state.
    pub fn state(&self) -> CapabilityState {
        self.state
    }

    /// The wrapped host.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Probe the host, or return the cached capability once resolved.
    ///
    /// Native support resolves immediately with no fetch. Otherwise exactly one polyfill fetch
    /// is issued and handed back as a [`PolyfillTask`]. A loader whose fetch was dropped or
    /// failed does not fetch again.
    pub fn resolve(&mut self) -> RespimgResult<Resolution<'_>> {
        match self.state {
            CapabilityState::NativeSupported => Ok(Resolution::Ready(Capability::NativeSupported)),
            CapabilityState::PolyfillReady => Ok(Resolution::Ready(Capability::PolyfillReady)),
            CapabilityState::PolyfillLoading => Err(RespimgError::polyfill_load(
                "polyfill fetch already issued and did not complete",
            )),
            CapabilityState::Unknown => {
                let native = self
                    .host
                    .probe_native_lazy_loading()
                    .map_err(RespimgError::capability_probe)?;
                if native {
                    tracing::debug!("native lazy-loading supported");
                    self.state = CapabilityState::NativeSupported;
                    return Ok(Resolution::Ready(Capability::NativeSupported));
                }

                tracing::debug!("native lazy-loading unsupported; fetching polyfill");
                self.state = CapabilityState::PolyfillLoading;
                let fetch = self.host.fetch_polyfill();
                Ok(Resolution::Pending(PolyfillTask {
                    fetch,
                    state: &mut self.state,
                }))
            }
        }
    }

    /// Resolve and, if needed, wait for the polyfill.
    pub async fn ready(&mut self) -> RespimgResult<Capability> {
        match self.resolve()? {
            Resolution::Ready(c) => Ok(c),
            Resolution::Pending(task) => task.wait().await,
        }
    }
}

/// Markup renderer available only once capability is resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Renderer {
    capability: Capability,
}

impl Renderer {
    /// Renderer for a resolved `capability`.
    pub fn new(capability: Capability) -> Self {
        Self { capability }
    }

    /// Capability this renderer was created with.
    pub fn capability(&self) -> Capability {
        self.capability
    }

    /// See [`markup::render`].
    pub fn render(
        &self,
        src: &ImageSource<'_>,
        alt: &str,
        sizes: Option<&str>,
    ) -> RespimgResult<String> {
        markup::render(src, alt, sizes)
    }
}

/// Resolve capability on `host`, blocking on the polyfill fetch if needed, then run `f`.
///
/// Probe and fetch failures are returned without calling `f`.
pub fn bootstrap<H, T>(host: H, f: impl FnOnce(&Renderer) -> T) -> RespimgResult<T>
where
    H: LazyLoadHost,
{
    let mut loader = CapabilityLoader::new(host);
    let capability = pollster::block_on(loader.ready())?;
    tracing::info!(?capability, "image runtime ready");
    Ok(f(&Renderer::new(capability)))
}

#[cfg(test)]
#[path = "../../tests/unit/runtime/capability.rs"]
mod tests;
