use std::sync::Arc;

use rayon::prelude::*;

use crate::assets::decode::SourceImage;
use crate::compile::fingerprint::OutputNamer;
use crate::compile::manifest::{Manifest, SourceInfo, Variant, VariantEntry};
use crate::compile::placeholder::{self, data_uri};
use crate::encode::codec::{Encoder, encoder_for};
use crate::foundation::config::{FailurePolicy, PipelineConfig};
use crate::foundation::core::{AspectRatio, OutputFormat};
use crate::foundation::error::{RespimgError, RespimgResult, VariantFailure};
use crate::transform::resize::resize;

/// Result of one build: the manifest plus every encoded file it references.
#[derive(Clone, Debug)]
pub struct ImageSet {
    /// Manifest for the runtime.
    pub manifest: Manifest,
    /// Full-size variants, in manifest order.
    pub variants: Vec<Variant>,
    /// Blur-up placeholder, unless disabled or skipped.
    pub placeholder: Option<Variant>,
}

impl ImageSet {
    /// Every file to write: variants first, then the placeholder.
    pub fn files(&self) -> impl Iterator<Item = &Variant> {
        self.variants.iter().chain(self.placeholder.as_ref())
    }
}

#[derive(Clone, Copy, Debug)]
struct Job {
    width: u32,
    format: OutputFormat,
    rank: usize,
}

/// Produces an [`ImageSet`] from a decoded source.
///
/// Each (width, format) pair is an independent job scheduled on a rayon pool; the only shared
/// input is the read-only [`SourceImage`]. Output ids and names are derived from content, so
/// scheduling order never shows up in the result.
#[derive(Clone)]
pub struct VariantManifestBuilder {
    cfg: PipelineConfig,
    overrides: Vec<Arc<dyn Encoder>>,
}

impl std::fmt::Debug for VariantManifestBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VariantManifestBuilder")
            .field("cfg", &self.cfg)
            .field(
                "overrides",
                &self.overrides.iter().map(|e| e.format()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl VariantManifestBuilder {
    /// Validate `cfg` and create a builder.
    pub fn new(cfg: PipelineConfig) -> RespimgResult<Self> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            overrides: Vec::new(),
        })
    }

    /// Replace the encoder used for `encoder.format()`.
    pub fn with_encoder(mut self, encoder: Arc<dyn Encoder>) -> Self {
        self.overrides.retain(|e| e.format() != encoder.format());
        self.overrides.push(encoder);
        self
    }

    /// The validated configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.cfg
    }

    fn encoder(&self, format: OutputFormat) -> &dyn Encoder {
        self.overrides
            .iter()
            .find(|e| e.format() == format)
            .map(|e| e.as_ref())
            .unwrap_or_else(|| encoder_for(format))
    }

    /// Build every configured variant of `src`, naming outputs after `name`.
    ///
    /// Errors:
    /// - [`RespimgError::InvalidTargetWidth`] for widths wider than the source under
    ///   [`UpscalePolicy::Reject`](crate::UpscalePolicy::Reject);
    /// - [`RespimgError::ManifestIncomplete`] when jobs fail under [`FailurePolicy::Abort`], or
    ///   when no variant survives under [`FailurePolicy::SkipVariant`].
    #[tracing::instrument(skip(self, src), fields(src_w = src.width(), src_h = src.height()))]
    pub fn build(&self, src: &SourceImage, name: &str) -> RespimgResult<ImageSet> {
        let sizes = self
            .cfg
            .size_spec()?
            .resolve(src.width(), self.cfg.upscale)?;
        let namer = OutputNamer::new(name, src.bytes(), self.cfg.naming)?;

        let jobs = sizes
            .widths()
            .iter()
            .flat_map(|&width| {
                self.cfg
                    .formats
                    .iter()
                    .enumerate()
                    .map(move |(rank, &format)| Job {
                        width,
                        format,
                        rank,
                    })
            })
            .collect::<Vec<_>>();
        let total = jobs.len() + usize::from(self.cfg.placeholder.enabled);

        let pool = build_thread_pool(self.cfg.threads)?;
        let (results, placeholder_res) = pool.install(|| {
            rayon::join(
                || {
                    jobs.par_iter()
                        .map(|job| (*job, self.run_job(src, &namer, job)))
                        .collect::<Vec<_>>()
                },
                || {
                    self.cfg.placeholder.enabled.then(|| {
                        placeholder::generate(
                            src,
                            &namer,
                            &self.cfg.placeholder,
                            self.encoder(self.cfg.formats[0]),
                        )
                    })
                },
            )
        });

        let mut failures = Vec::new();
        let mut done = Vec::with_capacity(results.len());
        for (job, res) in results {
            match res {
                Ok(v) => done.push((job.rank, v)),
                Err(e) => failures.push(VariantFailure {
                    width: job.width,
                    format: job.format,
                    reason: e.to_string(),
                }),
            }
        }
        let placeholder = match placeholder_res {
            Some(Ok(p)) => Some(p),
            Some(Err(e)) => {
                failures.push(VariantFailure {
                    width: placeholder::placeholder_width(src.width(), self.cfg.placeholder.width),
                    format: self.cfg.formats[0],
                    reason: format!("placeholder: {e}"),
                });
                None
            }
            None => None,
        };
        failures.sort_by_key(|f| (f.width, f.format));

        if !failures.is_empty() {
            match self.cfg.on_failure {
                FailurePolicy::Abort => {
                    return Err(RespimgError::ManifestIncomplete { total, failures });
                }
                FailurePolicy::SkipVariant => {
                    for f in &failures {
                        tracing::warn!(
                            width = f.width,
                            format = %f.format,
                            reason = %f.reason,
                            "skipping failed variant"
                        );
                    }
                    if done.is_empty() {
                        return Err(RespimgError::ManifestIncomplete { total, failures });
                    }
                }
            }
        }

        done.sort_by_key(|(rank, v)| (v.width, *rank));
        let variants = done.into_iter().map(|(_, v)| v).collect::<Vec<_>>();
        let manifest = self.assemble(src, name, &variants, placeholder.as_ref())?;

        tracing::info!(
            image = name,
            variants = variants.len(),
            placeholder = placeholder.is_some(),
            "built image set"
        );
        Ok(ImageSet {
            manifest,
            variants,
            placeholder,
        })
    }

    fn run_job(
        &self,
        src: &SourceImage,
        namer: &OutputNamer<'_>,
        job: &Job,
    ) -> RespimgResult<Variant> {
        let raster = resize(src, job.width)?;
        let encoded = self.encoder(job.format).encode(&raster, self.cfg.quality)?;
        tracing::debug!(
            width = job.width,
            format = %job.format,
            len = encoded.len(),
            "encoded variant"
        );
        Ok(namer.finish(raster.width(), raster.height(), job.format, false, encoded))
    }

    fn assemble(
        &self,
        src: &SourceImage,
        name: &str,
        variants: &[Variant],
        placeholder: Option<&Variant>,
    ) -> RespimgResult<Manifest> {
        let entries = variants
            .iter()
            .map(|v| v.entry(self.cfg.public_url(&v.file_name)))
            .collect::<Vec<VariantEntry>>();
        let placeholder = placeholder.map(|p| VariantEntry {
            data_uri: Some(data_uri(p)),
            ..p.entry(self.cfg.public_url(&p.file_name))
        });

        let manifest = Manifest {
            name: name.to_string(),
            source: SourceInfo {
                width: src.width(),
                height: src.height(),
                format: src.format(),
            },
            aspect_ratio: AspectRatio::from_dimensions(src.width(), src.height())?,
            formats: self.cfg.formats.clone(),
            variants: entries,
            placeholder,
        };
        manifest.validate()?;
        Ok(manifest)
    }
}

/// Build an [`ImageSet`] for `src` with `cfg`.
pub fn build_image_set(
    src: &SourceImage,
    name: &str,
    cfg: &PipelineConfig,
) -> RespimgResult<ImageSet> {
    VariantManifestBuilder::new(cfg.clone())?.build(src, name)
}

fn build_thread_pool(threads: Option<usize>) -> RespimgResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(RespimgError::validation("threads must be >= 1 when set"));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| RespimgError::validation(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/compile/builder.rs"]
mod tests;
