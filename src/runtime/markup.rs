use maud::{Markup, html};

use crate::compile::manifest::{Manifest, VariantEntry};
use crate::foundation::core::OutputFormat;
use crate::foundation::error::RespimgResult;

/// `sizes` value used when the caller passes none.
pub const DEFAULT_SIZES_HINT: &str = "100vw";

/// What to render: a single URL, or a manifest of responsive variants.
#[derive(Clone, Copy, Debug)]
pub enum ImageSource<'a> {
    /// Plain URL with no responsive variants.
    Url(&'a str),
    /// Manifest produced by the build pipeline.
    Manifest(&'a Manifest),
}

impl<'a> From<&'a Manifest> for ImageSource<'a> {
    fn from(m: &'a Manifest) -> Self {
        Self::Manifest(m)
    }
}

impl<'a> From<&'a str> for ImageSource<'a> {
    fn from(url: &'a str) -> Self {
        Self::Url(url)
    }
}

/// Render `<img>` (or `<picture>`) markup for `src`.
///
/// A URL renders a bare `<img src alt>`. A manifest renders `srcset`/`sizes` from its
/// non-placeholder variants in ascending width, with `loading="lazy"`, and intrinsic dimensions
/// taken from the widest variant. With several formats, every format but the last becomes a
/// `<source>` inside a `<picture>` and the last one backs the fallback `<img>`.
///
/// A manifest that fails [`Manifest::validate`] is rejected instead of rendering empty markup.
/// Attribute values are HTML-escaped.
pub fn render(src: &ImageSource<'_>, alt: &str, sizes: Option<&str>) -> RespimgResult<String> {
    let markup = match *src {
        ImageSource::Url(url) => html! { img src=(url) alt=(alt); },
        ImageSource::Manifest(m) => {
            m.validate()?;
            render_manifest(m, alt, sizes.unwrap_or(DEFAULT_SIZES_HINT))
        }
    };
    Ok(markup.into_string())
}

fn render_manifest(m: &Manifest, alt: &str, sizes: &str) -> Markup {
    // Formats that lost every variant to a skipped failure are left out.
    let formats = m
        .formats
        .iter()
        .copied()
        .filter_map(|f| m.largest(f).map(|largest| (f, largest)))
        .collect::<Vec<_>>();
    // A validated manifest has at least one variant, and its format is listed.
    let Some((&(fallback, largest), sources)) = formats.split_last() else {
        return html! {};
    };

    let img = img_tag(m, fallback, largest, alt, sizes);
    if sources.is_empty() {
        return img;
    }
    html! {
        picture {
            @for (format, _) in sources {
                source type=(format.mime()) srcset=(m.srcset(*format)) sizes=(sizes);
            }
            (img)
        }
    }
}

fn img_tag(
    m: &Manifest,
    format: OutputFormat,
    largest: &VariantEntry,
    alt: &str,
    sizes: &str,
) -> Markup {
    html! {
        img src=(largest.url)
            srcset=(m.srcset(format))
            sizes=(sizes)
            width=(largest.width)
            height=(largest.height)
            alt=(alt)
            loading="lazy";
    }
}

#[cfg(test)]
#[path = "../../tests/unit/runtime/markup.rs"]
mod tests;
