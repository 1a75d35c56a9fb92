use std::fmt;

use xxhash_rust::xxh3::Xxh3;

use crate::compile::manifest::Variant;
use crate::foundation::config::NamingMode;
use crate::foundation::core::OutputFormat;
use crate::foundation::error::{RespimgError, RespimgResult};

const XXH3_SEED: u64 = 0x5e7a_91c3_d04b_f26d;

/// Stable digest of a source file's encoded bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct ContentDigest {
    pub(crate) hi: u64,
    pub(crate) lo: u64,
}

/// Deterministic identifier of one generated file.
///
/// Derived from (source content, width, format, placeholder flag, encoded bytes) only, so it is
/// independent of build ordering and thread scheduling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OutputId {
    hi: u64,
    lo: u64,
}

impl OutputId {
    /// 32 lowercase hex digits.
    pub fn to_hex(self) -> String {
        format!("{:016x}{:016x}", self.hi, self.lo)
    }

    /// First 8 hex digits, as used in hashed file names.
    pub fn short(self) -> String {
        format!("{:08x}", self.hi >> 32)
    }
}

impl fmt::Display for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

pub(crate) fn source_digest(bytes: &[u8]) -> ContentDigest {
    let mut h = StableHasher::new();
    h.write_u8(b'S');
    h.write_u64(bytes.len() as u64);
    h.write_bytes(bytes);
    let (hi, lo) = h.finish();
    ContentDigest { hi, lo }
}

pub(crate) fn output_id(
    source: ContentDigest,
    width: u32,
    format: OutputFormat,
    placeholder: bool,
    encoded: &[u8],
) -> OutputId {
    let mut h = StableHasher::new();
    h.write_u8(b'V');
    h.write_u64(source.hi);
    h.write_u64(source.lo);
    h.write_u32(width);
    h.write_u8(format.tag());
    h.write_bool(placeholder);
    h.write_u64(encoded.len() as u64);
    h.write_bytes(encoded);
    let (hi, lo) = h.finish();
    OutputId { hi, lo }
}

/// Assigns ids and file names to encoded outputs of one source image.
#[derive(Clone, Debug)]
pub(crate) struct OutputNamer<'a> {
    name: &'a str,
    source: ContentDigest,
    mode: NamingMode,
}

impl<'a> OutputNamer<'a> {
    pub(crate) fn new(name: &'a str, source_bytes: &[u8], mode: NamingMode) -> RespimgResult<Self> {
        validate_base_name(name)?;
        Ok(Self {
            name,
            source: source_digest(source_bytes),
            mode,
        })
    }

    pub(crate) fn finish(
        &self,
        width: u32,
        height: u32,
        format: OutputFormat,
        placeholder: bool,
        encoded: Vec<u8>,
    ) -> Variant {
        let id = output_id(self.source, width, format, placeholder, &encoded);
        let kind = if placeholder { "-placeholder" } else { "" };
        let file_name = match self.mode {
            NamingMode::Hashed => format!(
                "{}{kind}-{width}-{}.{}",
                self.name,
                id.short(),
                format.extension()
            ),
            NamingMode::Plain => format!("{}{kind}-{width}.{}", self.name, format.extension()),
        };
        Variant {
            width,
            height,
            format,
            id,
            file_name,
            placeholder,
            encoded,
        }
    }
}

/// Base names end up in file names and URLs, so path separators and blanks are refused.
pub(crate) fn validate_base_name(name: &str) -> RespimgResult<()> {
    if name.is_empty() {
        return Err(RespimgError::validation("output base name must be non-empty"));
    }
    if name == "." || name == ".." {
        return Err(RespimgError::validation(format!(
            "output base name '{name}' is not a file name"
        )));
    }
    if let Some(c) = name
        .chars()
        .find(|&c| matches!(c, '/' | '\\' | '"' | '<' | '>') || c.is_whitespace() || c.is_control())
    {
        return Err(RespimgError::validation(format!(
            "output base name '{name}' contains invalid character {c:?}"
        )));
    }
    Ok(())
}

struct StableHasher {
    inner: Xxh3,
}

impl StableHasher {
    fn new() -> Self {
        Self {
            inner: Xxh3::with_seed(XXH3_SEED),
        }
    }

    fn write_bytes(&mut self, b: &[u8]) {
        self.inner.update(b);
    }

    fn write_u8(&mut self, v: u8) {
        self.write_bytes(&[v]);
    }

    fn write_bool(&mut self, v: bool) {
        self.write_u8(u8::from(v));
    }

    fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn finish(self) -> (u64, u64) {
        let v = self.inner.digest128();
        ((v >> 64) as u64, v as u64)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compile/fingerprint.rs"]
mod tests;
