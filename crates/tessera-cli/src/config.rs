//! Benchmark settings: JSON file, overridden by command-line flags.

use std::path::Path;

use serde::Deserialize;
use tessera_kernels::Variant;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BenchConfig {
    pub sizes: Option<Vec<usize>>,
    pub lanes: Option<usize>,
    pub iters: Option<usize>,
    pub variant: Option<String>,
}

/// Fully resolved benchmark settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchSettings {
    pub sizes: Vec<usize>,
    pub lanes: usize,
    pub iters: Option<usize>,
    pub variants: Vec<Variant>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Variant(#[from] tessera_kernels::dispatch::ParseVariantError),
    #[error("invalid size list '{0}'")]
    Sizes(String),
}

impl BenchConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Layer flag values over this config, then fill defaults.
    pub fn resolve(
        self,
        sizes: Option<&str>,
        lanes: Option<usize>,
        iters: Option<usize>,
        variant: Option<&str>,
    ) -> Result<BenchSettings, ConfigError> {
        let sizes = match sizes {
            Some(s) => parse_sizes(s)?,
            None => self.sizes.unwrap_or_else(|| vec![64, 128, 256, 512]),
        };
        let lanes = lanes
            .or(self.lanes)
            .unwrap_or_else(default_lanes)
            .max(1);
        let variant = variant.map(str::to_string).or(self.variant);
        let variants = match variant.as_deref() {
            None | Some("all") => Variant::ALL.to_vec(),
            Some(name) => vec![name.parse()?],
        };
        Ok(BenchSettings {
            sizes,
            lanes,
            iters: iters.or(self.iters),
            variants,
        })
    }
}

pub fn default_lanes() -> usize {
    std::thread::available_parallelism().map_or(1, |n| n.get())
}

pub fn parse_sizes(s: &str) -> Result<Vec<usize>, ConfigError> {
    let sizes: Vec<usize> = s
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| part.trim().parse::<usize>())
        .collect::<Result<_, _>>()
        .map_err(|_| ConfigError::Sizes(s.to_string()))?;
    if sizes.is_empty() || sizes.contains(&0) {
        return Err(ConfigError::Sizes(s.to_string()));
    }
    Ok(sizes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sizes() {
        assert_eq!(parse_sizes("64, 128,256").unwrap(), vec![64, 128, 256]);
        assert!(parse_sizes("64,abc").is_err());
        assert!(parse_sizes("").is_err());
        assert!(parse_sizes("0").is_err());
    }

    #[test]
    fn test_config_fields_default_individually() {
        let cfg = BenchConfig::from_json(r#"{ "lanes": 6 }"#).unwrap();
        assert_eq!(cfg.lanes, Some(6));
        assert_eq!(cfg.sizes, None);
        assert!(BenchConfig::from_json(r#"{ "lane": 6 }"#).is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let cfg = BenchConfig::from_json(
            r#"{ "sizes": [32], "lanes": 2, "iters": 9, "variant": "direct" }"#,
        )
        .unwrap();
        let settings = cfg
            .clone()
            .resolve(Some("16,48"), None, Some(3), Some("3x3-block"))
            .unwrap();
        assert_eq!(settings.sizes, vec![16, 48]);
        assert_eq!(settings.lanes, 2);
        assert_eq!(settings.iters, Some(3));
        assert_eq!(settings.variants, vec![Variant::Unrolled3x3Block]);

        let settings = cfg.resolve(None, None, None, None).unwrap();
        assert_eq!(settings.sizes, vec![32]);
        assert_eq!(settings.iters, Some(9));
        assert_eq!(settings.variants, vec![Variant::Direct]);
    }

    #[test]
    fn test_defaults() {
        let settings = BenchConfig::default().resolve(None, None, None, None).unwrap();
        assert_eq!(settings.variants.len(), 4);
        assert!(settings.lanes >= 1);
        assert!(BenchConfig::default().resolve(None, None, None, Some("fft")).is_err());
    }
}
