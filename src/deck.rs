use anyhow::{Context, Result};
use image::{imageops::FilterType, RgbImage};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum DeckError {
    #[error("slide directory {0:?} does not exist")]
    Missing(PathBuf),
    #[error("no slideN.png/.jpg images found in {0:?}")]
    Empty(PathBuf),
    #[error("more than one slide is numbered {0}")]
    DuplicateIndex(u64),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn slide_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^slide(\d+)\.(?i:png|jpe?g)$").expect("slide pattern is valid")
    })
}

/// The numeric suffix of a `slideN.<ext>` file name.
pub fn slide_number(name: &str) -> Option<u64> {
    let caps = slide_pattern().captures(name)?;
    caps.get(1)?.as_str().parse().ok()
}

/// Keeps only slide file names and orders them by their number, not lexically.
pub fn order_slides<S: AsRef<str>>(names: &[S]) -> Result<Vec<String>, DeckError> {
    let mut numbered: Vec<(u64, String)> = names
        .iter()
        .filter_map(|n| slide_number(n.as_ref()).map(|num| (num, n.as_ref().to_string())))
        .collect();
    numbered.sort_by_key(|(num, _)| *num);

    if let Some(pair) = numbered.windows(2).find(|w| w[0].0 == w[1].0) {
        return Err(DeckError::DuplicateIndex(pair[0].0));
    }
    Ok(numbered.into_iter().map(|(_, name)| name).collect())
}

/// Slide images on disk, fixed for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct SlideDeck {
    paths: Vec<PathBuf>,
}

impl SlideDeck {
    pub fn load(dir: &Path) -> Result<Self, DeckError> {
        if !dir.is_dir() {
            return Err(DeckError::Missing(dir.to_path_buf()));
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }

        let ordered = order_slides(&names)?;
        if ordered.is_empty() {
            return Err(DeckError::Empty(dir.to_path_buf()));
        }
        info!(count = ordered.len(), dir = %dir.display(), "loaded slide deck");

        Ok(Self {
            paths: ordered.into_iter().map(|name| dir.join(name)).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn path(&self, index: usize) -> Option<&Path> {
        self.paths.get(index).map(PathBuf::as_path)
    }

    /// Decodes slide `index` and scales it to the presentation canvas.
    pub fn image(&self, index: usize, width: u32, height: u32) -> Result<RgbImage> {
        let path = self
            .path(index)
            .with_context(|| format!("slide {} out of range (deck has {})", index, self.len()))?;
        debug!(path = %path.display(), "decoding slide");
        let img = image::open(path).with_context(|| format!("Failed to decode {}", path.display()))?;
        Ok(img.resize_exact(width, height, FilterType::Triangle).to_rgb8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_not_lexical_order() {
        let ordered = order_slides(&["slide10.png", "slide1.png", "slide2.png"]).unwrap();
        assert_eq!(ordered, vec!["slide1.png", "slide2.png", "slide10.png"]);
    }

    #[test]
    fn test_non_slides_are_skipped() {
        let ordered =
            order_slides(&["notes.txt", "slide3.png", "slideA.png", "cover.png", "slide0.JPG"]).unwrap();
        assert_eq!(ordered, vec!["slide0.JPG", "slide3.png"]);
    }

    #[test]
    fn test_duplicate_numbers_rejected() {
        let err = order_slides(&["slide1.png", "slide01.jpg"]).unwrap_err();
        assert!(matches!(err, DeckError::DuplicateIndex(1)));
    }

    #[test]
    fn test_slide_number() {
        assert_eq!(slide_number("slide42.png"), Some(42));
        assert_eq!(slide_number("slide7.jpeg"), Some(7));
        assert_eq!(slide_number("slide.png"), None);
        assert_eq!(slide_number("myslide1.png"), None);
    }

    #[test]
    fn test_missing_directory() {
        let err = SlideDeck::load(Path::new("/definitely/not/a/slide/dir")).unwrap_err();
        assert!(matches!(err, DeckError::Missing(_)));
    }
}
