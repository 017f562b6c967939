//! Static response bodies, loaded once at startup and shared read-only.
//!
//! Layout under the assets directory:
//!
//! ```text
//! static/pixel.gif
//! static/badges/{blue,default,green,orange,pink,red,yellow}.svg
//! templates/page.html
//! ```

use crate::page::{PageTemplate, TemplateError};
use hyper::body::Bytes;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid page template {path}: {source}")]
    Template {
        path: PathBuf,
        #[source]
        source: TemplateError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BadgeColor {
    Blue,
    Default,
    Green,
    Orange,
    Pink,
    Red,
    Yellow,
}

impl BadgeColor {
    pub const ALL: [BadgeColor; 7] = [
        BadgeColor::Blue,
        BadgeColor::Default,
        BadgeColor::Green,
        BadgeColor::Orange,
        BadgeColor::Pink,
        BadgeColor::Red,
        BadgeColor::Yellow,
    ];

    /// Maps the `color` query value to a badge. Anything unrecognised,
    /// including a missing value, gets the default badge.
    pub fn from_query(value: Option<&str>) -> Self {
        match value {
            Some("blue") => BadgeColor::Blue,
            Some("green") => BadgeColor::Green,
            Some("orange") => BadgeColor::Orange,
            Some("pink") => BadgeColor::Pink,
            Some("red") => BadgeColor::Red,
            Some("yellow") => BadgeColor::Yellow,
            _ => BadgeColor::Default,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            BadgeColor::Blue => "blue",
            BadgeColor::Default => "default",
            BadgeColor::Green => "green",
            BadgeColor::Orange => "orange",
            BadgeColor::Pink => "pink",
            BadgeColor::Red => "red",
            BadgeColor::Yellow => "yellow",
        }
    }

    const fn index(&self) -> usize {
        *self as usize
    }
}

#[derive(Debug, Clone)]
pub struct Assets {
    pixel: Bytes,
    badges: [Bytes; 7],
    page: PageTemplate,
}

impl Assets {
    pub fn load(dir: &Path) -> Result<Self, AssetError> {
        let pixel = read_asset(&dir.join("static").join("pixel.gif"))?;

        let badge_dir = dir.join("static").join("badges");
        let mut badges: [Bytes; 7] = Default::default();
        for color in BadgeColor::ALL {
            badges[color.index()] =
                read_asset(&badge_dir.join(format!("{}.svg", color.as_str())))?;
        }

        let page_path = dir.join("templates").join("page.html");
        let source = std::fs::read_to_string(&page_path).map_err(|source| AssetError::Read {
            path: page_path.clone(),
            source,
        })?;
        let page = PageTemplate::parse(&source).map_err(|source| AssetError::Template {
            path: page_path,
            source,
        })?;

        tracing::info!(dir = %dir.display(), "Loaded static assets");
        Ok(Assets {
            pixel,
            badges,
            page,
        })
    }

    /// Builds assets from in-memory bodies. `badge` is called once per color.
    pub fn from_parts<F>(pixel: Bytes, mut badge: F, page: PageTemplate) -> Self
    where
        F: FnMut(BadgeColor) -> Bytes,
    {
        Assets {
            pixel,
            badges: BadgeColor::ALL.map(&mut badge),
            page,
        }
    }

    pub fn pixel(&self) -> Bytes {
        self.pixel.clone()
    }

    pub fn badge(&self, color: BadgeColor) -> Bytes {
        self.badges[color.index()].clone()
    }

    pub fn page(&self) -> &PageTemplate {
        &self.page
    }
}

fn read_asset(path: &Path) -> Result<Bytes, AssetError> {
    std::fs::read(path)
        .map(Bytes::from)
        .map_err(|source| AssetError::Read {
            path: path.to_path_buf(),
            source,
        })
}
