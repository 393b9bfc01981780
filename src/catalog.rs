use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::action::{FetchAction, RequestId};

/// Top-level area of the app a route segment points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Movies,
    Series,
    Popular,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Movies, Section::Series, Section::Popular];

    /// Map a route segment to its section. Matching is exact.
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "browse" | "movies" => Some(Self::Movies),
            "tvseries" => Some(Self::Series),
            "popular" => Some(Self::Popular),
            _ => None,
        }
    }

    /// Route segments that resolve to this section.
    pub fn segments(self) -> &'static [&'static str] {
        match self {
            Self::Movies => &["browse", "movies"],
            Self::Series => &["tvseries"],
            Self::Popular => &["popular"],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Movies => "movies",
            Self::Series => "series",
            Self::Popular => "popular",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// One fetchable category: a display name, a url template and the store
/// slice its results are fetched into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub url: String,
    pub action: Section,
}

impl CatalogEntry {
    pub fn new(name: impl Into<String>, url: impl Into<String>, action: Section) -> Self {
        Self { name: name.into(), url: url.into(), action }
    }

    /// The url template is expected to end inside a query string.
    pub fn page_url(&self, page: u32) -> String { format!("{}&page={}", self.url, page) }

    pub fn fetch_action(&self, id: RequestId, page: u32) -> FetchAction {
        FetchAction { id, kind: self.action, category: self.name.clone(), page, url: self.page_url(page) }
    }
}

/// Ordered entries for one section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSet {
    section: Section,
    entries: Vec<CatalogEntry>,
}

impl CatalogSet {
    pub fn new(section: Section, entries: Vec<CatalogEntry>) -> Self { Self { section, entries } }
    pub fn section(&self) -> Section { self.section }
    pub fn entries(&self) -> &[CatalogEntry] { &self.entries }
    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
    pub fn names(&self) -> impl Iterator<Item = &str> { self.entries.iter().map(|e| e.name.as_str()) }

    /// First entry whose name equals `name` exactly.
    pub fn find(&self, name: &str) -> Option<&CatalogEntry> { self.entries.iter().find(|e| e.name == name) }
}

/// On-disk form of a catalog entry. `action` defaults to the section the
/// entry is listed under.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEntry {
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Section>,
}

/// On-disk form of a catalog. Sections left empty keep the builtin table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub movies: Vec<RawEntry>,
    #[serde(default)]
    pub series: Vec<RawEntry>,
    #[serde(default)]
    pub popular: Vec<RawEntry>,
}

/// The three configuration sets, one per section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    movies: CatalogSet,
    series: CatalogSet,
    popular: CatalogSet,
}

impl Catalog {
    pub fn new(movies: Vec<CatalogEntry>, series: Vec<CatalogEntry>, popular: Vec<CatalogEntry>) -> Self {
        Self {
            movies: CatalogSet::new(Section::Movies, movies),
            series: CatalogSet::new(Section::Series, series),
            popular: CatalogSet::new(Section::Popular, popular),
        }
    }

    pub fn builtin() -> Self {
        Self::new(
            builtin_entries(Section::Movies, BUILTIN_MOVIES),
            builtin_entries(Section::Series, BUILTIN_SERIES),
            builtin_entries(Section::Popular, BUILTIN_POPULAR),
        )
    }

    pub fn set(&self, section: Section) -> &CatalogSet {
        match section {
            Section::Movies => &self.movies,
            Section::Series => &self.series,
            Section::Popular => &self.popular,
        }
    }

    pub fn set_for_segment(&self, segment: &str) -> Option<&CatalogSet> {
        Section::from_segment(segment).map(|s| self.set(s))
    }

    pub fn from_file(file: &CatalogFile) -> Result<Self> {
        let builtin = Self::builtin();
        let pick = |section: Section, raw: &[RawEntry]| -> Result<Vec<CatalogEntry>> {
            if raw.is_empty() {
                Ok(builtin.set(section).entries().to_vec())
            } else {
                convert_entries(section, raw)
            }
        };
        Ok(Self::new(
            pick(Section::Movies, &file.movies)?,
            pick(Section::Series, &file.series)?,
            pick(Section::Popular, &file.popular)?,
        ))
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(s).context("parsing catalog toml")?;
        Self::from_file(&file)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let s = fs::read_to_string(path).with_context(|| format!("reading catalog: {}", path.display()))?;
        Self::from_toml_str(&s).with_context(|| format!("loading catalog: {}", path.display()))
    }
}

impl Default for Catalog {
    fn default() -> Self { Self::builtin() }
}

fn convert_entries(section: Section, raw: &[RawEntry]) -> Result<Vec<CatalogEntry>> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(raw.len());
    for (i, r) in raw.iter().enumerate() {
        let name = r.name.trim();
        if name.is_empty() { bail!("{section} entry {i} has an empty name"); }
        if r.url.trim().is_empty() { bail!("{section} entry '{name}' has an empty url"); }
        if !seen.insert(name.to_string()) {
            warn!(%section, name, "duplicate catalog entry; the first one wins");
        }
        out.push(CatalogEntry::new(name, r.url.trim(), r.action.unwrap_or(section)));
    }
    Ok(out)
}

fn builtin_entries(section: Section, table: &[(&str, &str)]) -> Vec<CatalogEntry> {
    table.iter().map(|(name, url)| CatalogEntry::new(*name, *url, section)).collect()
}

const BUILTIN_MOVIES: &[(&str, &str)] = &[
    ("Action", "discover/movie?with_genres=28"),
    ("Adventure", "discover/movie?with_genres=12"),
    ("Animation", "discover/movie?with_genres=16"),
    ("Comedy", "discover/movie?with_genres=35"),
    ("Crime", "discover/movie?with_genres=80"),
    ("Documentary", "discover/movie?with_genres=99"),
    ("Drama", "discover/movie?with_genres=18"),
    ("Horror", "discover/movie?with_genres=27"),
    ("Romance", "discover/movie?with_genres=10749"),
    ("Science Fiction", "discover/movie?with_genres=878"),
];

const BUILTIN_SERIES: &[(&str, &str)] = &[
    ("Action & Adventure", "discover/tv?with_genres=10759"),
    ("Animation", "discover/tv?with_genres=16"),
    ("Comedy", "discover/tv?with_genres=35"),
    ("Crime", "discover/tv?with_genres=80"),
    ("Documentary", "discover/tv?with_genres=99"),
    ("Drama", "discover/tv?with_genres=18"),
    ("Kids", "discover/tv?with_genres=10762"),
    ("Mystery", "discover/tv?with_genres=9648"),
    ("Reality", "discover/tv?with_genres=10764"),
    ("Sci-Fi & Fantasy", "discover/tv?with_genres=10765"),
];

const BUILTIN_POPULAR: &[(&str, &str)] = &[
    ("Trending", "trending/all/week?language=en-US"),
    ("Popular Movies", "movie/popular?language=en-US"),
    ("Popular Series", "tv/popular?language=en-US"),
    ("Top Rated Movies", "movie/top_rated?language=en-US"),
    ("Top Rated Series", "tv/top_rated?language=en-US"),
];
