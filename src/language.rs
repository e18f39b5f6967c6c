use clap::ValueEnum;
use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use serde_json::from_str;
use std::error::Error;

static PASSAGE_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/passages");

/// Shown when a language has no passages to offer
pub const PLACEHOLDER_PASSAGE: &str = "No text available.";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, ValueEnum, strum_macros::Display)]
pub enum Language {
    #[default]
    #[strum(serialize = "english")]
    English,
    #[strum(serialize = "hindi")]
    Hindi,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::English, Language::Hindi];

    /// Storage tag, also used in personal best keys
    pub fn tag(&self) -> String {
        self.to_string()
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.tag() == tag)
    }

    pub fn next(&self) -> Self {
        match self {
            Language::English => Language::Hindi,
            Language::Hindi => Language::English,
        }
    }
}

#[allow(dead_code)]
#[derive(Deserialize, Clone, Debug)]
struct PassageFile {
    name: String,
    passages: Vec<String>,
}

/// Candidate passages for one language
#[derive(Clone, Debug, Default)]
pub struct PassagePool {
    passages: Vec<String>,
}

impl PassagePool {
    pub fn new(passages: Vec<String>) -> Self {
        Self { passages }
    }

    /// Embedded corpus for `language`; an unreadable corpus yields an empty pool
    pub fn for_language(language: Language) -> Self {
        match read_passages(&format!("{}.json", language.tag())) {
            Ok(passages) => Self::new(passages),
            Err(err) => {
                tracing::warn!(%language, error = %err, "passage corpus unavailable");
                Self::default()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    pub fn pick(&self) -> String {
        self.pick_with(&mut rand::thread_rng())
    }

    pub fn pick_with<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        self.passages
            .choose(rng)
            .cloned()
            .unwrap_or_else(|| PLACEHOLDER_PASSAGE.to_string())
    }
}

fn read_passages(file_name: &str) -> Result<Vec<String>, Box<dyn Error>> {
    let file = PASSAGE_DIR
        .get_file(file_name)
        .ok_or_else(|| format!("passage file {file_name} not found"))?;

    let contents = file
        .contents_utf8()
        .ok_or("passage file is not valid utf-8")?;

    let parsed: PassageFile = from_str(contents)?;
    Ok(parsed
        .passages
        .into_iter()
        .filter(|p| !p.trim().is_empty())
        .collect())
}
