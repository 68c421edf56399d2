//! In-memory edition repository.

use anyhow::Result;
use tracing::debug;

use crate::content::builtin_editions;
use crate::model::EditionData;
use crate::ports::EditionRepository;
use crate::settings::{parse_document, DataFormat};

/// Loaded static content, one entry per edition in load order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalogue {
    editions: Vec<EditionData>,
}

impl Catalogue {
    pub fn new(editions: impl IntoIterator<Item = EditionData>) -> Self {
        let mut catalogue = Self::default();
        for edition in editions {
            catalogue.insert(edition);
        }
        catalogue
    }

    /// The editions shipped with the engine.
    pub fn builtin() -> Result<Self> {
        let mut names: Vec<_> = builtin_editions().into_iter().collect();
        names.sort_by_key(|(name, _)| *name);
        let editions = names
            .into_iter()
            .map(|(name, text)| parse_document::<EditionData>(text, DataFormat::Json, name))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(editions))
    }

    /// Parse one edition document and add it, replacing an edition with the same code.
    pub fn load_str(&mut self, text: &str, format: DataFormat, origin: &str) -> Result<()> {
        let edition = parse_document::<EditionData>(text, format, origin)?;
        self.insert(edition);
        Ok(())
    }

    pub fn insert(&mut self, edition: EditionData) {
        let edition = edition.normalized();
        debug!(
            edition = %edition.edition,
            scenarios = edition.scenarios.len(),
            sections = edition.sections.len(),
            "loaded edition"
        );
        match self.editions.iter_mut().find(|e| e.edition == edition.edition) {
            Some(existing) => *existing = edition,
            None => self.editions.push(edition),
        }
    }

    pub fn edition_codes(&self) -> Vec<String> {
        self.editions.iter().map(|e| e.edition.clone()).collect()
    }
}

impl EditionRepository for Catalogue {
    fn editions(&self) -> &[EditionData] {
        &self.editions
    }
}
