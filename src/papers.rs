//! Test paper partitioning.
//!
//! Papers are built completely before the store is touched, then swapped in
//! with [`MemStore::replace_test_papers`]. Callers hold the store exclusively
//! for the whole call, which serializes regeneration per unit.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::model::{TestPaper, Unit, UnitId, WordId};
use crate::store::MemStore;

fn paper_title(unit: &Unit, number: u32) -> String {
    format!("{} - Test {}", unit.title, number)
}

/// Slices the unit's words, in stored order, into papers of
/// `words_per_paper`; the last paper takes the remainder.
pub fn generate(
    store: &mut MemStore,
    unit_id: UnitId,
    words_per_paper: i64,
    now: DateTime<Utc>,
) -> CoreResult<Vec<TestPaper>> {
    if words_per_paper <= 0 {
        return Err(CoreError::InvalidArgument(format!(
            "wordsPerPaper must be positive, got {words_per_paper}"
        )));
    }
    let size = u32::try_from(words_per_paper).map_err(|_| {
        CoreError::InvalidArgument(format!("wordsPerPaper too large: {words_per_paper}"))
    })?;
    let unit = store
        .unit(unit_id)
        .cloned()
        .ok_or_else(|| CoreError::not_found("unit", unit_id))?;

    let word_ids: Vec<WordId> = store.words_in_unit(unit_id).iter().map(|w| w.id).collect();
    let papers: Vec<TestPaper> = word_ids
        .chunks(size as usize)
        .zip(1u32..)
        .map(|(chunk, number)| TestPaper {
            id: Uuid::new_v4(),
            unit_id,
            paper_number: number,
            title: paper_title(&unit, number),
            words_per_paper: size,
            word_ids: chunk.to_vec(),
            created_at: now,
        })
        .collect();

    debug!(%unit_id, papers = papers.len(), size, "test papers regenerated");
    store.replace_test_papers(unit_id, papers.clone());
    Ok(papers)
}

/// One group of an externally defined paper layout.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperMapping {
    /// Unit number the group belongs to.
    pub chapter: u32,
    pub test_paper: u32,
    pub words: Vec<String>,
}

/// Paper membership supplied by the source corpus, keyed by unit number
/// then paper number. Both numbers are 1-based.
#[derive(Debug, Clone, Default)]
pub struct PredefinedPapers {
    chapters: BTreeMap<u32, BTreeMap<u32, Vec<String>>>,
}

impl PredefinedPapers {
    pub fn from_mappings(mappings: impl IntoIterator<Item = PaperMapping>) -> Self {
        let mut chapters: BTreeMap<u32, BTreeMap<u32, Vec<String>>> = BTreeMap::new();
        for m in mappings {
            if m.chapter == 0 || m.test_paper == 0 {
                warn!(
                    chapter = m.chapter,
                    paper = m.test_paper,
                    "skipping predefined group with zero number"
                );
                continue;
            }
            chapters
                .entry(m.chapter)
                .or_default()
                .entry(m.test_paper)
                .or_default()
                .extend(m.words.into_iter().map(|w| w.trim().to_lowercase()));
        }
        Self { chapters }
    }

    pub fn groups_for(&self, unit_number: u32) -> Option<&BTreeMap<u32, Vec<String>>> {
        self.chapters.get(&unit_number)
    }
}

/// Builds the unit's papers from the predefined layout instead of slicing.
///
/// Spellings are matched case-insensitively against the unit's words. The
/// source paper number is kept; a paper's target size is the size of its
/// source group.
pub fn generate_predefined(
    store: &mut MemStore,
    unit_id: UnitId,
    predefined: &PredefinedPapers,
    now: DateTime<Utc>,
) -> CoreResult<Vec<TestPaper>> {
    let unit = store
        .unit(unit_id)
        .cloned()
        .ok_or_else(|| CoreError::not_found("unit", unit_id))?;
    let groups = predefined
        .groups_for(unit.number)
        .ok_or_else(|| CoreError::not_found("predefined test papers for unit", unit_id))?;

    let mut by_spelling: HashMap<String, WordId> = HashMap::new();
    for word in store.words_in_unit(unit_id) {
        by_spelling
            .entry(word.word.trim().to_lowercase())
            .or_insert(word.id);
    }

    let mut papers = Vec::with_capacity(groups.len());
    for (&number, spellings) in groups {
        let mut word_ids = Vec::with_capacity(spellings.len());
        for spelling in spellings {
            match by_spelling.get(spelling) {
                Some(&id) => word_ids.push(id),
                None => warn!(%unit_id, paper = number, %spelling, "predefined word not in unit"),
            }
        }
        if word_ids.is_empty() {
            warn!(%unit_id, paper = number, "skipping predefined paper with no known words");
            continue;
        }
        papers.push(TestPaper {
            id: Uuid::new_v4(),
            unit_id,
            paper_number: number,
            title: paper_title(&unit, number),
            words_per_paper: u32::try_from(spellings.len()).unwrap_or(u32::MAX),
            word_ids,
            created_at: now,
        });
    }

    debug!(%unit_id, papers = papers.len(), "predefined test papers applied");
    store.replace_test_papers(unit_id, papers.clone());
    Ok(papers)
}
