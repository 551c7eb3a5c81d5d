//! Startup data: the vocabulary catalogue and the predefined paper layout.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::error::CoreError;
use crate::model::Difficulty;
use crate::papers::{PaperMapping, PredefinedPapers};
use crate::store::{MemStore, NewUnit, NewWord};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Store(#[from] CoreError),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitRecord {
    pub number: u32,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordRecord {
    pub unit_number: u32,
    pub word: String,
    #[serde(default)]
    pub phonetic: Option<String>,
    #[serde(default)]
    pub definition: Option<String>,
}

/// Catalogue file layout: `{ "units": [...], "words": [...] }`.
#[derive(Debug, Clone, Deserialize)]
pub struct Catalogue {
    pub units: Vec<UnitRecord>,
    pub words: Vec<WordRecord>,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let display = path.display().to_string();
    let raw = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: display.clone(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| LoadError::Parse {
        path: display,
        source,
    })
}

pub fn load_catalogue(path: &Path) -> Result<Catalogue, LoadError> {
    read_json(path)
}

pub fn load_predefined(path: &Path) -> Result<PredefinedPapers, LoadError> {
    let mappings: Vec<PaperMapping> = read_json(path)?;
    let predefined = PredefinedPapers::from_mappings(mappings);
    info!(path = %path.display(), "predefined test paper layout loaded");
    Ok(predefined)
}

/// Fills a store from a catalogue. Words attach to units by number; a
/// spelling repeated within one unit is kept once.
pub fn populate(catalogue: Catalogue) -> Result<MemStore, LoadError> {
    let mut store = MemStore::new();
    let mut unit_ids = BTreeMap::new();
    for u in catalogue.units {
        let unit = store.insert_unit(NewUnit {
            number: u.number,
            difficulty: u.difficulty.unwrap_or_else(|| Difficulty::for_chapter(u.number)),
            title: u.title,
            description: u.description,
        });
        unit_ids.insert(unit.number, unit.id);
    }

    let mut seen = HashSet::new();
    for w in catalogue.words {
        let Some(&unit_id) = unit_ids.get(&w.unit_number) else {
            warn!(unit = w.unit_number, word = %w.word, "word references unknown unit");
            continue;
        };
        let spelling = w.word.trim().to_string();
        if !seen.insert((w.unit_number, spelling.to_lowercase())) {
            continue;
        }
        store.insert_word(NewWord {
            unit_id,
            word: spelling,
            phonetic: w.phonetic,
            definition: w.definition,
        })?;
    }

    info!(units = unit_ids.len(), words = seen.len(), "catalogue loaded");
    Ok(store)
}

type Entry = (&'static str, &'static str, &'static str);

const ACADEMIC: &[Entry] = &[
    ("academic", "/ˌækəˈdemɪk/", "Relating to education and scholarship; theoretical rather than practical"),
    ("analysis", "/əˈnæləsɪs/", "Detailed examination of the elements or structure of something"),
    ("approach", "/əˈproʊtʃ/", "A way of dealing with something; a method or strategy"),
    ("assessment", "/əˈsesmənt/", "The evaluation or estimation of the nature, quality, or ability of someone or something"),
    ("concept", "/ˈkɑːnsept/", "An abstract idea; a general notion"),
    ("criteria", "/kraɪˈtɪriə/", "A principle or standard by which something may be judged or decided"),
    ("demonstrate", "/ˈdemənstreɪt/", "To clearly show the existence or truth of something by giving proof or evidence"),
    ("evaluate", "/ɪˈvæljueɪt/", "To form an idea of the amount, number, or value of; assess"),
    ("hypothesis", "/haɪˈpɑːθəsɪs/", "A supposition or proposed explanation made on the basis of limited evidence"),
    ("methodology", "/ˌmeθəˈdɑːlədʒi/", "A system of methods used in a particular area of study or activity"),
];

const TRAVEL: &[Entry] = &[
    ("accommodation", "/əˌkɑːməˈdeɪʃn/", "A room, group of rooms, or building in which someone may live or stay"),
    ("departure", "/dɪˈpɑːrtʃər/", "The action of leaving, typically to start a journey"),
    ("destination", "/ˌdestɪˈneɪʃn/", "The place to which someone or something is going or being sent"),
    ("itinerary", "/aɪˈtɪnəreri/", "A planned route or journey"),
    ("passenger", "/ˈpæsɪndʒər/", "A traveler on a public or private conveyance other than the driver, pilot, or crew"),
    ("reservation", "/ˌrezərˈveɪʃn/", "The action of reserving something; a booking"),
    ("terminal", "/ˈtɜːrmɪnl/", "A building at an airport where passengers transfer between ground transportation and the facilities"),
    ("transport", "/ˈtrænspɔːrt/", "Take or carry people or goods from one place to another by means of a vehicle, aircraft, or ship"),
    ("voyage", "/ˈvɔɪɪdʒ/", "A long journey involving travel by sea or in space"),
    ("luggage", "/ˈlʌɡɪdʒ/", "Suitcases or other bags in which to pack personal belongings for traveling"),
];

const SCIENCE: &[Entry] = &[
    ("experiment", "/ɪkˈsperɪmənt/", "A scientific procedure undertaken to make a discovery, test a hypothesis, or demonstrate a known fact"),
    ("innovation", "/ˌɪnəˈveɪʃn/", "The action or process of innovating; a new method, idea, product, etc."),
    ("laboratory", "/ˈlæbrətɔːri/", "A room or building equipped for scientific experiments, research, or teaching"),
    ("technology", "/tekˈnɑːlədʒi/", "The application of scientific knowledge for practical purposes"),
    ("research", "/rɪˈsɜːrtʃ/", "The systematic investigation into and study of materials and sources"),
    ("equipment", "/ɪˈkwɪpmənt/", "The necessary items for a particular purpose"),
    ("procedure", "/prəˈsiːdʒər/", "An established or official way of doing something"),
    ("observation", "/ˌɑːbzərˈveɪʃn/", "The action or process of observing something or someone carefully"),
    ("discovery", "/dɪˈskʌvəri/", "The action or process of finding someone or something"),
    ("development", "/dɪˈveləpmənt/", "The process of developing or being developed"),
];

/// The catalogue served when no seed file is configured.
pub fn builtin_catalogue() -> Catalogue {
    let units = [
        (1, "Academic Vocabulary", "Essential academic terms for IELTS", Difficulty::Beginner),
        (2, "Travel & Transport", "Travel and transportation vocabulary", Difficulty::Beginner),
        (3, "Science & Technology", "Scientific and technological terms", Difficulty::Intermediate),
        (4, "Environment & Nature", "Environmental and nature-related vocabulary", Difficulty::Intermediate),
        (5, "Business & Economy", "Business and economic terminology", Difficulty::Advanced),
    ]
    .into_iter()
    .map(|(number, title, description, difficulty)| UnitRecord {
        number,
        title: title.to_string(),
        description: Some(description.to_string()),
        difficulty: Some(difficulty),
    })
    .collect();

    let words = [(1, ACADEMIC), (2, TRAVEL), (3, SCIENCE)]
        .into_iter()
        .flat_map(|(unit_number, entries)| {
            entries.iter().map(move |&(word, phonetic, definition)| WordRecord {
                unit_number,
                word: word.to_string(),
                phonetic: Some(phonetic.to_string()),
                definition: Some(definition.to_string()),
            })
        })
        .collect();

    Catalogue { units, words }
}
