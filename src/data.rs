//! Data Loading and Lookup Tables
//!
//! Loads the raw survey export and the classification lookups (commercial
//! and trophic species lists, biomass coefficients) using Polars. Lookups
//! are read once per run into `SurveyLookups` and injected into the
//! pipeline; nothing re-reads them per call.

use crate::config::SurveyDomain;
use anyhow::{Context, Result};
use polars::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use std::path::Path;
use std::sync::OnceLock;

/// Trophic (feeding-ecology) classification groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrophicGroup {
    Herbivore,
    Carnivore,
    Omnivore,
    Detritivore,
    Corallivore,
}

impl TrophicGroup {
    pub const ALL: [TrophicGroup; 5] = [
        TrophicGroup::Herbivore,
        TrophicGroup::Carnivore,
        TrophicGroup::Omnivore,
        TrophicGroup::Detritivore,
        TrophicGroup::Corallivore,
    ];

    /// Stem of the per-domain list file, e.g. `herbivore_fish.csv`
    pub fn file_stem(&self) -> &'static str {
        match self {
            TrophicGroup::Herbivore => "herbivore",
            TrophicGroup::Carnivore => "carnivore",
            TrophicGroup::Omnivore => "omnivore",
            TrophicGroup::Detritivore => "detritivore",
            TrophicGroup::Corallivore => "corallivore",
        }
    }

    /// Results-table column written by this group's density calculator
    pub fn column_name(&self) -> &'static str {
        match self {
            TrophicGroup::Herbivore => "Herbivore Density",
            TrophicGroup::Carnivore => "Carnivore Density",
            TrophicGroup::Omnivore => "Omnivore Density",
            TrophicGroup::Detritivore => "Detritivore Density",
            TrophicGroup::Corallivore => "Corallivore Density",
        }
    }
}

/// Allometric biomass coefficients for one species:
/// `biomass = total * a * size^b`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiomassCoeffs {
    pub a: f64,
    pub b: f64,
}

/// Immutable classification lookups for one survey domain
///
/// Substrate surveys carry no species lists; all maps stay empty.
pub struct SurveyLookups {
    /// Commercially relevant species (fish only in current exports)
    pub commercial: FxHashSet<String>,

    /// Trophic group → member species
    pub trophic: FxHashMap<TrophicGroup, FxHashSet<String>>,

    /// Species → allometric coefficients
    pub biomass_coeffs: FxHashMap<String, BiomassCoeffs>,
}

fn empty_species_set() -> &'static FxHashSet<String> {
    static EMPTY: OnceLock<FxHashSet<String>> = OnceLock::new();
    EMPTY.get_or_init(FxHashSet::default)
}

impl SurveyLookups {
    /// Build an empty lookup set (substrate surveys, unit tests)
    pub fn empty() -> Self {
        SurveyLookups {
            commercial: FxHashSet::default(),
            trophic: FxHashMap::default(),
            biomass_coeffs: FxHashMap::default(),
        }
    }

    /// Load all lookups for the given domain from the constants directory
    pub fn load(
        constants_dir: &Path,
        domain: SurveyDomain,
        include_biomass: bool,
    ) -> Result<Self> {
        let Some(suffix) = domain.list_suffix() else {
            return Ok(Self::empty());
        };

        println!("Loading classification lookups ({})...", domain.dir_name());

        let mut trophic = FxHashMap::default();
        for group in TrophicGroup::ALL {
            let path = constants_dir.join(format!("{}_{}.csv", group.file_stem(), suffix));
            trophic.insert(group, load_species_list(&path)?);
        }

        // Commercial list only exists for fish
        let commercial = if domain == SurveyDomain::Fish {
            load_species_list(&constants_dir.join("commercial_fish.csv"))?
        } else {
            FxHashSet::default()
        };

        let biomass_coeffs = if include_biomass {
            load_biomass_coeffs(&constants_dir.join(format!("biomass_coeffs_{}.csv", suffix)))?
        } else {
            FxHashMap::default()
        };

        println!("  Commercial species: {}", commercial.len());
        for group in TrophicGroup::ALL {
            println!("  {}: {}", group.file_stem(), trophic[&group].len());
        }
        println!("  Biomass coefficients: {}", biomass_coeffs.len());

        Ok(SurveyLookups {
            commercial,
            trophic,
            biomass_coeffs,
        })
    }

    /// Member species of one trophic group
    pub fn trophic_species(&self, group: TrophicGroup) -> &FxHashSet<String> {
        self.trophic
            .get(&group)
            .unwrap_or_else(|| empty_species_set())
    }

    /// Union of all trophic lists, for completeness validation
    pub fn all_classified_species(&self) -> FxHashSet<String> {
        let mut all = FxHashSet::default();
        for species in self.trophic.values() {
            all.extend(species.iter().cloned());
        }
        all
    }
}

/// Load the raw survey export
pub fn load_survey_csv(path: &Path) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.into()))
        .with_context(|| format!("Failed to create CSV reader: {:?}", path))?
        .finish()
        .with_context(|| format!("Failed to load survey CSV: {:?}", path))
}

/// Load a single-column, unkeyed species list
fn load_species_list(path: &Path) -> Result<FxHashSet<String>> {
    let df = CsvReadOptions::default()
        .with_has_header(false)
        .try_into_reader_with_file_path(Some(path.into()))
        .with_context(|| format!("Failed to create CSV reader: {:?}", path))?
        .finish()
        .with_context(|| format!("Failed to load species list: {:?}", path))?;

    let names = df
        .get_columns()
        .first()
        .with_context(|| format!("Species list is empty: {:?}", path))?
        .str()
        .with_context(|| format!("Species list is not a string column: {:?}", path))?;

    Ok(names
        .into_iter()
        .flatten()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

/// Load the biomass coefficient table, keyed by species name
fn load_biomass_coeffs(path: &Path) -> Result<FxHashMap<String, BiomassCoeffs>> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.into()))
        .with_context(|| format!("Failed to create CSV reader: {:?}", path))?
        .finish()
        .with_context(|| format!("Failed to load biomass coefficients: {:?}", path))?;

    let species = df
        .column("Species")
        .with_context(|| format!("Column 'Species' not found in {:?}", path))?
        .str()?;
    let coeff_a = df
        .column("Coeff_a")
        .with_context(|| format!("Column 'Coeff_a' not found in {:?}", path))?
        .cast(&DataType::Float64)?;
    let coeff_a = coeff_a.f64()?;
    let coeff_b = df
        .column("Coeff_b")
        .with_context(|| format!("Column 'Coeff_b' not found in {:?}", path))?
        .cast(&DataType::Float64)?;
    let coeff_b = coeff_b.f64()?;

    let mut map = FxHashMap::default();
    for idx in 0..df.height() {
        if let (Some(name), Some(a), Some(b)) =
            (species.get(idx), coeff_a.get(idx), coeff_b.get(idx))
        {
            map.insert(name.to_string(), BiomassCoeffs { a, b });
        }
    }

    Ok(map)
}
