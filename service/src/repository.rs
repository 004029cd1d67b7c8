//! In-memory research catalog
//!
//! Records are validated on insert with the engine's validators, so the
//! prediction pipeline only sees well-formed research data.

use std::collections::HashMap;
use std::path::Path;

use fielder_engine::validation::{
    validate_cultivar, validate_regional_data, validate_region, validate_rootstock,
};
use fielder_engine::{
    Coordinates, CultivarResearch, GrowingRegion, RegionalBloomData, ResearchCatalog,
    RootstockResearch,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{AppError, AppResult};

/// On-disk catalog layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogDocument {
    #[serde(default)]
    pub cultivars: Vec<CultivarResearch>,
    #[serde(default)]
    pub regional_data: Vec<RegionalBloomData>,
    #[serde(default)]
    pub rootstocks: Vec<RootstockResearch>,
    #[serde(default)]
    pub regions: Vec<GrowingRegion>,
}

/// Research catalog held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    cultivars: HashMap<String, CultivarResearch>,
    /// cultivar id -> region id -> data
    regional: HashMap<String, HashMap<String, RegionalBloomData>>,
    rootstocks: HashMap<String, RootstockResearch>,
    regions: HashMap<String, GrowingRegion>,
}

fn rejected(field: &str, id: &str, message: &str) -> AppError {
    AppError::Validation {
        field: field.to_string(),
        message: format!("{} ({})", message, id),
    }
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and validate a JSON catalog file
    pub fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let catalog = Self::from_json_str(&raw)?;
        info!(
            path = %path.display(),
            cultivars = catalog.cultivars.len(),
            regions = catalog.regions.len(),
            "Loaded research catalog"
        );
        Ok(catalog)
    }

    pub fn from_json_str(raw: &str) -> AppResult<Self> {
        let document: CatalogDocument = serde_json::from_str(raw)?;
        Self::from_document(document)
    }

    pub fn from_document(document: CatalogDocument) -> AppResult<Self> {
        let mut catalog = Self::new();
        for cultivar in document.cultivars {
            catalog.add_cultivar(cultivar)?;
        }
        for data in document.regional_data {
            catalog.add_regional_data(data)?;
        }
        for rootstock in document.rootstocks {
            catalog.add_rootstock(rootstock)?;
        }
        for region in document.regions {
            catalog.add_region(region)?;
        }
        Ok(catalog)
    }

    pub fn add_cultivar(&mut self, cultivar: CultivarResearch) -> AppResult<()> {
        validate_cultivar(&cultivar)
            .map_err(|e| rejected("cultivars", &cultivar.cultivar_id, e))?;
        self.cultivars
            .insert(cultivar.cultivar_id.clone(), cultivar);
        Ok(())
    }

    pub fn add_regional_data(&mut self, data: RegionalBloomData) -> AppResult<()> {
        validate_regional_data(&data).map_err(|e| {
            rejected(
                "regional_data",
                &format!("{}/{}", data.cultivar_id, data.region_id),
                e,
            )
        })?;
        self.regional
            .entry(data.cultivar_id.clone())
            .or_default()
            .insert(data.region_id.clone(), data);
        Ok(())
    }

    pub fn add_rootstock(&mut self, rootstock: RootstockResearch) -> AppResult<()> {
        validate_rootstock(&rootstock)
            .map_err(|e| rejected("rootstocks", &rootstock.rootstock_id, e))?;
        self.rootstocks
            .insert(rootstock.rootstock_id.clone(), rootstock);
        Ok(())
    }

    pub fn add_region(&mut self, region: GrowingRegion) -> AppResult<()> {
        validate_region(&region).map_err(|e| rejected("regions", &region.region_id, e))?;
        self.regions.insert(region.region_id.clone(), region);
        Ok(())
    }

    /// Region coordinates, for weather clients
    pub fn region_coordinates(&self) -> impl Iterator<Item = (String, Coordinates)> + '_ {
        self.regions
            .values()
            .map(|r| (r.region_id.clone(), r.coordinates))
    }

    pub fn is_empty(&self) -> bool {
        self.cultivars.is_empty()
            && self.regional.is_empty()
            && self.rootstocks.is_empty()
            && self.regions.is_empty()
    }
}

impl ResearchCatalog for InMemoryCatalog {
    fn get_cultivar(&self, cultivar_id: &str) -> Option<&CultivarResearch> {
        self.cultivars.get(cultivar_id)
    }

    fn get_regional_data(&self, cultivar_id: &str, region_id: &str) -> Option<&RegionalBloomData> {
        self.regional.get(cultivar_id)?.get(region_id)
    }

    fn get_rootstock(&self, rootstock_id: &str) -> Option<&RootstockResearch> {
        self.rootstocks.get(rootstock_id)
    }

    fn get_region(&self, region_id: &str) -> Option<&GrowingRegion> {
        self.regions.get(region_id)
    }
}
