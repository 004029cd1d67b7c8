//! Read-only research data interface
//!
//! Implementations are constructed explicitly and passed into the
//! prediction pipeline. A missing record is `None`, never an error, and
//! callers resolve it through the named fallbacks in [`crate::phenology`].

use crate::models::{CultivarResearch, GrowingRegion, RegionalBloomData, RootstockResearch};

pub trait ResearchCatalog {
    fn get_cultivar(&self, cultivar_id: &str) -> Option<&CultivarResearch>;

    fn get_regional_data(&self, cultivar_id: &str, region_id: &str) -> Option<&RegionalBloomData>;

    fn get_rootstock(&self, rootstock_id: &str) -> Option<&RootstockResearch>;

    fn get_region(&self, region_id: &str) -> Option<&GrowingRegion>;
}

impl<T: ResearchCatalog + ?Sized> ResearchCatalog for &T {
    fn get_cultivar(&self, cultivar_id: &str) -> Option<&CultivarResearch> {
        (**self).get_cultivar(cultivar_id)
    }

    fn get_regional_data(&self, cultivar_id: &str, region_id: &str) -> Option<&RegionalBloomData> {
        (**self).get_regional_data(cultivar_id, region_id)
    }

    fn get_rootstock(&self, rootstock_id: &str) -> Option<&RootstockResearch> {
        (**self).get_rootstock(rootstock_id)
    }

    fn get_region(&self, region_id: &str) -> Option<&GrowingRegion> {
        (**self).get_region(region_id)
    }
}
