use super::domain::{region_label, Region, RegionId, RegionRef};

const UNKNOWN_REGION: &str = "N/A";

/// Local copy of the region list, replaced wholesale on every fetch.
#[derive(Debug, Clone, Default)]
pub struct RegionCatalog {
    regions: Vec<Region>,
}

impl RegionCatalog {
    pub fn new(regions: Vec<Region>) -> Self {
        Self { regions }
    }

    pub fn replace(&mut self, regions: Vec<Region>) {
        self.regions = regions;
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn get(&self, id: &RegionId) -> Option<&Region> {
        self.regions.iter().find(|region| &region.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// `"Name (CODE)"` for populated or cached regions, `"N/A"` otherwise.
    pub fn label(&self, region: &RegionRef) -> String {
        match region {
            RegionRef::Populated { name, code, .. } => region_label(name, code),
            RegionRef::Id(id) => self
                .get(id)
                .map(Region::display_name)
                .unwrap_or_else(|| UNKNOWN_REGION.to_string()),
        }
    }
}
