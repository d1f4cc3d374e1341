use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_FILL;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapMode {
    /// Per-region trivia and the donation-gated certificate.
    #[default]
    Discover,
    /// User-submitted pins.
    Adventures,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: String,
    pub name: String,
    pub quiz_color: String,
    /// School class the region's donations are rolled up to, when assigned.
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_class: Option<String>,
}

const UKRAINE_REGIONS: &[(&str, &str, &str)] = &[
    ("Avtonomna Respublika Krym", "Crimea", "#ff9aa2"),
    ("Vinnytska", "Vinnytsia", "#9ad3ff"),
    ("Volynska", "Volyn", "#ffff99"),
    ("Dnipropetrovska", "Dnipropetrovsk", "#ffcc99"),
    ("Donetska", "Donetsk", "#d099f0"),
    ("Zhytomyrska", "Zhytomyr", "#99ffb3"),
    ("Zakarpatska", "Zakarpattia", "#ffb3d9"),
    ("Zaporizka", "Zaporizhzhia", "#b3e6f0"),
    ("Ivano-Frankivska", "Ivano-Frankivsk", "#ffeb99"),
    ("Kyivska", "Kyiv Oblast", "#ffb399"),
    ("Kirovohradska", "Kirovohrad", "#b399ff"),
    ("Luhanska", "Luhansk", "#99ffe0"),
    ("Lvivska", "Lviv", "#ff99d6"),
    ("Mykolaivska", "Mykolaiv", "#99ccff"),
    ("Odeska", "Odesa", "#ffd699"),
    ("Poltavska", "Poltava", "#c299ff"),
    ("Rivnenska", "Rivne", "#99ffcc"),
    ("Sumska", "Sumy", "#ff9999"),
    ("Ternopilska", "Ternopil", "#99e6ff"),
    ("Kharkivska", "Kharkiv", "#fff799"),
    ("Khersonska", "Kherson", "#ffc499"),
    ("Khmelnytska", "Khmelnytskyi", "#d499f0"),
    ("Cherkaska", "Cherkasy", "#99ffd9"),
    ("Chernivetska", "Chernivtsi", "#ffcceb"),
    ("Chernihivska", "Chernihiv", "#cce6ff"),
    ("Sevastopilska", "Sevastopol", "#ff99c2"),
];

/// Static lookup from region identifier to display data. Identifiers match the
/// map asset's `name` attribute exactly (case-sensitive).
#[derive(Debug, Clone, Default)]
pub struct RegionCatalog {
    regions: Vec<Region>,
    by_id: HashMap<String, usize>,
}

impl RegionCatalog {
    pub fn new(regions: Vec<Region>) -> Self {
        let mut by_id = HashMap::with_capacity(regions.len());
        for (idx, region) in regions.iter().enumerate() {
            by_id.entry(region.id.clone()).or_insert(idx);
        }
        Self { regions, by_id }
    }

    pub fn ukraine() -> Self {
        Self::new(
            UKRAINE_REGIONS
                .iter()
                .map(|&(id, name, color)| Region {
                    id: id.to_string(),
                    name: name.to_string(),
                    quiz_color: color.to_string(),
                    assigned_class: None,
                })
                .collect(),
        )
    }

    pub fn get(&self, id: &str) -> Option<&Region> {
        self.by_id.get(id).map(|&idx| &self.regions[idx])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    /// Display text for a region, falling back to the raw identifier.
    pub fn display_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.get(id).map(|r| r.name.as_str()).unwrap_or(id)
    }

    /// Resting fill for a region shape in the given mode.
    pub fn default_fill(&self, id: &str, mode: MapMode) -> &str {
        match mode {
            MapMode::Discover => self
                .get(id)
                .map(|r| r.quiz_color.as_str())
                .unwrap_or(DEFAULT_FILL),
            MapMode::Adventures => DEFAULT_FILL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ukraine_catalog_has_every_region() {
        let catalog = RegionCatalog::ukraine();
        assert_eq!(catalog.iter().count(), 26);
        assert_eq!(catalog.display_name("Lvivska"), "Lviv");
        assert_eq!(catalog.display_name("Kyivska"), "Kyiv Oblast");
    }

    #[test]
    fn lookups_are_case_sensitive() {
        let catalog = RegionCatalog::ukraine();
        assert!(catalog.contains("Odeska"));
        assert!(!catalog.contains("odeska"));
    }

    #[test]
    fn unknown_region_falls_back_to_identifier_and_default_fill() {
        let catalog = RegionCatalog::ukraine();
        assert_eq!(catalog.display_name("Atlantis"), "Atlantis");
        assert_eq!(catalog.default_fill("Atlantis", MapMode::Discover), DEFAULT_FILL);
    }

    #[test]
    fn assigned_class_is_optional_in_serialized_regions() {
        let region: Region =
            serde_json::from_str(r##"{"id":"Lvivska","name":"Lviv","quiz_color":"#ff99d6"}"##)
                .expect("region should parse");
        assert_eq!(region.assigned_class, None);
        let json = serde_json::to_value(&region).expect("serializable");
        assert!(json.get("assigned_class").is_none());
    }

    #[test]
    fn fill_depends_on_mode() {
        let catalog = RegionCatalog::ukraine();
        assert_eq!(catalog.default_fill("Lvivska", MapMode::Discover), "#ff99d6");
        assert_eq!(catalog.default_fill("Lvivska", MapMode::Adventures), DEFAULT_FILL);
    }
}
