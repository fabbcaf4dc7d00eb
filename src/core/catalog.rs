use serde::{Deserialize, Serialize};

use crate::utils::error::Result;
use crate::utils::validation::{validate_non_empty_string, validate_url, Validate};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneSource {
    pub label: String,
    pub url: String,
}

/// One provider: an ordered zone-label → URL list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceGroup {
    pub name: String,
    #[serde(default)]
    pub zones: Vec<ZoneSource>,
}

impl SourceGroup {
    pub fn new(name: &str, zones: &[(&str, &str)]) -> Self {
        Self {
            name: name.to_string(),
            zones: zones
                .iter()
                .map(|(label, url)| ZoneSource {
                    label: label.to_string(),
                    url: url.to_string(),
                })
                .collect(),
        }
    }
}

/// Ordered provider groups. Order only decides processing order; every
/// provider's rows are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCatalog {
    #[serde(default)]
    groups: Vec<SourceGroup>,
}

impl SourceCatalog {
    pub fn new(groups: Vec<SourceGroup>) -> Self {
        Self { groups }
    }

    pub fn groups(&self) -> &[SourceGroup] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(|g| g.zones.is_empty())
    }

    /// Total number of (zone, url) pairs.
    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.zones.len()).sum()
    }

    /// `(group, source)` pairs in processing order.
    pub fn iter(&self) -> impl Iterator<Item = (&SourceGroup, &ZoneSource)> {
        self.groups
            .iter()
            .flat_map(|group| group.zones.iter().map(move |zone| (group, zone)))
    }
}

impl Default for SourceCatalog {
    fn default() -> Self {
        Self::new(vec![
            SourceGroup::new(
                "ru-tld.ru",
                &[
                    ("net.ru", "https://ru-tld.ru/files/NET-RU_Domains_ru-tld.ru.gz"),
                    ("org.ru", "https://ru-tld.ru/files/ORG-RU_Domains_ru-tld.ru.gz"),
                    ("pp.ru", "https://ru-tld.ru/files/PP-RU_Domains_ru-tld.ru.gz"),
                    ("*.ru", "https://ru-tld.ru/files/3d_domains_ru-tld.ru.gz"),
                    ("ru", "https://ru-tld.ru/files/RU_Domains_ru-tld.ru.gz"),
                    ("rf", "https://ru-tld.ru/files/RF_Domains_ru-tld.ru.gz"),
                    ("su", "https://ru-tld.ru/files/SU_Domains_ru-tld.ru.gz"),
                ],
            ),
            SourceGroup::new(
                "partner.r01.ru",
                &[
                    ("ru", "https://partner.r01.ru/zones/ru_domains.gz"),
                    ("rf", "https://partner.r01.ru/zones/rf_domains.gz"),
                    ("su", "https://partner.r01.ru/zones/su_domains.gz"),
                ],
            ),
        ])
    }
}

impl Validate for SourceCatalog {
    fn validate(&self) -> Result<()> {
        for (gi, group) in self.groups.iter().enumerate() {
            validate_non_empty_string(&format!("catalog.groups[{}].name", gi), &group.name)?;
            for (zi, zone) in group.zones.iter().enumerate() {
                let field = format!("catalog.groups[{}].zones[{}]", gi, zi);
                validate_non_empty_string(&format!("{}.label", field), &zone.label)?;
                validate_url(&format!("{}.url", field), &zone.url)?;
            }
        }
        Ok(())
    }
}
