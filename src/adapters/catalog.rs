use crate::domain::model::{MenuItem, Venue};
use crate::domain::ports::CatalogProvider;
use crate::utils::error::{BookingError, Result};
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Catalog bundled with the binary.
#[derive(Debug, Clone)]
pub struct StaticCatalog {
    venues: Vec<Venue>,
}

impl StaticCatalog {
    pub fn new(venues: Vec<Venue>) -> Self {
        Self { venues }
    }

    pub fn bundled() -> Self {
        Self::new(bundled_venues())
    }
}

impl Default for StaticCatalog {
    fn default() -> Self {
        Self::bundled()
    }
}

impl CatalogProvider for StaticCatalog {
    fn list_venues(&self) -> Result<Vec<Venue>> {
        Ok(self.venues.clone())
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(rename = "venue", default)]
    venues: Vec<Venue>,
}

/// 從 TOML 檔案讀取場地，每次呼叫都重新讀檔
#[derive(Debug, Clone)]
pub struct TomlCatalog {
    path: PathBuf,
}

impl TomlCatalog {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn parse(content: &str) -> Result<Vec<Venue>> {
        let file: CatalogFile =
            toml::from_str(content).map_err(|e| BookingError::CatalogUnavailable {
                message: format!("TOML parsing error: {}", e),
            })?;
        check_venues(&file.venues)?;
        Ok(file.venues)
    }
}

impl CatalogProvider for TomlCatalog {
    fn list_venues(&self) -> Result<Vec<Venue>> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            BookingError::CatalogUnavailable {
                message: format!("{}: {}", self.path.display(), e),
            }
        })?;
        let venues = Self::parse(&content)?;
        tracing::debug!("Loaded {} venues from {}", venues.len(), self.path.display());
        Ok(venues)
    }
}

fn check_venues(venues: &[Venue]) -> Result<()> {
    let mut ids = HashSet::new();
    for venue in venues {
        if !ids.insert(venue.id) {
            return Err(BookingError::CatalogUnavailable {
                message: format!("duplicate venue id {}", venue.id),
            });
        }

        let mut names = HashSet::new();
        for item in &venue.menu {
            if !names.insert(item.name.as_str()) {
                return Err(BookingError::CatalogUnavailable {
                    message: format!("'{}' listed twice on the menu of {}", item.name, venue.name),
                });
            }
            if item.price.is_sign_negative() && !item.price.is_zero() {
                return Err(BookingError::CatalogUnavailable {
                    message: format!("'{}' at {} has a negative price", item.name, venue.name),
                });
            }
        }
    }
    Ok(())
}

fn venue(
    id: u32,
    name: &str,
    description: &str,
    rating: f32,
    specialties: [&str; 3],
    menu: Vec<MenuItem>,
) -> Venue {
    Venue {
        id,
        name: name.to_string(),
        description: description.to_string(),
        location: "Kuala Lumpur".to_string(),
        rating,
        specialties: specialties.iter().map(|s| s.to_string()).collect(),
        menu,
    }
}

fn bundled_venues() -> Vec<Venue> {
    vec![
        venue(
            1,
            "Nasi Lemak Alor Corner",
            "Authentic Malaysian cuisine featuring the famous Nasi Lemak, with fragrant coconut rice, spicy sambal, and crispy anchovies.",
            4.5,
            ["Nasi Lemak", "Chicken Rendang", "Ayam Kecap"],
            vec![
                MenuItem::new("Nasi Lemak", dec!(8)),
                MenuItem::new("Chicken Rendang", dec!(12)),
                MenuItem::new("Ayam Kecap", dec!(10)),
            ],
        ),
        venue(
            2,
            "Kedai Makan Suki",
            "A traditional Malaysian kedai makan serving authentic local dishes with a modern twist.",
            4.6,
            ["Nasi Lemak", "Laksa", "Bakso"],
            vec![
                MenuItem::new("Nasi Lemak", dec!(7)),
                MenuItem::new("Laksa", dec!(9)),
                MenuItem::new("Bakso", dec!(8)),
            ],
        ),
        venue(
            3,
            "Old Town White Coffee",
            "Malaysia's halal kopi tiam restaurant specialises in white coffee, teh tarik, nasi lemak and noodle dishes",
            4.8,
            ["Nasi Lemak", "Curry Mee", "White Coffee"],
            vec![
                MenuItem::new("Nasi Lemak", dec!(9)),
                MenuItem::new("Curry Mee", dec!(11)),
                MenuItem::new("White Coffee", dec!(6)),
            ],
        ),
        venue(
            4,
            "Leaf n Co",
            "Leaf n Co is a cozy café to enjoy signature Nasi Lemak, Spaghetti in a warm space.",
            4.6,
            ["Nasi Lemak", "Spaghetti", "Croissant"],
            vec![
                MenuItem::new("Nasi Lemak", dec!(10)),
                MenuItem::new("Spaghetti", dec!(13)),
                MenuItem::new("Croissant", dec!(7)),
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_bundled_catalog() {
        let venues = StaticCatalog::bundled().list_venues().unwrap();
        assert_eq!(venues.len(), 4);
        assert_eq!(venues[0].name, "Nasi Lemak Alor Corner");
        assert_eq!(venues[0].menu_item("Chicken Rendang").unwrap().price, dec!(12));
        assert!(venues.iter().all(|v| v.menu.len() == 3));
    }

    #[test]
    fn test_toml_catalog_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        let content = r#"
[[venue]]
id = 7
name = "Mamak Stall"
location = "Penang"
menu = [
    { name = "Roti Canai", price = 2.5 },
    { name = "Teh Tarik", price = "3.20" },
]
"#;
        temp_file.write_all(content.as_bytes()).unwrap();

        let venues = TomlCatalog::new(temp_file.path()).list_venues().unwrap();
        assert_eq!(venues.len(), 1);
        assert_eq!(venues[0].location, "Penang");
        assert_eq!(venues[0].menu[0].price, dec!(2.5));
        assert_eq!(venues[0].menu[1].price, dec!(3.20));
        assert!(venues[0].specialties.is_empty());
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let result = TomlCatalog::new("/nonexistent/venues.toml").list_venues();
        assert!(matches!(result, Err(BookingError::CatalogUnavailable { .. })));
    }

    #[test]
    fn test_duplicate_menu_item_rejected() {
        let content = r#"
[[venue]]
id = 1
name = "Dup"
menu = [
    { name = "Laksa", price = 9 },
    { name = "Laksa", price = 10 },
]
"#;
        assert!(matches!(
            TomlCatalog::parse(content),
            Err(BookingError::CatalogUnavailable { .. })
        ));
    }
}
