//! Reference catalog of auctionable players.
//!
//! Loaded once at startup and shared read-only by every room through an
//! `Arc<Catalog>`. A player's [`PlayerId`] is its position in the catalog.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use gavel_protocol::{Lakhs, Player, PlayerId, PlayerRole};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("catalog is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("catalog has no players")]
    Empty,

    #[error("catalog record {index} ({name}) is invalid: {reason}")]
    InvalidRecord {
        index: usize,
        name: String,
        reason: String,
    },
}

/// One catalog entry as it appears in a catalog file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRecord {
    pub name: String,
    pub role: PlayerRole,
    pub nationality: String,
    pub base_price: Lakhs,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub image: Option<String>,
}

impl PlayerRecord {
    fn new(name: &str, role: PlayerRole, nationality: &str, base_price: Lakhs) -> Self {
        Self {
            name: name.to_owned(),
            role,
            nationality: nationality.to_owned(),
            base_price,
            rating: None,
            image: None,
        }
    }

    fn into_player(self, id: PlayerId) -> Player {
        Player {
            id,
            name: self.name,
            role: self.role,
            nationality: self.nationality,
            base_price: self.base_price,
            rating: self.rating,
            image: self.image,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    players: Vec<Player>,
}

impl Catalog {
    /// Builds a catalog, numbering players by position.
    ///
    /// # Errors
    /// [`CatalogError::Empty`] for no records; [`CatalogError::InvalidRecord`]
    /// for a blank name or nationality, or a zero base price.
    pub fn from_records(records: Vec<PlayerRecord>) -> Result<Self, CatalogError> {
        if records.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut players = Vec::with_capacity(records.len());
        for (index, record) in records.into_iter().enumerate() {
            let invalid = |reason: &str| CatalogError::InvalidRecord {
                index,
                name: record.name.clone(),
                reason: reason.to_owned(),
            };
            if record.name.trim().is_empty() {
                return Err(invalid("name is blank"));
            }
            if record.nationality.trim().is_empty() {
                return Err(invalid("nationality is blank"));
            }
            if record.base_price == 0 {
                return Err(invalid("base price must be positive"));
            }

            let id = u32::try_from(index).map_err(|_| invalid("too many players"))?;
            players.push(record.into_player(PlayerId(id)));
        }

        Ok(Self { players })
    }

    /// Parses a JSON array of [`PlayerRecord`]s.
    pub fn from_json(data: &[u8]) -> Result<Self, CatalogError> {
        let records: Vec<PlayerRecord> = serde_json::from_slice(data)?;
        Self::from_records(records)
    }

    /// Reads and parses a catalog file.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json(&data)?;
        info!(path = %path.display(), players = catalog.len(), "catalog loaded");
        Ok(catalog)
    }

    /// The reference player list used when no catalog file is configured.
    pub fn builtin() -> Self {
        use PlayerRole::{AllRounder, Batsman, Bowler, WicketKeeper};

        let records = vec![
            PlayerRecord::new("Virat Kohli", Batsman, "India", 200),
            PlayerRecord::new("MS Dhoni", WicketKeeper, "India", 200),
            PlayerRecord::new("Rohit Sharma", Batsman, "India", 200),
            PlayerRecord::new("Jasprit Bumrah", Bowler, "India", 200),
            PlayerRecord::new("Ravindra Jadeja", AllRounder, "India", 200),
            PlayerRecord::new("KL Rahul", WicketKeeper, "India", 200),
            PlayerRecord::new("Hardik Pandya", AllRounder, "India", 200),
            PlayerRecord::new("Shikhar Dhawan", Batsman, "India", 200),
            PlayerRecord::new("Yuzvendra Chahal", Bowler, "India", 100),
            PlayerRecord::new("David Warner", Batsman, "Australia", 200),
            PlayerRecord::new("Kane Williamson", Batsman, "New Zealand", 200),
            PlayerRecord::new("Jos Buttler", WicketKeeper, "England", 200),
            PlayerRecord::new("Andre Russell", AllRounder, "West Indies", 200),
            PlayerRecord::new("Rashid Khan", Bowler, "Afghanistan", 200),
            PlayerRecord::new("Kagiso Rabada", Bowler, "South Africa", 200),
            PlayerRecord::new("Pat Cummins", Bowler, "Australia", 200),
            PlayerRecord::new("Glenn Maxwell", AllRounder, "Australia", 200),
            PlayerRecord::new("Faf du Plessis", Batsman, "South Africa", 150),
            PlayerRecord::new("Sunil Narine", AllRounder, "West Indies", 100),
            PlayerRecord::new("Trent Boult", Bowler, "New Zealand", 150),
            PlayerRecord::new("Shubman Gill", Batsman, "India", 100),
            PlayerRecord::new("Rishabh Pant", WicketKeeper, "India", 200),
            PlayerRecord::new("Ruturaj Gaikwad", Batsman, "India", 100),
            PlayerRecord::new("Prithvi Shaw", Batsman, "India", 75),
            PlayerRecord::new("Ishan Kishan", WicketKeeper, "India", 100),
        ];

        // The list above is non-empty and every record is well-formed.
        let players = records
            .into_iter()
            .enumerate()
            .map(|(index, record)| record.into_player(PlayerId(index as u32)))
            .collect();
        Self { players }
    }

    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id.0 as usize)
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_has_reference_players() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.len(), 25);
        let first = catalog.get(PlayerId(0)).unwrap();
        assert_eq!(first.name, "Virat Kohli");
        assert_eq!(first.base_price, 200);
        assert!(catalog.players().iter().all(|p| p.base_price > 0));
        assert!(catalog.get(PlayerId(25)).is_none());
    }

    #[test]
    fn test_builtin_catalog_ids_match_positions() {
        let catalog = Catalog::builtin();
        for (index, player) in catalog.players().iter().enumerate() {
            assert_eq!(player.id, PlayerId(index as u32));
        }
    }

    #[test]
    fn test_builtin_catalog_overseas_count() {
        let catalog = Catalog::builtin();
        let overseas = catalog.players().iter().filter(|p| p.is_overseas("India")).count();
        assert_eq!(overseas, 11);
    }

    #[test]
    fn test_from_json_reads_camel_case_records() {
        let json = br#"[
            {"name": "A", "role": "Bowler", "nationality": "India", "basePrice": 50},
            {"name": "B", "role": "Wicket-Keeper", "nationality": "England", "basePrice": 75,
             "rating": 8.5, "image": "b.png"}
        ]"#;
        let catalog = Catalog::from_json(json).unwrap();
        assert_eq!(catalog.len(), 2);
        let b = catalog.get(PlayerId(1)).unwrap();
        assert_eq!(b.role, PlayerRole::WicketKeeper);
        assert_eq!(b.rating, Some(8.5));
        assert_eq!(b.image.as_deref(), Some("b.png"));
    }

    #[test]
    fn test_from_records_rejects_empty_list() {
        assert!(matches!(Catalog::from_records(vec![]), Err(CatalogError::Empty)));
    }

    #[test]
    fn test_from_records_rejects_zero_base_price() {
        let records = vec![
            PlayerRecord::new("Ok", PlayerRole::Batsman, "India", 100),
            PlayerRecord::new("Free", PlayerRole::Batsman, "India", 0),
        ];
        match Catalog::from_records(records) {
            Err(CatalogError::InvalidRecord { index, name, .. }) => {
                assert_eq!(index, 1);
                assert_eq!(name, "Free");
            }
            other => panic!("expected InvalidRecord, got {other:?}"),
        }
    }

    #[test]
    fn test_from_json_reports_malformed_input() {
        assert!(matches!(Catalog::from_json(b"{"), Err(CatalogError::Json(_))));
    }

    #[test]
    fn test_load_json_reports_missing_file() {
        let result = Catalog::load_json("/definitely/not/here.json");
        assert!(matches!(result, Err(CatalogError::Io { .. })));
    }
}
