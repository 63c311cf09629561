use std::{collections::HashMap, io::ErrorKind, path::PathBuf, sync::Mutex};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::Color;

/// Document written to disk. Colors are kept as hex strings so the file stays
/// hand-editable.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredColors {
    #[serde(default)]
    tag_colors: HashMap<String, String>,
}

/// Persisted tag → base color assignments. A tag keeps its color across runs
/// once assigned; unseen tags get a random one which is saved immediately.
pub struct TagColorStore {
    path: PathBuf,
    colors: Mutex<HashMap<String, Color>>,
}

impl TagColorStore {
    /// Reads the stored assignments. A missing file is an empty store, a
    /// malformed entry loses only that entry.
    pub fn load(path: PathBuf) -> Self {
        let colors = match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<StoredColors>(&text) {
                Ok(stored) => parse_stored(stored),
                Err(e) => {
                    warn!("Tag colors in {path:?} are corrupted, starting over: {e}");
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                warn!("Can't read tag colors from {path:?}: {e}");
                HashMap::new()
            }
        };

        Self {
            path,
            colors: Mutex::new(colors),
        }
    }

    /// Returns the color assigned to `tag`, first assigning and persisting a
    /// random one if the tag is new. A failed save is logged and the
    /// assignment kept for the current run.
    pub fn get_or_assign(&self, tag: &str) -> Color {
        let mut colors = self.colors.lock().unwrap();
        if let Some(color) = colors.get(tag) {
            return *color;
        }

        let color = Color::random(&mut rand::thread_rng());
        colors.insert(tag.to_string(), color);
        if let Err(e) = self.save(&colors) {
            warn!("Failed to save tag colors to {:?}: {e}", self.path);
        }
        color
    }

    fn save(&self, colors: &HashMap<String, Color>) -> Result<()> {
        let stored = StoredColors {
            tag_colors: colors
                .iter()
                .map(|(tag, color)| (tag.clone(), color.to_hex()))
                .collect(),
        };
        std::fs::write(&self.path, serde_json::to_string_pretty(&stored)?)?;
        Ok(())
    }
}

fn parse_stored(stored: StoredColors) -> HashMap<String, Color> {
    stored
        .tag_colors
        .into_iter()
        .filter_map(|(tag, hex)| match Color::from_hex(&hex) {
            Ok(color) => Some((tag, color)),
            Err(e) => {
                warn!("Dropping stored color {hex} for tag {tag}: {e}");
                None
            }
        })
        .collect()
}
