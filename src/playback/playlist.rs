use serde::{Deserialize, Serialize};
use tracing::debug;

/// What kind of backend an entry resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// Recorded session file, locator is a path
    Session,
    /// Synthetic generator, locator names the variant
    Synthetic,
    /// Pre-segmented dataset, locator names the variant
    Dataset,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistEntry {
    pub display_name: String,
    pub source_type: SourceType,
    /// Path or variant name, interpreted per `source_type`
    pub source_locator: String,
    pub category: String,
}

impl PlaylistEntry {
    pub fn session(display_name: &str, path: &str, category: &str) -> Self {
        Self {
            display_name: display_name.to_string(),
            source_type: SourceType::Session,
            source_locator: path.to_string(),
            category: category.to_string(),
        }
    }

    pub fn synthetic(display_name: &str, variant: &str, category: &str) -> Self {
        Self {
            display_name: display_name.to_string(),
            source_type: SourceType::Synthetic,
            source_locator: variant.to_string(),
            category: category.to_string(),
        }
    }

    pub fn dataset(display_name: &str, variant: &str, category: &str) -> Self {
        Self {
            display_name: display_name.to_string(),
            source_type: SourceType::Dataset,
            source_locator: variant.to_string(),
            category: category.to_string(),
        }
    }
}

/// Position within the playlist, 1-based for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistInfo {
    pub name: String,
    pub index: usize,
    pub total: usize,
    pub category: String,
}

/// Ordered session sequence. The playlist only decides *which* entry is
/// current; loading it and driving playback belongs to the orchestrator.
pub struct Playlist {
    entries: Vec<PlaylistEntry>,
    current: usize,
    looping: bool,
}

impl Playlist {
    pub fn new(entries: Vec<PlaylistEntry>) -> Self {
        Self {
            entries,
            current: 0,
            looping: true,
        }
    }

    /// Whether `next()`/`previous()` wrap at the ends or stop there
    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[PlaylistEntry] {
        &self.entries
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> Option<&PlaylistEntry> {
        self.entries.get(self.current)
    }

    /// Advance to the next entry. At the last entry this wraps to the first
    /// when looping, otherwise returns `None` and stays put.
    pub fn next(&mut self) -> Option<&PlaylistEntry> {
        if self.entries.is_empty() {
            return None;
        }
        if self.current + 1 < self.entries.len() {
            self.current += 1;
        } else if self.looping {
            self.current = 0;
        } else {
            return None;
        }
        debug!(index = self.current, "playlist advanced");
        self.entries.get(self.current)
    }

    pub fn previous(&mut self) -> Option<&PlaylistEntry> {
        if self.entries.is_empty() {
            return None;
        }
        if self.current > 0 {
            self.current -= 1;
        } else if self.looping {
            self.current = self.entries.len() - 1;
        } else {
            return None;
        }
        debug!(index = self.current, "playlist stepped back");
        self.entries.get(self.current)
    }

    /// Jump to an entry by 0-based index; bad indexes leave the playlist
    /// untouched
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.entries.len() {
            return false;
        }
        self.current = index;
        true
    }

    pub fn add_entry(&mut self, entry: PlaylistEntry) {
        self.entries.push(entry);
    }

    pub fn current_info(&self) -> Option<PlaylistInfo> {
        self.current().map(|entry| PlaylistInfo {
            name: entry.display_name.clone(),
            index: self.current + 1,
            total: self.entries.len(),
            category: entry.category.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_entries() -> Vec<PlaylistEntry> {
        vec![
            PlaylistEntry::synthetic("Calm Waters", "calm", "relaxation"),
            PlaylistEntry::dataset("Deep Focus", "focus", "focus"),
            PlaylistEntry::session("Morning Run", "/tmp/run.json", "recorded"),
        ]
    }

    #[test]
    fn test_next_wraps_when_looping() {
        let mut playlist = Playlist::new(three_entries());
        playlist.next();
        playlist.next();
        let entry = playlist.next().unwrap();
        assert_eq!(entry.display_name, "Calm Waters");
        assert_eq!(playlist.current_index(), 0);
    }

    #[test]
    fn test_next_stops_without_looping() {
        let mut playlist = Playlist::new(three_entries()).with_looping(false);
        playlist.select(2);
        assert!(playlist.next().is_none());
        assert_eq!(playlist.current_index(), 2);
    }

    #[test]
    fn test_previous_wraps_when_looping() {
        let mut playlist = Playlist::new(three_entries());
        let entry = playlist.previous().unwrap();
        assert_eq!(entry.display_name, "Morning Run");
    }

    #[test]
    fn test_previous_stops_without_looping() {
        let mut playlist = Playlist::new(three_entries()).with_looping(false);
        assert!(playlist.previous().is_none());
        assert_eq!(playlist.current_index(), 0);
    }

    #[test]
    fn test_select_rejects_out_of_range() {
        let mut playlist = Playlist::new(three_entries());
        assert!(playlist.select(1));
        assert!(!playlist.select(3));
        assert_eq!(playlist.current_index(), 1);
    }

    #[test]
    fn test_current_info_is_one_based() {
        let mut playlist = Playlist::new(three_entries());
        playlist.select(1);
        let info = playlist.current_info().unwrap();
        assert_eq!(info.index, 2);
        assert_eq!(info.total, 3);
        assert_eq!(info.name, "Deep Focus");
    }

    #[test]
    fn test_add_entry_extends_sequence() {
        let mut playlist = Playlist::new(three_entries());
        playlist.add_entry(PlaylistEntry::session("Custom", "/tmp/custom.eeg", "custom"));
        assert_eq!(playlist.len(), 4);
        playlist.select(3);
        assert_eq!(playlist.current().unwrap().display_name, "Custom");
    }

    #[test]
    fn test_empty_playlist() {
        let mut playlist = Playlist::new(Vec::new());
        assert!(playlist.current().is_none());
        assert!(playlist.next().is_none());
        assert!(playlist.current_info().is_none());
    }

    #[test]
    fn test_entry_serializes_snake_case() {
        let entry = PlaylistEntry::dataset("Deep Focus", "focus", "focus");
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"source_type\":\"dataset\""));
        let back: PlaylistEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }
}
