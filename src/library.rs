//! Models for the spotify account data export (`YourLibrary.json`, `Playlist1.json`) and
//! the code that feeds them into a [`Catalog`].

use serde::{Deserialize, Serialize};

use crate::{catalog::Catalog, id, ResourceId};

pub const LIBRARY_FILE_NAME: &str = "YourLibrary.json";
pub const PLAYLIST_FILE_NAME: &str = "Playlist1.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Library {
    pub artists: Vec<LibraryArtist>,
    pub albums: Vec<LibraryAlbum>,
    pub tracks: Vec<LibraryTrack>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryArtist {
    pub name: String,
    pub uri: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryAlbum {
    pub artist: String,
    pub album: String,
    pub uri: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryTrack {
    pub artist: String,
    pub album: String,
    pub track: String,
    pub uri: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaylistExport {
    pub playlists: Vec<PlaylistEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistEntry {
    pub name: String,
    #[serde(default)]
    pub items: Vec<PlaylistItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistItem {
    /// Absent for podcast episodes and local files.
    #[serde(default)]
    pub track: Option<PlaylistTrack>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistTrack {
    pub track_name: String,
    pub album_name: String,
    pub artist_name: String,
    #[serde(default)]
    pub track_uri: Option<String>,
}

/// A named, ordered list of track references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playlist {
    pub name: String,
    pub tracks: Vec<PlaylistTrack>,
}

impl PlaylistExport {
    /// Playlists with every non-track item dropped.
    pub fn playlists(&self) -> Vec<Playlist> {
        self.playlists
            .iter()
            .map(|entry| Playlist {
                name: entry.name.clone(),
                tracks: entry
                    .items
                    .iter()
                    .filter_map(|item| item.track.clone())
                    .collect(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub added: usize,
    pub duplicates: usize,
}

impl LoadStats {
    fn record(&mut self, inserted: bool) {
        if inserted {
            self.added += 1;
        } else {
            self.duplicates += 1;
        }
    }
}

/// Parse a uri coming from export data, malformed ones are treated as absent.
fn source_uri(uri: Option<&str>, context: impl FnOnce() -> String) -> Option<ResourceId> {
    let uri = uri.filter(|uri| !uri.is_empty())?;
    match id::parse_uri(uri) {
        Ok(rid) => Some(rid),
        Err(_) => {
            tracing::warn!("ignoring invalid uri '{}' for {}", uri, context());
            None
        }
    }
}

impl Catalog {
    /// Insert every saved artist, album and track, all marked as in library.
    pub fn load_library(&mut self, library: &Library) -> LoadStats {
        let mut stats = LoadStats::default();
        for artist in &library.artists {
            let uri = source_uri(artist.uri.as_deref(), || format!("'{}'", artist.name));
            stats.record(self.add_artist(&artist.name, uri, true));
        }
        for album in &library.albums {
            let uri = source_uri(album.uri.as_deref(), || {
                format!("'{}' - '{}'", album.artist, album.album)
            });
            stats.record(self.add_album(&album.album, &album.artist, uri, true));
        }
        for track in &library.tracks {
            let uri = source_uri(track.uri.as_deref(), || {
                format!("'{}' - '{}' - '{}'", track.artist, track.album, track.track)
            });
            stats.record(self.add_track(&track.track, &track.album, &track.artist, uri, true));
        }
        tracing::debug!(
            "library loaded: {} added, {} duplicates",
            stats.added,
            stats.duplicates
        );
        stats
    }

    /// Insert every playlist track, marked as in library since it was explicitly requested.
    pub fn load_playlists(&mut self, playlists: &[Playlist]) -> LoadStats {
        let mut stats = LoadStats::default();
        for playlist in playlists {
            for track in &playlist.tracks {
                let uri = source_uri(track.track_uri.as_deref(), || {
                    format!(
                        "'{}' - '{}' - '{}'",
                        track.artist_name, track.album_name, track.track_name
                    )
                });
                stats.record(self.add_track(
                    &track.track_name,
                    &track.album_name,
                    &track.artist_name,
                    uri,
                    true,
                ));
            }
        }
        tracing::debug!(
            "playlists loaded: {} added, {} duplicates",
            stats.added,
            stats.duplicates
        );
        stats
    }
}
