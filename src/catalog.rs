//! In-memory artist → album → track tree built from the user's library and playlists.
//!
//! Nodes are keyed by name among their siblings and the tree only ever grows: inserting a
//! name that already exists is a no-op reported through the boolean return value.

use ahash::AHashMap;
use serde::{ser::SerializeMap, Serialize, Serializer};

use crate::ResourceId;

/// Fields shared by every node in the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NodeInfo {
    /// Canonical spotify uri, filled from source data or by the resolver.
    pub uri: Option<ResourceId>,
    /// The node was explicitly saved or requested by the user.
    pub in_library: bool,
}

impl NodeInfo {
    fn new(uri: Option<ResourceId>, in_library: bool) -> Self {
        Self { uri, in_library }
    }
}

/// Name keyed children that remember their insertion order.
#[derive(Debug, Clone)]
pub struct Children<T> {
    entries: Vec<(String, T)>,
    index: AHashMap<String, usize>,
}

impl<T> Default for Children<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: AHashMap::new(),
        }
    }
}

impl<T> Children<T> {
    pub fn get(&self, name: &str) -> Option<&T> {
        self.index.get(name).map(|&idx| &self.entries[idx].1)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut T> {
        self.index.get(name).map(|&idx| &mut self.entries[idx].1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Child names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts the value produced by `make` unless `name` is already present.
    /// Returns whether an insertion happened together with the entry stored under `name`.
    fn get_or_insert_with(&mut self, name: &str, make: impl FnOnce() -> T) -> (bool, &mut T) {
        let (inserted, idx) = match self.index.get(name) {
            Some(&idx) => (false, idx),
            None => {
                let idx = self.entries.len();
                self.entries.push((name.to_owned(), make()));
                self.index.insert(name.to_owned(), idx);
                (true, idx)
            }
        };
        (inserted, &mut self.entries[idx].1)
    }
}

impl<T: Serialize> Serialize for Children<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Track {
    #[serde(flatten)]
    pub info: NodeInfo,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Album {
    #[serde(flatten)]
    pub info: NodeInfo,
    pub tracks: Children<Track>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Artist {
    #[serde(flatten)]
    pub info: NodeInfo,
    pub albums: Children<Album>,
}

impl Artist {
    /// True if any album or track below this artist was explicitly requested.
    pub fn has_library_descendants(&self) -> bool {
        self.albums.iter().any(|(_, album)| {
            album.info.in_library || album.tracks.iter().any(|(_, track)| track.info.in_library)
        })
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Catalog {
    artists: Children<Artist>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_artist(&mut self, name: &str, uri: Option<ResourceId>, in_library: bool) -> bool {
        let (inserted, _) = self.artists.get_or_insert_with(name, || Artist {
            info: NodeInfo::new(uri, in_library),
            albums: Default::default(),
        });
        if inserted {
            tracing::trace!("added artist '{}'", name);
        }
        inserted
    }

    pub fn add_album(
        &mut self,
        name: &str,
        artist: &str,
        uri: Option<ResourceId>,
        in_library: bool,
    ) -> bool {
        let (_, artist_node) = self.artists.get_or_insert_with(artist, Artist::default);
        let (inserted, _) = artist_node.albums.get_or_insert_with(name, || Album {
            info: NodeInfo::new(uri, in_library),
            tracks: Default::default(),
        });
        if inserted {
            tracing::trace!("added album '{}' to '{}'", name, artist);
        }
        inserted
    }

    pub fn add_track(
        &mut self,
        name: &str,
        album: &str,
        artist: &str,
        uri: Option<ResourceId>,
        in_library: bool,
    ) -> bool {
        let (_, artist_node) = self.artists.get_or_insert_with(artist, Artist::default);
        let (_, album_node) = artist_node.albums.get_or_insert_with(album, Album::default);
        let (inserted, _) = album_node.tracks.get_or_insert_with(name, || Track {
            info: NodeInfo::new(uri, in_library),
        });
        if inserted {
            tracing::trace!("added track '{}' to '{}' - '{}'", name, artist, album);
        }
        inserted
    }

    pub fn get_artist(&self, artist: &str) -> Option<&Artist> {
        self.artists.get(artist)
    }

    pub fn get_album(&self, artist: &str, album: &str) -> Option<&Album> {
        self.get_artist(artist)?.albums.get(album)
    }

    pub fn get_track(&self, artist: &str, album: &str, track: &str) -> Option<&Track> {
        self.get_album(artist, album)?.tracks.get(track)
    }

    /// Shared fields of the node at the given path.
    ///
    /// A track is only addressed when `album` is also given.
    pub fn info(
        &self,
        artist: &str,
        album: Option<&str>,
        track: Option<&str>,
    ) -> Option<&NodeInfo> {
        let artist_node = self.artists.get(artist)?;
        let Some(album) = album else {
            return Some(&artist_node.info);
        };
        let album_node = artist_node.albums.get(album)?;
        match track {
            Some(track) => album_node.tracks.get(track).map(|t| &t.info),
            None => Some(&album_node.info),
        }
    }

    pub fn info_mut(
        &mut self,
        artist: &str,
        album: Option<&str>,
        track: Option<&str>,
    ) -> Option<&mut NodeInfo> {
        let artist_node = self.artists.get_mut(artist)?;
        let Some(album) = album else {
            return Some(&mut artist_node.info);
        };
        let album_node = artist_node.albums.get_mut(album)?;
        match track {
            Some(track) => album_node.tracks.get_mut(track).map(|t| &mut t.info),
            None => Some(&mut album_node.info),
        }
    }

    /// Artist names in insertion order.
    pub fn artists(&self) -> impl Iterator<Item = &str> {
        self.artists.names()
    }

    /// Album names of `artist` in insertion order, empty if the artist is unknown.
    pub fn albums<'a>(&'a self, artist: &str) -> impl Iterator<Item = &'a str> {
        self.artists
            .get(artist)
            .into_iter()
            .flat_map(|artist| artist.albums.names())
    }

    /// Track names of `artist` - `album` in insertion order, empty if the album is unknown.
    pub fn tracks<'a>(&'a self, artist: &str, album: &str) -> impl Iterator<Item = &'a str> {
        self.get_album(artist, album)
            .into_iter()
            .flat_map(|album| album.tracks.names())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Artist)> {
        self.artists.iter()
    }

    pub fn artist_count(&self) -> usize {
        self.artists.len()
    }

    pub fn album_count(&self) -> usize {
        self.artists.iter().map(|(_, a)| a.albums.len()).sum()
    }

    pub fn track_count(&self) -> usize {
        self.artists
            .iter()
            .flat_map(|(_, a)| a.albums.iter())
            .map(|(_, a)| a.tracks.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.artists.is_empty()
    }
}
