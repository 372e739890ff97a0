//! Writes extended m3u playlists that point at files already downloaded under a library root.
//!
//! The library is expected to be laid out as `<artist>/<album>/<track file>`. Names are matched
//! after [`normalize`], and at every level an exact path is tried before scanning the
//! directory's immediate children for an entry containing the wanted name.

use std::path::{Path, PathBuf};

use unicode_normalization::UnicodeNormalization;

use crate::{
    library::{Playlist, PlaylistTrack},
    sanitize::Sanitizer,
};

pub const EXTENSION: &str = "m3u8";
const HEADER: &str = "#EXTM3U\r\n";

/// Decompose accents, keep printable ascii only and uppercase.
pub fn normalize(name: &str) -> String {
    name.nfd()
        .filter(|c| (' '..='~').contains(c))
        .collect::<String>()
        .to_uppercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Dir,
    File,
}

impl EntryKind {
    fn matches(&self, path: &Path) -> bool {
        match self {
            EntryKind::Dir => path.is_dir(),
            EntryKind::File => path.is_file(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistReport {
    pub path: PathBuf,
    pub found: usize,
    pub missing: usize,
}

pub struct Materializer<'s> {
    root: PathBuf,
    sanitizer: &'s dyn Sanitizer,
}

impl<'s> std::fmt::Debug for Materializer<'s> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Materializer")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl<'s> Materializer<'s> {
    pub fn new(root: impl AsRef<Path>, sanitizer: &'s dyn Sanitizer) -> std::io::Result<Self> {
        Ok(Self {
            root: std::path::absolute(root.as_ref())?,
            sanitizer,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Entries of `dir` that may hold `name`: the exact path first, then every child whose
    /// normalized name contains the normalized `name`, sorted by file name.
    ///
    /// A name that normalizes to nothing would match every child, only the exact path is
    /// considered for it.
    async fn candidates(&self, dir: &Path, name: &str, kind: EntryKind) -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        let exact = (!name.is_empty()).then(|| dir.join(name));
        if let Some(exact) = exact.as_ref().filter(|path| kind.matches(path)) {
            candidates.push(exact.clone());
        }

        let needle = normalize(name);
        if needle.is_empty() {
            tracing::debug!("'{}' has no ascii characters, using exact path only", name);
            return candidates;
        }

        let mut readdir = match tokio::fs::read_dir(dir).await {
            Ok(readdir) => readdir,
            Err(err) => {
                tracing::debug!("failed to read directory '{}': {}", dir.display(), err);
                return candidates;
            }
        };

        let mut children = Vec::new();
        loop {
            let entry = match readdir.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(err) => {
                    tracing::warn!("failed to list directory '{}': {}", dir.display(), err);
                    break;
                }
            };
            let path = entry.path();
            if Some(&path) == exact.as_ref() || !kind.matches(&path) {
                continue;
            }
            if normalize(&entry.file_name().to_string_lossy()).contains(&needle) {
                children.push(path);
            }
        }
        children.sort();
        candidates.extend(children);
        candidates
    }

    /// Locate the downloaded file of `track`, searching artist, album and track level in turn.
    pub async fn find_track(&self, track: &PlaylistTrack) -> Option<PathBuf> {
        let artist = self.sanitizer.sanitize(&track.artist_name).await;
        let album = self.sanitizer.sanitize(&track.album_name).await;
        let name = self.sanitizer.sanitize(&track.track_name).await;

        for artist_dir in self.candidates(&self.root, &artist, EntryKind::Dir).await {
            for album_dir in self.candidates(&artist_dir, &album, EntryKind::Dir).await {
                let files = self.candidates(&album_dir, &name, EntryKind::File).await;
                if let Some(file) = files.into_iter().next() {
                    tracing::trace!("found '{}' at {}", track.track_name, file.display());
                    return Some(file);
                }
            }
        }
        None
    }

    /// Write `<root>/<sanitized playlist name>.m3u8`, omitting tracks without a file.
    pub async fn write_playlist(&self, playlist: &Playlist) -> std::io::Result<PlaylistReport> {
        let mut contents = String::from(HEADER);
        let mut found = 0;
        for track in &playlist.tracks {
            match self.find_track(track).await {
                Some(path) => {
                    contents.push_str(&format!(
                        "#EXTINF:-1,{} - {}\r\n{}\r\n",
                        track.artist_name,
                        track.track_name,
                        path.display()
                    ));
                    found += 1;
                }
                None => tracing::warn!(
                    "couldn't find a valid path for '{}' - '{}' - '{}'",
                    track.artist_name,
                    track.album_name,
                    track.track_name
                ),
            }
        }

        let file_name = format!(
            "{}.{}",
            self.sanitizer.sanitize(&playlist.name).await,
            EXTENSION
        );
        let path = self.root.join(file_name);
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(&path, contents).await?;

        let report = PlaylistReport {
            path,
            found,
            missing: playlist.tracks.len() - found,
        };
        tracing::info!(
            "wrote playlist '{}' with {} of {} tracks",
            playlist.name,
            report.found,
            playlist.tracks.len()
        );
        Ok(report)
    }

    pub async fn write_all(&self, playlists: &[Playlist]) -> std::io::Result<Vec<PlaylistReport>> {
        tracing::info!("creating {} playlists", playlists.len());
        let mut reports = Vec::with_capacity(playlists.len());
        for playlist in playlists {
            reports.push(self.write_playlist(playlist).await?);
        }
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sanitize::FilenameSanitizer;

    fn track(artist: &str, album: &str, name: &str) -> PlaylistTrack {
        PlaylistTrack {
            track_name: name.to_owned(),
            album_name: album.to_owned(),
            artist_name: artist.to_owned(),
            track_uri: None,
        }
    }

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("Sigur Rós"), "SIGUR ROS");
        assert_eq!(normalize("Njósnavélin"), "NJOSNAVELIN");
        assert_eq!(normalize("()"), "()");
        assert_eq!(normalize("Sigur Ros"), normalize("Sigur Rós"));
        assert_eq!(normalize("坂本龍一"), "");
    }

    #[tokio::test]
    async fn test_accents_and_prefix() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("Sigur Ros").join("()").join("03 Njosnavelin.flac");
        touch(&file);

        let sanitizer = FilenameSanitizer::default();
        let materializer = Materializer::new(dir.path(), &sanitizer).unwrap();
        let found = materializer
            .find_track(&track("Sigur Rós", "()", "Njósnavélin"))
            .await;
        assert_eq!(found, Some(file));
    }

    #[tokio::test]
    async fn test_exact_path_first() {
        let dir = tempfile::TempDir::new().unwrap();
        let wrong = dir.path().join("Air France").join("Moon Safari").join("Sexy Boy.mp3");
        let right = dir.path().join("Air").join("Moon Safari").join("01 Sexy Boy.mp3");
        touch(&wrong);
        touch(&right);

        let sanitizer = FilenameSanitizer::default();
        let materializer = Materializer::new(dir.path(), &sanitizer).unwrap();
        let found = materializer
            .find_track(&track("Air", "Moon Safari", "Sexy Boy"))
            .await;
        assert_eq!(found, Some(right));
    }

    #[tokio::test]
    async fn test_backtracks_to_next_album() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("Air").join("Moon Safari")).unwrap();
        let file = dir
            .path()
            .join("Air")
            .join("Moon Safari (Deluxe)")
            .join("07 Kelly Watch The Stars.ogg");
        touch(&file);

        let sanitizer = FilenameSanitizer::default();
        let materializer = Materializer::new(dir.path(), &sanitizer).unwrap();
        let found = materializer
            .find_track(&track("Air", "Moon Safari", "Kelly Watch the Stars"))
            .await;
        assert_eq!(found, Some(file));
    }

    #[tokio::test]
    async fn test_non_ascii_names_need_exact_path() {
        let dir = tempfile::TempDir::new().unwrap();
        touch(&dir.path().join("Portishead").join("Dummy").join("01 Mysterons.flac"));

        let sanitizer = FilenameSanitizer::default();
        let materializer = Materializer::new(dir.path(), &sanitizer).unwrap();
        let reference = track("坂本龍一", "音楽図鑑", "戦場のメリークリスマス");
        assert_eq!(materializer.find_track(&reference).await, None);

        let file = dir
            .path()
            .join("坂本龍一")
            .join("音楽図鑑")
            .join("戦場のメリークリスマス");
        touch(&file);
        assert_eq!(materializer.find_track(&reference).await, Some(file));
    }

    #[tokio::test]
    async fn test_write_playlist_skips_missing() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("Sigur Ros").join("()").join("03 Njosnavelin.flac");
        touch(&file);

        let playlist = Playlist {
            name: "Night / Drive Vol. 2".to_owned(),
            tracks: vec![
                track("Sigur Rós", "()", "Njósnavélin"),
                track("Sigur Rós", "()", "Untitled 8"),
                track("Portishead", "Dummy", "Roads"),
            ],
        };
        let sanitizer = FilenameSanitizer::default();
        let materializer = Materializer::new(dir.path(), &sanitizer).unwrap();
        let report = materializer.write_playlist(&playlist).await.unwrap();

        assert_eq!(report.path, dir.path().join("Night _ Drive Vol. 2.m3u8"));
        assert_eq!(report.found, 1);
        assert_eq!(report.missing, 2);

        let contents = std::fs::read_to_string(&report.path).unwrap();
        assert_eq!(
            contents,
            format!(
                "#EXTM3U\r\n#EXTINF:-1,Sigur Rós - Njósnavélin\r\n{}\r\n",
                file.display()
            )
        );
    }

    #[tokio::test]
    async fn test_missing_root() {
        let dir = tempfile::TempDir::new().unwrap();
        let sanitizer = FilenameSanitizer::default();
        let materializer = Materializer::new(dir.path().join("library"), &sanitizer).unwrap();
        assert!(materializer.root().is_absolute());
        let reports = materializer
            .write_all(&[Playlist {
                name: "Empty".to_owned(),
                tracks: vec![track("A", "B", "C")],
            }])
            .await
            .unwrap();
        assert_eq!(reports[0].found, 0);
        assert!(reports[0].path.is_file());
    }
}
