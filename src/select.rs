//! Decides which catalog nodes get downloaded and at which granularity.
//!
//! Every artist branch is resolved at exactly one level, with precedence artist over album
//! over track:
//! - the whole artist when `complete_artist` is set, or when the artist was saved and nothing
//!   below it narrows the request down;
//! - each album when `complete_album` is set or the album itself was saved;
//! - otherwise every saved track.

use crate::{
    catalog::Catalog,
    lookup::Lookup,
    resolver::{DownloadItem, ResolutionRequest, Resolver},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectParams {
    pub complete_artist: bool,
    pub complete_album: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub items: Vec<DownloadItem>,
    pub failures: Vec<ResolutionRequest>,
}

/// Requests to resolve, in catalog order.
pub fn plan(catalog: &Catalog, params: SelectParams) -> Vec<ResolutionRequest> {
    let mut requests = Vec::new();
    for (artist_name, artist) in catalog.iter() {
        let whole_artist = params.complete_artist
            || (artist.info.in_library && !artist.has_library_descendants());
        if whole_artist {
            requests.push(ResolutionRequest::for_artist(artist_name));
            continue;
        }

        for (album_name, album) in artist.albums.iter() {
            if params.complete_album || album.info.in_library {
                requests.push(ResolutionRequest::for_album(artist_name, album_name));
                continue;
            }

            for (track_name, track) in album.tracks.iter() {
                if track.info.in_library {
                    requests.push(ResolutionRequest::for_track(
                        artist_name,
                        album_name,
                        track_name,
                    ));
                }
            }
        }
    }
    requests
}

/// Resolve every planned request, one after the other.
pub async fn select<L>(
    catalog: &mut Catalog,
    resolver: &Resolver<L>,
    params: SelectParams,
) -> Selection
where
    L: Lookup,
{
    let requests = plan(catalog, params);
    tracing::info!("getting uris of {} elements", requests.len());

    let mut selection = Selection::default();
    for request in requests {
        match resolver.resolve(catalog, &request).await {
            Some(uri) => selection.items.push(DownloadItem::new(uri, request)),
            None => {
                if !selection.failures.contains(&request) {
                    selection.failures.push(request);
                }
            }
        }
    }
    tracing::debug!(
        "selection resolved {} items, {} failures",
        selection.items.len(),
        selection.failures.len()
    );
    selection
}

/// Order items by the id segment of their uri and drop repeated uris.
pub fn sort_items(mut items: Vec<DownloadItem>) -> Vec<DownloadItem> {
    items.sort_by(|a, b| {
        a.uri
            .id
            .cmp(&b.uri.id)
            .then(a.uri.resource.cmp(&b.uri.resource))
    });
    items.dedup_by(|a, b| a.uri == b.uri);
    items
}
