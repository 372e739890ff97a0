use crate::{catalog::Catalog, lookup::Lookup, Resource, ResourceId};

/// Path of a catalog node at artist, album or track granularity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolutionRequest {
    artist: String,
    album: Option<String>,
    track: Option<String>,
}

impl ResolutionRequest {
    pub fn for_artist(artist: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            album: None,
            track: None,
        }
    }

    pub fn for_album(artist: impl Into<String>, album: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            album: Some(album.into()),
            track: None,
        }
    }

    pub fn for_track(
        artist: impl Into<String>,
        album: impl Into<String>,
        track: impl Into<String>,
    ) -> Self {
        Self {
            artist: artist.into(),
            album: Some(album.into()),
            track: Some(track.into()),
        }
    }

    pub fn artist(&self) -> &str {
        &self.artist
    }

    pub fn album(&self) -> Option<&str> {
        self.album.as_deref()
    }

    pub fn track(&self) -> Option<&str> {
        self.track.as_deref()
    }

    /// The most specific granularity of this request.
    pub fn resource(&self) -> Resource {
        match (&self.album, &self.track) {
            (_, Some(_)) => Resource::Track,
            (Some(_), None) => Resource::Album,
            (None, None) => Resource::Artist,
        }
    }

    /// Field filtered search query built from every present field.
    pub fn search_query(&self) -> String {
        let mut query = String::new();
        if let Some(track) = &self.track {
            query.push_str(&format!("track:{} ", track));
        }
        if let Some(album) = &self.album {
            query.push_str(&format!("album:{} ", album));
        }
        query.push_str(&format!("artist:{}", self.artist));
        query
    }
}

impl std::fmt::Display for ResolutionRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "'{}'", self.artist)?;
        if let Some(album) = &self.album {
            write!(f, " - '{}'", album)?;
        }
        if let Some(track) = &self.track {
            write!(f, " - '{}'", track)?;
        }
        Ok(())
    }
}

/// A resolved uri together with the catalog node it was resolved for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadItem {
    pub uri: ResourceId,
    pub request: ResolutionRequest,
}

impl DownloadItem {
    pub fn new(uri: ResourceId, request: ResolutionRequest) -> Self {
        Self { uri, request }
    }

    /// Name of the node the uri points at, derived from the uri's kind.
    pub fn name(&self) -> &str {
        let request = &self.request;
        match self.uri.resource {
            Resource::Artist => request.artist(),
            Resource::Album => request.album().unwrap_or(request.artist()),
            Resource::Track => request
                .track()
                .or(request.album())
                .unwrap_or(request.artist()),
        }
    }
}

/// Produces canonical uris for catalog nodes, preferring the uri already stored on the node.
#[derive(Debug)]
pub struct Resolver<L> {
    lookup: L,
}

impl<L> Resolver<L>
where
    L: Lookup,
{
    pub fn new(lookup: L) -> Self {
        Self { lookup }
    }

    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    /// Resolve `request`, storing a freshly looked up uri on the catalog node.
    ///
    /// Returns `None` when the lookup found nothing usable, the caller is expected to collect the
    /// request as a failure.
    pub async fn resolve(
        &self,
        catalog: &mut Catalog,
        request: &ResolutionRequest,
    ) -> Option<ResourceId> {
        let (album, track) = (request.album(), request.track());
        if let Some(uri) = catalog
            .info(request.artist(), album, track)
            .and_then(|info| info.uri.clone())
        {
            tracing::trace!("cached uri {} for {}", uri, request);
            return Some(uri);
        }

        let found = match self.lookup.search(request).await {
            Ok(Some(uri)) if uri.resource == request.resource() => uri,
            Ok(Some(uri)) => {
                tracing::warn!(
                    "lookup for {} returned a {} uri ({}), ignoring it",
                    request,
                    uri.resource,
                    uri
                );
                return None;
            }
            Ok(None) => {
                tracing::error!("cannot get uri for {}, do it manually", request);
                return None;
            }
            Err(err) => {
                tracing::error!("lookup for {} failed: {}", request, err);
                return None;
            }
        };

        match catalog.info_mut(request.artist(), album, track) {
            Some(info) => info.uri = Some(found.clone()),
            None => tracing::debug!("{} is not in the catalog, uri not stored", request),
        }
        tracing::debug!("resolved {} to {}", request, found);
        Some(found)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{
        collections::HashMap,
        sync::atomic::{AtomicUsize, Ordering},
    };

    use super::*;
    use crate::lookup::LookupError;

    /// Lookup answering from a fixed table and counting every call.
    #[derive(Debug, Default)]
    pub struct FakeLookup {
        answers: HashMap<ResolutionRequest, ResourceId>,
        calls: AtomicUsize,
    }

    impl FakeLookup {
        pub fn with(mut self, request: ResolutionRequest, uri: &str) -> Self {
            self.answers
                .insert(request, ResourceId::from_uri(uri).unwrap());
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl Lookup for FakeLookup {
        async fn search(
            &self,
            request: &ResolutionRequest,
        ) -> Result<Option<ResourceId>, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.answers.get(request).cloned())
        }
    }

    pub fn uri(kind: &str, tail: &str) -> String {
        format!("spotify:{kind}:{tail:0>22}")
    }

    #[test]
    fn test_request_granularity() {
        assert_eq!(ResolutionRequest::for_artist("A").resource(), Resource::Artist);
        assert_eq!(ResolutionRequest::for_album("A", "B").resource(), Resource::Album);
        assert_eq!(ResolutionRequest::for_track("A", "B", "C").resource(), Resource::Track);
    }

    #[test]
    fn test_search_query() {
        assert_eq!(
            ResolutionRequest::for_track("Portishead", "Dummy", "Roads").search_query(),
            "track:Roads album:Dummy artist:Portishead"
        );
        assert_eq!(
            ResolutionRequest::for_album("Portishead", "Dummy").search_query(),
            "album:Dummy artist:Portishead"
        );
        assert_eq!(
            ResolutionRequest::for_artist("Portishead").search_query(),
            "artist:Portishead"
        );
    }

    #[test]
    fn test_request_display() {
        let request = ResolutionRequest::for_album("B", "X");
        assert_eq!(request.to_string(), "'B' - 'X'");
    }

    #[test]
    fn test_download_item_name() {
        let request = ResolutionRequest::for_track("Portishead", "Dummy", "Roads");
        let item = DownloadItem::new(ResourceId::from_uri(&uri("track", "1")).unwrap(), request);
        assert_eq!(item.name(), "Roads");
        let request = ResolutionRequest::for_artist("Portishead");
        let item = DownloadItem::new(ResourceId::from_uri(&uri("artist", "1")).unwrap(), request);
        assert_eq!(item.name(), "Portishead");
    }

    #[tokio::test]
    async fn test_cached_uri_skips_lookup() {
        let mut catalog = Catalog::new();
        let cached = ResourceId::from_uri(&uri("track", "cached")).unwrap();
        catalog.add_track("Roads", "Dummy", "Portishead", Some(cached.clone()), true);

        let resolver = Resolver::new(FakeLookup::default());
        let request = ResolutionRequest::for_track("Portishead", "Dummy", "Roads");
        assert_eq!(resolver.resolve(&mut catalog, &request).await, Some(cached));
        assert_eq!(resolver.lookup().calls(), 0);
    }

    #[tokio::test]
    async fn test_resolved_uri_is_cached() {
        let mut catalog = Catalog::new();
        catalog.add_album("Dummy", "Portishead", None, true);
        let request = ResolutionRequest::for_album("Portishead", "Dummy");
        let resolver =
            Resolver::new(FakeLookup::default().with(request.clone(), &uri("album", "dummy")));

        let first = resolver.resolve(&mut catalog, &request).await;
        let second = resolver.resolve(&mut catalog, &request).await;
        assert_eq!(first, second);
        assert_eq!(first.map(|u| u.to_uri()), Some(uri("album", "dummy")));
        assert_eq!(resolver.lookup().calls(), 1);

        let info = catalog.info("Portishead", Some("Dummy"), None).unwrap();
        assert!(info.in_library);
        assert!(info.uri.is_some());
    }

    #[tokio::test]
    async fn test_no_match() {
        let mut catalog = Catalog::new();
        catalog.add_artist("Nobody", None, false);
        let resolver = Resolver::new(FakeLookup::default());
        let request = ResolutionRequest::for_artist("Nobody");
        assert_eq!(resolver.resolve(&mut catalog, &request).await, None);
        assert_eq!(resolver.lookup().calls(), 1);
        let info = catalog.info("Nobody", None, None).unwrap();
        assert!(info.uri.is_none());
        assert!(!info.in_library);
    }

    #[tokio::test]
    async fn test_wrong_kind_is_rejected() {
        let mut catalog = Catalog::new();
        catalog.add_artist("Air", None, true);
        let request = ResolutionRequest::for_artist("Air");
        let resolver =
            Resolver::new(FakeLookup::default().with(request.clone(), &uri("track", "air")));
        assert_eq!(resolver.resolve(&mut catalog, &request).await, None);
        assert!(catalog.info("Air", None, None).unwrap().uri.is_none());
    }
}
