use serde::{Deserialize, Serialize};
use thiserror::Error;

type Result<T> = std::result::Result<T, IdParseError>;

/// Number of characters in the id segment of a spotify uri.
pub const ID_LENGTH: usize = 22;

const URI_SCHEME: &str = "spotify";
const URL_HOST: &str = "open.spotify.com/";

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash)]
#[error("Invalid Spotify ID")]
pub struct IdParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Artist,
    Album,
    Track,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Artist => "artist",
            Resource::Album => "album",
            Resource::Track => "track",
        }
    }

    fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "artist" => Some(Resource::Artist),
            "album" => Some(Resource::Album),
            "track" => Some(Resource::Track),
            _ => None,
        }
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The 22 character id segment of a spotify uri.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SpotifyId(String);

impl SpotifyId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SpotifyId {
    type Error = IdParseError;

    fn try_from(value: String) -> Result<Self> {
        if value.chars().count() != ID_LENGTH {
            return Err(IdParseError);
        }
        Ok(Self(value))
    }
}

impl From<SpotifyId> for String {
    fn from(value: SpotifyId) -> Self {
        value.0
    }
}

impl std::fmt::Display for SpotifyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceId {
    pub resource: Resource,
    pub id: SpotifyId,
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", URI_SCHEME, self.resource, self.id)
    }
}

impl From<(Resource, SpotifyId)> for ResourceId {
    fn from((resource, id): (Resource, SpotifyId)) -> Self {
        Self { resource, id }
    }
}

impl TryFrom<String> for ResourceId {
    type Error = IdParseError;

    fn try_from(value: String) -> Result<Self> {
        parse_uri(&value)
    }
}

impl From<ResourceId> for String {
    fn from(value: ResourceId) -> Self {
        value.to_uri()
    }
}

impl std::str::FromStr for ResourceId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self> {
        parse_uri(s)
    }
}

impl ResourceId {
    pub fn new(resource: Resource, id: SpotifyId) -> Self {
        Self { resource, id }
    }

    pub fn from_uri(uri: &str) -> Result<Self> {
        parse_uri(uri)
    }

    pub fn to_uri(&self) -> String {
        self.to_string()
    }
}

/// Returns true if `uri` has the form `spotify:<artist|album|track>:<22 chars>`.
pub fn is_valid_uri(uri: &str) -> bool {
    parse_uri(uri).is_ok()
}

/// Extract the resource kind of a valid uri.
pub fn uri_kind(uri: &str) -> Option<Resource> {
    parse_uri(uri).ok().map(|rid| rid.resource)
}

/// Parse either a spotify uri or an open.spotify.com url.
pub fn parse(identifier: &str) -> Result<ResourceId> {
    let identifier = identifier.trim();
    if let Ok(id) = parse_uri(identifier) {
        return Ok(id);
    }

    if let Ok(id) = parse_url(identifier) {
        return Ok(id);
    }

    Err(IdParseError)
}

pub fn parse_uri(uri: &str) -> Result<ResourceId> {
    // spotify:artist:6mdiAmATAx73kdxrNrnlao
    // spotify:album:7I9Wh2IgvI3Nnr8Z1ZSWby
    // spotify:track:4OROzZUy6gOWN4UGQVaZMF
    let mut parts = uri.split(':');
    let (Some(scheme), Some(kind), Some(id), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(IdParseError);
    };
    if scheme != URI_SCHEME {
        return Err(IdParseError);
    }
    let resource = Resource::from_segment(kind).ok_or(IdParseError)?;
    let id = parse_id(id)?;
    Ok(ResourceId::new(resource, id))
}

pub fn parse_id(id: &str) -> Result<SpotifyId> {
    SpotifyId::try_from(id.to_owned())
}

pub fn parse_url(url: &str) -> Result<ResourceId> {
    // https://open.spotify.com/artist/6mdiAmATAx73kdxrNrnlao?si=8a674ea0e87e44ca
    // https://open.spotify.com/album/7I9Wh2IgvI3Nnr8Z1ZSWby?si=WVIiAtxmRvCFhvZ3naN5OA
    // https://open.spotify.com/track/4OROzZUy6gOWN4UGQVaZMF?si=d976e0d51c9c4a73
    let idx = url.find(URL_HOST).ok_or(IdParseError)?;
    let rem = &url[idx + URL_HOST.len()..];
    let rem = rem.split(['?', '#']).next().unwrap_or_default();
    let mut segments = rem.split('/').filter(|s| !s.is_empty());
    while let Some(segment) = segments.next() {
        if let Some(resource) = Resource::from_segment(segment) {
            let id = segments.next().ok_or(IdParseError)?;
            return Ok(ResourceId::new(resource, parse_id(id)?));
        }
    }
    Err(IdParseError)
}
