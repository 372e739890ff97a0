use serde_json::Value;

use crate::{id, resolver::ResolutionRequest, session::Session, Resource, ResourceId};

use super::{Lookup, LookupError};

/// Lookup backed by the web api `/search` endpoint.
#[derive(Debug)]
pub struct SpotifyLookup {
    session: Session,
}

impl SpotifyLookup {
    pub fn new(session: Session) -> Self {
        Self { session }
    }
}

/// Extract the uri of the first item of a search response for `resource`.
fn top_uri(response: &Value, resource: Resource) -> Option<&str> {
    response[format!("{}s", resource)]["items"]
        .get(0)?
        .get("uri")?
        .as_str()
}

#[async_trait::async_trait]
impl Lookup for SpotifyLookup {
    async fn search(&self, request: &ResolutionRequest) -> Result<Option<ResourceId>, LookupError> {
        let resource = request.resource();
        let query = request.search_query();
        tracing::debug!("searching {} '{}'", resource, query);

        let response = self
            .session
            .get("/search")
            .query(&[
                ("type", resource.as_str()),
                ("q", query.as_str()),
                ("limit", "1"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LookupError::new(format!(
                "search for '{}' failed with {}: {}",
                query, status, body
            )));
        }

        let response: Value = response.json().await?;
        let Some(uri) = top_uri(&response, resource) else {
            return Ok(None);
        };
        match id::parse_uri(uri) {
            Ok(rid) => Ok(Some(rid)),
            Err(err) => {
                tracing::warn!("search returned an invalid uri '{}': {}", uri, err);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_uri() {
        let response = serde_json::json!({
            "albums": {
                "items": [
                    {"name": "Dummy", "uri": "spotify:album:3539EbNgIdEDGBKkUf4wno"},
                    {"name": "Dummy (Live)", "uri": "spotify:album:1111111111111111111111"}
                ]
            }
        });
        assert_eq!(
            top_uri(&response, Resource::Album),
            Some("spotify:album:3539EbNgIdEDGBKkUf4wno")
        );
        assert_eq!(top_uri(&response, Resource::Track), None);
    }

    #[test]
    fn test_top_uri_no_items() {
        let response = serde_json::json!({"tracks": {"items": []}});
        assert_eq!(top_uri(&response, Resource::Track), None);
    }
}
