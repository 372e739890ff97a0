//! Interactive repair of requests the resolver could not resolve.

use crate::{
    catalog::Catalog,
    id,
    resolver::{DownloadItem, ResolutionRequest},
};

/// Input that skips every remaining failure.
pub const SKIP_ALL: &str = "all";

/// Source of operator answers.
pub trait Prompt {
    fn ask(&mut self, message: &str) -> std::io::Result<String>;
}

/// Terminal prompt.
#[derive(Debug, Default)]
pub struct InquirePrompt;

impl Prompt for InquirePrompt {
    fn ask(&mut self, message: &str) -> std::io::Result<String> {
        let answer = inquire::Text::new(message)
            .with_help_message("leave empty to skip, insert 'all' to skip all")
            .prompt();
        match answer {
            Ok(answer) => Ok(answer),
            Err(inquire::InquireError::OperationCanceled) => Ok(String::new()),
            Err(inquire::InquireError::NotTTY) => {
                tracing::warn!("not running in a terminal, skipping manual uri entry");
                Ok(SKIP_ALL.to_owned())
            }
            Err(err) => Err(std::io::Error::other(err)),
        }
    }
}

/// Log every failed request as a single list.
pub fn report_failures(failures: &[ResolutionRequest]) {
    if failures.is_empty() {
        return;
    }
    let list = failures
        .iter()
        .map(|request| format!("    {}", request))
        .collect::<Vec<_>>()
        .join("\n");
    tracing::warn!(
        "unable to get the uris for the following {} elements in your library:\n{}",
        failures.len(),
        list
    );
}

/// Ask for a uri for each failure until a valid one is given or the entry is skipped.
///
/// Corrected entries are returned in the order they were answered. A corrected uri of the same
/// kind as the request is also stored on the catalog node.
pub fn reconcile<P>(
    catalog: &mut Catalog,
    failures: &[ResolutionRequest],
    prompt: &mut P,
) -> std::io::Result<Vec<DownloadItem>>
where
    P: Prompt + ?Sized,
{
    let mut corrected = Vec::new();
    'failures: for request in failures {
        let message = format!("Enter {} uri for {}", request.resource(), request);
        loop {
            let answer = prompt.ask(&message)?;
            let answer = answer.trim();
            if answer.is_empty() {
                tracing::debug!("skipped {}", request);
                continue 'failures;
            }
            if answer.eq_ignore_ascii_case(SKIP_ALL) {
                tracing::debug!("skipping all remaining entries");
                break 'failures;
            }
            match id::parse(answer) {
                Ok(uri) => {
                    if uri.resource == request.resource() {
                        if let Some(info) =
                            catalog.info_mut(request.artist(), request.album(), request.track())
                        {
                            info.uri = Some(uri.clone());
                        }
                    }
                    tracing::info!("using {} for {}", uri, request);
                    corrected.push(DownloadItem::new(uri, request.clone()));
                    continue 'failures;
                }
                Err(_) => tracing::error!("invalid uri '{}'", answer),
            }
        }
    }
    Ok(corrected)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::ResourceId;

    /// Answers from a script and remembers every question.
    #[derive(Debug, Default)]
    struct ScriptedPrompt {
        answers: VecDeque<String>,
        asked: Vec<String>,
    }

    impl ScriptedPrompt {
        fn new<'a>(answers: impl IntoIterator<Item = &'a str>) -> Self {
            Self {
                answers: answers.into_iter().map(str::to_owned).collect(),
                asked: Vec::new(),
            }
        }
    }

    impl Prompt for ScriptedPrompt {
        fn ask(&mut self, message: &str) -> std::io::Result<String> {
            self.asked.push(message.to_owned());
            self.answers
                .pop_front()
                .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::UnexpectedEof))
        }
    }

    const ARTIST_URI: &str = "spotify:artist:6UUrUCIZtQeOf8tC0WuzRy";

    fn failures() -> Vec<ResolutionRequest> {
        vec![
            ResolutionRequest::for_artist("A"),
            ResolutionRequest::for_album("B", "X"),
        ]
    }

    #[test]
    fn test_valid_then_skip() {
        let mut catalog = Catalog::new();
        catalog.add_artist("A", None, true);
        catalog.add_album("X", "B", None, true);
        let mut prompt = ScriptedPrompt::new([ARTIST_URI, ""]);

        let corrected = reconcile(&mut catalog, &failures(), &mut prompt).unwrap();
        assert_eq!(
            corrected,
            [DownloadItem::new(
                ResourceId::from_uri(ARTIST_URI).unwrap(),
                ResolutionRequest::for_artist("A")
            )]
        );
        assert_eq!(prompt.asked.len(), 2);
        assert_eq!(
            catalog.info("A", None, None).unwrap().uri.as_ref().map(|u| u.to_uri()).as_deref(),
            Some(ARTIST_URI)
        );
        assert!(catalog.info("B", Some("X"), None).unwrap().uri.is_none());
    }

    #[test]
    fn test_invalid_input_asks_again() {
        let mut catalog = Catalog::new();
        let mut prompt = ScriptedPrompt::new([
            "spotify:artist:tooshort",
            "foo:artist:6UUrUCIZtQeOf8tC0WuzRy",
            ARTIST_URI,
            "",
        ]);
        let corrected = reconcile(&mut catalog, &failures(), &mut prompt).unwrap();
        assert_eq!(corrected.len(), 1);
        assert_eq!(prompt.asked.len(), 4);
        assert_eq!(prompt.asked[0], prompt.asked[2]);
    }

    #[test]
    fn test_skip_all() {
        let mut catalog = Catalog::new();
        let mut prompt = ScriptedPrompt::new(["ALL"]);
        let corrected = reconcile(&mut catalog, &failures(), &mut prompt).unwrap();
        assert!(corrected.is_empty());
        assert_eq!(prompt.asked.len(), 1);
    }

    #[test]
    fn test_url_and_kind_mismatch() {
        let mut catalog = Catalog::new();
        catalog.add_album("X", "B", None, true);
        let failures = [ResolutionRequest::for_album("B", "X")];
        let mut prompt =
            ScriptedPrompt::new(["https://open.spotify.com/track/4OROzZUy6gOWN4UGQVaZMF?si=1"]);

        let corrected = reconcile(&mut catalog, &failures, &mut prompt).unwrap();
        assert_eq!(
            corrected[0].uri.to_uri(),
            "spotify:track:4OROzZUy6gOWN4UGQVaZMF"
        );
        // a track uri is still downloaded but not stored on the album
        assert!(catalog.info("B", Some("X"), None).unwrap().uri.is_none());
    }

    #[test]
    fn test_prompt_error_propagates() {
        let mut catalog = Catalog::new();
        let mut prompt = ScriptedPrompt::default();
        assert!(reconcile(&mut catalog, &failures(), &mut prompt).is_err());
    }
}
