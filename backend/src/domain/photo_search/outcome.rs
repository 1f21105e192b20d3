//! Three-way result of one photo-collection pipeline run.

/// Result of fetching a pin's photo collection.
///
/// `EmptyResult` is a successful search that matched nothing; it is never
/// folded into `Failure`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionOutcome {
    /// Photos were found and their records persisted.
    Success {
        /// Number of photo records created.
        persisted: usize,
    },
    /// The search succeeded with zero photos.
    EmptyResult,
    /// A stage rejected the response or the write failed.
    Failure(CollectionFailure),
}

impl CollectionOutcome {
    /// Message suitable for showing to the user.
    ///
    /// # Examples
    /// ```
    /// use pin_gallery::domain::CollectionOutcome;
    ///
    /// let outcome = CollectionOutcome::EmptyResult;
    /// assert_eq!(outcome.user_message(), "Sorry, no photos were found for that location.");
    /// ```
    pub fn user_message(&self) -> String {
        match self {
            Self::Success { persisted } => format!("Fetched {persisted} photos."),
            Self::EmptyResult => "Sorry, no photos were found for that location.".to_owned(),
            Self::Failure(_) => "Retrieving photos failed. Please try again.".to_owned(),
        }
    }

    /// Whether this is the `Success` variant.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Why a pipeline run ended in `Failure`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollectionFailure {
    /// The request never produced a response.
    #[error("transport failed: {message}")]
    Transport {
        /// Transport diagnostic.
        message: String,
    },
    /// Non-2xx status or an unexpected body shape.
    #[error("protocol error: {message}")]
    Protocol {
        /// What was wrong with the response.
        message: String,
    },
    /// Well-formed response whose status sentinel was not `ok`.
    #[error("search rejected by upstream: {message}")]
    UpstreamRejection {
        /// Upstream message, or the offending status.
        message: String,
    },
    /// A photo entry lacked its image URL; the whole batch is discarded.
    #[error("photo entry {index} has no image URL")]
    PartialEntry {
        /// Zero-based position of the first defective entry.
        index: usize,
    },
    /// The bulk write did not commit.
    #[error("persisting photos failed: {message}")]
    Persistence {
        /// Store diagnostic.
        message: String,
    },
}

impl From<CollectionFailure> for CollectionOutcome {
    fn from(failure: CollectionFailure) -> Self {
        Self::Failure(failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::success(CollectionOutcome::Success { persisted: 3 }, "Fetched 3 photos.", true)]
    #[case::empty(
        CollectionOutcome::EmptyResult,
        "Sorry, no photos were found for that location.",
        false
    )]
    #[case::failure(
        CollectionFailure::PartialEntry { index: 2 }.into(),
        "Retrieving photos failed. Please try again.",
        false
    )]
    fn outcome_messages(
        #[case] outcome: CollectionOutcome,
        #[case] message: &str,
        #[case] success: bool,
    ) {
        assert_eq!(outcome.user_message(), message);
        assert_eq!(outcome.is_success(), success);
    }

    #[rstest]
    fn failure_detail_is_kept_for_diagnostics() {
        let failure = CollectionFailure::UpstreamRejection {
            message: "Invalid API Key".to_owned(),
        };

        assert_eq!(
            failure.to_string(),
            "search rejected by upstream: Invalid API Key"
        );
    }
}
