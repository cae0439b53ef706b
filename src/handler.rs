use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::apis::predict::{Prediction, PredictionApi};
use crate::form::{InputField, OutputElement, SubmitEvent};

pub const ERROR_MESSAGE: &str = "Error: Unable to process request.";

/// What happens to a response that resolves after a newer submission was issued.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StalePolicy {
    /// Only the most recently issued submission may write the output.
    LatestIssued,
    /// Whichever response resolves last wins.
    LastResolved,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    Predicted(Prediction),
    Failed,
    Superseded,
}

/// A submission captured at submit time, waiting for its request to be sent.
pub struct Submission {
    sequence: u64,
    url: String,
}

pub struct SubmissionHandler {
    api: Arc<dyn PredictionApi>,
    field: Arc<dyn InputField>,
    output: Arc<dyn OutputElement>,
    policy: StalePolicy,
    issued: AtomicU64,
}

impl SubmissionHandler {
    pub fn new(
        api: Arc<dyn PredictionApi>,
        field: Arc<dyn InputField>,
        output: Arc<dyn OutputElement>,
        policy: StalePolicy,
    ) -> Self {
        Self { api, field, output, policy, issued: AtomicU64::new(0) }
    }

    /// Synchronous part of the submit listener. Runs before the first suspension point.
    pub fn on_submit(&self, event: &SubmitEvent) -> Submission {
        event.prevent_default();

        let url = self.field.value();
        let sequence = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        log::info!("input URL #{sequence}: {url:?}");

        Submission { sequence, url }
    }

    pub async fn complete(&self, submission: Submission) -> Outcome {
        let Submission { sequence, url } = submission;
        let result = self.api.predict(&url).await;

        if self.policy == StalePolicy::LatestIssued {
            let latest = self.issued.load(Ordering::SeqCst);
            if sequence != latest {
                log::debug!("discarding response #{sequence}, latest submission is #{latest}");
                return Outcome::Superseded;
            }
        }

        match result {
            Ok(prediction) => {
                log::info!("prediction #{sequence}: {prediction}");
                self.output.set_text(format!("Prediction: {prediction}"));
                Outcome::Predicted(prediction)
            }
            Err(err) => {
                log::warn!("submission #{sequence} failed: {err}");
                self.output.set_text(ERROR_MESSAGE.into());
                Outcome::Failed
            }
        }
    }

    pub async fn handle(&self, event: &SubmitEvent) -> Outcome {
        let submission = self.on_submit(event);
        self.complete(submission).await
    }
}
