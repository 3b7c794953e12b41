use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, info};
use reqwest::{Client, Url};

use crate::{
    config::RelayConfig,
    error::SubmitError,
    form::Submission,
    objects::ObjectUrls,
    status::{DownloadLink, StatusArea, PROCESSING},
};

/// Posts a [`Submission`] to the processing endpoint and reports the result
/// in its status area.
///
/// Every collaborator is handed in at construction; nothing is looked up
/// while a submission runs.
#[derive(Debug)]
pub struct FormHandler<S> {
    client: Client,
    endpoint: Url,
    file_field: String,
    objects: ObjectUrls,
    status: S,
    latest: AtomicU64,
}

impl<S> FormHandler<S>
where
    S: StatusArea,
{
    pub fn new(client: Client, endpoint: Url, file_field: String, status: S) -> Self {
        Self {
            client,
            endpoint,
            file_field,
            objects: ObjectUrls::new(),
            status,
            latest: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &RelayConfig, status: S) -> anyhow::Result<Self> {
        Ok(Self::new(
            config.client()?,
            config.endpoint_url()?,
            config.file_field.clone(),
            status,
        ))
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn objects(&self) -> &ObjectUrls {
        &self.objects
    }

    pub fn status(&self) -> &S {
        &self.status
    }

    /// Take the next submission ticket; it is current until another is taken.
    pub fn begin(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_current(&self, ticket: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket
    }

    /// Run one submission to its terminal state.
    ///
    /// The status area shows the in-progress message first, then either the
    /// download link or `"Error: "` followed by the error. A response that
    /// arrives after a newer submission started leaves the status area alone
    /// but is still returned.
    pub async fn submit(&self, submission: Submission) -> Result<DownloadLink, SubmitError> {
        let ticket = self.begin();
        self.status.set_text(PROCESSING);
        let outcome = self.exchange(&submission).await;
        if !self.is_current(ticket) {
            debug!("Submission {ticket} superseded, not updating status.");
            return outcome;
        }
        match &outcome {
            Ok(link) => {
                info!("{}: ready as {}.", link.download, link.href);
                self.status.show_link(link.clone());
            }
            Err(err) => {
                info!("Submission {ticket} failed: {err}");
                self.status.set_text(&err.status_text());
            }
        }
        outcome
    }

    async fn exchange(&self, submission: &Submission) -> Result<DownloadLink, SubmitError> {
        debug!("POST {}.", self.endpoint);
        let response = self
            .client
            .post(self.endpoint.clone())
            .multipart(submission.to_multipart())
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            debug!("Status code error: {status}.");
            return Err(SubmitError::Server(response.text().await?));
        }
        let bytes = response.bytes().await?;
        let href = self.objects.create(bytes);
        // The request can succeed without any file under the field.
        let file = submission
            .first_file(&self.file_field)
            .ok_or(SubmitError::NoFileSelected)?;
        Ok(DownloadLink::new(href, file.name.clone()))
    }
}
