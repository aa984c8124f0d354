use futures::TryStreamExt;
use reqwest::{Client, StatusCode};
use tokio_util::io::StreamReader;

use super::{CollectContext, CollectError, CollectStream, ContextReader};

/// Fetches one URL with a shared client.
#[derive(Debug, Clone)]
pub struct EndpointCollector {
    name: String,
    optional: bool,
    url: String,
    client: Client,
}

impl EndpointCollector {
    pub fn new(
        name: impl Into<String>,
        optional: bool,
        url: impl Into<String>,
        client: Client,
    ) -> Self {
        Self {
            name: name.into(),
            optional,
            url: url.into(),
            client,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn optional(&self) -> bool {
        self.optional
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn context_error(&self, reason: super::ContextError) -> CollectError {
        CollectError::Context {
            name: self.name.clone(),
            reason,
        }
    }

    /// A 200 response hands back the live body; anything else is read in
    /// full, released, and reported together with its status.
    pub async fn collect(&self, ctx: &CollectContext) -> Result<CollectStream, CollectError> {
        let response = ctx
            .run(self.client.get(&self.url).send())
            .await
            .map_err(|reason| self.context_error(reason))?
            .map_err(|source| CollectError::Request {
                url: self.url.clone(),
                source,
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = match ctx.run(response.text()).await {
                Ok(Ok(body)) => body,
                Ok(Err(e)) => format!("<could not read body: {e}>"),
                Err(reason) => return Err(self.context_error(reason)),
            };
            return Err(CollectError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
                body,
            });
        }

        let body = StreamReader::new(response.bytes_stream().map_err(std::io::Error::other));
        Ok(Box::pin(ContextReader::new(Box::pin(body), ctx)))
    }
}
