use anyhow::Context;
use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, Response,
};
use serde::de::DeserializeOwned;
use shared::{
    domain::Document,
    error::ErrorBody,
    protocol::{AskRequest, AskResponse, HealthResponse, UploadResponse, UPLOAD_FIELD_NAME},
};
use url::Url;

use crate::{error::RequestError, QaBackend};

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";

pub struct HttpQaBackend {
    http: Client,
    server_url: Url,
}

impl HttpQaBackend {
    pub fn new(server_url: &str) -> anyhow::Result<Self> {
        let server_url = Url::parse(server_url)
            .with_context(|| format!("invalid QA server url '{server_url}'"))?;
        Ok(Self {
            http: Client::new(),
            server_url,
        })
    }

    pub fn server_url(&self) -> &Url {
        &self.server_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.server_url.as_str().trim_end_matches('/'))
    }
}

fn transport(err: reqwest::Error) -> RequestError {
    RequestError::Transport(err.to_string())
}

async fn decode_response<T: DeserializeOwned>(response: Response) -> Result<T, RequestError> {
    let status = response.status();
    if !status.is_success() {
        let detail = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(ErrorBody::into_detail);
        return Err(RequestError::Backend {
            status: status.as_u16(),
            detail,
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|err| RequestError::Transport(format!("malformed response: {err}")))
}

#[async_trait]
impl QaBackend for HttpQaBackend {
    async fn health(&self) -> Result<(), RequestError> {
        let response = self
            .http
            .get(self.endpoint("health"))
            .send()
            .await
            .map_err(transport)?;
        decode_response::<HealthResponse>(response).await?;
        Ok(())
    }

    async fn upload(&self, document: &Document) -> Result<UploadResponse, RequestError> {
        let part = Part::bytes(document.bytes.clone())
            .file_name(document.name.clone())
            .mime_str(&document.mime_type)
            .map_err(transport)?;
        let form = Form::new().part(UPLOAD_FIELD_NAME, part);

        let response = self
            .http
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await
            .map_err(transport)?;
        decode_response(response).await
    }

    async fn ask(&self, question: &str) -> Result<AskResponse, RequestError> {
        let response = self
            .http
            .post(self.endpoint("ask"))
            .json(&AskRequest {
                question: question.to_string(),
            })
            .send()
            .await
            .map_err(transport)?;
        decode_response(response).await
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
