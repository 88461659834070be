use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::models::genie::{ContentRequest, MessageRef, StartConversationResponse};
use crate::models::MessageStatusResponse;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedConversation {
    pub conversation_id: String,
    pub message_id: String,
}

/// The three calls the gateway makes against the conversation service.
/// Implementations hold no per-conversation state.
#[async_trait]
pub trait ConversationApi: Send + Sync {
    async fn start_conversation(&self, question: &str) -> Result<StartedConversation, GatewayError>;

    async fn continue_conversation(
        &self,
        conversation_id: &str,
        question: &str,
    ) -> Result<String, GatewayError>;

    async fn message_status(
        &self,
        conversation_id: &str,
        message_id: &str,
    ) -> Result<MessageStatusResponse, GatewayError>;
}

pub struct GenieClient {
    client: Client,
    token: String,
    space_url: String,
}

impl GenieClient {
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GatewayError::Configuration(format!("http client: {}", e)))?;

        Ok(GenieClient {
            client,
            token: config.token.clone(),
            space_url: config.space_url(),
        })
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, GatewayError> {
        let res = req.bearer_auth(&self.token).send().await.map_err(|err| {
            tracing::warn!(error = %err, "Genie request failed to send");
            GatewayError::from(err)
        })?;

        let status = res.status();
        let text = res.text().await?;
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), body = %text, "Genie non-success status");
            return Err(GatewayError::transport(Some(status.as_u16()), text));
        }

        serde_json::from_str(&text).map_err(|e| {
            tracing::warn!(error = %e, "malformed Genie response");
            GatewayError::transport(
                Some(status.as_u16()),
                format!("malformed response: {}: {}", e, text),
            )
        })
    }
}

#[async_trait]
impl ConversationApi for GenieClient {
    async fn start_conversation(&self, question: &str) -> Result<StartedConversation, GatewayError> {
        let url = format!("{}/conversations", self.space_url);
        let body: StartConversationResponse = self
            .send(self.client.post(&url).json(&ContentRequest { content: question }))
            .await?;

        tracing::info!(
            conversation_id = %body.conversation.id,
            message_id = %body.message.id,
            status = body.message.status.as_deref().unwrap_or(""),
            "started Genie conversation"
        );
        Ok(StartedConversation {
            conversation_id: body.conversation.id,
            message_id: body.message.id,
        })
    }

    async fn continue_conversation(
        &self,
        conversation_id: &str,
        question: &str,
    ) -> Result<String, GatewayError> {
        let url = format!("{}/conversations/{}/messages", self.space_url, conversation_id);
        let body: MessageRef = self
            .send(self.client.post(&url).json(&ContentRequest { content: question }))
            .await?;

        tracing::info!(conversation_id, message_id = %body.id, "continued Genie conversation");
        Ok(body.id)
    }

    async fn message_status(
        &self,
        conversation_id: &str,
        message_id: &str,
    ) -> Result<MessageStatusResponse, GatewayError> {
        let url = format!(
            "{}/conversations/{}/messages/{}",
            self.space_url, conversation_id, message_id
        );
        self.send(self.client.get(&url)).await
    }
}
