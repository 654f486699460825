//! Booking lifecycle events.
//!
//! The service hands each event to an [`EventPublisher`] on a spawned task and
//! never waits for the outcome: a failed publish is logged and the already
//! committed state change stands.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use core_config::events::EventsConfig;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum::{AsRefStr, Display, EnumIter, EnumString};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::models::{Actor, Booking, Property};

/// Topics a booking event can be published to
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr, EnumString, EnumIter,
)]
pub enum BookingTopic {
    #[serde(rename = "booking.created")]
    #[strum(serialize = "booking.created")]
    Created,
    #[serde(rename = "booking.confirm")]
    #[strum(serialize = "booking.confirm")]
    Confirm,
    #[serde(rename = "booking.reject")]
    #[strum(serialize = "booking.reject")]
    Reject,
    #[serde(rename = "booking.cancel")]
    #[strum(serialize = "booking.cancel")]
    Cancel,
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Failed to encode event payload: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Publish rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Event channel closed")]
    ChannelClosed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventHeaders {
    /// RFC 3339 publish time
    pub timestamp: String,
}

/// Keyed message as it crosses the publisher boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMessage {
    /// Booking id, used as partition key
    pub key: String,
    pub value: serde_json::Value,
    pub headers: EventHeaders,
}

impl EventMessage {
    pub fn new<T: Serialize>(booking_id: Uuid, value: &T) -> Result<Self, PublishError> {
        Ok(Self {
            key: booking_id.to_string(),
            value: serde_json::to_value(value)?,
            headers: EventHeaders {
                timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            },
        })
    }
}

/// Value of a `booking.created` event
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingCreatedPayload<'a> {
    pub user: &'a Actor,
    pub booking_details: &'a Booking,
    pub property: &'a Property,
}

#[derive(Debug, Serialize)]
pub struct EventUser<'a> {
    pub email: &'a str,
    pub name: &'a str,
}

impl<'a> From<&'a Actor> for EventUser<'a> {
    fn from(actor: &'a Actor) -> Self {
        Self {
            email: &actor.email,
            name: &actor.name,
        }
    }
}

/// Value of a status-change event
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChangedPayload<'a> {
    pub user: EventUser<'a>,
    pub booking_details: &'a Booking,
}

/// One-way publish capability
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, topic: BookingTopic, message: EventMessage) -> Result<(), PublishError>;
}

/// Publish on a background task; failures are logged, never returned
pub fn spawn_publish(publisher: Arc<dyn EventPublisher>, topic: BookingTopic, message: EventMessage) {
    tokio::spawn(async move {
        let key = message.key.clone();
        match publisher.publish(topic, message).await {
            Ok(()) => debug!(topic = %topic, key = %key, "Booking event published"),
            Err(e) => warn!(topic = %topic, key = %key, error = %e, "Booking event dropped"),
        }
    });
}

/// Dapr pub/sub client for booking events
#[derive(Clone)]
pub struct DaprEventPublisher {
    client: reqwest::Client,
    dapr_http_port: u16,
    pubsub_name: String,
}

impl DaprEventPublisher {
    pub fn new(dapr_http_port: u16, pubsub_name: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            dapr_http_port,
            pubsub_name: pubsub_name.into(),
        }
    }

    pub fn from_config(config: &EventsConfig) -> Self {
        Self::new(config.dapr_http_port, config.pubsub_name.clone())
    }

    fn publish_url(&self, topic: BookingTopic) -> String {
        format!(
            "http://localhost:{}/v1.0/publish/{}/{}",
            self.dapr_http_port, self.pubsub_name, topic
        )
    }
}

#[async_trait]
impl EventPublisher for DaprEventPublisher {
    #[instrument(skip(self, topic, message), fields(topic = %topic, key = %message.key))]
    async fn publish(&self, topic: BookingTopic, message: EventMessage) -> Result<(), PublishError> {
        let response = self
            .client
            .post(self.publish_url(topic))
            .query(&[("metadata.partitionKey", message.key.as_str())])
            .json(&message)
            .send()
            .await
            .map_err(|e| PublishError::Transport(format!("Failed to publish to {topic}: {e}")))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::Rejected { status, body });
        }

        Ok(())
    }
}

/// An event as received on the other side of a [`ChannelEventPublisher`]
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedEvent {
    pub topic: BookingTopic,
    pub message: EventMessage,
}

/// In-process publisher backed by an unbounded tokio channel
#[derive(Debug, Clone)]
pub struct ChannelEventPublisher {
    sender: mpsc::UnboundedSender<PublishedEvent>,
}

impl ChannelEventPublisher {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<PublishedEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl EventPublisher for ChannelEventPublisher {
    async fn publish(&self, topic: BookingTopic, message: EventMessage) -> Result<(), PublishError> {
        self.sender
            .send(PublishedEvent { topic, message })
            .map_err(|_| PublishError::ChannelClosed)
    }
}

/// Publisher that discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventPublisher;

#[async_trait]
impl EventPublisher for NoopEventPublisher {
    async fn publish(&self, _topic: BookingTopic, _message: EventMessage) -> Result<(), PublishError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewBooking, UserRole};
    use chrono::{DateTime, NaiveDate};
    use rust_decimal_macros::dec;
    use strum::IntoEnumIterator;

    fn actor() -> Actor {
        Actor {
            id: Uuid::now_v7(),
            email: "guest@example.com".to_string(),
            name: "Guest".to_string(),
            role: UserRole::User,
            organization_membership: None,
        }
    }

    fn booking() -> Booking {
        Booking::new(NewBooking {
            property_id: Uuid::now_v7(),
            user_id: Uuid::now_v7(),
            start_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 6, 4).unwrap(),
            number_of_guests: 2,
            total_price: dec!(300),
            confirmation_code: "K7M2QX9P".to_string(),
        })
    }

    #[test]
    fn test_topic_names() {
        let names: Vec<String> = BookingTopic::iter().map(|t| t.to_string()).collect();
        assert_eq!(
            names,
            ["booking.created", "booking.confirm", "booking.reject", "booking.cancel"]
        );
        assert_eq!(
            "booking.cancel".parse::<BookingTopic>().unwrap(),
            BookingTopic::Cancel
        );
    }

    #[test]
    fn test_status_message_shape() {
        let actor = actor();
        let booking = booking();
        let message = EventMessage::new(
            booking.id,
            &StatusChangedPayload {
                user: EventUser::from(&actor),
                booking_details: &booking,
            },
        )
        .unwrap();

        assert_eq!(message.key, booking.id.to_string());
        assert_eq!(message.value["user"]["email"], "guest@example.com");
        assert_eq!(message.value["user"]["name"], "Guest");
        assert!(message.value["user"].get("id").is_none());
        assert_eq!(message.value["bookingDetails"]["status"], "PENDING");
        assert!(DateTime::parse_from_rfc3339(&message.headers.timestamp).is_ok());
    }

    #[test]
    fn test_dapr_publish_url() {
        let publisher = DaprEventPublisher::from_config(&EventsConfig {
            dapr_http_port: 3501,
            pubsub_name: "bookings-pubsub".to_string(),
        });
        assert_eq!(
            publisher.publish_url(BookingTopic::Confirm),
            "http://localhost:3501/v1.0/publish/bookings-pubsub/booking.confirm"
        );
    }

    #[tokio::test]
    async fn test_channel_publisher_delivers() {
        let (publisher, mut receiver) = ChannelEventPublisher::channel();
        let booking = booking();
        let message = EventMessage::new(booking.id, &booking).unwrap();

        spawn_publish(Arc::new(publisher), BookingTopic::Created, message.clone());

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.topic, BookingTopic::Created);
        assert_eq!(event.message, message);
    }

    #[tokio::test]
    async fn test_closed_channel_reports_error() {
        let (publisher, receiver) = ChannelEventPublisher::channel();
        drop(receiver);

        let booking = booking();
        let result = publisher
            .publish(
                BookingTopic::Cancel,
                EventMessage::new(booking.id, &booking).unwrap(),
            )
            .await;
        assert!(matches!(result, Err(PublishError::ChannelClosed)));
    }
}
