//! # dnsvakt-broker
//!
//! Outbound message publishing. The publisher stage talks to the
//! [`MessagePublisher`] trait; publish retry policy is layered above it.

pub mod amqp;

use thiserror::Error;

pub use amqp::AmqpPublisher;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("broker connection failed: {0}")]
    Connect(String),
    #[error("queue declaration failed: {0}")]
    Declare(String),
    #[error("publish failed: {0}")]
    Publish(String),
}

/// At-least-once publish contract. Messages are delivered persistently.
pub trait MessagePublisher: Send {
    fn publish(&mut self, body: &[u8]) -> Result<(), BrokerError>;
}
