//! AMQP-backed publisher.
//!
//! Declares the destination queue durable at connect time and publishes to
//! the default exchange with the queue name as routing key, delivery mode
//! persistent.

use amiquip::{AmqpProperties, Channel, Connection, Publish, QueueDeclareOptions};
use tracing::debug;

use crate::{BrokerError, MessagePublisher};

const PERSISTENT_DELIVERY: u8 = 2;

pub struct AmqpPublisher {
    // Field order matters: the channel must drop before the connection.
    channel: Channel,
    _connection: Connection,
    queue_name: String,
}

impl AmqpPublisher {
    /// Performs the broker handshake and declares the durable destination
    /// queue. Either failing is fatal at startup.
    pub fn connect(url: &str, queue_name: &str) -> Result<Self, BrokerError> {
        let mut connection =
            Connection::open(url).map_err(|e| BrokerError::Connect(e.to_string()))?;
        let channel = connection
            .open_channel(None)
            .map_err(|e| BrokerError::Connect(e.to_string()))?;

        channel
            .queue_declare(
                queue_name,
                QueueDeclareOptions {
                    durable: true,
                    ..QueueDeclareOptions::default()
                },
            )
            .map_err(|e| BrokerError::Declare(e.to_string()))?;

        debug!("declared durable queue '{queue_name}'");
        Ok(Self {
            channel,
            _connection: connection,
            queue_name: queue_name.to_string(),
        })
    }
}

impl MessagePublisher for AmqpPublisher {
    fn publish(&mut self, body: &[u8]) -> Result<(), BrokerError> {
        let properties = AmqpProperties::default().with_delivery_mode(PERSISTENT_DELIVERY);
        self.channel
            .basic_publish(
                "",
                Publish::with_properties(body, self.queue_name.clone(), properties),
            )
            .map_err(|e| BrokerError::Publish(e.to_string()))?;
        Ok(())
    }
}
