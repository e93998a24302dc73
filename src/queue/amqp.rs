//! RabbitMQ-backed work queue via lapin.

use async_trait::async_trait;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicPublishOptions, BasicQosOptions,
    ConfirmSelectOptions, QueueDeclareOptions,
};
use lapin::publisher_confirm::Confirmation;
use lapin::types::FieldTable;
use lapin::{
    BasicProperties, Channel, Connection, ConnectionProperties, Consumer,
    message::Delivery,
};
use tracing::{debug, info};

use super::{QueueError, WorkItem, WorkPublisher};

/// Persistent delivery mode (survives broker restart on a durable queue).
const DELIVERY_MODE_PERSISTENT: u8 = 2;

/// An open channel to the durable extraction queue.
///
/// Shared by the publish and consume sides; both declare the queue so that
/// whichever side starts first creates it.
pub struct AmqpQueue {
    channel: Channel,
    queue_name: String,
}

impl AmqpQueue {
    /// Connect to the broker and declare the durable queue.
    ///
    /// Publisher confirms are enabled on the channel so `publish` can wait
    /// for the broker to take responsibility for each message.
    pub async fn connect(broker_url: &str, queue_name: &str) -> Result<Self, QueueError> {
        let connection =
            Connection::connect(broker_url, ConnectionProperties::default()).await?;
        let channel = connection.create_channel().await?;
        channel
            .confirm_select(ConfirmSelectOptions::default())
            .await?;

        channel
            .queue_declare(
                queue_name,
                QueueDeclareOptions {
                    durable: true,
                    ..QueueDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await?;

        info!(queue = queue_name, "connected to work queue");
        Ok(Self {
            channel,
            queue_name: queue_name.to_string(),
        })
    }

    /// Turn this connection into a publisher handle.
    pub fn publisher(self) -> AmqpPublisher {
        AmqpPublisher { queue: self }
    }

    /// Start consuming with a prefetch of one unacknowledged message.
    ///
    /// The prefetch limit guarantees a slow render on one worker holds back
    /// exactly one message, never the rest of the queue.
    pub async fn consume(&self, consumer_tag: &str) -> Result<Consumer, QueueError> {
        self.channel.basic_qos(1, BasicQosOptions::default()).await?;
        let consumer = self
            .channel
            .basic_consume(
                &self.queue_name,
                consumer_tag,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await?;
        Ok(consumer)
    }

    /// Acknowledge a processed delivery.
    pub async fn ack(&self, delivery: &Delivery) -> Result<(), QueueError> {
        delivery.ack(BasicAckOptions::default()).await?;
        Ok(())
    }

    /// Negatively acknowledge a delivery without requeueing it.
    ///
    /// Requeueing a permanently bad message would loop forever; rejected
    /// messages are treated as poison.
    pub async fn reject(&self, delivery: &Delivery) -> Result<(), QueueError> {
        delivery
            .nack(BasicNackOptions {
                requeue: false,
                ..BasicNackOptions::default()
            })
            .await?;
        Ok(())
    }
}

/// Publish side of the AMQP work queue.
pub struct AmqpPublisher {
    queue: AmqpQueue,
}

#[async_trait]
impl WorkPublisher for AmqpPublisher {
    async fn publish(&self, item: WorkItem) -> Result<(), QueueError> {
        let confirm = self
            .queue
            .channel
            .basic_publish(
                "",
                &self.queue.queue_name,
                BasicPublishOptions::default(),
                &item.to_payload(),
                BasicProperties::default().with_delivery_mode(DELIVERY_MODE_PERSISTENT),
            )
            .await?;
        let confirmation = confirm.await?;
        if !matches!(confirmation, Confirmation::Ack(_)) {
            return Err(QueueError::Unconfirmed);
        }

        debug!(
            crawl_config_id = item.crawl_config_id,
            queue = %self.queue.queue_name,
            "published work item"
        );
        Ok(())
    }
}
