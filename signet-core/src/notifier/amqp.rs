use super::{DEFAULT_EXCHANGE, DEFAULT_QUEUE, DEFAULT_ROUTING_KEY, Notifier};
use crate::error::PublishError;
use async_trait::async_trait;
use lapin::options::{
    BasicPublishOptions, ConfirmSelectOptions, ExchangeDeclareOptions, QueueBindOptions,
    QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties, ExchangeKind};
use signet_sdk::objects::QueueMessage;
use signet_sdk::objects::notification::CONTENT_TYPE;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

/// AMQP delivery mode for messages the broker must write to disk.
const PERSISTENT_DELIVERY: u8 = 2;

/// Exchange, queue and binding declared on connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    pub exchange: String,
    pub queue: String,
    pub routing_key: String,
}

impl Default for Topology {
    fn default() -> Self {
        Self {
            exchange: DEFAULT_EXCHANGE.to_string(),
            queue: DEFAULT_QUEUE.to_string(),
            routing_key: DEFAULT_ROUTING_KEY.to_string(),
        }
    }
}

/// RabbitMQ notifier with publisher confirms.
///
/// The single long-lived channel sits behind a mutex, so concurrent
/// publishes are serialized including the wait for the broker's confirm.
pub struct AmqpNotifier {
    connection: Connection,
    channel: Mutex<Option<Channel>>,
    topology: Topology,
}

impl AmqpNotifier {
    /// Connect, declare the topology and enable publisher confirms.
    pub async fn connect(uri: &str, topology: Topology) -> Result<Self, PublishError> {
        let connection = Connection::connect(uri, ConnectionProperties::default()).await?;

        let channel = match open_channel(&connection, &topology).await {
            Ok(channel) => channel,
            Err(e) => {
                if let Err(close_err) = connection.close(0, "setup failed").await {
                    error!(error = %close_err, "Failed to close AMQP connection after setup error");
                }
                return Err(e.into());
            }
        };

        info!(
            exchange = %topology.exchange,
            queue = %topology.queue,
            routing_key = %topology.routing_key,
            "AMQP notifier initialized"
        );

        Ok(Self {
            connection,
            channel: Mutex::new(Some(channel)),
            topology,
        })
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }
}

async fn open_channel(connection: &Connection, topology: &Topology) -> Result<Channel, lapin::Error> {
    let channel = connection.create_channel().await?;

    channel
        .exchange_declare(
            &topology.exchange,
            ExchangeKind::Fanout,
            ExchangeDeclareOptions {
                durable: true,
                ..ExchangeDeclareOptions::default()
            },
            FieldTable::default(),
        )
        .await?;

    channel
        .queue_declare(
            &topology.queue,
            QueueDeclareOptions {
                durable: true,
                ..QueueDeclareOptions::default()
            },
            FieldTable::default(),
        )
        .await?;

    channel
        .queue_bind(
            &topology.queue,
            &topology.exchange,
            &topology.routing_key,
            QueueBindOptions::default(),
            FieldTable::default(),
        )
        .await?;

    channel
        .confirm_select(ConfirmSelectOptions::default())
        .await?;

    Ok(channel)
}

#[async_trait]
impl Notifier for AmqpNotifier {
    async fn publish(&self, message: &QueueMessage) -> Result<(), PublishError> {
        let body = serde_json::to_vec(message)?;
        let properties = BasicProperties::default()
            .with_content_type(CONTENT_TYPE.to_string().into())
            .with_delivery_mode(PERSISTENT_DELIVERY)
            .with_timestamp(u64::try_from(message.timestamp.unix_timestamp()).unwrap_or(0));

        let guard = self.channel.lock().await;
        let channel = guard.as_ref().ok_or(PublishError::Closed)?;

        let confirmation = channel
            .basic_publish(
                &self.topology.exchange,
                &self.topology.routing_key,
                BasicPublishOptions::default(),
                &body,
                properties,
            )
            .await?
            .await?;

        if confirmation.is_nack() {
            return Err(PublishError::Rejected);
        }

        debug!(
            event_id = %message.event_id,
            source_type = %message.source_type,
            "Message published"
        );
        Ok(())
    }

    async fn close(&self) {
        let Some(channel) = self.channel.lock().await.take() else {
            return;
        };
        if let Err(e) = channel.close(200, "OK").await {
            error!(error = %e, "Failed to close AMQP channel");
        }
        if let Err(e) = self.connection.close(200, "OK").await {
            error!(error = %e, "Failed to close AMQP connection");
        }
        info!("AMQP connection closed");
    }
}
