use std::fmt::Display;
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use sqlx::postgres::PgListener;
use sqlx::PgPool;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use sg_catalog::ChangeHub;
use sg_shared::ProductChange;

use crate::database::ServiceClient;

const INITIAL_BACKOFF: Duration = Duration::from_millis(500);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Forwards the store's row-change notifications into a [`ChangeHub`].
///
/// Payloads are the JSON objects built by the `notify_product_change`
/// trigger (see `migrations/`). A lost connection is re-established with
/// exponential backoff; notifications sent while disconnected are not
/// replayed.
pub struct ChangeListener;

impl ChangeListener {
    /// Fails if the first connection cannot be made; later failures only
    /// trigger reconnects.
    pub async fn start(
        client: &ServiceClient,
        channel: &str,
        hub: ChangeHub,
    ) -> Result<JoinHandle<()>, sqlx::Error> {
        let listener = connect(&client.pool, channel).await?;

        info!("Listening for store changes on channel {}", channel);
        Ok(tokio::spawn(run(
            client.pool.clone(),
            channel.to_string(),
            listener,
            hub,
        )))
    }
}

async fn connect(pool: &PgPool, channel: &str) -> Result<PgListener, sqlx::Error> {
    let mut listener = PgListener::connect_with(pool).await?;
    listener.listen(channel).await?;
    Ok(listener)
}

async fn run(pool: PgPool, channel: String, mut listener: PgListener, hub: ChangeHub) {
    loop {
        let payloads = listener
            .into_stream()
            .map(|notification| notification.map(|n| n.payload().to_owned()));

        match pump(payloads, &hub).await {
            Some(e) => warn!("Change listener lost its connection: {}", e),
            None => warn!("Change listener stream ended"),
        }

        listener = reconnect(&pool, &channel).await;
    }
}

async fn reconnect(pool: &PgPool, channel: &str) -> PgListener {
    let mut delay = INITIAL_BACKOFF;

    loop {
        tokio::time::sleep(delay).await;

        match connect(pool, channel).await {
            Ok(listener) => {
                info!("Change listener reconnected to channel {}", channel);
                return listener;
            }
            Err(e) => {
                warn!("Change listener reconnect failed, retrying in {:?}: {}", delay, e);
                delay = (delay * 2).min(MAX_BACKOFF);
            }
        }
    }
}

/// Publishes every well-formed payload until the source fails or ends.
/// Returns the failure, if any.
pub(crate) async fn pump<S, E>(mut payloads: S, hub: &ChangeHub) -> Option<E>
where
    S: Stream<Item = Result<String, E>> + Unpin,
    E: Display,
{
    while let Some(payload) = payloads.next().await {
        match payload {
            Ok(payload) => match parse_change(&payload) {
                Ok(change) => {
                    let delivered = hub.publish(change);
                    debug!("Forwarded change to {} subscribers", delivered);
                }
                Err(e) => warn!("Skipping malformed change payload: {}", e),
            },
            Err(e) => return Some(e),
        }
    }

    None
}

pub fn parse_change(payload: &str) -> Result<ProductChange, serde_json::Error> {
    serde_json::from_str(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sg_catalog::PRODUCTS_TABLE;
    use sg_shared::ChangeKind;
    use testresult::TestResult;

    #[test]
    fn test_parses_trigger_payload() {
        let change = parse_change(
            r#"{"type":"UPDATE","table":"products","new":{"id":1,"is_active":true,"price":80},"old":{"id":1,"is_active":true,"price":75}}"#,
        )
        .unwrap();

        assert_eq!(change.kind, ChangeKind::Update);
        assert_eq!(change.table, "products");
        assert!(change.touches_active());
    }

    #[test]
    fn test_parses_insert_with_null_old_row() {
        let change = parse_change(
            r#"{"type":"INSERT","table":"products","new":{"is_active":false},"old":null}"#,
        )
        .unwrap();

        assert_eq!(change.kind, ChangeKind::Insert);
        assert!(change.old.is_none());
        assert!(!change.touches_active());
    }

    #[tokio::test]
    async fn test_pump_skips_malformed_payloads_and_stops_on_error() -> TestResult {
        let hub = ChangeHub::new(8);
        let mut products = hub.subscribe(PRODUCTS_TABLE);

        let payloads = futures_util::stream::iter(vec![
            Ok("not json".to_string()),
            Ok(r#"{"type":"UPDATE","table":"products","new":{"is_active":true},"old":null}"#.to_string()),
            Err("connection reset"),
            Ok(r#"{"type":"DELETE","table":"products","new":null,"old":{"is_active":true}}"#.to_string()),
        ]);

        let stopped = pump(payloads, &hub).await;
        assert_eq!(stopped, Some("connection reset"));

        let change = products.recv().await?;
        assert_eq!(change.kind, ChangeKind::Update);

        // Nothing after the failure was forwarded.
        drop(hub);
        assert!(products.recv().await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_pump_returns_none_when_source_ends() {
        let hub = ChangeHub::new(8);
        let payloads = futures_util::stream::iter(Vec::<Result<String, String>>::new());

        assert!(pump(payloads, &hub).await.is_none());
    }

    #[test]
    fn test_rejects_unknown_kind() {
        assert!(parse_change(r#"{"type":"TRUNCATE","table":"products"}"#).is_err());
        assert!(parse_change("not json").is_err());
    }
}
