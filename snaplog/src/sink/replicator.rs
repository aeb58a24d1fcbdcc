use crate::dialect::type_map::{installed, DialectTypeMap};
use crate::error::{CdcError, CdcResult};
use crate::event::payload::Envelope;
use crate::sink::connection::{SinkConnection, SinkConnector};
use crate::table::replica::ReplicaTable;
use log::{error, info};
use std::collections::HashMap;

/// A table engine together with the connection it owns.
struct Engine<C: SinkConnection> {
    conn: C,
    table: ReplicaTable<C>,
}

/// Routes received change events to one `ReplicaTable` per source table.
/// Each engine runs on its own sink connection.
pub struct Replicator<F: SinkConnector> {
    connector: F,
    engines: HashMap<String, Engine<F::Connection>>,
    auto_create_table: bool,
    type_map: DialectTypeMap,
}

impl<F: SinkConnector> Replicator<F> {
    pub fn new(connector: F, auto_create_table: bool) -> CdcResult<Self> {
        let type_map = *installed()?;
        if connector.dialect() != type_map.dialect() {
            return Err(CdcError::DialectError(format!(
                "sink connection speaks {} but the installed type map is for {}",
                connector.dialect(),
                type_map.dialect()
            )));
        }
        Ok(Replicator {
            connector,
            engines: HashMap::new(),
            auto_create_table,
            type_map,
        })
    }

    /// Applies one event. Engines that fail to provision are dropped along
    /// with their connection, so the next event for the same table retries.
    pub async fn apply(&mut self, envelope: &Envelope) -> CdcResult<()> {
        let source = envelope.payload.source();
        let key = source.qualified_name();

        if !self.engines.contains_key(&key) {
            let mut conn = self.connector.connect().await.map_err(|e| {
                error!("Unable to connect to sink for {}: {}", key, e);
                e
            })?;
            let table = ReplicaTable::with_type_map(
                &mut conn,
                source,
                &envelope.schema,
                self.auto_create_table,
                self.type_map,
            )
            .await?;
            if !table.is_ready() {
                return Err(CdcError::NotReadyError(key));
            }
            info!("Replicating {} into {}", key, table.table_name());
            self.engines.insert(key.clone(), Engine { conn, table });
        }

        match self.engines.get_mut(&key) {
            Some(engine) => engine.table.apply(&mut engine.conn, &envelope.payload).await,
            None => Err(CdcError::NotReadyError(key)),
        }
    }

    pub fn table(&self, key: &str) -> Option<&ReplicaTable<F::Connection>> {
        self.engines.get(key).map(|engine| &engine.table)
    }

    /// The connection owned by the engine for `key`.
    pub fn connection(&self, key: &str) -> Option<&F::Connection> {
        self.engines.get(key).map(|engine| &engine.conn)
    }

    pub fn connector(&self) -> &F {
        &self.connector
    }

    /// Releases every cached statement. Errors are logged and the last one returned.
    pub async fn close(&mut self) -> CdcResult<()> {
        let mut result = Ok(());
        for (key, engine) in self.engines.iter_mut() {
            if let Err(e) = engine.table.close_cursors(&mut engine.conn).await {
                error!("Unable to release statements for {}: {}", key, e);
                result = Err(e);
            }
        }
        result
    }
}
