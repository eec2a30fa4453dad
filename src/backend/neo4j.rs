//! Neo4j backend
//!
//! Uses `neo4rs` for pooled, async Bolt connections. Every statement is
//! parameterized; rows travel as a list parameter consumed by `UNWIND`, so no
//! client-supplied text is ever spliced into Cypher.

use super::{BackendError, BackendResult, GraphBackend, GraphTransaction};
use crate::config::Neo4jConfig;
use crate::ingest::ShipmentRow;
use crate::schema;
use async_trait::async_trait;
use neo4rs::{query, BoltType, ConfigBuilder, Graph, Query, Txn};
use std::collections::HashMap;
use tracing::{debug, info};

/// Step 1: Trailer/SID/Part upserts plus the bidirectional Trailer↔SID pair
const LINK_SHIPMENTS: &str = "
UNWIND $rows AS row
MERGE (trailer:Trailer {id: row.trailerId})
MERGE (sid:SID {id: row.sid, ciscoID: row.ciscoId})
MERGE (part:Part {number: row.partNumber, quantity: row.quantity})
MERGE (trailer)-[:HAS_SID]->(sid)
MERGE (sid)-[:BELONGS_TO]->(trailer)
MERGE (sid)-[:HAS_PART]->(part)
";

/// Step 2: Trailer/Cisco upserts
const LINK_CISCO: &str = "
UNWIND $rows AS row
MERGE (trailer:Trailer {id: row.trailerId})
MERGE (cisco:Cisco {id: row.ciscoId})
MERGE (trailer)-[:HAS_CISCO]->(cisco)
";

/// Step 3: one default Schedule per Trailer that has none
const BACKFILL_SCHEDULES: &str = "
MATCH (trailer:Trailer)
WHERE NOT EXISTS { (trailer)-[:HAS_SCHEDULE]->(:Schedule) }
CREATE (trailer)-[:HAS_SCHEDULE]->(:Schedule {
  TrailerID: trailer.id,
  RequestDate: '',
  ScheduleDate: '',
  ScheduleTime: '',
  CarrierCode: '',
  ArrivalTime: '',
  DoorNumber: '',
  Email: '',
  LoadStatus: $loadStatus,
  IsHot: false
})
RETURN count(trailer) AS created
";

/// Step 4a: drop CONTAINS_PART edges no longer backed by a path
const PRUNE_CONTAINS_PART: &str = "
MATCH (t:Trailer)-[c:CONTAINS_PART]->(p:Part)
WHERE NOT EXISTS { (t)-[:HAS_SID]->(:SID)-[:HAS_PART]->(p) }
DELETE c
";

/// Step 4b: one CONTAINS_PART edge per Trailer→SID→Part path
const MERGE_CONTAINS_PART: &str = "
MATCH (t:Trailer)-[:HAS_SID]->(:SID)-[:HAS_PART]->(p:Part)
WITH DISTINCT t, p
MERGE (t)-[:CONTAINS_PART]->(p)
RETURN count(*) AS edges
";

/// Convert rows into the `$rows` list parameter
fn rows_param(rows: &[ShipmentRow]) -> Vec<HashMap<String, BoltType>> {
    rows.iter()
        .map(|row| {
            let mut m: HashMap<String, BoltType> = HashMap::new();
            m.insert("trailerId".to_string(), row.trailer_id.clone().into());
            m.insert("sid".to_string(), row.sid.clone().into());
            m.insert("ciscoId".to_string(), row.cisco_id.clone().into());
            m.insert("partNumber".to_string(), row.part_number.clone().into());
            m.insert("quantity".to_string(), row.quantity.into());
            m
        })
        .collect()
}

/// Neo4j connection pool shared for the life of the process
pub struct Neo4jBackend {
    graph: Graph,
    uri: String,
}

impl Neo4jBackend {
    /// Build the connection pool and verify the server answers
    pub async fn connect(config: &Neo4jConfig) -> BackendResult<Self> {
        let mut builder = ConfigBuilder::default()
            .uri(config.uri.as_str())
            .user(config.user.as_str())
            .password(config.password.as_str())
            .max_connections(config.max_connections);
        if let Some(db) = &config.database {
            builder = builder.db(db.as_str());
        }

        let graph = Graph::connect(builder.build()?).await?;
        let backend = Self {
            graph,
            uri: config.uri.clone(),
        };
        backend.ping().await?;
        info!(uri = %backend.uri, "connected to Neo4j");
        Ok(backend)
    }
}

#[async_trait]
impl GraphBackend for Neo4jBackend {
    fn name(&self) -> &'static str {
        "neo4j"
    }

    async fn begin_write(&self) -> BackendResult<Box<dyn GraphTransaction>> {
        let txn = self.graph.start_txn().await?;
        Ok(Box::new(Neo4jTransaction { txn }))
    }

    async fn ping(&self) -> BackendResult<()> {
        self.graph.run(query("RETURN 1")).await?;
        Ok(())
    }

    async fn close(&self) -> BackendResult<()> {
        // Pooled connections close when the last Graph handle drops
        info!(uri = %self.uri, "closing Neo4j connection pool");
        Ok(())
    }
}

/// An explicit Bolt transaction.
///
/// If dropped uncommitted, the pool resets the connection before reuse,
/// which rolls the transaction back server-side.
struct Neo4jTransaction {
    txn: Txn,
}

impl Neo4jTransaction {
    /// Run a statement returning a single integer column
    async fn fetch_count(&mut self, q: Query, column: &str) -> BackendResult<u64> {
        let mut stream = self.txn.execute(q).await?;
        let mut total = 0;
        while let Some(row) = stream.next(self.txn.handle()).await? {
            let n: i64 = row
                .get(column)
                .map_err(|e| BackendError::Decode(format!("column '{}': {}", column, e)))?;
            total += n.max(0) as u64;
        }
        Ok(total)
    }
}

#[async_trait]
impl GraphTransaction for Neo4jTransaction {
    async fn link_shipments(&mut self, rows: &[ShipmentRow]) -> BackendResult<()> {
        debug!(rows = rows.len(), "UNWIND link shipments");
        self.txn
            .run(query(LINK_SHIPMENTS).param("rows", rows_param(rows)))
            .await?;
        Ok(())
    }

    async fn link_cisco(&mut self, rows: &[ShipmentRow]) -> BackendResult<()> {
        debug!(rows = rows.len(), "UNWIND link cisco");
        self.txn
            .run(query(LINK_CISCO).param("rows", rows_param(rows)))
            .await?;
        Ok(())
    }

    async fn backfill_schedules(&mut self) -> BackendResult<u64> {
        let q = query(BACKFILL_SCHEDULES).param("loadStatus", schema::DEFAULT_LOAD_STATUS);
        self.fetch_count(q, "created").await
    }

    async fn materialize_contains_part(&mut self) -> BackendResult<u64> {
        self.txn.run(query(PRUNE_CONTAINS_PART)).await?;
        self.fetch_count(query(MERGE_CONTAINS_PART), "edges").await
    }

    async fn commit(self: Box<Self>) -> BackendResult<()> {
        self.txn.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> BackendResult<()> {
        self.txn.rollback().await?;
        Ok(())
    }
}
