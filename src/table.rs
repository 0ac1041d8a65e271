//! Tables delivered to the query engine
//!
//! A [`Table`] is an Arrow batch whose memory is accounted against the
//! caller's DataFusion [`MemoryPool`]. The reservation lives exactly as long
//! as the table, so dropping the table (on success or on any error path)
//! returns the memory to the pool.

use crate::{ResultExt, Result};

use arrow_array::{Array, Int64Array, RecordBatch};
use arrow_schema::{DataType, Field, Schema, SchemaRef};
use datafusion::execution::memory_pool::{MemoryConsumer, MemoryPool, MemoryReservation};
use futures::stream::BoxStream;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Column holding the cardinality value
pub const VALUE_COLUMN: &str = "_value";

/// Lazy, finite, non-restartable stream of tables
pub type TableStream = BoxStream<'static, Result<Table>>;

/// An Arrow batch with pool-accounted memory
pub struct Table {
    batch: RecordBatch,
    reservation: MemoryReservation,
}

impl Table {
    /// Wrap `batch`, reserving its memory in `pool` under `consumer`
    pub fn try_new(
        batch: RecordBatch,
        pool: &Arc<dyn MemoryPool>,
        consumer: impl Into<String>,
    ) -> Result<Self> {
        let mut reservation = MemoryConsumer::new(consumer).register(pool);
        reservation
            .try_grow(batch.get_array_memory_size())
            .map_err(crate::Error::from)
            .context("reserve table memory")?;
        Ok(Self { batch, reservation })
    }

    pub fn schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    /// Bytes reserved in the pool for this table
    pub fn reserved_bytes(&self) -> usize {
        self.reservation.size()
    }

    /// Named Int64 column, if present with that type
    pub fn int64_column(&self, name: &str) -> Option<&Int64Array> {
        self.batch
            .column_by_name(name)
            .and_then(|col| col.as_any().downcast_ref::<Int64Array>())
    }

    /// Batch that outlives this table. It is not accounted against the pool.
    pub fn to_batch(&self) -> RecordBatch {
        self.batch.clone()
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("schema", &self.batch.schema())
            .field("num_rows", &self.batch.num_rows())
            .field("reserved_bytes", &self.reservation.size())
            .finish()
    }
}

/// Receiver of produced tables.
///
/// The table is only valid for the duration of the call; a sink that needs
/// the data afterwards must copy it (for example with [`Table::to_batch`]).
/// Returning an error stops delivery and becomes the result of the read.
pub trait TableSink: Send {
    fn deliver(&mut self, table: &Table) -> Result<()>;
}

impl<F> TableSink for F
where
    F: FnMut(&Table) -> Result<()> + Send,
{
    fn deliver(&mut self, table: &Table) -> Result<()> {
        self(table)
    }
}

/// Schema of a cardinality result: a single non-null `_value` Int64 column
pub fn cardinality_schema() -> SchemaRef {
    static SCHEMA: OnceLock<SchemaRef> = OnceLock::new();
    SCHEMA
        .get_or_init(|| {
            Arc::new(Schema::new(vec![Field::new(
                VALUE_COLUMN,
                DataType::Int64,
                false,
            )]))
        })
        .clone()
}

/// Build the one-row cardinality table for `count`
pub fn materialize_count(count: i64, pool: &Arc<dyn MemoryPool>) -> Result<Table> {
    let batch = RecordBatch::try_new(
        cardinality_schema(),
        vec![Arc::new(Int64Array::from(vec![count]))],
    )?;
    Table::try_new(batch, pool, "series_cardinality")
}
