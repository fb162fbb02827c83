//! Contract with the statistics service that computes performance measures.
//!
//! A service session is a [`StatisticsConnection`]: vectors are bound to
//! names with [`assign`](StatisticsConnection::assign), then a
//! [`PerformanceQuery`] over those names is evaluated. Connections come from
//! a [`ConnectionPool`] and are handed out wrapped in a [`PooledConnection`],
//! which gives the connection back to its pool when dropped, whatever the
//! exit path.
//!
//! [`LocalStatistics`] is an in-process pool whose connections compute the
//! measures with [`crate::roc`].

use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, PoisonError};

use foldwise_core::{FoldwiseError, Result};
use tracing::debug;

use crate::roc::{self, PerformanceMeasure};

/// Result of evaluating a performance query.
#[derive(Debug, Clone, PartialEq)]
pub enum StatValue {
    /// A threshold-independent measure (e.g. AUC).
    Scalar(f64),
    /// One value per decision cutoff; `cutoffs` are in descending order.
    PerThreshold { cutoffs: Vec<f64>, values: Vec<f64> },
}

/// A request for one measure over previously assigned vectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerformanceQuery {
    /// Name of the assigned decision vector.
    pub predictions: String,
    /// Name of the assigned `0/1` label vector.
    pub labels: String,
    /// Measure name, e.g. `"auc"` or `"mat"`.
    pub measure: String,
}

impl PerformanceQuery {
    pub fn new(predictions: &str, labels: &str, measure: &str) -> Self {
        Self {
            predictions: predictions.to_string(),
            labels: labels.to_string(),
            measure: measure.to_string(),
        }
    }
}

/// One session with the statistics service.
pub trait StatisticsConnection: Send {
    /// Bind `values` to `name` for subsequent queries.
    fn assign(&mut self, name: &str, values: &[f64]) -> Result<()>;

    /// Evaluate a query over assigned vectors.
    fn evaluate(&mut self, query: &PerformanceQuery) -> Result<StatValue>;
}

/// Source of statistics connections.
///
/// Every connection obtained from [`borrow_connection`](Self::borrow_connection)
/// must be handed back through [`return_connection`](Self::return_connection);
/// [`PooledConnection`] does this automatically.
pub trait ConnectionPool: Send + Sync {
    fn borrow_connection(&self) -> Result<Box<dyn StatisticsConnection>>;

    fn return_connection(&self, connection: Box<dyn StatisticsConnection>);
}

/// A borrowed connection, returned to its pool on drop.
pub struct PooledConnection<'a> {
    pool: &'a dyn ConnectionPool,
    connection: Option<Box<dyn StatisticsConnection>>,
}

impl<'a> PooledConnection<'a> {
    /// Borrow a connection from `pool`.
    pub fn acquire(pool: &'a dyn ConnectionPool) -> Result<Self> {
        let connection = pool.borrow_connection()?;
        Ok(Self {
            pool,
            connection: Some(connection),
        })
    }
}

impl Deref for PooledConnection<'_> {
    type Target = dyn StatisticsConnection;

    fn deref(&self) -> &Self::Target {
        match &self.connection {
            Some(c) => c.as_ref(),
            None => unreachable!("connection is only taken on drop"),
        }
    }
}

impl DerefMut for PooledConnection<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match &mut self.connection {
            Some(c) => c.as_mut(),
            None => unreachable!("connection is only taken on drop"),
        }
    }
}

impl Drop for PooledConnection<'_> {
    fn drop(&mut self) {
        if let Some(connection) = self.connection.take() {
            self.pool.return_connection(connection);
        }
    }
}

// ---------------------------------------------------------------------------
// Local backend
// ---------------------------------------------------------------------------

/// In-process statistics session.
#[derive(Debug, Default)]
pub struct LocalConnection {
    vectors: HashMap<String, Vec<f64>>,
}

impl LocalConnection {
    fn vector(&self, name: &str) -> Result<&[f64]> {
        self.vectors.get(name).map(Vec::as_slice).ok_or_else(|| {
            FoldwiseError::StatisticsService(format!("no vector assigned to '{}'", name))
        })
    }
}

impl StatisticsConnection for LocalConnection {
    fn assign(&mut self, name: &str, values: &[f64]) -> Result<()> {
        self.vectors.insert(name.to_string(), values.to_vec());
        Ok(())
    }

    fn evaluate(&mut self, query: &PerformanceQuery) -> Result<StatValue> {
        let measure: PerformanceMeasure = query
            .measure
            .parse()
            .map_err(|e: FoldwiseError| FoldwiseError::StatisticsService(e.to_string()))?;
        let predictions = self.vector(&query.predictions)?;
        let labels = self.vector(&query.labels)?;
        roc::performance(predictions, labels, measure)
    }
}

/// Bounded pool of [`LocalConnection`]s.
///
/// Every borrow yields a fresh session, so vectors assigned during one
/// evaluation are never visible to the next.
#[derive(Debug)]
pub struct LocalStatistics {
    capacity: usize,
    outstanding: Mutex<usize>,
}

impl LocalStatistics {
    /// A pool handing out at most `capacity` simultaneous connections.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            outstanding: Mutex::new(0),
        }
    }

    /// Number of connections currently borrowed.
    pub fn outstanding(&self) -> usize {
        *self.outstanding.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for LocalStatistics {
    fn default() -> Self {
        Self::with_capacity(4)
    }
}

impl ConnectionPool for LocalStatistics {
    fn borrow_connection(&self) -> Result<Box<dyn StatisticsConnection>> {
        let mut outstanding = self.outstanding.lock().unwrap_or_else(PoisonError::into_inner);
        if *outstanding >= self.capacity {
            return Err(FoldwiseError::StatisticsService(format!(
                "pool exhausted ({} connections in use)",
                *outstanding
            )));
        }
        *outstanding += 1;
        debug!(outstanding = *outstanding, "borrowed statistics connection");
        Ok(Box::new(LocalConnection::default()))
    }

    fn return_connection(&self, connection: Box<dyn StatisticsConnection>) {
        drop(connection);
        let mut outstanding = self.outstanding.lock().unwrap_or_else(PoisonError::into_inner);
        *outstanding = outstanding.saturating_sub(1);
    }
}
