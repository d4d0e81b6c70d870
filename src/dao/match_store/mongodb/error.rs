use mongodb::error::Error as MongoError;
use thiserror::Error;
use uuid::Uuid;

/// Convenient result alias returning [`MongoDaoError`] failures.
pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Failures that can occur while interacting with MongoDB.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// The connection URI could not be parsed.
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        /// Offending URI.
        uri: String,
        /// Driver-level cause.
        #[source]
        source: MongoError,
    },
    /// Required environment variable is missing.
    #[error("missing MongoDB environment variable `{var}`")]
    MissingEnvVar {
        /// Name of the missing variable.
        var: &'static str,
    },
    /// Building the client from parsed options failed.
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        /// Driver-level cause.
        #[source]
        source: MongoError,
    },
    /// The initial ping never succeeded.
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        /// How many pings were attempted.
        attempts: u32,
        /// Driver-level cause.
        #[source]
        source: MongoError,
    },
    /// A health-check ping failed.
    #[error("MongoDB ping health check failed")]
    HealthPing {
        /// Driver-level cause.
        #[source]
        source: MongoError,
    },
    /// Index creation failed at startup.
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        /// Target collection.
        collection: &'static str,
        /// Index key description.
        index: &'static str,
        /// Driver-level cause.
        #[source]
        source: MongoError,
    },
    /// A write against the matches collection failed.
    #[error("failed to write match `{id}`")]
    WriteMatch {
        /// Match id.
        id: Uuid,
        /// Driver-level cause.
        #[source]
        source: MongoError,
    },
    /// A read against the matches collection failed.
    #[error("failed to read match `{id}`")]
    ReadMatch {
        /// Match id.
        id: Uuid,
        /// Driver-level cause.
        #[source]
        source: MongoError,
    },
    /// Listing matches failed.
    #[error("failed to list matches")]
    ListMatches {
        /// Driver-level cause.
        #[source]
        source: MongoError,
    },
    /// A write against the subscriptions collection failed.
    #[error("failed to write subscription for match `{match_id}`")]
    WriteSubscription {
        /// Match the subscription belongs to.
        match_id: Uuid,
        /// Driver-level cause.
        #[source]
        source: MongoError,
    },
    /// A read against the subscriptions collection failed.
    #[error("failed to read subscriptions for match `{match_id}`")]
    ReadSubscription {
        /// Match the subscriptions belong to.
        match_id: Uuid,
        /// Driver-level cause.
        #[source]
        source: MongoError,
    },
    /// The due-reminder query failed.
    #[error("failed to query {kind} entries due a reminder")]
    FindDueReminder {
        /// "match" or "event".
        kind: &'static str,
        /// Driver-level cause.
        #[source]
        source: MongoError,
    },
    /// Reading event attendance failed.
    #[error("failed to list attendees of event `{event_id}`")]
    ListAttendees {
        /// Event id.
        event_id: Uuid,
        /// Driver-level cause.
        #[source]
        source: MongoError,
    },
    /// The reminder commit (notification insert or flag flip) failed.
    #[error("failed to commit reminder for {kind} `{id}`")]
    CommitReminder {
        /// "match" or "event".
        kind: &'static str,
        /// Entity id.
        id: Uuid,
        /// Driver-level cause.
        #[source]
        source: MongoError,
    },
    /// The bulk status advancement failed.
    #[error("failed to bulk-advance started matches")]
    AdvanceStatus {
        /// Driver-level cause.
        #[source]
        source: MongoError,
    },
}
