// Service layer module for TeamMatch
pub mod profile_service;
pub mod proposal_lifecycle_service;
pub mod record_aggregator_service;


pub use profile_service::ProfileService;
pub use proposal_lifecycle_service::ProposalLifecycleService;
pub use record_aggregator_service::RecordAggregatorService;
