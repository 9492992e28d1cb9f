pub mod health;
pub mod proposal_handler;
