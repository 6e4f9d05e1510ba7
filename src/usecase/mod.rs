//! Orchestration use-cases built on the key manager and the repository
//! contracts.

mod kek_usecase;
mod rewrap_usecase;

pub use kek_usecase::KekUseCase;
pub use rewrap_usecase::RewrapUseCase;
