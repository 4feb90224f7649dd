pub mod legislation_repo;

pub use legislation_repo::LegislationRepo;
