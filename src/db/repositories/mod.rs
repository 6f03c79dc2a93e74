pub mod summary_repository;
