//! Re:hive Space: a blog front end that reads its posts from Directus.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
