mod catalog_tests;
mod common;
mod runner_tests;
