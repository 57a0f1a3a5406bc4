//! Integration tests for condition evaluation, routing decisions and the
//! policy lifecycle


mod condition_tests;
mod decision_tests;
mod lifecycle_tests;
mod property_tests;
